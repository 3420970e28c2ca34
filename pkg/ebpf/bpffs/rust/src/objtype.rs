// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2025-present Datadog, Inc.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Kind of a BPF object, as reported by the kernel for an open handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjType {
    Unknown,
    Prog,
    Map,
    Link,
}

impl ObjType {
    pub fn name(self) -> &'static str {
        match self {
            ObjType::Unknown => "unknown",
            ObjType::Prog => "prog",
            ObjType::Map => "map",
            ObjType::Link => "link",
        }
    }

    /// Maps the target of a `/proc/self/fd/<fd>` link to an object kind.
    ///
    /// BPF objects are anonymous inodes, so the link reads as
    /// `anon_inode:bpf-prog`, `anon_inode:bpf-map` or `anon_inode:bpf-link`.
    pub fn from_link_target(target: &str) -> Self {
        if target.contains("bpf-map") {
            ObjType::Map
        } else if target.contains("bpf-prog") {
            ObjType::Prog
        } else if target.contains("bpf-link") {
            ObjType::Link
        } else {
            ObjType::Unknown
        }
    }
}

impl fmt::Display for ObjType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ObjType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "prog" | "program" => Ok(ObjType::Prog),
            "map" => Ok(ObjType::Map),
            "link" => Ok(ObjType::Link),
            other => Err(format!("unknown object type: {other}")),
        }
    }
}
