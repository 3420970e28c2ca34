// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2025-present Datadog, Inc.

//! Paths under procfs.

pub mod mounts;

use std::env;
use std::os::fd::RawFd;
use std::path::{Path, PathBuf};

/// procfs root of the host: `HOST_PROC` when set, `/host/proc` inside the
/// agent container, `/proc` otherwise. Resolved on every call.
pub fn root_path() -> PathBuf {
    if let Some(root) = env::var_os("HOST_PROC") {
        return root.into();
    }
    if env::var_os("DOCKER_DD_AGENT").is_some() && Path::new("/host").exists() {
        return PathBuf::from("/host/proc");
    }
    PathBuf::from("/proc")
}

/// Default mount table listing the bpffs mounts to scan.
pub fn mounts_path() -> PathBuf {
    root_path().join("mounts")
}

/// Link describing what descriptor `fd` of this process refers to. Always
/// under the local procfs, the host root does not know our descriptors.
pub fn self_fd_path(fd: RawFd) -> PathBuf {
    PathBuf::from(format!("/proc/self/fd/{fd}"))
}
