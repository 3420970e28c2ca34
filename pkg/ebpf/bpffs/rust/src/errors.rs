// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2025-present Datadog, Inc.

use std::collections::TryReserveError;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::objtype::ObjType;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to open mount table {}: {source}", path.display())]
    MountTable { path: PathBuf, source: io::Error },

    #[error("failed to walk {}: {source}", root.display())]
    Walk {
        root: PathBuf,
        source: walkdir::Error,
    },

    #[error("bpf obj get ({}): {cause}", path.display())]
    ObjGet { path: PathBuf, cause: ObjGetCause },

    #[error("incorrect object type: {}", actual.name())]
    WrongType { expected: ObjType, actual: ObjType },

    #[error("can't get object type: {0}")]
    FdType(#[source] io::Error),

    #[error("can't get object info: {0}")]
    ObjInfo(#[source] io::Error),

    #[error("mem alloc failed")]
    Alloc(#[from] TryReserveError),
}

impl Error {
    /// Hard failures abort the walk of the current mount and the whole
    /// table build. Everything else is skipped while scanning.
    pub fn is_hard(&self) -> bool {
        matches!(
            self,
            Error::MountTable { .. } | Error::Walk { .. } | Error::Alloc(_)
        )
    }
}

/// Why opening a pinned object failed.
#[derive(Error, Debug)]
pub enum ObjGetCause {
    #[error("directory not in bpf file system (bpffs)")]
    NotBpffs,
    #[error(transparent)]
    Os(io::Error),
}

/// Failure to open the object pinned at `path`.
///
/// The path is borrowed from the caller, so a failed open allocates nothing
/// unless the error is turned into an owned [`Error`].
#[derive(Error, Debug)]
#[error("bpf obj get ({}): {cause}", path.display())]
pub struct ObjGetError<'a> {
    pub path: &'a Path,
    pub cause: ObjGetCause,
}

impl From<ObjGetError<'_>> for Error {
    fn from(err: ObjGetError<'_>) -> Self {
        Error::ObjGet {
            path: err.path.to_path_buf(),
            cause: err.cause,
        }
    }
}
