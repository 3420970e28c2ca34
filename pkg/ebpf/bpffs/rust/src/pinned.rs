// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2025-present Datadog, Inc.

use std::io;
use std::path::Path;

use log::error;

use crate::errors::{Error, ObjGetCause, ObjGetError};
use crate::objtype::ObjType;
use crate::sys::BpfSys;

/// Returns the directory part of `path` the way dirname(3) would, without
/// touching the caller's path.
fn dirname(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => Path::new("."),
        Some(parent) => parent,
        None if path.has_root() => Path::new("/"),
        None => Path::new("."),
    }
}

/// Opens the object pinned at `path`.
///
/// When the kernel refuses access and the containing directory is not on a
/// bpffs mount, the error says so instead of reporting a bare EACCES, since
/// that usually means the path was never pinned in the first place. Unless
/// `quiet` is set, failures are also logged.
pub fn open_obj_pinned<'p, S: BpfSys>(
    sys: &S,
    path: &'p Path,
    quiet: bool,
) -> Result<S::Handle, ObjGetError<'p>> {
    sys.obj_get(path).map_err(|err| {
        let denied = err.kind() == io::ErrorKind::PermissionDenied;
        let cause = if denied && !sys.is_bpffs(dirname(path)) {
            ObjGetCause::NotBpffs
        } else {
            ObjGetCause::Os(err)
        };
        let err = ObjGetError { path, cause };
        if !quiet {
            error!("{err}");
        }
        err
    })
}

/// Opens the object pinned at `path` and checks that it is of kind `expected`.
pub fn open_obj_pinned_any<S: BpfSys>(
    sys: &S,
    path: &Path,
    expected: ObjType,
) -> Result<S::Handle, Error> {
    let handle = open_obj_pinned(sys, path, false)?;

    let actual = sys.fd_type(&handle).map_err(|e| {
        let err = Error::FdType(e);
        error!("{err}");
        err
    })?;
    if actual != expected {
        let err = Error::WrongType { expected, actual };
        error!("{err}");
        return Err(err);
    }

    Ok(handle)
}
