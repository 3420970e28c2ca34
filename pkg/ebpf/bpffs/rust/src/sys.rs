// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2025-present Datadog, Inc.

//! Kernel primitives used to discover pinned objects.
//!
//! The table builder only talks to the kernel through [`BpfSys`], so that the
//! traversal can be exercised against a fake object store in tests.

use std::ffi::CString;
use std::fs;
use std::io;
use std::mem;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use nix::sys::statfs::statfs;

use crate::objtype::ObjType;
use crate::procfs;

/// Filesystem magic reported by statfs(2) for bpffs.
pub const BPF_FS_MAGIC: u64 = 0xcafe_4a11;

const BPF_OBJ_GET: libc::c_int = 7;
const BPF_OBJ_GET_INFO_BY_FD: libc::c_int = 15;

pub trait BpfSys {
    /// An open object. Dropping it releases the underlying handle.
    type Handle;

    /// Opens the object pinned at `path`.
    fn obj_get(&self, path: &Path) -> io::Result<Self::Handle>;

    /// Returns the kind of the object behind `handle`.
    fn fd_type(&self, handle: &Self::Handle) -> io::Result<ObjType>;

    /// Returns the kernel-assigned id of the object behind `handle`.
    fn obj_id(&self, handle: &Self::Handle) -> io::Result<u32>;

    /// Returns true if `path` lives on a bpffs mount.
    fn is_bpffs(&self, path: &Path) -> bool;
}

/// The running kernel, reached through bpf(2).
#[derive(Debug, Default, Clone, Copy)]
pub struct Kernel;

// Leading members of union bpf_attr for BPF_OBJ_GET.
#[repr(C)]
#[derive(Default)]
struct ObjGetAttr {
    pathname: u64,
    bpf_fd: u32,
    file_flags: u32,
}

// Leading members of union bpf_attr for BPF_OBJ_GET_INFO_BY_FD.
#[repr(C)]
#[derive(Default)]
struct InfoByFdAttr {
    bpf_fd: u32,
    info_len: u32,
    info: u64,
}

// bpf_prog_info, bpf_map_info and bpf_link_info all start with the object
// type followed by its id. The kernel truncates its copy to info_len.
#[repr(C)]
#[derive(Default)]
struct InfoHead {
    kind: u32,
    id: u32,
}

fn sys_bpf<T>(cmd: libc::c_int, attr: &mut T) -> io::Result<libc::c_long> {
    let size = mem::size_of::<T>() as libc::c_uint;
    // SAFETY: attr is an exclusively borrowed #[repr(C)] prefix of bpf_attr
    // and size is its exact size, so the kernel never reads or writes past it.
    let ret = unsafe { libc::syscall(libc::SYS_bpf, cmd, attr as *mut T, size) };
    if ret < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(ret)
}

impl BpfSys for Kernel {
    type Handle = OwnedFd;

    fn obj_get(&self, path: &Path) -> io::Result<OwnedFd> {
        let pathname = CString::new(path.as_os_str().as_bytes())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let mut attr = ObjGetAttr {
            pathname: pathname.as_ptr() as u64,
            ..Default::default()
        };

        let fd = sys_bpf(BPF_OBJ_GET, &mut attr)?;
        let fd = RawFd::try_from(fd)
            .map_err(|_| io::Error::other(format!("invalid descriptor returned: {fd}")))?;

        // SAFETY: a successful BPF_OBJ_GET returns a new descriptor which
        // nothing else in the process refers to.
        Ok(unsafe { OwnedFd::from_raw_fd(fd) })
    }

    fn fd_type(&self, handle: &OwnedFd) -> io::Result<ObjType> {
        let link = fs::read_link(procfs::self_fd_path(handle.as_raw_fd()))?;
        Ok(link
            .to_str()
            .map(ObjType::from_link_target)
            .unwrap_or(ObjType::Unknown))
    }

    fn obj_id(&self, handle: &OwnedFd) -> io::Result<u32> {
        let mut info = InfoHead::default();
        let mut attr = InfoByFdAttr {
            bpf_fd: u32::try_from(handle.as_raw_fd())
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?,
            info_len: mem::size_of::<InfoHead>() as u32,
            info: &mut info as *mut InfoHead as u64,
        };

        sys_bpf(BPF_OBJ_GET_INFO_BY_FD, &mut attr)?;
        Ok(info.id)
    }

    fn is_bpffs(&self, path: &Path) -> bool {
        statfs(path).is_ok_and(|st| {
            u64::try_from(st.filesystem_type().0).is_ok_and(|magic| magic == BPF_FS_MAGIC)
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_regular_file_is_not_an_object() {
        let file = NamedTempFile::new().unwrap();
        assert!(Kernel.obj_get(file.path()).is_err());
    }

    #[test]
    fn test_path_with_nul_is_rejected() {
        let err = Kernel
            .obj_get(Path::new("/sys/fs/bpf/a\0b"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_fd_type_of_plain_file() {
        let file = NamedTempFile::new().unwrap();
        let fd = OwnedFd::from(file.reopen().unwrap());
        assert_eq!(Kernel.fd_type(&fd).unwrap(), ObjType::Unknown);
    }

    #[test]
    fn test_tmpdir_is_not_bpffs() {
        let dir = TempDir::new().unwrap();
        assert!(!Kernel.is_bpffs(dir.path()));
        assert!(!Kernel.is_bpffs(&dir.path().join("missing")));
    }
}
