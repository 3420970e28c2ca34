// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2025-present Datadog, Inc.

use std::fs::{FileType, Metadata};
use std::path::Path;

use log::debug;
use walkdir::{DirEntry, WalkDir};

use crate::errors::Error;

/// Upper bound on directory descriptors held open by a walk.
pub const MAX_OPEN_DIRS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
    Other,
}

impl From<FileType> for EntryKind {
    fn from(ft: FileType) -> Self {
        if ft.is_symlink() {
            EntryKind::Symlink
        } else if ft.is_dir() {
            EntryKind::Dir
        } else if ft.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        }
    }
}

/// An entry handed to the visitor. Only valid for the duration of the call.
pub struct Entry<'a> {
    inner: &'a DirEntry,
}

impl Entry<'_> {
    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    pub fn kind(&self) -> EntryKind {
        self.inner.file_type().into()
    }

    pub fn depth(&self) -> usize {
        self.inner.depth()
    }

    /// lstat(2) information for the entry.
    pub fn metadata(&self) -> std::io::Result<Metadata> {
        self.inner.metadata().map_err(std::io::Error::from)
    }
}

/// Walks `root` depth first without following symbolic links, calling
/// `visit` for every entry including `root` itself and intermediate
/// directories.
///
/// At most `max_open` directories are held open at once. Entries of a
/// directory are visited in file name order. An entry that cannot be read
/// is skipped, and so is the content of the root when the root itself was
/// visited but cannot be listed. Only a root that cannot be stat'ed is an
/// error. The first error returned by `visit` stops the walk and is
/// returned as is.
pub fn walk_tree<F>(root: &Path, max_open: usize, mut visit: F) -> Result<(), Error>
where
    F: FnMut(&Entry<'_>) -> Result<(), Error>,
{
    let walker = WalkDir::new(root)
        .follow_links(false)
        .follow_root_links(false)
        .max_open(max_open)
        .sort_by_file_name();

    let mut root_seen = false;
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 && !root_seen => {
                return Err(Error::Walk {
                    root: root.to_path_buf(),
                    source: e,
                });
            }
            Err(e) => {
                debug!("Skipping unreadable entry under {}: {e}", root.display());
                continue;
            }
        };

        root_seen |= entry.depth() == 0;
        visit(&Entry { inner: &entry })?;
    }

    Ok(())
}
