// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2025-present Datadog, Inc.

use std::path::Path;

use log::{debug, trace};

use crate::errors::Error;
use crate::objtype::ObjType;
use crate::pinned::open_obj_pinned;
use crate::procfs::{self, mounts::BpffsMounts};
use crate::sys::BpfSys;
use crate::table::{PinSink, PinnedObject};
use crate::walk::{Entry, EntryKind, MAX_OPEN_DIRS, walk_tree};

/// State shared by every entry visited during one table build.
pub struct BuildContext<'a, T> {
    pub kind: ObjType,
    pub table: &'a mut T,
}

/// Records `entry` in the context's table if it is a pinned object of the
/// requested kind.
///
/// Entries that are not objects of that kind are skipped with `Ok(())`.
/// Only a failed allocation is reported, since it leaves nothing sensible to
/// continue with.
pub fn classify_entry<S, T>(
    sys: &S,
    ctx: &mut BuildContext<'_, T>,
    entry: &Entry<'_>,
) -> Result<(), Error>
where
    S: BpfSys,
    T: PinSink,
{
    if entry.kind() != EntryKind::File {
        return Ok(());
    }

    let path = entry.path();
    let Ok(handle) = open_obj_pinned(sys, path, true) else {
        trace!("Skipping {}: not a pinned object", path.display());
        return Ok(());
    };

    match sys.fd_type(&handle) {
        Ok(kind) if kind == ctx.kind => {}
        Ok(kind) => {
            trace!("Skipping {}: {kind} is not {}", path.display(), ctx.kind);
            return Ok(());
        }
        Err(e) => {
            trace!("Skipping {}: {}", path.display(), Error::FdType(e));
            return Ok(());
        }
    }

    let id = match sys.obj_id(&handle) {
        Ok(id) => id,
        Err(e) => {
            trace!("Skipping {}: {}", path.display(), Error::ObjInfo(e));
            return Ok(());
        }
    };

    let obj = PinnedObject::try_new(id, path)?;
    ctx.table.try_insert(obj)?;
    trace!("Found {} {id} pinned at {}", ctx.kind, path.display());

    Ok(())
}

/// Fills `table` with every object of kind `kind` pinned in any bpffs mount
/// listed in the live mount table.
pub fn build_pinned_obj_table<S, T>(sys: &S, table: &mut T, kind: ObjType) -> Result<(), Error>
where
    S: BpfSys,
    T: PinSink,
{
    build_pinned_obj_table_from(sys, &procfs::mounts_path(), table, kind)
}

/// Same as [`build_pinned_obj_table`], reading mounts from `mount_table`.
///
/// Stops at the first mount whose walk fails hard; objects found in earlier
/// mounts stay in `table`.
pub fn build_pinned_obj_table_from<S, T>(
    sys: &S,
    mount_table: &Path,
    table: &mut T,
    kind: ObjType,
) -> Result<(), Error>
where
    S: BpfSys,
    T: PinSink,
{
    let mounts = BpffsMounts::open(mount_table).map_err(|source| Error::MountTable {
        path: mount_table.to_path_buf(),
        source,
    })?;

    let mut ctx = BuildContext { kind, table };
    for root in mounts {
        debug!("Looking for pinned {kind} objects in {}", root.display());
        walk_tree(&root, MAX_OPEN_DIRS, |entry| {
            classify_entry(sys, &mut ctx, entry)
        })?;
    }

    Ok(())
}
