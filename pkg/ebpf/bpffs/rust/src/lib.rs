// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2025-present Datadog, Inc.

//! Discovery of BPF objects pinned in bpffs.
//!
//! Every bpffs mount listed in the mount table is walked without following
//! symbolic links, and each regular file that opens as a BPF object of the
//! requested kind is recorded under its kernel id. The resulting
//! [`PinnedObjTable`] maps ids back to the paths the objects are pinned at.

// Correctness
#![deny(clippy::indexing_slicing)]
#![deny(clippy::string_slice)]
#![deny(clippy::cast_possible_wrap)]
#![deny(clippy::undocumented_unsafe_blocks)]
// Panicking code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::unimplemented)]
#![deny(clippy::todo)]
// Debug code that shouldn't be in production
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]

pub mod config;
mod errors;
mod index;
mod objtype;
mod pinned;
mod procfs;
mod sys;
mod table;
mod walk;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-export the public API
pub use errors::{Error, ObjGetCause, ObjGetError};
pub use index::{BuildContext, build_pinned_obj_table, build_pinned_obj_table_from, classify_entry};
pub use objtype::ObjType;
pub use pinned::{open_obj_pinned, open_obj_pinned_any};
pub use procfs::mounts::BpffsMounts;
pub use sys::{BPF_FS_MAGIC, BpfSys, Kernel};
pub use table::{PinSink, PinnedObjTable, PinnedObject};
pub use walk::{Entry, EntryKind, MAX_OPEN_DIRS, walk_tree};
