// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2025-present Datadog, Inc.

use std::collections::hash_map;
use std::collections::{HashMap, TryReserveError};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::{Serialize, Serializer};

/// A BPF object found pinned in a bpffs mount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PinnedObject {
    pub id: u32,
    #[serde(serialize_with = "serialize_path_lossy")]
    pub path: PathBuf,
}

/// Pin names are arbitrary bytes; invalid UTF-8 is replaced rather than
/// failing the whole listing.
fn serialize_path_lossy<S: Serializer>(path: &Path, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&path.to_string_lossy())
}

impl PinnedObject {
    /// Builds a record holding its own copy of `path`, failing instead of
    /// aborting if the copy cannot be allocated.
    pub fn try_new(id: u32, path: &Path) -> Result<Self, TryReserveError> {
        let mut owned = OsString::new();
        owned.try_reserve_exact(path.as_os_str().len())?;
        owned.push(path.as_os_str());
        Ok(Self {
            id,
            path: PathBuf::from(owned),
        })
    }
}

/// Destination of discovered objects during a table build.
pub trait PinSink {
    /// Stores `obj`. On error nothing is stored.
    fn try_insert(&mut self, obj: PinnedObject) -> Result<(), TryReserveError>;
}

/// Index of pinned objects keyed by kernel id.
///
/// Ids are unique among live objects of a kind, so a second record for the
/// same id replaces the first.
#[derive(Debug, Default)]
pub struct PinnedObjTable {
    objects: HashMap<u32, PinnedObject>,
}

impl PinnedObjTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the path the object with `id` is pinned at.
    pub fn get(&self, id: u32) -> Option<&Path> {
        self.get_object(id).map(|obj| obj.path.as_path())
    }

    pub fn get_object(&self, id: u32) -> Option<&PinnedObject> {
        self.objects.get(&id)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PinnedObject> {
        self.objects.values()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Releases every record. Calling it on an empty table is a no-op.
    pub fn clear(&mut self) {
        self.objects.clear();
    }

    /// Returns the records ordered by id.
    pub fn sorted(&self) -> Vec<&PinnedObject> {
        let mut objects: Vec<_> = self.objects.values().collect();
        objects.sort_by_key(|obj| obj.id);
        objects
    }
}

impl PinSink for PinnedObjTable {
    fn try_insert(&mut self, obj: PinnedObject) -> Result<(), TryReserveError> {
        self.objects.try_reserve(1)?;
        self.objects.insert(obj.id, obj);
        Ok(())
    }
}

impl IntoIterator for PinnedObjTable {
    type Item = PinnedObject;
    type IntoIter = hash_map::IntoValues<u32, PinnedObject>;

    fn into_iter(self) -> Self::IntoIter {
        self.objects.into_values()
    }
}
