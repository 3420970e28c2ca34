// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2025-present Datadog, Inc.

//! Test doubles for the kernel and fixture mount tables
#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use std::cell::Cell;
use std::collections::{HashMap, HashSet, TryReserveError};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::{Mutex, Once, PoisonError};

use log::{LevelFilter, Log, Metadata, Record};

use tempfile::TempDir;

use crate::objtype::ObjType;
use crate::sys::BpfSys;
use crate::table::{PinSink, PinnedObjTable, PinnedObject};

#[derive(Debug, Clone, Copy)]
enum FakeObject {
    Object { kind: ObjType, id: Option<u32> },
    Denied,
}

/// In-memory object store standing in for the kernel.
///
/// Paths that were not registered behave like files that are not BPF
/// objects. Live handles are counted so tests can check that every handle
/// gets released.
#[derive(Debug, Default)]
pub struct FakeSys {
    objects: HashMap<PathBuf, FakeObject>,
    bpffs: HashSet<PathBuf>,
    open: Rc<Cell<usize>>,
    attempts: Cell<usize>,
}

#[derive(Debug)]
pub struct FakeHandle {
    kind: ObjType,
    id: Option<u32>,
    open: Rc<Cell<usize>>,
}

impl Drop for FakeHandle {
    fn drop(&mut self) {
        self.open.set(self.open.get() - 1);
    }
}

impl FakeSys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object<P: AsRef<Path>>(mut self, path: P, kind: ObjType, id: u32) -> Self {
        self.objects.insert(
            path.as_ref().to_path_buf(),
            FakeObject::Object { kind, id: Some(id) },
        );
        self
    }

    /// Registers an object whose info query fails.
    pub fn with_object_without_info<P: AsRef<Path>>(mut self, path: P, kind: ObjType) -> Self {
        self.objects.insert(
            path.as_ref().to_path_buf(),
            FakeObject::Object { kind, id: None },
        );
        self
    }

    /// Registers a path that the kernel refuses to open with EACCES.
    pub fn with_denied<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.objects
            .insert(path.as_ref().to_path_buf(), FakeObject::Denied);
        self
    }

    pub fn with_bpffs<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.bpffs.insert(path.as_ref().to_path_buf());
        self
    }

    /// Number of handles currently open.
    pub fn open_handles(&self) -> usize {
        self.open.get()
    }

    /// Number of open attempts so far.
    pub fn open_attempts(&self) -> usize {
        self.attempts.get()
    }
}

impl BpfSys for FakeSys {
    type Handle = FakeHandle;

    fn obj_get(&self, path: &Path) -> io::Result<FakeHandle> {
        self.attempts.set(self.attempts.get() + 1);
        match self.objects.get(path) {
            Some(FakeObject::Object { kind, id }) => {
                self.open.set(self.open.get() + 1);
                Ok(FakeHandle {
                    kind: *kind,
                    id: *id,
                    open: Rc::clone(&self.open),
                })
            }
            Some(FakeObject::Denied) => Err(io::Error::from(io::ErrorKind::PermissionDenied)),
            None => Err(io::Error::from(io::ErrorKind::NotFound)),
        }
    }

    fn fd_type(&self, handle: &FakeHandle) -> io::Result<ObjType> {
        Ok(handle.kind)
    }

    fn obj_id(&self, handle: &FakeHandle) -> io::Result<u32> {
        handle
            .id
            .ok_or_else(|| io::Error::from(io::ErrorKind::InvalidInput))
    }

    fn is_bpffs(&self, path: &Path) -> bool {
        self.bpffs.iter().any(|mount| path.starts_with(mount))
    }
}

/// A sink whose `nth` insertion (counting from 1) fails as if the allocator
/// ran out of memory.
pub struct FailingSink {
    table: PinnedObjTable,
    inserts: usize,
    nth: usize,
}

impl FailingSink {
    pub fn new(nth: usize) -> Self {
        Self {
            table: PinnedObjTable::new(),
            inserts: 0,
            nth,
        }
    }

    pub fn table(&self) -> &PinnedObjTable {
        &self.table
    }
}

impl PinSink for FailingSink {
    fn try_insert(&mut self, obj: PinnedObject) -> Result<(), TryReserveError> {
        self.inserts += 1;
        if self.inserts == self.nth {
            return Err(Vec::<u8>::new().try_reserve(usize::MAX).unwrap_err());
        }
        self.table.try_insert(obj)
    }
}

/// A temporary directory holding a mount table and the mount points it
/// lists.
pub struct MountFixture {
    dir: TempDir,
    mount_table: PathBuf,
}

impl MountFixture {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let mount_table = dir.path().join("mounts");
        fs::write(
            &mount_table,
            "proc /proc proc rw,nosuid,nodev,noexec,relatime 0 0\n",
        )
        .unwrap();
        Self { dir, mount_table }
    }

    pub fn mount_table(&self) -> &Path {
        &self.mount_table
    }

    /// Creates a directory named `name` and lists it as a mount of type
    /// `fs_type`.
    pub fn add_mount(&self, fs_type: &str, name: &str) -> PathBuf {
        let mount_point = self.dir.path().join(name);
        fs::create_dir_all(&mount_point).unwrap();
        self.add_raw_line(&format!(
            "{fs_type} {} {fs_type} rw,relatime 0 0",
            mount_point.display()
        ));
        mount_point
    }

    pub fn add_bpffs_mount(&self, name: &str) -> PathBuf {
        self.add_mount("bpf", name)
    }

    pub fn add_raw_line(&self, line: &str) {
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.mount_table)
            .unwrap();
        writeln!(file, "{line}").unwrap();
    }
}

static CAPTURED: Mutex<Vec<String>> = Mutex::new(Vec::new());

/// Logger that keeps every record in memory, formatted as "LEVEL message".
struct CaptureLogger;

impl Log for CaptureLogger {
    fn enabled(&self, _: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        CAPTURED
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(format!("{} {}", record.level(), record.args()));
    }

    fn flush(&self) {}
}

static CAPTURE_LOGGER: CaptureLogger = CaptureLogger;

/// Installs the capturing logger for the whole test binary. Tests share it,
/// so they should look for records mentioning something only they use.
pub fn capture_logs() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        log::set_logger(&CAPTURE_LOGGER).unwrap();
        log::set_max_level(LevelFilter::Trace);
    });
}

/// Captured records containing `needle`.
pub fn logged(needle: &str) -> Vec<String> {
    CAPTURED
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .iter()
        .filter(|line| line.contains(needle))
        .cloned()
        .collect()
}
