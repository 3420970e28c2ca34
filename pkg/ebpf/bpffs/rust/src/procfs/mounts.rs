// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2025-present Datadog, Inc.

//! The mounts module reads the mount table (/proc/mounts) and yields the
//! mount points of every bpffs instance.

use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::os::unix::ffi::OsStringExt;
use std::path::{Path, PathBuf};

use log::{debug, trace};

const READ_LIMIT: u64 = 64 * 1024 * 1024; // 64MiB

/// Type tag prefix of bpffs entries in the mount table.
const BPFFS_TYPE_PREFIX: &[u8] = b"bpf";

/// Lazy sequence of bpffs mount points read from a mount table.
///
/// The table is read once, front to back. Dropping the iterator closes it.
/// Lines are handled as raw bytes since mount points need not be UTF-8.
pub struct BpffsMounts {
    reader: BufReader<io::Take<File>>,
    line_buf: Vec<u8>,
}

impl BpffsMounts {
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            reader: BufReader::new(file.take(READ_LIMIT)),
            line_buf: Vec::with_capacity(256),
        })
    }
}

impl Iterator for BpffsMounts {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            self.line_buf.clear();
            match self.reader.read_until(b'\n', &mut self.line_buf) {
                Ok(0) => return None, // EOF
                Ok(_) => {
                    let Some((dir, fs_type)) = get_fields(&self.line_buf) else {
                        trace!(
                            "Skipping malformed mount entry: {:?}",
                            String::from_utf8_lossy(&self.line_buf)
                        );
                        continue;
                    };
                    if !fs_type.starts_with(BPFFS_TYPE_PREFIX) {
                        continue;
                    }
                    return Some(unescape(dir));
                }
                Err(e) => {
                    debug!("Failed to read mount table: {e}");
                    return None;
                }
            }
        }
    }
}

/// Splits on the separators the kernel writes (space, tab and the line
/// terminator) and nothing else, so other bytes stay part of the field.
fn get_fields(line: &[u8]) -> Option<(&[u8], &[u8])> {
    let mut iter = line
        .split(|b| matches!(b, b' ' | b'\t' | b'\n'))
        .filter(|field| !field.is_empty());
    let dir = iter.nth(1)?; // field 1: mount point (skip the source)
    let fs_type = iter.next()?; // field 2: filesystem type
    Some((dir, fs_type))
}

/// Decodes the octal escapes the kernel uses for whitespace and backslashes
/// in mount points (`\040`, `\011`, `\012`, `\134`). Anything else is kept
/// verbatim.
fn unescape(field: &[u8]) -> PathBuf {
    let mut out = Vec::with_capacity(field.len());
    let mut i = 0;

    while let Some(&b) = field.get(i) {
        if b == b'\\'
            && let Some(decoded) = field.get(i + 1..i + 4).and_then(decode_octal)
        {
            out.push(decoded);
            i += 4;
            continue;
        }
        out.push(b);
        i += 1;
    }

    PathBuf::from(OsString::from_vec(out))
}

fn decode_octal(digits: &[u8]) -> Option<u8> {
    match digits {
        b"040" => Some(b' '),
        b"011" => Some(b'\t'),
        b"012" => Some(b'\n'),
        b"134" => Some(b'\\'),
        _ => None,
    }
}
