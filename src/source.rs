// Copyright (c) 2026 Aclinspect
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Record sources.
//!
//! A source returns the ACL log of a space in log order. The coordinator network client is
//! out of scope; [`FileRecordSource`] reads a dump written by [`RecordBundle::write_to`].

use crate::core::types::{decode_canonical_limited, encode_canonical, CodecError, RawRecordWithId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Cap for a whole dump.
pub const MAX_BUNDLE_BYTES: usize = 256 * 1024 * 1024;

/// Fetch errors.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Dump could not be read or written.
    #[error("records file {}: {source}", path.display())]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// Dump is not a record bundle.
    #[error("records file {}: {source}", path.display())]
    Decode {
        /// File path.
        path: PathBuf,
        /// Codec failure.
        #[source]
        source: CodecError,
    },
    /// Bundle could not be encoded.
    #[error("encode record bundle: {0}")]
    Encode(CodecError),
    /// Dump belongs to another space.
    #[error("records belong to space {found}, not {expected}")]
    SpaceMismatch {
        /// Requested space.
        expected: String,
        /// Space in the dump.
        found: String,
    },
    /// No log for this space.
    #[error("no acl records for space {0}")]
    UnknownSpace(String),
    /// `since_id` is not part of the log.
    #[error("record {0} not found in acl log")]
    UnknownRecord(String),
}

/// Remote-fetch capability.
pub trait RecordSource {
    /// Records of `space_id` in log order. A non-empty `since_id` returns only the records after it.
    fn fetch_records(&self, space_id: &str, since_id: &str) -> Result<Vec<RawRecordWithId>, FetchError>;
}

fn records_after(records: Vec<RawRecordWithId>, since_id: &str) -> Result<Vec<RawRecordWithId>, FetchError> {
    if since_id.is_empty() {
        return Ok(records);
    }
    let pos = records
        .iter()
        .position(|r| r.id == since_id)
        .ok_or_else(|| FetchError::UnknownRecord(since_id.to_string()))?;
    Ok(records.into_iter().skip(pos + 1).collect())
}

/// On-disk dump of one space's ACL log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordBundle {
    /// Space id.
    pub space_id: String,
    /// Records in log order.
    pub records: Vec<RawRecordWithId>,
}

impl RecordBundle {
    /// Read a dump.
    pub fn read_from(path: &Path) -> Result<Self, FetchError> {
        let bytes = fs::read(path).map_err(|source| FetchError::Io { path: path.to_path_buf(), source })?;
        decode_canonical_limited(&bytes, MAX_BUNDLE_BYTES)
            .map_err(|source| FetchError::Decode { path: path.to_path_buf(), source })
    }

    /// Write a dump.
    pub fn write_to(&self, path: &Path) -> Result<(), FetchError> {
        let bytes = encode_canonical(self).map_err(FetchError::Encode)?;
        fs::write(path, bytes).map_err(|source| FetchError::Io { path: path.to_path_buf(), source })
    }
}

/// Reads a [`RecordBundle`] file on every fetch.
#[derive(Clone, Debug)]
pub struct FileRecordSource {
    path: PathBuf,
}

impl FileRecordSource {
    /// Source backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource for FileRecordSource {
    fn fetch_records(&self, space_id: &str, since_id: &str) -> Result<Vec<RawRecordWithId>, FetchError> {
        let bundle = RecordBundle::read_from(&self.path)?;
        if bundle.space_id != space_id {
            return Err(FetchError::SpaceMismatch { expected: space_id.to_string(), found: bundle.space_id });
        }
        debug!(path = %self.path.display(), records = bundle.records.len(), "loaded acl records");
        records_after(bundle.records, since_id)
    }
}

/// In-memory logs keyed by space id.
#[derive(Clone, Debug, Default)]
pub struct MemoryRecordSource {
    spaces: BTreeMap<String, Vec<RawRecordWithId>>,
}

impl MemoryRecordSource {
    /// Empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the log of `space_id`.
    pub fn insert(&mut self, space_id: impl Into<String>, records: Vec<RawRecordWithId>) {
        self.spaces.insert(space_id.into(), records);
    }
}

impl RecordSource for MemoryRecordSource {
    fn fetch_records(&self, space_id: &str, since_id: &str) -> Result<Vec<RawRecordWithId>, FetchError> {
        let records = self
            .spaces
            .get(space_id)
            .cloned()
            .ok_or_else(|| FetchError::UnknownSpace(space_id.to_string()))?;
        records_after(records, since_id)
    }
}
