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

//! Log and summary commands over a record source and a state builder.

use crate::acl::envelope::{decode_delta, decode_root, DecodeError};
use crate::acl::format::{operation_lines, root_line};
use crate::acl::state::AclStateBuilder;
use crate::acl::summary::{summarize_membership, MembershipSummary, SummarizeError};
use crate::core::types::RawRecordWithId;
use crate::source::{FetchError, RecordSource};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{self, Write};
use thiserror::Error;
use tracing::{debug, warn};

/// Inspector errors.
#[derive(Debug, Error)]
pub enum InspectError {
    /// Records could not be fetched.
    #[error("failed to get acl records: {0}")]
    Fetch(#[from] FetchError),
    /// The log has no root record.
    #[error("acl log of space {0} is empty")]
    EmptyLog(String),
    /// A record failed to decode.
    #[error("record #{index}: {source}")]
    Decode {
        /// Position in the log.
        index: usize,
        /// Decode failure.
        #[source]
        source: DecodeError,
    },
    /// State could not be summarized.
    #[error(transparent)]
    Summarize(#[from] SummarizeError),
    /// Summary failed over a log whose audit run skipped records.
    #[error("summary of space {space} unavailable, {} record(s) skipped in the log: {source}", skipped.len())]
    Incomplete {
        /// Space id.
        space: String,
        /// Ids skipped by the log run.
        skipped: Vec<String>,
        /// Build failure.
        #[source]
        source: SummarizeError,
    },
    /// Output could not be written.
    #[error("write output: {0}")]
    Io(#[from] io::Error),
}

/// What to do with a delta record that fails to decode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Abort the whole log at the first malformed record.
    #[default]
    FailFast,
    /// Warn, skip the record and continue.
    SkipAndReport,
}

/// Outcome of a log run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LogReport {
    /// Records printed (root included).
    pub records: usize,
    /// Operation lines printed.
    pub operations: usize,
    /// Ids of skipped records.
    pub skipped: Vec<String>,
}

/// ACL inspector for one record source.
pub struct AclInspector<S, B> {
    source: S,
    builder: B,
    policy: FailurePolicy,
    records_by_space: HashMap<String, Vec<RawRecordWithId>>,
    skipped_by_space: HashMap<String, Vec<String>>,
}

impl<S: RecordSource, B: AclStateBuilder> AclInspector<S, B> {
    /// New inspector with the fail-fast policy.
    pub fn new(source: S, builder: B) -> Self {
        Self {
            source,
            builder,
            policy: FailurePolicy::default(),
            records_by_space: HashMap::new(),
            skipped_by_space: HashMap::new(),
        }
    }

    /// Set the malformed-record policy.
    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Print the audit log of `space_id` and cache its records for [`Self::summary`].
    pub fn log<W: Write>(&mut self, space_id: &str, out: &mut W) -> Result<LogReport, InspectError> {
        let records = self.source.fetch_records(space_id, "")?;
        let Some((first, rest)) = records.split_first() else {
            return Err(InspectError::EmptyLog(space_id.to_string()));
        };

        // An undecodable root is terminal under every policy.
        let root = decode_root(first).map_err(|source| InspectError::Decode { index: 0, source })?;
        writeln!(out, "{}", root_line(&root))?;
        let mut report = LogReport { records: 1, ..Default::default() };

        for (i, raw) in rest.iter().enumerate() {
            let delta = match decode_delta(raw) {
                Ok(d) => d,
                Err(source) => match self.policy {
                    FailurePolicy::FailFast => return Err(InspectError::Decode { index: i + 1, source }),
                    FailurePolicy::SkipAndReport => {
                        warn!(index = i + 1, error = %source, "skipping malformed acl record");
                        report.skipped.push(raw.id.clone());
                        continue;
                    }
                },
            };
            for line in operation_lines(&delta) {
                writeln!(out, "{line}")?;
                report.operations += 1;
            }
            report.records += 1;
        }

        debug!(space = space_id, records = report.records, skipped = report.skipped.len(), "acl log printed");
        self.records_by_space.insert(space_id.to_string(), records);
        self.skipped_by_space.insert(space_id.to_string(), report.skipped.clone());
        Ok(report)
    }

    /// Print the membership summary of `space_id`, reusing records cached by [`Self::log`].
    ///
    /// The summary needs every record. If the log run skipped some and the build fails,
    /// the error is [`InspectError::Incomplete`] and names the skipped ids.
    pub fn summary<W: Write>(&self, space_id: &str, out: &mut W) -> Result<MembershipSummary, InspectError> {
        let fetched;
        let records = match self.records_by_space.get(space_id) {
            Some(cached) => cached.as_slice(),
            None => {
                fetched = self.source.fetch_records(space_id, "")?;
                fetched.as_slice()
            }
        };
        let summary = match summarize_membership(records, &self.builder) {
            Ok(summary) => summary,
            Err(source) => {
                return Err(match self.skipped_by_space.get(space_id) {
                    Some(skipped) if !skipped.is_empty() => InspectError::Incomplete {
                        space: space_id.to_string(),
                        skipped: skipped.clone(),
                        source,
                    },
                    _ => source.into(),
                })
            }
        };
        summary.render(out)?;
        Ok(summary)
    }
}
