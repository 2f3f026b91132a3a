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

//! Audit line rendering.
//!
//! Root line:      `<id tail>\troot\t<identity>\t<time>\t<flags>`
//! Operation line: `<id tail>\t<kind>\t<actor>\t<time>\t<details>`

use crate::acl::envelope::{DecodedDelta, DecodedRoot};
use crate::acl::operation::format_operation;
use crate::core::identity::format_identity;
use chrono::{DateTime, SecondsFormat};

const ID_TAIL: usize = 5;

/// Last five characters of a record id, or the whole id when shorter.
pub fn format_id(id: &str) -> &str {
    match id.char_indices().rev().nth(ID_TAIL - 1) {
        Some((start, _)) => &id[start..],
        None => id,
    }
}

/// RFC 3339 in UTC with second precision. Out-of-range values fall back to the raw number.
pub fn format_timestamp(secs: i64) -> String {
    match DateTime::from_timestamp(secs, 0) {
        Some(t) => t.to_rfc3339_opts(SecondsFormat::Secs, true),
        None => secs.to_string(),
    }
}

/// The single audit line of a root record.
pub fn root_line(root: &DecodedRoot) -> String {
    format!(
        "{}\troot\t{}\t{}\t{}",
        format_id(&root.id),
        format_identity(root.identity()),
        format_timestamp(root.accepted_at()),
        root.flags(),
    )
}

/// One audit line per operation of a delta record.
pub fn operation_lines(delta: &DecodedDelta) -> Vec<String> {
    let id = format_id(&delta.id);
    let actor = format_identity(delta.identity());
    let ts = format_timestamp(delta.accepted_at());
    delta
        .operations
        .iter()
        .map(|op| {
            let f = format_operation(op);
            format!("{id}\t{}\t{actor}\t{ts}\t{}", f.kind, f.joined_details())
        })
        .collect()
}
