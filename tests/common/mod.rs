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

#![allow(dead_code)]

use aclinspect::acl::envelope::{seal_delta, seal_root};
use aclinspect::acl::operation::OperationEntry;
use aclinspect::core::security::keys::AccountKeys;
use aclinspect::core::types::{AclRoot, RawRecordWithId};

pub const SPACE: &str = "bafyreispace.acl";
pub const T0: i64 = 1_714_564_800;

pub fn keys() -> AccountKeys {
    AccountKeys::generate().expect("keygen").0
}

/// A signed log under construction.
pub struct LogBuilder {
    pub owner: AccountKeys,
    pub records: Vec<RawRecordWithId>,
}

impl LogBuilder {
    pub fn new() -> Self {
        Self::with_root(|_| {})
    }

    pub fn with_root(edit: impl FnOnce(&mut AclRoot)) -> Self {
        let owner = keys();
        let mut root = AclRoot { identity: owner.identity(), space_id: SPACE.into(), timestamp: T0, ..Default::default() };
        edit(&mut root);
        let rec = seal_root(&owner, &root, T0).expect("seal root");
        Self { owner, records: vec![rec] }
    }

    pub fn last_id(&self) -> String {
        self.records.last().map(|r| r.id.clone()).unwrap_or_default()
    }

    /// Append a delta authored by `author` (the owner when `None`); returns its id.
    pub fn push(&mut self, author: Option<&AccountKeys>, ops: Vec<OperationEntry>) -> String {
        let author = author.unwrap_or(&self.owner);
        let at = T0 + self.records.len() as i64 * 60;
        let rec = seal_delta(author, &self.last_id(), &ops, at).expect("seal delta");
        let id = rec.id.clone();
        self.records.push(rec);
        id
    }
}
