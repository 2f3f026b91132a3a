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

//! Aggregated membership view of a log.

use crate::acl::format::format_id;
use crate::acl::state::{AclStateBuilder, Invite, MembershipState, StateBuildError};
use crate::core::identity::format_identity;
use crate::core::types::{AccountStatus, Permissions, RawRecordWithId};
use std::io::{self, Write};
use thiserror::Error;
use tracing::info;

/// Summary errors.
#[derive(Debug, Error)]
pub enum SummarizeError {
    /// State could not be built.
    #[error("failed to build acl list: {0}")]
    Build(#[from] StateBuildError),
}

/// Point-in-time view of owner, invites and per-status/per-role tallies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MembershipSummary {
    /// Encoded owner identity.
    pub owner: Vec<u8>,
    /// Open invites.
    pub invites: Vec<Invite>,
    /// Account count indexed by [`AccountStatus`].
    pub accounts_by_status: [usize; 7],
    /// Account count indexed by [`Permissions`].
    pub accounts_by_role: [usize; 6],
}

impl MembershipSummary {
    /// Count the accounts of a built state.
    pub fn from_state(state: &MembershipState) -> Self {
        let mut accounts_by_status = [0usize; 7];
        let mut accounts_by_role = [0usize; 6];
        for acc in state.current_accounts() {
            accounts_by_status[acc.status as usize] += 1;
            accounts_by_role[acc.permissions as usize] += 1;
        }
        Self {
            owner: state.owner_pub_key().to_vec(),
            invites: state.invites().to_vec(),
            accounts_by_status,
            accounts_by_role,
        }
    }

    /// Number of counted accounts.
    pub fn total_accounts(&self) -> usize {
        self.accounts_by_status.iter().sum()
    }

    /// Write the plain-text summary block.
    pub fn render<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "ACL state summary:")?;
        writeln!(out, "\tOwner={}", format_identity(&self.owner))?;

        writeln!(out, "\tInvites:")?;
        for inv in &self.invites {
            writeln!(out, "\t\tid={}; type={}", format_id(&inv.id), inv.invite_type)?;
        }

        writeln!(out, "\tAccount statuses:")?;
        for (status, cnt) in AccountStatus::ALL.iter().zip(self.accounts_by_status) {
            if cnt > 0 {
                writeln!(out, "\t\t{status}={cnt}")?;
            }
        }

        writeln!(out, "\tAccount roles:")?;
        for (role, cnt) in Permissions::ALL.iter().zip(self.accounts_by_role) {
            if cnt > 0 {
                writeln!(out, "\t\t{role}={cnt}")?;
            }
        }
        Ok(())
    }
}

/// Build the final state through `builder` and tally it.
pub fn summarize_membership<B: AclStateBuilder + ?Sized>(
    records: &[RawRecordWithId],
    builder: &B,
) -> Result<MembershipSummary, SummarizeError> {
    if records.is_empty() {
        return Err(StateBuildError::Empty.into());
    }
    let state = builder.build(records)?;
    let summary = MembershipSummary::from_state(&state);
    info!(
        records = records.len(),
        accounts = summary.total_accounts(),
        invites = summary.invites.len(),
        "acl state summarized"
    );
    Ok(summary)
}
