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

//! Membership state of an ACL log.
//!
//! [`AclStateBuilder`] is the seam to whatever owns merge semantics. [`LogReplayBuilder`] is
//! the offline implementation used for record dumps: it checks content ids, the `prev_id`
//! chain and author signatures, then applies the membership effect of each operation in
//! log order. It does not resolve concurrent branches.

use crate::acl::envelope::{decode_delta, decode_root, record_id_for, DecodeError};
use crate::acl::operation::OperationEntry;
use crate::core::identity::decode_public_key;
use crate::core::security::keys::verify_signature;
use crate::core::types::{AccountStatus, InviteType, Permissions, RawRecordWithId};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};

/// State build errors.
#[derive(Debug, Error)]
pub enum StateBuildError {
    /// No records at all.
    #[error("acl log is empty")]
    Empty,
    /// A record failed to decode.
    #[error("record #{index}: {source}")]
    Decode {
        /// Position in the log.
        index: usize,
        /// Decode failure.
        #[source]
        source: DecodeError,
    },
    /// Record id does not match its content.
    #[error("record {id}: id does not match content")]
    BadRecordId {
        /// Offending id.
        id: String,
    },
    /// `prev_id` does not point at the preceding record.
    #[error("record {id}: prev id {found} does not follow {expected}")]
    BrokenChain {
        /// Offending id.
        id: String,
        /// Id of the preceding record.
        expected: String,
        /// Recorded `prev_id`.
        found: String,
    },
    /// Author identity is not a usable key.
    #[error("record {id}: invalid author identity")]
    BadIdentity {
        /// Offending id.
        id: String,
    },
    /// Author signature does not verify.
    #[error("record {id}: signature verification failed")]
    BadSignature {
        /// Offending id.
        id: String,
    },
    /// Author may not perform the operation, or the root is not the pinned owner.
    #[error("record {id}: unauthorized {action}")]
    Unauthorized {
        /// Offending id.
        id: String,
        /// Operation kind.
        action: &'static str,
    },
    /// Operation refers to an invite that is not open.
    #[error("record {id}: no such invite {invite}")]
    UnknownInvite {
        /// Offending id.
        id: String,
        /// Referenced invite.
        invite: String,
    },
    /// Operation refers to a join request that is not pending.
    #[error("record {id}: no such request {request}")]
    UnknownRequest {
        /// Offending id.
        id: String,
        /// Referenced request.
        request: String,
    },
    /// Operation refers to an account that is not a member.
    #[error("record {id}: unknown account")]
    UnknownAccount {
        /// Offending id.
        id: String,
    },
}

/// An account as known to the state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountRecord {
    /// Encoded identity.
    pub identity: Vec<u8>,
    /// Current permissions.
    pub permissions: Permissions,
    /// Current status.
    pub status: AccountStatus,
}

/// An open invite.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invite {
    /// Record id of the invite.
    pub id: String,
    /// Invite kind.
    pub invite_type: InviteType,
    /// Permissions granted on join.
    pub permissions: Permissions,
}

/// Final state of a log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MembershipState {
    owner: Vec<u8>,
    invites: Vec<Invite>,
    accounts: Vec<AccountRecord>,
}

impl MembershipState {
    /// Assemble a state.
    pub fn new(owner: Vec<u8>, invites: Vec<Invite>, accounts: Vec<AccountRecord>) -> Self {
        Self { owner, invites, accounts }
    }

    /// Encoded owner identity.
    pub fn owner_pub_key(&self) -> &[u8] {
        &self.owner
    }

    /// Open invites in creation order.
    pub fn invites(&self) -> &[Invite] {
        &self.invites
    }

    /// Every account the log has touched.
    pub fn current_accounts(&self) -> &[AccountRecord] {
        &self.accounts
    }
}

/// Builds membership state from an ordered record list.
pub trait AclStateBuilder {
    /// Fold `records` (root first) into a state.
    fn build(&self, records: &[RawRecordWithId]) -> Result<MembershipState, StateBuildError>;
}

/// Offline in-order replay of a record dump.
#[derive(Clone, Debug, Default)]
pub struct LogReplayBuilder {
    pinned_owner: Option<Vec<u8>>,
}

impl LogReplayBuilder {
    /// Replay without an owner pin.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject logs whose root identity differs from `identity`.
    pub fn with_pinned_owner(mut self, identity: Vec<u8>) -> Self {
        self.pinned_owner = Some(identity);
        self
    }
}

fn check_author(id: &str, payload: &[u8], identity: &[u8], inner: &[u8], sig: &[u8]) -> Result<(), StateBuildError> {
    if record_id_for(payload) != id {
        return Err(StateBuildError::BadRecordId { id: id.to_string() });
    }
    let pk = decode_public_key(identity).map_err(|_| StateBuildError::BadIdentity { id: id.to_string() })?;
    verify_signature(&pk, inner, sig).map_err(|_| StateBuildError::BadSignature { id: id.to_string() })
}

impl AclStateBuilder for LogReplayBuilder {
    fn build(&self, records: &[RawRecordWithId]) -> Result<MembershipState, StateBuildError> {
        let Some((first, rest)) = records.split_first() else {
            return Err(StateBuildError::Empty);
        };

        let root = decode_root(first).map_err(|source| StateBuildError::Decode { index: 0, source })?;
        check_author(
            &first.id,
            &first.payload,
            root.identity(),
            &root.envelope.payload,
            &root.envelope.signature,
        )?;
        if let Some(pinned) = &self.pinned_owner {
            if pinned.as_slice() != root.identity() {
                return Err(StateBuildError::Unauthorized { id: first.id.clone(), action: "root" });
            }
        }

        let mut replay = Replay::new(root.identity().to_vec());
        let mut prev = first.id.clone();
        for (i, raw) in rest.iter().enumerate() {
            let delta = decode_delta(raw).map_err(|source| StateBuildError::Decode { index: i + 1, source })?;
            if delta.record.prev_id != prev {
                return Err(StateBuildError::BrokenChain {
                    id: raw.id.clone(),
                    expected: prev,
                    found: delta.record.prev_id,
                });
            }
            check_author(
                &raw.id,
                &raw.payload,
                delta.identity(),
                &delta.envelope.payload,
                &delta.envelope.signature,
            )?;
            for op in &delta.operations {
                replay.apply(&raw.id, delta.identity(), op)?;
            }
            debug!(record = %raw.id, ops = delta.operations.len(), "replayed acl record");
            prev = raw.id.clone();
        }
        Ok(replay.finish())
    }
}

/// Replay accumulator; lives for one build call.
struct Replay {
    owner: Vec<u8>,
    accounts: BTreeMap<Vec<u8>, AccountRecord>,
    invites: Vec<Invite>,
    /// request record id -> requester identity
    requests: BTreeMap<String, Vec<u8>>,
}

impl Replay {
    fn new(owner: Vec<u8>) -> Self {
        let mut accounts = BTreeMap::new();
        accounts.insert(
            owner.clone(),
            AccountRecord { identity: owner.clone(), permissions: Permissions::Owner, status: AccountStatus::Active },
        );
        Self { owner, accounts, invites: Vec::new(), requests: BTreeMap::new() }
    }

    fn finish(self) -> MembershipState {
        MembershipState::new(self.owner, self.invites, self.accounts.into_values().collect())
    }

    fn active_permissions(&self, identity: &[u8]) -> Permissions {
        match self.accounts.get(identity) {
            Some(a) if a.status == AccountStatus::Active => a.permissions,
            _ => Permissions::None,
        }
    }

    fn is_active(&self, identity: &[u8]) -> bool {
        self.accounts.get(identity).is_some_and(|a| a.status == AccountStatus::Active)
    }

    fn set(&mut self, identity: &[u8], permissions: Permissions, status: AccountStatus) {
        self.accounts.insert(
            identity.to_vec(),
            AccountRecord { identity: identity.to_vec(), permissions, status },
        );
    }

    fn invite_pos(&self, rec: &str, invite: &str) -> Result<usize, StateBuildError> {
        self.invites
            .iter()
            .position(|i| i.id == invite)
            .ok_or_else(|| StateBuildError::UnknownInvite { id: rec.to_string(), invite: invite.to_string() })
    }

    fn take_request(&mut self, rec: &str, request: &str) -> Result<Vec<u8>, StateBuildError> {
        self.requests
            .remove(request)
            .ok_or_else(|| StateBuildError::UnknownRequest { id: rec.to_string(), request: request.to_string() })
    }

    fn apply(&mut self, rec: &str, actor: &[u8], op: &OperationEntry) -> Result<(), StateBuildError> {
        let actor_perms = self.active_permissions(actor);
        let deny = || StateBuildError::Unauthorized { id: rec.to_string(), action: op.kind() };
        let admin_only = matches!(
            op,
            OperationEntry::Invite(_)
                | OperationEntry::InviteRevoke(_)
                | OperationEntry::InviteChange(_)
                | OperationEntry::RequestAccept(_)
                | OperationEntry::RequestDecline(_)
                | OperationEntry::AccountRemove(_)
                | OperationEntry::ReadKeyChange(_)
                | OperationEntry::AccountsAdd(_)
                | OperationEntry::PermissionChange(_)
                | OperationEntry::PermissionChanges(_)
        );
        if admin_only && !actor_perms.can_manage_accounts() {
            return Err(deny());
        }

        match op {
            OperationEntry::Invite(inv) => {
                if inv.permissions == Permissions::Owner {
                    return Err(deny());
                }
                self.invites.push(Invite {
                    id: rec.to_string(),
                    invite_type: inv.invite_type,
                    permissions: inv.permissions,
                });
            }
            OperationEntry::InviteRevoke(r) => {
                let pos = self.invite_pos(rec, &r.invite_record_id)?;
                self.invites.remove(pos);
            }
            OperationEntry::InviteChange(c) => {
                let pos = self.invite_pos(rec, &c.invite_record_id)?;
                if c.permissions == Permissions::Owner {
                    return Err(deny());
                }
                self.invites[pos].permissions = c.permissions;
            }
            OperationEntry::InviteJoin(j) => {
                let pos = self.invite_pos(rec, &j.invite_record_id)?;
                let invite = &self.invites[pos];
                // the invite, not the joiner, decides the granted permissions
                if invite.invite_type != InviteType::AnyoneCanJoin
                    || j.permissions != invite.permissions
                    || self.is_active(actor)
                {
                    return Err(deny());
                }
                let granted = invite.permissions;
                self.set(actor, granted, AccountStatus::Active);
            }
            OperationEntry::RequestJoin(j) => {
                self.invite_pos(rec, &j.invite_record_id)?;
                if actor_perms != Permissions::None {
                    return Err(deny());
                }
                self.requests.insert(rec.to_string(), actor.to_vec());
                self.set(actor, Permissions::None, AccountStatus::Joining);
            }
            OperationEntry::RequestAccept(a) => {
                if a.permissions == Permissions::Owner {
                    return Err(deny());
                }
                let requester = self.take_request(rec, &a.request_record_id)?;
                self.set(&requester, a.permissions, AccountStatus::Active);
            }
            OperationEntry::RequestDecline(d) => {
                let requester = self.take_request(rec, &d.request_record_id)?;
                self.set(&requester, Permissions::None, AccountStatus::Declined);
            }
            OperationEntry::RequestCancel(c) => {
                match self.requests.get(&c.record_id) {
                    Some(requester) if requester.as_slice() == actor => {}
                    Some(_) => return Err(deny()),
                    None => {
                        return Err(StateBuildError::UnknownRequest {
                            id: rec.to_string(),
                            request: c.record_id.clone(),
                        })
                    }
                }
                self.requests.remove(&c.record_id);
                self.set(actor, Permissions::None, AccountStatus::Canceled);
            }
            OperationEntry::AccountRemove(r) => {
                for ident in &r.identities {
                    if *ident == self.owner {
                        return Err(deny());
                    }
                    if !self.accounts.contains_key(ident) {
                        return Err(StateBuildError::UnknownAccount { id: rec.to_string() });
                    }
                    self.set(ident, Permissions::None, AccountStatus::Removed);
                }
            }
            OperationEntry::AccountRequestRemove(_) => {
                if actor_perms == Permissions::None || actor == self.owner.as_slice() {
                    return Err(deny());
                }
                self.set(actor, actor_perms, AccountStatus::Removing);
            }
            OperationEntry::AccountsAdd(add) => {
                for a in &add.additions {
                    if a.permissions == Permissions::Owner
                        || a.identity == self.owner
                        || self.is_active(&a.identity)
                    {
                        return Err(deny());
                    }
                    self.set(&a.identity, a.permissions, AccountStatus::Active);
                }
            }
            OperationEntry::PermissionChange(ch) => self.change_permissions(rec, &ch.identity, ch.permissions)?,
            OperationEntry::PermissionChanges(chs) => {
                for ch in &chs.changes {
                    self.change_permissions(rec, &ch.identity, ch.permissions)?;
                }
            }
            OperationEntry::OwnershipChange(o) => {
                if actor != self.owner.as_slice() {
                    return Err(deny());
                }
                let old = self.owner.clone();
                self.set(&old, o.old_owner_permissions, AccountStatus::Active);
                self.set(&o.new_owner_identity, Permissions::Owner, AccountStatus::Active);
                self.owner = o.new_owner_identity.clone();
            }
            OperationEntry::ReadKeyChange(_) => {}
            OperationEntry::Unknown { tag, .. } => {
                warn!(record = %rec, tag, "skipping unknown acl operation during replay");
            }
        }
        Ok(())
    }

    fn change_permissions(&mut self, rec: &str, identity: &[u8], permissions: Permissions) -> Result<(), StateBuildError> {
        if identity == self.owner.as_slice() || permissions == Permissions::Owner {
            return Err(StateBuildError::Unauthorized { id: rec.to_string(), action: "permChange" });
        }
        match self.accounts.get_mut(identity) {
            Some(acc) if acc.status == AccountStatus::Active => {
                acc.permissions = permissions;
                Ok(())
            }
            _ => Err(StateBuildError::UnknownAccount { id: rec.to_string() }),
        }
    }
}
