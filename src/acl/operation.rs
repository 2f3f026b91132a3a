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

//! ACL operations carried by delta records.
//!
//! Each operation travels as a `(tag, body)` pair. Decoding resolves the tag once into
//! [`OperationEntry`]; a tag this build does not know, or a body that does not match the
//! schema of its tag, becomes [`OperationEntry::Unknown`] so that newer logs stay readable.

use crate::acl::format::format_id;
use crate::core::identity::format_identity;
use crate::core::types::{
    decode_canonical_limited, encode_canonical, CodecError, InviteType, Permissions, RawAclContent,
    MAX_RECORD_BYTES,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Wire tags.
pub mod tag {
    #![allow(missing_docs)]
    pub const INVITE: u32 = 1;
    pub const INVITE_REVOKE: u32 = 2;
    pub const REQUEST_JOIN: u32 = 3;
    pub const REQUEST_ACCEPT: u32 = 4;
    pub const PERMISSION_CHANGE: u32 = 5;
    pub const ACCOUNT_REMOVE: u32 = 6;
    pub const READ_KEY_CHANGE: u32 = 7;
    pub const REQUEST_DECLINE: u32 = 8;
    pub const ACCOUNT_REQUEST_REMOVE: u32 = 9;
    pub const PERMISSION_CHANGES: u32 = 10;
    pub const ACCOUNTS_ADD: u32 = 11;
    pub const REQUEST_CANCEL: u32 = 12;
    pub const INVITE_JOIN: u32 = 13;
    pub const INVITE_CHANGE: u32 = 14;
    pub const OWNERSHIP_CHANGE: u32 = 15;
}

/// New invite.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invite {
    /// Encoded invite public key.
    pub invite_key: Vec<u8>,
    /// Invite kind.
    pub invite_type: InviteType,
    /// Permissions granted on join.
    pub permissions: Permissions,
    /// Read key encrypted for the invite key.
    pub encrypted_read_key: Vec<u8>,
}

/// Invite withdrawal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteRevoke {
    /// Record id of the invite.
    pub invite_record_id: String,
}

/// Permission update of an existing invite.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteChange {
    /// Record id of the invite.
    pub invite_record_id: String,
    /// New permissions.
    pub permissions: Permissions,
}

/// Direct join through an `AnyoneCanJoin` invite.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteJoin {
    /// Encoded identity of the joiner.
    pub identity: Vec<u8>,
    /// Record id of the invite.
    pub invite_record_id: String,
    /// Invite key signature over the joiner identity.
    pub invite_identity_signature: Vec<u8>,
    /// Permissions taken.
    pub permissions: Permissions,
    /// Opaque joiner metadata.
    pub metadata: Vec<u8>,
}

/// Join request against a `RequestToJoin` invite.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestJoin {
    /// Encoded invite identity.
    pub invite_identity: Vec<u8>,
    /// Record id of the invite.
    pub invite_record_id: String,
    /// Invite key signature over the requester identity.
    pub invite_identity_signature: Vec<u8>,
    /// Opaque requester metadata.
    pub metadata: Vec<u8>,
}

/// Acceptance of a join request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestAccept {
    /// Encoded identity of the requester.
    pub identity: Vec<u8>,
    /// Record id of the request.
    pub request_record_id: String,
    /// Read key encrypted for the requester.
    pub encrypted_read_key: Vec<u8>,
    /// Granted permissions.
    pub permissions: Permissions,
}

/// Decline of a join request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDecline {
    /// Record id of the request.
    pub request_record_id: String,
}

/// Withdrawal of a join request by its author.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestCancel {
    /// Record id of the request.
    pub record_id: String,
}

/// Single permission update.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionChange {
    /// Encoded identity of the account.
    pub identity: Vec<u8>,
    /// New permissions.
    pub permissions: Permissions,
}

/// Batch of permission updates.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionChanges {
    /// Updates in order.
    pub changes: Vec<PermissionChange>,
}

/// Encrypted key addressed to one identity.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedKey {
    /// Encoded recipient identity.
    pub identity: Vec<u8>,
    /// Encrypted key bytes.
    pub encrypted_read_key: Vec<u8>,
}

/// Read key rotation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadKeyChange {
    /// Keys for member accounts.
    pub account_keys: Vec<EncryptedKey>,
    /// Keys for outstanding invites.
    pub invite_keys: Vec<EncryptedKey>,
    /// New metadata public key.
    pub metadata_pub_key: Vec<u8>,
}

/// Removal of accounts with the accompanying key rotation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRemove {
    /// Encoded identities removed.
    pub identities: Vec<Vec<u8>>,
    /// Key rotation excluding the removed accounts.
    pub read_key_change: ReadKeyChange,
}

/// Request by the author to leave.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRequestRemove {}

/// Single direct addition.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountAdd {
    /// Encoded identity added.
    pub identity: Vec<u8>,
    /// Granted permissions.
    pub permissions: Permissions,
    /// Opaque metadata.
    pub metadata: Vec<u8>,
    /// Read key encrypted for the account.
    pub encrypted_read_key: Vec<u8>,
}

/// Batch of direct additions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountsAdd {
    /// Additions in order.
    pub additions: Vec<AccountAdd>,
}

/// Ownership transfer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipChange {
    /// Encoded identity of the new owner.
    pub new_owner_identity: Vec<u8>,
    /// Permissions kept by the previous owner.
    pub old_owner_permissions: Permissions,
}

/// A decoded operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OperationEntry {
    /// Ownership transfer.
    OwnershipChange(OwnershipChange),
    /// Invite permission update.
    InviteChange(InviteChange),
    /// Direct join through an invite.
    InviteJoin(InviteJoin),
    /// Single permission update.
    PermissionChange(PermissionChange),
    /// New invite.
    Invite(Invite),
    /// Invite withdrawal.
    InviteRevoke(InviteRevoke),
    /// Join request.
    RequestJoin(RequestJoin),
    /// Join request accepted.
    RequestAccept(RequestAccept),
    /// Join request declined.
    RequestDecline(RequestDecline),
    /// Join request withdrawn.
    RequestCancel(RequestCancel),
    /// Accounts removed.
    AccountRemove(AccountRemove),
    /// Read key rotated.
    ReadKeyChange(ReadKeyChange),
    /// Author asks to leave.
    AccountRequestRemove(AccountRequestRemove),
    /// Accounts added directly.
    AccountsAdd(AccountsAdd),
    /// Batch permission update.
    PermissionChanges(PermissionChanges),
    /// Unrecognised tag or body.
    Unknown {
        /// Wire tag.
        tag: u32,
        /// Undecoded body.
        raw: Vec<u8>,
    },
}

fn body<T: DeserializeOwned>(raw: &[u8]) -> Option<T> {
    decode_canonical_limited(raw, MAX_RECORD_BYTES).ok()
}

impl OperationEntry {
    /// Resolve a tagged body. Never fails: unmatched shapes become [`OperationEntry::Unknown`].
    pub fn from_raw(content: &RawAclContent) -> Self {
        let b = content.body.as_slice();
        let decoded = match content.tag {
            tag::OWNERSHIP_CHANGE => body(b).map(Self::OwnershipChange),
            tag::INVITE_CHANGE => body(b).map(Self::InviteChange),
            tag::INVITE_JOIN => body(b).map(Self::InviteJoin),
            tag::PERMISSION_CHANGE => body(b).map(Self::PermissionChange),
            tag::INVITE => body(b).map(Self::Invite),
            tag::INVITE_REVOKE => body(b).map(Self::InviteRevoke),
            tag::REQUEST_JOIN => body(b).map(Self::RequestJoin),
            tag::REQUEST_ACCEPT => body(b).map(Self::RequestAccept),
            tag::REQUEST_DECLINE => body(b).map(Self::RequestDecline),
            tag::REQUEST_CANCEL => body(b).map(Self::RequestCancel),
            tag::ACCOUNT_REMOVE => body(b).map(Self::AccountRemove),
            tag::READ_KEY_CHANGE => body(b).map(Self::ReadKeyChange),
            tag::ACCOUNT_REQUEST_REMOVE => body(b).map(Self::AccountRequestRemove),
            tag::ACCOUNTS_ADD => body(b).map(Self::AccountsAdd),
            tag::PERMISSION_CHANGES => body(b).map(Self::PermissionChanges),
            _ => None,
        };
        decoded.unwrap_or_else(|| Self::Unknown { tag: content.tag, raw: content.body.clone() })
    }

    /// Encode back to a tagged body.
    pub fn to_raw(&self) -> Result<RawAclContent, CodecError> {
        let (tag, body) = match self {
            Self::OwnershipChange(v) => (tag::OWNERSHIP_CHANGE, encode_canonical(v)?),
            Self::InviteChange(v) => (tag::INVITE_CHANGE, encode_canonical(v)?),
            Self::InviteJoin(v) => (tag::INVITE_JOIN, encode_canonical(v)?),
            Self::PermissionChange(v) => (tag::PERMISSION_CHANGE, encode_canonical(v)?),
            Self::Invite(v) => (tag::INVITE, encode_canonical(v)?),
            Self::InviteRevoke(v) => (tag::INVITE_REVOKE, encode_canonical(v)?),
            Self::RequestJoin(v) => (tag::REQUEST_JOIN, encode_canonical(v)?),
            Self::RequestAccept(v) => (tag::REQUEST_ACCEPT, encode_canonical(v)?),
            Self::RequestDecline(v) => (tag::REQUEST_DECLINE, encode_canonical(v)?),
            Self::RequestCancel(v) => (tag::REQUEST_CANCEL, encode_canonical(v)?),
            Self::AccountRemove(v) => (tag::ACCOUNT_REMOVE, encode_canonical(v)?),
            Self::ReadKeyChange(v) => (tag::READ_KEY_CHANGE, encode_canonical(v)?),
            Self::AccountRequestRemove(v) => (tag::ACCOUNT_REQUEST_REMOVE, encode_canonical(v)?),
            Self::AccountsAdd(v) => (tag::ACCOUNTS_ADD, encode_canonical(v)?),
            Self::PermissionChanges(v) => (tag::PERMISSION_CHANGES, encode_canonical(v)?),
            Self::Unknown { tag, raw } => (*tag, raw.clone()),
        };
        Ok(RawAclContent { tag, body })
    }

    /// Short kind name used in audit lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::OwnershipChange(_) => "ownerChange",
            Self::InviteChange(_) => "inviteChange",
            Self::InviteJoin(_) => "inviteJoin",
            Self::PermissionChange(_) => "permChange",
            Self::Invite(_) => "invite",
            Self::InviteRevoke(_) => "inviteRevoke",
            Self::RequestJoin(_) => "requestJoin",
            Self::RequestAccept(_) => "requestAccept",
            Self::RequestDecline(_) => "requestDecline",
            Self::RequestCancel(_) => "requestCancel",
            Self::AccountRemove(_) => "accountRemove",
            Self::ReadKeyChange(_) => "readKeyChange",
            Self::AccountRequestRemove(_) => "accountRequestRemove",
            Self::AccountsAdd(_) => "accountsAdd",
            Self::PermissionChanges(_) => "permissionChanges",
            Self::Unknown { .. } => "unknown",
        }
    }
}

/// Operation kind plus its rendered detail fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormattedOperation {
    /// Kind name.
    pub kind: &'static str,
    /// `key=value` fields in output order.
    pub details: Vec<String>,
}

impl FormattedOperation {
    /// Details joined with `,`.
    pub fn joined_details(&self) -> String {
        self.details.join(",")
    }
}

/// Render an operation for the audit log. Total over all inputs.
pub fn format_operation(entry: &OperationEntry) -> FormattedOperation {
    let mut d = Vec::new();
    match entry {
        OperationEntry::OwnershipChange(op) => {
            d.push(format!("newOwner={}", format_identity(&op.new_owner_identity)));
        }
        OperationEntry::InviteChange(op) => {
            d.push(format!("invId={}", format_id(&op.invite_record_id)));
            d.push(format!("perm={}", op.permissions));
        }
        OperationEntry::InviteJoin(op) => {
            d.push(format!("invId={}", format_id(&op.invite_record_id)));
            d.push(format!("perm={}", op.permissions));
            if !op.metadata.is_empty() {
                d.push("meta".to_string());
            }
        }
        OperationEntry::PermissionChange(op) => {
            d.push(format!("ident={}", format_identity(&op.identity)));
            d.push(format!("perm={}", op.permissions));
        }
        OperationEntry::Invite(op) => {
            d.push(format!("type={}", op.invite_type));
            d.push(format!("perm={}", op.permissions));
        }
        OperationEntry::InviteRevoke(op) => {
            d.push(format!("invId={}", format_id(&op.invite_record_id)));
        }
        OperationEntry::RequestJoin(op) => {
            d.push(format!("invId={}", format_id(&op.invite_record_id)));
            d.push(format!("ident={}", format_identity(&op.invite_identity)));
        }
        OperationEntry::RequestAccept(op) => {
            d.push(format!("reqId={}", format_id(&op.request_record_id)));
            d.push(format!("ident={}", format_identity(&op.identity)));
        }
        OperationEntry::RequestDecline(op) => {
            d.push(format!("reqId={}", format_id(&op.request_record_id)));
        }
        OperationEntry::RequestCancel(op) => {
            d.push(format!("reqId={}", format_id(&op.record_id)));
        }
        OperationEntry::AccountRemove(op) => {
            for ident in &op.identities {
                d.push(format!("ident={}", format_identity(ident)));
            }
            d.push(format!("newKeyForIdents={}", op.read_key_change.account_keys.len()));
        }
        OperationEntry::ReadKeyChange(op) => {
            for k in &op.invite_keys {
                d.push(format!("ikIdent={}", format_identity(&k.identity)));
            }
            for k in &op.account_keys {
                d.push(format!("accIdent={}", format_identity(&k.identity)));
            }
        }
        OperationEntry::AccountRequestRemove(_) => {}
        OperationEntry::AccountsAdd(op) => {
            for add in &op.additions {
                d.push(format!("ident={}", format_identity(&add.identity)));
            }
        }
        OperationEntry::PermissionChanges(op) => {
            for ch in &op.changes {
                d.push(format!("ident={}", format_identity(&ch.identity)));
                d.push(format!("perm={}", ch.permissions));
            }
        }
        OperationEntry::Unknown { tag, raw } => {
            d.push(format!("tag={tag}"));
            d.push(format!("raw={}", hex::encode(raw)));
        }
    }
    FormattedOperation { kind: entry.kind(), details: d }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::encode_identity;

    fn ident(b: u8) -> Vec<u8> {
        encode_identity(&[b; 32]).unwrap()
    }

    #[test]
    fn permission_change_details() {
        let op = OperationEntry::PermissionChange(PermissionChange {
            identity: ident(1),
            permissions: Permissions::Writer,
        });
        let f = format_operation(&op);
        assert_eq!(f.kind, "permChange");
        assert_eq!(f.joined_details(), format!("ident={},perm=Writer", format_identity(&ident(1))));
    }

    #[test]
    fn invite_join_reports_metadata_marker() {
        let mut join = InviteJoin {
            invite_record_id: "bafyinvite42".into(),
            permissions: Permissions::Reader,
            ..Default::default()
        };
        let f = format_operation(&OperationEntry::InviteJoin(join.clone()));
        assert_eq!(f.details, vec!["invId=ite42", "perm=Reader"]);
        join.metadata = vec![1];
        let f = format_operation(&OperationEntry::InviteJoin(join));
        assert_eq!(f.details.last().map(String::as_str), Some("meta"));
    }

    #[test]
    fn account_remove_counts_new_keys() {
        let op = OperationEntry::AccountRemove(AccountRemove {
            identities: vec![ident(2), b"broken".to_vec()],
            read_key_change: ReadKeyChange {
                account_keys: vec![EncryptedKey::default(); 3],
                ..Default::default()
            },
        });
        let f = format_operation(&op);
        assert_eq!(f.details.len(), 3);
        assert_eq!(f.details[1], "ident=invalid");
        assert_eq!(f.details[2], "newKeyForIdents=3");
    }

    #[test]
    fn read_key_change_lists_invite_keys_first() {
        let op = OperationEntry::ReadKeyChange(ReadKeyChange {
            account_keys: vec![EncryptedKey { identity: ident(3), ..Default::default() }],
            invite_keys: vec![EncryptedKey { identity: ident(4), ..Default::default() }],
            ..Default::default()
        });
        let f = format_operation(&op);
        assert!(f.details[0].starts_with("ikIdent="));
        assert!(f.details[1].starts_with("accIdent="));
    }

    #[test]
    fn unknown_tag_and_bad_body_fall_back() {
        let unseen = OperationEntry::from_raw(&RawAclContent { tag: 99, body: vec![0xde, 0xad] });
        let f = format_operation(&unseen);
        assert_eq!(f.kind, "unknown");
        assert_eq!(f.details, vec!["tag=99", "raw=dead"]);

        let bad = OperationEntry::from_raw(&RawAclContent { tag: tag::INVITE_REVOKE, body: vec![1] });
        assert_eq!(bad.kind(), "unknown");
    }

    #[test]
    fn empty_body_variant_decodes() {
        let raw = OperationEntry::AccountRequestRemove(AccountRequestRemove {}).to_raw().unwrap();
        assert!(raw.body.is_empty());
        let back = OperationEntry::from_raw(&raw);
        assert_eq!(back.kind(), "accountRequestRemove");
        assert!(format_operation(&back).details.is_empty());
    }

    #[test]
    fn every_variant_renders_exact_details() {
        let (a, b) = (format_identity(&ident(1)), format_identity(&ident(2)));
        let key = |n: u8| EncryptedKey { identity: ident(n), ..Default::default() };
        let cases: Vec<(OperationEntry, &str, String)> = vec![
            (
                OperationEntry::OwnershipChange(OwnershipChange {
                    new_owner_identity: ident(1),
                    old_owner_permissions: Permissions::Admin,
                }),
                "ownerChange",
                format!("newOwner={a}"),
            ),
            (
                OperationEntry::InviteChange(InviteChange {
                    invite_record_id: "bafyinv00001".into(),
                    permissions: Permissions::Admin,
                }),
                "inviteChange",
                "invId=00001,perm=Admin".into(),
            ),
            (
                OperationEntry::InviteJoin(InviteJoin {
                    identity: ident(1),
                    invite_record_id: "bafyinv00002".into(),
                    permissions: Permissions::Reader,
                    metadata: vec![7],
                    ..Default::default()
                }),
                "inviteJoin",
                "invId=00002,perm=Reader,meta".into(),
            ),
            (
                OperationEntry::PermissionChange(PermissionChange { identity: ident(2), permissions: Permissions::Guest }),
                "permChange",
                format!("ident={b},perm=Guest"),
            ),
            (
                OperationEntry::Invite(Invite {
                    invite_type: InviteType::AnyoneCanJoin,
                    permissions: Permissions::Writer,
                    ..Default::default()
                }),
                "invite",
                "type=AnyoneCanJoin,perm=Writer".into(),
            ),
            (
                OperationEntry::Invite(Invite::default()),
                "invite",
                "type=RequestToJoin,perm=None".into(),
            ),
            (
                OperationEntry::InviteRevoke(InviteRevoke { invite_record_id: "bafyinv00003".into() }),
                "inviteRevoke",
                "invId=00003".into(),
            ),
            (
                OperationEntry::RequestJoin(RequestJoin {
                    invite_identity: ident(1),
                    invite_record_id: "bafyinv00004".into(),
                    ..Default::default()
                }),
                "requestJoin",
                format!("invId=00004,ident={a}"),
            ),
            (
                OperationEntry::RequestAccept(RequestAccept {
                    identity: ident(2),
                    request_record_id: "bafyreq00005".into(),
                    permissions: Permissions::Writer,
                    ..Default::default()
                }),
                "requestAccept",
                format!("reqId=00005,ident={b}"),
            ),
            (
                OperationEntry::RequestDecline(RequestDecline { request_record_id: "bafyreq00006".into() }),
                "requestDecline",
                "reqId=00006".into(),
            ),
            (
                OperationEntry::RequestCancel(RequestCancel { record_id: "bafyreq00007".into() }),
                "requestCancel",
                "reqId=00007".into(),
            ),
            (
                OperationEntry::AccountRemove(AccountRemove {
                    identities: vec![ident(1), ident(2)],
                    read_key_change: ReadKeyChange { account_keys: vec![key(3)], ..Default::default() },
                }),
                "accountRemove",
                format!("ident={a},ident={b},newKeyForIdents=1"),
            ),
            (
                OperationEntry::ReadKeyChange(ReadKeyChange {
                    account_keys: vec![key(1)],
                    invite_keys: vec![key(2)],
                    ..Default::default()
                }),
                "readKeyChange",
                format!("ikIdent={b},accIdent={a}"),
            ),
            (OperationEntry::AccountRequestRemove(AccountRequestRemove {}), "accountRequestRemove", String::new()),
            (
                OperationEntry::AccountsAdd(AccountsAdd {
                    additions: vec![
                        AccountAdd { identity: ident(1), permissions: Permissions::Reader, ..Default::default() },
                        AccountAdd { identity: ident(2), permissions: Permissions::Writer, ..Default::default() },
                    ],
                }),
                "accountsAdd",
                format!("ident={a},ident={b}"),
            ),
            (
                OperationEntry::PermissionChanges(PermissionChanges {
                    changes: vec![
                        PermissionChange { identity: ident(1), permissions: Permissions::Reader },
                        PermissionChange { identity: ident(2), permissions: Permissions::Admin },
                    ],
                }),
                "permissionChanges",
                format!("ident={a},perm=Reader,ident={b},perm=Admin"),
            ),
        ];

        for (op, kind, details) in cases {
            let f = format_operation(&op);
            assert_eq!(f.kind, kind, "{op:?}");
            assert_eq!(f.joined_details(), details, "{op:?}");
        }
    }
}
