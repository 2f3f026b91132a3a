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

//! Wire types of the ACL log and the canonical encoding helpers shared by every envelope.

use bincode::Options;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Upper bound for a single encoded record (outer envelope included).
pub const MAX_RECORD_BYTES: usize = 4 * 1024 * 1024;

/// Canonical serialization error.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// Value could not be serialized.
    #[error("serialization")]
    Serialize,
    /// Bytes do not match the expected schema.
    #[error("deserialization")]
    Deserialize,
    /// Input exceeds the configured cap.
    #[error("size limit exceeded")]
    TooLarge,
}

/// Canonical bincode options (deterministic).
fn bincode_opts() -> impl Options {
    // Fixint encoding provides a stable integer representation.
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

/// Encode with deterministic rules.
pub fn encode_canonical<T: Serialize>(v: &T) -> Result<Vec<u8>, CodecError> {
    bincode_opts()
        .serialize(v)
        .map_err(|_| CodecError::Serialize)
}

/// Decode with a hard size cap.
pub fn decode_canonical_limited<T: DeserializeOwned>(
    bytes: &[u8],
    max: usize,
) -> Result<T, CodecError> {
    if bytes.len() > max {
        return Err(CodecError::TooLarge);
    }
    // The deserializer limit stops forged container lengths from allocating past `max`.
    bincode_opts()
        .with_limit(max as u64)
        .deserialize(bytes)
        .map_err(|_| CodecError::Deserialize)
}

/// A record as handed out by the record source: content id plus encoded outer envelope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecordWithId {
    /// Content id of `payload`.
    pub id: String,
    /// Encoded [`RawRecord`].
    pub payload: Vec<u8>,
}

/// Outer signed and timestamped envelope.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Encoded inner payload ([`AclRoot`] for the root, [`ConsensusRecord`] otherwise).
    pub payload: Vec<u8>,
    /// Author signature over `payload`.
    pub signature: Vec<u8>,
    /// Identity of the coordinator that accepted the record (may be empty).
    pub acceptor_identity: Vec<u8>,
    /// Acceptor signature (may be empty).
    pub acceptor_signature: Vec<u8>,
    /// Acceptance time in seconds since UNIX epoch.
    pub acceptor_timestamp: i64,
}

/// One-to-one space descriptor carried by some roots.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneToOneInfo {
    /// Identity of the space owner.
    pub owner: Vec<u8>,
    /// Identities allowed to write.
    pub writers: Vec<Vec<u8>>,
}

/// Root payload: initial owner identity and key material markers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclRoot {
    /// Encoded identity of the creator.
    pub identity: Vec<u8>,
    /// Master key, if any.
    pub master_key: Option<Vec<u8>>,
    /// Space this log belongs to.
    pub space_id: String,
    /// Encrypted first read key, if any.
    pub encrypted_read_key: Option<Vec<u8>>,
    /// Creation time in seconds since UNIX epoch.
    pub timestamp: i64,
    /// Metadata public key, if any.
    pub metadata_pub_key: Option<Vec<u8>>,
    /// Encrypted metadata private key, if any.
    pub encrypted_metadata_priv_key: Option<Vec<u8>>,
    /// One-to-one descriptor, if any.
    pub one_to_one_info: Option<OneToOneInfo>,
}

/// Log-entry envelope wrapping the operation list of a delta record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusRecord {
    /// Id of the preceding record.
    pub prev_id: String,
    /// Encoded identity of the author.
    pub identity: Vec<u8>,
    /// Encoded [`AclData`].
    pub data: Vec<u8>,
    /// Author time in seconds since UNIX epoch.
    pub timestamp: i64,
}

/// Operation list payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclData {
    /// Tagged operation bodies in log order.
    pub contents: Vec<RawAclContent>,
}

/// A single tagged operation body; the tag selects the schema of `body`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAclContent {
    /// Variant tag.
    pub tag: u32,
    /// Canonical encoding of the variant.
    pub body: Vec<u8>,
}

/// Account permission level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Permissions {
    /// No permissions.
    #[default]
    None = 0,
    /// Space owner.
    Owner = 1,
    /// Administrator.
    Admin = 2,
    /// Writer.
    Writer = 3,
    /// Reader.
    Reader = 4,
    /// Guest.
    Guest = 5,
}

impl Permissions {
    /// All levels in numeric order.
    pub const ALL: [Permissions; 6] = [
        Permissions::None,
        Permissions::Owner,
        Permissions::Admin,
        Permissions::Writer,
        Permissions::Reader,
        Permissions::Guest,
    ];

    /// Display name.
    pub fn as_str(self) -> &'static str {
        match self {
            Permissions::None => "None",
            Permissions::Owner => "Owner",
            Permissions::Admin => "Admin",
            Permissions::Writer => "Writer",
            Permissions::Reader => "Reader",
            Permissions::Guest => "Guest",
        }
    }

    /// Owner or admin.
    pub fn can_manage_accounts(self) -> bool {
        matches!(self, Permissions::Owner | Permissions::Admin)
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account lifecycle status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AccountStatus {
    /// Unknown account.
    #[default]
    None = 0,
    /// Join request pending.
    Joining = 1,
    /// Member.
    Active = 2,
    /// Removed by an administrator.
    Removed = 3,
    /// Join request declined.
    Declined = 4,
    /// Asked to leave.
    Removing = 5,
    /// Join request withdrawn.
    Canceled = 6,
}

impl AccountStatus {
    /// All statuses in numeric order.
    pub const ALL: [AccountStatus; 7] = [
        AccountStatus::None,
        AccountStatus::Joining,
        AccountStatus::Active,
        AccountStatus::Removed,
        AccountStatus::Declined,
        AccountStatus::Removing,
        AccountStatus::Canceled,
    ];

    /// Display name.
    pub fn as_str(self) -> &'static str {
        match self {
            AccountStatus::None => "none",
            AccountStatus::Joining => "joining",
            AccountStatus::Active => "active",
            AccountStatus::Removed => "removed",
            AccountStatus::Declined => "declined",
            AccountStatus::Removing => "removing",
            AccountStatus::Canceled => "canceled",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Invite kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InviteType {
    /// Joiner sends a request that an administrator accepts.
    #[default]
    RequestToJoin = 0,
    /// Anyone holding the invite key joins directly.
    AnyoneCanJoin = 1,
}

impl InviteType {
    /// Display name.
    pub fn as_str(self) -> &'static str {
        match self {
            InviteType::RequestToJoin => "RequestToJoin",
            InviteType::AnyoneCanJoin => "AnyoneCanJoin",
        }
    }
}

impl fmt::Display for InviteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_rejects_trailing_bytes() {
        let mut bytes = encode_canonical(&RawAclContent { tag: 3, body: vec![1, 2] }).unwrap();
        bytes.push(0);
        let got: Result<RawAclContent, _> = decode_canonical_limited(&bytes, MAX_RECORD_BYTES);
        assert_eq!(got.unwrap_err(), CodecError::Deserialize);
    }

    #[test]
    fn codec_enforces_cap() {
        let bytes = encode_canonical(&vec![0u8; 64]).unwrap();
        let got: Result<Vec<u8>, _> = decode_canonical_limited(&bytes, 16);
        assert_eq!(got.unwrap_err(), CodecError::TooLarge);
    }

    #[test]
    fn enum_names_follow_numeric_order() {
        let roles: Vec<_> = Permissions::ALL.iter().map(|p| p.as_str()).collect();
        assert_eq!(roles, ["None", "Owner", "Admin", "Writer", "Reader", "Guest"]);
        for (i, s) in AccountStatus::ALL.iter().enumerate() {
            assert_eq!(*s as usize, i);
        }
        assert_eq!(AccountStatus::Canceled.to_string(), "canceled");
    }
}
