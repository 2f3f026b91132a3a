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

//! Nested record envelopes.
//!
//! ```text
//! root:  RawRecordWithId.payload -> RawRecord -> AclRoot
//! delta: RawRecordWithId.payload -> RawRecord -> ConsensusRecord -> AclData -> [RawAclContent]
//! ```
//!
//! Decoding names the stage that failed. Sealing (signing and wrapping) produces records
//! with content ids so dumps can be built offline.

use crate::acl::operation::OperationEntry;
use crate::core::security::keys::AccountKeys;
use crate::core::types::{
    decode_canonical_limited, encode_canonical, AclData, AclRoot, CodecError, ConsensusRecord,
    RawRecord, RawRecordWithId, MAX_RECORD_BYTES,
};
use std::fmt;
use thiserror::Error;

/// Envelope layer that failed to decode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeStage {
    /// Outer signed and timestamped envelope.
    Outer,
    /// Root payload.
    Root,
    /// Log-entry envelope of a delta.
    LogEntry,
    /// Operation list of a delta.
    Operations,
}

impl fmt::Display for DecodeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DecodeStage::Outer => "raw record",
            DecodeStage::Root => "acl root",
            DecodeStage::LogEntry => "consensus record",
            DecodeStage::Operations => "acl data",
        })
    }
}

/// Stage-annotated decode failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unmarshal {stage} of record {record_id} failed: {source}")]
pub struct DecodeError {
    /// Failing layer.
    pub stage: DecodeStage,
    /// Id of the offending record.
    pub record_id: String,
    /// Codec failure.
    #[source]
    pub source: CodecError,
}

/// Key material markers present on a root.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RootFlags {
    /// Master key set.
    pub master_key: bool,
    /// Metadata public key set.
    pub meta_key: bool,
    /// Encrypted read key set.
    pub read_key: bool,
    /// One-to-one descriptor set.
    pub one_to_one: bool,
}

impl RootFlags {
    /// Flags of a decoded root.
    pub fn of(root: &AclRoot) -> Self {
        Self {
            master_key: root.master_key.is_some(),
            meta_key: root.metadata_pub_key.is_some(),
            read_key: root.encrypted_read_key.is_some(),
            one_to_one: root.one_to_one_info.is_some(),
        }
    }

    /// Names of the set flags in output order.
    pub fn names(&self) -> Vec<&'static str> {
        [
            (self.master_key, "masterKey"),
            (self.meta_key, "metaKey"),
            (self.read_key, "readKey"),
            (self.one_to_one, "oneToOne"),
        ]
        .into_iter()
        .filter_map(|(set, name)| set.then_some(name))
        .collect()
    }
}

impl fmt::Display for RootFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.names().join(","))
    }
}

/// Decoded root record.
#[derive(Clone, Debug)]
pub struct DecodedRoot {
    /// Record id.
    pub id: String,
    /// Outer envelope.
    pub envelope: RawRecord,
    /// Root payload.
    pub root: AclRoot,
}

impl DecodedRoot {
    /// Encoded identity of the creator.
    pub fn identity(&self) -> &[u8] {
        &self.root.identity
    }

    /// Acceptance time in seconds.
    pub fn accepted_at(&self) -> i64 {
        self.envelope.acceptor_timestamp
    }

    /// Present key material markers.
    pub fn flags(&self) -> RootFlags {
        RootFlags::of(&self.root)
    }
}

/// Decoded delta record.
#[derive(Clone, Debug)]
pub struct DecodedDelta {
    /// Record id.
    pub id: String,
    /// Outer envelope.
    pub envelope: RawRecord,
    /// Log-entry envelope.
    pub record: ConsensusRecord,
    /// Operations in record order.
    pub operations: Vec<OperationEntry>,
}

impl DecodedDelta {
    /// Encoded identity of the author.
    pub fn identity(&self) -> &[u8] {
        &self.record.identity
    }

    /// Acceptance time in seconds.
    pub fn accepted_at(&self) -> i64 {
        self.envelope.acceptor_timestamp
    }
}

fn outer(raw: &RawRecordWithId) -> Result<RawRecord, DecodeError> {
    decode_canonical_limited(&raw.payload, MAX_RECORD_BYTES).map_err(|source| DecodeError {
        stage: DecodeStage::Outer,
        record_id: raw.id.clone(),
        source,
    })
}

/// Decode a root record.
pub fn decode_root(raw: &RawRecordWithId) -> Result<DecodedRoot, DecodeError> {
    let envelope = outer(raw)?;
    let root = decode_canonical_limited(&envelope.payload, MAX_RECORD_BYTES).map_err(|source| {
        DecodeError { stage: DecodeStage::Root, record_id: raw.id.clone(), source }
    })?;
    Ok(DecodedRoot { id: raw.id.clone(), envelope, root })
}

/// Decode a delta record down to its operations.
pub fn decode_delta(raw: &RawRecordWithId) -> Result<DecodedDelta, DecodeError> {
    let envelope = outer(raw)?;
    let record: ConsensusRecord = decode_canonical_limited(&envelope.payload, MAX_RECORD_BYTES)
        .map_err(|source| DecodeError {
            stage: DecodeStage::LogEntry,
            record_id: raw.id.clone(),
            source,
        })?;
    let data: AclData = decode_canonical_limited(&record.data, MAX_RECORD_BYTES).map_err(|source| {
        DecodeError { stage: DecodeStage::Operations, record_id: raw.id.clone(), source }
    })?;
    let operations = data.contents.iter().map(OperationEntry::from_raw).collect();
    Ok(DecodedDelta { id: raw.id.clone(), envelope, record, operations })
}

/// Content id of an encoded outer envelope: base58(SHA-256(payload)).
pub fn record_id_for(payload: &[u8]) -> String {
    let digest = ring::digest::digest(&ring::digest::SHA256, payload);
    bs58::encode(digest.as_ref()).into_string()
}

fn seal(keys: &AccountKeys, inner: Vec<u8>, accepted_at: i64) -> Result<RawRecordWithId, CodecError> {
    let envelope = RawRecord {
        signature: keys.sign(&inner),
        payload: inner,
        acceptor_timestamp: accepted_at,
        ..Default::default()
    };
    let payload = encode_canonical(&envelope)?;
    Ok(RawRecordWithId { id: record_id_for(&payload), payload })
}

/// Sign and wrap a root payload. The payload identity should be `keys.identity()`.
pub fn seal_root(keys: &AccountKeys, root: &AclRoot, accepted_at: i64) -> Result<RawRecordWithId, CodecError> {
    seal(keys, encode_canonical(root)?, accepted_at)
}

/// Build, sign and wrap a delta record authored by `keys`.
pub fn seal_delta(
    keys: &AccountKeys,
    prev_id: &str,
    operations: &[OperationEntry],
    accepted_at: i64,
) -> Result<RawRecordWithId, CodecError> {
    let contents = operations.iter().map(OperationEntry::to_raw).collect::<Result<Vec<_>, _>>()?;
    let record = ConsensusRecord {
        prev_id: prev_id.to_string(),
        identity: keys.identity(),
        data: encode_canonical(&AclData { contents })?,
        timestamp: accepted_at,
    };
    seal(keys, encode_canonical(&record)?, accepted_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acl::operation::{InviteRevoke, OperationEntry};

    fn keys() -> AccountKeys {
        AccountKeys::generate().unwrap().0
    }

    #[test]
    fn root_flags_follow_present_fields() {
        let k = keys();
        let root = AclRoot {
            identity: k.identity(),
            master_key: Some(vec![1]),
            encrypted_read_key: Some(vec![]),
            ..Default::default()
        };
        let rec = seal_root(&k, &root, 10).unwrap();
        let decoded = decode_root(&rec).unwrap();
        assert_eq!(decoded.flags().to_string(), "masterKey,readKey");
        assert_eq!(decoded.accepted_at(), 10);
        assert_eq!(rec.id, record_id_for(&rec.payload));
    }

    #[test]
    fn stages_are_reported() {
        let garbage = RawRecordWithId { id: "bad".into(), payload: vec![1, 2, 3] };
        assert_eq!(decode_root(&garbage).unwrap_err().stage, DecodeStage::Outer);
        assert_eq!(decode_delta(&garbage).unwrap_err().stage, DecodeStage::Outer);

        let wrap = |inner: Vec<u8>| RawRecordWithId {
            id: "x".into(),
            payload: encode_canonical(&RawRecord { payload: inner, ..Default::default() }).unwrap(),
        };
        assert_eq!(decode_root(&wrap(vec![0xff])).unwrap_err().stage, DecodeStage::Root);
        assert_eq!(decode_delta(&wrap(vec![0xff])).unwrap_err().stage, DecodeStage::LogEntry);

        let record = ConsensusRecord { data: vec![0xff; 3], ..Default::default() };
        let err = decode_delta(&wrap(encode_canonical(&record).unwrap())).unwrap_err();
        assert_eq!(err.stage, DecodeStage::Operations);
        assert!(err.to_string().starts_with("unmarshal acl data of record x failed"));
    }

    #[test]
    fn delta_keeps_operation_order() {
        let k = keys();
        let ops = vec![
            OperationEntry::InviteRevoke(InviteRevoke { invite_record_id: "a".into() }),
            OperationEntry::Unknown { tag: 77, raw: vec![] },
        ];
        let rec = seal_delta(&k, "prev", &ops, 5).unwrap();
        let d = decode_delta(&rec).unwrap();
        assert_eq!(d.operations, ops);
        assert_eq!(d.record.prev_id, "prev");
        assert_eq!(d.identity(), k.identity().as_slice());
    }
}
