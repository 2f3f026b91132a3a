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

//! Account identities: the encoded public key carried in records and its account-id string.

use crate::core::types::{decode_canonical_limited, encode_canonical, CodecError};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Key type tag for Ed25519 public keys.
pub const KEY_TYPE_ED25519: u8 = 1;

/// Version byte prefixed to account ids.
const ACCOUNT_ID_VERSION: u8 = 0x5b;

const MAX_IDENTITY_BYTES: usize = 256;

/// Identity decode error. Callers that only render identities swallow it.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum IdentityDecodeError {
    /// Not an encoded public key.
    #[error("malformed identity encoding")]
    Encoding,
    /// Key type other than Ed25519.
    #[error("unsupported key type {0}")]
    KeyType(u8),
    /// Ed25519 key with the wrong length.
    #[error("bad key length {0}")]
    KeyLength(usize),
}

/// Encoded public key as carried inside records.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyProto {
    /// Key algorithm tag.
    pub key_type: u8,
    /// Raw key bytes.
    pub data: Vec<u8>,
}

/// Canonical account-id string of an Ed25519 key.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccountId(String);

impl AccountId {
    /// Derive from raw Ed25519 key bytes: base58(version || key || checksum[..4]).
    pub fn from_public_key(pk: &[u8; 32]) -> Self {
        let mut buf = Vec::with_capacity(1 + 32 + 4);
        buf.push(ACCOUNT_ID_VERSION);
        buf.extend_from_slice(pk);
        let digest = ring::digest::digest(&ring::digest::SHA256, &buf);
        buf.extend_from_slice(&digest.as_ref()[..4]);
        Self(bs58::encode(buf).into_string())
    }

    /// Full string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shortened `first4..last4` rendering.
    pub fn short(&self) -> String {
        format_account(&self.0)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Encode raw Ed25519 key bytes as record identity bytes.
pub fn encode_identity(pk: &[u8; 32]) -> Result<Vec<u8>, CodecError> {
    encode_canonical(&PublicKeyProto { key_type: KEY_TYPE_ED25519, data: pk.to_vec() })
}

/// Decode record identity bytes to raw Ed25519 key bytes.
pub fn decode_public_key(bytes: &[u8]) -> Result<[u8; 32], IdentityDecodeError> {
    let proto: PublicKeyProto = decode_canonical_limited(bytes, MAX_IDENTITY_BYTES)
        .map_err(|_| IdentityDecodeError::Encoding)?;
    if proto.key_type != KEY_TYPE_ED25519 {
        return Err(IdentityDecodeError::KeyType(proto.key_type));
    }
    if proto.data.len() != 32 {
        return Err(IdentityDecodeError::KeyLength(proto.data.len()));
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&proto.data);
    Ok(out)
}

/// Decode record identity bytes to an account id.
pub fn decode_account_identity(bytes: &[u8]) -> Result<AccountId, IdentityDecodeError> {
    decode_public_key(bytes).map(|pk| AccountId::from_public_key(&pk))
}

/// `first4..last4` of an account-id string. Strings of 8 characters or fewer are returned as is.
pub fn format_account(account_id: &str) -> String {
    let chars: Vec<char> = account_id.chars().collect();
    if chars.len() <= 8 {
        return account_id.to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}..{tail}")
}

/// Render identity bytes for operator output; undecodable identities become `invalid`.
pub fn format_identity(bytes: &[u8]) -> String {
    match decode_account_identity(bytes) {
        Ok(id) => id.short(),
        Err(e) => {
            debug!(error = %e, len = bytes.len(), "identity rendered as invalid");
            "invalid".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_roundtrip_gives_stable_account() {
        let pk = [7u8; 32];
        let bytes = encode_identity(&pk).unwrap();
        let id = decode_account_identity(&bytes).unwrap();
        assert_eq!(id, AccountId::from_public_key(&pk));
        let short = format_identity(&bytes);
        assert_eq!(short.len(), 10);
        assert!(id.as_str().starts_with(&short[..4]));
        assert!(id.as_str().ends_with(&short[6..]));
    }

    #[test]
    fn bad_identities_render_invalid() {
        assert_eq!(format_identity(&[]), "invalid");
        assert_eq!(format_identity(b"garbage"), "invalid");
        let wrong_type = encode_canonical(&PublicKeyProto { key_type: 9, data: vec![0; 32] }).unwrap();
        assert_eq!(decode_public_key(&wrong_type), Err(IdentityDecodeError::KeyType(9)));
        let short_key = encode_canonical(&PublicKeyProto { key_type: KEY_TYPE_ED25519, data: vec![0; 5] }).unwrap();
        assert_eq!(decode_public_key(&short_key), Err(IdentityDecodeError::KeyLength(5)));
        assert_eq!(format_identity(&short_key), "invalid");
    }

    #[test]
    fn short_account_strings_are_not_cut() {
        assert_eq!(format_account("abcdefgh"), "abcdefgh");
        assert_eq!(format_account("abcdefghi"), "abcd..fghi");
    }
}
