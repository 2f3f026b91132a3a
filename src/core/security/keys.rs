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

//! Ed25519 account keys: generation, PKCS#8 persistence, record signing and verification.

use crate::core::identity::{encode_identity, AccountId};
use ring::{
    rand::SystemRandom,
    signature::{Ed25519KeyPair, KeyPair, UnparsedPublicKey, ED25519},
};
use std::{fs, io::Write, path::Path};
use thiserror::Error;
use zeroize::Zeroize;

/// Key errors.
#[derive(Debug, Error)]
pub enum KeyError {
    /// Filesystem failure.
    #[error("key file io: {0}")]
    Io(#[from] std::io::Error),
    /// Stored bytes are not an Ed25519 PKCS#8 document.
    #[error("invalid key encoding")]
    InvalidKey,
    /// Key generation failed.
    #[error("crypto")]
    Crypto,
    /// Signature does not verify.
    #[error("bad signature")]
    BadSignature,
}

/// An account's Ed25519 key pair.
pub struct AccountKeys {
    keypair: Ed25519KeyPair,
}

impl AccountKeys {
    /// Generate a fresh key pair. Returns the keys and their PKCS#8 document.
    pub fn generate() -> Result<(Self, Vec<u8>), KeyError> {
        let rng = SystemRandom::new();
        let pkcs8 = Ed25519KeyPair::generate_pkcs8(&rng).map_err(|_| KeyError::Crypto)?;
        let keys = Self::from_pkcs8(pkcs8.as_ref())?;
        Ok((keys, pkcs8.as_ref().to_vec()))
    }

    /// Parse a PKCS#8 document.
    pub fn from_pkcs8(pkcs8: &[u8]) -> Result<Self, KeyError> {
        let keypair = Ed25519KeyPair::from_pkcs8(pkcs8).map_err(|_| KeyError::InvalidKey)?;
        Ok(Self { keypair })
    }

    /// Load the key at `path`, or create and persist a new one (mode 0600).
    pub fn load_or_create(path: &Path) -> Result<Self, KeyError> {
        if path.exists() {
            let mut bytes = fs::read(path)?;
            let keys = Self::from_pkcs8(&bytes);
            bytes.zeroize();
            return keys;
        }
        let (keys, mut pkcs8) = Self::generate()?;
        let written = atomic_write_private(path, &pkcs8);
        pkcs8.zeroize();
        written?;
        Ok(keys)
    }

    /// Raw public key.
    pub fn public_key(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(self.keypair.public_key().as_ref());
        out
    }

    /// Identity bytes as embedded in records.
    pub fn identity(&self) -> Vec<u8> {
        // A 32-byte key always encodes.
        encode_identity(&self.public_key()).unwrap_or_default()
    }

    /// Account id of this key.
    pub fn account_id(&self) -> AccountId {
        AccountId::from_public_key(&self.public_key())
    }

    /// Sign message bytes.
    pub fn sign(&self, msg: &[u8]) -> Vec<u8> {
        self.keypair.sign(msg).as_ref().to_vec()
    }
}

/// Verify an Ed25519 signature given raw public key bytes.
pub fn verify_signature(pk: &[u8; 32], msg: &[u8], sig: &[u8]) -> Result<(), KeyError> {
    // ring requires signature length 64 for Ed25519
    if sig.len() != 64 {
        return Err(KeyError::BadSignature);
    }
    UnparsedPublicKey::new(&ED25519, pk)
        .verify(msg, sig)
        .map_err(|_| KeyError::BadSignature)
}

fn set_private_perms_best_effort(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o600));
    }
}

/// Write to a sibling temp file, fsync, then rename into place.
fn atomic_write_private(path: &Path, bytes: &[u8]) -> Result<(), KeyError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut tmp = path.to_path_buf();
    tmp.set_extension("tmp");
    {
        let mut f = fs::OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&tmp)?;
        set_private_perms_best_effort(&tmp);
        f.write_all(bytes)?;
        let _ = f.sync_all();
    }
    fs::rename(&tmp, path)?;
    set_private_perms_best_effort(path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify() {
        let (keys, _) = AccountKeys::generate().unwrap();
        let sig = keys.sign(b"payload");
        assert!(verify_signature(&keys.public_key(), b"payload", &sig).is_ok());
        assert!(verify_signature(&keys.public_key(), b"other", &sig).is_err());
        assert!(verify_signature(&keys.public_key(), b"payload", &sig[..10]).is_err());
    }

    #[test]
    fn load_or_create_persists_the_same_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys").join("account.key");
        let a = AccountKeys::load_or_create(&path).unwrap();
        let b = AccountKeys::load_or_create(&path).unwrap();
        assert_eq!(a.public_key(), b.public_key());
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn garbage_key_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("account.key");
        fs::write(&path, b"not pkcs8").unwrap();
        assert!(matches!(AccountKeys::load_or_create(&path), Err(KeyError::InvalidKey)));
    }
}
