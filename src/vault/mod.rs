//! Encrypted-at-rest storage for small secret values.
//!
//! One flat JSON document under the app data directory maps key names to
//! base64 sealed blobs. The file is the single source of truth: every
//! operation is a fresh read (and, for writes, a full rewrite), so nothing
//! cached in memory survives a restart. Sealing itself is delegated to the
//! [`SecretSealer`] seam; plaintext never touches the disk.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use base64::Engine as _;

use crate::arch::sealer::{SealError, SecretSealer};

#[derive(Debug)]
pub enum VaultError {
    /// The platform sealing primitive is not usable in this session.
    EncryptionUnavailable,
    Io(String),
    Backend(String),
}

impl fmt::Display for VaultError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VaultError::EncryptionUnavailable => {
                write!(f, "platform encryption is unavailable")
            }
            VaultError::Io(msg) => write!(f, "secure store I/O error: {msg}"),
            VaultError::Backend(msg) => write!(f, "secure store backend error: {msg}"),
        }
    }
}

impl std::error::Error for VaultError {}

impl From<SealError> for VaultError {
    fn from(e: SealError) -> Self {
        match e {
            SealError::Unavailable => VaultError::EncryptionUnavailable,
            SealError::Backend(msg) => VaultError::Backend(msg),
        }
    }
}

pub struct SecureVault {
    path: PathBuf,
    sealer: Box<dyn SecretSealer>,
    /// Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
    /// Result of the first sealer probe, cached for the process lifetime.
    available: OnceLock<bool>,
}

impl SecureVault {
    pub fn new(path: PathBuf, sealer: Box<dyn SecretSealer>) -> Self {
        Self {
            path,
            sealer,
            write_lock: Mutex::new(()),
            available: OnceLock::new(),
        }
    }

    fn ensure_available(&self) -> Result<(), VaultError> {
        let available = *self.available.get_or_init(|| match self.sealer.probe() {
            Ok(()) => true,
            Err(e) => {
                log::warn!("secret sealing probe failed: {e}");
                false
            }
        });

        if available {
            Ok(())
        } else {
            Err(VaultError::EncryptionUnavailable)
        }
    }

    /// Returns `None` for a key that was never set. A present entry that
    /// cannot be decoded or unsealed is an error, never a partial result.
    pub fn get(&self, key: &str) -> Result<Option<String>, VaultError> {
        self.ensure_available()?;

        let entries = self.read_entries()?;
        let Some(encoded) = entries.get(key) else {
            return Ok(None);
        };

        let sealed = base64::engine::general_purpose::STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| VaultError::Backend(e.to_string()))?;
        let plaintext = self.sealer.open(&sealed)?;
        let value =
            String::from_utf8(plaintext).map_err(|e| VaultError::Backend(e.to_string()))?;
        Ok(Some(value))
    }

    /// Seals `value` and rewrites the whole mapping file, replacing any prior
    /// ciphertext for `key`. Keys this build does not know about survive the
    /// rewrite untouched.
    pub fn set(&self, key: &str, value: &str) -> Result<(), VaultError> {
        self.ensure_available()?;
        let _guard = self.write_lock.lock().expect("poisoned vault lock");

        let sealed = self.sealer.seal(value.as_bytes())?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(sealed);

        let mut entries = self.read_entries()?;
        entries.insert(key.to_string(), encoded);
        self.write_entries(&entries)
    }

    /// Removing an absent key is a no-op, not an error.
    pub fn delete(&self, key: &str) -> Result<(), VaultError> {
        self.ensure_available()?;
        let _guard = self.write_lock.lock().expect("poisoned vault lock");

        let mut entries = self.read_entries()?;
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.write_entries(&entries)
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, VaultError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(VaultError::Io(e.to_string())),
        };

        serde_json::from_str(&raw).map_err(|e| VaultError::Backend(e.to_string()))
    }

    /// Full replacement via temp file + rename, so readers never observe a
    /// torn document.
    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), VaultError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| VaultError::Io(e.to_string()))?;
        }

        let raw =
            serde_json::to_string_pretty(entries).map_err(|e| VaultError::Backend(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, raw).map_err(|e| VaultError::Io(e.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|e| VaultError::Io(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sealer that tags plaintext with a marker instead of encrypting, so
    /// tests never touch the OS keyring.
    struct FakeSealer {
        usable: bool,
    }

    const MARKER: &[u8] = b"sealed\0";

    impl SecretSealer for FakeSealer {
        fn probe(&self) -> Result<(), SealError> {
            if self.usable {
                Ok(())
            } else {
                Err(SealError::Unavailable)
            }
        }

        fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, SealError> {
            let mut sealed = MARKER.to_vec();
            sealed.extend_from_slice(plaintext);
            Ok(sealed)
        }

        fn open(&self, sealed: &[u8]) -> Result<Vec<u8>, SealError> {
            sealed
                .strip_prefix(MARKER)
                .map(<[u8]>::to_vec)
                .ok_or_else(|| SealError::Backend("not a sealed blob".to_string()))
        }
    }

    fn vault_in(dir: &tempfile::TempDir) -> SecureVault {
        SecureVault::new(
            dir.path().join("secure-store.json"),
            Box::new(FakeSealer { usable: true }),
        )
    }

    #[test]
    fn set_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let vault = vault_in(&dir);
        vault.set("refresh-token", "s3cr3t").unwrap();
        assert_eq!(vault.get("refresh-token").unwrap().as_deref(), Some("s3cr3t"));
    }

    #[test]
    fn get_of_never_set_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let vault = vault_in(&dir);
        assert_eq!(vault.get("absent").unwrap(), None);
    }

    #[test]
    fn set_overwrites_prior_value() {
        let dir = tempfile::tempdir().unwrap();
        let vault = vault_in(&dir);
        vault.set("k", "old").unwrap();
        vault.set("k", "new").unwrap();
        assert_eq!(vault.get("k").unwrap().as_deref(), Some("new"));
    }

    #[test]
    fn delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let vault = vault_in(&dir);
        vault.set("k", "v").unwrap();
        vault.delete("k").unwrap();
        assert_eq!(vault.get("k").unwrap(), None);
        vault.delete("k").unwrap();
    }

    #[test]
    fn plaintext_never_reaches_the_disk() {
        let dir = tempfile::tempdir().unwrap();
        let vault = vault_in(&dir);
        vault.set("k", "hunter2").unwrap();
        let raw = fs::read_to_string(dir.path().join("secure-store.json")).unwrap();
        assert!(!raw.contains("hunter2"));
    }

    #[test]
    fn file_survives_process_restart() {
        let dir = tempfile::tempdir().unwrap();
        vault_in(&dir).set("k", "v").unwrap();
        // A new vault over the same path sees the committed state.
        assert_eq!(vault_in(&dir).get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn unknown_keys_survive_a_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secure-store.json");
        fs::write(&path, r#"{ "from-a-newer-build": "opaque" }"#).unwrap();

        let vault = vault_in(&dir);
        vault.set("k", "v").unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("from-a-newer-build"));
    }

    #[test]
    fn unavailable_sealer_is_a_dedicated_error() {
        let dir = tempfile::tempdir().unwrap();
        let vault = SecureVault::new(
            dir.path().join("secure-store.json"),
            Box::new(FakeSealer { usable: false }),
        );
        assert!(matches!(
            vault.get("k"),
            Err(VaultError::EncryptionUnavailable)
        ));
        assert!(matches!(
            vault.set("k", "v"),
            Err(VaultError::EncryptionUnavailable)
        ));
        assert!(matches!(
            vault.delete("k"),
            Err(VaultError::EncryptionUnavailable)
        ));
    }

    #[test]
    fn corrupt_entry_is_an_error_not_a_partial_result() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secure-store.json");
        fs::write(&path, r#"{ "k": "bm90LXNlYWxlZA==" }"#).unwrap();

        let vault = vault_in(&dir);
        assert!(matches!(vault.get("k"), Err(VaultError::Backend(_))));
    }
}
