use std::fmt;
use std::sync::OnceLock;

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand_core::{OsRng, RngCore};

/// Keyring entry that holds the vault master key.
const MASTER_KEY_USER: &str = "vault-master-key";

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

#[derive(Clone, Debug)]
pub enum SealError {
    /// The platform secret store cannot be used in this session (no keychain,
    /// locked credential manager, headless D-Bus, ...).
    Unavailable,
    Backend(String),
}

impl fmt::Display for SealError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SealError::Unavailable => write!(f, "platform secret sealing is unavailable"),
            SealError::Backend(msg) => write!(f, "sealing backend error: {msg}"),
        }
    }
}

impl std::error::Error for SealError {}

/// Seals and opens small secrets with a user/machine-bound key.
///
/// Ciphertext produced by one implementation on one machine is meaningless
/// anywhere else; the shell never handles a raw long-term key itself.
pub trait SecretSealer: Send + Sync {
    /// Cheap usability check. A failing probe means every seal/open would fail.
    fn probe(&self) -> Result<(), SealError>;
    fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, SealError>;
    fn open(&self, sealed: &[u8]) -> Result<Vec<u8>, SealError>;
}

/// Production sealer.
///
/// A random 256-bit master key lives in the OS secure store (Windows
/// Credential Manager, macOS Keychain, Secret Service on Linux) under the
/// given service name; entries are sealed with ChaCha20-Poly1305 and carry
/// their nonce as a prefix. The key is fetched from the keyring once per
/// process and cached.
pub struct KeyringSealer {
    service: String,
    master_key: OnceLock<Result<[u8; KEY_LEN], SealError>>,
}

impl KeyringSealer {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            master_key: OnceLock::new(),
        }
    }

    fn entry(&self) -> Result<keyring::Entry, SealError> {
        keyring::Entry::new(&self.service, MASTER_KEY_USER)
            .map_err(|e| SealError::Backend(e.to_string()))
    }

    fn load_or_create_key(&self) -> Result<[u8; KEY_LEN], SealError> {
        let entry = self.entry()?;
        match entry.get_secret() {
            Ok(bytes) => bytes
                .as_slice()
                .try_into()
                .map_err(|_| SealError::Backend("master key has unexpected length".to_string())),
            Err(keyring::Error::NoEntry) => {
                let mut key = [0u8; KEY_LEN];
                OsRng.fill_bytes(&mut key);
                entry.set_secret(&key).map_err(map_keyring_error)?;
                Ok(key)
            }
            Err(e) => Err(map_keyring_error(e)),
        }
    }

    fn key(&self) -> Result<[u8; KEY_LEN], SealError> {
        self.master_key
            .get_or_init(|| self.load_or_create_key())
            .clone()
    }
}

fn map_keyring_error(e: keyring::Error) -> SealError {
    match e {
        keyring::Error::NoStorageAccess(_) | keyring::Error::PlatformFailure(_) => {
            SealError::Unavailable
        }
        other => SealError::Backend(other.to_string()),
    }
}

impl SecretSealer for KeyringSealer {
    fn probe(&self) -> Result<(), SealError> {
        self.key().map(|_| ())
    }

    fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, SealError> {
        let key = self.key()?;
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&key));

        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|e| SealError::Backend(e.to_string()))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    fn open(&self, sealed: &[u8]) -> Result<Vec<u8>, SealError> {
        if sealed.len() < NONCE_LEN {
            return Err(SealError::Backend("sealed blob is truncated".to_string()));
        }
        let key = self.key()?;
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&key));
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);

        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| SealError::Backend("sealed blob was rejected".to_string()))
    }
}

/// Construct the production sealer.
///
/// Callers should depend on the `SecretSealer` trait, not on the concrete
/// type, so the backing primitive can change without disturbing the vault.
pub fn default_sealer() -> Box<dyn SecretSealer> {
    Box::new(KeyringSealer::new("Portico"))
}
