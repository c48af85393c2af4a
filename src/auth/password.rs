//! Password hashing and verification.
//!
//! Records use the PHC layout produced by most Argon2 tooling:
//!
//! ```text
//! $argon2id$v=19$m=65536,t=3,p=4$<salt>$<digest>
//! ```
//!
//! with salt and digest in unpadded standard base64. Existing rows must keep
//! verifying, so the layout is parsed and written here field by field rather
//! than delegated to a generic PHC parser.

use std::fmt;

use argon2::{Algorithm, Argon2, Params, Version};
use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine as _;
use rand_core::{OsRng, RngCore};
use thiserror::Error;
use tracing::debug;

/// Algorithm tag accepted in records.
pub const ALGORITHM_TAG: &str = "argon2id";

/// Largest memory cost a stored record may ask for (1 GiB).
pub const MAX_RECORD_MEMORY_KIB: u32 = 1024 * 1024;

/// Shortest salt the KDF accepts.
pub const MIN_SALT_LENGTH: usize = 8;

/// Shortest digest the KDF produces.
pub const MIN_KEY_LENGTH: usize = 4;

/// Password hashing errors.
#[derive(Error, Debug)]
pub enum PasswordError {
    /// Parameters are outside what Argon2 accepts.
    #[error("invalid argon2 parameters: {0}")]
    InvalidParams(String),

    /// Password hashing failed.
    #[error("password hashing failed: {0}")]
    HashError(String),
}

/// Why a stored record could not be used.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RecordError {
    /// Wrong number of `$`-separated fields.
    #[error("expected 5 fields, found {0}")]
    FieldCount(usize),

    /// Tag other than `argon2id`.
    #[error("unsupported algorithm {0:?}")]
    Algorithm(String),

    /// Version marker missing or unknown.
    #[error("unsupported version {0:?}")]
    Version(String),

    /// Parameter group is not `m=<int>,t=<int>,p=<int>`.
    #[error("malformed parameters {0:?}")]
    Params(String),

    /// Memory cost above [`MAX_RECORD_MEMORY_KIB`].
    #[error("memory cost {0} KiB exceeds limit")]
    MemoryTooLarge(u32),

    /// Salt is not valid unpadded base64.
    #[error("salt is not valid base64")]
    Salt,

    /// Digest is not valid unpadded base64.
    #[error("digest is not valid base64")]
    Digest,
}

/// Argon2id cost parameters plus salt and digest sizes for new hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashParams {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Time cost (iterations).
    pub iterations: u32,
    /// Degree of parallelism.
    pub parallelism: u32,
    /// Salt length in bytes.
    pub salt_length: usize,
    /// Digest length in bytes.
    pub key_length: usize,
}

impl Default for HashParams {
    /// 64 MiB, 3 iterations, 4 lanes, 16-byte salt, 32-byte digest.
    fn default() -> Self {
        Self {
            memory_kib: 64 * 1024,
            iterations: 3,
            parallelism: 4,
            salt_length: 16,
            key_length: 32,
        }
    }
}

impl HashParams {
    /// Check the parameters against the KDF's limits.
    pub fn check(&self) -> Result<(), PasswordError> {
        if self.salt_length < MIN_SALT_LENGTH {
            return Err(PasswordError::InvalidParams(format!(
                "salt_length must be at least {MIN_SALT_LENGTH}"
            )));
        }
        if self.key_length < MIN_KEY_LENGTH {
            return Err(PasswordError::InvalidParams(format!(
                "key_length must be at least {MIN_KEY_LENGTH}"
            )));
        }
        Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map(|_| ())
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))
    }
}

/// A decoded password-hash record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashRecord {
    /// Argon2 version number (19 or 16).
    pub version: u32,
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Time cost.
    pub iterations: u32,
    /// Parallelism.
    pub parallelism: u32,
    /// Raw salt bytes.
    pub salt: Vec<u8>,
    /// Raw digest bytes.
    pub digest: Vec<u8>,
}

impl HashRecord {
    /// Decode a stored record.
    pub fn parse(record: &str) -> Result<Self, RecordError> {
        let mut fields = record.split('$');
        // A well-formed record starts with `$`, so the first piece is empty.
        if fields.next() != Some("") {
            return Err(RecordError::FieldCount(record.split('$').count()));
        }
        let fields: Vec<&str> = fields.collect();
        if fields.len() != 5 {
            return Err(RecordError::FieldCount(fields.len()));
        }

        if fields[0] != ALGORITHM_TAG {
            return Err(RecordError::Algorithm(fields[0].to_string()));
        }
        let version = parse_version(fields[1])?;
        let (memory_kib, iterations, parallelism) = parse_params(fields[2])?;
        if memory_kib > MAX_RECORD_MEMORY_KIB {
            return Err(RecordError::MemoryTooLarge(memory_kib));
        }
        let salt = STANDARD_NO_PAD
            .decode(fields[3])
            .map_err(|_| RecordError::Salt)?;
        let digest = STANDARD_NO_PAD
            .decode(fields[4])
            .map_err(|_| RecordError::Digest)?;

        Ok(Self {
            version,
            memory_kib,
            iterations,
            parallelism,
            salt,
            digest,
        })
    }
}

impl fmt::Display for HashRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "${ALGORITHM_TAG}$v={}$m={},t={},p={}${}${}",
            self.version,
            self.memory_kib,
            self.iterations,
            self.parallelism,
            STANDARD_NO_PAD.encode(&self.salt),
            STANDARD_NO_PAD.encode(&self.digest),
        )
    }
}

fn parse_version(field: &str) -> Result<u32, RecordError> {
    let version = field
        .strip_prefix("v=")
        .and_then(|v| v.parse::<u32>().ok())
        .ok_or_else(|| RecordError::Version(field.to_string()))?;
    argon2_version(version).ok_or_else(|| RecordError::Version(field.to_string()))?;
    Ok(version)
}

fn parse_params(field: &str) -> Result<(u32, u32, u32), RecordError> {
    let malformed = || RecordError::Params(field.to_string());

    let mut parts = field.split(',');
    let mut next = |prefix: &str| -> Result<u32, RecordError> {
        parts
            .next()
            .and_then(|p| p.strip_prefix(prefix))
            .and_then(|v| v.parse().ok())
            .ok_or_else(malformed)
    };
    let m = next("m=")?;
    let t = next("t=")?;
    let p = next("p=")?;
    if parts.next().is_some() {
        return Err(malformed());
    }
    Ok((m, t, p))
}

fn argon2_version(version: u32) -> Option<Version> {
    match version {
        0x13 => Some(Version::V0x13),
        0x10 => Some(Version::V0x10),
        _ => None,
    }
}

/// Derive `out.len()` bytes of Argon2id output.
fn derive_key(
    password: &[u8],
    salt: &[u8],
    version: Version,
    memory_kib: u32,
    iterations: u32,
    parallelism: u32,
    out: &mut [u8],
) -> Result<(), argon2::Error> {
    let params = Params::new(memory_kib, iterations, parallelism, None)?;
    Argon2::new(Algorithm::Argon2id, version, params).hash_password_into(password, salt, out)
}

/// Compare two byte strings without branching on their contents.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Checks a candidate password against a stored record.
pub trait PasswordVerifier: Send + Sync {
    /// Whether `password` matches `record`. Never fails: unusable records
    /// verify as `false`.
    fn verify(&self, record: &str, password: &str) -> bool;
}

/// Argon2id hasher with fixed parameters for new hashes.
///
/// Verification always uses the parameters written in the record.
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    params: HashParams,
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self {
            params: HashParams::default(),
        }
    }
}

impl Argon2Hasher {
    /// Create a hasher, rejecting parameters the KDF would refuse.
    pub fn new(params: HashParams) -> Result<Self, PasswordError> {
        params.check()?;
        Ok(Self { params })
    }

    /// Parameters used for new hashes.
    pub fn params(&self) -> &HashParams {
        &self.params
    }

    /// Hash a password under a fresh random salt.
    ///
    /// # Examples
    ///
    /// ```
    /// use auth_service::auth::{Argon2Hasher, HashParams, PasswordVerifier};
    ///
    /// let hasher = Argon2Hasher::new(HashParams {
    ///     memory_kib: 256,
    ///     iterations: 1,
    ///     parallelism: 1,
    ///     ..HashParams::default()
    /// })
    /// .unwrap();
    /// let record = hasher.hash("my_secure_password").unwrap();
    /// assert!(record.starts_with("$argon2id$v=19$m=256,t=1,p=1$"));
    /// assert!(hasher.verify(&record, "my_secure_password"));
    /// ```
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let mut salt = vec![0u8; self.params.salt_length];
        OsRng.fill_bytes(&mut salt);

        let mut digest = vec![0u8; self.params.key_length];
        derive_key(
            password.as_bytes(),
            &salt,
            Version::V0x13,
            self.params.memory_kib,
            self.params.iterations,
            self.params.parallelism,
            &mut digest,
        )
        .map_err(|e| PasswordError::HashError(e.to_string()))?;

        let record = HashRecord {
            version: 0x13,
            memory_kib: self.params.memory_kib,
            iterations: self.params.iterations,
            parallelism: self.params.parallelism,
            salt,
            digest,
        };
        Ok(record.to_string())
    }
}

impl PasswordVerifier for Argon2Hasher {
    fn verify(&self, record: &str, password: &str) -> bool {
        let record = match HashRecord::parse(record) {
            Ok(record) => record,
            Err(e) => {
                debug!(error = %e, "Rejecting unusable password hash record");
                return false;
            }
        };
        let Some(version) = argon2_version(record.version) else {
            return false;
        };

        // Recompute at the stored digest's length so a record written with a
        // different key length still compares instead of erroring.
        let mut computed = vec![0u8; record.digest.len()];
        if let Err(e) = derive_key(
            password.as_bytes(),
            &record.salt,
            version,
            record.memory_kib,
            record.iterations,
            record.parallelism,
            &mut computed,
        ) {
            debug!(error = %e, "Argon2 rejected stored record parameters");
            return false;
        }

        constant_time_eq(&record.digest, &computed)
    }
}
