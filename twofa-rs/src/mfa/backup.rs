//! Single-use backup codes for account recovery
//!
//! Codes are 8 uppercase hex characters (4 random bytes). Only their SHA-256
//! hex digests are ever persisted; a code is consumed by removing its digest
//! from the stored set.

use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::debug;

use super::types::BackupCodeBatch;

/// Number of backup codes to generate
pub const DEFAULT_BACKUP_CODE_COUNT: usize = 10;

const BACKUP_CODE_BYTES: usize = 4;

/// Generate `count` backup codes with their digests, index for index
pub fn generate_backup_codes(count: usize) -> BackupCodeBatch {
    let plain_codes: Vec<String> = (0..count).map(|_| generate_backup_code()).collect();
    let hashed_codes = plain_codes.iter().map(|c| hash_backup_code(c)).collect();

    debug!(count, "Generated backup codes");

    BackupCodeBatch {
        plain_codes,
        hashed_codes,
    }
}

/// SHA-256 hex digest of a backup code, after normalisation
pub fn hash_backup_code(code: &str) -> String {
    hex::encode(Sha256::digest(normalize(code).as_bytes()))
}

/// Check whether `code` hashes to one of `stored_hashes`
///
/// Consumed codes are absent from the stored set and therefore fail.
pub fn verify_backup_code(code: &str, stored_hashes: &[String]) -> bool {
    find_backup_code(code, stored_hashes).is_some()
}

/// Return `stored_hashes` without the digest of `code`
///
/// At most one entry is removed. An unknown code returns an identical copy.
pub fn remove_backup_code(code: &str, stored_hashes: &[String]) -> Vec<String> {
    let mut remaining = stored_hashes.to_vec();
    if let Some(index) = find_backup_code(code, stored_hashes) {
        remaining.remove(index);
    }
    remaining
}

/// Group an 8-character code as `ABCD-EF01` for display
pub fn display_backup_code(code: &str) -> String {
    if code.len() == BACKUP_CODE_BYTES * 2 && code.is_ascii() {
        format!("{}-{}", &code[..4], &code[4..])
    } else {
        code.to_string()
    }
}

fn find_backup_code(code: &str, stored_hashes: &[String]) -> Option<usize> {
    let hash = hash_backup_code(code);
    stored_hashes
        .iter()
        .position(|stored| bool::from(stored.as_bytes().ct_eq(hash.as_bytes())))
}

/// Strip separators and whitespace, uppercase the rest
fn normalize(code: &str) -> String {
    code.chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Generate a random backup code (8 uppercase hex characters)
fn generate_backup_code() -> String {
    let mut bytes = [0u8; BACKUP_CODE_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode_upper(bytes)
}
