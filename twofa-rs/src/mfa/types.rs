//! MFA types and data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-user MFA state, owned and persisted by the account layer
///
/// The manager mutates it in place; callers must store it after every
/// mutating call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MfaRecord {
    /// Secret issued by the last setup attempt, not yet confirmed
    pub pending_secret: Option<String>,
    /// Confirmed base32 secret; `Some` means MFA is enabled
    pub secret: Option<String>,
    /// SHA-256 hex digests of the unused backup codes
    pub backup_code_hashes: Vec<String>,
    /// When MFA was enabled
    pub enabled_at: Option<DateTime<Utc>>,
    /// Last successful verification
    pub last_used_at: Option<DateTime<Utc>>,
}

impl MfaRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.secret.is_some()
    }
}

/// MFA setup response (returned when user initiates MFA setup)
#[derive(Debug, Clone, Serialize)]
pub struct MfaSetupResponse {
    /// The secret in base32 format (for manual entry)
    pub secret: String,
    /// The provisioning URI for authenticator apps
    pub provisioning_uri: String,
    /// URL that renders `provisioning_uri` as a QR image
    pub qr_code_url: String,
}

/// A freshly generated batch of backup codes
///
/// `hashed_codes[i]` is the SHA-256 hex digest of `plain_codes[i]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupCodeBatch {
    /// Shown to the user once, never stored
    pub plain_codes: Vec<String>,
    /// The only form that may be persisted
    pub hashed_codes: Vec<String>,
}

/// MFA status response
#[derive(Debug, Clone, Serialize)]
pub struct MfaStatusResponse {
    /// Whether MFA is enabled
    pub is_enabled: bool,
    /// Number of remaining backup codes
    pub backup_codes_remaining: usize,
    /// When MFA was enabled
    pub enabled_at: Option<DateTime<Utc>>,
    /// Last successful verification
    pub last_used_at: Option<DateTime<Utc>>,
}

/// Types of MFA events
///
/// Rendered into the `event` field of `tracing` records by the manager;
/// nothing is written to an audit store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MfaEventType {
    /// MFA setup initiated
    SetupStarted,
    /// MFA setup completed (enabled)
    SetupCompleted,
    /// MFA verification successful
    VerifySuccess,
    /// MFA verification failed
    VerifyFailed,
    /// MFA disabled
    Disabled,
    /// Backup code used
    BackupCodeUsed,
    /// Backup codes regenerated
    BackupCodesRegenerated,
}

impl std::fmt::Display for MfaEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MfaEventType::SetupStarted => write!(f, "setup_started"),
            MfaEventType::SetupCompleted => write!(f, "setup_completed"),
            MfaEventType::VerifySuccess => write!(f, "verify_success"),
            MfaEventType::VerifyFailed => write!(f, "verify_failed"),
            MfaEventType::Disabled => write!(f, "disabled"),
            MfaEventType::BackupCodeUsed => write!(f, "backup_code_used"),
            MfaEventType::BackupCodesRegenerated => write!(f, "backup_codes_regenerated"),
        }
    }
}

/// Result of MFA verification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MfaVerifyResult {
    /// TOTP code is valid
    Valid,
    /// A backup code matched and has been consumed
    BackupCodeUsed,
    /// Neither a valid TOTP code nor an unused backup code
    Invalid,
    /// MFA is not enabled for this user
    NotEnabled,
}

impl MfaVerifyResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, MfaVerifyResult::Valid | MfaVerifyResult::BackupCodeUsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mfa_record_new() {
        let record = MfaRecord::new();
        assert!(!record.is_enabled());
        assert!(record.pending_secret.is_none());
        assert!(record.backup_code_hashes.is_empty());
    }

    #[test]
    fn test_mfa_event_type_display() {
        assert_eq!(MfaEventType::SetupStarted.to_string(), "setup_started");
        assert_eq!(MfaEventType::VerifySuccess.to_string(), "verify_success");
        assert_eq!(MfaEventType::BackupCodeUsed.to_string(), "backup_code_used");
    }

    #[test]
    fn test_verify_result_is_valid() {
        assert!(MfaVerifyResult::Valid.is_valid());
        assert!(MfaVerifyResult::BackupCodeUsed.is_valid());
        assert!(!MfaVerifyResult::Invalid.is_valid());
        assert!(!MfaVerifyResult::NotEnabled.is_valid());
    }

    #[test]
    fn test_mfa_record_serde() {
        let record = MfaRecord {
            secret: Some("JBSWY3DPEHPK3PXP".to_string()),
            backup_code_hashes: vec!["abc".to_string()],
            ..MfaRecord::default()
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: MfaRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
