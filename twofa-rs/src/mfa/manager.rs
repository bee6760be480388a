//! MFA Manager - enrollment and login flow over a caller-owned record
//!
//! The manager never stores anything itself. Each mutating call updates the
//! [`MfaRecord`] in place and the caller persists it, atomically with the
//! action the verification authorised.

use chrono::Utc;
use tracing::{info, warn};

use super::backup::{self, DEFAULT_BACKUP_CODE_COUNT};
use super::totp::TotpService;
use super::types::*;
use crate::config::Config;
use crate::error::{Result, TwofaError};

/// MFA Manager for handling multi-factor authentication
#[derive(Debug, Clone)]
pub struct MfaManager {
    totp_service: TotpService,
    backup_code_count: usize,
}

impl MfaManager {
    /// Create a new MFA manager
    pub fn new() -> Self {
        Self {
            totp_service: TotpService::new(),
            backup_code_count: DEFAULT_BACKUP_CODE_COUNT,
        }
    }

    pub fn with_config(config: &Config) -> Self {
        Self {
            totp_service: TotpService::with_config(config),
            backup_code_count: config.backup.count,
        }
    }

    pub fn totp_service(&self) -> &TotpService {
        &self.totp_service
    }

    /// Start MFA setup for a user
    ///
    /// The new secret is held as pending; an already enabled secret stays in
    /// force until the new one is confirmed.
    pub fn start_setup(
        &self,
        record: &mut MfaRecord,
        account: &str,
        issuer: Option<&str>,
    ) -> MfaSetupResponse {
        let setup = self.totp_service.generate_secret_with_qr(account, issuer);
        record.pending_secret = Some(setup.secret.clone());

        log_event(MfaEventType::SetupStarted);

        setup
    }

    /// Complete MFA setup by verifying a code
    ///
    /// Returns the plaintext backup codes, to be shown exactly once.
    pub fn complete_setup(&self, record: &mut MfaRecord, code: &str) -> Result<Vec<String>> {
        let pending = record
            .pending_secret
            .as_deref()
            .ok_or(TwofaError::SetupNotStarted)?;

        if !self.totp_service.verify_token(code, pending) {
            warn!("MFA setup confirmation failed");
            log_event(MfaEventType::VerifyFailed);
            return Err(TwofaError::InvalidCode);
        }

        let now = Utc::now();
        record.secret = record.pending_secret.take();
        record.enabled_at = Some(now);
        record.last_used_at = Some(now);

        let backup_codes = self.issue_backup_codes(record);

        log_event(MfaEventType::SetupCompleted);

        Ok(backup_codes)
    }

    /// Verify a TOTP code, falling back to a backup code
    ///
    /// A matching backup code is removed from the record.
    pub fn verify(&self, record: &mut MfaRecord, code: &str) -> MfaVerifyResult {
        let Some(secret) = record.secret.as_deref() else {
            return MfaVerifyResult::NotEnabled;
        };

        if self.totp_service.verify_token(code, secret) {
            record.last_used_at = Some(Utc::now());
            log_event(MfaEventType::VerifySuccess);
            return MfaVerifyResult::Valid;
        }

        if backup::verify_backup_code(code, &record.backup_code_hashes) {
            record.backup_code_hashes = backup::remove_backup_code(code, &record.backup_code_hashes);
            record.last_used_at = Some(Utc::now());
            log_event(MfaEventType::BackupCodeUsed);
            if record.backup_code_hashes.is_empty() {
                warn!("Last backup code consumed");
            }
            return MfaVerifyResult::BackupCodeUsed;
        }

        log_event(MfaEventType::VerifyFailed);

        MfaVerifyResult::Invalid
    }

    /// Disable MFA for a user
    pub fn disable(&self, record: &mut MfaRecord, code: &str) -> Result<()> {
        // First verify the current code
        match self.verify(record, code) {
            MfaVerifyResult::NotEnabled => return Err(TwofaError::NotEnabled),
            MfaVerifyResult::Invalid => return Err(TwofaError::InvalidCode),
            MfaVerifyResult::Valid | MfaVerifyResult::BackupCodeUsed => {}
        }

        *record = MfaRecord::default();

        log_event(MfaEventType::Disabled);

        Ok(())
    }

    /// Generate new backup codes (replaces existing ones)
    pub fn regenerate_backup_codes(&self, record: &mut MfaRecord) -> Result<Vec<String>> {
        if !record.is_enabled() {
            return Err(TwofaError::NotEnabled);
        }

        let codes = self.issue_backup_codes(record);

        log_event(MfaEventType::BackupCodesRegenerated);

        Ok(codes)
    }

    /// Get MFA status for a user
    pub fn status(&self, record: &MfaRecord) -> MfaStatusResponse {
        MfaStatusResponse {
            is_enabled: record.is_enabled(),
            backup_codes_remaining: record.backup_code_hashes.len(),
            enabled_at: record.enabled_at,
            last_used_at: record.last_used_at,
        }
    }

    fn issue_backup_codes(&self, record: &mut MfaRecord) -> Vec<String> {
        let batch = backup::generate_backup_codes(self.backup_code_count);
        record.backup_code_hashes = batch.hashed_codes;
        batch.plain_codes
    }
}

impl Default for MfaManager {
    fn default() -> Self {
        Self::new()
    }
}

fn log_event(event_type: MfaEventType) {
    info!(event = %event_type, "MFA event");
}
