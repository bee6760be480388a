//! Multi-Factor Authentication (MFA) module
//!
//! Provides TOTP-based two-factor authentication with single-use backup
//! codes for account recovery.

pub mod backup;
pub mod base32;
pub mod manager;
pub mod totp;
pub mod types;

pub use backup::{
    display_backup_code, generate_backup_codes, hash_backup_code, remove_backup_code,
    verify_backup_code, DEFAULT_BACKUP_CODE_COUNT,
};
pub use manager::MfaManager;
pub use totp::{hotp, provisioning_uri, render_qr_svg, TotpService};
pub use types::*;
