//! twofa-rs: TOTP two-factor authentication engine
//!
//! The second-factor core of the school management backend. Account
//! handlers call into it during enrollment and login; it owns no storage
//! and no network access.
//!
//! # Features
//!
//! - **TOTP**: RFC 6238 codes (HMAC-SHA1, 6 digits, 30 s step) with a
//!   configurable clock-drift window
//! - **Enrollment**: random 160-bit secrets, `otpauth://` provisioning URIs
//!   and QR code URLs (or local SVG rendering)
//! - **Recovery**: single-use backup codes, persisted only as SHA-256 digests
//!
//! # Example
//!
//! ```no_run
//! use twofa_rs::mfa::{generate_backup_codes, verify_backup_code, TotpService};
//!
//! let totp = TotpService::new();
//! let setup = totp.generate_secret_with_qr("jane@school.org", None);
//! // show setup.qr_code_url, keep setup.secret pending until confirmed
//!
//! let confirmed = totp.verify_token("123456", &setup.secret);
//! if confirmed {
//!     let batch = generate_backup_codes(10);
//!     // persist batch.hashed_codes, display batch.plain_codes once
//!     assert!(verify_backup_code(&batch.plain_codes[0], &batch.hashed_codes));
//! }
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration management
//! - [`error`]: Error types and handling
//! - [`mfa`]: TOTP, backup codes and the enrollment flow
//! - [`logging`]: Subscriber setup for the binary

pub mod config;
pub mod error;
pub mod logging;
pub mod mfa;

// Re-export commonly used types
pub use config::Config;
pub use error::{Result, TwofaError};
pub use mfa::{MfaManager, TotpService};
