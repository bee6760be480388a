//! TOTP (Time-based One-Time Password) service
//!
//! Implements RFC 6238 on top of the RFC 4226 HOTP truncation, with
//! HMAC-SHA1, 6-digit codes and a 30-second step so that standard
//! authenticator apps interoperate.

use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use sha1::Sha1;
use std::time::{SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use super::base32;
use super::types::MfaSetupResponse;
use crate::config::{Config, DEFAULT_ISSUER, DEFAULT_QR_ENDPOINT};
use crate::error::{Result, TwofaError};

type HmacSha1 = Hmac<Sha1>;

/// Secret length in bytes (160 bits, the RFC 4226 recommendation)
pub const SECRET_BYTES: usize = 20;
/// Number of digits in a code
pub const CODE_DIGITS: usize = 6;
/// Time step in seconds
pub const TIME_STEP: u64 = 30;
/// Largest accepted verification window, in steps either side
pub const MAX_WINDOW: u64 = 10;

const CODE_MODULUS: u32 = 1_000_000;

/// TOTP service for generating and validating codes
///
/// Holds only configuration; every call is independent, so one instance can
/// be shared freely across threads.
#[derive(Debug, Clone)]
pub struct TotpService {
    issuer: String,
    window: u64,
    qr_endpoint: String,
}

impl TotpService {
    /// Create a new TOTP service with default configuration
    pub fn new() -> Self {
        Self {
            issuer: DEFAULT_ISSUER.to_string(),
            window: 1,
            qr_endpoint: DEFAULT_QR_ENDPOINT.to_string(),
        }
    }

    /// Create a TOTP service from loaded configuration
    pub fn with_config(config: &Config) -> Self {
        Self {
            issuer: config.totp.issuer.clone(),
            window: config.totp.window.min(MAX_WINDOW),
            qr_endpoint: config.qr.endpoint.clone(),
        }
    }

    /// Override the verification window (± steps), capped at [`MAX_WINDOW`]
    pub fn with_window(mut self, window: u64) -> Self {
        if window > MAX_WINDOW {
            warn!(window, max = MAX_WINDOW, "TOTP window clamped");
        }
        self.window = window.min(MAX_WINDOW);
        self
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn window(&self) -> u64 {
        self.window
    }

    /// Generate a new random secret, base32 encoded without padding
    pub fn generate_secret(&self) -> String {
        let mut bytes = [0u8; SECRET_BYTES];
        OsRng.fill_bytes(&mut bytes);
        base32::encode(&bytes)
    }

    /// Generate a secret plus the enrollment URLs for it
    ///
    /// `issuer` falls back to the configured issuer when `None`. No network
    /// request is made; `qr_code_url` is only fetched when a client opens it.
    pub fn generate_secret_with_qr(&self, account: &str, issuer: Option<&str>) -> MfaSetupResponse {
        let issuer = issuer.unwrap_or(&self.issuer);
        let secret = self.generate_secret();
        let provisioning_uri = provisioning_uri(&secret, account, issuer);
        let qr_code_url = self.qr_code_url(&provisioning_uri);

        MfaSetupResponse {
            secret,
            provisioning_uri,
            qr_code_url,
        }
    }

    /// Wrap a provisioning URI into a request for the QR rendering endpoint
    pub fn qr_code_url(&self, provisioning_uri: &str) -> String {
        format!("{}{}", self.qr_endpoint, urlencoding::encode(provisioning_uri))
    }

    /// Validate a submitted code against a secret at the current time
    pub fn verify_token(&self, code: &str, secret_base32: &str) -> bool {
        match unix_now() {
            Some(now) => self.verify_token_at(code, secret_base32, now),
            None => {
                warn!("System clock is before the Unix epoch, rejecting TOTP code");
                false
            }
        }
    }

    /// Validate a submitted code against a secret at `unix_secs`
    ///
    /// Accepts codes from the steps `current - window ..= current + window`.
    /// Anything that is not exactly six characters is rejected before any
    /// HMAC work is done.
    pub fn verify_token_at(&self, code: &str, secret_base32: &str, unix_secs: u64) -> bool {
        if code.len() != CODE_DIGITS {
            return false;
        }

        let key = base32::decode(secret_base32);
        let current_step = unix_secs / TIME_STEP;
        // Never above MAX_WINDOW, so the conversion cannot fail
        let window = i64::try_from(self.window.min(MAX_WINDOW)).unwrap_or(0);

        for offset in -window..=window {
            let Some(counter) = current_step.checked_add_signed(offset) else {
                continue;
            };

            let expected = match hotp(&key, counter) {
                Ok(expected) => expected,
                Err(e) => {
                    warn!(error = %e, "TOTP derivation failed");
                    return false;
                }
            };

            if bool::from(expected.as_bytes().ct_eq(code.as_bytes())) {
                debug!(offset, "TOTP code accepted");
                return true;
            }
        }

        false
    }

    /// Generate the code for `secret_base32` at `unix_secs`
    pub fn code_at(&self, secret_base32: &str, unix_secs: u64) -> Result<String> {
        hotp(&base32::decode(secret_base32), unix_secs / TIME_STEP)
    }

    /// Generate the code for the current time step
    pub fn current_code(&self, secret_base32: &str) -> Result<String> {
        let now = unix_now()
            .ok_or_else(|| TwofaError::Clock("system clock is before the Unix epoch".to_string()))?;
        self.code_at(secret_base32, now)
    }
}

impl Default for TotpService {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the `otpauth://` URI that authenticator apps scan
pub fn provisioning_uri(secret_base32: &str, account: &str, issuer: &str) -> String {
    let issuer = urlencoding::encode(issuer);
    format!(
        "otpauth://totp/{}:{}?secret={}&issuer={}",
        issuer,
        urlencoding::encode(account),
        secret_base32,
        issuer
    )
}

/// RFC 4226 HOTP value for `counter`, zero-padded to six digits
pub fn hotp(key: &[u8], counter: u64) -> Result<String> {
    let mut mac =
        HmacSha1::new_from_slice(key).map_err(|e| TwofaError::InvalidKey(e.to_string()))?;
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    // Dynamic truncation: low nibble of the last byte picks a 4-byte window,
    // top bit masked to keep the value unsigned
    let offset = (digest[digest.len() - 1] & 0x0f) as usize;
    let truncated = u32::from_be_bytes([
        digest[offset] & 0x7f,
        digest[offset + 1],
        digest[offset + 2],
        digest[offset + 3],
    ]);

    Ok(format!("{:0width$}", truncated % CODE_MODULUS, width = CODE_DIGITS))
}

/// Render a provisioning URI as an SVG QR code, without any network access
pub fn render_qr_svg(provisioning_uri: &str) -> Result<String> {
    let code = qrcode::QrCode::new(provisioning_uri.as_bytes())
        .map_err(|e| TwofaError::Qr(e.to_string()))?;

    Ok(code
        .render::<qrcode::render::svg::Color>()
        .min_dimensions(200, 200)
        .build())
}

fn unix_now() -> Option<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .map(|d| d.as_secs())
}
