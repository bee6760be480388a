//! CLI tool for TOTP secrets, codes and backup codes
//!
//! # Usage
//!
//! ```bash
//! # Enroll an account (prints secret, otpauth URI and QR URL as JSON)
//! twofa setup jane@school.org --issuer "Green Valley High"
//!
//! # Print the current code for a secret
//! twofa code JBSWY3DPEHPK3PXP
//!
//! # Check a code (exit status 1 when rejected)
//! twofa verify JBSWY3DPEHPK3PXP 123456
//!
//! # Generate a batch of backup codes
//! twofa backup-codes --count 10
//!
//! # Check a backup code against a JSON array of stored hashes
//! twofa check-backup 0A1B2C3D hashes.json
//! ```

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use twofa_rs::mfa::{self, MfaSetupResponse, TotpService};
use twofa_rs::Config;

#[derive(Parser)]
#[command(name = "twofa")]
#[command(about = "TOTP two-factor authentication toolkit", long_about = None)]
struct Cli {
    /// TOML configuration file (TWOFA_* environment variables override it)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new base32 secret
    Secret,
    /// Generate a secret with its provisioning URI and QR code URL
    Setup {
        /// Account label shown in the authenticator app (e.g. an email)
        account: String,
        /// Issuer name (defaults to the configured issuer)
        #[arg(long)]
        issuer: Option<String>,
        /// Also render the QR code locally as SVG
        #[arg(long)]
        svg: bool,
    },
    /// Print the code for a secret
    Code {
        /// Base32 secret
        secret: String,
        /// Unix time to derive the code for (defaults to now)
        #[arg(long)]
        at: Option<u64>,
    },
    /// Verify a code against a secret
    Verify {
        /// Base32 secret
        secret: String,
        /// Submitted 6-digit code
        code: String,
        /// Unix time to verify at (defaults to now)
        #[arg(long)]
        at: Option<u64>,
    },
    /// Generate backup codes and their SHA-256 hashes
    BackupCodes {
        /// Number of codes (defaults to the configured count)
        #[arg(long)]
        count: Option<usize>,
    },
    /// Check a backup code against stored hashes and print the remaining set
    CheckBackup {
        /// Submitted backup code
        code: String,
        /// JSON file holding an array of SHA-256 hex digests
        hashes: PathBuf,
    },
}

#[derive(Serialize)]
struct SetupOutput {
    #[serde(flatten)]
    setup: MfaSetupResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    qr_svg: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;
    twofa_rs::logging::init(&config.logging);

    let totp = TotpService::with_config(&config);

    match cli.command {
        Commands::Secret => {
            println!("{}", totp.generate_secret());
        }
        Commands::Setup {
            account,
            issuer,
            svg,
        } => {
            info!(issuer = %issuer.as_deref().unwrap_or(totp.issuer()), "Generating TOTP setup");

            let setup = totp.generate_secret_with_qr(&account, issuer.as_deref());
            let qr_svg = if svg {
                Some(mfa::render_qr_svg(&setup.provisioning_uri)?)
            } else {
                None
            };

            println!(
                "{}",
                serde_json::to_string_pretty(&SetupOutput { setup, qr_svg })?
            );
        }
        Commands::Code { secret, at } => {
            let code = match at {
                Some(at) => totp.code_at(&secret, at)?,
                None => totp.current_code(&secret)?,
            };
            println!("{}", code);
        }
        Commands::Verify { secret, code, at } => {
            let valid = match at {
                Some(at) => totp.verify_token_at(&code, &secret, at),
                None => totp.verify_token(&code, &secret),
            };

            if valid {
                println!("✓ Code accepted");
            } else {
                println!("✗ Code rejected");
                std::process::exit(1);
            }
        }
        Commands::BackupCodes { count } => {
            let batch = mfa::generate_backup_codes(count.unwrap_or(config.backup.count));
            println!("{}", serde_json::to_string_pretty(&batch)?);
        }
        Commands::CheckBackup { code, hashes } => {
            let content = std::fs::read_to_string(&hashes)?;
            let stored: Vec<String> = serde_json::from_str(&content)?;

            if !mfa::verify_backup_code(&code, &stored) {
                eprintln!("✗ Backup code not recognised");
                std::process::exit(1);
            }

            let remaining = mfa::remove_backup_code(&code, &stored);
            info!(remaining = remaining.len(), "Backup code consumed");
            println!("{}", serde_json::to_string_pretty(&remaining)?);
        }
    }

    Ok(())
}
