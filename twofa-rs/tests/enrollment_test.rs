//! Integration tests for the enrollment and login flow

use std::sync::Arc;
use std::thread;
use twofa_rs::mfa::{
    generate_backup_codes, remove_backup_code, verify_backup_code, MfaManager, MfaRecord,
    MfaVerifyResult, TotpService,
};
use twofa_rs::{Config, TwofaError};

#[test]
fn test_full_enrollment_flow() {
    let mut config = Config::default();
    config.totp.issuer = "Green Valley High".to_string();
    config.backup.count = 6;
    let manager = MfaManager::with_config(&config);
    let mut record = MfaRecord::new();

    // (a) generate the secret, hold it pending
    let setup = manager.start_setup(&mut record, "jane@school.org", None);
    assert!(setup
        .provisioning_uri
        .starts_with("otpauth://totp/Green%20Valley%20High:jane%40school.org?secret="));
    assert!(setup
        .qr_code_url
        .starts_with("https://api.qrserver.com/v1/create-qr-code/?size=200x200&data=otpauth%3A%2F%2F"));
    assert!(!record.is_enabled());

    // (b) confirm with a code, receive the backup codes
    let code = manager.totp_service().current_code(&setup.secret).unwrap();
    let backup_codes = manager.complete_setup(&mut record, &code).unwrap();
    assert_eq!(backup_codes.len(), 6);
    assert_eq!(record.secret.as_deref(), Some(setup.secret.as_str()));

    // The persisted record never holds plaintext backup codes
    let persisted = serde_json::to_string(&record).unwrap();
    for code in &backup_codes {
        assert!(!persisted.contains(code.as_str()));
    }

    // (c) login with TOTP, then with a backup code
    let code = manager.totp_service().current_code(&setup.secret).unwrap();
    assert_eq!(manager.verify(&mut record, &code), MfaVerifyResult::Valid);
    assert_eq!(
        manager.verify(&mut record, &backup_codes[2]),
        MfaVerifyResult::BackupCodeUsed
    );
    assert_eq!(manager.status(&record).backup_codes_remaining, 5);

    // (d) regenerate, invalidating the previous batch
    let fresh = manager.regenerate_backup_codes(&mut record).unwrap();
    assert_eq!(manager.verify(&mut record, &backup_codes[0]), MfaVerifyResult::Invalid);
    assert_eq!(
        manager.verify(&mut record, &fresh[0]),
        MfaVerifyResult::BackupCodeUsed
    );
}

#[test]
fn test_restarting_setup_keeps_active_secret() {
    let manager = MfaManager::new();
    let mut record = MfaRecord::new();

    let first = manager.start_setup(&mut record, "jane@school.org", None);
    let code = manager.totp_service().current_code(&first.secret).unwrap();
    manager.complete_setup(&mut record, &code).unwrap();

    let second = manager.start_setup(&mut record, "jane@school.org", None);
    assert_eq!(record.secret.as_deref(), Some(first.secret.as_str()));
    assert_eq!(record.pending_secret.as_deref(), Some(second.secret.as_str()));

    // A code from the old secret does not confirm the new one
    let old_code = manager.totp_service().current_code(&first.secret).unwrap();
    let new_code = manager.totp_service().current_code(&second.secret).unwrap();
    if old_code != new_code {
        let err = manager.complete_setup(&mut record, &old_code).unwrap_err();
        assert!(matches!(err, TwofaError::InvalidCode));
    }

    manager.complete_setup(&mut record, &new_code).unwrap();
    assert_eq!(record.secret.as_deref(), Some(second.secret.as_str()));
}

#[test]
fn test_exhausting_backup_codes() {
    let batch = generate_backup_codes(3);
    let mut hashes = batch.hashed_codes.clone();

    for (i, code) in batch.plain_codes.iter().enumerate() {
        assert!(verify_backup_code(code, &hashes));
        hashes = remove_backup_code(code, &hashes);
        assert_eq!(hashes.len(), 2 - i);
    }

    // An empty set simply means no codes remain
    assert!(hashes.is_empty());
    for code in &batch.plain_codes {
        assert!(!verify_backup_code(code, &hashes));
    }
}

#[test]
fn test_service_is_shareable_across_threads() {
    let service = Arc::new(TotpService::new());
    let secret = service.generate_secret();

    let handles: Vec<_> = (0..8u64)
        .map(|i| {
            let service = Arc::clone(&service);
            let secret = secret.clone();
            thread::spawn(move || {
                let time = 1_700_000_000 + i * 30;
                let code = service.code_at(&secret, time).unwrap();
                service.verify_token_at(&code, &secret, time)
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
}
