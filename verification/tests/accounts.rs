//! Registration, login and session handling against nullable backends.

use std::sync::Arc;

use chrono::Duration;
use proptest::prelude::*;
use sigver_crypto::CredentialService;
use sigver_nullables::{NullClock, NullFileStore, NullStore};
use sigver_types::Role;
use sigver_verification::{AccountService, ErrorKind, Registration, ServiceError, Stores, Upload};

struct Harness {
    files: Arc<NullFileStore>,
    clock: Arc<NullClock>,
    accounts: AccountService,
}

fn harness() -> Harness {
    let store = Arc::new(NullStore::new());
    let files = Arc::new(NullFileStore::new());
    let clock = Arc::new(NullClock::default());
    let stores = Stores {
        users: store.clone(),
        signatures: store.clone(),
        history: store.clone(),
        sessions: store,
        files: files.clone(),
    };
    let credentials = CredentialService::new(b"test-secret".to_vec(), Duration::days(30), clock.clone());
    let accounts =
        AccountService::new(stores, credentials, clock.clone()).with_admin_emails(["Root@X.com"]);
    Harness {
        files,
        clock,
        accounts,
    }
}

fn registration(email: &str, password: &str) -> Registration {
    Registration {
        username: "alice".into(),
        email: email.into(),
        password: password.into(),
        ..Default::default()
    }
}

#[test]
fn register_then_login_yields_valid_token() {
    let h = harness();
    let registered = h.accounts.register(registration("a@x.com", "secret1")).unwrap();
    assert_eq!(registered.user.role, Role::Standard);
    assert_ne!(registered.user.password_hash, "secret1");

    let login = h.accounts.login("a@x.com", "secret1").unwrap();
    assert_eq!(login.user.id, registered.user.id);
    assert!(login.user.last_login.is_some());

    let session = h.accounts.authenticate(&login.token.token).unwrap();
    assert_eq!(session.user_id, registered.user.id);
}

#[test]
fn duplicate_email_conflicts_regardless_of_other_fields() {
    let h = harness();
    h.accounts.register(registration("a@x.com", "secret1")).unwrap();

    let mut again = registration("  A@X.COM ", "different-password");
    again.username = "someone else".into();
    let err = h.accounts.register(again).unwrap_err();
    assert!(matches!(err, ServiceError::UserExists));
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[test]
fn wrong_password_and_unknown_email_look_the_same() {
    let h = harness();
    h.accounts.register(registration("a@x.com", "secret1")).unwrap();

    let wrong = h.accounts.login("a@x.com", "nope-nope").unwrap_err();
    let unknown = h.accounts.login("ghost@x.com", "secret1").unwrap_err();
    assert_eq!(wrong.kind(), ErrorKind::Auth);
    assert_eq!(unknown.kind(), ErrorKind::Auth);
    assert_eq!(wrong.to_string(), unknown.to_string());
}

#[test]
fn missing_fields_and_short_passwords_are_rejected() {
    let h = harness();
    for bad in [
        registration("", "secret1"),
        registration("a@x.com", ""),
        Registration {
            username: "   ".into(),
            ..registration("a@x.com", "secret1")
        },
        registration("a@x.com", "12345"),
    ] {
        let err = h.accounts.register(bad).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}

#[test]
fn expired_token_is_rejected() {
    let h = harness();
    let token = h
        .accounts
        .register(registration("a@x.com", "secret1"))
        .unwrap()
        .token
        .token;

    h.clock.advance(Duration::days(30));
    let err = h.accounts.authenticate(&token).unwrap_err();
    assert!(matches!(err, ServiceError::InvalidCredential(_)));
}

#[test]
fn tampered_token_is_rejected() {
    let h = harness();
    let mut token = h
        .accounts
        .register(registration("a@x.com", "secret1"))
        .unwrap()
        .token
        .token;
    let last = token.pop().unwrap();
    token.push(if last == '0' { '1' } else { '0' });

    assert_eq!(
        h.accounts.authenticate(&token).unwrap_err().kind(),
        ErrorKind::Auth
    );
}

#[test]
fn logout_revokes_only_that_session() {
    let h = harness();
    h.accounts.register(registration("a@x.com", "secret1")).unwrap();
    let first = h.accounts.login("a@x.com", "secret1").unwrap().token.token;
    let second = h.accounts.login("a@x.com", "secret1").unwrap().token.token;

    let session = h.accounts.authenticate(&first).unwrap();
    h.accounts.logout(&session).unwrap();

    assert!(h.accounts.authenticate(&first).is_err());
    assert!(h.accounts.authenticate(&second).is_ok());
}

#[test]
fn admin_emails_get_admin_role_and_can_list_users() {
    let h = harness();
    let user = h.accounts.register(registration("a@x.com", "secret1")).unwrap();
    let admin = h.accounts.register(registration("root@x.com", "secret1")).unwrap();
    assert_eq!(admin.user.role, Role::Admin);

    let user_session = h.accounts.authenticate(&user.token.token).unwrap();
    let err = h.accounts.list_users(&user_session).unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden));
    assert_eq!(err.to_string(), "Not authorized as admin");

    let admin_session = h.accounts.authenticate(&admin.token.token).unwrap();
    let users = h.accounts.list_users(&admin_session).unwrap();
    assert_eq!(users.len(), 2);
}

#[test]
fn profile_returns_stored_images() {
    let h = harness();
    let outcome = h
        .accounts
        .register(Registration {
            profile_picture: Some(Upload::new("me.jpg", vec![9; 4])),
            original_signature: Some(Upload::new("sig.png", vec![8; 4])),
            ..registration("a@x.com", "secret1")
        })
        .unwrap();
    assert_eq!(h.files.len(), 2);

    let session = h.accounts.authenticate(&outcome.token.token).unwrap();
    let profile = h.accounts.profile(&session).unwrap();
    assert_eq!(profile.profile_picture, Some(vec![9; 4]));
    assert_eq!(profile.original_signature, Some(vec![8; 4]));
    assert!(profile.signature_references.is_empty());
}

#[test]
fn failed_image_write_aborts_registration() {
    let h = harness();
    h.files.fail_writes(true);
    let err = h
        .accounts
        .register(Registration {
            profile_picture: Some(Upload::new("me.jpg", vec![9; 4])),
            ..registration("a@x.com", "secret1")
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Persistence);

    h.files.fail_writes(false);
    assert!(h.accounts.register(registration("a@x.com", "secret1")).is_ok());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn any_valid_registration_can_log_in(
        local in "[a-z]{1,12}",
        password in "[ -~]{6,24}",
    ) {
        let h = harness();
        let email = format!("{local}@example.com");
        h.accounts.register(registration(&email, &password)).unwrap();

        let login = h.accounts.login(&email.to_uppercase(), &password).unwrap();
        prop_assert!(h.accounts.authenticate(&login.token.token).is_ok());
    }
}
