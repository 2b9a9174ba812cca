//! Reference upload, verification and history against nullable backends.

use std::sync::Arc;

use sigver_nullables::{NullClock, NullFileStore, NullScorer, NullStore};
use sigver_scorer::{ScorerError, ScorerVerdict};
use sigver_store::{FileStore, UserStore};
use sigver_types::{Clock, Role, ScoreSource, SignatureId, User, UserId};
use sigver_verification::{
    ErrorKind, ServiceError, SignatureService, Stores, Upload, FALLBACK_MATCH_SCORE,
    FALLBACK_MISMATCH_SCORE,
};

struct Harness {
    store: Arc<NullStore>,
    files: Arc<NullFileStore>,
    scorer: Arc<NullScorer>,
    clock: Arc<NullClock>,
    service: SignatureService,
    user: UserId,
}

fn harness_with(scorer: NullScorer) -> Harness {
    let store = Arc::new(NullStore::new());
    let files = Arc::new(NullFileStore::new());
    let scorer = Arc::new(scorer);
    let clock = Arc::new(NullClock::default());
    let stores = Stores {
        users: store.clone(),
        signatures: store.clone(),
        history: store.clone(),
        sessions: store.clone(),
        files: files.clone(),
    };
    let service = SignatureService::new(stores, scorer.clone(), clock.clone());

    let user = User {
        id: UserId::generate(),
        username: "alice".into(),
        email: "a@x.com".into(),
        password_hash: "unused".into(),
        role: Role::Standard,
        profile_picture: None,
        original_signature: None,
        created_at: clock.now(),
        last_login: None,
    };
    store.create_user(&user).unwrap();

    Harness {
        store,
        files,
        scorer,
        clock,
        service,
        user: user.id,
    }
}

fn harness() -> Harness {
    harness_with(NullScorer::default())
}

fn image(name: &str, fill: u8) -> Upload {
    Upload::new(name, vec![fill; 32])
}

#[tokio::test]
async fn genuine_verdict_with_score_is_returned_and_logged() {
    let h = harness_with(NullScorer::returning(ScorerVerdict {
        is_match: true,
        similarity: Some(0.93),
    }));
    h.service
        .upload_reference(&h.user, image("R.png", 1), None)
        .unwrap();

    let result = h.service.verify(&h.user, image("P.png", 2)).await.unwrap();
    assert!(result.is_match);
    assert_eq!(result.similarity_score, 0.93);
    assert_eq!(result.score_source, ScoreSource::Scorer);

    let history = h.service.history(&h.user).unwrap();
    assert_eq!(history.len(), 1);
    assert!(history[0].is_authentic);
    assert_eq!(history[0].similarity_score, 0.93);
    assert_eq!(history[0].status, "Authentic");
}

#[tokio::test]
async fn forged_verdict_without_score_uses_fallback() {
    let h = harness_with(NullScorer::returning(ScorerVerdict {
        is_match: false,
        similarity: None,
    }));
    h.service
        .upload_reference(&h.user, image("R.png", 1), None)
        .unwrap();

    let result = h.service.verify(&h.user, image("P.png", 2)).await.unwrap();
    assert!(!result.is_match);
    assert_eq!(result.similarity_score, FALLBACK_MISMATCH_SCORE);
    assert_eq!(result.score_source, ScoreSource::Fallback);

    let history = h.service.history(&h.user).unwrap();
    assert_eq!(history[0].status, "Not Authentic");
    assert_eq!(history[0].similarity_score, 0.15);
}

#[tokio::test]
async fn positive_verdict_without_score_uses_match_fallback() {
    let h = harness_with(NullScorer::returning(ScorerVerdict {
        is_match: true,
        similarity: None,
    }));
    h.service
        .upload_reference(&h.user, image("R.png", 1), None)
        .unwrap();

    let result = h.service.verify(&h.user, image("P.png", 2)).await.unwrap();
    assert_eq!(result.similarity_score, FALLBACK_MATCH_SCORE);
}

#[tokio::test]
async fn staged_verification_matches_the_one_call_form() {
    let h = harness_with(NullScorer::returning(ScorerVerdict {
        is_match: true,
        similarity: Some(0.7),
    }));
    h.service
        .upload_reference(&h.user, image("R.png", 1), None)
        .unwrap();

    let pending = h
        .service
        .prepare_verification(&h.user, image("P.png", 2))
        .unwrap();
    assert_eq!(pending.owner(), &h.user);
    assert!(h.files.contains(pending.probe_filename()));
    assert_eq!(h.scorer.calls(), 0);

    let (result, record) = h.service.score_verification(pending).await.unwrap();
    assert_eq!(h.scorer.calls(), 1);
    assert!(h.service.history(&h.user).unwrap().is_empty());

    h.service.record_verification(&h.user, &record);
    let history = h.service.history(&h.user).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].similarity_score, result.similarity_score);
    assert_eq!(history[0].is_authentic, result.is_match);
}

#[tokio::test]
async fn no_reference_fails_before_scoring() {
    let h = harness();

    let err = h.service.verify(&h.user, image("P.png", 2)).await.unwrap_err();
    assert!(matches!(err, ServiceError::NoReferenceSignature));
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(h.scorer.calls(), 0);
    assert!(h.files.is_empty(), "probe must not be stored");
}

#[tokio::test]
async fn empty_probe_is_rejected() {
    let h = harness();
    h.service
        .upload_reference(&h.user, image("R.png", 1), None)
        .unwrap();

    let err = h
        .service
        .verify(&h.user, Upload::new("P.png", Vec::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NoFileProvided));
    assert_eq!(h.scorer.calls(), 0);
}

#[tokio::test]
async fn newest_reference_is_used() {
    let h = harness();
    h.service
        .upload_reference(&h.user, image("old.png", 1), None)
        .unwrap();
    h.clock.advance(chrono::Duration::seconds(10));
    let newest = h
        .service
        .upload_reference(&h.user, image("new.png", 2), None)
        .unwrap();

    h.service.verify(&h.user, image("P.png", 3)).await.unwrap();
    let (reference, probe) = h.scorer.last_filenames().unwrap();
    assert_eq!(reference, newest.filename);
    assert!(probe.starts_with("verify-"));
}

#[tokio::test]
async fn missing_reference_file_is_reported() {
    let h = harness();
    let reference = h
        .service
        .upload_reference(&h.user, image("R.png", 1), None)
        .unwrap();
    h.files.remove(&reference.filename);

    let err = h.service.verify(&h.user, image("P.png", 2)).await.unwrap_err();
    assert!(matches!(err, ServiceError::ReferenceFileMissing(ref f) if *f == reference.filename));
    assert_eq!(err.kind(), ErrorKind::Persistence);
    assert_eq!(h.scorer.calls(), 0);
}

#[tokio::test]
async fn scorer_failure_surfaces_and_records_nothing() {
    let h = harness();
    h.service
        .upload_reference(&h.user, image("R.png", 1), None)
        .unwrap();
    h.scorer.push_unreachable();

    let err = h.service.verify(&h.user, image("P.png", 2)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Dependency);
    assert!(h.service.history(&h.user).unwrap().is_empty());
}

#[tokio::test]
async fn malformed_scorer_answer_is_a_dependency_failure() {
    let h = harness();
    h.service
        .upload_reference(&h.user, image("R.png", 1), None)
        .unwrap();
    h.scorer
        .push(Err(ScorerError::InvalidResponse("unrecognised verdict".into())));

    let err = h.service.verify(&h.user, image("P.png", 2)).await.unwrap_err();
    assert!(matches!(err, ServiceError::ScorerUnavailable(_)));
}

#[tokio::test]
async fn history_append_failure_still_returns_verdict() {
    let h = harness();
    h.service
        .upload_reference(&h.user, image("R.png", 1), None)
        .unwrap();
    h.store.fail_history_append(true);

    let result = h.service.verify(&h.user, image("P.png", 2)).await.unwrap();
    assert!(result.is_match);
    assert!(h.service.history(&h.user).unwrap().is_empty());
}

#[tokio::test]
async fn history_grows_by_one_per_verification_in_order() {
    let h = harness();
    h.service
        .upload_reference(&h.user, image("R.png", 1), None)
        .unwrap();

    for i in 0..5u8 {
        h.scorer.push(Ok(ScorerVerdict {
            is_match: i % 2 == 0,
            similarity: Some(f64::from(i) / 10.0),
        }));
        let before = h.service.history(&h.user).unwrap().len();
        let result = h.service.verify(&h.user, image("P.png", i)).await.unwrap();
        h.clock.advance(chrono::Duration::seconds(1));

        let history = h.service.history(&h.user).unwrap();
        assert_eq!(history.len(), before + 1);
        let last = history.last().unwrap();
        assert_eq!(last.is_authentic, result.is_match);
        assert_eq!(last.similarity_score, result.similarity_score);
    }

    let history = h.service.history(&h.user).unwrap();
    assert!(history.windows(2).all(|w| w[0].date <= w[1].date));
}

#[test]
fn empty_history_is_not_an_error() {
    let h = harness();
    assert!(h.service.history(&h.user).unwrap().is_empty());
}

#[test]
fn history_of_unknown_user_is_not_found() {
    let h = harness();
    let err = h.service.history(&UserId::generate()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn uploaded_reference_is_listed_with_description() {
    let h = harness();
    let record = h
        .service
        .upload_reference(&h.user, image("R.png", 1), Some("  my signature ".into()))
        .unwrap();
    let default = h
        .service
        .upload_reference(&h.user, image("R2.png", 1), None)
        .unwrap();

    let listed = h.service.reference_signatures(&h.user).unwrap();
    assert_eq!(listed.len(), 2);
    let found = listed.iter().find(|s| s.id == record.id).unwrap();
    assert_eq!(found.filename, record.filename);
    assert_eq!(found.description, "my signature");
    assert!(found.is_reference);
    let found = listed.iter().find(|s| s.id == default.id).unwrap();
    assert_eq!(found.description, "Reference signature");
}

#[test]
fn empty_reference_upload_is_rejected() {
    let h = harness();
    let err = h
        .service
        .upload_reference(&h.user, Upload::default(), None)
        .unwrap_err();
    assert!(matches!(err, ServiceError::NoFileProvided));
}

#[test]
fn reference_for_unknown_user_is_rejected() {
    let h = harness();
    let err = h
        .service
        .upload_reference(&UserId::generate(), image("R.png", 1), None)
        .unwrap_err();
    assert!(matches!(err, ServiceError::UserNotFound));
}

#[test]
fn failed_record_write_removes_the_stored_file() {
    let h = harness();
    h.store.fail_signature_put(true);

    let err = h
        .service
        .upload_reference(&h.user, image("R.png", 1), None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Persistence);
    assert!(h.files.is_empty());
}

#[test]
fn delete_removes_record_and_file() {
    let h = harness();
    let record = h
        .service
        .upload_reference(&h.user, image("R.png", 1), None)
        .unwrap();

    let removed = h.service.delete_signature(&h.user, &record.id).unwrap();
    assert_eq!(removed.id, record.id);
    assert!(h.service.reference_signatures(&h.user).unwrap().is_empty());
    assert!(!h.files.contains(&record.filename));
    assert_eq!(h.store.signature_count(), 0);
}

#[test]
fn signatures_of_others_are_invisible() {
    let h = harness();
    let record = h
        .service
        .upload_reference(&h.user, image("R.png", 1), None)
        .unwrap();
    let stranger = UserId::generate();

    assert!(matches!(
        h.service.get_signature(&stranger, &record.id),
        Err(ServiceError::SignatureNotFound)
    ));
    assert!(matches!(
        h.service.delete_signature(&stranger, &record.id),
        Err(ServiceError::SignatureNotFound)
    ));
    assert!(matches!(
        h.service.get_signature(&h.user, &SignatureId::generate()),
        Err(ServiceError::SignatureNotFound)
    ));
    assert_eq!(h.service.reference_signatures(&h.user).unwrap().len(), 1);
}

#[test]
fn image_bytes_round_trip() {
    let h = harness();
    let record = h
        .service
        .upload_reference(&h.user, image("R.png", 7), None)
        .unwrap();

    let (found, bytes) = h.service.read_signature_image(&h.user, &record.id).unwrap();
    assert_eq!(found.id, record.id);
    assert_eq!(bytes, vec![7; 32]);
}
