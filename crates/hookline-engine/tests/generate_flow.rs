use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Utc;

use hookline_db::Database;
use hookline_engine::{Engine, EngineConfig};
use hookline_llm::{BackendError, CompletionRequest, GenerativeBackend};
use hookline_types::{
    AddFavorite, GenerateError, GenerationRequest, ModelClass, Objective, Platform,
    SubscriptionStatus, Tier,
};

// -- Scripted backends --

#[derive(Clone)]
struct StaticBackend {
    body: String,
    calls: Arc<AtomicUsize>,
}

impl StaticBackend {
    fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl GenerativeBackend for StaticBackend {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.body.clone())
    }
}

struct FailingBackend;

impl GenerativeBackend for FailingBackend {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String, BackendError> {
        Err(BackendError::Status {
            status: 503,
            detail: "overloaded".to_string(),
        })
    }
}

/// Records the last prompt it was handed, for asserting on prompt assembly.
struct CapturingBackend {
    body: String,
    last_user_prompt: Arc<std::sync::Mutex<Option<String>>>,
}

impl CapturingBackend {
    fn new(body: impl Into<String>) -> (Self, Arc<std::sync::Mutex<Option<String>>>) {
        let slot = Arc::new(std::sync::Mutex::new(None));
        (
            Self {
                body: body.into(),
                last_user_prompt: slot.clone(),
            },
            slot,
        )
    }
}

impl GenerativeBackend for CapturingBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, BackendError> {
        *self.last_user_prompt.lock().unwrap() = Some(request.user_prompt.clone());
        Ok(self.body.clone())
    }
}

// -- Fixtures --

fn hooks_body(count: usize) -> String {
    (0..count)
        .map(|i| {
            format!(
                r#"{{"verbalHook": "hook {i}", "visualHook": "cut to b-roll", "textualHook": "caption {i}", "framework": "Open Loop", "psychologicalDriver": "curiosity", "category": "tutorial", "riskFactor": "low", "score": {}, "rationale": "opens a loop", "platformNotes": "lead with text overlay"}}"#,
                50 + i * 7
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn request(user_id: &str) -> GenerationRequest {
    GenerationRequest {
        user_id: user_id.to_string(),
        platform: Platform::Tiktok,
        objective: Objective::WatchTime,
        topic: "home espresso on a budget".to_string(),
        requested_model_class: None,
    }
}

fn engine_with<B: GenerativeBackend>(db: Arc<Database>, backend: B) -> Engine<B> {
    Engine::new(db, backend, EngineConfig::default())
}

fn set_usage(db: &Database, user_id: &str, draft: i64, pro: i64, reset_at_unix: i64) {
    db.get_or_create_entitlement(user_id).unwrap();
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE user_entitlements
                SET draft_generations_used = ?2,
                    pro_generations_used = ?3,
                    period_reset_at = ?4
              WHERE user_id = ?1",
            rusqlite::params![user_id, draft, pro, reset_at_unix],
        )?;
        Ok(())
    })
    .unwrap();
}

fn draft_used(db: &Database, user_id: &str) -> i64 {
    db.get_entitlement(user_id).unwrap().unwrap().draft_generations_used
}

// -- Tests --

#[tokio::test]
async fn free_tier_generation_commits_and_counts() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let engine = engine_with(db.clone(), StaticBackend::new(hooks_body(6)));

    let success = engine.generate(request("u1")).await.unwrap();

    assert_eq!(success.record.hooks.len(), 6);
    assert_eq!(success.model_selection.model_class, ModelClass::Draft);
    assert!(!success.model_selection.was_downgraded);
    assert_eq!(success.ranking.top_variants.len(), 3);
    // Highest scores first: 50 + i*7 peaks at i=5.
    assert_eq!(success.ranking.top_variants[0].verbal_hook, "hook 5");

    let ent = db.get_entitlement("u1").unwrap().unwrap();
    assert_eq!(ent.draft_generations_used, 1);
    assert_eq!(ent.used_credits, 1);

    let listed = engine.list_generations("u1", 1, 10).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, success.record.id);
}

#[tokio::test]
async fn free_tier_denied_once_limit_is_reached() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    set_usage(&db, "u1", 5, 0, Utc::now().timestamp());
    let engine = engine_with(db.clone(), StaticBackend::new(hooks_body(6)));

    let err = engine.generate(request("u1")).await.unwrap_err();
    match err {
        GenerateError::QuotaExceeded {
            upgrade_required,
            upgrade_hint,
            ..
        } => {
            assert!(upgrade_required);
            assert_eq!(upgrade_hint, Some(Tier::Starter));
        }
        other => panic!("expected QuotaExceeded, got {other:?}"),
    }
    assert!(engine.list_generations("u1", 1, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn free_tier_premium_request_is_denied_before_any_backend_call() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let backend = StaticBackend::new(hooks_body(6));
    let calls = backend.calls.clone();
    let engine = engine_with(db, backend);

    let mut req = request("u1");
    req.requested_model_class = Some(ModelClass::Premium);

    let err = engine.generate(req).await.unwrap_err();
    assert!(matches!(
        err,
        GenerateError::QuotaExceeded {
            upgrade_required: true,
            ..
        }
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn paid_tier_defaults_to_premium_and_consumes_the_pro_counter() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    db.get_or_create_entitlement("u1").unwrap();
    db.set_tier("u1", "creator", "active").unwrap();
    let engine = engine_with(db.clone(), StaticBackend::new(hooks_body(4)));

    let success = engine.generate(request("u1")).await.unwrap();
    assert_eq!(success.model_selection.model_class, ModelClass::Premium);

    let ent = db.get_entitlement("u1").unwrap().unwrap();
    assert_eq!(ent.pro_generations_used, 1);
    assert_eq!(ent.draft_generations_used, 0);
    assert_eq!(ent.used_credits, 0);
}

#[tokio::test]
async fn backend_failure_touches_no_counters() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let engine = engine_with(db.clone(), FailingBackend);

    let err = engine.generate(request("u1")).await.unwrap_err();
    assert!(matches!(err, GenerateError::BackendUnavailable { .. }));

    assert_eq!(draft_used(&db, "u1"), 0);
    assert!(engine.list_generations("u1", 1, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn unusable_response_yields_no_hooks_and_no_commit() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let engine = engine_with(db.clone(), StaticBackend::new("  \n\t\n"));

    let err = engine.generate(request("u1")).await.unwrap_err();
    assert!(matches!(err, GenerateError::NoHooksProduced));

    assert_eq!(draft_used(&db, "u1"), 0);
    assert!(engine.list_generations("u1", 1, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn validation_failure_never_reaches_the_backend() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let backend = StaticBackend::new(hooks_body(6));
    let calls = backend.calls.clone();
    let engine = engine_with(db, backend);

    let mut req = request("u1");
    req.topic = "too short".to_string();

    let err = engine.generate(req).await.unwrap_err();
    assert!(matches!(err, GenerateError::Validation { field: "topic", .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn expired_window_commit_resets_the_stored_counter_to_one() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let thirty_one_days_ago = Utc::now().timestamp() - 31 * 24 * 3600;
    set_usage(&db, "u1", 5, 0, thirty_one_days_ago);
    let engine = engine_with(db.clone(), StaticBackend::new(hooks_body(6)));

    engine.generate(request("u1")).await.unwrap();

    assert_eq!(draft_used(&db, "u1"), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn one_remaining_credit_admits_exactly_one_concurrent_generate() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    set_usage(&db, "u1", 4, 0, Utc::now().timestamp());
    let engine = Arc::new(engine_with(db.clone(), StaticBackend::new(hooks_body(6))));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine.generate(request("u1")).await
        }));
    }

    let mut successes = 0;
    let mut quota_denials = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(GenerateError::QuotaExceeded { .. }) => quota_denials += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(quota_denials, 7);
    assert_eq!(draft_used(&db, "u1"), 5);
    assert_eq!(engine.list_generations("u1", 1, 50).await.unwrap().len(), 1);
}

#[tokio::test]
async fn favorites_are_snapshots_that_outlive_their_generation() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let engine = engine_with(db, StaticBackend::new(hooks_body(3)));

    let success = engine.generate(request("u1")).await.unwrap();
    let hook = success.record.hooks[0].clone();

    let favorite = engine
        .add_favorite(AddFavorite {
            user_id: "u1".to_string(),
            generation_id: Some(success.record.id),
            hook: hook.clone(),
            topic: Some(success.record.topic.clone()),
            platform: Some(Platform::Tiktok),
        })
        .await
        .unwrap();

    assert!(engine.delete_generation("u1", success.record.id).await.unwrap());

    let favorites = engine.list_favorites("u1", 1, 10).await.unwrap();
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0].id, favorite.id);
    assert_eq!(favorites[0].hook.verbal_hook, hook.verbal_hook);

    assert!(engine.delete_favorite("u1", favorite.id).await.unwrap());
    assert!(engine.list_favorites("u1", 1, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn stored_brand_context_reaches_the_prompt() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let (backend, prompt_slot) = CapturingBackend::new(hooks_body(2));
    let engine = engine_with(db, backend);

    engine
        .set_personalization(
            "u1",
            hookline_types::Personalization {
                company: Some("Bean Theory".to_string()),
                brand_voice: Some("dry and precise".to_string()),
                banned_terms: vec!["guaranteed".to_string(), "miracle".to_string()],
                ..Default::default()
            },
        )
        .await
        .unwrap();

    engine.generate(request("u1")).await.unwrap();

    let prompt = prompt_slot.lock().unwrap().clone().expect("backend was never called");
    assert!(prompt.contains("Bean Theory"));
    assert!(prompt.contains("dry and precise"));
    assert!(prompt.contains("Never use these terms or close variants of them: guaranteed, miracle."));
}

#[tokio::test]
async fn set_tier_changes_the_entitlement_surface() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let engine = engine_with(db, StaticBackend::new(hooks_body(2)));

    engine
        .set_tier("u1", Tier::Pro, SubscriptionStatus::Active)
        .await
        .unwrap();

    let entitlement = engine.entitlement("u1").await.unwrap();
    assert_eq!(entitlement.tier, Tier::Pro);
    assert!(entitlement.on_subscription());
}
