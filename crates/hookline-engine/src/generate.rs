use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use hookline_db::{CommitOutcome, Database, UsageCounter};
use hookline_llm::{CompletionRequest, GenerativeBackend};
use hookline_types::{
    AddFavorite, FavoriteHook, GenerateError, GenerationRecord, GenerationRequest,
    GenerationSuccess, ModelClass, Personalization, SubscriptionStatus, Tier, UserEntitlement,
};

use crate::config::{EngineConfig, PolicyLimits};
use crate::entitlement::{CONTACT_SUPPORT, entitlement_from_row, evaluate};
use crate::parser::parse_hooks;
use crate::prompt::build_prompt;
use crate::ranking::{strategy_summary, summarize};
use crate::records::{
    favorite_from_row, favorite_to_row, generation_from_row, generation_to_row,
};
use crate::selection::select;

const MIN_TOPIC_CHARS: usize = 10;
const MAX_TOPIC_CHARS: usize = 1000;

/// The orchestration core. Owns an injected backend instance and the
/// database handle; stateless per request beyond those.
pub struct Engine<B> {
    db: Arc<Database>,
    backend: B,
    config: EngineConfig,
}

impl<B: GenerativeBackend> Engine<B> {
    pub fn new(db: Arc<Database>, backend: B, config: EngineConfig) -> Self {
        Self { db, backend, config }
    }

    pub fn limits(&self) -> &PolicyLimits {
        &self.config.limits
    }

    /// Run one generation end to end: validate, entitlement pre-check, model
    /// selection, prompt assembly, backend call, parse, rank, commit.
    ///
    /// Nothing is persisted and no counter moves until the parse has fully
    /// succeeded, so abandoning the call mid-flight leaves no trace. The
    /// commit re-checks the quota with a conditional write; its outcome, not
    /// the earlier snapshot, decides whether this call counted.
    pub async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationSuccess, GenerateError> {
        validate_request(&request)?;

        let user_id = request.user_id.clone();
        let row = self
            .run_db(move |db| db.get_or_create_entitlement(&user_id))
            .await?;
        let entitlement = match entitlement_from_row(row) {
            Ok(entitlement) => entitlement,
            Err(err) => {
                warn!(user_id = %request.user_id, "inconsistent entitlement row: {}", err);
                return Err(GenerateError::QuotaExceeded {
                    reason: CONTACT_SUPPORT.to_string(),
                    upgrade_required: false,
                    upgrade_hint: None,
                });
            }
        };

        let now = Utc::now();
        let decision = evaluate(
            &entitlement,
            request.requested_model_class,
            &self.config.limits,
            now,
        );
        if !decision.allowed {
            return Err(GenerateError::QuotaExceeded {
                reason: decision
                    .reason
                    .unwrap_or_else(|| "generation not allowed".to_string()),
                upgrade_required: decision.upgrade_required,
                upgrade_hint: decision.upgrade_hint,
            });
        }

        let selection = select(&entitlement, request.requested_model_class);
        let prompt = build_prompt(
            &request,
            &entitlement.personalization,
            self.config.hooks_per_generation,
        );
        let completion = CompletionRequest {
            model_class: selection.model_class,
            system_prompt: prompt.system,
            user_prompt: prompt.user,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let raw = self.backend.complete(&completion).await.map_err(|err| {
            warn!(user_id = %request.user_id, "generation backend failed: {}", err);
            GenerateError::BackendUnavailable {
                detail: err.to_string(),
            }
        })?;

        let hooks = parse_hooks(&raw, &request, now);
        if hooks.is_empty() {
            return Err(GenerateError::NoHooksProduced);
        }

        let ranking = summarize(&hooks);
        let record = GenerationRecord {
            id: Uuid::new_v4(),
            user_id: request.user_id.clone(),
            platform: request.platform,
            objective: request.objective,
            topic: request.topic.clone(),
            model_class: selection.model_class,
            strategy_summary: strategy_summary(
                request.platform,
                request.objective,
                hooks.len(),
                &ranking,
            ),
            top_variants: ranking.top_variants.clone(),
            hooks,
            created_at: now,
        };

        let counter = usage_counter_for(&entitlement, selection.model_class, &self.config.limits);
        let row = generation_to_row(&record).map_err(GenerateError::storage)?;
        let window_secs = self.config.limits.window_secs();
        let now_unix = now.timestamp();
        let outcome = self
            .run_db(move |db| db.commit_generation(&row, counter, window_secs, now_unix))
            .await?;

        match outcome {
            CommitOutcome::Committed => {
                info!(
                    user_id = %record.user_id,
                    generation_id = %record.id,
                    model_class = selection.model_class.as_str(),
                    hooks = record.hooks.len(),
                    "generation committed"
                );
                Ok(GenerationSuccess {
                    record,
                    model_selection: selection,
                    ranking,
                })
            }
            CommitOutcome::QuotaExhausted => {
                // A concurrent request took the last slot after our pre-check.
                Err(quota_race_denial(&entitlement, selection.model_class))
            }
            CommitOutcome::CounterUpdateFailed { detail } => {
                error!(
                    user_id = %record.user_id,
                    generation_id = %record.id,
                    detail = %detail,
                    "generation persisted but the usage counter update failed; flagged for reconciliation"
                );
                Ok(GenerationSuccess {
                    record,
                    model_selection: selection,
                    ranking,
                })
            }
        }
    }

    // -- Generations --

    pub async fn get_generation(
        &self,
        user_id: &str,
        id: Uuid,
    ) -> Result<Option<GenerationRecord>, GenerateError> {
        let user_id = user_id.to_string();
        let row = self
            .run_db(move |db| db.get_generation(&user_id, &id.to_string()))
            .await?;
        Ok(row.map(generation_from_row))
    }

    pub async fn list_generations(
        &self,
        user_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<Vec<GenerationRecord>, GenerateError> {
        let user_id = user_id.to_string();
        let rows = self
            .run_db(move |db| db.list_generations(&user_id, page, limit))
            .await?;
        Ok(rows.into_iter().map(generation_from_row).collect())
    }

    pub async fn delete_generation(
        &self,
        user_id: &str,
        id: Uuid,
    ) -> Result<bool, GenerateError> {
        let user_id = user_id.to_string();
        self.run_db(move |db| db.delete_generation(&user_id, &id.to_string()))
            .await
    }

    // -- Favorites --

    pub async fn add_favorite(
        &self,
        request: AddFavorite,
    ) -> Result<FavoriteHook, GenerateError> {
        let favorite = FavoriteHook {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            generation_id: request.generation_id,
            framework: request.hook.framework.clone(),
            platform_notes: request.hook.platform_notes.clone(),
            hook: request.hook,
            topic: request.topic,
            platform: request.platform,
            created_at: Utc::now(),
        };

        let row = favorite_to_row(&favorite).map_err(GenerateError::storage)?;
        self.run_db(move |db| db.insert_favorite(&row)).await?;
        Ok(favorite)
    }

    pub async fn list_favorites(
        &self,
        user_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<Vec<FavoriteHook>, GenerateError> {
        let user_id = user_id.to_string();
        let rows = self
            .run_db(move |db| db.list_favorites(&user_id, page, limit))
            .await?;
        Ok(rows.into_iter().filter_map(favorite_from_row).collect())
    }

    pub async fn delete_favorite(&self, user_id: &str, id: Uuid) -> Result<bool, GenerateError> {
        let user_id = user_id.to_string();
        self.run_db(move |db| db.delete_favorite(&user_id, &id.to_string()))
            .await
    }

    // -- Entitlements (operator surface) --

    pub async fn entitlement(&self, user_id: &str) -> Result<UserEntitlement, GenerateError> {
        let user_id = user_id.to_string();
        let row = self
            .run_db(move |db| db.get_or_create_entitlement(&user_id))
            .await?;
        entitlement_from_row(row).map_err(GenerateError::storage)
    }

    pub async fn set_tier(
        &self,
        user_id: &str,
        tier: Tier,
        status: SubscriptionStatus,
    ) -> Result<(), GenerateError> {
        let user_id = user_id.to_string();
        self.run_db(move |db| db.set_tier(&user_id, tier.as_str(), status.as_str()))
            .await
    }

    /// Store brand context on the entitlement row. Banned terms are written
    /// in the canonical JSON-array representation; reads still tolerate the
    /// legacy comma-separated form.
    pub async fn set_personalization(
        &self,
        user_id: &str,
        personalization: Personalization,
    ) -> Result<(), GenerateError> {
        let user_id = user_id.to_string();
        self.run_db(move |db| {
            let banned_terms = if personalization.banned_terms.is_empty() {
                None
            } else {
                Some(serde_json::to_string(&personalization.banned_terms)?)
            };
            db.update_personalization(
                &user_id,
                personalization.company.as_deref(),
                personalization.industry.as_deref(),
                personalization.brand_voice.as_deref(),
                personalization.audience.as_deref(),
                personalization.safety_level().as_str(),
                banned_terms.as_deref(),
            )
        })
        .await
    }

    /// Run blocking SQLite work off the async runtime.
    async fn run_db<T, F>(&self, f: F) -> Result<T, GenerateError>
    where
        F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| {
                error!("spawn_blocking join error: {}", e);
                GenerateError::storage(e)
            })?
            .map_err(GenerateError::storage)
    }
}

fn validate_request(request: &GenerationRequest) -> Result<(), GenerateError> {
    if request.user_id.trim().is_empty() {
        return Err(GenerateError::Validation {
            field: "user_id",
            reason: "must not be empty".to_string(),
        });
    }
    let topic_chars = request.topic.trim().chars().count();
    if topic_chars < MIN_TOPIC_CHARS {
        return Err(GenerateError::Validation {
            field: "topic",
            reason: format!("must be at least {} characters", MIN_TOPIC_CHARS),
        });
    }
    if topic_chars > MAX_TOPIC_CHARS {
        return Err(GenerateError::Validation {
            field: "topic",
            reason: format!("must be at most {} characters", MAX_TOPIC_CHARS),
        });
    }
    Ok(())
}

fn usage_counter_for(
    entitlement: &UserEntitlement,
    model_class: ModelClass,
    limits: &PolicyLimits,
) -> UsageCounter {
    if !entitlement.on_subscription() {
        return UsageCounter::FreeDraft {
            cap: limits.free_monthly_draft,
        };
    }
    match model_class {
        ModelClass::Draft => UsageCounter::PaidDraft,
        ModelClass::Premium => UsageCounter::PaidPremium {
            cap: limits.premium_cap(entitlement.tier),
        },
    }
}

fn quota_race_denial(entitlement: &UserEntitlement, model_class: ModelClass) -> GenerateError {
    if !entitlement.on_subscription() {
        return GenerateError::QuotaExceeded {
            reason: "monthly draft generation limit reached".to_string(),
            upgrade_required: true,
            upgrade_hint: Some(Tier::Starter),
        };
    }
    match model_class {
        ModelClass::Premium => GenerateError::QuotaExceeded {
            reason: format!(
                "monthly premium generation limit reached for the {} tier",
                entitlement.tier.as_str()
            ),
            upgrade_required: true,
            upgrade_hint: entitlement.tier.next_up(),
        },
        ModelClass::Draft => GenerateError::QuotaExceeded {
            reason: "generation limit reached".to_string(),
            upgrade_required: false,
            upgrade_hint: None,
        },
    }
}
