use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{GenerationRecord, Hook, ModelClass, Objective, Platform, Tier};

// -- Generate --

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationRequest {
    pub user_id: String,
    pub platform: Platform,
    pub objective: Objective,
    pub topic: String,
    #[serde(default)]
    pub requested_model_class: Option<ModelClass>,
}

/// Output of the entitlement policy. Pure data; carries everything a caller
/// needs to render a denial without another lookup.
#[derive(Debug, Clone, Serialize)]
pub struct Decision {
    pub allowed: bool,
    pub reason: Option<String>,
    /// Generations left in the current window; `None` means unlimited.
    pub remaining: Option<i64>,
    pub upgrade_required: bool,
    pub upgrade_hint: Option<Tier>,
}

impl Decision {
    pub fn allow(remaining: Option<i64>) -> Self {
        Self {
            allowed: true,
            reason: None,
            remaining,
            upgrade_required: false,
            upgrade_hint: None,
        }
    }

    pub fn deny(reason: impl Into<String>, upgrade_required: bool, upgrade_hint: Option<Tier>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
            remaining: Some(0),
            upgrade_required,
            upgrade_hint,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelSelection {
    pub model_class: ModelClass,
    pub justification: String,
    pub was_downgraded: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankingSummary {
    pub top_variants: Vec<Hook>,
    pub average_score: f64,
    pub category_distribution: HashMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationSuccess {
    pub record: GenerationRecord,
    pub model_selection: ModelSelection,
    pub ranking: RankingSummary,
}

// -- Favorites --

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddFavorite {
    pub user_id: String,
    #[serde(default)]
    pub generation_id: Option<Uuid>,
    pub hook: Hook,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub platform: Option<Platform>,
}
