use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// -- Subscription --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Free,
    Starter,
    Creator,
    Pro,
    Teams,
}

impl Tier {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "free" => Some(Tier::Free),
            "starter" => Some(Tier::Starter),
            "creator" => Some(Tier::Creator),
            "pro" => Some(Tier::Pro),
            "teams" | "team" => Some(Tier::Teams),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Starter => "starter",
            Tier::Creator => "creator",
            Tier::Pro => "pro",
            Tier::Teams => "teams",
        }
    }

    /// The next tier up the ladder, used for upgrade hints on quota denials.
    pub fn next_up(self) -> Option<Tier> {
        match self {
            Tier::Free => Some(Tier::Starter),
            Tier::Starter => Some(Tier::Creator),
            Tier::Creator => Some(Tier::Pro),
            Tier::Pro => Some(Tier::Teams),
            Tier::Teams => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    None,
    Active,
    Trialing,
    PastDue,
    Canceled,
}

impl SubscriptionStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "none" | "" => Some(SubscriptionStatus::None),
            "active" => Some(SubscriptionStatus::Active),
            "trialing" | "trial" => Some(SubscriptionStatus::Trialing),
            "past_due" => Some(SubscriptionStatus::PastDue),
            "canceled" | "cancelled" => Some(SubscriptionStatus::Canceled),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SubscriptionStatus::None => "none",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Trialing => "trialing",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Canceled => "canceled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelClass {
    Draft,
    Premium,
}

impl ModelClass {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "draft" | "fast" => Some(ModelClass::Draft),
            "premium" | "pro" => Some(ModelClass::Premium),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ModelClass::Draft => "draft",
            ModelClass::Premium => "premium",
        }
    }
}

// -- Generation request inputs --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Tiktok,
    Instagram,
    Youtube,
}

impl Platform {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "tiktok" => Some(Platform::Tiktok),
            "instagram" | "reels" | "ig" => Some(Platform::Instagram),
            "youtube" | "shorts" | "yt" => Some(Platform::Youtube),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Tiktok => "tiktok",
            Platform::Instagram => "instagram",
            Platform::Youtube => "youtube",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    WatchTime,
    Shares,
    Saves,
    Ctr,
    Follows,
}

impl Objective {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "watch_time" | "watchtime" | "retention" => Some(Objective::WatchTime),
            "shares" | "share" => Some(Objective::Shares),
            "saves" | "save" => Some(Objective::Saves),
            "ctr" | "clicks" => Some(Objective::Ctr),
            "follows" | "follow" => Some(Objective::Follows),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Objective::WatchTime => "watch_time",
            Objective::Shares => "shares",
            Objective::Saves => "saves",
            Objective::Ctr => "ctr",
            Objective::Follows => "follows",
        }
    }

    /// Hashtag form without the underscore, used by the fallback caption.
    pub fn hashtag(self) -> &'static str {
        match self {
            Objective::WatchTime => "watchtime",
            Objective::Shares => "shares",
            Objective::Saves => "saves",
            Objective::Ctr => "ctr",
            Objective::Follows => "follows",
        }
    }
}

// -- Hooks --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactor {
    Low,
    Medium,
    High,
}

impl RiskFactor {
    /// Lenient parse for model output; anything unrecognized reads as low.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "medium" | "mid" => RiskFactor::Medium,
            "high" => RiskFactor::High,
            _ => RiskFactor::Low,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskFactor::Low => "low",
            RiskFactor::Medium => "medium",
            RiskFactor::High => "high",
        }
    }
}

/// One candidate opening for a short-form video: spoken line, on-screen
/// visual direction, and caption text, plus the technique metadata the
/// ranking layer works from. Immutable once produced by the parser.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hook {
    pub id: Uuid,
    pub verbal_hook: String,
    pub visual_hook: String,
    pub textual_hook: String,
    pub framework: String,
    pub psychological_driver: String,
    pub category: String,
    pub risk_factor: RiskFactor,
    pub score: f64,
    pub rationale: String,
    pub platform_notes: String,
    pub platform: Platform,
    pub objective: Objective,
    pub topic: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub id: Uuid,
    pub user_id: String,
    pub platform: Platform,
    pub objective: Objective,
    pub topic: String,
    pub model_class: ModelClass,
    pub hooks: Vec<Hook>,
    pub top_variants: Vec<Hook>,
    pub strategy_summary: String,
    pub created_at: DateTime<Utc>,
}

/// A saved hook. The hook is snapshotted, not referenced, so deleting the
/// originating generation never invalidates a favorite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoriteHook {
    pub id: Uuid,
    pub user_id: String,
    pub generation_id: Option<Uuid>,
    pub hook: Hook,
    pub framework: String,
    pub platform_notes: String,
    pub topic: Option<String>,
    pub platform: Option<Platform>,
    pub created_at: DateTime<Utc>,
}

// -- Entitlement --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyLevel {
    Relaxed,
    Standard,
    Strict,
}

impl SafetyLevel {
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "relaxed" => SafetyLevel::Relaxed,
            "strict" => SafetyLevel::Strict,
            _ => SafetyLevel::Standard,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SafetyLevel::Relaxed => "relaxed",
            SafetyLevel::Standard => "standard",
            SafetyLevel::Strict => "strict",
        }
    }
}

/// Brand context attached to a user's entitlement row. Banned terms are
/// normalized to a list when the row is read; nothing downstream sees the
/// stored representation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Personalization {
    pub company: Option<String>,
    pub industry: Option<String>,
    pub brand_voice: Option<String>,
    pub audience: Option<String>,
    pub safety: Option<SafetyLevel>,
    pub banned_terms: Vec<String>,
}

impl Personalization {
    pub fn safety_level(&self) -> SafetyLevel {
        self.safety.unwrap_or(SafetyLevel::Standard)
    }
}

/// A user's subscription tier and usage snapshot. Read fresh per request;
/// mutated only through the persistence gateway's commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEntitlement {
    pub user_id: String,
    pub tier: Tier,
    pub status: SubscriptionStatus,
    pub free_credits: i64,
    pub used_credits: i64,
    pub draft_generations_used: i64,
    pub pro_generations_used: i64,
    pub period_reset_at: DateTime<Utc>,
    pub personalization: Personalization,
}

impl UserEntitlement {
    /// A subscription counts while it is active or trialing. A free tier
    /// with an active status is an inconsistent row and is handled by the
    /// entitlement policy, not here.
    pub fn on_subscription(&self) -> bool {
        matches!(
            self.status,
            SubscriptionStatus::Active | SubscriptionStatus::Trialing
        )
    }
}
