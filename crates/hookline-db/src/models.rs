/// Database row types — these map directly to SQLite rows.
/// Distinct from hookline-types domain models to keep the DB layer independent.

pub struct EntitlementRow {
    pub user_id: String,
    pub tier: String,
    pub status: String,
    pub free_credits: i64,
    pub used_credits: i64,
    pub draft_generations_used: i64,
    pub pro_generations_used: i64,
    pub period_reset_at: i64,
    pub company: Option<String>,
    pub industry: Option<String>,
    pub brand_voice: Option<String>,
    pub audience: Option<String>,
    pub safety: String,
    pub banned_terms: Option<String>,
}

pub struct GenerationRow {
    pub id: String,
    pub user_id: String,
    pub platform: String,
    pub objective: String,
    pub topic: String,
    pub model_class: String,
    pub hooks: String,
    pub top_variants: String,
    pub strategy_summary: String,
    pub created_at: String,
}

pub struct FavoriteRow {
    pub id: String,
    pub user_id: String,
    pub generation_id: Option<String>,
    pub hook_snapshot: String,
    pub framework: String,
    pub platform_notes: String,
    pub topic: Option<String>,
    pub platform: Option<String>,
    pub created_at: String,
}

/// Which counter a committed generation consumes, and under what cap.
/// The free tier mirrors the legacy credit column in the same statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageCounter {
    FreeDraft { cap: i64 },
    PaidDraft,
    PaidPremium { cap: Option<i64> },
}

/// Result of the two-write unit of work in `commit_generation`.
#[derive(Debug)]
pub enum CommitOutcome {
    Committed,
    /// The conditional counter update matched no row: the quota was consumed
    /// by a concurrent request. The generation insert was rolled back.
    QuotaExhausted,
    /// The generation row landed but the counter statement failed for an
    /// infrastructure reason. The caller keeps the generation and the
    /// mismatch is reconciled out of band.
    CounterUpdateFailed { detail: String },
}
