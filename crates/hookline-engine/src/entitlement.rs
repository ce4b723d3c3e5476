use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};

use hookline_db::EntitlementRow;
use hookline_types::{
    Decision, ModelClass, Personalization, SafetyLevel, SubscriptionStatus, Tier, UserEntitlement,
};

use crate::config::PolicyLimits;

pub const CONTACT_SUPPORT: &str = "entitlement state is inconsistent; contact support";

/// Decide whether a generation is allowed for this entitlement snapshot.
///
/// Pure over the passed-in row; callers must hand in a freshly-read
/// snapshot, and nothing here mutates storage. A window that has expired is
/// treated as reset for this decision only; the stored counter is reset by
/// the persistence gateway when the generation commits.
pub fn evaluate(
    entitlement: &UserEntitlement,
    requested: Option<ModelClass>,
    limits: &PolicyLimits,
    now: DateTime<Utc>,
) -> Decision {
    let window_expired = now.signed_duration_since(entitlement.period_reset_at) >= limits.window();

    if !entitlement.on_subscription() {
        // Free tier, or a subscription that lapsed. Premium is off the table.
        if requested == Some(ModelClass::Premium) {
            return Decision::deny(
                "premium generations require an active subscription",
                true,
                Some(Tier::Starter),
            );
        }
        let used = if window_expired {
            0
        } else {
            entitlement.draft_generations_used
        };
        let remaining = limits.free_monthly_draft - used;
        if remaining > 0 {
            return Decision::allow(Some(remaining));
        }
        return Decision::deny(
            "monthly draft generation limit reached",
            true,
            Some(Tier::Starter),
        );
    }

    if entitlement.tier == Tier::Free {
        // An active subscription on the free tier should not exist.
        return Decision::deny(CONTACT_SUPPORT, false, None);
    }

    match requested.unwrap_or(ModelClass::Premium) {
        ModelClass::Draft => Decision::allow(None),
        ModelClass::Premium => match limits.premium_cap(entitlement.tier) {
            None => Decision::allow(None),
            Some(cap) => {
                let used = if window_expired {
                    0
                } else {
                    entitlement.pro_generations_used
                };
                let remaining = cap - used;
                if remaining > 0 {
                    Decision::allow(Some(remaining))
                } else {
                    Decision::deny(
                        format!(
                            "monthly premium generation limit reached for the {} tier",
                            entitlement.tier.as_str()
                        ),
                        true,
                        entitlement.tier.next_up(),
                    )
                }
            }
        },
    }
}

/// Convert a stored entitlement row into the domain snapshot, normalizing
/// the legacy fields once at this boundary. An unrecognized tier or status
/// is an inconsistent row; the caller turns that into a denial, never an
/// allow.
pub fn entitlement_from_row(row: EntitlementRow) -> Result<UserEntitlement> {
    let tier =
        Tier::parse(&row.tier).ok_or_else(|| anyhow!("unknown tier '{}'", row.tier))?;
    let status = SubscriptionStatus::parse(&row.status)
        .ok_or_else(|| anyhow!("unknown subscription status '{}'", row.status))?;

    let personalization = Personalization {
        company: none_if_blank(row.company),
        industry: none_if_blank(row.industry),
        brand_voice: none_if_blank(row.brand_voice),
        audience: none_if_blank(row.audience),
        safety: Some(SafetyLevel::parse_lenient(&row.safety)),
        banned_terms: normalize_banned_terms(row.banned_terms.as_deref()),
    };

    Ok(UserEntitlement {
        user_id: row.user_id,
        tier,
        status,
        free_credits: row.free_credits,
        used_credits: row.used_credits,
        draft_generations_used: row.draft_generations_used,
        pro_generations_used: row.pro_generations_used,
        period_reset_at: DateTime::from_timestamp(row.period_reset_at, 0).unwrap_or_default(),
        personalization,
    })
}

/// Older rows store banned terms as a JSON array, newer ones as a
/// comma-separated string. Normalize both to a deduplicated list here so no
/// other layer branches on the representation.
pub fn normalize_banned_terms(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Vec::new();
    }

    let candidates: Vec<String> = match serde_json::from_str::<Vec<String>>(raw) {
        Ok(list) => list,
        Err(_) => raw.split(',').map(str::to_string).collect(),
    };

    let mut seen = std::collections::HashSet::new();
    let mut terms = Vec::new();
    for term in candidates {
        let term = term.trim().to_string();
        if term.is_empty() || !seen.insert(term.to_lowercase()) {
            continue;
        }
        terms.push(term);
    }
    terms
}

fn none_if_blank(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let v = v.trim().to_string();
        if v.is_empty() { None } else { Some(v) }
    })
}
