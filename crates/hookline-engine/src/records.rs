use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use hookline_db::{FavoriteRow, GenerationRow};
use hookline_types::{FavoriteHook, GenerationRecord, Hook, ModelClass, Objective, Platform};

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone; rows
/// we insert use the same format so pagination ordering stays consistent
/// with column defaults.
const SQLITE_TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_created_at(ts: DateTime<Utc>) -> String {
    ts.format(SQLITE_TS_FORMAT).to_string()
}

pub fn parse_created_at(raw: &str, context: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, SQLITE_TS_FORMAT).map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}' on {}: {}", raw, context, e);
            DateTime::default()
        })
}

pub fn generation_to_row(record: &GenerationRecord) -> Result<GenerationRow> {
    Ok(GenerationRow {
        id: record.id.to_string(),
        user_id: record.user_id.clone(),
        platform: record.platform.as_str().to_string(),
        objective: record.objective.as_str().to_string(),
        topic: record.topic.clone(),
        model_class: record.model_class.as_str().to_string(),
        hooks: serde_json::to_string(&record.hooks)?,
        top_variants: serde_json::to_string(&record.top_variants)?,
        strategy_summary: record.strategy_summary.clone(),
        created_at: format_created_at(record.created_at),
    })
}

pub fn generation_from_row(row: GenerationRow) -> GenerationRecord {
    let hooks: Vec<Hook> = serde_json::from_str(&row.hooks).unwrap_or_else(|e| {
        warn!("Corrupt hooks on generation '{}': {}", row.id, e);
        Vec::new()
    });
    let top_variants: Vec<Hook> = serde_json::from_str(&row.top_variants).unwrap_or_else(|e| {
        warn!("Corrupt top_variants on generation '{}': {}", row.id, e);
        Vec::new()
    });

    GenerationRecord {
        id: row.id.parse().unwrap_or_else(|e| {
            warn!("Corrupt generation id '{}': {}", row.id, e);
            Uuid::default()
        }),
        platform: Platform::parse(&row.platform).unwrap_or_else(|| {
            warn!("Corrupt platform '{}' on generation '{}'", row.platform, row.id);
            Platform::Tiktok
        }),
        objective: Objective::parse(&row.objective).unwrap_or_else(|| {
            warn!("Corrupt objective '{}' on generation '{}'", row.objective, row.id);
            Objective::WatchTime
        }),
        model_class: ModelClass::parse(&row.model_class).unwrap_or_else(|| {
            warn!("Corrupt model_class '{}' on generation '{}'", row.model_class, row.id);
            ModelClass::Draft
        }),
        created_at: parse_created_at(&row.created_at, &format!("generation '{}'", row.id)),
        user_id: row.user_id,
        topic: row.topic,
        hooks,
        top_variants,
        strategy_summary: row.strategy_summary,
    }
}

pub fn favorite_to_row(favorite: &FavoriteHook) -> Result<FavoriteRow> {
    Ok(FavoriteRow {
        id: favorite.id.to_string(),
        user_id: favorite.user_id.clone(),
        generation_id: favorite.generation_id.map(|id| id.to_string()),
        hook_snapshot: serde_json::to_string(&favorite.hook)?,
        framework: favorite.framework.clone(),
        platform_notes: favorite.platform_notes.clone(),
        topic: favorite.topic.clone(),
        platform: favorite.platform.map(|p| p.as_str().to_string()),
        created_at: format_created_at(favorite.created_at),
    })
}

/// Returns `None` when the snapshot column cannot be decoded; callers skip
/// the row rather than failing the whole listing.
pub fn favorite_from_row(row: FavoriteRow) -> Option<FavoriteHook> {
    let hook: Hook = match serde_json::from_str(&row.hook_snapshot) {
        Ok(hook) => hook,
        Err(e) => {
            warn!("Corrupt hook snapshot on favorite '{}': {}", row.id, e);
            return None;
        }
    };

    Some(FavoriteHook {
        id: row.id.parse().unwrap_or_else(|e| {
            warn!("Corrupt favorite id '{}': {}", row.id, e);
            Uuid::default()
        }),
        generation_id: row
            .generation_id
            .as_deref()
            .and_then(|raw| raw.parse().ok()),
        platform: row.platform.as_deref().and_then(Platform::parse),
        created_at: parse_created_at(&row.created_at, &format!("favorite '{}'", row.id)),
        user_id: row.user_id,
        hook,
        framework: row.framework,
        platform_notes: row.platform_notes,
        topic: row.topic,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hookline_types::RiskFactor;

    fn record() -> GenerationRecord {
        let hook = Hook {
            id: Uuid::new_v4(),
            verbal_hook: "v".to_string(),
            visual_hook: "s".to_string(),
            textual_hook: "t".to_string(),
            framework: "Open Loop".to_string(),
            psychological_driver: "curiosity".to_string(),
            category: "general".to_string(),
            risk_factor: RiskFactor::Medium,
            score: 82.0,
            rationale: "r".to_string(),
            platform_notes: "p".to_string(),
            platform: Platform::Youtube,
            objective: Objective::Saves,
            topic: "topic".to_string(),
            created_at: Utc::now(),
        };
        GenerationRecord {
            id: Uuid::new_v4(),
            user_id: "u1".to_string(),
            platform: Platform::Youtube,
            objective: Objective::Saves,
            topic: "topic".to_string(),
            model_class: ModelClass::Premium,
            hooks: vec![hook.clone()],
            top_variants: vec![hook],
            strategy_summary: "summary".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn generation_roundtrips_through_a_row() {
        let record = record();
        let row = generation_to_row(&record).unwrap();
        let restored = generation_from_row(row);

        assert_eq!(restored.id, record.id);
        assert_eq!(restored.platform, Platform::Youtube);
        assert_eq!(restored.model_class, ModelClass::Premium);
        assert_eq!(restored.hooks.len(), 1);
        assert_eq!(restored.hooks[0].score, 82.0);
        assert_eq!(restored.hooks[0].risk_factor, RiskFactor::Medium);
    }

    #[test]
    fn sqlite_default_timestamps_parse() {
        let parsed = parse_created_at("2026-02-01 10:00:00", "test");
        assert_eq!(parsed.timestamp(), 1_769_940_000);
    }
}
