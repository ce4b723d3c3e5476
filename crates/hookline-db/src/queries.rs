use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Transaction, params};

use crate::models::{CommitOutcome, EntitlementRow, FavoriteRow, GenerationRow, UsageCounter};
use crate::Database;

const MAX_PAGE_SIZE: u32 = 100;

impl Database {
    // -- Entitlements --

    /// Fetch a user's entitlement row, creating a default free-tier row on
    /// first sight. The identity provider already vouched for the user id.
    pub fn get_or_create_entitlement(&self, user_id: &str) -> Result<EntitlementRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO user_entitlements (user_id) VALUES (?1)",
                [user_id],
            )?;
            query_entitlement(conn, user_id)?
                .ok_or_else(|| anyhow::anyhow!("entitlement row missing after insert: {}", user_id))
        })
    }

    pub fn get_entitlement(&self, user_id: &str) -> Result<Option<EntitlementRow>> {
        self.with_conn(|conn| query_entitlement(conn, user_id))
    }

    pub fn set_tier(&self, user_id: &str, tier: &str, status: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO user_entitlements (user_id, tier, status) VALUES (?1, ?2, ?3)
                 ON CONFLICT(user_id) DO UPDATE SET tier = excluded.tier, status = excluded.status",
                params![user_id, tier, status],
            )?;
            Ok(())
        })
    }

    pub fn update_personalization(
        &self,
        user_id: &str,
        company: Option<&str>,
        industry: Option<&str>,
        brand_voice: Option<&str>,
        audience: Option<&str>,
        safety: &str,
        banned_terms: Option<&str>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO user_entitlements (user_id) VALUES (?1)",
                [user_id],
            )?;
            conn.execute(
                "UPDATE user_entitlements
                    SET company = ?2, industry = ?3, brand_voice = ?4,
                        audience = ?5, safety = ?6, banned_terms = ?7
                  WHERE user_id = ?1",
                params![user_id, company, industry, brand_voice, audience, safety, banned_terms],
            )?;
            Ok(())
        })
    }

    // -- Generation commit --

    /// The one unit of work that makes a generation count: insert the record,
    /// then consume the usage counter with a single conditional UPDATE.
    ///
    /// "Allowed" is re-derived from that write's own success, not from any
    /// earlier snapshot: a cap miss here means a concurrent request took the
    /// last slot, and the insert is rolled back. A counter statement that
    /// fails for infrastructure reasons keeps the insert and reports the
    /// mismatch; an insert failure touches nothing.
    pub fn commit_generation(
        &self,
        row: &GenerationRow,
        counter: UsageCounter,
        window_secs: i64,
        now_unix: i64,
    ) -> Result<CommitOutcome> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            insert_generation(&tx, row)?;
            match consume_counter(&tx, &row.user_id, counter, window_secs, now_unix) {
                Ok(true) => {
                    tx.commit()?;
                    Ok(CommitOutcome::Committed)
                }
                Ok(false) => {
                    tx.rollback()?;
                    Ok(CommitOutcome::QuotaExhausted)
                }
                Err(err) => {
                    tx.commit()?;
                    Ok(CommitOutcome::CounterUpdateFailed {
                        detail: err.to_string(),
                    })
                }
            }
        })
    }

    // -- Generations --

    pub fn get_generation(&self, user_id: &str, id: &str) -> Result<Option<GenerationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, platform, objective, topic, model_class,
                        hooks, top_variants, strategy_summary, created_at
                   FROM generations WHERE user_id = ?1 AND id = ?2",
            )?;
            let row = stmt
                .query_row(params![user_id, id], map_generation_row)
                .optional()?;
            Ok(row)
        })
    }

    pub fn list_generations(&self, user_id: &str, page: u32, limit: u32) -> Result<Vec<GenerationRow>> {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let offset = page.saturating_sub(1) * limit;
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, platform, objective, topic, model_class,
                        hooks, top_variants, strategy_summary, created_at
                   FROM generations WHERE user_id = ?1
                  ORDER BY created_at DESC, id DESC
                  LIMIT ?2 OFFSET ?3",
            )?;
            let rows = stmt
                .query_map(params![user_id, limit, offset], map_generation_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn delete_generation(&self, user_id: &str, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let n = conn.execute(
                "DELETE FROM generations WHERE user_id = ?1 AND id = ?2",
                params![user_id, id],
            )?;
            Ok(n > 0)
        })
    }

    // -- Favorites --

    pub fn insert_favorite(&self, row: &FavoriteRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO favorite_hooks
                    (id, user_id, generation_id, hook_snapshot, framework,
                     platform_notes, topic, platform, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    row.id,
                    row.user_id,
                    row.generation_id,
                    row.hook_snapshot,
                    row.framework,
                    row.platform_notes,
                    row.topic,
                    row.platform,
                    row.created_at,
                ],
            )?;
            Ok(())
        })
    }

    pub fn list_favorites(&self, user_id: &str, page: u32, limit: u32) -> Result<Vec<FavoriteRow>> {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let offset = page.saturating_sub(1) * limit;
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, generation_id, hook_snapshot, framework,
                        platform_notes, topic, platform, created_at
                   FROM favorite_hooks WHERE user_id = ?1
                  ORDER BY created_at DESC, id DESC
                  LIMIT ?2 OFFSET ?3",
            )?;
            let rows = stmt
                .query_map(params![user_id, limit, offset], map_favorite_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn delete_favorite(&self, user_id: &str, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let n = conn.execute(
                "DELETE FROM favorite_hooks WHERE user_id = ?1 AND id = ?2",
                params![user_id, id],
            )?;
            Ok(n > 0)
        })
    }
}

fn query_entitlement(conn: &Connection, user_id: &str) -> Result<Option<EntitlementRow>> {
    let mut stmt = conn.prepare(
        "SELECT user_id, tier, status, free_credits, used_credits,
                draft_generations_used, pro_generations_used, period_reset_at,
                company, industry, brand_voice, audience, safety, banned_terms
           FROM user_entitlements WHERE user_id = ?1",
    )?;

    let row = stmt
        .query_row([user_id], |row| {
            Ok(EntitlementRow {
                user_id: row.get(0)?,
                tier: row.get(1)?,
                status: row.get(2)?,
                free_credits: row.get(3)?,
                used_credits: row.get(4)?,
                draft_generations_used: row.get(5)?,
                pro_generations_used: row.get(6)?,
                period_reset_at: row.get(7)?,
                company: row.get(8)?,
                industry: row.get(9)?,
                brand_voice: row.get(10)?,
                audience: row.get(11)?,
                safety: row.get(12)?,
                banned_terms: row.get(13)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn insert_generation(tx: &Transaction, row: &GenerationRow) -> Result<()> {
    tx.execute(
        "INSERT INTO generations
            (id, user_id, platform, objective, topic, model_class,
             hooks, top_variants, strategy_summary, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            row.id,
            row.user_id,
            row.platform,
            row.objective,
            row.topic,
            row.model_class,
            row.hooks,
            row.top_variants,
            row.strategy_summary,
            row.created_at,
        ],
    )?;
    Ok(())
}

/// Returns true iff the counter was consumed. An expired rolling window is
/// opened fresh with this generation as its first use; otherwise the
/// increment only matches while the counter sits below its cap, which is
/// what closes the check-then-act race.
fn consume_counter(
    tx: &Transaction,
    user_id: &str,
    counter: UsageCounter,
    window_secs: i64,
    now_unix: i64,
) -> Result<bool> {
    let (column, cap, mirror_legacy) = match counter {
        UsageCounter::FreeDraft { cap } => ("draft_generations_used", Some(cap), true),
        UsageCounter::PaidDraft => ("draft_generations_used", None, false),
        UsageCounter::PaidPremium { cap } => ("pro_generations_used", cap, false),
    };
    let legacy = if mirror_legacy {
        ", used_credits = used_credits + 1"
    } else {
        ""
    };

    let cutoff = now_unix - window_secs;
    let reset = tx.execute(
        &format!(
            "UPDATE user_entitlements
                SET {column} = 1, period_reset_at = ?2{legacy}
              WHERE user_id = ?1 AND period_reset_at <= ?3"
        ),
        params![user_id, now_unix, cutoff],
    )?;
    if reset == 1 {
        return Ok(true);
    }

    let updated = match cap {
        Some(cap) => tx.execute(
            &format!(
                "UPDATE user_entitlements
                    SET {column} = {column} + 1{legacy}
                  WHERE user_id = ?1 AND {column} < ?2"
            ),
            params![user_id, cap],
        )?,
        None => tx.execute(
            &format!(
                "UPDATE user_entitlements
                    SET {column} = {column} + 1{legacy}
                  WHERE user_id = ?1"
            ),
            [user_id],
        )?,
    };

    Ok(updated == 1)
}

fn map_generation_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<GenerationRow> {
    Ok(GenerationRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        platform: row.get(2)?,
        objective: row.get(3)?,
        topic: row.get(4)?,
        model_class: row.get(5)?,
        hooks: row.get(6)?,
        top_variants: row.get(7)?,
        strategy_summary: row.get(8)?,
        created_at: row.get(9)?,
    })
}

fn map_favorite_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<FavoriteRow> {
    Ok(FavoriteRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        generation_id: row.get(2)?,
        hook_snapshot: row.get(3)?,
        framework: row.get(4)?,
        platform_notes: row.get(5)?,
        topic: row.get(6)?,
        platform: row.get(7)?,
        created_at: row.get(8)?,
    })
}
