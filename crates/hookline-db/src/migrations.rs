use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS user_entitlements (
            user_id                 TEXT PRIMARY KEY,
            tier                    TEXT NOT NULL DEFAULT 'free',
            status                  TEXT NOT NULL DEFAULT 'none',
            free_credits            INTEGER NOT NULL DEFAULT 5,
            used_credits            INTEGER NOT NULL DEFAULT 0,
            draft_generations_used  INTEGER NOT NULL DEFAULT 0,
            pro_generations_used    INTEGER NOT NULL DEFAULT 0,
            period_reset_at         INTEGER NOT NULL DEFAULT (unixepoch()),
            company                 TEXT,
            industry                TEXT,
            brand_voice             TEXT,
            audience                TEXT,
            safety                  TEXT NOT NULL DEFAULT 'standard',
            banned_terms            TEXT,
            created_at              TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS generations (
            id                TEXT PRIMARY KEY,
            user_id           TEXT NOT NULL,
            platform          TEXT NOT NULL,
            objective         TEXT NOT NULL,
            topic             TEXT NOT NULL,
            model_class       TEXT NOT NULL,
            hooks             TEXT NOT NULL,
            top_variants      TEXT NOT NULL,
            strategy_summary  TEXT NOT NULL,
            created_at        TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_generations_user
            ON generations(user_id, created_at);

        -- generation_id is deliberately not a foreign key: a favorite keeps
        -- a full snapshot and must survive deletion of its generation.
        CREATE TABLE IF NOT EXISTS favorite_hooks (
            id              TEXT PRIMARY KEY,
            user_id         TEXT NOT NULL,
            generation_id   TEXT,
            hook_snapshot   TEXT NOT NULL,
            framework       TEXT NOT NULL,
            platform_notes  TEXT NOT NULL,
            topic           TEXT,
            platform        TEXT,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_favorites_user
            ON favorite_hooks(user_id, created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
