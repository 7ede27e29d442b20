//! Relational schema.
//!
//! Applied at startup with `CREATE TABLE IF NOT EXISTS` rather than a
//! migrations directory — the schema is small and stable enough that a
//! single idempotent script is simpler than tracking migration versions.

pub const SCHEMA_SQL: &str = r#"
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL UNIQUE,
    hashed_password TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS sequences (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    description TEXT,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);

CREATE TABLE IF NOT EXISTS blocks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    sequence_id INTEGER NOT NULL REFERENCES sequences(id) ON DELETE CASCADE,
    name TEXT NOT NULL DEFAULT 'Untitled Block',
    block_type TEXT NOT NULL CHECK (block_type IN ('standard', 'discretization', 'single_list', 'multi_list')),
    "order" INTEGER NOT NULL DEFAULT 0,
    config_json TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);
CREATE INDEX IF NOT EXISTS idx_blocks_sequence ON blocks(sequence_id, "order", id);

CREATE TABLE IF NOT EXISTS variables (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    sequence_id INTEGER NOT NULL REFERENCES sequences(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    var_type TEXT NOT NULL CHECK (var_type IN ('global', 'input')),
    payload_json TEXT NOT NULL DEFAULT '{}',
    description TEXT,
    UNIQUE (sequence_id, name)
);

CREATE TABLE IF NOT EXISTS global_lists (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    description TEXT,
    UNIQUE (owner_id, name)
);

CREATE TABLE IF NOT EXISTS global_list_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    global_list_id INTEGER NOT NULL REFERENCES global_lists(id) ON DELETE CASCADE,
    value TEXT NOT NULL,
    "order" INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_global_list_items_list ON global_list_items(global_list_id, "order", id);

CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    sequence_id INTEGER NOT NULL REFERENCES sequences(id) ON DELETE CASCADE,
    owner_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    status TEXT NOT NULL CHECK (status IN ('pending', 'running', 'completed', 'failed', 'cancelled')),
    started_at TEXT,
    completed_at TEXT,
    input_overrides_json TEXT NOT NULL DEFAULT '{}',
    results_summary_json TEXT NOT NULL DEFAULT '{}'
);
CREATE INDEX IF NOT EXISTS idx_runs_sequence ON runs(sequence_id);

CREATE TABLE IF NOT EXISTS block_runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id) ON DELETE CASCADE,
    block_id INTEGER,
    block_name_snapshot TEXT NOT NULL,
    block_type_snapshot TEXT NOT NULL,
    status TEXT NOT NULL CHECK (status IN ('pending', 'running', 'completed', 'failed', 'cancelled')),
    prompt_text TEXT,
    raw_llm_text TEXT,
    named_outputs_json TEXT,
    list_outputs_json TEXT,
    matrix_outputs_json TEXT,
    error_message TEXT,
    started_at TEXT,
    completed_at TEXT,
    prompt_tokens INTEGER,
    completion_tokens INTEGER,
    cost_usd REAL
);
CREATE INDEX IF NOT EXISTS idx_block_runs_run ON block_runs(run_id, started_at, id);
"#;

/// Run the schema script against `pool`. Idempotent; safe to call on every
/// startup.
pub async fn init(pool: &sqlx::SqlitePool) -> sqlx::Result<()> {
    for statement in SCHEMA_SQL.split(';') {
        let statement = statement.trim();
        if statement.is_empty() {
            continue;
        }
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
