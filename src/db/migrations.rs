use rusqlite::Connection;

use crate::db::schema::{SCHEMA_V1, SCHEMA_V2};

pub fn setup_migrations(conn: &Connection) -> rusqlite::Result<()> {
    // Узнаём текущую версию схемы
    let ver: i32 = conn.query_row("PRAGMA user_version;", [], |r| r.get(0))?;

    // Шаги выполняются строго по порядку; каждый батч сам
    // поднимает user_version, поэтому повторный запуск — no-op
    if ver < 1 {
        conn.execute_batch(SCHEMA_V1)?;
    }
    if ver < 2 {
        conn.execute_batch(SCHEMA_V2)?;
    }

    Ok(())
}
