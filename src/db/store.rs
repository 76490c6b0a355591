// src/db/store.rs

use std::sync::{Arc, Mutex};

use chrono::{SecondsFormat, Utc};
use log::{debug, error, info};
use rusqlite::types::{Value, ValueRef};
use rusqlite::{params, params_from_iter};
use thiserror::Error;
use tokio_rusqlite::Connection;

use crate::db::migrations::setup_migrations;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Обращение к хранилищу до завершения initialize()
    #[error("store is not initialized")]
    NotInitialized,
    #[error("sql error: {0}")]
    Sql(#[from] tokio_rusqlite::Error),
}

/// Ошибка уровня репозиториев: любой отказ нижележащего хранилища
#[derive(Debug, Error)]
#[error("persistence error: {source}")]
pub struct PersistenceError {
    #[from]
    source: StoreError,
}

/// Результат пишущего запроса
#[derive(Debug, Clone, Copy)]
pub struct ExecResult {
    pub last_insert_id: i64,
    pub rows_affected: usize,
}

/// Хранилище: одно соединение SQLite, обслуживаемое фоновым потоком.
/// Каждый query/execute — один асинхронный round trip; выполнение
/// операторов сериализуется самим соединением.
///
/// Объект создаётся один раз на старте процесса и передаётся
/// в репозитории через Arc.
pub struct Store {
    path: String,
    conn: Mutex<Option<Arc<Connection>>>,
}

/// Демонстрационные записи для первой инициализации
const SEED_ITEMS: [(&str, &str, &str, &str, &str); 3] = [
    ("10:00-11:30", "Mathematics", "Ivanov I.I.", "Monday", "Lecture"),
    ("12:00-13:30", "Physics", "Petrov P.P.", "Tuesday", "Practice"),
    ("14:00-15:30", "Computer Science", "Sidorov S.S.", "Wednesday", "Lecture"),
];

impl Store {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            conn: Mutex::new(None),
        }
    }

    /// Открывает (или создаёт) файл базы, прогоняет миграции и при пустом
    /// расписании заливает демонстрационные строки.
    ///
    /// Повторный вызов безопасен: миграции — no-op, непустая таблица
    /// не засевается заново. Любая ошибка ввода-вывода или SQL поднимается
    /// наверх; для приложения это фатально.
    pub async fn initialize(&self) -> Result<(), StoreError> {
        info!("Initializing database at {}", self.path);

        let conn = match self.connection() {
            Ok(existing) => existing,
            Err(_) => Arc::new(Connection::open(self.path.clone()).await?),
        };

        let (count, seeded) = conn
            .call(|conn| {
                setup_migrations(conn)?;
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM schedule_items", [], |r| r.get(0))?;
                if count == 0 {
                    seed_schedule_items(conn)?;
                    Ok((SEED_ITEMS.len() as i64, true))
                } else {
                    Ok((count, false))
                }
            })
            .await?;

        if seeded {
            info!("schedule_items was empty, seeded {} sample rows", count);
        } else {
            info!("schedule_items already holds {} rows, seeding skipped", count);
        }

        *self.conn.lock().unwrap() = Some(conn);
        info!("Database initialization finished");
        Ok(())
    }

    /// Читающий запрос: все подошедшие строки, смапленные через map.
    /// Пустой результат — пустой вектор, не ошибка.
    pub async fn query<T, F>(
        &self,
        sql: &str,
        params: Vec<Value>,
        map: F,
    ) -> Result<Vec<T>, StoreError>
    where
        T: Send + 'static,
        F: Fn(&rusqlite::Row<'_>) -> rusqlite::Result<T> + Send + 'static,
    {
        let conn = self.connection()?;
        debug!("SQL query: {} params: {:?}", sql, params);

        let sql = sql.to_owned();
        let rows = conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let mut rows = stmt.query(params_from_iter(params))?;
                let mut out = Vec::new();
                while let Some(row) = rows.next()? {
                    out.push(map(row)?);
                }
                Ok(out)
            })
            .await?;

        debug!("SQL query returned {} rows", rows.len());
        Ok(rows)
    }

    /// Пишущий запрос (INSERT/UPDATE/DELETE)
    pub async fn execute(&self, sql: &str, params: Vec<Value>) -> Result<ExecResult, StoreError> {
        let conn = self.connection()?;
        debug!("SQL execute: {} params: {:?}", sql, params);

        let sql = sql.to_owned();
        let result = conn
            .call(move |conn| {
                let rows_affected = conn.execute(&sql, params_from_iter(params))?;
                Ok(ExecResult {
                    last_insert_id: conn.last_insert_rowid(),
                    rows_affected,
                })
            })
            .await?;

        debug!(
            "SQL execute result: last_insert_id={}, rows_affected={}",
            result.last_insert_id, result.rows_affected
        );
        Ok(result)
    }

    /// Отладочный дамп обеих таблиц в лог.
    /// Ошибки здесь не поднимаются: это диагностика, не данные.
    pub async fn debug_dump(&self) {
        debug!("=== Database dump ===");

        match self
            .query(
                "SELECT name FROM sqlite_master WHERE type='table'",
                vec![],
                |row| row.get::<_, String>(0),
            )
            .await
        {
            Ok(tables) => debug!("Tables: {}", tables.join(", ")),
            Err(e) => error!("Failed to list tables: {}", e),
        }

        for table in ["schedule_items", "profile"] {
            match self
                .query(&format!("SELECT * FROM {}", table), vec![], row_to_line)
                .await
            {
                Ok(lines) => {
                    debug!("{} ({} rows):", table, lines.len());
                    for line in lines {
                        debug!("  {}", line);
                    }
                }
                Err(e) => error!("Failed to dump {}: {}", table, e),
            }
        }

        debug!("=== Dump finished ===");
    }

    fn connection(&self) -> Result<Arc<Connection>, StoreError> {
        self.conn
            .lock()
            .unwrap()
            .clone()
            .ok_or(StoreError::NotInitialized)
    }
}

fn seed_schedule_items(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    let mut stmt = conn.prepare(
        "INSERT INTO schedule_items (time, subject, teacherName, dayOfWeek, lessonType, createdAt)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    for (time, subject, teacher_name, day_of_week, lesson_type) in SEED_ITEMS {
        stmt.execute(params![
            time,
            subject,
            teacher_name,
            day_of_week,
            lesson_type,
            created_at
        ])?;
    }
    Ok(())
}

/// Строка таблицы в читаемом виде для дампа
fn row_to_line(row: &rusqlite::Row<'_>) -> rusqlite::Result<String> {
    let column_count = row.as_ref().column_count();
    let mut cells = Vec::with_capacity(column_count);
    for i in 0..column_count {
        cells.push(value_to_string(row.get_ref(i)?));
    }
    Ok(cells.join(", "))
}

/// Преобразование ValueRef в строку
fn value_to_string(v: ValueRef<'_>) -> String {
    match v {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(r) => r.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).to_string(),
        ValueRef::Blob(b) => format!("<blob {} bytes>", b.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_store() -> Store {
        let store = Store::new(":memory:");
        store.initialize().await.expect("Failed to initialize store");
        store
    }

    async fn schedule_count(store: &Store) -> i64 {
        store
            .query("SELECT COUNT(*) FROM schedule_items", vec![], |row| {
                row.get(0)
            })
            .await
            .expect("Failed to count rows")[0]
    }

    #[tokio::test]
    async fn test_query_before_initialize_fails() {
        let store = Store::new(":memory:");

        let result = store
            .query("SELECT 1", vec![], |row| row.get::<_, i64>(0))
            .await;
        assert!(matches!(result, Err(StoreError::NotInitialized)));

        let result = store.execute("DELETE FROM schedule_items", vec![]).await;
        assert!(matches!(result, Err(StoreError::NotInitialized)));
    }

    #[tokio::test]
    async fn test_initialize_creates_tables() {
        let store = setup_store().await;

        let tables = store
            .query(
                "SELECT name FROM sqlite_master WHERE type='table' ORDER BY name",
                vec![],
                |row| row.get::<_, String>(0),
            )
            .await
            .expect("Failed to list tables");

        assert!(tables.contains(&"profile".to_string()));
        assert!(tables.contains(&"schedule_items".to_string()));
    }

    #[tokio::test]
    async fn test_initialize_seeds_empty_schedule() {
        let store = setup_store().await;
        assert_eq!(schedule_count(&store).await, 3);
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let store = setup_store().await;
        store.initialize().await.expect("repeat initialize failed");
        assert_eq!(schedule_count(&store).await, 3);

        // Непустая таблица не засевается и после добавления своих строк
        store
            .execute(
                "INSERT INTO schedule_items (time, subject, teacherName, dayOfWeek, lessonType, createdAt)
                 VALUES ('08:00-09:30', 'Chemistry', 'Orlova O.O.', 'Thursday', 'Lecture', '2024-09-01T08:00:00.000Z')",
                vec![],
            )
            .await
            .expect("insert failed");
        store.initialize().await.expect("third initialize failed");
        assert_eq!(schedule_count(&store).await, 4);
    }

    #[tokio::test]
    async fn test_execute_reports_insert_id_and_changes() {
        let store = setup_store().await;

        let result = store
            .execute(
                "INSERT INTO profile (id, lastName, firstName, middleName, birthDate, groupNumber)
                 VALUES (1, 'Ivanov', 'Ivan', 'Ivanovich', '01.09.2004', 'KS-21')",
                vec![],
            )
            .await
            .expect("insert failed");

        assert_eq!(result.last_insert_id, 1);
        assert_eq!(result.rows_affected, 1);
    }

    #[tokio::test]
    async fn test_initialize_migrates_v1_database() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("legacy.db");

        // База "старого" формата: только первый шаг схемы и одна строка
        {
            let conn = rusqlite::Connection::open(&path).expect("Failed to open legacy db");
            conn.execute_batch(crate::db::schema::SCHEMA_V1)
                .expect("Failed to apply v1 schema");
            conn.execute(
                "INSERT INTO schedule_items (time, subject, teacherName, dayOfWeek, createdAt)
                 VALUES ('09:00-10:30', 'History', 'Ivanov I.I.', 'Friday', '2024-01-01T00:00:00.000Z')",
                [],
            )
            .expect("Failed to insert legacy row");
        }

        let store = Store::new(path.to_string_lossy().to_string());
        store
            .initialize()
            .await
            .expect("Failed to initialize over v1 db");

        // Колонка добавлена, строка уцелела, засев не сработал
        let rows = store
            .query(
                "SELECT subject, lessonType FROM schedule_items",
                vec![],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?)),
            )
            .await
            .expect("Failed to query migrated table");

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, "History");
        assert_eq!(rows[0].1, None);
    }
}
