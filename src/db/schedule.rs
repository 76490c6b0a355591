// src/db/schedule.rs

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use log::{debug, error};
use once_cell::sync::Lazy;
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

use crate::db::monitoring::measure_db_operation;
use crate::db::store::{PersistenceError, Store};

/// Порядок дней недели для сортировки.
/// Неопознанный день получает 0 и встаёт раньше всех остальных.
static WEEKDAY_ORDER: Lazy<HashMap<&'static str, u8>> = Lazy::new(|| {
    HashMap::from([
        ("Monday", 1),
        ("Tuesday", 2),
        ("Wednesday", 3),
        ("Thursday", 4),
        ("Friday", 5),
        ("Saturday", 6),
        ("Sunday", 7),
    ])
});

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleItem {
    pub id: i64,
    pub time: String,
    pub subject: String,
    pub teacher_name: String,
    pub day_of_week: String,
    pub lesson_type: String,
    pub created_at: String,
}

/// Входные данные добавления: id и createdAt назначает хранилище
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleItemInput {
    pub time: String,
    pub subject: String,
    pub teacher_name: String,
    pub day_of_week: String,
    pub lesson_type: String,
}

pub struct ScheduleRepo {
    store: Arc<Store>,
}

impl ScheduleRepo {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Все занятия, отсортированные по дню недели и времени начала
    pub async fn get_all(&self) -> Result<Vec<ScheduleItem>, PersistenceError> {
        measure_db_operation("schedule_get_all", async {
            let mut items = self
                .store
                .query(
                    "SELECT id, time, subject, teacherName, dayOfWeek, lessonType, createdAt
                     FROM schedule_items",
                    vec![],
                    row_to_item,
                )
                .await
                .map_err(|e| {
                    error!("Failed to load schedule: {}", e);
                    PersistenceError::from(e)
                })?;

            items.sort_by(compare_items);
            debug!(
                "Loaded {} schedule items: {}",
                items.len(),
                serde_json::to_string(&items).unwrap_or_default()
            );
            Ok(items)
        })
        .await
    }

    /// Добавляет занятие: проставляет createdAt и возвращает запись
    /// с назначенным хранилищем id. createdAt после этого не меняется.
    pub async fn add(&self, input: ScheduleItemInput) -> Result<ScheduleItem, PersistenceError> {
        measure_db_operation("schedule_add", async {
            let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

            let result = self
                .store
                .execute(
                    "INSERT INTO schedule_items (time, subject, teacherName, dayOfWeek, lessonType, createdAt)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    vec![
                        Value::from(input.time.clone()),
                        Value::from(input.subject.clone()),
                        Value::from(input.teacher_name.clone()),
                        Value::from(input.day_of_week.clone()),
                        Value::from(input.lesson_type.clone()),
                        Value::from(created_at.clone()),
                    ],
                )
                .await
                .map_err(|e| {
                    error!("Failed to add schedule item: {}", e);
                    PersistenceError::from(e)
                })?;

            Ok(ScheduleItem {
                id: result.last_insert_id,
                time: input.time,
                subject: input.subject,
                teacher_name: input.teacher_name,
                day_of_week: input.day_of_week,
                lesson_type: input.lesson_type,
                created_at,
            })
        })
        .await
    }

    /// Удаляет занятие по id; отсутствие строки не считается ошибкой
    pub async fn remove(&self, id: i64) -> Result<(), PersistenceError> {
        measure_db_operation("schedule_remove", async {
            self.store
                .execute(
                    "DELETE FROM schedule_items WHERE id = ?1",
                    vec![Value::from(id)],
                )
                .await
                .map_err(|e| {
                    error!("Failed to remove schedule item {}: {}", id, e);
                    PersistenceError::from(e)
                })?;
            Ok(())
        })
        .await
    }

    /// Полностью очищает расписание
    pub async fn clear(&self) -> Result<(), PersistenceError> {
        measure_db_operation("schedule_clear", async {
            self.store
                .execute("DELETE FROM schedule_items", vec![])
                .await
                .map_err(|e| {
                    error!("Failed to clear schedule: {}", e);
                    PersistenceError::from(e)
                })?;
            Ok(())
        })
        .await
    }
}

fn row_to_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<ScheduleItem> {
    Ok(ScheduleItem {
        id: row.get(0)?,
        time: row.get(1)?,
        subject: row.get(2)?,
        teacher_name: row.get(3)?,
        day_of_week: row.get(4)?,
        // строки, записанные до появления колонки, читаются как NULL
        lesson_type: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        created_at: row.get(6)?,
    })
}

fn weekday_ordinal(day: &str) -> u8 {
    WEEKDAY_ORDER.get(day).copied().unwrap_or(0)
}

/// Начало занятия: префикс "HH:MM" до дефиса
fn start_time(time: &str) -> &str {
    time.split('-').next().unwrap_or("")
}

fn compare_items(a: &ScheduleItem, b: &ScheduleItem) -> Ordering {
    weekday_ordinal(&a.day_of_week)
        .cmp(&weekday_ordinal(&b.day_of_week))
        .then_with(|| start_time(&a.time).cmp(start_time(&b.time)))
}
