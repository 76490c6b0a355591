// src/db/profile.rs

use std::sync::Arc;

use log::{debug, error};
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

use crate::db::monitoring::measure_db_operation;
use crate::db::store::{PersistenceError, Store};

/// id единственной строки профиля (соглашение, не constraint базы)
const PROFILE_ID: i64 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub last_name: String,
    pub first_name: String,
    pub middle_name: String,
    pub birth_date: String,
    pub group_number: String,
}

/// Поля профиля без id: id всегда закреплён за 1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileInput {
    pub last_name: String,
    pub first_name: String,
    pub middle_name: String,
    pub birth_date: String,
    pub group_number: String,
}

pub struct ProfileRepo {
    store: Arc<Store>,
}

impl ProfileRepo {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Единственная строка профиля, None если её ещё нет
    pub async fn get_profile(&self) -> Result<Option<UserProfile>, PersistenceError> {
        measure_db_operation("profile_get", async {
            let profiles = self
                .store
                .query(
                    "SELECT id, lastName, firstName, middleName, birthDate, groupNumber
                     FROM profile LIMIT 1",
                    vec![],
                    row_to_profile,
                )
                .await
                .map_err(|e| {
                    error!("Failed to load profile: {}", e);
                    PersistenceError::from(e)
                })?;

            let profile = profiles.into_iter().next();
            debug!(
                "Loaded profile: {}",
                serde_json::to_string(&profile).unwrap_or_default()
            );
            Ok(profile)
        })
        .await
    }

    /// Upsert: существующая строка обновляется на месте,
    /// иначе вставляется новая с id = 1. Строка никогда не удаляется.
    pub async fn save_profile(&self, input: ProfileInput) -> Result<UserProfile, PersistenceError> {
        measure_db_operation("profile_save", async {
            let existing = self.get_profile().await?;

            if existing.is_some() {
                self.store
                    .execute(
                        "UPDATE profile SET
                            lastName = ?1,
                            firstName = ?2,
                            middleName = ?3,
                            birthDate = ?4,
                            groupNumber = ?5
                         WHERE id = ?6",
                        vec![
                            Value::from(input.last_name.clone()),
                            Value::from(input.first_name.clone()),
                            Value::from(input.middle_name.clone()),
                            Value::from(input.birth_date.clone()),
                            Value::from(input.group_number.clone()),
                            Value::from(PROFILE_ID),
                        ],
                    )
                    .await
                    .map_err(|e| {
                        error!("Failed to update profile: {}", e);
                        PersistenceError::from(e)
                    })?;
            } else {
                self.store
                    .execute(
                        "INSERT INTO profile (id, lastName, firstName, middleName, birthDate, groupNumber)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                        vec![
                            Value::from(PROFILE_ID),
                            Value::from(input.last_name.clone()),
                            Value::from(input.first_name.clone()),
                            Value::from(input.middle_name.clone()),
                            Value::from(input.birth_date.clone()),
                            Value::from(input.group_number.clone()),
                        ],
                    )
                    .await
                    .map_err(|e| {
                        error!("Failed to insert profile: {}", e);
                        PersistenceError::from(e)
                    })?;
            }

            Ok(UserProfile {
                id: PROFILE_ID,
                last_name: input.last_name,
                first_name: input.first_name,
                middle_name: input.middle_name,
                birth_date: input.birth_date,
                group_number: input.group_number,
            })
        })
        .await
    }
}

fn row_to_profile(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserProfile> {
    Ok(UserProfile {
        id: row.get(0)?,
        last_name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        first_name: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        middle_name: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        birth_date: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        group_number: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
    })
}
