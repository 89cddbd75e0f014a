use async_trait::async_trait;
use sqlx::{PgPool, Row};

use super::DatabaseError;
use crate::profile::{
    ProfileBackend, ProfileEntries, ProfileError, ProfileKey, ProfileType, ProfileValue, ProfileWrite,
};
use crate::types::ObjectId;

/// Profiles kept in the `profiles` table, one row per `(userid, idx, idx2)`.
pub struct PgProfileBackend {
    pool: PgPool,
}

impl PgProfileBackend {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl From<DatabaseError> for ProfileError {
    fn from(err: DatabaseError) -> Self {
        ProfileError::Storage(err.to_string())
    }
}

fn storage(err: sqlx::Error) -> ProfileError {
    tracing::error!("Profile query failed: {}", err);
    DatabaseError::Sqlx(err).into()
}

#[async_trait]
impl ProfileBackend for PgProfileBackend {
    async fn load(&self, userid: ObjectId) -> Result<ProfileEntries, ProfileError> {
        let rows = sqlx::query(
            "SELECT idx, idx2, value_id, value_int, value_str, type FROM profiles WHERE userid = $1",
        )
        .bind(userid as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        let mut entries = ProfileEntries::new();
        for row in rows {
            let idx: String = row.try_get("idx").map_err(storage)?;
            let idx2: i64 = row.try_get("idx2").map_err(storage)?;
            let kind: i32 = row.try_get("type").map_err(storage)?;

            let value = match u8::try_from(kind).ok().and_then(|k| ProfileType::try_from(k).ok()) {
                Some(ProfileType::Id) => ProfileValue::Id(row.try_get::<i64, _>("value_id").map_err(storage)? as ObjectId),
                Some(ProfileType::Int) => ProfileValue::Int(row.try_get("value_int").map_err(storage)?),
                Some(ProfileType::Str) => ProfileValue::Str(row.try_get("value_str").map_err(storage)?),
                None => {
                    tracing::warn!("Skipping profile row {} with unknown type {}", idx, kind);
                    continue;
                }
            };

            entries.insert(ProfileKey::new(idx, idx2 as ObjectId), value);
        }

        Ok(entries)
    }

    async fn commit(&self, userid: ObjectId, writes: &[ProfileWrite]) -> Result<(), ProfileError> {
        for write in writes {
            write.check()?;
        }

        // Start transaction for atomic operation
        let mut tx = self.pool.begin().await.map_err(storage)?;

        for write in writes {
            let key = write.key();
            sqlx::query("DELETE FROM profiles WHERE userid = $1 AND idx = $2 AND idx2 = $3")
                .bind(userid as i64)
                .bind(&key.idx)
                .bind(key.idx2 as i64)
                .execute(&mut *tx)
                .await
                .map_err(storage)?;

            if let ProfileWrite::Set(_, value) = write {
                let (value_id, value_int, value_str) = match value {
                    ProfileValue::Id(v) => (*v as i64, 0, String::new()),
                    ProfileValue::Int(v) => (0, *v, String::new()),
                    ProfileValue::Str(v) => (0, 0, v.clone()),
                };

                sqlx::query(
                    r#"
                    INSERT INTO profiles (userid, idx, idx2, value_id, value_int, value_str, type)
                    VALUES ($1, $2, $3, $4, $5, $6, $7)
                    "#,
                )
                .bind(userid as i64)
                .bind(&key.idx)
                .bind(key.idx2 as i64)
                .bind(value_id)
                .bind(value_int)
                .bind(value_str)
                .bind(u8::from(value.profile_type()) as i32)
                .execute(&mut *tx)
                .await
                .map_err(storage)?;
            }
        }

        // Dropping the transaction without commit rolls it back
        tx.commit().await.map_err(storage)?;
        Ok(())
    }
}
