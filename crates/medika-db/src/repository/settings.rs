//! # Settings Repository
//!
//! Key/value clinic configuration (name, address, receipt footer, ...).
//!
//! Defaults are seeded with one `INSERT OR IGNORE` per key, so concurrent
//! initializers racing on an empty table cannot produce duplicates; each
//! default key is inserted only if absent, and the operation is idempotent
//! without any locking.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use medika_core::Setting;

/// Default settings seeded on first startup.
const DEFAULT_SETTINGS: &[(&str, &str)] = &[
    ("clinic_name", "Medika Clinic"),
    ("clinic_address", ""),
    ("clinic_phone", ""),
    ("receipt_footer", "Thank you, get well soon"),
    ("low_stock_alerts_enabled", "true"),
];

/// Repository for the settings key/value store.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Seeds any missing default keys. Idempotent; existing values are never
    /// overwritten.
    pub async fn ensure_defaults(&self) -> DbResult<()> {
        let now = Utc::now();

        for (key, value) in DEFAULT_SETTINGS.iter().copied() {
            sqlx::query("INSERT OR IGNORE INTO settings (key, value, updated_at) VALUES (?, ?, ?)")
                .bind(key)
                .bind(value)
                .bind(now)
                .execute(&self.pool)
                .await?;
        }

        debug!("Default settings ensured");
        Ok(())
    }

    /// Gets one setting by key.
    pub async fn get(&self, key: &str) -> DbResult<Option<Setting>> {
        let setting =
            sqlx::query_as::<_, Setting>("SELECT key, value, updated_at FROM settings WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        Ok(setting)
    }

    /// Lists all settings sorted by key.
    pub async fn get_all(&self) -> DbResult<Vec<Setting>> {
        let settings =
            sqlx::query_as::<_, Setting>("SELECT key, value, updated_at FROM settings ORDER BY key")
                .fetch_all(&self.pool)
                .await?;

        Ok(settings)
    }

    /// Upserts one setting value.
    pub async fn set(&self, key: &str, value: &str) -> DbResult<Setting> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO settings (key, value, updated_at) VALUES (?, ?, ?)
            ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Setting {
            key: key.to_string(),
            value: value.to_string(),
            updated_at: now,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::setup_db;

    #[tokio::test]
    async fn test_ensure_defaults_is_idempotent() {
        let db = setup_db().await;
        let settings = db.settings();

        settings.ensure_defaults().await.unwrap();
        let first = settings.get_all().await.unwrap();
        assert_eq!(first.len(), DEFAULT_SETTINGS.len());

        // Customize one key, then re-run the initializer.
        settings.set("clinic_name", "Klinik Sehat").await.unwrap();
        settings.ensure_defaults().await.unwrap();

        let after = settings.get_all().await.unwrap();
        assert_eq!(after.len(), DEFAULT_SETTINGS.len());
        assert_eq!(
            settings.get("clinic_name").await.unwrap().unwrap().value,
            "Klinik Sehat"
        );
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let db = setup_db().await;
        let settings = db.settings();

        assert!(settings.get("clinic_phone").await.unwrap().is_none());

        settings.set("clinic_phone", "021-555-0101").await.unwrap();
        assert_eq!(
            settings.get("clinic_phone").await.unwrap().unwrap().value,
            "021-555-0101"
        );

        settings.set("clinic_phone", "021-555-0202").await.unwrap();
        assert_eq!(
            settings.get("clinic_phone").await.unwrap().unwrap().value,
            "021-555-0202"
        );
    }
}
