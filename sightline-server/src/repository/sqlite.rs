//! SQLite repository adapter
//!
//! Schema creation is idempotent (`CREATE TABLE IF NOT EXISTS`) and runs on
//! every connect. Identifiers are stored as hyphenated UUID text.
//! Soft-deleted sightings (`deleted_at IS NOT NULL`) are invisible to every
//! query.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;

use sightline_common::models::{Animal, SightingRecord, User};
use sightline_common::{Coordinate, Error, Result};

use super::{AnimalRepository, SightingRepository, UserRepository};

/// sqlx-backed store implementing every repository trait
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database file and its schema
    pub async fn connect(db_path: &Path) -> Result<Self> {
        let newly_created = !db_path.exists();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path.display()))?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_millis(5000));

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await?;

        if newly_created {
            info!("Initialized new database: {}", db_path.display());
        } else {
            info!("Opened existing database: {}", db_path.display());
        }

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Private in-memory database (single connection so the data persists)
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn init_schema(&self) -> Result<()> {
        create_animals_table(&self.pool).await?;
        create_users_table(&self.pool).await?;
        create_sightings_table(&self.pool).await?;
        Ok(())
    }
}

async fn create_animals_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS animals (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            last_known_time TIMESTAMP NOT NULL,
            last_known_latitude REAL NOT NULL,
            last_known_longitude REAL NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            guid TEXT PRIMARY KEY,
            display_name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE COLLATE NOCASE,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_sightings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sightings (
            guid TEXT PRIMARY KEY,
            animal_id TEXT NOT NULL REFERENCES animals(guid),
            observed_time TIMESTAMP NOT NULL,
            latitude REAL NOT NULL,
            longitude REAL NOT NULL,
            image_reference TEXT,
            reporter_id TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL,
            deleted_at TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_sightings_animal_observed ON sightings(animal_id, observed_time)",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_sightings_reporter ON sightings(reporter_id)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Turn a unique-constraint violation into `Conflict`
fn map_insert_error(err: sqlx::Error, what: impl FnOnce() -> String) -> Error {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => Error::Conflict(what()),
        _ => Error::Database(err),
    }
}

fn parse_uuid(row: &SqliteRow, column: &str) -> Result<Uuid> {
    let text: String = row.try_get(column)?;
    Uuid::parse_str(&text)
        .map_err(|e| Error::internal(format!("corrupt uuid in column {}: {}", column, e)))
}

fn animal_from_row(row: &SqliteRow) -> Result<Animal> {
    Ok(Animal {
        id: parse_uuid(row, "guid")?,
        name: row.try_get("name")?,
        last_known_time: row.try_get::<DateTime<Utc>, _>("last_known_time")?,
        last_known_location: Coordinate::new(
            row.try_get("last_known_latitude")?,
            row.try_get("last_known_longitude")?,
        ),
    })
}

fn sighting_from_row(row: &SqliteRow) -> Result<SightingRecord> {
    Ok(SightingRecord {
        id: parse_uuid(row, "guid")?,
        animal_id: parse_uuid(row, "animal_id")?,
        observed_time: row.try_get::<DateTime<Utc>, _>("observed_time")?,
        location: Coordinate::new(row.try_get("latitude")?, row.try_get("longitude")?),
        image_reference: row.try_get("image_reference")?,
        reporter_id: parse_uuid(row, "reporter_id")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

const SIGHTING_COLUMNS: &str =
    "guid, animal_id, observed_time, latitude, longitude, image_reference, reporter_id, created_at";

#[async_trait]
impl AnimalRepository for SqliteStore {
    async fn get_by_id(&self, id: Uuid) -> Result<Animal> {
        let row = sqlx::query(
            "SELECT guid, name, last_known_time, last_known_latitude, last_known_longitude
             FROM animals WHERE guid = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => animal_from_row(&row),
            None => Err(Error::NotFound(format!("animal {}", id))),
        }
    }

    async fn create(&self, animal: &Animal) -> Result<()> {
        sqlx::query(
            "INSERT INTO animals (guid, name, last_known_time, last_known_latitude, last_known_longitude)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(animal.id.to_string())
        .bind(&animal.name)
        .bind(animal.last_known_time)
        .bind(animal.last_known_location.latitude)
        .bind(animal.last_known_location.longitude)
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, || format!("animal name '{}' already exists", animal.name)))?;

        Ok(())
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Animal>> {
        let rows = sqlx::query(
            "SELECT guid, name, last_known_time, last_known_latitude, last_known_longitude
             FROM animals ORDER BY last_known_time DESC, name ASC LIMIT ? OFFSET ?",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(animal_from_row).collect()
    }
}

#[async_trait]
impl SightingRepository for SqliteStore {
    async fn get_latest_by_animal_id(&self, animal_id: Uuid) -> Result<Option<SightingRecord>> {
        let sql = format!(
            "SELECT {} FROM sightings
             WHERE animal_id = ? AND deleted_at IS NULL
             ORDER BY observed_time DESC, created_at DESC LIMIT 1",
            SIGHTING_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(animal_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(sighting_from_row).transpose()
    }

    async fn create(&self, record: &SightingRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO sightings
             (guid, animal_id, observed_time, latitude, longitude, image_reference, reporter_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(record.id.to_string())
        .bind(record.animal_id.to_string())
        .bind(record.observed_time)
        .bind(record.location.latitude)
        .bind(record.location.longitude)
        .bind(&record.image_reference)
        .bind(record.reporter_id.to_string())
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, || format!("sighting {} already exists", record.id)))?;

        Ok(())
    }

    async fn list_by_animal_id(
        &self,
        animal_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<SightingRecord>> {
        let sql = format!(
            "SELECT {} FROM sightings
             WHERE animal_id = ? AND deleted_at IS NULL
             ORDER BY observed_time DESC, created_at DESC LIMIT ? OFFSET ?",
            SIGHTING_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(animal_id.to_string())
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(sighting_from_row).collect()
    }

    async fn list_distinct_reporter_ids(&self, animal_id: Uuid) -> Result<Vec<Uuid>> {
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT reporter_id FROM sightings
             WHERE animal_id = ? AND deleted_at IS NULL
             GROUP BY reporter_id
             ORDER BY MIN(created_at)",
        )
        .bind(animal_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        ids.iter()
            .map(|id| {
                Uuid::parse_str(id)
                    .map_err(|e| Error::internal(format!("corrupt reporter id {}: {}", id, e)))
            })
            .collect()
    }
}

#[async_trait]
impl UserRepository for SqliteStore {
    async fn get_by_id(&self, id: Uuid) -> Result<User> {
        let row = sqlx::query("SELECT guid, display_name, email FROM users WHERE guid = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(User {
                id: parse_uuid(&row, "guid")?,
                display_name: row.try_get("display_name")?,
                email: row.try_get("email")?,
            }),
            None => Err(Error::NotFound(format!("user {}", id))),
        }
    }

    async fn create(&self, user: &User) -> Result<()> {
        sqlx::query("INSERT INTO users (guid, display_name, email) VALUES (?, ?, ?)")
            .bind(user.id.to_string())
            .bind(&user.display_name)
            .bind(&user.email)
            .execute(&self.pool)
            .await
            .map_err(|e| map_insert_error(e, || format!("email '{}' already registered", user.email)))?;

        Ok(())
    }
}
