//! SQLite persistence for committed pins.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use inforecord_core::{RusqliteErrorExt, StorageError};

use crate::geo::GeoPoint;
use crate::marker::{FixedMarker, MarkerId};

const SCHEMA_VERSION: i32 = 1;

pub struct PinDatabase {
    conn: Connection,
}

impl PinDatabase {
    /// Open or create the database
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(RusqliteErrorExt::into_storage_error)?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(RusqliteErrorExt::into_storage_error)?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<(), StorageError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);

                CREATE TABLE IF NOT EXISTS pins (
                    seq INTEGER PRIMARY KEY AUTOINCREMENT,
                    id TEXT NOT NULL UNIQUE,
                    latitude REAL NOT NULL,
                    longitude REAL NOT NULL,
                    label TEXT NOT NULL,
                    keyword TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );",
            )
            .map_err(RusqliteErrorExt::into_storage_error)?;

        let version: Option<i32> = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .optional()
            .map_err(RusqliteErrorExt::into_storage_error)?;

        match version {
            None => {
                self.conn
                    .execute(
                        "INSERT INTO schema_version (version) VALUES (?1)",
                        params![SCHEMA_VERSION],
                    )
                    .map_err(RusqliteErrorExt::into_storage_error)?;
            }
            Some(v) if v > SCHEMA_VERSION => {
                return Err(StorageError::Corruption(format!(
                    "pin database schema v{v} is newer than supported v{SCHEMA_VERSION}"
                )));
            }
            Some(_) => {}
        }

        Ok(())
    }

    /// Store a pin. Returns false if a pin with the same id exists.
    pub fn insert(&self, marker: &FixedMarker) -> Result<bool, StorageError> {
        let position = marker.position();
        let changed = self
            .conn
            .execute(
                "INSERT OR IGNORE INTO pins (id, latitude, longitude, label, keyword, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    marker.id().to_string(),
                    position.lat(),
                    position.lng(),
                    marker.label(),
                    marker.keyword(),
                    marker.created_at().to_rfc3339(),
                ],
            )
            .map_err(RusqliteErrorExt::into_storage_error)?;
        Ok(changed == 1)
    }

    /// All pins in the order they were committed.
    pub fn load_all(&self) -> Result<Vec<FixedMarker>, StorageError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, latitude, longitude, label, keyword, created_at
                 FROM pins ORDER BY seq ASC",
            )
            .map_err(RusqliteErrorExt::into_storage_error)?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })
            .map_err(RusqliteErrorExt::into_storage_error)?;

        let mut pins = Vec::new();
        for row in rows {
            let (id, lat, lng, label, keyword, created_at) =
                row.map_err(RusqliteErrorExt::into_storage_error)?;

            let id = MarkerId::parse(&id)
                .map_err(|e| StorageError::Corruption(format!("pin id '{id}': {e}")))?;
            let position = GeoPoint::new(lat, lng)
                .map_err(|e| StorageError::Corruption(format!("pin {id}: {e}")))?;
            let created_at = DateTime::parse_from_rfc3339(&created_at)
                .map_err(|e| StorageError::Corruption(format!("pin {id} timestamp: {e}")))?
                .with_timezone(&Utc);

            pins.push(FixedMarker::from_parts(id, position, label, keyword, created_at));
        }

        Ok(pins)
    }
}
