//! Finder location reports attached to a pet.

use chrono::SecondsFormat;
use rusqlite::params;

use pawtag_shared::{LocationHistory, LocationSample, PetId};

use crate::database::{parse_timestamp, Database};
use crate::error::{Result, StoreError};

/// Most recent reports returned per pet.
pub const HISTORY_LIMIT: usize = 50;

impl Database {
    /// Append a report to the pet's history.
    pub fn insert_location(&self, pet_id: PetId, sample: &LocationSample) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO pet_locations (pet_id, latitude, longitude, city, country, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    pet_id.to_string(),
                    sample.latitude,
                    sample.longitude,
                    sample.city,
                    sample.country,
                    sample.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
                ],
            )
            .map_err(|e| match e {
                // Foreign key failure: the pet is gone.
                rusqlite::Error::SqliteFailure(err, _)
                    if err.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    StoreError::NotFound
                }
                other => StoreError::Sqlite(other),
            })?;
        Ok(())
    }

    /// The latest [`HISTORY_LIMIT`] reports for a pet, oldest first.
    pub fn list_locations(&self, pet_id: PetId) -> Result<LocationHistory> {
        let mut stmt = self.conn().prepare(
            "SELECT latitude, longitude, city, country, timestamp
             FROM pet_locations WHERE pet_id = ?1 ORDER BY id DESC LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![pet_id.to_string(), HISTORY_LIMIT as i64], |row| {
            let ts: String = row.get(4)?;
            Ok(LocationSample {
                latitude: row.get(0)?,
                longitude: row.get(1)?,
                city: row.get(2)?,
                country: row.get(3)?,
                timestamp: parse_timestamp(4, &ts)?,
            })
        })?;

        let mut samples = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        samples.reverse();
        Ok(LocationHistory::from(samples))
    }
}
