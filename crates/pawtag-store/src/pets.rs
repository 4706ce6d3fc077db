//! CRUD operations for [`PetRecord`] rows.

use chrono::SecondsFormat;
use rusqlite::params;

use pawtag_shared::{PetId, PetRecord, QrId};

use crate::database::{conversion_error, parse_timestamp, parse_uuid, Database};
use crate::error::{Result, StoreError};

const PET_COLUMNS: &str =
    "id, qr_id, pet_name, owner_name, phone, address, notes, reward, photo_url, created_at";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new pet. The record is validated first.
    pub fn insert_pet(&self, pet: &PetRecord) -> Result<()> {
        pet.validate()?;
        self.conn()
            .execute(
                "INSERT INTO pets (id, qr_id, pet_name, owner_name, phone, address, notes, reward, photo_url, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    pet.id.to_string(),
                    pet.qr_id.as_str(),
                    pet.pet_name,
                    pet.owner_name,
                    pet.phone,
                    pet.address,
                    pet.notes,
                    pet.reward,
                    pet.photo_url,
                    pet.created_at.to_rfc3339_opts(SecondsFormat::Micros, true),
                ],
            )
            .map_err(|e| StoreError::from_write(e, "pet identifier"))?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a pet by its public display identifier.
    pub fn get_pet_by_qr_id(&self, qr_id: &QrId) -> Result<PetRecord> {
        self.conn()
            .query_row(
                &format!("SELECT {PET_COLUMNS} FROM pets WHERE qr_id = ?1"),
                params![qr_id.as_str()],
                row_to_pet,
            )
            .map_err(StoreError::from_query)
    }

    /// Fetch a pet by its internal id.
    pub fn get_pet(&self, id: PetId) -> Result<PetRecord> {
        self.conn()
            .query_row(
                &format!("SELECT {PET_COLUMNS} FROM pets WHERE id = ?1"),
                params![id.to_string()],
                row_to_pet,
            )
            .map_err(StoreError::from_query)
    }

    /// List all pets, newest first.
    pub fn list_pets(&self) -> Result<Vec<PetRecord>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {PET_COLUMNS} FROM pets ORDER BY created_at DESC, rowid DESC"
        ))?;

        let rows = stmt.query_map([], row_to_pet)?;

        let mut pets = Vec::new();
        for row in rows {
            pets.push(row?);
        }
        Ok(pets)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Overwrite every mutable field of an existing pet. `qr_id` and
    /// `created_at` are never rewritten.
    pub fn update_pet(&self, pet: &PetRecord) -> Result<()> {
        pet.validate()?;
        let affected = self.conn().execute(
            "UPDATE pets
             SET pet_name = ?2, owner_name = ?3, phone = ?4, address = ?5,
                 notes = ?6, reward = ?7, photo_url = ?8
             WHERE id = ?1",
            params![
                pet.id.to_string(),
                pet.pet_name,
                pet.owner_name,
                pet.phone,
                pet.address,
                pet.notes,
                pet.reward,
                pet.photo_url,
            ],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Delete a pet by display identifier. Returns `true` if a row was
    /// deleted. Location reports go with it.
    pub fn delete_pet_by_qr_id(&self, qr_id: &QrId) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM pets WHERE qr_id = ?1", params![qr_id.as_str()])?;
        Ok(affected > 0)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a `rusqlite::Row` to a validated [`PetRecord`].
fn row_to_pet(row: &rusqlite::Row<'_>) -> rusqlite::Result<PetRecord> {
    let id_str: String = row.get(0)?;
    let qr_id_str: String = row.get(1)?;
    let created_str: String = row.get(9)?;

    let pet = PetRecord {
        id: PetId(parse_uuid(0, &id_str)?),
        qr_id: QrId::parse(&qr_id_str).map_err(|e| conversion_error(1, e))?,
        pet_name: row.get(2)?,
        owner_name: row.get(3)?,
        phone: row.get(4)?,
        address: row.get(5)?,
        notes: row.get(6)?,
        reward: row.get(7)?,
        photo_url: row.get(8)?,
        created_at: parse_timestamp(9, &created_str)?,
    };

    pet.validate().map_err(|e| conversion_error(0, e))?;
    Ok(pet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pawtag_shared::PetDraft;

    fn draft(name: &str) -> PetDraft {
        PetDraft {
            pet_name: name.into(),
            owner_name: "João".into(),
            phone: "(11) 99999-9999".into(),
            reward: 50.0,
            ..Default::default()
        }
    }

    #[test]
    fn insert_and_fetch_by_qr_id() {
        let db = Database::open_in_memory().unwrap();
        let pet = draft("Rex").into_record().unwrap();
        db.insert_pet(&pet).unwrap();

        let loaded = db.get_pet_by_qr_id(&pet.qr_id).unwrap();
        assert_eq!(loaded.pet_name, "Rex");
        assert_eq!(loaded.qr_id, pet.qr_id);
        assert_eq!(loaded.phone_digits(), "11999999999");
        assert_eq!(loaded.reward, 50.0);
        assert_eq!(db.get_pet(pet.id).unwrap().qr_id, pet.qr_id);
    }

    #[test]
    fn unknown_qr_id_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let missing = QrId::generate();
        assert!(matches!(
            db.get_pet_by_qr_id(&missing),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn list_newest_first() {
        let db = Database::open_in_memory().unwrap();
        let mut older = draft("Older").into_record().unwrap();
        older.created_at -= chrono::Duration::minutes(5);
        let newer = draft("Newer").into_record().unwrap();

        db.insert_pet(&older).unwrap();
        db.insert_pet(&newer).unwrap();

        let names: Vec<_> = db
            .list_pets()
            .unwrap()
            .into_iter()
            .map(|p| p.pet_name)
            .collect();
        assert_eq!(names, vec!["Newer", "Older"]);
    }

    #[test]
    fn update_keeps_qr_id() {
        let db = Database::open_in_memory().unwrap();
        let mut pet = draft("Rex").into_record().unwrap();
        db.insert_pet(&pet).unwrap();

        let mut update = draft("Rex");
        update.notes = Some("Allergic to chicken".into());
        update.reward = 0.0;
        pet.apply(update).unwrap();
        db.update_pet(&pet).unwrap();

        let loaded = db.get_pet_by_qr_id(&pet.qr_id).unwrap();
        assert_eq!(loaded.notes.as_deref(), Some("Allergic to chicken"));
        assert_eq!(loaded.reward, 0.0);
    }

    #[test]
    fn update_missing_pet_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let pet = draft("Ghost").into_record().unwrap();
        assert!(matches!(db.update_pet(&pet), Err(StoreError::NotFound)));
    }

    #[test]
    fn delete_by_qr_id() {
        let db = Database::open_in_memory().unwrap();
        let pet = draft("Rex").into_record().unwrap();
        db.insert_pet(&pet).unwrap();

        assert!(db.delete_pet_by_qr_id(&pet.qr_id).unwrap());
        assert!(!db.delete_pet_by_qr_id(&pet.qr_id).unwrap());
        assert!(db.list_pets().unwrap().is_empty());
    }

    #[test]
    fn duplicate_qr_id_conflicts() {
        let db = Database::open_in_memory().unwrap();
        let pet = draft("Rex").into_record().unwrap();
        db.insert_pet(&pet).unwrap();

        let mut twin = draft("Twin").into_record().unwrap();
        twin.qr_id = pet.qr_id.clone();
        assert!(matches!(db.insert_pet(&twin), Err(StoreError::Conflict(_))));
    }

    #[test]
    fn invalid_record_is_not_written() {
        let db = Database::open_in_memory().unwrap();
        let mut pet = draft("Rex").into_record().unwrap();
        pet.reward = -5.0;
        assert!(matches!(db.insert_pet(&pet), Err(StoreError::Invalid(_))));
    }

    #[test]
    fn malformed_row_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        db.conn()
            .execute(
                "INSERT INTO pets (id, qr_id, pet_name, owner_name, phone, reward, created_at)
                 VALUES ('not-a-uuid', 'abc', 'Rex', 'João', '1', 0, '2024-01-01T00:00:00Z')",
                [],
            )
            .unwrap();
        assert!(db.list_pets().is_err());

        db.conn().execute("DELETE FROM pets", []).unwrap();
        db.conn()
            .execute(
                "INSERT INTO pets (id, qr_id, pet_name, owner_name, phone, reward, created_at)
                 VALUES ('2a3c1f4e-8a9b-4c2d-9e1f-0a1b2c3d4e5f', 'abc', 'Rex', 'João', '1', -3, '2024-01-01T00:00:00Z')",
                [],
            )
            .unwrap();
        assert!(db.get_pet_by_qr_id(&QrId::parse("abc").unwrap()).is_err());
    }
}
