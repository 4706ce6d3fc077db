//! User profile rows: email plus the admin flag.

use chrono::SecondsFormat;
use rusqlite::params;

use pawtag_shared::{UserId, UserProfile};

use crate::database::{parse_timestamp, parse_uuid, Database};
use crate::error::{Result, StoreError};

impl Database {
    /// Insert a new profile. Emails are unique.
    pub fn insert_profile(&self, profile: &UserProfile) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO profiles (id, email, is_admin, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![
                    profile.id.to_string(),
                    profile.email,
                    profile.is_admin,
                    profile
                        .created_at
                        .to_rfc3339_opts(SecondsFormat::Micros, true),
                ],
            )
            .map_err(|e| StoreError::from_write(e, "email"))?;
        Ok(())
    }

    pub fn get_profile(&self, id: UserId) -> Result<UserProfile> {
        self.conn()
            .query_row(
                "SELECT id, email, is_admin, created_at FROM profiles WHERE id = ?1",
                params![id.to_string()],
                row_to_profile,
            )
            .map_err(StoreError::from_query)
    }

    /// Lookup by (already normalized) email.
    pub fn get_profile_by_email(&self, email: &str) -> Result<UserProfile> {
        self.conn()
            .query_row(
                "SELECT id, email, is_admin, created_at FROM profiles WHERE email = ?1",
                params![email],
                row_to_profile,
            )
            .map_err(StoreError::from_query)
    }

    /// All profiles, newest first.
    pub fn list_profiles(&self) -> Result<Vec<UserProfile>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, email, is_admin, created_at FROM profiles
             ORDER BY created_at DESC, rowid DESC",
        )?;
        let rows = stmt.query_map([], row_to_profile)?;

        let mut profiles = Vec::new();
        for row in rows {
            profiles.push(row?);
        }
        Ok(profiles)
    }

    /// Set the admin flag and return the profile as now stored.
    pub fn set_admin(&self, id: UserId, is_admin: bool) -> Result<UserProfile> {
        let affected = self.conn().execute(
            "UPDATE profiles SET is_admin = ?2 WHERE id = ?1",
            params![id.to_string(), is_admin],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        self.get_profile(id)
    }

    /// Flip the admin flag in a single statement and return the profile as
    /// now stored.
    pub fn toggle_admin(&self, id: UserId) -> Result<UserProfile> {
        let affected = self.conn().execute(
            "UPDATE profiles SET is_admin = 1 - is_admin WHERE id = ?1",
            params![id.to_string()],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        self.get_profile(id)
    }
}

fn row_to_profile(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserProfile> {
    let id_str: String = row.get(0)?;
    let created_str: String = row.get(3)?;

    Ok(UserProfile {
        id: UserId(parse_uuid(0, &id_str)?),
        email: row.get(1)?,
        is_admin: row.get(2)?,
        created_at: parse_timestamp(3, &created_str)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_lookup() {
        let db = Database::open_in_memory().unwrap();
        let profile = UserProfile::new("Ana@Example.com").unwrap();
        db.insert_profile(&profile).unwrap();

        let by_id = db.get_profile(profile.id).unwrap();
        assert_eq!(by_id.email, "ana@example.com");
        assert!(!by_id.is_admin);

        let by_email = db.get_profile_by_email("ana@example.com").unwrap();
        assert_eq!(by_email.id, profile.id);
    }

    #[test]
    fn duplicate_email_conflicts() {
        let db = Database::open_in_memory().unwrap();
        db.insert_profile(&UserProfile::new("ana@example.com").unwrap())
            .unwrap();
        let again = UserProfile::new("ana@example.com").unwrap();
        assert!(matches!(
            db.insert_profile(&again),
            Err(StoreError::Conflict(_))
        ));
    }

    #[test]
    fn toggle_flips_and_reports_stored_value() {
        let db = Database::open_in_memory().unwrap();
        let profile = UserProfile::new("ana@example.com").unwrap();
        db.insert_profile(&profile).unwrap();

        assert!(db.toggle_admin(profile.id).unwrap().is_admin);
        assert!(!db.toggle_admin(profile.id).unwrap().is_admin);
        assert!(db.set_admin(profile.id, true).unwrap().is_admin);
        assert!(db.get_profile(profile.id).unwrap().is_admin);
    }

    #[test]
    fn toggle_unknown_user_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(
            db.toggle_admin(UserId::new()),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn list_newest_first() {
        let db = Database::open_in_memory().unwrap();
        let mut first = UserProfile::new("first@example.com").unwrap();
        first.created_at -= chrono::Duration::hours(1);
        let second = UserProfile::new("second@example.com").unwrap();
        db.insert_profile(&first).unwrap();
        db.insert_profile(&second).unwrap();

        let emails: Vec<_> = db
            .list_profiles()
            .unwrap()
            .into_iter()
            .map(|p| p.email)
            .collect();
        assert_eq!(emails, vec!["second@example.com", "first@example.com"]);
    }
}
