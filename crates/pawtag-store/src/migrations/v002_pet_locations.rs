use rusqlite::Connection;

const UP_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS pet_locations (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    pet_id     TEXT NOT NULL,                 -- FK -> pets(id)
    latitude   REAL,
    longitude  REAL,
    city       TEXT,
    country    TEXT,
    timestamp  TEXT NOT NULL,                 -- RFC-3339

    FOREIGN KEY (pet_id) REFERENCES pets(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_pet_locations_pet ON pet_locations(pet_id, id);
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
