//! v001 -- Initial schema creation.
//!
//! Creates the three core tables: `profiles`, `sessions` and `pets`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Profiles (one per auth identity)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS profiles (
    id         TEXT PRIMARY KEY NOT NULL,     -- UUID v4, same as the auth identity
    email      TEXT NOT NULL UNIQUE,
    is_admin   INTEGER NOT NULL DEFAULT 0,    -- boolean 0/1
    created_at TEXT NOT NULL                  -- RFC-3339
);

-- ----------------------------------------------------------------
-- Sessions (opaque bearer tokens)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS sessions (
    token      TEXT PRIMARY KEY NOT NULL,
    user_id    TEXT NOT NULL,                 -- FK -> profiles(id)
    created_at TEXT NOT NULL,

    FOREIGN KEY (user_id) REFERENCES profiles(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);

-- ----------------------------------------------------------------
-- Pets
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS pets (
    id         TEXT PRIMARY KEY NOT NULL,     -- UUID v4, internal
    qr_id      TEXT NOT NULL UNIQUE,          -- display identifier, public
    pet_name   TEXT NOT NULL,
    owner_name TEXT NOT NULL,
    phone      TEXT NOT NULL,
    address    TEXT,
    notes      TEXT,
    reward     REAL NOT NULL DEFAULT 0,
    photo_url  TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_pets_created ON pets(created_at DESC);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
