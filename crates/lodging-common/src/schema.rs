//! Accommodations table layout
//!
//! The importer creates the table, the server only reads it. Both sides take the table name
//! from here so they cannot drift apart.

/// Table holding one row per registered accommodation
pub const ACCOMMODATIONS_TABLE: &str = "accommodations";

/// DDL run before an import. Every statement is idempotent.
pub const SCHEMA_STATEMENTS: [&str; 6] = [
    r#"
    CREATE TABLE IF NOT EXISTS accommodations (
        id SERIAL PRIMARY KEY,
        object_id INTEGER,
        external_id INTEGER UNIQUE,
        name TEXT,
        registered_at TIMESTAMP,
        opened_at TIMESTAMP,
        category TEXT,
        capacity INTEGER,
        owner_email TEXT,
        address TEXT,
        postal_code TEXT,
        locality TEXT,
        latitude DOUBLE PRECISION,
        longitude DOUBLE PRECISION,
        geo_reliability TEXT,
        parish TEXT,
        municipality TEXT,
        district TEXT,
        nuts_iii TEXT,
        nuts_ii TEXT,
        tourism_region TEXT,
        clean_safe_seal TEXT,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_accommodations_external_id ON accommodations (external_id)",
    "CREATE INDEX IF NOT EXISTS idx_accommodations_municipality ON accommodations (municipality)",
    "CREATE INDEX IF NOT EXISTS idx_accommodations_district ON accommodations (district)",
    "CREATE INDEX IF NOT EXISTS idx_accommodations_category ON accommodations (category)",
    "CREATE INDEX IF NOT EXISTS idx_accommodations_location \
     ON accommodations (latitude, longitude)",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_statement_targets_the_table() {
        for statement in SCHEMA_STATEMENTS {
            assert!(statement.contains(ACCOMMODATIONS_TABLE), "{}", statement);
            assert!(statement.contains("IF NOT EXISTS"), "{}", statement);
        }
    }

    #[test]
    fn test_external_id_is_unique() {
        assert!(SCHEMA_STATEMENTS[0].contains("external_id INTEGER UNIQUE"));
    }
}
