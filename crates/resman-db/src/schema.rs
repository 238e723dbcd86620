//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs and calendar dates are stored as strings. Enums are stored as
//! strings with ASSERT constraints for validation.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1: initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Employees
-- =======================================================================
DEFINE TABLE employee SCHEMAFULL;
DEFINE FIELD employee_name ON TABLE employee TYPE string;
DEFINE FIELD department ON TABLE employee TYPE option<string>;
DEFINE FIELD designation ON TABLE employee TYPE option<string>;
DEFINE FIELD status ON TABLE employee TYPE string \
    ASSERT $value IN ['Active', 'Inactive', 'Left'];
DEFINE FIELD hourly_cost_rate ON TABLE employee TYPE float DEFAULT 0.0;
DEFINE FIELD created_at ON TABLE employee TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE employee TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_employee_status ON TABLE employee COLUMNS status;

-- =======================================================================
-- Allocation requests
-- =======================================================================
DEFINE TABLE allocation_request SCHEMAFULL;
DEFINE FIELD status ON TABLE allocation_request TYPE string \
    ASSERT $value IN ['Draft', 'Requested', 'Approved', 'Rejected'];
DEFINE FIELD project ON TABLE allocation_request TYPE option<string>;
DEFINE FIELD requested_employee ON TABLE allocation_request \
    TYPE option<string>;
DEFINE FIELD start_date ON TABLE allocation_request TYPE option<string>;
DEFINE FIELD end_date ON TABLE allocation_request TYPE option<string>;
DEFINE FIELD allocation_percentage ON TABLE allocation_request \
    TYPE option<int> ASSERT $value = NONE OR ($value >= 0 AND $value <= 100);
DEFINE FIELD requested_by ON TABLE allocation_request TYPE string;
DEFINE FIELD request_date ON TABLE allocation_request \
    TYPE option<datetime>;
DEFINE FIELD notes ON TABLE allocation_request TYPE string DEFAULT '';
DEFINE FIELD rejection_reason ON TABLE allocation_request \
    TYPE option<string>;
DEFINE FIELD candidates_json ON TABLE allocation_request TYPE string \
    DEFAULT '[]';
DEFINE FIELD created_at ON TABLE allocation_request TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE allocation_request TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_allocation_requested_by ON TABLE allocation_request \
    COLUMNS requested_by;

-- =======================================================================
-- Project assignments (dates are ISO-8601 strings, so they compare in
-- calendar order)
-- =======================================================================
DEFINE TABLE project_assignment SCHEMAFULL;
DEFINE FIELD project ON TABLE project_assignment TYPE string;
DEFINE FIELD employee ON TABLE project_assignment TYPE string;
DEFINE FIELD start_date ON TABLE project_assignment TYPE string;
DEFINE FIELD end_date ON TABLE project_assignment TYPE string;
DEFINE FIELD allocation_percentage ON TABLE project_assignment TYPE int \
    ASSERT $value >= 0 AND $value <= 100;
DEFINE FIELD status ON TABLE project_assignment TYPE string \
    ASSERT $value IN ['Planned', 'Active', 'Completed'];
DEFINE FIELD allocation_reference ON TABLE project_assignment \
    TYPE option<string>;
DEFINE FIELD estimated_total_cost ON TABLE project_assignment TYPE float \
    DEFAULT 0.0;
DEFINE FIELD supersedes ON TABLE project_assignment TYPE option<string>;
DEFINE FIELD superseded_by ON TABLE project_assignment \
    TYPE option<string>;
DEFINE FIELD created_at ON TABLE project_assignment TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE project_assignment TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_assignment_employee ON TABLE project_assignment \
    COLUMNS employee, status;
DEFINE INDEX idx_assignment_reference ON TABLE project_assignment \
    COLUMNS allocation_reference;

-- =======================================================================
-- Change notes (append-only)
-- =======================================================================
DEFINE TABLE change_note SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update NONE
        FOR delete NONE;
DEFINE FIELD assignment_id ON TABLE change_note TYPE string;
DEFINE FIELD kind ON TABLE change_note TYPE string \
    ASSERT $value IN ['EndDate', 'AllocationPercentage'];
DEFINE FIELD author ON TABLE change_note TYPE string;
DEFINE FIELD content ON TABLE change_note TYPE string;
DEFINE FIELD reason ON TABLE change_note TYPE string;
DEFINE FIELD created_at ON TABLE change_note TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_change_note_assignment ON TABLE change_note \
    COLUMNS assignment_id, created_at;

-- =======================================================================
-- Notifications (append-only delivery log)
-- =======================================================================
DEFINE TABLE notification SCHEMAFULL;
DEFINE FIELD recipient ON TABLE notification TYPE string;
DEFINE FIELD recipient_user ON TABLE notification TYPE option<string>;
DEFINE FIELD kind ON TABLE notification TYPE string \
    ASSERT $value IN ['Alert', 'Success', 'Error'];
DEFINE FIELD subject ON TABLE notification TYPE string;
DEFINE FIELD body ON TABLE notification TYPE string;
DEFINE FIELD allocation_request ON TABLE notification TYPE string;
DEFINE FIELD created_at ON TABLE notification TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_notification_request ON TABLE notification \
    COLUMNS allocation_request;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
/// All DEFINE statements are idempotent so re-running is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that
/// bypass the migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_v1_is_nonempty() {
        assert!(!SCHEMA_V1.is_empty());
    }

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "Migrations must be in ascending version order"
            );
        }
    }
}
