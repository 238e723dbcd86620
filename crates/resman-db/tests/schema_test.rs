//! Integration tests for schema initialization using in-memory SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

#[tokio::test]
async fn schema_migration_applies_successfully() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    resman_db::run_migrations(&db).await.unwrap();

    let mut result = db.query("INFO FOR DB").await.unwrap();
    let info: Option<surrealdb_types::Value> = result.take(0).unwrap();
    let info = info.expect("INFO FOR DB should return a value");
    let info_str = format!("{:?}", info);

    for table in [
        "employee",
        "allocation_request",
        "project_assignment",
        "change_note",
        "notification",
        "_migration",
    ] {
        assert!(info_str.contains(table), "missing {table} table");
    }
}

#[tokio::test]
async fn migration_is_idempotent() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    resman_db::run_migrations(&db).await.unwrap();
    resman_db::run_migrations(&db).await.unwrap();

    let mut result = db.query("SELECT * FROM _migration").await.unwrap();
    let records: Vec<surrealdb_types::Value> = result.take(0).unwrap();
    assert_eq!(records.len(), 1, "expected exactly one migration record");
}

#[tokio::test]
async fn unknown_allocation_status_is_rejected() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    resman_db::run_migrations(&db).await.unwrap();

    let result = db
        .query(
            "CREATE allocation_request SET \
             status = 'Cancelled', \
             requested_by = 'alice'",
        )
        .await
        .unwrap()
        .check();

    assert!(result.is_err(), "status outside the workflow should be rejected");
}

#[tokio::test]
async fn percentage_above_one_hundred_is_rejected() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    resman_db::run_migrations(&db).await.unwrap();

    let result = db
        .query(
            "CREATE project_assignment SET \
             project = 'PROJ-0001', \
             employee = 'EMP-0001', \
             start_date = '2024-01-01', \
             end_date = '2024-01-31', \
             allocation_percentage = 120, \
             status = 'Active'",
        )
        .await
        .unwrap()
        .check();

    assert!(result.is_err(), "over 100% should be rejected");
}
