use people_core::db::migrations::latest_version;
use people_core::db::{open_db, open_db_in_memory, DbError};
use people_core::{connect, ConfigError, NewPerson, PersonStore, StoreConfig};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "people");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("people.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "people");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn file_backed_store_persists_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let uri = format!("sqlite://{}", dir.path().join("people.db").display());
    let config = StoreConfig::default().with_uri(uri);

    let created = {
        let conn = connect(&config).await.unwrap();
        PersonStore::connect_to(&conn, &config.collection)
            .create_one(NewPerson::new("John").with_favorite_foods(["pizza"]))
            .await
            .unwrap()
    };

    let conn = connect(&config).await.unwrap();
    let store = PersonStore::connect_to(&conn, &config.collection);
    let loaded = store
        .find_by_id(&created.id.to_hex())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded, created);
}

#[tokio::test]
async fn connect_without_uri_reports_missing_uri() {
    let err = connect(&StoreConfig::default()).await.unwrap_err();
    assert!(matches!(err, DbError::Config(ConfigError::MissingUri)));
}

#[tokio::test]
async fn connect_with_unknown_scheme_is_rejected() {
    let config = StoreConfig::default().with_uri("redis://localhost:6379");
    let err = connect(&config).await.unwrap_err();
    assert!(matches!(
        err,
        DbError::Config(ConfigError::UnsupportedScheme(_))
    ));
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1);",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "expected table `{table_name}` to exist");
}
