use spark_core::model::{ModuleId, ProgressMap, ProgressRecord};
use spark_core::time::fixed_now;
use storage::keys::{PROGRESS_KEY, QUEUE_KEY};
use storage::records::{decode_progress_map, encode_progress_map};
use storage::sqlite::SqliteKeyValueStore;
use storage::{KeyValueStore, Storage, StorageError};

#[tokio::test]
async fn sqlite_get_set_remove() {
    let store = SqliteKeyValueStore::connect("sqlite:file:memdb_kv_basic?mode=memory&cache=shared")
        .await
        .expect("connect");
    store.migrate().await.expect("migrate");

    assert_eq!(store.get(QUEUE_KEY).await.unwrap(), None);

    store.set(QUEUE_KEY, "[]").await.unwrap();
    store.set(QUEUE_KEY, r#"[{"topicId":"a"}]"#).await.unwrap();
    assert_eq!(
        store.get(QUEUE_KEY).await.unwrap().as_deref(),
        Some(r#"[{"topicId":"a"}]"#)
    );

    store.remove(QUEUE_KEY).await.unwrap();
    store.remove(QUEUE_KEY).await.unwrap();
    assert_eq!(store.get(QUEUE_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn sqlite_migrations_are_idempotent() {
    let store =
        SqliteKeyValueStore::connect("sqlite:file:memdb_kv_migrate?mode=memory&cache=shared")
            .await
            .expect("connect");
    store.migrate().await.expect("first migrate");
    store.set("k", "v").await.unwrap();
    store.migrate().await.expect("second migrate");
    assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
}

#[tokio::test]
async fn sqlite_storage_holds_progress_blob() {
    let storage = Storage::sqlite("sqlite:file:memdb_kv_progress?mode=memory&cache=shared")
        .await
        .expect("storage");

    let mut map = ProgressMap::new();
    map.upsert(
        ModuleId::try_new("m1").unwrap(),
        ProgressRecord::new(6, 12, false, fixed_now()).unwrap(),
    );
    storage
        .kv
        .set(PROGRESS_KEY, &encode_progress_map(&map).unwrap())
        .await
        .unwrap();

    let raw = storage.kv.get(PROGRESS_KEY).await.unwrap().expect("blob");
    let decoded = decode_progress_map(&raw).unwrap();
    assert!(decoded.rejected.is_empty());
    assert_eq!(decoded.value, map);
}

#[tokio::test]
async fn sqlite_unreadable_row_is_a_backend_error() {
    let store = SqliteKeyValueStore::connect("sqlite:file:memdb_kv_blob?mode=memory&cache=shared")
        .await
        .expect("connect");
    store.migrate().await.expect("migrate");

    sqlx::query("INSERT INTO kv_entries (key, value, updated_at) VALUES (?1, x'FF', '2024-01-01')")
        .bind(PROGRESS_KEY)
        .execute(store.pool())
        .await
        .expect("insert");

    assert!(matches!(
        store.get(PROGRESS_KEY).await,
        Err(StorageError::Connection(_))
    ));
}
