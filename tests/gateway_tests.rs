/// Record store gateway tests
///
/// Insert / get / list / delete behavior of the memo store.
/// Run with: cargo test --test gateway_tests

use memocards::storage::{MemoryBackend, StorageBackend};
use memocards::{MemoError, NewRecord, RecordId, RecordStoreGateway, StoreConfig};
use std::sync::Arc;

fn candidate(title: &str, body: &str) -> NewRecord {
    NewRecord::new(title, body, "2024/1/5 9:00:00")
}

async fn open_gateway() -> RecordStoreGateway {
    let gateway = RecordStoreGateway::new(StoreConfig::new());
    gateway.open().await.unwrap();
    gateway
}

async fn listed_ids(gateway: &RecordStoreGateway) -> Vec<RecordId> {
    let mut cursor = gateway.list_all_ascending().await.unwrap();
    let mut ids = Vec::new();
    while let Some(record) = cursor.next().await.unwrap() {
        ids.push(record.id);
    }
    ids
}

#[tokio::test]
async fn test_insert_then_get_round_trip() {
    let gateway = open_gateway().await;
    let id = gateway.insert(&candidate("Groceries", "Milk, eggs")).await.unwrap();

    let record = gateway.get_by_identity(id).await.unwrap().unwrap();
    assert_eq!(record.id, id);
    assert_eq!(record.title, "Groceries");
    assert_eq!(record.body, "Milk, eggs");
    assert_eq!(record.write_date, "2024/1/5 9:00:00");
}

#[tokio::test]
async fn test_identities_strictly_increase_across_deletes() {
    let gateway = open_gateway().await;
    let first = gateway.insert(&candidate("a", "1")).await.unwrap();
    let second = gateway.insert(&candidate("b", "2")).await.unwrap();
    gateway.delete_by_identity(second).await.unwrap();
    gateway.delete_by_identity(first).await.unwrap();
    let third = gateway.insert(&candidate("c", "3")).await.unwrap();

    assert_eq!(first, RecordId(1));
    assert_eq!(second, RecordId(2));
    assert_eq!(third, RecordId(3));
}

#[tokio::test]
async fn test_list_all_ascending() {
    let gateway = open_gateway().await;
    for title in ["a", "b", "c"] {
        gateway.insert(&candidate(title, "x")).await.unwrap();
    }
    assert_eq!(
        listed_ids(&gateway).await,
        vec![RecordId(1), RecordId(2), RecordId(3)]
    );
}

#[tokio::test]
async fn test_list_empty_store() {
    let gateway = open_gateway().await;
    let mut cursor = gateway.list_all_ascending().await.unwrap();
    assert!(cursor.next().await.unwrap().is_none());
    assert!(cursor.next().await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_missing_identity_succeeds() {
    let gateway = open_gateway().await;
    gateway.insert(&candidate("a", "1")).await.unwrap();

    gateway.delete_by_identity(RecordId(42)).await.unwrap();
    assert_eq!(gateway.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_get_after_delete_is_not_found() {
    let gateway = open_gateway().await;
    let id = gateway.insert(&candidate("a", "1")).await.unwrap();
    gateway.delete_by_identity(id).await.unwrap();

    assert!(gateway.get_by_identity(id).await.unwrap().is_none());
    assert!(listed_ids(&gateway).await.is_empty());
}

#[tokio::test]
async fn test_aborted_insert_leaves_store_unchanged() {
    let gateway = RecordStoreGateway::new(StoreConfig::new().record_quota(2));
    gateway.open().await.unwrap();
    gateway.insert(&candidate("a", "1")).await.unwrap();
    gateway.insert(&candidate("b", "2")).await.unwrap();

    let err = gateway.insert(&candidate("c", "3")).await.unwrap_err();
    assert!(matches!(err, MemoError::Write(_)));
    assert!(!err.is_fatal());
    assert_eq!(listed_ids(&gateway).await, vec![RecordId(1), RecordId(2)]);

    // The aborted insert did not consume an identity.
    gateway.delete_by_identity(RecordId(1)).await.unwrap();
    assert_eq!(gateway.insert(&candidate("d", "4")).await.unwrap(), RecordId(3));
}

#[tokio::test]
async fn test_concurrent_inserts_get_distinct_identities() {
    let gateway = Arc::new(open_gateway().await);

    let mut handles = vec![];
    for task_id in 0..8 {
        let gateway = Arc::clone(&gateway);
        handles.push(tokio::spawn(async move {
            gateway
                .insert(&candidate(&format!("task {}", task_id), "x"))
                .await
                .unwrap()
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 8);
    assert_eq!(gateway.count().await.unwrap(), 8);
    assert_eq!(listed_ids(&gateway).await, ids);
}

#[tokio::test]
async fn test_concurrent_open_shares_connection() {
    let gateway = Arc::new(RecordStoreGateway::new(StoreConfig::new()));
    let (a, b) = tokio::join!(gateway.open(), gateway.open());
    assert_eq!(a.unwrap(), b.unwrap());

    gateway.insert(&candidate("a", "1")).await.unwrap();
    assert_eq!(gateway.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_two_gateways_share_identities() {
    let backend: Arc<dyn StorageBackend> = Arc::new(MemoryBackend::new());
    let a = RecordStoreGateway::with_backend(StoreConfig::new(), Arc::clone(&backend));
    let b = RecordStoreGateway::with_backend(StoreConfig::new(), Arc::clone(&backend));
    a.open().await.unwrap();
    b.open().await.unwrap();

    let from_a = a.insert(&candidate("from a", "1")).await.unwrap();
    let from_b = b.insert(&candidate("from b", "2")).await.unwrap();
    assert_eq!(from_a, RecordId(1));
    assert_eq!(from_b, RecordId(2));

    // Each gateway sees the other's write.
    assert_eq!(a.get_by_identity(from_b).await.unwrap().unwrap().title, "from b");
    assert_eq!(b.get_by_identity(from_a).await.unwrap().unwrap().title, "from a");

    let fresh = RecordStoreGateway::with_backend(StoreConfig::new(), backend);
    fresh.open().await.unwrap();
    assert_eq!(fresh.count().await.unwrap(), 2);
    assert_eq!(listed_ids(&fresh).await, vec![from_a, from_b]);
}

#[tokio::test]
async fn test_two_gateways_concurrent_inserts() {
    let backend: Arc<dyn StorageBackend> = Arc::new(MemoryBackend::new());
    let a = Arc::new(RecordStoreGateway::with_backend(StoreConfig::new(), Arc::clone(&backend)));
    let b = Arc::new(RecordStoreGateway::with_backend(StoreConfig::new(), Arc::clone(&backend)));
    let (opened_a, opened_b) = tokio::join!(a.open(), b.open());
    opened_a.unwrap();
    opened_b.unwrap();

    let mut handles = vec![];
    for task_id in 0..8 {
        let gateway = if task_id % 2 == 0 { Arc::clone(&a) } else { Arc::clone(&b) };
        handles.push(tokio::spawn(async move {
            gateway
                .insert(&candidate(&format!("task {}", task_id), "x"))
                .await
                .unwrap()
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 8);
    assert_eq!(a.count().await.unwrap(), 8);
    assert_eq!(listed_ids(&b).await, ids);
}

#[tokio::test]
async fn test_delete_through_one_gateway_seen_by_other() {
    let backend: Arc<dyn StorageBackend> = Arc::new(MemoryBackend::new());
    let a = RecordStoreGateway::with_backend(StoreConfig::new(), Arc::clone(&backend));
    let b = RecordStoreGateway::with_backend(StoreConfig::new(), backend);
    a.open().await.unwrap();
    b.open().await.unwrap();

    let id = a.insert(&candidate("a", "1")).await.unwrap();
    b.delete_by_identity(id).await.unwrap();
    assert!(a.get_by_identity(id).await.unwrap().is_none());
    assert_eq!(b.insert(&candidate("b", "2")).await.unwrap(), RecordId(2));
}
