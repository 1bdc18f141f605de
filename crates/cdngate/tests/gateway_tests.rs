use std::sync::Arc;

use cdngate::{Gateway, GatewayError, DELETE_CONFIRMATION};
use cdngate_store::{InMemoryStore, StoreCall, StoreOp};

async fn setup() -> (Arc<InMemoryStore>, Gateway) {
    let store = Arc::new(InMemoryStore::new());
    let mut gateway = Gateway::new(store.clone());
    gateway.set_container("assets").await.unwrap();
    store.clear_calls().await;
    (store, gateway)
}

#[tokio::test]
async fn test_save_logo_infers_png_and_sets_uri() {
    let (store, gateway) = setup().await;

    let mut blob = gateway.blob("logo.png");
    blob.set_contents(&b"\x89PNG\r\n"[..]).await.unwrap();
    blob.save().await.unwrap();

    let (_, content_type) = store.object("assets", "logo.png").await.unwrap();
    assert_eq!(content_type.as_deref(), Some("image/png"));

    let uri = blob.uri().await.unwrap().unwrap();
    assert!(uri.ends_with("/logo.png"));
    assert_eq!(uri, "http://cdn.local/assets/logo.png");
    assert_eq!(
        blob.secure_uri().await.unwrap(),
        Some("https://cdn.local/assets/logo.png")
    );
}

#[tokio::test]
async fn test_save_without_extension_never_creates_or_writes() {
    let (store, gateway) = setup().await;

    let mut blob = gateway.blob("readme");
    blob.set_contents("hello").await.unwrap();

    assert!(matches!(
        blob.save().await,
        Err(GatewayError::UnrecognizedBlobName(_))
    ));
    assert_eq!(store.count(StoreOp::CreateObject).await, 0);
    assert_eq!(store.count(StoreOp::WriteObject).await, 0);
}

#[tokio::test]
async fn test_two_fetches_observe_the_same_state() {
    let (store, gateway) = setup().await;
    store
        .insert_object("assets", "site.css", "body{}", Some("text/css"))
        .await;

    let mut blob = gateway.blob("site.css");
    blob.fetch(false).await.unwrap();
    let first = (
        blob.contents().await.unwrap().cloned(),
        blob.content_type().await.unwrap().map(str::to_string),
        blob.is_exists().await.unwrap(),
        blob.uri().await.unwrap().map(str::to_string),
    );
    blob.fetch(false).await.unwrap();
    let second = (
        blob.contents().await.unwrap().cloned(),
        blob.content_type().await.unwrap().map(str::to_string),
        blob.is_exists().await.unwrap(),
        blob.uri().await.unwrap().map(str::to_string),
    );

    assert_eq!(first, second);
    assert_eq!(store.count(StoreOp::GetObject).await, 1);
}

#[tokio::test]
async fn test_round_trip_through_a_second_handle() {
    let (_store, gateway) = setup().await;

    let mut writer = gateway.blob("app.js");
    writer.set_contents("run();").await.unwrap();
    writer.save().await.unwrap();

    let mut reader = gateway.blob("app.js");
    assert!(reader.is_exists().await.unwrap());
    assert_eq!(&reader.contents().await.unwrap().unwrap()[..], b"run();");
    assert_eq!(
        reader.content_type().await.unwrap(),
        Some("application/javascript")
    );
}

#[tokio::test]
async fn test_delete_absent_blob_issues_no_remote_delete() {
    let (store, gateway) = setup().await;

    let mut blob = gateway.blob("ghost.jpg");
    assert!(!blob.is_exists().await.unwrap());
    assert!(!blob.delete().await.unwrap());
    assert_eq!(store.count(StoreOp::DeleteObject).await, 0);
}

#[tokio::test]
async fn test_wrong_confirmation_leaves_everything_in_place() {
    let (store, mut gateway) = setup().await;
    store.insert_object("assets", "a.png", "a", None).await;

    assert!(matches!(
        gateway.delete("wrong phrase").await,
        Err(GatewayError::ConfirmationRequired)
    ));
    assert!(store.calls().await.is_empty());
    assert!(store.object("assets", "a.png").await.is_some());
    assert!(gateway.info().await.is_ok());
}

#[tokio::test]
async fn test_confirmed_delete_removes_blobs_then_container() {
    let (store, mut gateway) = setup().await;
    store.insert_object("assets", "a.png", "a", None).await;
    store.insert_object("assets", "b.js", "b", None).await;

    let deleted = gateway.delete(DELETE_CONFIRMATION).await.unwrap();
    assert_eq!(deleted, 2);

    let deletes: Vec<StoreCall> = store
        .calls()
        .await
        .into_iter()
        .filter(|c| matches!(c.op(), StoreOp::DeleteObject | StoreOp::DeleteContainer))
        .collect();
    assert_eq!(
        deletes,
        vec![
            StoreCall::DeleteObject {
                container: "assets".to_string(),
                name: "a.png".to_string(),
            },
            StoreCall::DeleteObject {
                container: "assets".to_string(),
                name: "b.js".to_string(),
            },
            StoreCall::DeleteContainer("assets".to_string()),
        ]
    );

    assert!(!store.has_container("assets").await);
    assert!(gateway.container().is_none());
    assert!(matches!(
        gateway.info().await,
        Err(GatewayError::NoContainerBound)
    ));
}

#[tokio::test]
async fn test_info_reports_bound_container() {
    let (store, gateway) = setup().await;
    store.insert_object("assets", "a.css", "12345", None).await;

    let info = gateway.info().await.unwrap();
    assert_eq!(info.total_containers, 1);
    assert_eq!(info.total_bytes, 5);
    assert_eq!(info.container.name, "assets");
    assert!(info.container.public);
    assert_eq!(info.container.ttl, Some(cdngate::DEFAULT_TTL));
}
