use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use inkwell_core::domain::{ImageUpload, PostFields};
use inkwell_core::ports::{ObjectStorage, StorageError};
use inkwell_core::{DomainError, StoreSettings};
use inkwell_infra::{
    ContentServices, InMemoryObjectStorage, InMemoryPostRepository, InMemoryProfileRepository,
};

fn services() -> ContentServices {
    ContentServices::in_memory(StoreSettings::default())
}

fn services_with_storage(storage: Arc<dyn ObjectStorage>) -> ContentServices {
    ContentServices::with_backends(
        Arc::new(InMemoryPostRepository::new()),
        Arc::new(InMemoryProfileRepository::new()),
        storage,
        StoreSettings {
            max_image_bytes: 16,
            ..StoreSettings::default()
        },
    )
}

struct FailingStorage;

#[async_trait]
impl ObjectStorage for FailingStorage {
    async fn put(&self, _bytes: &[u8], _file_name: &str) -> Result<String, StorageError> {
        Err(StorageError::Connection("bucket unreachable".to_string()))
    }
}

#[tokio::test]
async fn test_created_ids_are_unique() {
    let services = services();

    let mut ids = HashSet::new();
    for _ in 0..1000 {
        let post = services
            .posts
            .create("u1", PostFields::new().title("T"))
            .await
            .unwrap();
        assert!(ids.insert(post.id));
    }
    assert_eq!(services.posts.list_ids_by_owner("u1").await.unwrap().len(), 1000);
}

#[tokio::test]
async fn test_create_then_get_round_trip() {
    let services = services();
    let created = services
        .posts
        .create("u1", PostFields::new().title("T").content("C"))
        .await
        .unwrap();

    let post = services.posts.get_by_id("u1", &created.id).await.unwrap();
    assert_eq!(post.owner_id, "u1");
    assert_eq!(post.title.as_deref(), Some("T"));
    assert_eq!(post.content.as_deref(), Some("C"));
    assert_eq!(post.created, post.updated);

    let again = services.posts.get_by_id("u1", &created.id).await.unwrap();
    assert_eq!(post, again);
}

#[tokio::test]
async fn test_create_requires_owner() {
    let services = services();
    let err = services
        .posts
        .create("  ", PostFields::new().title("T"))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
}

#[tokio::test]
async fn test_get_by_id_is_scoped_to_owner() {
    let services = services();
    let post = services
        .posts
        .create("u1", PostFields::new().title("T"))
        .await
        .unwrap();

    assert!(matches!(
        services.posts.get_by_id("u2", &post.id).await,
        Err(DomainError::NotFound { entity_type: "post", .. })
    ));
    assert!(matches!(
        services.posts.get_by_id("u1", "").await,
        Err(DomainError::Validation(_))
    ));
    assert!(matches!(
        services.posts.get_by_id("u1", "missing").await,
        Err(DomainError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_update_without_fields_is_rejected() {
    let services = services();
    let post = services
        .posts
        .create("u1", PostFields::new().title("T"))
        .await
        .unwrap();

    let err = services
        .posts
        .update("u1", &post.id, PostFields::new())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
}

#[tokio::test]
async fn test_update_with_only_rejected_uploads_is_rejected() {
    let storage = Arc::new(InMemoryObjectStorage::default());
    let services = services_with_storage(storage.clone());
    let post = services
        .posts
        .create("u1", PostFields::new().title("T"))
        .await
        .unwrap();

    let not_an_image = services
        .posts
        .update(
            "u1",
            &post.id,
            PostFields::new().image(ImageUpload::new("notes.txt", "text/plain", b"x".to_vec())),
        )
        .await;
    assert!(matches!(not_an_image, Err(DomainError::Validation(_))));

    let no_bytes = services
        .posts
        .update(
            "u1",
            &post.id,
            PostFields::new().image(ImageUpload::new("a.png", "image/png", Vec::new())),
        )
        .await;
    assert!(matches!(no_bytes, Err(DomainError::Validation(_))));

    let stored = services.posts.get_by_id("u1", &post.id).await.unwrap();
    assert_eq!(stored, post);
    assert!(storage.is_empty().await);
}

#[tokio::test]
async fn test_update_changes_only_title_and_updated() {
    let services = services();
    let post = services
        .posts
        .create("u1", PostFields::new().title("T").content("C"))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(2)).await;

    let updated = services
        .posts
        .update("u1", &post.id, PostFields::new().title("T2"))
        .await
        .unwrap();

    assert_eq!(updated.id, post.id);
    assert_eq!(updated.owner_id, post.owner_id);
    assert_eq!(updated.title.as_deref(), Some("T2"));
    assert_eq!(updated.content, post.content);
    assert_eq!(updated.images, post.images);
    assert_eq!(updated.created, post.created);
    assert!(updated.updated > post.updated);

    let stored = services.posts.get_by_id("u1", &post.id).await.unwrap();
    assert_eq!(stored, updated);
}

#[tokio::test]
async fn test_update_of_missing_post() {
    let services = services();
    let err = services
        .posts
        .update("u1", "missing", PostFields::new().title("T"))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound { .. }));
}

#[tokio::test]
async fn test_delete_then_get_is_not_found() {
    let services = services();
    let post = services
        .posts
        .create("u1", PostFields::new().title("T"))
        .await
        .unwrap();

    let report = services.posts.delete("u1", &post.id).await.unwrap();
    assert!(report.is_complete());

    assert!(matches!(
        services.posts.get_by_id("u1", &post.id).await,
        Err(DomainError::NotFound { .. })
    ));
    assert!(matches!(
        services.posts.delete("u1", &post.id).await,
        Err(DomainError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_list_ids_newest_first() {
    let services = services();
    assert!(services.posts.list_ids_by_owner("u1").await.unwrap().is_empty());

    let mut created = Vec::new();
    for title in ["first", "second", "third"] {
        let post = services
            .posts
            .create("u1", PostFields::new().title(title))
            .await
            .unwrap();
        created.push(post.id);
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    services
        .posts
        .create("u2", PostFields::new().title("other"))
        .await
        .unwrap();

    created.reverse();
    assert_eq!(services.posts.list_ids_by_owner("u1").await.unwrap(), created);
}

#[tokio::test]
async fn test_search_by_keyword_and_category() {
    let services = services();
    let title_hit = services
        .posts
        .create("u1", PostFields::new().title("Hello World"))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(2)).await;
    let content_hit = services
        .posts
        .create("u2", PostFields::new().content("Hello World"))
        .await
        .unwrap();
    services
        .posts
        .create("u1", PostFields::new().title("Goodbye").content("Goodbye"))
        .await
        .unwrap();

    let found: Vec<String> = services
        .posts
        .search("hello", None)
        .await
        .unwrap()
        .into_iter()
        .map(|post| post.id)
        .collect();
    assert_eq!(found, vec![content_hit.id.clone(), title_hit.id.clone()]);

    let titles = services.posts.search("hello", Some("title")).await.unwrap();
    assert_eq!(titles.len(), 1);
    assert_eq!(titles[0].id, title_hit.id);

    assert!(matches!(
        services.posts.search("", None).await,
        Err(DomainError::Validation(_))
    ));
    assert!(matches!(
        services.posts.search("hello", Some("author")).await,
        Err(DomainError::Validation(_))
    ));
}

#[tokio::test]
async fn test_images_upload_in_order_and_skip_non_images() {
    let storage = Arc::new(InMemoryObjectStorage::new("https://cdn.test"));
    let services = services_with_storage(storage.clone());

    let post = services
        .posts
        .create(
            "u1",
            PostFields::new()
                .title("T")
                .image(ImageUpload::new("a.png", "image/png", b"aaa".to_vec()))
                .image(ImageUpload::new("notes.txt", "text/plain", b"txt".to_vec()))
                .image(ImageUpload::new("b.jpg", "image/jpeg", b"bbb".to_vec())),
        )
        .await
        .unwrap();

    assert_eq!(post.images.len(), 2);
    assert!(post.images[0].ends_with("_a.png"));
    assert!(post.images[1].ends_with("_b.jpg"));
    assert_eq!(storage.get(&post.images[1]).await, Some(b"bbb".to_vec()));
    assert_eq!(storage.len().await, 2);
}

#[tokio::test]
async fn test_update_with_images_replaces_list() {
    let storage = Arc::new(InMemoryObjectStorage::new("https://cdn.test"));
    let services = services_with_storage(storage);

    let post = services
        .posts
        .create(
            "u1",
            PostFields::new().image(ImageUpload::new("a.png", "image/png", b"a".to_vec())),
        )
        .await
        .unwrap();

    let updated = services
        .posts
        .update(
            "u1",
            &post.id,
            PostFields::new().image(ImageUpload::new("b.png", "image/png", b"b".to_vec())),
        )
        .await
        .unwrap();

    assert_eq!(updated.images.len(), 1);
    assert!(updated.images[0].ends_with("_b.png"));
}

#[tokio::test]
async fn test_oversized_image_is_rejected_before_upload() {
    let storage = Arc::new(InMemoryObjectStorage::default());
    let services = services_with_storage(storage.clone());

    let err = services
        .posts
        .create(
            "u1",
            PostFields::new()
                .image(ImageUpload::new("ok.png", "image/png", vec![0; 4]))
                .image(ImageUpload::new("big.png", "image/png", vec![0; 17])),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::Validation(_)));
    assert!(storage.is_empty().await);
}

#[tokio::test]
async fn test_storage_failure_aborts_save() {
    let services = services_with_storage(Arc::new(FailingStorage));

    let err = services
        .posts
        .create(
            "u1",
            PostFields::new()
                .title("T")
                .image(ImageUpload::new("a.png", "image/png", b"a".to_vec())),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::Storage(StorageError::Connection(_))));
    assert!(services.posts.list_ids_by_owner("u1").await.unwrap().is_empty());
}
