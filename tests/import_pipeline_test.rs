use std::sync::Arc;

use event_importer::commit::CommitWriter;
use event_importer::draft::{EventDraft, EventSource, EventStatus, HostDraft, VenueDraft};
use event_importer::error::ImportError;
use event_importer::storage::{InMemoryStorage, Storage};

fn eventbrite_draft(source_id: &str) -> EventDraft {
    let mut draft = EventDraft::new(
        format!("https://www.eventbrite.com/e/some-event-{source_id}"),
        EventSource::Eventbrite,
    );
    draft.title = "Test Event".to_string();
    draft.source_id = Some(source_id.to_string());
    draft
}

fn writer(storage: Arc<dyn Storage>) -> CommitWriter {
    CommitWriter::new(storage, 0.85)
}

#[tokio::test]
async fn test_second_import_of_same_source_event_conflicts() {
    let storage: Arc<dyn Storage> = Arc::new(InMemoryStorage::new());
    let writer = writer(storage.clone());

    let draft = eventbrite_draft("123456789012");
    let first = writer.commit(&draft).await.unwrap();

    let err = writer.commit(&draft).await.unwrap_err();
    match err {
        ImportError::Duplicate { existing_id } => assert_eq!(existing_id, first.event.id),
        other => panic!("expected duplicate conflict, got {other:?}"),
    }

    // Exactly one row persisted.
    let stored = storage
        .get_event_by_source(EventSource::Eventbrite, "123456789012")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.id, first.event.id);
}

#[tokio::test]
async fn test_drafts_without_source_id_skip_the_guard() {
    let storage: Arc<dyn Storage> = Arc::new(InMemoryStorage::new());
    let writer = writer(storage);

    let mut draft = EventDraft::new("https://host.example/event".to_string(), EventSource::Manual);
    draft.title = "Pasted Event".to_string();

    let first = writer.commit(&draft).await.unwrap();
    let second = writer.commit(&draft).await.unwrap();
    assert_ne!(first.event.id, second.event.id);
}

#[tokio::test]
async fn test_exact_venue_name_is_reused() {
    let storage: Arc<dyn Storage> = Arc::new(InMemoryStorage::new());
    let writer = writer(storage.clone());

    let mut first = eventbrite_draft("111111111111");
    first.venue = Some(VenueDraft::named("The Crocodile"));
    let first = writer.commit(&first).await.unwrap();

    let mut second = eventbrite_draft("222222222222");
    // Case-insensitive match still reuses the row.
    second.venue = Some(VenueDraft::named("the crocodile"));
    let second = writer.commit(&second).await.unwrap();

    assert_eq!(first.event.venue_id, second.event.venue_id);
    assert!(second.warnings.is_empty());
    assert_eq!(storage.venue_names().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_near_miss_venue_creates_new_row_with_warning() {
    let storage: Arc<dyn Storage> = Arc::new(InMemoryStorage::new());
    let writer = writer(storage.clone());

    let mut first = eventbrite_draft("111111111111");
    first.venue = Some(VenueDraft::named("The Crocodile"));
    writer.commit(&first).await.unwrap();

    let mut second = eventbrite_draft("222222222222");
    second.venue = Some(VenueDraft::named("The Crocodle"));
    let second = writer.commit(&second).await.unwrap();

    assert_eq!(storage.venue_names().await.unwrap().len(), 2);
    assert_eq!(second.warnings.len(), 1);
    assert!(second.warnings[0].contains("The Crocodile"));
}

#[tokio::test]
async fn test_hosts_are_scoped_by_source() {
    let storage: Arc<dyn Storage> = Arc::new(InMemoryStorage::new());
    let writer = writer(storage.clone());

    let mut eventbrite = eventbrite_draft("111111111111");
    eventbrite.host = Some(HostDraft {
        name: "Big Shows".to_string(),
        website_url: None,
    });
    let eventbrite = writer.commit(&eventbrite).await.unwrap();

    let mut manual = EventDraft::new("https://host.example/e".to_string(), EventSource::Manual);
    manual.title = "Manual Event".to_string();
    manual.host = Some(HostDraft {
        name: "Big Shows".to_string(),
        website_url: None,
    });
    let manual = writer.commit(&manual).await.unwrap();

    // Same name from different sources stays two distinct hosts.
    assert_ne!(eventbrite.event.host_id, manual.event.host_id);
    assert_eq!(
        storage
            .host_names(EventSource::Eventbrite)
            .await
            .unwrap()
            .len(),
        1
    );
    assert_eq!(
        storage.host_names(EventSource::Manual).await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn test_committed_rows_are_always_draft_status() {
    let storage: Arc<dyn Storage> = Arc::new(InMemoryStorage::new());
    let writer = writer(storage);

    let mut draft = eventbrite_draft("123456789012");
    draft.status = EventStatus::Approved;

    let outcome = writer.commit(&draft).await.unwrap();
    assert_eq!(outcome.event.status, EventStatus::Draft);
}

#[tokio::test]
async fn test_draft_file_round_trip_commits() -> anyhow::Result<()> {
    // Operator flow: preview saved to disk, edited, then committed.
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("draft.json");

    let mut draft = eventbrite_draft("123456789012");
    draft.venue = Some(VenueDraft::named("The Showbox"));
    std::fs::write(&path, serde_json::to_string_pretty(&draft)?)?;

    let loaded: EventDraft = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
    assert_eq!(loaded.title, draft.title);
    assert_eq!(loaded.source_id, draft.source_id);

    let storage: Arc<dyn Storage> = Arc::new(InMemoryStorage::new());
    let outcome = writer(storage).commit(&loaded).await?;
    assert!(outcome.event.venue_id.is_some());
    Ok(())
}

#[tokio::test]
async fn test_commit_preserves_price_fields() {
    let storage: Arc<dyn Storage> = Arc::new(InMemoryStorage::new());
    let writer = writer(storage);

    let mut draft = eventbrite_draft("123456789012");
    draft.price_min = Some(10.0);
    draft.price_max = Some(25.0);
    draft.is_free = false;

    let outcome = writer.commit(&draft).await.unwrap();
    assert_eq!(outcome.event.price_min, Some(10.0));
    assert_eq!(outcome.event.price_max, Some(25.0));
    assert!(!outcome.event.is_free);
}
