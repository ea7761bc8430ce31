use crate::draft::{EventDraft, EventSource, EventStatus, HostDraft, VenueDraft};
use crate::error::{ImportError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;
use uuid::Uuid;

/// A persisted venue row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueRecord {
    pub id: Uuid,
    pub name: String,
    pub address_line1: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl VenueRecord {
    pub fn from_draft(draft: &VenueDraft) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: draft.name.clone(),
            address_line1: draft.address_line1.clone(),
            city: draft.city.clone(),
            state: draft.state.clone(),
            postal_code: draft.postal_code.clone(),
            country: draft.country.clone(),
            created_at: Utc::now(),
        }
    }
}

/// A persisted host (organizer) row. Hosts are scoped by source: the same
/// name arriving from different platforms stays distinct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostRecord {
    pub id: Uuid,
    pub name: String,
    pub website_url: Option<String>,
    pub source: EventSource,
    pub created_at: DateTime<Utc>,
}

impl HostRecord {
    pub fn from_draft(draft: &HostDraft, source: EventSource) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: draft.name.clone(),
            website_url: draft.website_url.clone(),
            source,
            created_at: Utc::now(),
        }
    }
}

/// A persisted event row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
    pub source_url: String,
    pub ticket_url: Option<String>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub is_free: bool,
    pub status: EventStatus,
    pub source: EventSource,
    pub source_id: Option<String>,
    pub venue_id: Option<Uuid>,
    pub host_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl EventRecord {
    /// Rows are always created in draft status regardless of what the draft
    /// payload claims; promotion is a separate moderation action.
    pub fn from_draft(draft: &EventDraft, venue_id: Option<Uuid>, host_id: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: draft.title.clone(),
            description: draft.description.clone(),
            start_time: draft.start_time,
            end_time: draft.end_time,
            image_url: draft.image_url.clone(),
            source_url: draft.source_url.clone(),
            ticket_url: draft.ticket_url.clone(),
            price_min: draft.price_min,
            price_max: draft.price_max,
            is_free: draft.is_free,
            status: EventStatus::Draft,
            source: draft.source,
            source_id: draft.source_id.clone(),
            venue_id,
            host_id,
            created_at: Utc::now(),
        }
    }
}

/// Resolution of a draft's venue sub-object against persisted rows.
#[derive(Debug, Clone)]
pub enum VenueRef {
    None,
    Existing(Uuid),
    Create(VenueDraft),
}

/// Resolution of a draft's host sub-object against persisted rows.
#[derive(Debug, Clone)]
pub enum HostRef {
    None,
    Existing(Uuid),
    Create(HostDraft),
}

/// Storage trait for the import pipeline's reads and its single write.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Duplicate-guard lookup by the natural (source, source_id) key.
    async fn get_event_by_source(
        &self,
        source: EventSource,
        source_id: &str,
    ) -> Result<Option<EventRecord>>;

    /// Exact (case-insensitive) venue name lookup.
    async fn get_venue_by_name(&self, name: &str) -> Result<Option<VenueRecord>>;

    /// All venue names, for near-miss warnings.
    async fn venue_names(&self) -> Result<Vec<(Uuid, String)>>;

    /// Exact (case-insensitive) host name lookup, scoped by source.
    async fn get_host_by_name(&self, name: &str, source: EventSource)
        -> Result<Option<HostRecord>>;

    /// Host names for one source, for near-miss warnings.
    async fn host_names(&self, source: EventSource) -> Result<Vec<(Uuid, String)>>;

    /// Persist one logical import: optional new venue/host rows plus the
    /// event row, atomically. Re-checks the (source, source_id) key inside
    /// the write so a concurrent import cannot slip a second row through.
    async fn commit_import(
        &self,
        draft: &EventDraft,
        venue: VenueRef,
        host: HostRef,
    ) -> Result<EventRecord>;
}

/// In-memory storage implementation for development/testing.
pub struct InMemoryStorage {
    venues: Arc<Mutex<HashMap<Uuid, VenueRecord>>>,
    hosts: Arc<Mutex<HashMap<Uuid, HostRecord>>>,
    events: Arc<Mutex<HashMap<Uuid, EventRecord>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            venues: Arc::new(Mutex::new(HashMap::new())),
            hosts: Arc::new(Mutex::new(HashMap::new())),
            events: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn get_event_by_source(
        &self,
        source: EventSource,
        source_id: &str,
    ) -> Result<Option<EventRecord>> {
        let events = self.events.lock().unwrap();
        let event = events
            .values()
            .find(|e| e.source == source && e.source_id.as_deref() == Some(source_id))
            .cloned();
        Ok(event)
    }

    async fn get_venue_by_name(&self, name: &str) -> Result<Option<VenueRecord>> {
        let venues = self.venues.lock().unwrap();
        let venue = venues
            .values()
            .find(|v| v.name.to_lowercase() == name.to_lowercase())
            .cloned();
        Ok(venue)
    }

    async fn venue_names(&self) -> Result<Vec<(Uuid, String)>> {
        let venues = self.venues.lock().unwrap();
        Ok(venues.values().map(|v| (v.id, v.name.clone())).collect())
    }

    async fn get_host_by_name(
        &self,
        name: &str,
        source: EventSource,
    ) -> Result<Option<HostRecord>> {
        let hosts = self.hosts.lock().unwrap();
        let host = hosts
            .values()
            .find(|h| h.source == source && h.name.to_lowercase() == name.to_lowercase())
            .cloned();
        Ok(host)
    }

    async fn host_names(&self, source: EventSource) -> Result<Vec<(Uuid, String)>> {
        let hosts = self.hosts.lock().unwrap();
        Ok(hosts
            .values()
            .filter(|h| h.source == source)
            .map(|h| (h.id, h.name.clone()))
            .collect())
    }

    async fn commit_import(
        &self,
        draft: &EventDraft,
        venue: VenueRef,
        host: HostRef,
    ) -> Result<EventRecord> {
        // All three maps are held for the whole write, so one logical import
        // is atomic and the duplicate re-check cannot race a concurrent
        // commit of the same source event.
        let mut venues = self.venues.lock().unwrap();
        let mut hosts = self.hosts.lock().unwrap();
        let mut events = self.events.lock().unwrap();

        if let Some(source_id) = draft.source_id.as_deref() {
            if let Some(existing) = events
                .values()
                .find(|e| e.source == draft.source && e.source_id.as_deref() == Some(source_id))
            {
                return Err(ImportError::Duplicate {
                    existing_id: existing.id,
                });
            }
        }

        let venue_id = match venue {
            VenueRef::None => None,
            VenueRef::Existing(id) => Some(id),
            VenueRef::Create(venue_draft) => {
                let record = VenueRecord::from_draft(&venue_draft);
                let id = record.id;
                debug!("Created venue: {} with id {}", record.name, id);
                venues.insert(id, record);
                Some(id)
            }
        };

        let host_id = match host {
            HostRef::None => None,
            HostRef::Existing(id) => Some(id),
            HostRef::Create(host_draft) => {
                let record = HostRecord::from_draft(&host_draft, draft.source);
                let id = record.id;
                debug!("Created host: {} with id {}", record.name, id);
                hosts.insert(id, record);
                Some(id)
            }
        };

        let record = EventRecord::from_draft(draft, venue_id, host_id);
        debug!("Created event: {} with id {}", record.title, record.id);
        events.insert(record.id, record.clone());

        Ok(record)
    }
}
