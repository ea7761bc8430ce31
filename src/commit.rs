use crate::draft::EventDraft;
use crate::error::{ImportError, Result};
use crate::matching;
use crate::storage::{EventRecord, HostRef, Storage, VenueRef};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Result of a confirmed commit: the persisted event row plus any advisory
/// warnings about near-miss venue/host names.
#[derive(Debug)]
pub struct CommitOutcome {
    pub event: EventRecord,
    pub warnings: Vec<String>,
}

/// Persists operator-approved drafts. Venues are matched by exact name,
/// hosts by exact name within their source; near-miss names above the
/// configured threshold create a new row but warn the operator instead of
/// silently merging.
pub struct CommitWriter {
    storage: Arc<dyn Storage>,
    warn_threshold: f64,
}

impl CommitWriter {
    pub fn new(storage: Arc<dyn Storage>, warn_threshold: f64) -> Self {
        Self {
            storage,
            warn_threshold,
        }
    }

    #[instrument(skip(self, draft), fields(title = %draft.title, source = draft.source.as_str()))]
    pub async fn commit(&self, draft: &EventDraft) -> Result<CommitOutcome> {
        // Duplicate guard: only runs when a platform-native id was resolved.
        // Free-text imports and id-less URLs have no reliable natural key.
        if let Some(source_id) = draft.source_id.as_deref() {
            if let Some(existing) = self
                .storage
                .get_event_by_source(draft.source, source_id)
                .await?
            {
                warn!(
                    "Rejecting import: {}/{} already exists as {}",
                    draft.source.as_str(),
                    source_id,
                    existing.id
                );
                return Err(ImportError::Duplicate {
                    existing_id: existing.id,
                });
            }
        } else {
            debug!("Draft has no source id; duplicate guard skipped");
        }

        let mut warnings = Vec::new();

        let venue_ref = match draft.venue.as_ref() {
            None => VenueRef::None,
            Some(venue) => match self.storage.get_venue_by_name(&venue.name).await? {
                Some(existing) => {
                    debug!("Reusing venue {} for '{}'", existing.id, venue.name);
                    VenueRef::Existing(existing.id)
                }
                None => {
                    let candidates = self.storage.venue_names().await?;
                    if let Some((near, score)) = matching::best_match(
                        &venue.name,
                        candidates.iter().map(|(_, name)| name.as_str()),
                        self.warn_threshold,
                    ) {
                        warnings.push(format!(
                            "Venue \"{}\" is close to existing venue \"{}\" ({:.0}% similar); a new venue was created, merge manually if they are the same place",
                            venue.name,
                            near,
                            score * 100.0
                        ));
                    }
                    VenueRef::Create(venue.clone())
                }
            },
        };

        let host_ref = match draft.host.as_ref() {
            None => HostRef::None,
            Some(host) => match self
                .storage
                .get_host_by_name(&host.name, draft.source)
                .await?
            {
                Some(existing) => {
                    debug!("Reusing host {} for '{}'", existing.id, host.name);
                    HostRef::Existing(existing.id)
                }
                None => {
                    let candidates = self.storage.host_names(draft.source).await?;
                    if let Some((near, score)) = matching::best_match(
                        &host.name,
                        candidates.iter().map(|(_, name)| name.as_str()),
                        self.warn_threshold,
                    ) {
                        warnings.push(format!(
                            "Host \"{}\" is close to existing host \"{}\" ({:.0}% similar); a new host was created, merge manually if they are the same organizer",
                            host.name,
                            near,
                            score * 100.0
                        ));
                    }
                    HostRef::Create(host.clone())
                }
            },
        };

        let event = self
            .storage
            .commit_import(draft, venue_ref, host_ref)
            .await?;
        info!("Committed event '{}' with id {}", event.title, event.id);

        Ok(CommitOutcome { event, warnings })
    }
}
