use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Moderation status of an event row. Imports always create `Draft`;
/// promotion happens later through the moderation queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Draft => "draft",
            EventStatus::Pending => "pending",
            EventStatus::Approved => "approved",
            EventStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(EventStatus::Draft),
            "pending" => Some(EventStatus::Pending),
            "approved" => Some(EventStatus::Approved),
            "rejected" => Some(EventStatus::Rejected),
            _ => None,
        }
    }
}

/// The platform an import originated from, inferred from the URL's domain
/// or chosen explicitly by the operator for free-text imports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    Manual,
    Eventbrite,
    Meetup,
    Ticketspice,
    Facebook,
    Tixr,
    Instagram,
}

impl EventSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventSource::Manual => "manual",
            EventSource::Eventbrite => "eventbrite",
            EventSource::Meetup => "meetup",
            EventSource::Ticketspice => "ticketspice",
            EventSource::Facebook => "facebook",
            EventSource::Tixr => "tixr",
            EventSource::Instagram => "instagram",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "manual" => Some(EventSource::Manual),
            "eventbrite" => Some(EventSource::Eventbrite),
            "meetup" => Some(EventSource::Meetup),
            "ticketspice" => Some(EventSource::Ticketspice),
            "facebook" => Some(EventSource::Facebook),
            "tixr" => Some(EventSource::Tixr),
            "instagram" => Some(EventSource::Instagram),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            EventSource::Manual => "Manual",
            EventSource::Eventbrite => "Eventbrite",
            EventSource::Meetup => "Meetup",
            EventSource::Ticketspice => "TicketSpice",
            EventSource::Facebook => "Facebook",
            EventSource::Tixr => "Tixr",
            EventSource::Instagram => "Instagram",
        }
    }
}

/// Venue details captured during import. Free-text imports carry at most a
/// name and an undecomposed address line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueDraft {
    pub name: String,
    pub address_line1: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

impl VenueDraft {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address_line1: None,
            city: None,
            state: None,
            postal_code: None,
            country: None,
        }
    }
}

/// Organizer details captured during import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostDraft {
    pub name: String,
    pub website_url: Option<String>,
}

/// In-memory normalized event record produced by an import. Exists only as a
/// preview until the operator confirms; committed exactly once, never updated
/// by the pipeline itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDraft {
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
    pub warning: Option<String>,
    pub venue: Option<VenueDraft>,
    pub host: Option<HostDraft>,
}

impl EventDraft {
    pub fn new(source_url: String, source: EventSource) -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            start_time: Utc::now(),
            end_time: None,
            image_url: None,
            source_url,
            ticket_url: None,
            price_min: None,
            price_max: None,
            is_free: false,
            status: EventStatus::Draft,
            source,
            source_id: None,
            warning: None,
            venue: None,
            host: None,
        }
    }

    /// Template returned for platforms that reject automated retrieval: the
    /// operator fills in the details manually, starting from the URL alone.
    pub fn manual_template(url: &str, source: EventSource) -> Self {
        let mut draft = Self::new(url.to_string(), source);
        draft.ticket_url = Some(url.to_string());
        draft.warning = Some(format!(
            "{} events cannot be imported automatically. Enter the event details manually.",
            source.display_name()
        ));
        draft
    }

    pub fn append_warning(&mut self, message: &str) {
        match &mut self.warning {
            Some(existing) => {
                existing.push_str("; ");
                existing.push_str(message);
            }
            None => self.warning = Some(message.to_string()),
        }
    }
}

/// The two mutually exclusive extraction paths, dispatched on the operator's
/// chosen tab. Both produce the same canonical `EventDraft`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ImportRequest {
    Scrape { url: String },
    FreeText { text: String, source: EventSource },
}

impl ImportRequest {
    pub fn path_name(&self) -> &'static str {
        match self {
            ImportRequest::Scrape { .. } => "scrape",
            ImportRequest::FreeText { .. } => "free_text",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            EventStatus::Draft,
            EventStatus::Pending,
            EventStatus::Approved,
            EventStatus::Rejected,
        ] {
            assert_eq!(EventStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(EventStatus::parse("published"), None);
    }

    #[test]
    fn test_source_round_trip() {
        for source in [
            EventSource::Manual,
            EventSource::Eventbrite,
            EventSource::Meetup,
            EventSource::Ticketspice,
            EventSource::Facebook,
            EventSource::Tixr,
            EventSource::Instagram,
        ] {
            assert_eq!(EventSource::parse(source.as_str()), Some(source));
        }
    }

    #[test]
    fn test_import_request_deserializes_untagged() {
        let scrape: ImportRequest =
            serde_json::from_str(r#"{"url": "https://example.com/e/1"}"#).unwrap();
        assert!(matches!(scrape, ImportRequest::Scrape { .. }));

        let free_text: ImportRequest =
            serde_json::from_str(r#"{"text": "Title: Foo", "source": "tixr"}"#).unwrap();
        match free_text {
            ImportRequest::FreeText { source, .. } => assert_eq!(source, EventSource::Tixr),
            _ => panic!("expected free-text request"),
        }
    }

    #[test]
    fn test_manual_template_shape() {
        let url = "https://www.facebook.com/events/98765";
        let draft = EventDraft::manual_template(url, EventSource::Facebook);
        assert_eq!(draft.status, EventStatus::Draft);
        assert_eq!(draft.source, EventSource::Facebook);
        assert_eq!(draft.source_url, url);
        assert_eq!(draft.ticket_url.as_deref(), Some(url));
        assert!(draft.title.is_empty());
        assert!(draft.warning.is_some());
    }

    #[test]
    fn test_append_warning_joins() {
        let mut draft = EventDraft::new("https://example.com".into(), EventSource::Manual);
        draft.append_warning("first");
        draft.append_warning("second");
        assert_eq!(draft.warning.as_deref(), Some("first; second"));
    }
}
