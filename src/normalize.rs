use crate::constants;
use crate::draft::{EventDraft, EventSource, EventStatus, VenueDraft};
use crate::extract::{self, ExtractedEvent};
use crate::freetext::FreeTextFields;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use tracing::{debug, warn};

/// Best-effort date parsing shared by both extraction paths. Accepts RFC 3339
/// plus the formats operators and platforms actually produce.
pub fn parse_start_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%m/%d/%Y %I:%M %p",
        "%B %d, %Y %I:%M %p",
    ];
    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&parsed));
        }
    }

    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%B %d, %Y"];
    for format in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(raw, format) {
            return parsed
                .and_hms_opt(0, 0, 0)
                .map(|dt| Utc.from_utc_datetime(&dt));
        }
    }

    None
}

/// Derive price bounds and the free flag from structured offer prices. No
/// offer data means price unknown, which is distinct from free.
pub fn derive_prices(prices: &[f64]) -> (Option<f64>, Option<f64>, bool) {
    if prices.is_empty() {
        return (None, None, false);
    }
    let min = prices.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = prices.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let is_free = min == 0.0 && max == 0.0;
    (Some(min), Some(max), is_free)
}

/// Merge the scrape path's extraction into the canonical draft shape.
pub fn from_scrape(extracted: ExtractedEvent, url: &str) -> EventDraft {
    let source = extract::infer_source(url);
    let mut draft = EventDraft::new(url.to_string(), source);
    draft.ticket_url = Some(url.to_string());
    draft.source_id = extract::extract_source_id(url, source);

    if let Some(title) = extracted.title {
        draft.title = title;
    }
    draft.description = extracted.description.unwrap_or_default();
    draft.image_url = extracted.image_url;

    apply_start_time(&mut draft, extracted.start_time_raw.as_deref());
    if let Some(raw) = extracted.end_time_raw.as_deref() {
        draft.end_time = parse_start_time(raw);
    }

    let (price_min, price_max, is_free) = derive_prices(&extracted.offer_prices);
    draft.price_min = price_min;
    draft.price_max = price_max;
    draft.is_free = is_free;

    finalize(draft)
}

/// Merge the free-text path's fields into the canonical draft shape.
pub fn from_free_text(fields: FreeTextFields, source: EventSource) -> EventDraft {
    // The page URL is the canonical locator when both are present; the ticket
    // URL is kept separately either way.
    let source_url = fields
        .page_url
        .clone()
        .or_else(|| fields.ticket_url.clone())
        .unwrap_or_default();

    let mut draft = EventDraft::new(source_url, source);
    draft.ticket_url = fields.ticket_url;

    if let Some(title) = fields.title {
        draft.title = title;
    }
    draft.description = fields.description_lines.join("\n");

    apply_start_time(&mut draft, fields.start_time_raw.as_deref());

    match (fields.venue_name, fields.address) {
        (Some(name), address) => {
            let mut venue = VenueDraft::named(name);
            venue.address_line1 = address;
            draft.venue = Some(venue);
        }
        (None, Some(address)) => {
            // An address with no venue name has nothing to attach to; the
            // operator adds the venue in the preview instead.
            debug!("Dropping free-text address with no venue line: {}", address);
        }
        (None, None) => {}
    }

    finalize(draft)
}

/// Parse the captured start time into the draft, defaulting to now on
/// failure. The failure is advisory, not fatal: the preview is the operator's
/// chance to correct it.
fn apply_start_time(draft: &mut EventDraft, raw: Option<&str>) {
    let Some(raw) = raw else {
        return;
    };
    match parse_start_time(raw) {
        Some(parsed) => draft.start_time = parsed,
        None => {
            warn!("Could not parse start time '{}'; defaulting to now", raw);
            draft.append_warning("Could not parse the start time; defaulted to the current time");
        }
    }
}

fn finalize(mut draft: EventDraft) -> EventDraft {
    if draft.title.trim().is_empty() {
        draft.title = constants::FALLBACK_TITLE.to_string();
    }
    draft.status = EventStatus::Draft;
    draft
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_parse_start_time_formats() {
        let rfc3339 = parse_start_time("2025-05-01T19:00:00-07:00").unwrap();
        assert_eq!(rfc3339.date_naive().to_string(), "2025-05-02");

        let date_only = parse_start_time("2025-05-01").unwrap();
        assert_eq!(date_only.date_naive().to_string(), "2025-05-01");

        let us_style = parse_start_time("05/01/2025 7:30 PM").unwrap();
        assert_eq!(us_style.date_naive().to_string(), "2025-05-01");

        let long_form = parse_start_time("May 1, 2025").unwrap();
        assert_eq!(long_form.year(), 2025);

        assert!(parse_start_time("next Tuesday-ish").is_none());
    }

    #[test]
    fn test_derive_prices_boundaries() {
        assert_eq!(derive_prices(&[0.0, 0.0]), (Some(0.0), Some(0.0), true));
        assert_eq!(derive_prices(&[10.0, 25.0]), (Some(10.0), Some(25.0), false));
        assert_eq!(derive_prices(&[]), (None, None, false));
        // A zero alongside paid tiers is not "free".
        assert_eq!(derive_prices(&[0.0, 15.0]), (Some(0.0), Some(15.0), false));
    }

    #[test]
    fn test_title_fallback() {
        let draft = from_scrape(ExtractedEvent::default(), "https://example.com/event");
        assert_eq!(draft.title, "New Event");
        assert_eq!(draft.status, EventStatus::Draft);
    }

    #[test]
    fn test_status_always_draft() {
        let extracted = ExtractedEvent {
            title: Some("Show".to_string()),
            ..Default::default()
        };
        let draft = from_scrape(extracted, "https://example.com/event");
        assert_eq!(draft.status, EventStatus::Draft);
    }
}
