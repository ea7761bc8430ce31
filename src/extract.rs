use crate::constants;
use crate::draft::EventSource;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;

/// Best-effort partial event pulled from a page's structured data. Dates stay
/// raw here; the normalizer owns parsing and fallbacks.
#[derive(Debug, Default, Clone)]
pub struct ExtractedEvent {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_time_raw: Option<String>,
    pub end_time_raw: Option<String>,
    pub image_url: Option<String>,
    pub offer_prices: Vec<f64>,
}

/// Extract event fields from HTML. JSON-LD `Event` blocks win per field;
/// Open Graph / meta tags fill whatever remains unresolved.
pub fn extract_from_html(html: &str) -> ExtractedEvent {
    let document = Html::parse_document(html);
    let mut extracted = ExtractedEvent::default();

    apply_json_ld(&document, &mut extracted);
    apply_meta_fallbacks(&document, &mut extracted);

    extracted
}

fn apply_json_ld(document: &Html, out: &mut ExtractedEvent) {
    let selector = Selector::parse("script[type=\"application/ld+json\"]").unwrap();

    for element in document.select(&selector) {
        let json_text = element.inner_html();
        let parsed: Value = match serde_json::from_str(&json_text) {
            Ok(value) => value,
            Err(e) => {
                // One malformed block must not abort the rest.
                debug!("Skipping malformed JSON-LD block: {}", e);
                continue;
            }
        };

        let Some(event) = find_event_object(&parsed) else {
            continue;
        };

        if out.title.is_none() {
            out.title = string_field(event, "name");
        }
        if out.description.is_none() {
            out.description = string_field(event, "description");
        }
        if out.start_time_raw.is_none() {
            out.start_time_raw = string_field(event, "startDate");
        }
        if out.end_time_raw.is_none() {
            out.end_time_raw = string_field(event, "endDate");
        }
        if out.image_url.is_none() {
            out.image_url = image_url_from(&event["image"]);
        }
        if out.offer_prices.is_empty() {
            out.offer_prices = offer_prices_from(event);
        }
    }
}

fn find_event_object(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.iter().find(|item| item["@type"] == "Event"),
        Value::Object(_) if value["@type"] == "Event" => Some(value),
        _ => None,
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value[key]
        .as_str()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// JSON-LD images appear as a plain string, a `{url}` object, or an array of
/// either; the first resolvable URL wins.
fn image_url_from(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => items.first().and_then(image_url_from),
        Value::Object(_) => value["url"].as_str().map(|s| s.to_string()),
        _ => None,
    }
}

fn offer_prices_from(event: &Value) -> Vec<f64> {
    let offers = &event["offers"];
    let offer_list: Vec<&Value> = match offers {
        Value::Array(items) => items.iter().collect(),
        Value::Object(_) => vec![offers],
        _ => return Vec::new(),
    };

    offer_list
        .into_iter()
        .filter_map(|offer| match &offer["price"] {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
        .collect()
}

fn apply_meta_fallbacks(document: &Html, out: &mut ExtractedEvent) {
    if out.title.is_none() {
        out.title = meta_content(document, "meta[property=\"og:title\"]");
    }
    if out.title.is_none() {
        out.title = element_text(document, "title");
    }
    if out.description.is_none() {
        out.description = meta_content(document, "meta[property=\"og:description\"]")
            .or_else(|| meta_content(document, "meta[name=\"description\"]"));
    }
    if out.image_url.is_none() {
        out.image_url = meta_content(document, "meta[property=\"og:image\"]");
    }
}

fn meta_content(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).unwrap();
    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("content"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn element_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).unwrap();
    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Infer the source platform from the URL's domain.
pub fn infer_source(url: &str) -> EventSource {
    let host = reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
        .unwrap_or_default();
    constants::source_for_domain(&host)
}

/// Platform-native event identifier used for deduplication. Eventbrite embeds
/// a long numeric id in its event URLs; the first run of 10+ digits is taken
/// as that id. No run means no dedup key and the duplicate guard is skipped.
pub fn extract_source_id(url: &str, source: EventSource) -> Option<String> {
    if source != EventSource::Eventbrite {
        return None;
    }
    let digits = Regex::new(r"\d{10,}").unwrap();
    digits.find(url).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eventbrite_source_id() {
        let url = "https://www.eventbrite.com/e/some-event-123456789012";
        let source = infer_source(url);
        assert_eq!(source, EventSource::Eventbrite);
        assert_eq!(
            extract_source_id(url, source).as_deref(),
            Some("123456789012")
        );
    }

    #[test]
    fn test_short_digit_run_yields_no_source_id() {
        let url = "https://www.eventbrite.com/e/some-event-12345";
        assert_eq!(extract_source_id(url, EventSource::Eventbrite), None);
    }

    #[test]
    fn test_source_id_only_for_eventbrite() {
        let url = "https://www.meetup.com/group/events/123456789012";
        assert_eq!(extract_source_id(url, EventSource::Meetup), None);
    }

    #[test]
    fn test_image_shapes() {
        assert_eq!(
            image_url_from(&serde_json::json!("https://img.example/a.jpg")).as_deref(),
            Some("https://img.example/a.jpg")
        );
        assert_eq!(
            image_url_from(&serde_json::json!({"url": "https://img.example/b.jpg"})).as_deref(),
            Some("https://img.example/b.jpg")
        );
        assert_eq!(
            image_url_from(&serde_json::json!(["https://img.example/c.jpg", "x"])).as_deref(),
            Some("https://img.example/c.jpg")
        );
        assert_eq!(image_url_from(&serde_json::json!(42)), None);
    }

    #[test]
    fn test_offer_prices_string_and_number() {
        let event = serde_json::json!({
            "offers": [{"price": "10.00"}, {"price": 25}, {"price": null}]
        });
        assert_eq!(offer_prices_from(&event), vec![10.0, 25.0]);

        let single = serde_json::json!({"offers": {"price": 0}});
        assert_eq!(offer_prices_from(&single), vec![0.0]);

        let none = serde_json::json!({"name": "no offers"});
        assert!(offer_prices_from(&none).is_empty());
    }
}
