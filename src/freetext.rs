/// Line-oriented parser for operator-pasted event details, used for platforms
/// that cannot be scraped. Recognized labels are matched case-insensitively;
/// everything else is folded into the description.
#[derive(Debug, Default, Clone)]
pub struct FreeTextFields {
    pub title: Option<String>,
    pub start_time_raw: Option<String>,
    pub ticket_url: Option<String>,
    pub page_url: Option<String>,
    pub venue_name: Option<String>,
    pub address: Option<String>,
    pub description_lines: Vec<String>,
}

pub fn parse_free_text(text: &str) -> FreeTextFields {
    let mut fields = FreeTextFields::default();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match split_labeled_line(line) {
            Some(("title", value)) => fields.title = Some(value),
            Some(("start", value)) => fields.start_time_raw = Some(value),
            Some(("ticket_url", value)) => fields.ticket_url = Some(value),
            Some(("page_url", value)) => fields.page_url = Some(value),
            Some(("venue", value)) => fields.venue_name = Some(value),
            Some(("address", value)) => fields.address = Some(value),
            Some(("description", value)) => fields.description_lines.push(value),
            // Unlabeled lines are continuation text for the description; a
            // stray line anywhere in the input lands there, not on the floor.
            _ => fields.description_lines.push(line.to_string()),
        }
    }

    fields
}

/// Split a `Label: value` line and map the label through its synonyms to a
/// canonical field key. Lines without a recognized label return `None`.
fn split_labeled_line(line: &str) -> Option<(&'static str, String)> {
    let (label, value) = line.split_once(':')?;
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    let key = match label.trim().to_lowercase().as_str() {
        "event name" | "title" | "name" => "title",
        "start time" | "start date" | "date" | "when" => "start",
        "ticket url" | "tickets" => "ticket_url",
        "source url" | "page url" | "url" | "link" => "page_url",
        "venue" | "location" | "where" => "venue",
        "address" => "address",
        "description" | "details" | "about" => "description",
        _ => return None,
    };

    Some((key, value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_labeled_fields() {
        let fields = parse_free_text(
            "Event Name: Foo\nStart Date: 2025-05-01\nDescription: Bar",
        );
        assert_eq!(fields.title.as_deref(), Some("Foo"));
        assert_eq!(fields.start_time_raw.as_deref(), Some("2025-05-01"));
        assert_eq!(fields.description_lines, vec!["Bar"]);
    }

    #[test]
    fn test_label_synonyms() {
        let fields = parse_free_text("Title: Show\nWhen: 2025-06-01\nWhere: The Vera Project");
        assert_eq!(fields.title.as_deref(), Some("Show"));
        assert_eq!(fields.start_time_raw.as_deref(), Some("2025-06-01"));
        assert_eq!(fields.venue_name.as_deref(), Some("The Vera Project"));
    }

    #[test]
    fn test_stray_line_becomes_description() {
        let fields = parse_free_text("Title: Show\nDoors at 7pm\nVenue: Neumos");
        assert_eq!(fields.description_lines, vec!["Doors at 7pm"]);
        assert_eq!(fields.venue_name.as_deref(), Some("Neumos"));
    }

    #[test]
    fn test_bare_url_line_is_continuation() {
        // "https" is not a recognized label, so the line folds into the
        // description rather than being misread as a labeled field.
        let fields = parse_free_text("Title: Show\nhttps://example.com/info");
        assert_eq!(fields.description_lines, vec!["https://example.com/info"]);
        assert_eq!(fields.page_url, None);
    }

    #[test]
    fn test_both_urls_captured_separately() {
        let fields = parse_free_text(
            "Ticket URL: https://tix.example/e/1\nPage URL: https://host.example/event",
        );
        assert_eq!(fields.ticket_url.as_deref(), Some("https://tix.example/e/1"));
        assert_eq!(fields.page_url.as_deref(), Some("https://host.example/event"));
    }

    #[test]
    fn test_multi_line_description_accumulates() {
        let fields = parse_free_text("Description: First\nSecond line\nThird line");
        assert_eq!(
            fields.description_lines,
            vec!["First", "Second line", "Third line"]
        );
    }

    #[test]
    fn test_empty_value_is_continuation() {
        let fields = parse_free_text("Title:\nActual stray text");
        assert_eq!(fields.title, None);
        assert_eq!(fields.description_lines, vec!["Title:", "Actual stray text"]);
    }
}
