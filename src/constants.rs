/// Platform domain constants and mapping helpers shared across the pipeline.
use crate::draft::EventSource;

/// Placeholder title used when neither extraction path resolves one.
pub const FALLBACK_TITLE: &str = "New Event";

// Source platforms degrade or block responses to non-browser agents, so the
// fetcher presents itself as a desktop browser.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
pub const BROWSER_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";
pub const BROWSER_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// Platforms known to actively reject automated retrieval. A hit routes the
/// import straight to manual entry without a network call.
pub fn blocked_platform(host: &str) -> Option<EventSource> {
    if host.contains("facebook.com") || host.contains("fb.com") {
        return Some(EventSource::Facebook);
    }
    if host.contains("instagram.com") {
        return Some(EventSource::Instagram);
    }
    None
}

/// Infer the source platform from a URL's domain. Unmapped platforms
/// (tixr.com included, which only arrives via operator-tagged free text)
/// degrade to `Manual` rather than erroring.
pub fn source_for_domain(host: &str) -> EventSource {
    if host.contains("eventbrite.com") {
        EventSource::Eventbrite
    } else if host.contains("meetup.com") {
        EventSource::Meetup
    } else if host.contains("facebook.com") || host.contains("fb.com") {
        EventSource::Facebook
    } else if host.contains("ticketspice.com") {
        EventSource::Ticketspice
    } else if host.contains("instagram.com") {
        EventSource::Instagram
    } else {
        EventSource::Manual
    }
}
