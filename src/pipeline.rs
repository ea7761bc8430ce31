use crate::commit::{CommitOutcome, CommitWriter};
use crate::config::Config;
use crate::draft::{EventDraft, EventSource, ImportRequest};
use crate::error::{ImportError, Result};
use crate::fetcher::{FetchOutcome, SourceFetcher};
use crate::storage::Storage;
use crate::{extract, freetext, normalize};
use metrics::{counter, histogram};
use std::sync::Arc;
use tracing::{info, instrument};

/// The import pipeline: one operator-triggered operation at a time, no
/// background workers. `preview` produces an in-memory draft; `commit`
/// persists it after operator confirmation.
pub struct ImportPipeline {
    fetcher: SourceFetcher,
    writer: CommitWriter,
}

impl ImportPipeline {
    pub fn new(storage: Arc<dyn Storage>, config: &Config) -> Result<Self> {
        Ok(Self {
            fetcher: SourceFetcher::new(&config.fetcher)?,
            writer: CommitWriter::new(storage, config.matching.warn_threshold),
        })
    }

    #[instrument(skip(self, request), fields(path = request.path_name()))]
    pub async fn preview(&self, request: ImportRequest) -> Result<EventDraft> {
        counter!("import_previews_total", "path" => request.path_name()).increment(1);
        match request {
            ImportRequest::Scrape { url } => self.preview_scrape(&url).await,
            ImportRequest::FreeText { text, source } => Ok(self.preview_free_text(&text, source)),
        }
    }

    async fn preview_scrape(&self, url: &str) -> Result<EventDraft> {
        let fetch_start = std::time::Instant::now();
        let outcome = self.fetcher.fetch(url).await?;
        histogram!("import_fetch_duration_seconds").record(fetch_start.elapsed().as_secs_f64());

        match outcome {
            FetchOutcome::Blocked(draft) => {
                counter!("import_blocked_total").increment(1);
                Ok(draft)
            }
            FetchOutcome::Html(body) => {
                let extracted = extract::extract_from_html(&body);
                let draft = normalize::from_scrape(extracted, url);
                info!("Prepared preview '{}' from {}", draft.title, url);
                Ok(draft)
            }
        }
    }

    fn preview_free_text(&self, text: &str, source: EventSource) -> EventDraft {
        let fields = freetext::parse_free_text(text);
        let draft = normalize::from_free_text(fields, source);
        info!("Prepared free-text preview '{}'", draft.title);
        draft
    }

    #[instrument(skip(self, draft), fields(title = %draft.title))]
    pub async fn commit(&self, draft: &EventDraft) -> Result<CommitOutcome> {
        counter!("import_commits_total").increment(1);
        match self.writer.commit(draft).await {
            Err(e @ ImportError::Duplicate { .. }) => {
                counter!("import_conflicts_total").increment(1);
                Err(e)
            }
            other => other,
        }
    }
}
