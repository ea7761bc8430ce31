use crate::draft::{EventDraft, EventSource, EventStatus};
use crate::error::{ImportError, Result};
use crate::storage::{EventRecord, HostRef, Storage, VenueRef};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Builder, Connection, Database};
use std::env;
use tracing::{debug, info};
use uuid::Uuid;

pub struct DatabaseManager {
    db: Database,
}

impl DatabaseManager {
    /// Create a new database manager with connection to Turso
    pub async fn new() -> Result<Self> {
        let url = env::var("LIBSQL_URL").map_err(|_| ImportError::Storage {
            message: "LIBSQL_URL environment variable not set".to_string(),
        })?;

        let auth_token = env::var("LIBSQL_AUTH_TOKEN").map_err(|_| ImportError::Storage {
            message: "LIBSQL_AUTH_TOKEN environment variable not set".to_string(),
        })?;

        info!("Connecting to Turso database at {}", url);

        let db = Builder::new_remote(url, auth_token)
            .build()
            .await
            .map_err(|e| ImportError::Storage {
                message: format!("Failed to connect to database: {e}"),
            })?;

        Ok(Self { db })
    }

    /// Get a connection to the database
    pub async fn get_connection(&self) -> Result<Connection> {
        self.db.connect().map_err(|e| ImportError::Storage {
            message: format!("Failed to get database connection: {e}"),
        })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations...");

        let conn = self.get_connection().await?;
        let migration_sql = include_str!("../migrations/001_create_import_tables.sql");

        conn.execute_batch(migration_sql)
            .await
            .map_err(|e| ImportError::Storage {
                message: format!("Failed to run migrations: {e}"),
            })?;

        info!("Database migrations completed successfully");
        Ok(())
    }
}

fn storage_err(context: &str, e: impl std::fmt::Display) -> ImportError {
    ImportError::Storage {
        message: format!("{context}: {e}"),
    }
}

fn parse_uuid(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| storage_err("Invalid UUID in row", e))
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| storage_err("Invalid timestamp in row", e))
}

const EVENT_COLUMNS: &str = "id, title, description, start_time, end_time, image_url, source_url, ticket_url, price_min, price_max, is_free, status, source, source_id, venue_id, host_id, created_at";

fn event_from_row(row: &libsql::Row) -> Result<EventRecord> {
    let id: String = row.get(0).map_err(|e| storage_err("Failed to get id", e))?;
    let title: String = row
        .get(1)
        .map_err(|e| storage_err("Failed to get title", e))?;
    let description: String = row
        .get(2)
        .map_err(|e| storage_err("Failed to get description", e))?;
    let start_time: String = row
        .get(3)
        .map_err(|e| storage_err("Failed to get start_time", e))?;
    let end_time: Option<String> = row.get(4).ok();
    let image_url: Option<String> = row.get(5).ok();
    let source_url: String = row
        .get(6)
        .map_err(|e| storage_err("Failed to get source_url", e))?;
    let ticket_url: Option<String> = row.get(7).ok();
    let price_min: Option<f64> = row.get(8).ok();
    let price_max: Option<f64> = row.get(9).ok();
    let is_free: i64 = row
        .get(10)
        .map_err(|e| storage_err("Failed to get is_free", e))?;
    let status: String = row
        .get(11)
        .map_err(|e| storage_err("Failed to get status", e))?;
    let source: String = row
        .get(12)
        .map_err(|e| storage_err("Failed to get source", e))?;
    let source_id: Option<String> = row.get(13).ok();
    let venue_id: Option<String> = row.get(14).ok();
    let host_id: Option<String> = row.get(15).ok();
    let created_at: String = row
        .get(16)
        .map_err(|e| storage_err("Failed to get created_at", e))?;

    Ok(EventRecord {
        id: parse_uuid(&id)?,
        title,
        description,
        start_time: parse_timestamp(&start_time)?,
        end_time: end_time.as_deref().map(parse_timestamp).transpose()?,
        image_url,
        source_url,
        ticket_url,
        price_min,
        price_max,
        is_free: is_free != 0,
        status: EventStatus::parse(&status).ok_or_else(|| ImportError::Storage {
            message: format!("Unknown event status '{status}' in row"),
        })?,
        source: EventSource::parse(&source).ok_or_else(|| ImportError::Storage {
            message: format!("Unknown event source '{source}' in row"),
        })?,
        source_id,
        venue_id: venue_id.as_deref().map(parse_uuid).transpose()?,
        host_id: host_id.as_deref().map(parse_uuid).transpose()?,
        created_at: parse_timestamp(&created_at)?,
    })
}

#[async_trait]
impl Storage for DatabaseManager {
    async fn get_event_by_source(
        &self,
        source: EventSource,
        source_id: &str,
    ) -> Result<Option<EventRecord>> {
        let conn = self.get_connection().await?;

        let mut rows = conn
            .query(
                &format!("SELECT {EVENT_COLUMNS} FROM events WHERE source = ? AND source_id = ?"),
                libsql::params![source.as_str(), source_id],
            )
            .await
            .map_err(|e| storage_err("Failed to query event", e))?;

        match rows
            .next()
            .await
            .map_err(|e| storage_err("Failed to read row", e))?
        {
            Some(row) => Ok(Some(event_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_venue_by_name(
        &self,
        name: &str,
    ) -> Result<Option<crate::storage::VenueRecord>> {
        let conn = self.get_connection().await?;

        let mut rows = conn
            .query(
                "SELECT id, name, address_line1, city, state, postal_code, country, created_at FROM venues WHERE lower(name) = lower(?)",
                libsql::params![name],
            )
            .await
            .map_err(|e| storage_err("Failed to query venue", e))?;

        match rows
            .next()
            .await
            .map_err(|e| storage_err("Failed to read row", e))?
        {
            Some(row) => {
                let id: String = row.get(0).map_err(|e| storage_err("Failed to get id", e))?;
                let name: String = row
                    .get(1)
                    .map_err(|e| storage_err("Failed to get name", e))?;
                let created_at: String = row
                    .get(7)
                    .map_err(|e| storage_err("Failed to get created_at", e))?;
                Ok(Some(crate::storage::VenueRecord {
                    id: parse_uuid(&id)?,
                    name,
                    address_line1: row.get(2).ok(),
                    city: row.get(3).ok(),
                    state: row.get(4).ok(),
                    postal_code: row.get(5).ok(),
                    country: row.get(6).ok(),
                    created_at: parse_timestamp(&created_at)?,
                }))
            }
            None => Ok(None),
        }
    }

    async fn venue_names(&self) -> Result<Vec<(Uuid, String)>> {
        let conn = self.get_connection().await?;

        let mut rows = conn
            .query("SELECT id, name FROM venues", libsql::params![])
            .await
            .map_err(|e| storage_err("Failed to query venue names", e))?;

        let mut results = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| storage_err("Failed to read row", e))?
        {
            let id: String = row.get(0).map_err(|e| storage_err("Failed to get id", e))?;
            let name: String = row
                .get(1)
                .map_err(|e| storage_err("Failed to get name", e))?;
            results.push((parse_uuid(&id)?, name));
        }

        Ok(results)
    }

    async fn get_host_by_name(
        &self,
        name: &str,
        source: EventSource,
    ) -> Result<Option<crate::storage::HostRecord>> {
        let conn = self.get_connection().await?;

        let mut rows = conn
            .query(
                "SELECT id, name, website_url, source, created_at FROM hosts WHERE lower(name) = lower(?) AND source = ?",
                libsql::params![name, source.as_str()],
            )
            .await
            .map_err(|e| storage_err("Failed to query host", e))?;

        match rows
            .next()
            .await
            .map_err(|e| storage_err("Failed to read row", e))?
        {
            Some(row) => {
                let id: String = row.get(0).map_err(|e| storage_err("Failed to get id", e))?;
                let name: String = row
                    .get(1)
                    .map_err(|e| storage_err("Failed to get name", e))?;
                let source_str: String = row
                    .get(3)
                    .map_err(|e| storage_err("Failed to get source", e))?;
                let created_at: String = row
                    .get(4)
                    .map_err(|e| storage_err("Failed to get created_at", e))?;
                Ok(Some(crate::storage::HostRecord {
                    id: parse_uuid(&id)?,
                    name,
                    website_url: row.get(2).ok(),
                    source: EventSource::parse(&source_str).ok_or_else(|| {
                        ImportError::Storage {
                            message: format!("Unknown host source '{source_str}' in row"),
                        }
                    })?,
                    created_at: parse_timestamp(&created_at)?,
                }))
            }
            None => Ok(None),
        }
    }

    async fn host_names(&self, source: EventSource) -> Result<Vec<(Uuid, String)>> {
        let conn = self.get_connection().await?;

        let mut rows = conn
            .query(
                "SELECT id, name FROM hosts WHERE source = ?",
                libsql::params![source.as_str()],
            )
            .await
            .map_err(|e| storage_err("Failed to query host names", e))?;

        let mut results = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| storage_err("Failed to read row", e))?
        {
            let id: String = row.get(0).map_err(|e| storage_err("Failed to get id", e))?;
            let name: String = row
                .get(1)
                .map_err(|e| storage_err("Failed to get name", e))?;
            results.push((parse_uuid(&id)?, name));
        }

        Ok(results)
    }

    async fn commit_import(
        &self,
        draft: &EventDraft,
        venue: VenueRef,
        host: HostRef,
    ) -> Result<EventRecord> {
        let conn = self.get_connection().await?;

        // One logical import is one transaction: a failed event insert must
        // not leave orphaned venue/host rows behind. BEGIN IMMEDIATE takes
        // the write lock up front so the duplicate re-check cannot race.
        conn.execute("BEGIN IMMEDIATE", libsql::params![])
            .await
            .map_err(|e| storage_err("Failed to begin transaction", e))?;

        match self.commit_in_transaction(&conn, draft, venue, host).await {
            Ok(record) => {
                conn.execute("COMMIT", libsql::params![])
                    .await
                    .map_err(|e| storage_err("Failed to commit transaction", e))?;
                Ok(record)
            }
            Err(e) => {
                let _ = conn.execute("ROLLBACK", libsql::params![]).await;
                Err(e)
            }
        }
    }
}

impl DatabaseManager {
    async fn commit_in_transaction(
        &self,
        conn: &Connection,
        draft: &EventDraft,
        venue: VenueRef,
        host: HostRef,
    ) -> Result<EventRecord> {
        if let Some(source_id) = draft.source_id.as_deref() {
            let mut rows = conn
                .query(
                    "SELECT id FROM events WHERE source = ? AND source_id = ?",
                    libsql::params![draft.source.as_str(), source_id],
                )
                .await
                .map_err(|e| storage_err("Failed to re-check duplicate", e))?;
            if let Some(row) = rows
                .next()
                .await
                .map_err(|e| storage_err("Failed to read row", e))?
            {
                let id: String = row.get(0).map_err(|e| storage_err("Failed to get id", e))?;
                return Err(ImportError::Duplicate {
                    existing_id: parse_uuid(&id)?,
                });
            }
        }

        let venue_id = match venue {
            VenueRef::None => None,
            VenueRef::Existing(id) => Some(id),
            VenueRef::Create(venue_draft) => {
                let record = crate::storage::VenueRecord::from_draft(&venue_draft);
                conn.execute(
                    "INSERT INTO venues (id, name, address_line1, city, state, postal_code, country, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                    libsql::params![
                        record.id.to_string(),
                        record.name.clone(),
                        record.address_line1.clone(),
                        record.city.clone(),
                        record.state.clone(),
                        record.postal_code.clone(),
                        record.country.clone(),
                        record.created_at.to_rfc3339()
                    ],
                )
                .await
                .map_err(|e| storage_err("Failed to insert venue", e))?;
                debug!("Created venue: {} with id {}", record.name, record.id);
                Some(record.id)
            }
        };

        let host_id = match host {
            HostRef::None => None,
            HostRef::Existing(id) => Some(id),
            HostRef::Create(host_draft) => {
                let record = crate::storage::HostRecord::from_draft(&host_draft, draft.source);
                conn.execute(
                    "INSERT INTO hosts (id, name, website_url, source, created_at) VALUES (?, ?, ?, ?, ?)",
                    libsql::params![
                        record.id.to_string(),
                        record.name.clone(),
                        record.website_url.clone(),
                        record.source.as_str(),
                        record.created_at.to_rfc3339()
                    ],
                )
                .await
                .map_err(|e| storage_err("Failed to insert host", e))?;
                debug!("Created host: {} with id {}", record.name, record.id);
                Some(record.id)
            }
        };

        let record = EventRecord::from_draft(draft, venue_id, host_id);
        conn.execute(
            "INSERT INTO events (id, title, description, start_time, end_time, image_url, source_url, ticket_url, price_min, price_max, is_free, status, source, source_id, venue_id, host_id, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            libsql::params![
                record.id.to_string(),
                record.title.clone(),
                record.description.clone(),
                record.start_time.to_rfc3339(),
                record.end_time.map(|dt| dt.to_rfc3339()),
                record.image_url.clone(),
                record.source_url.clone(),
                record.ticket_url.clone(),
                record.price_min,
                record.price_max,
                record.is_free as i64,
                record.status.as_str(),
                record.source.as_str(),
                record.source_id.clone(),
                record.venue_id.map(|id| id.to_string()),
                record.host_id.map(|id| id.to_string()),
                record.created_at.to_rfc3339()
            ],
        )
        .await
        .map_err(|e| storage_err("Failed to insert event", e))?;
        debug!("Created event: {} with id {}", record.title, record.id);

        Ok(record)
    }
}
