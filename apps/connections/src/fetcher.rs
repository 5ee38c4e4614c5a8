//! Fetcher: pulls one day's puzzle from the remote endpoint into the store.
//!
//! The remote call sits behind the `PuzzleSource` trait so the merge logic can
//! run against a canned source in tests.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info};

use crate::errors::PipelineError;
use crate::models::puzzle::{format_puzzle_date, parse_puzzle_date};
use crate::store::Store;

/// Somewhere a puzzle document can be fetched from, by date.
#[async_trait]
pub trait PuzzleSource: Send + Sync {
    async fn fetch(&self, date: NaiveDate) -> Result<Value, PipelineError>;
}

/// HTTP source reading `<base_url>/<YYYY-MM-DD>.json`.
#[derive(Clone)]
pub struct HttpPuzzleSource {
    client: Client,
    base_url: String,
}

impl HttpPuzzleSource {
    /// `timeout` bounds the whole request; `None` keeps reqwest's default.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, PipelineError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn url_for(&self, date: NaiveDate) -> String {
        format!(
            "{}/{}.json",
            self.base_url.trim_end_matches('/'),
            format_puzzle_date(date)
        )
    }
}

#[async_trait]
impl PuzzleSource for HttpPuzzleSource {
    async fn fetch(&self, date: NaiveDate) -> Result<Value, PipelineError> {
        let url = self.url_for(date);
        debug!("GET {url}");

        let response = self
            .client
            .get(&url)
            .header("accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::Fetch(format!("{url} returned {status}")));
        }

        let body = response.text().await?;
        parse_document(&body)
    }
}

/// Parses a response body, requiring a JSON object.
pub fn parse_document(body: &str) -> Result<Value, PipelineError> {
    let document: Value = serde_json::from_str(body)
        .map_err(|e| PipelineError::Fetch(format!("response is not valid JSON: {e}")))?;
    if !document.is_object() {
        return Err(PipelineError::Fetch(
            "response is not a JSON object".to_string(),
        ));
    }
    Ok(document)
}

/// Outcome of a successful fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub date: NaiveDate,
    /// True when an earlier document for the same date was overwritten.
    pub replaced: bool,
    pub store_len: usize,
}

/// Validates `raw_date`, fetches its document and merges it into the store at
/// `store_path`.
///
/// A malformed date fails before the source or the file is touched. A failed
/// fetch leaves the store file as it was.
pub async fn fetch_into_store(
    source: &dyn PuzzleSource,
    store_path: &Path,
    raw_date: &str,
) -> Result<FetchOutcome, PipelineError> {
    let date = parse_puzzle_date(raw_date).ok_or_else(|| {
        PipelineError::Validation(format!(
            "invalid date '{raw_date}', expected YYYY-MM-DD"
        ))
    })?;

    let document = source.fetch(date).await?;
    info!("Fetched puzzle for {date}");

    let mut store = Store::load(store_path)?;
    let replaced = store.insert(date, document).is_some();
    store.save(store_path)?;

    Ok(FetchOutcome {
        date,
        replaced,
        store_len: store.len(),
    })
}
