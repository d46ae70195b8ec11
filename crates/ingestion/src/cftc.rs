//! CFTC public reporting API client.
//!
//! Fetches Traders in Financial Futures rows through the Socrata SoQL
//! endpoint, paging with `$limit`/`$offset` and retrying transient failures.

use async_trait::async_trait;
use chrono::NaiveDate;
use cot_core::{CategoryConfig, Contract, Error, Result, SourceConfig};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::normalizer::{MARKET_NAME_FIELD, OPEN_INTEREST_FIELD, REPORT_DATE_FIELD};
use crate::source::{DataSource, SourceRecord};

/// Known dataset aliases.
const DATASET_ALIASES: &[(&str, &str)] = &[
    // Futures + options combined
    ("TFF_COMBINED", "6p9r-dwsc"),
];

/// Socrata column suffix for "all" positions.
const ALL_SUFFIX: &str = "_all";

/// Base delay between retries; doubled per attempt.
const RETRY_BASE_DELAY_MS: u64 = 500;

/// Date range and credentials for one fetch.
#[derive(Debug, Clone)]
pub struct CftcQuery {
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub api_token: Option<String>,
}

/// Client for the CFTC public reporting environment.
pub struct CftcClient {
    http_client: Client,
    source: SourceConfig,
    query: CftcQuery,
    /// (API column, internal field) pairs.
    columns: Vec<(String, String)>,
}

impl CftcClient {
    pub fn new(source: &SourceConfig, categories: &[CategoryConfig], query: CftcQuery) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(source.timeout_secs.max(1)))
            .build()
            .map_err(|e| Error::fetch(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            source: source.clone(),
            query,
            columns: column_map(categories),
        })
    }

    /// Dataset id with aliases resolved.
    pub fn dataset(&self) -> &str {
        resolve_dataset(&self.source.dataset_id)
    }

    /// Resource URL for the dataset.
    pub fn resource_url(&self) -> String {
        format!(
            "{}/resource/{}.json",
            self.source.base_url.trim_end_matches('/'),
            self.dataset()
        )
    }

    /// SoQL `$where` clause: date range plus market-name alias filter.
    pub fn where_clause(&self) -> String {
        let date_col = api_column(&self.columns, REPORT_DATE_FIELD);
        let market_col = api_column(&self.columns, MARKET_NAME_FIELD);

        let mut clauses = vec![format!("{date_col} >= '{}'", self.query.start_date)];
        if let Some(end) = self.query.end_date {
            clauses.push(format!("{date_col} <= '{end}'"));
        }

        let market_filters: Vec<String> = Contract::ALL
            .iter()
            .map(|c| {
                let aliases: Vec<String> = c
                    .market_aliases()
                    .iter()
                    .map(|a| format!("'{}'", a.to_uppercase().replace('\'', "''")))
                    .collect();
                format!("upper({market_col}) in ({})", aliases.join(","))
            })
            .collect();
        clauses.push(format!("({})", market_filters.join(" OR ")));

        clauses.join(" AND ")
    }

    /// Query parameters for one page.
    ///
    /// Rows are ordered by date then market name so `$offset` paging is
    /// stable when several markets share a report date.
    pub fn page_params(&self, offset: usize) -> Vec<(&'static str, String)> {
        let select: Vec<&str> = self.columns.iter().map(|(api, _)| api.as_str()).collect();
        let order = format!(
            "{},{}",
            api_column(&self.columns, REPORT_DATE_FIELD),
            api_column(&self.columns, MARKET_NAME_FIELD)
        );
        vec![
            ("$select", select.join(",")),
            ("$where", self.where_clause()),
            ("$order", order),
            ("$limit", self.source.page_size.to_string()),
            ("$offset", offset.to_string()),
        ]
    }

    /// Fetch every page.
    pub async fn fetch(&self) -> Result<Vec<SourceRecord>> {
        let mut records = Vec::new();
        let mut offset = 0;

        loop {
            let page = self.fetch_page(offset).await?;
            let count = page.len();
            debug!(offset, rows = count, "fetched page");

            records.extend(page.iter().filter_map(|obj| self.to_record(obj)));
            if count < self.source.page_size {
                break;
            }
            offset += count;
        }

        info!(dataset = self.dataset(), rows = records.len(), "fetched CFTC records");
        Ok(records)
    }

    async fn fetch_page(&self, offset: usize) -> Result<Vec<Value>> {
        let url = self.resource_url();
        let params = self.page_params(offset);
        let mut attempt: u32 = 0;

        loop {
            let mut request = self
                .http_client
                .get(&url)
                .query(&params)
                .header("Accept", "application/json");
            if let Some(token) = &self.query.api_token {
                request = request.header("X-App-Token", token);
            }

            let retryable = match request.send().await {
                Ok(response) if response.status().is_success() => {
                    let body: Value = response
                        .json()
                        .await
                        .map_err(|e| Error::fetch(format!("invalid JSON from {url}: {e}")))?;
                    return match body {
                        Value::Array(rows) => Ok(rows),
                        other => Err(Error::fetch(format!(
                            "expected a JSON array, got {}",
                            json_kind(&other)
                        ))),
                    };
                }
                Ok(response) => {
                    let status = response.status();
                    if !is_retryable_status(status) {
                        let body = response.text().await.unwrap_or_default();
                        return Err(Error::fetch(format!("HTTP {status}: {body}")));
                    }
                    format!("HTTP {status}")
                }
                Err(e) if e.is_timeout() || e.is_connect() || e.is_request() => e.to_string(),
                Err(e) => return Err(Error::fetch(e.to_string())),
            };

            if attempt >= self.source.max_retries {
                return Err(Error::fetch(format!(
                    "giving up after {} attempt(s): {retryable}",
                    attempt + 1
                )));
            }
            let delay = Duration::from_millis(RETRY_BASE_DELAY_MS << attempt.min(6));
            warn!(attempt = attempt + 1, error = %retryable, ?delay, "retrying CFTC request");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// Rename API columns to internal field names.
    fn to_record(&self, value: &Value) -> Option<SourceRecord> {
        let obj = value.as_object()?;
        Some(
            self.columns
                .iter()
                .filter_map(|(api, field)| {
                    let text = match obj.get(api)? {
                        Value::Null => return None,
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    Some((field.clone(), text))
                })
                .collect(),
        )
    }
}

#[async_trait]
impl DataSource for CftcClient {
    async fn load(&self) -> Result<Vec<SourceRecord>> {
        self.fetch().await
    }

    fn describe(&self) -> String {
        format!("cftc dataset {}", self.dataset())
    }
}

/// Resolve a dataset alias to a Socrata id; unknown names pass through.
pub fn resolve_dataset(name: &str) -> &str {
    DATASET_ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, id)| *id)
        .unwrap_or(name)
}

/// API column for every internal field the normalizer reads.
pub fn column_map(categories: &[CategoryConfig]) -> Vec<(String, String)> {
    let mut columns = vec![
        ("as_of_date_in_form_yyyymmdd".to_string(), REPORT_DATE_FIELD.to_string()),
        ("market_and_exchange_names".to_string(), MARKET_NAME_FIELD.to_string()),
        ("open_interest_all".to_string(), OPEN_INTEREST_FIELD.to_string()),
    ];
    for cat in categories {
        for field in [&cat.long_field, &cat.short_field] {
            columns.push((format!("{field}{ALL_SUFFIX}"), field.clone()));
        }
    }
    columns
}

fn api_column<'a>(columns: &'a [(String, String)], field: &'a str) -> &'a str {
    columns
        .iter()
        .find(|(_, f)| f == field)
        .map(|(api, _)| api.as_str())
        .unwrap_or(field)
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
