use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;

use super::{RecordStore, StoreError};
use crate::models::RawRecord;

pub const DEFAULT_API_URL: &str = "https://api.airtable.com";
const PAGE_SIZE: &str = "100";
// Far above the largest table a base can hold at 100 records per page.
const MAX_PAGES: usize = 10_000;

#[derive(Debug, Clone)]
pub struct AirtableConfig {
    pub api_url: String,
    pub base_id: String,
    pub api_key: String,
    pub timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    records: Vec<RawRecord>,
    offset: Option<String>,
}

/// Airtable REST client. Follows the `offset` cursor until every page of a
/// table has been read.
#[derive(Debug, Clone)]
pub struct AirtableStore {
    client: Client,
    config: AirtableConfig,
}

impl AirtableStore {
    pub fn new(config: AirtableConfig) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn table_url(&self, table: &str) -> Result<Url, StoreError> {
        table_url(&self.config.api_url, &self.config.base_id, table)
    }
}

fn table_url(api_url: &str, base_id: &str, table: &str) -> Result<Url, StoreError> {
    let mut url = Url::parse(api_url)
        .map_err(|err| StoreError::Transport(format!("invalid API url {api_url}: {err}")))?;
    url.path_segments_mut()
        .map_err(|_| StoreError::Transport(format!("API url {api_url} cannot carry a path")))?
        .pop_if_empty()
        .extend(["v0", base_id, table]);
    Ok(url)
}

fn decode_page(body: &str) -> Result<Page, StoreError> {
    serde_json::from_str(body).map_err(|err| StoreError::Decode(err.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageStatus {
    Readable,
    /// The credentials work but cannot see this table; read as empty.
    Inaccessible,
}

fn classify(status: StatusCode, table: &str) -> Result<PageStatus, StoreError> {
    match status {
        status if status.is_success() => Ok(PageStatus::Readable),
        StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => Ok(PageStatus::Inaccessible),
        StatusCode::UNAUTHORIZED => Err(StoreError::Transport("API key rejected".to_string())),
        status => Err(StoreError::Transport(format!("HTTP {status} for table {table}"))),
    }
}

/// Records the next cursor, refusing one the server already handed out.
fn advance(seen: &mut HashSet<String>, cursor: String) -> Result<String, StoreError> {
    if seen.len() >= MAX_PAGES {
        return Err(StoreError::Decode(format!("more than {MAX_PAGES} pages")));
    }
    if !seen.insert(cursor.clone()) {
        return Err(StoreError::Decode(format!("offset {cursor} repeated")));
    }
    Ok(cursor)
}

#[async_trait]
impl RecordStore for AirtableStore {
    fn kind(&self) -> &'static str {
        "airtable"
    }

    async fn fetch_all_records(&self, table: &str) -> Result<Vec<RawRecord>, StoreError> {
        let url = self.table_url(table)?;
        let mut records = Vec::new();
        let mut offset: Option<String> = None;
        let mut seen = HashSet::new();

        loop {
            let mut request = self
                .client
                .get(url.clone())
                .bearer_auth(&self.config.api_key)
                .query(&[("pageSize", PAGE_SIZE)]);
            if let Some(cursor) = &offset {
                request = request.query(&[("offset", cursor.as_str())]);
            }

            let response = request.send().await?;
            let status = response.status();
            if classify(status, table)? == PageStatus::Inaccessible {
                tracing::warn!(table, status = %status, "table not accessible");
                return Ok(Vec::new());
            }

            let page = decode_page(&response.text().await?)?;
            records.extend(page.records);
            tracing::debug!(table, fetched = records.len(), "page received");

            match page.offset {
                Some(cursor) => offset = Some(advance(&mut seen, cursor)?),
                None => break,
            }
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_encoded_table_urls() {
        let url = table_url("https://api.airtable.com/", "app123", "Élèves").unwrap();
        assert_eq!(url.as_str(), "https://api.airtable.com/v0/app123/%C3%89l%C3%A8ves");

        let url = table_url("http://localhost:8080", "app123", "tbl456").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/v0/app123/tbl456");
    }

    #[test]
    fn rejects_unusable_api_urls() {
        assert!(matches!(
            table_url("not a url", "app", "tbl"),
            Err(StoreError::Transport(_))
        ));
    }

    #[test]
    fn decodes_a_page_with_cursor() {
        let body = r#"{
            "records": [
                {"id": "recA", "createdTime": "2025-01-01T00:00:00.000Z", "fields": {"Nom": "Camille", "Statut": "Actif"}},
                {"id": "recB", "createdTime": "2025-01-02T00:00:00.000Z", "fields": {}}
            ],
            "offset": "itr123/recB"
        }"#;
        let page = decode_page(body).unwrap();
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.records[0].fields["Nom"], "Camille");
        assert_eq!(page.offset.as_deref(), Some("itr123/recB"));
    }

    #[test]
    fn last_page_has_no_cursor() {
        let page = decode_page(r#"{"records": []}"#).unwrap();
        assert!(page.records.is_empty());
        assert!(page.offset.is_none());
        assert!(matches!(decode_page("<html>"), Err(StoreError::Decode(_))));
    }

    #[test]
    fn classifies_response_statuses() {
        assert_eq!(classify(StatusCode::OK, "tbl").unwrap(), PageStatus::Readable);
        assert_eq!(classify(StatusCode::FORBIDDEN, "tbl").unwrap(), PageStatus::Inaccessible);
        assert_eq!(classify(StatusCode::NOT_FOUND, "tbl").unwrap(), PageStatus::Inaccessible);
        for status in [
            StatusCode::UNAUTHORIZED,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::BAD_GATEWAY,
        ] {
            assert!(
                matches!(classify(status, "tbl"), Err(StoreError::Transport(_))),
                "status {status}"
            );
        }
    }

    #[test]
    fn repeated_cursor_is_refused() {
        let mut seen = HashSet::new();
        assert_eq!(advance(&mut seen, "itr1".to_string()).unwrap(), "itr1");
        assert_eq!(advance(&mut seen, "itr2".to_string()).unwrap(), "itr2");
        assert!(matches!(
            advance(&mut seen, "itr1".to_string()),
            Err(StoreError::Decode(_))
        ));
    }

    fn store(api_url: &str) -> AirtableStore {
        AirtableStore::new(AirtableConfig {
            api_url: api_url.to_string(),
            base_id: "app123".to_string(),
            api_key: "pat-test".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn follows_offset_across_pages() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("GET", "/v0/app123/tbl456")
            .match_header("authorization", "Bearer pat-test")
            .match_query(mockito::Matcher::Regex("^pageSize=100$".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"records": [{"id": "rec1", "fields": {"Nom": "Camille"}}], "offset": "itr1"}"#)
            .expect(1)
            .create_async()
            .await;
        let second = server
            .mock("GET", "/v0/app123/tbl456")
            .match_query(mockito::Matcher::Regex("offset=itr1".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"records": [{"id": "rec2", "fields": {}}]}"#)
            .expect(1)
            .create_async()
            .await;

        let records = store(&server.url()).fetch_all_records("tbl456").await.unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["rec1", "rec2"]);
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn inaccessible_table_reads_as_empty() {
        let mut server = mockito::Server::new_async().await;
        let _forbidden = server
            .mock("GET", "/v0/app123/tblForbidden")
            .match_query(mockito::Matcher::Any)
            .with_status(403)
            .create_async()
            .await;
        let _missing = server
            .mock("GET", "/v0/app123/tblMissing")
            .match_query(mockito::Matcher::Any)
            .with_status(404)
            .create_async()
            .await;

        let store = store(&server.url());
        assert!(store.fetch_all_records("tblForbidden").await.unwrap().is_empty());
        assert!(store.fetch_all_records("tblMissing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejected_key_and_server_errors_are_transport_errors() {
        let mut server = mockito::Server::new_async().await;
        let _unauthorized = server
            .mock("GET", "/v0/app123/tblAuth")
            .match_query(mockito::Matcher::Any)
            .with_status(401)
            .create_async()
            .await;
        let _failing = server
            .mock("GET", "/v0/app123/tblDown")
            .match_query(mockito::Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let store = store(&server.url());
        assert!(matches!(
            store.fetch_all_records("tblAuth").await,
            Err(StoreError::Transport(_))
        ));
        assert!(matches!(
            store.fetch_all_records("tblDown").await,
            Err(StoreError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        assert!(matches!(
            store(&url).fetch_all_records("tbl456").await,
            Err(StoreError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn looping_cursor_stops_with_decode_error() {
        let mut server = mockito::Server::new_async().await;
        let _looping = server
            .mock("GET", "/v0/app123/tblLoop")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"records": [{"id": "rec1", "fields": {}}], "offset": "itr1"}"#)
            .create_async()
            .await;

        assert!(matches!(
            store(&server.url()).fetch_all_records("tblLoop").await,
            Err(StoreError::Decode(_))
        ));
    }
}
