//! The `reqwest`-backed persistence bridge.
//!
//! One method per backend operation, no retries: a failed call surfaces the
//! backend's message verbatim inside a structured
//! [`hireline_core::Error`] whose kind the UI layer dispatches on. Retry
//! policy, where it exists at all, belongs to the caller.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::Instrument;

use hireline_core::observability::{bridge_span, lookup_span};
use hireline_core::{
    BulkOutcome, DuplicateCheck, Error, LookupCategory, LookupOption, MutationAck, PageRequest,
    PagedResult, PersistenceBridge, Resource, Result,
};

use crate::config::Config;
use crate::paths;

/// REST implementation of [`PersistenceBridge`].
pub struct RestBridge {
    client: Client,
    config: Config,
}

impl RestBridge {
    /// Creates a bridge from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the HTTP client cannot be built.
    pub fn new(config: Config) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        self.authorized(request)
            .send()
            .await
            .map_err(|e| Error::network(e.to_string()))
    }

    async fn expect_json<T: DeserializeOwned>(response: Response) -> Result<T> {
        if response.status().is_success() {
            response
                .json()
                .await
                .map_err(|e| Error::serialization(format!("failed to parse response: {e}")))
        } else {
            Err(error_from_response(response).await)
        }
    }
}

/// Reads the failed response's body and maps it onto the error taxonomy.
///
/// JSON bodies with a `message` field surface that message; anything else
/// surfaces the raw body.
async fn error_from_response(response: Response) -> Error {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<BackendMessage>(&body)
        .map(|parsed| parsed.message)
        .unwrap_or(body);
    Error::from_status(status, message)
}

#[derive(Debug, Deserialize)]
struct BackendMessage {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DuplicateCheckBody {
    is_duplicate: bool,
    locked_by: Option<String>,
    remaining_time: Option<String>,
    remaining_days: Option<u32>,
}

impl DuplicateCheckBody {
    fn into_check(self) -> DuplicateCheck {
        if !self.is_duplicate {
            return DuplicateCheck::Clear;
        }
        let remaining = self
            .remaining_time
            .or_else(|| self.remaining_days.map(|days| format!("{days} days")))
            .unwrap_or_else(|| "unknown".to_string());
        DuplicateCheck::Locked {
            locked_by: self
                .locked_by
                .unwrap_or_else(|| "another agent".to_string()),
            remaining,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LookupEntry {
    Named { name: String },
    Raw(String),
}

impl From<LookupEntry> for LookupOption {
    fn from(entry: LookupEntry) -> Self {
        match entry {
            LookupEntry::Named { name } | LookupEntry::Raw(name) => LookupOption::plain(name),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ExistsBody {
    #[serde(rename = "isDuplicate")]
    is_duplicate: bool,
}

#[derive(Debug, Deserialize)]
struct BulkBody {
    results: BulkOutcome,
}

#[async_trait]
impl PersistenceBridge for RestBridge {
    async fn list_paged(&self, resource: Resource, request: &PageRequest) -> Result<PagedResult> {
        let span = bridge_span("list_paged", resource.as_str());
        async {
            let mut query: Vec<(&str, String)> = vec![
                ("page", request.page.to_string()),
                ("pageSize", request.page_size.to_string()),
            ];
            if !request.search.is_empty() {
                query.push(("searchText", request.search.clone()));
            }
            let response = self
                .send(self.client.get(self.url(&paths::resource(resource))).query(&query))
                .await?;
            Self::expect_json(response).await
        }
        .instrument(span)
        .await
    }

    async fn get_by_id(&self, resource: Resource, id: &str) -> Result<Map<String, Value>> {
        let span = bridge_span("get_by_id", resource.as_str());
        async {
            let response = self
                .send(self.client.get(self.url(&paths::resource_by_id(resource, id))))
                .await?;
            Self::expect_json(response).await
        }
        .instrument(span)
        .await
    }

    async fn create(
        &self,
        resource: Resource,
        payload: &Map<String, Value>,
    ) -> Result<MutationAck> {
        let span = bridge_span("create", resource.as_str());
        async {
            let response = self
                .send(self.client.post(self.url(&paths::resource(resource))).json(payload))
                .await?;
            Self::expect_json(response).await
        }
        .instrument(span)
        .await
    }

    async fn update(
        &self,
        resource: Resource,
        id: &str,
        payload: &Map<String, Value>,
    ) -> Result<MutationAck> {
        let span = bridge_span("update", resource.as_str());
        async {
            let response = self
                .send(
                    self.client
                        .put(self.url(&paths::resource_by_id(resource, id)))
                        .json(payload),
                )
                .await?;
            Self::expect_json(response).await
        }
        .instrument(span)
        .await
    }

    async fn check_duplicate(&self, phone: &str) -> Result<DuplicateCheck> {
        let span = bridge_span("check_duplicate", "candidates");
        async {
            let response = self
                .send(
                    self.client
                        .get(self.url(&paths::duplicate_check()))
                        .query(&[("phoneNumber", phone)]),
                )
                .await?;
            // A 404 is an answer, not a failure: no record exists at all.
            if response.status() == StatusCode::NOT_FOUND {
                return Ok(DuplicateCheck::NotFound);
            }
            let body: DuplicateCheckBody = Self::expect_json(response).await?;
            Ok(body.into_check())
        }
        .instrument(span)
        .await
    }

    async fn check_duplicate_by_field(
        &self,
        resource: Resource,
        field: &str,
        value: &str,
    ) -> Result<bool> {
        let span = bridge_span("check_duplicate_by_field", resource.as_str());
        async {
            let response = self
                .send(
                    self.client
                        .get(self.url(&paths::duplicate_check_by_field(resource)))
                        .query(&[("field", field), ("value", value)]),
                )
                .await?;
            if response.status() == StatusCode::NOT_FOUND {
                return Ok(false);
            }
            let body: ExistsBody = Self::expect_json(response).await?;
            Ok(body.is_duplicate)
        }
        .instrument(span)
        .await
    }

    async fn bulk_create(
        &self,
        resource: Resource,
        records: &[Map<String, Value>],
    ) -> Result<BulkOutcome> {
        let span = bridge_span("bulk_create", resource.as_str());
        async {
            let body = serde_json::json!({ "records": records });
            let response = self
                .send(self.client.post(self.url(&paths::bulk(resource))).json(&body))
                .await?;
            let body: BulkBody = Self::expect_json(response).await?;
            Ok(body.results)
        }
        .instrument(span)
        .await
    }

    async fn lookup(
        &self,
        category: LookupCategory,
        parent: Option<&str>,
    ) -> Result<Vec<LookupOption>> {
        let span = lookup_span(category.as_str());
        async {
            let mut request = self.client.get(self.url(&paths::lookup(category)));
            if let Some(parent) = parent {
                request = request.query(&[("parent", parent)]);
            }
            let response = self.send(request).await?;
            let entries: Vec<LookupEntry> = Self::expect_json(response).await?;
            Ok(entries.into_iter().map(LookupOption::from).collect())
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_body_maps_to_locked_with_day_fallback() {
        let body = DuplicateCheckBody {
            is_duplicate: true,
            locked_by: Some("Asha".to_string()),
            remaining_time: None,
            remaining_days: Some(4),
        };
        assert_eq!(
            body.into_check(),
            DuplicateCheck::Locked {
                locked_by: "Asha".to_string(),
                remaining: "4 days".to_string(),
            }
        );
    }

    #[test]
    fn duplicate_body_prefers_remaining_time() {
        let body = DuplicateCheckBody {
            is_duplicate: true,
            locked_by: None,
            remaining_time: Some("36 hours".to_string()),
            remaining_days: Some(2),
        };
        assert_eq!(
            body.into_check(),
            DuplicateCheck::Locked {
                locked_by: "another agent".to_string(),
                remaining: "36 hours".to_string(),
            }
        );
    }

    #[test]
    fn non_duplicate_body_is_clear() {
        let body = DuplicateCheckBody {
            is_duplicate: false,
            locked_by: None,
            remaining_time: None,
            remaining_days: None,
        };
        assert_eq!(body.into_check(), DuplicateCheck::Clear);
    }

    #[test]
    fn exists_body_parses_the_wire_flag() {
        let body: ExistsBody = serde_json::from_str(r#"{"isDuplicate":true}"#).unwrap();
        assert!(body.is_duplicate);
        let body: ExistsBody = serde_json::from_str(r#"{"isDuplicate":false}"#).unwrap();
        assert!(!body.is_duplicate);
    }

    #[test]
    fn lookup_entries_accept_both_wire_shapes() {
        let entries: Vec<LookupEntry> =
            serde_json::from_str(r#"[{"name":"Indore"},"Bhopal"]"#).unwrap();
        let options: Vec<LookupOption> = entries.into_iter().map(LookupOption::from).collect();
        assert_eq!(options[0], LookupOption::plain("Indore"));
        assert_eq!(options[1], LookupOption::plain("Bhopal"));
    }
}
