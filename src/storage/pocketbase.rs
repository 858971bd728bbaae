//! PocketBase HTTP client
//!
//! Authenticates once as a superuser and keeps the bearer token inside the
//! client value. Every collection call goes through
//! `/api/collections/{collection}/records`.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;

use super::{Collection, Credentials, ListQuery, Record, RecordStore, StoreError};

const USER_AGENT: &str = concat!("ege-ingest/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct AuthResponse {
    token: String,
}

/// One page of a list response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListPage {
    page: u32,
    total_pages: u32,
    items: Vec<Record>,
}

impl ListPage {
    /// True while the server reports pages beyond this one. An empty page
    /// always ends the walk.
    fn has_next(&self) -> bool {
        !self.items.is_empty() && self.page < self.total_pages
    }
}

/// Authenticated PocketBase client
pub struct PocketBaseClient {
    http: Client,
    base_url: String,
    token: String,
    page_size: u32,
}

impl PocketBaseClient {
    /// Logs in and returns a client bound to the resulting token
    pub fn authenticate(
        base_url: &str,
        credentials: &Credentials,
        page_size: u32,
    ) -> Result<Self, StoreError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let base_url = base_url.trim_end_matches('/').to_string();
        let url = format!("{}/api/collections/_superusers/auth-with-password", base_url);

        tracing::debug!(url = %url, identity = %credentials.identity, "Authenticating");

        let response = http
            .post(&url)
            .json(&serde_json::json!({
                "identity": credentials.identity,
                "password": credentials.password,
            }))
            .send()
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(StoreError::Auth(format!("{}: {}", status.as_u16(), body)));
        }

        let auth: AuthResponse = response
            .json()
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            token: auth.token,
            page_size: page_size.max(1),
        })
    }

    fn records_url(&self, collection: Collection) -> String {
        format!("{}/api/collections/{}/records", self.base_url, collection)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.token)
    }

    /// Sends a request and maps non-success statuses to errors
    fn send(&self, request: RequestBuilder, context: &str) -> Result<Response, StoreError> {
        let response = self
            .authorized(request)
            .send()
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        Err(StoreError::Api {
            status: status.as_u16(),
            context: context.to_string(),
            body,
        })
    }

    fn record(response: Response) -> Result<Record, StoreError> {
        response
            .json()
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}

impl RecordStore for PocketBaseClient {
    fn list(&self, collection: Collection, query: &ListQuery) -> Result<Vec<Record>, StoreError> {
        let url = self.records_url(collection);
        let filter = query.filter.as_ref().map(|f| f.render());
        let fields = query.fields.as_ref().map(|fields| {
            // `id` is always needed to build a Record
            let mut fields = fields.clone();
            if !fields.iter().any(|f| f == "id") {
                fields.insert(0, "id".to_string());
            }
            fields.join(",")
        });

        let mut records = Vec::new();
        let mut page = 1;

        loop {
            let mut params = vec![
                ("page", page.to_string()),
                ("perPage", self.page_size.to_string()),
            ];
            if let Some(filter) = &filter {
                params.push(("filter", filter.clone()));
            }
            if let Some(fields) = &fields {
                params.push(("fields", fields.clone()));
            }

            tracing::debug!(%collection, page, filter = ?filter, "Listing records");

            let response = self.send(
                self.http.get(&url).query(&params),
                &format!("list {}", collection),
            )?;
            let body: ListPage = response
                .json()
                .map_err(|e| StoreError::Decode(e.to_string()))?;

            let has_next = body.has_next();
            records.extend(body.items);

            if !has_next {
                break;
            }
            page += 1;
        }

        Ok(records)
    }

    fn get(&self, collection: Collection, id: &str) -> Result<Record, StoreError> {
        let url = format!("{}/{}", self.records_url(collection), id);
        match self.send(self.http.get(&url), &format!("get {}/{}", collection, id)) {
            Ok(response) => Self::record(response),
            Err(StoreError::Api { status: 404, .. }) => Err(StoreError::NotFound {
                collection,
                id: id.to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    fn create(&self, collection: Collection, fields: &Value) -> Result<Record, StoreError> {
        let url = self.records_url(collection);
        let response = self.send(
            self.http.post(&url).json(fields),
            &format!("create {}", collection),
        )?;
        Self::record(response)
    }

    fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: &Value,
    ) -> Result<Record, StoreError> {
        let url = format!("{}/{}", self.records_url(collection), id);
        let response = self.send(
            self.http.patch(&url).json(fields),
            &format!("update {}/{}", collection, id),
        )?;
        Self::record(response)
    }
}
