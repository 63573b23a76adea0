//! Thin per-entity clients over a service Gateway.
//!
//! Payloads are passed through as `serde_json::Value`; nothing here interprets
//! entity shapes beyond finding the list items and total of a page.

pub mod installations;
pub mod maintenance;
pub mod products;
pub mod users;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ClientError;
use crate::gateway::{ApiRequest, Gateway};

pub use installations::InstallationClient;
pub use maintenance::MaintenanceClient;
pub use products::ProductClient;
pub use users::UserClient;

/// Pagination, sort and search parameters of a list call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListParams {
    pub page: u32,
    pub page_size: u32,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 10,
            search: None,
            ordering: None,
        }
    }
}

impl ListParams {
    pub fn page(page: u32, page_size: u32) -> Self {
        Self {
            page,
            page_size,
            ..Self::default()
        }
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Backend ordering expression, e.g. `nom` or `-created_at`
    pub fn ordering(mut self, ordering: impl Into<String>) -> Self {
        self.ordering = Some(ordering.into());
        self
    }

    /// Query pairs; empty search/ordering are left out entirely
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = vec![
            ("page".to_string(), self.page.to_string()),
            ("page_size".to_string(), self.page_size.to_string()),
        ];
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            query.push(("search".to_string(), search.to_string()));
        }
        if let Some(ordering) = self.ordering.as_deref().filter(|s| !s.is_empty()) {
            query.push(("ordering".to_string(), ordering.to_string()));
        }
        query
    }
}

/// One page of a list call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub items: Vec<Value>,
    pub total: u64,
}

impl Page {
    /// Accepts a paginated envelope (`{count, results}`) or a bare array
    pub fn from_body(body: Value) -> Result<Self, ClientError> {
        match body {
            Value::Array(items) => Ok(Self {
                total: items.len() as u64,
                items,
            }),
            Value::Object(mut map) => {
                let items = match map.remove("results") {
                    Some(Value::Array(items)) => items,
                    Some(other) => {
                        return Err(ClientError::InvalidPayload(format!(
                            "expected 'results' to be an array, got {}",
                            other
                        )))
                    }
                    None => {
                        return Err(ClientError::InvalidPayload(
                            "list response has neither 'results' nor an array body".to_string(),
                        ))
                    }
                };
                let total = map
                    .get("count")
                    .and_then(Value::as_u64)
                    .unwrap_or(items.len() as u64);
                Ok(Self { items, total })
            }
            other => Err(ClientError::InvalidPayload(format!(
                "unexpected list response: {}",
                other
            ))),
        }
    }
}

/// CRUD over one resource path on one service, e.g. `/categories/`
#[derive(Debug, Clone)]
pub struct Collection {
    gateway: Gateway,
    path: &'static str,
}

impl Collection {
    pub fn new(gateway: Gateway, path: &'static str) -> Self {
        Self { gateway, path }
    }

    pub fn path(&self) -> &'static str {
        self.path
    }

    fn item_path(&self, id: &str) -> String {
        format!("{}/{}/", self.path.trim_end_matches('/'), id)
    }

    pub async fn list(&self, params: &ListParams) -> Result<Page, ClientError> {
        self.list_where(params, &[]).await
    }

    /// List with extra backend filters (`?user=12`) on top of pagination
    pub async fn list_where(
        &self,
        params: &ListParams,
        filters: &[(&str, &str)],
    ) -> Result<Page, ClientError> {
        let request = ApiRequest::get(self.path)
            .queries(params.to_query())
            .queries(filters.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        let response = self.gateway.send(request).await?;
        Page::from_body(response.body)
    }

    /// Every item, no pagination parameters sent
    pub async fn all(&self) -> Result<Page, ClientError> {
        let response = self.gateway.send(ApiRequest::get(self.path)).await?;
        Page::from_body(response.body)
    }

    pub async fn get(&self, id: &str) -> Result<Value, ClientError> {
        let response = self.gateway.send(ApiRequest::get(self.item_path(id))).await?;
        Ok(response.body)
    }

    pub async fn create(&self, payload: Value) -> Result<Value, ClientError> {
        let response = self
            .gateway
            .send(ApiRequest::post(self.path).json(payload))
            .await?;
        Ok(response.body)
    }

    /// Full replacement (PUT)
    pub async fn update(&self, id: &str, payload: Value) -> Result<Value, ClientError> {
        let response = self
            .gateway
            .send(ApiRequest::put(self.item_path(id)).json(payload))
            .await?;
        Ok(response.body)
    }

    /// Partial update (PATCH)
    pub async fn partial_update(&self, id: &str, payload: Value) -> Result<Value, ClientError> {
        let response = self
            .gateway
            .send(ApiRequest::patch(self.item_path(id)).json(payload))
            .await?;
        Ok(response.body)
    }

    pub async fn delete(&self, id: &str) -> Result<(), ClientError> {
        self.gateway.send(ApiRequest::delete(self.item_path(id))).await?;
        Ok(())
    }

    /// First item linked to `user_id`, if any
    pub async fn find_by_user(&self, user_id: &str) -> Result<Option<Value>, ClientError> {
        let request = ApiRequest::get(self.path).query("user", user_id);
        let response = self.gateway.send(request).await?;
        let page = Page::from_body(response.body)?;
        Ok(page.items.into_iter().next())
    }
}
