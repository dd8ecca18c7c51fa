use reqwest::{Client, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use crate::backend::SelectQuery;
use crate::errors::AppError;

/// Client for the hosted relational data API.
///
/// Every call takes the bearer token for the current session: the anon key
/// for demo traffic, the user's access token otherwise. Row-level security on
/// the service side keys off that token.
#[derive(Clone)]
pub struct DataApiService {
    client: Client,
    rest_url: String,
    anon_key: String,
}

impl DataApiService {
    pub fn new(client: Client, rest_url: String, anon_key: String) -> Self {
        Self {
            client,
            rest_url,
            anon_key,
        }
    }

    fn request(&self, token: &str, method: Method, table: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.rest_url, table);
        self.client
            .request(method, &url)
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
    }

    async fn decode<R: DeserializeOwned>(
        table: &str,
        response: reqwest::Response,
    ) -> Result<R, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error reading response body".to_string());
            log::error!("Data API error on {}: {} - {}", table, status, error_text);
            return Err(AppError::Backend(format!(
                "request to {} failed with status {}: {}",
                table, status, error_text
            )));
        }
        let result = response.json::<R>().await?;
        Ok(result)
    }

    pub async fn select<R: DeserializeOwned>(
        &self,
        token: &str,
        query: &SelectQuery,
    ) -> Result<Vec<R>, AppError> {
        let response = self
            .request(token, Method::GET, query.table())
            .query(&query.to_query())
            .send()
            .await?;
        Self::decode(query.table(), response).await
    }

    pub async fn select_one<R: DeserializeOwned>(
        &self,
        token: &str,
        query: &SelectQuery,
    ) -> Result<Option<R>, AppError> {
        let limited = query.clone().limit(1);
        let mut rows: Vec<R> = self.select(token, &limited).await?;
        if rows.is_empty() {
            Ok(None)
        } else {
            Ok(Some(rows.remove(0)))
        }
    }

    /// Insert one row and return its stored representation.
    pub async fn insert<B: Serialize, R: DeserializeOwned>(
        &self,
        token: &str,
        table: &str,
        body: &B,
    ) -> Result<R, AppError> {
        let response = self
            .request(token, Method::POST, table)
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        let mut rows: Vec<R> = Self::decode(table, response).await?;
        if rows.is_empty() {
            return Err(AppError::Backend(format!(
                "insert into {} returned no representation",
                table
            )));
        }
        Ok(rows.remove(0))
    }

    /// Patch one row by id, tenant-scoped.
    pub async fn update<B: Serialize, R: DeserializeOwned>(
        &self,
        token: &str,
        table: &str,
        id: Uuid,
        tenant_id: Uuid,
        body: &B,
    ) -> Result<R, AppError> {
        let response = self
            .request(token, Method::PATCH, table)
            .query(&[
                ("id", format!("eq.{}", id)),
                ("tenant_id", format!("eq.{}", tenant_id)),
            ])
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        let mut rows: Vec<R> = Self::decode(table, response).await?;
        if rows.is_empty() {
            return Err(AppError::NotFound(format!("No row {} in {}", id, table)));
        }
        Ok(rows.remove(0))
    }

    /// Delete one row by id, tenant-scoped.
    pub async fn delete(
        &self,
        token: &str,
        table: &str,
        id: Uuid,
        tenant_id: Uuid,
    ) -> Result<(), AppError> {
        let response = self
            .request(token, Method::DELETE, table)
            .query(&[
                ("id", format!("eq.{}", id)),
                ("tenant_id", format!("eq.{}", tenant_id)),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error reading response body".to_string());
            log::error!("Data API error on {}: {} - {}", table, status, error_text);
            return Err(AppError::Backend(format!(
                "delete from {} failed with status {}: {}",
                table, status, error_text
            )));
        }
        Ok(())
    }
}
