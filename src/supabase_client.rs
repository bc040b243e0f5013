// PostgREST client for the customer registry. The store is reached
// through its REST layer with the service-role key; the `customers`
// table is keyed by id (= lowercased email), which doubles as the
// upsert conflict key.

use reqwest::Client;

use crate::error::ApiError;
use crate::models::customer::{RegistryCustomer, RegistryUpsertRow};

#[derive(Debug, Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    service_key: String,
}

fn table_url(base_url: &str, table: &str) -> String {
    format!("{}/rest/v1/{}", base_url.trim_end_matches('/'), table)
}

impl SupabaseClient {
    pub fn new(base_url: String, service_key: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            service_key,
        }
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.service_key)
            .header("Authorization", format!("Bearer {}", self.service_key))
    }

    async fn read_error(response: reqwest::Response) -> ApiError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        ApiError::remote(status, body.trim().to_string())
    }

    pub async fn list_customers(&self) -> Result<Vec<RegistryCustomer>, ApiError> {
        let url = format!("{}?select=*&order=name.asc", table_url(&self.base_url, "customers"));
        let response = self.authed(self.client.get(url)).send().await?;
        if !response.status().is_success() {
            return Err(Self::read_error(response).await);
        }
        Ok(response.json().await?)
    }

    pub async fn find_customer_by_email(
        &self,
        email: &str,
    ) -> Result<Option<RegistryCustomer>, ApiError> {
        let normalized = email.trim().to_lowercase();
        let url = format!(
            "{}?id=eq.{}&limit=1",
            table_url(&self.base_url, "customers"),
            urlencoding::encode(&normalized)
        );
        let response = self.authed(self.client.get(url)).send().await?;
        if !response.status().is_success() {
            return Err(Self::read_error(response).await);
        }
        let mut rows: Vec<RegistryCustomer> = response.json().await?;
        Ok(rows.pop())
    }

    /// Upsert a single customer row, conflict-on-id treated as
    /// update-in-place. Returns the stored representation.
    pub async fn upsert_customer(
        &self,
        row: &RegistryCustomer,
    ) -> Result<RegistryCustomer, ApiError> {
        let url = format!("{}?on_conflict=id", table_url(&self.base_url, "customers"));
        let response = self
            .authed(self.client.post(url))
            .header("Content-Type", "application/json")
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(&[row])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::read_error(response).await);
        }
        let mut rows: Vec<RegistryCustomer> = response.json().await?;
        rows.pop()
            .ok_or_else(|| ApiError::Fetch("registry upsert returned no rows".to_string()))
    }

    /// Bulk upsert used by the migration. All-or-nothing: a failing
    /// call fails the whole batch. Returns the number of rows stored.
    pub async fn upsert_customers(&self, rows: &[RegistryUpsertRow]) -> Result<usize, ApiError> {
        if rows.is_empty() {
            return Ok(0);
        }
        let url = format!("{}?on_conflict=id", table_url(&self.base_url, "customers"));
        let response = self
            .authed(self.client.post(url))
            .header("Content-Type", "application/json")
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(rows)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::read_error(response).await);
        }
        let stored: Vec<serde_json::Value> = response.json().await?;
        Ok(stored.len())
    }

    pub async fn delete_customer(&self, email: &str) -> Result<(), ApiError> {
        let normalized = email.trim().to_lowercase();
        let url = format!(
            "{}?id=eq.{}",
            table_url(&self.base_url, "customers"),
            urlencoding::encode(&normalized)
        );
        let response = self.authed(self.client.delete(url)).send().await?;
        if !response.status().is_success() {
            return Err(Self::read_error(response).await);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_url_tolerates_trailing_slash() {
        assert_eq!(
            table_url("https://proj.supabase.co/", "customers"),
            "https://proj.supabase.co/rest/v1/customers"
        );
        assert_eq!(
            table_url("https://proj.supabase.co", "customers"),
            "https://proj.supabase.co/rest/v1/customers"
        );
    }
}
