use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION},
    Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;

#[derive(Debug, Error)]
pub enum SupabaseError {
    #[error("Supabase request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Supabase API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid header value: {0}")]
    Header(String),
}

impl SupabaseError {
    pub fn status(&self) -> Option<u16> {
        match self {
            SupabaseError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Thin PostgREST / Storage client authenticated with the service-role key.
#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    service_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            service_key: config.supabase_service_key.clone(),
        }
    }

    fn get_headers(&self, prefer: Option<&str>) -> Result<HeaderMap, SupabaseError> {
        let mut headers = HeaderMap::new();

        let key = HeaderValue::from_str(&self.service_key)
            .map_err(|e| SupabaseError::Header(e.to_string()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.service_key))
            .map_err(|e| SupabaseError::Header(e.to_string()))?;

        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(prefer) = prefer {
            let value = HeaderValue::from_str(prefer)
                .map_err(|e| SupabaseError::Header(e.to_string()))?;
            headers.insert("Prefer", value);
        }

        Ok(headers)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        prefer: Option<&str>,
    ) -> Result<reqwest::Response, SupabaseError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut req = self.client.request(method, &url)
            .headers(self.get_headers(prefer)?);

        if let Some(body_data) = body {
            req = req.json(body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("API error ({}): {}", status, error_text);
            return Err(SupabaseError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        Ok(response)
    }

    pub async fn request<T>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T, SupabaseError>
    where T: DeserializeOwned {
        let response = self.send(method, path, body.as_ref(), None).await?;
        Ok(response.json::<T>().await?)
    }

    /// Request with a PostgREST `Prefer` header, e.g. `return=representation`.
    pub async fn request_with_prefer<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        prefer: &str,
    ) -> Result<T, SupabaseError>
    where T: DeserializeOwned {
        let response = self.send(method, path, body.as_ref(), Some(prefer)).await?;
        Ok(response.json::<T>().await?)
    }

    /// Calls a Postgres function through `/rest/v1/rpc`. Each call runs in one
    /// transaction on the database side.
    pub async fn rpc<T>(&self, function: &str, args: Value) -> Result<T, SupabaseError>
    where T: DeserializeOwned {
        let path = format!("/rest/v1/rpc/{}", function);
        self.request(Method::POST, &path, Some(args)).await
    }

    pub async fn upload_object(
        &self,
        bucket: &str,
        object_path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), SupabaseError> {
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, object_path);
        debug!("Uploading object to {}", url);

        let mut headers = self.get_headers(None)?;
        let content_type = HeaderValue::from_str(content_type)
            .map_err(|e| SupabaseError::Header(e.to_string()))?;
        headers.insert(CONTENT_TYPE, content_type);

        let response = self.client.post(&url)
            .headers(headers)
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("Storage upload error ({}): {}", status, error_text);
            return Err(SupabaseError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        Ok(())
    }

    pub async fn delete_object(&self, bucket: &str, object_path: &str) -> Result<(), SupabaseError> {
        let path = format!("/storage/v1/object/{}/{}", bucket, object_path);
        self.send(Method::DELETE, &path, None, None).await?;
        Ok(())
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }

    pub fn get_public_url(&self, bucket: &str, object_path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base_url, bucket, object_path)
    }
}
