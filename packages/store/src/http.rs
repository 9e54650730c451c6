//! `reqwest`-backed [`RecordStore`] and [`CoordinateStore`].

use std::marker::PhantomData;

use async_trait::async_trait;
use food_map_records_models::{Coordinates, Entity, Locatable};
use reqwest::{Method, StatusCode, Url};

use crate::{CoordinateStore, DeleteResponse, RecordStore, StoreError};

/// Maximum number of response body characters kept in error messages.
const ERROR_BODY_PREVIEW_LEN: usize = 300;

/// One record collection of the CRUD API.
#[derive(Debug)]
pub struct HttpStore<T> {
    client: reqwest::Client,
    api_url: Url,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for HttpStore<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            api_url: self.api_url.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> HttpStore<T> {
    /// Creates a store for `T`'s collection under `api_url`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidUrl`] if `api_url` is not an absolute
    /// http(s) URL.
    pub fn new(client: reqwest::Client, api_url: &str) -> Result<Self, StoreError> {
        let api_url = Url::parse(api_url).map_err(|e| StoreError::InvalidUrl {
            message: format!("{api_url}: {e}"),
        })?;
        if api_url.cannot_be_a_base() {
            return Err(StoreError::InvalidUrl {
                message: format!("{api_url} cannot be a base URL"),
            });
        }
        Ok(Self {
            client,
            api_url,
            _entity: PhantomData,
        })
    }

    /// URL of the collection, optionally extended by path segments.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.api_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push(T::COLLECTION).extend(segments);
        }
        url
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&serde_json::Value>,
    ) -> Result<reqwest::Response, StoreError> {
        log::debug!("{method} {url}");
        let mut request = self.client.request(method.clone(), url.clone());
        if let Some(body) = body {
            request = request.json(body);
        }
        let resp = request.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        Err(StoreError::Status {
            method: method_name(&method),
            url: url.to_string(),
            status: status.as_u16(),
            body: body.chars().take(ERROR_BODY_PREVIEW_LEN).collect(),
        })
    }

    async fn send_for_record(
        &self,
        method: Method,
        url: Url,
        body: Option<&serde_json::Value>,
    ) -> Result<T, StoreError> {
        let value: serde_json::Value = self.send(method, url, body).await?.json().await?;
        Ok(T::from_raw(&value)?)
    }
}

fn method_name(method: &Method) -> &'static str {
    match *method {
        Method::GET => "GET",
        Method::POST => "POST",
        Method::PUT => "PUT",
        Method::DELETE => "DELETE",
        _ => "HTTP",
    }
}

#[async_trait]
impl<T: Entity> RecordStore<T> for HttpStore<T> {
    async fn get_all(&self) -> Result<Vec<T>, StoreError> {
        let body: serde_json::Value = self
            .send(Method::GET, self.url(&[]), None)
            .await?
            .json()
            .await?;

        let items = body.as_array().ok_or_else(|| StoreError::Parse {
            message: format!("{} response is not an array", T::COLLECTION),
        })?;

        let mut records = Vec::with_capacity(items.len());
        for item in items {
            match T::from_raw(item) {
                Ok(record) => records.push(record),
                Err(e) => log::warn!("Skipping {} record: {e}", T::LABEL),
            }
        }

        log::debug!(
            "Fetched {} {} records ({} skipped)",
            records.len(),
            T::LABEL,
            items.len() - records.len()
        );
        Ok(records)
    }

    async fn get(&self, id: &str) -> Result<Option<T>, StoreError> {
        match self.send_for_record(Method::GET, self.url(&[id]), None).await {
            Ok(record) => Ok(Some(record)),
            Err(StoreError::Status { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn create(&self, payload: &serde_json::Value) -> Result<T, StoreError> {
        self.send_for_record(Method::POST, self.url(&[]), Some(payload))
            .await
    }

    async fn update(&self, id: &str, payload: &serde_json::Value) -> Result<T, StoreError> {
        self.send_for_record(Method::PUT, self.url(&[id]), Some(payload))
            .await
    }

    async fn delete(&self, id: &str) -> Result<DeleteResponse, StoreError> {
        Ok(self
            .send(Method::DELETE, self.url(&[id]), None)
            .await?
            .json()
            .await?)
    }

    async fn delete_all(&self) -> Result<DeleteResponse, StoreError> {
        Ok(self
            .send(Method::DELETE, self.url(&[]), None)
            .await?
            .json()
            .await?)
    }
}

#[async_trait]
impl<T: Locatable> CoordinateStore for HttpStore<T> {
    async fn update_coordinates(
        &self,
        id: &str,
        coordinates: Coordinates,
    ) -> Result<(), StoreError> {
        let body = serde_json::json!({
            "latitude": coordinates.latitude,
            "longitude": coordinates.longitude,
        });
        self.send(Method::PUT, self.url(&[id, "coordinates"]), Some(&body))
            .await?;
        Ok(())
    }
}
