//! HTTP client for the forecast data API.

use chrono::NaiveDate;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::ReachId,
    protocol::{ForecastResponse, RetrospectiveResponse},
};
use tracing::debug;
use url::Url;

use crate::error::ViewerError;

pub const DEFAULT_API_ENDPOINT: &str = "https://geoglows.ecmwf.int/api/v2";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadLinks {
    pub forecast: String,
    pub retrospective: String,
}

#[derive(Debug, Clone)]
pub struct DataClient {
    http: Client,
    endpoint: Url,
}

impl DataClient {
    pub fn new(endpoint: &str) -> Result<Self, ViewerError> {
        Self::with_http(Client::new(), endpoint)
    }

    pub fn with_http(http: Client, endpoint: &str) -> Result<Self, ViewerError> {
        let endpoint = Url::parse(endpoint.trim())
            .map_err(|_| ViewerError::InvalidEndpoint(endpoint.to_string()))?;
        if endpoint.cannot_be_a_base() {
            return Err(ViewerError::InvalidEndpoint(endpoint.to_string()));
        }
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub async fn forecast(
        &self,
        reach_id: ReachId,
        date: NaiveDate,
    ) -> Result<ForecastResponse, ViewerError> {
        let url = self.resource_url("forecast", reach_id, true);
        let date = date.format("%Y%m%d").to_string();
        self.get_json(url, &[("format", "json"), ("date", date.as_str())])
            .await
    }

    pub async fn retrospective(
        &self,
        reach_id: ReachId,
    ) -> Result<RetrospectiveResponse, ViewerError> {
        let url = self.resource_url("retrospective", reach_id, true);
        self.get_json(url, &[("format", "json")]).await
    }

    pub fn download_links(&self, reach_id: ReachId) -> DownloadLinks {
        DownloadLinks {
            forecast: self.resource_url("forecast", reach_id, false).into(),
            retrospective: self.resource_url("retrospective", reach_id, false).into(),
        }
    }

    fn resource_url(&self, resource: &str, reach_id: ReachId, trailing_slash: bool) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push(resource)
                .push(&reach_id.to_string());
            if trailing_slash {
                segments.push("");
            }
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, &str)],
    ) -> Result<T, ViewerError> {
        debug!(%url, "requesting data api");
        let wrap = |source: reqwest::Error| ViewerError::Http {
            url: url.to_string(),
            source,
        };
        self.http
            .get(url.clone())
            .query(query)
            .send()
            .await
            .map_err(wrap)?
            .error_for_status()
            .map_err(wrap)?
            .json()
            .await
            .map_err(wrap)
    }
}

#[cfg(test)]
#[path = "tests/client_tests.rs"]
mod tests;
