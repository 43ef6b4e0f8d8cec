// LibreView (LibreLinkUp) client implementation
use crate::application::glucose_source::{FetchError, GlucoseSource};
use crate::domain::reading::{GlucoseFetch, RawReading, RawSeriesPoint};
use crate::infrastructure::config::LibreViewSettings;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{ACCEPT_ENCODING, CACHE_CONTROL, CONNECTION, CONTENT_TYPE};
use serde::Deserialize;

/// The vendor rejects clients that don't identify as the mobile app
pub const PRODUCT: &str = "llu.android";
pub const VERSION: &str = "4.7.0";

#[derive(Clone)]
pub struct LibreViewClient {
    client: reqwest::Client,
    graph_url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct GraphEnvelope {
    #[serde(default)]
    data: Option<GraphData>,
}

#[derive(Debug, Deserialize)]
struct GraphData {
    #[serde(default)]
    connection: Option<Connection>,
    #[serde(default, rename = "graphData")]
    graph_data: Option<Vec<RawSeriesPoint>>,
}

#[derive(Debug, Deserialize)]
struct Connection {
    #[serde(default, rename = "glucoseItem")]
    glucose_item: Option<RawReading>,
}

impl LibreViewClient {
    pub fn new(settings: &LibreViewSettings) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = settings.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to build LibreView HTTP client")?;

        Ok(Self {
            client,
            graph_url: format!(
                "{}/llu/connections/{}/graph",
                settings.base_url.trim_end_matches('/'),
                settings.connection_id
            ),
            token: settings.token.clone(),
        })
    }

    fn graph_request(&self) -> reqwest::RequestBuilder {
        self.client
            .get(&self.graph_url)
            .bearer_auth(&self.token)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT_ENCODING, "gzip")
            .header(CACHE_CONTROL, "no-cache")
            .header(CONNECTION, "keep-alive")
            .header("product", PRODUCT)
            .header("version", VERSION)
    }

    /// Pull the current reading and series out of a graph response body
    fn extract(body: &[u8]) -> Result<GlucoseFetch, FetchError> {
        let envelope: GraphEnvelope = serde_json::from_slice(body)?;
        let data = envelope.data.ok_or(FetchError::NotFound)?;

        let reading = data
            .connection
            .and_then(|c| c.glucose_item)
            .ok_or(FetchError::NotFound)?;
        let series = data.graph_data.ok_or(FetchError::NotFound)?;

        Ok(GlucoseFetch { reading, series })
    }
}

#[async_trait]
impl GlucoseSource for LibreViewClient {
    async fn fetch_glucose(&self) -> Result<GlucoseFetch, FetchError> {
        tracing::debug!("Requesting {}", self.graph_url);

        let response = self.graph_request().send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("LibreView graph request failed with status {}", status);
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await?;
        let fetch = Self::extract(&body)?;

        tracing::debug!(
            "LibreView returned value {:?} with {} graph points",
            fetch.reading.value(),
            fetch.series.len()
        );
        Ok(fetch)
    }
}
