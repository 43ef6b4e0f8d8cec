// Glucose service - Use case behind the local API route
use crate::application::glucose_source::{FetchError, GlucoseSource};
use crate::domain::reading::{RawSeriesPoint, SimplifiedGlucose};
use serde::Serialize;
use std::sync::Arc;

/// Body of a successful `GET /api/glucose`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlucoseResponse {
    pub glucose: SimplifiedGlucose,
    pub glucose_graph_data: Vec<RawSeriesPoint>,
}

#[derive(Clone)]
pub struct GlucoseService {
    source: Arc<dyn GlucoseSource>,
}

impl GlucoseService {
    pub fn new(source: Arc<dyn GlucoseSource>) -> Self {
        Self { source }
    }

    pub async fn current(&self) -> Result<GlucoseResponse, FetchError> {
        let fetch = self.source.fetch_glucose().await?;
        Ok(GlucoseResponse {
            glucose: SimplifiedGlucose::from(&fetch.reading),
            glucose_graph_data: fetch.series,
        })
    }
}
