use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::ReachId;

/// Attribute on the stream network layer that carries the river id.
pub const REACH_ID_PROPERTY: &str = "TDX Hydro Link Number";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub datetime: Vec<String>,
    pub flow_uncertainty_lower: Vec<f64>,
    pub flow_median: Vec<f64>,
    pub flow_uncertainty_upper: Vec<f64>,
}

/// Retrospective simulation. The flow column is keyed by the river id itself,
/// so everything other than `datetime` is collected into `columns`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrospectiveResponse {
    pub datetime: Vec<String>,
    #[serde(flatten)]
    pub columns: BTreeMap<String, serde_json::Value>,
}

impl RetrospectiveResponse {
    pub fn flows(&self, reach_id: ReachId) -> Option<Vec<f64>> {
        let column = self.columns.get(&reach_id.to_string())?;
        serde_json::from_value(column.clone()).ok()
    }
}

/// One feature returned by an identify query, GeoJSON shaped.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub geometry: Option<serde_json::Value>,
}

impl Feature {
    pub fn reach_id(&self) -> Option<ReachId> {
        self.properties
            .get(REACH_ID_PROPERTY)
            .and_then(ReachId::from_property)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
}
