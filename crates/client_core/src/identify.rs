//! Resolving a map click to a river id.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use shared::{
    domain::{LatLng, ReachId},
    protocol::FeatureCollection,
};
use tokio::sync::watch;

use crate::error::ViewerError;

/// Below this zoom a click only zooms the map in.
pub const MIN_QUERY_ZOOM: u8 = 12;
/// Map pixels around the click searched for a stream.
pub const IDENTIFY_TOLERANCE_PX: u32 = 25;
/// Decimals kept in returned coordinate pairs.
pub const IDENTIFY_PRECISION: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IdentifyQuery {
    pub point: LatLng,
    pub tolerance_px: u32,
    pub precision: u8,
}

impl IdentifyQuery {
    pub fn at(point: LatLng) -> Self {
        Self {
            point,
            tolerance_px: IDENTIFY_TOLERANCE_PX,
            precision: IDENTIFY_PRECISION,
        }
    }
}

/// Feature-identify capability of the stream network map service.
#[async_trait]
pub trait FeatureIdentifier: Send + Sync {
    async fn identify(&self, query: IdentifyQuery) -> anyhow::Result<FeatureCollection>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedReach {
    pub reach_id: ReachId,
    pub geometry: serde_json::Value,
}

/// Takes the first identified feature; it must carry both a river id and a
/// geometry to highlight.
pub fn resolve_reach(collection: &FeatureCollection) -> Result<ResolvedReach, ViewerError> {
    let feature = collection
        .features
        .first()
        .ok_or(ViewerError::ReachNotFound)?;
    let reach_id = feature.reach_id().ok_or(ViewerError::ReachNotFound)?;
    let geometry = feature
        .geometry
        .clone()
        .filter(|geometry| !geometry.is_null())
        .ok_or(ViewerError::ReachNotFound)?;
    Ok(ResolvedReach { reach_id, geometry })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapClick {
    pub point: LatLng,
    pub zoom: u8,
}

/// Tracks the streaming layer's `loading`/`load` notifications so identify
/// queries only run against a rendered layer.
#[derive(Debug, Clone)]
pub struct LayerLoadState {
    loaded: Arc<watch::Sender<bool>>,
}

impl Default for LayerLoadState {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerLoadState {
    pub fn new() -> Self {
        let (loaded, _) = watch::channel(false);
        Self {
            loaded: Arc::new(loaded),
        }
    }

    pub fn mark_loading(&self) {
        self.loaded.send_replace(false);
    }

    pub fn mark_loaded(&self) {
        self.loaded.send_replace(true);
    }

    pub fn is_loaded(&self) -> bool {
        *self.loaded.borrow()
    }

    /// Resolves as soon as the layer reports loaded.
    pub async fn wait_loaded(&self) {
        let mut rx = self.loaded.subscribe();
        // The sender lives as long as `self`, so this cannot observe a close.
        let _ = rx.wait_for(|loaded| *loaded).await;
    }
}

#[cfg(test)]
#[path = "tests/identify_tests.rs"]
mod tests;
