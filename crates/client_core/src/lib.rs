//! Client side of the river forecast viewer: data API access, chart
//! construction, request status and the session that ties a map click to
//! both charts.

pub mod charts;
pub mod client;
pub mod dates;
pub mod error;
pub mod identify;
pub mod session;
pub mod status;

pub use charts::{build_forecast_chart, build_retrospective_chart, Chart, Series};
pub use client::{DataClient, DownloadLinks, DEFAULT_API_ENDPOINT};
pub use dates::ForecastDateBounds;
pub use error::ViewerError;
pub use identify::{
    resolve_reach, FeatureIdentifier, IdentifyQuery, LayerLoadState, MapClick, ResolvedReach,
    MIN_QUERY_ZOOM,
};
pub use session::{ClickOutcome, SessionSettings, ViewerEvent, ViewerSession};
pub use status::{LoadingStatus, StatusUpdate};

#[cfg(test)]
#[path = "tests/mock_api.rs"]
mod mock_api;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
