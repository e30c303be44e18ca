//! Page orchestration: map click → river id → forecast and retrospective charts.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use shared::domain::{ChartKind, LatLng, LoadState, ReachId};
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

use crate::{
    charts::{build_forecast_chart, build_retrospective_chart, Chart},
    client::{DataClient, DownloadLinks},
    dates::ForecastDateBounds,
    error::ViewerError,
    identify::{
        resolve_reach, FeatureIdentifier, IdentifyQuery, LayerLoadState, MapClick, MIN_QUERY_ZOOM,
    },
    status::{LoadingStatus, StatusUpdate},
};

const EVENT_CAPACITY: usize = 64;

const TOAST_IDENTIFYING: &str = "Identifying river segment. Charts will load soon.";
const TOAST_LAYER_LOADING: &str = "The map is still loading streams. Charts will load soon.";
const TOAST_QUERY_FAILED: &str = "Error querying river number. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub auto_load_forecast: bool,
    pub auto_load_retrospective: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            auto_load_forecast: true,
            auto_load_retrospective: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ViewerEvent {
    Status(String),
    Toast(String),
    FlyTo {
        center: LatLng,
        zoom: u8,
    },
    MarkerPlaced(LatLng),
    SegmentSelected {
        reach_id: ReachId,
        geometry: serde_json::Value,
    },
    ChartsCleared,
    ChartLoading(ChartKind),
    ChartReady {
        kind: ChartKind,
        chart: Chart,
    },
    /// The chart was not loaded (disabled or failed); offer a button for it.
    RetryOffered {
        kind: ChartKind,
        reach_id: ReachId,
    },
    DownloadLinks(Option<DownloadLinks>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Zoomed in; no identify query was sent.
    ZoomedIn,
    QueryFailed,
    NotFound,
    Resolved(ReachId),
}

struct SessionInner {
    reach_id: Option<ReachId>,
    status: LoadingStatus,
    bounds: ForecastDateBounds,
    forecast_date: NaiveDate,
}

pub struct ViewerSession {
    client: DataClient,
    settings: SessionSettings,
    inner: Mutex<SessionInner>,
    events: broadcast::Sender<ViewerEvent>,
}

impl ViewerSession {
    pub fn new(client: DataClient, settings: SessionSettings, now: DateTime<Utc>) -> Self {
        let bounds = ForecastDateBounds::from_now(now);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            client,
            settings,
            inner: Mutex::new(SessionInner {
                reach_id: None,
                status: LoadingStatus::default(),
                bounds,
                forecast_date: bounds.default_date(),
            }),
            events,
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ViewerEvent> {
        self.events.subscribe()
    }

    pub async fn reach_id(&self) -> Option<ReachId> {
        self.inner.lock().await.reach_id
    }

    pub async fn status(&self) -> LoadingStatus {
        self.inner.lock().await.status
    }

    pub async fn forecast_date(&self) -> NaiveDate {
        self.inner.lock().await.forecast_date
    }

    pub async fn forecast_date_bounds(&self) -> ForecastDateBounds {
        self.inner.lock().await.bounds
    }

    /// Manual river id entry. Blank input is ignored.
    pub async fn enter_reach_id(&self, raw: &str) -> Result<Option<ReachId>, ViewerError> {
        if raw.trim().is_empty() {
            return Ok(None);
        }
        let reach_id: ReachId = raw.parse()?;
        self.select_reach(reach_id).await;
        Ok(Some(reach_id))
    }

    /// Makes `reach_id` the active river and loads (or offers) both charts.
    pub async fn select_reach(&self, reach_id: ReachId) {
        info!(%reach_id, "river selected");
        {
            let mut inner = self.inner.lock().await;
            inner.reach_id = Some(reach_id);
        }
        self.update_status(StatusUpdate::all(
            LoadState::Ready,
            LoadState::Clear,
            LoadState::Clear,
        ))
        .await;
        self.emit(ViewerEvent::ChartsCleared);

        let forecast = async {
            if self.settings.auto_load_forecast {
                self.fetch_forecast(reach_id).await;
            } else {
                self.offer_retry(ChartKind::Forecast, reach_id);
            }
        };
        let retrospective = async {
            if self.settings.auto_load_retrospective {
                self.fetch_retrospective(reach_id).await;
            } else {
                self.offer_retry(ChartKind::Retrospective, reach_id);
            }
        };
        futures::join!(forecast, retrospective);
    }

    /// Fetches and publishes the forecast chart for the selected river and
    /// date. Returns the resulting forecast status.
    pub async fn load_forecast(&self) -> Result<LoadState, ViewerError> {
        let reach_id = self.selected_reach().await?;
        Ok(self.fetch_forecast(reach_id).await)
    }

    /// Fetches and publishes the retrospective chart for the selected river.
    pub async fn load_retrospective(&self) -> Result<LoadState, ViewerError> {
        let reach_id = self.selected_reach().await?;
        Ok(self.fetch_retrospective(reach_id).await)
    }

    async fn fetch_forecast(&self, reach_id: ReachId) -> LoadState {
        let date = self.inner.lock().await.forecast_date;
        self.emit(ViewerEvent::ChartLoading(ChartKind::Forecast));
        self.update_status(StatusUpdate::forecast(LoadState::Load)).await;

        match self.client.forecast(reach_id, date).await {
            Ok(response) => {
                let chart = build_forecast_chart(reach_id, &response);
                self.emit(ViewerEvent::ChartReady {
                    kind: ChartKind::Forecast,
                    chart,
                });
                self.emit(ViewerEvent::DownloadLinks(Some(
                    self.client.download_links(reach_id),
                )));
                self.update_status(StatusUpdate::forecast(LoadState::Ready))
                    .await;
                LoadState::Ready
            }
            Err(error) => {
                warn!(%reach_id, %date, %error, "forecast request failed");
                self.update_status(StatusUpdate::forecast(LoadState::Fail))
                    .await;
                self.offer_retry(ChartKind::Forecast, reach_id);
                LoadState::Fail
            }
        }
    }

    async fn fetch_retrospective(&self, reach_id: ReachId) -> LoadState {
        self.update_status(StatusUpdate::retro(LoadState::Load)).await;
        self.emit(ViewerEvent::DownloadLinks(None));
        self.emit(ViewerEvent::ChartLoading(ChartKind::Retrospective));

        let chart = self
            .client
            .retrospective(reach_id)
            .await
            .and_then(|response| build_retrospective_chart(reach_id, &response));
        match chart {
            Ok(chart) => {
                self.emit(ViewerEvent::ChartReady {
                    kind: ChartKind::Retrospective,
                    chart,
                });
                self.emit(ViewerEvent::DownloadLinks(Some(
                    self.client.download_links(reach_id),
                )));
                self.update_status(StatusUpdate::retro(LoadState::Ready))
                    .await;
                LoadState::Ready
            }
            Err(error) => {
                warn!(%reach_id, %error, "retrospective request failed");
                self.update_status(StatusUpdate::retro(LoadState::Fail)).await;
                self.offer_retry(ChartKind::Retrospective, reach_id);
                LoadState::Fail
            }
        }
    }

    /// Changes the forecast run date and reloads the forecast if a river is
    /// selected.
    pub async fn set_forecast_date(&self, date: NaiveDate) -> Result<(), ViewerError> {
        let reach_id = {
            let mut inner = self.inner.lock().await;
            inner.forecast_date = inner.bounds.check(date)?;
            inner.reach_id
        };
        if let Some(reach_id) = reach_id {
            self.fetch_forecast(reach_id).await;
        }
        Ok(())
    }

    pub async fn handle_map_click(
        &self,
        click: MapClick,
        identifier: &dyn FeatureIdentifier,
        layer: &LayerLoadState,
    ) -> ClickOutcome {
        if click.zoom < MIN_QUERY_ZOOM {
            self.emit(ViewerEvent::FlyTo {
                center: click.point,
                zoom: MIN_QUERY_ZOOM,
            });
            return ClickOutcome::ZoomedIn;
        }

        self.emit(ViewerEvent::FlyTo {
            center: click.point,
            zoom: click.zoom,
        });
        self.emit(ViewerEvent::MarkerPlaced(click.point));
        self.update_status(StatusUpdate::all(
            LoadState::Load,
            LoadState::Clear,
            LoadState::Clear,
        ))
        .await;

        if layer.is_loaded() {
            self.emit(ViewerEvent::Toast(TOAST_IDENTIFYING.to_string()));
        } else {
            self.emit(ViewerEvent::Toast(TOAST_LAYER_LOADING.to_string()));
            layer.wait_loaded().await;
        }

        let collection = match identifier.identify(IdentifyQuery::at(click.point)).await {
            Ok(collection) => collection,
            Err(error) => {
                warn!(point = %click.point, %error, "identify query failed");
                self.update_status(StatusUpdate::reach_id(LoadState::Fail))
                    .await;
                self.emit(ViewerEvent::Toast(TOAST_QUERY_FAILED.to_string()));
                return ClickOutcome::QueryFailed;
            }
        };

        match resolve_reach(&collection) {
            Ok(resolved) => {
                self.emit(ViewerEvent::SegmentSelected {
                    reach_id: resolved.reach_id,
                    geometry: resolved.geometry,
                });
                self.select_reach(resolved.reach_id).await;
                ClickOutcome::Resolved(resolved.reach_id)
            }
            Err(error) => {
                warn!(point = %click.point, "no river at clicked point");
                self.update_status(StatusUpdate::reach_id(LoadState::Fail))
                    .await;
                self.emit(ViewerEvent::Toast(error.to_string()));
                ClickOutcome::NotFound
            }
        }
    }

    async fn selected_reach(&self) -> Result<ReachId, ViewerError> {
        self.inner
            .lock()
            .await
            .reach_id
            .ok_or(ViewerError::NoReachSelected)
    }

    async fn update_status(&self, update: StatusUpdate) {
        let rendered = {
            let mut inner = self.inner.lock().await;
            inner.status.apply(update);
            inner.status.render(inner.reach_id)
        };
        self.emit(ViewerEvent::Status(rendered));
    }

    fn offer_retry(&self, kind: ChartKind, reach_id: ReachId) {
        self.emit(ViewerEvent::RetryOffered { kind, reach_id });
    }

    fn emit(&self, event: ViewerEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
