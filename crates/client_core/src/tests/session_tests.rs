use super::*;

use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::TimeZone;
use shared::protocol::{Feature, FeatureCollection, REACH_ID_PROPERTY};

use crate::mock_api::{spawn_api, FAILING_REACH, KNOWN_REACH, MISSING_COLUMN_REACH};

enum IdentifyReply {
    Reach(i64),
    Nothing,
    Fail,
}

struct FakeIdentifier {
    reply: IdentifyReply,
    queries: std::sync::Mutex<Vec<IdentifyQuery>>,
}

impl FakeIdentifier {
    fn new(reply: IdentifyReply) -> Self {
        Self {
            reply,
            queries: std::sync::Mutex::new(Vec::new()),
        }
    }

    fn query_count(&self) -> usize {
        self.queries.lock().expect("queries").len()
    }
}

#[async_trait]
impl FeatureIdentifier for FakeIdentifier {
    async fn identify(&self, query: IdentifyQuery) -> anyhow::Result<FeatureCollection> {
        self.queries.lock().expect("queries").push(query);
        match self.reply {
            IdentifyReply::Reach(id) => {
                let mut properties = serde_json::Map::new();
                properties.insert(REACH_ID_PROPERTY.to_string(), serde_json::json!(id));
                Ok(FeatureCollection {
                    features: vec![Feature {
                        properties,
                        geometry: Some(serde_json::json!({
                            "type": "LineString",
                            "coordinates": [[10.0, 45.0], [10.1, 45.1]]
                        })),
                    }],
                })
            }
            IdentifyReply::Nothing => Ok(FeatureCollection::default()),
            IdentifyReply::Fail => Err(anyhow!("identify service unavailable")),
        }
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 10, 8, 0, 0)
        .single()
        .expect("timestamp")
}

async fn session_with(settings: SessionSettings) -> (ViewerSession, crate::mock_api::MockApiState) {
    let (server_url, state) = spawn_api().await.expect("spawn api");
    let client = DataClient::new(&server_url).expect("client");
    (ViewerSession::new(client, settings, now()), state)
}

fn drain(rx: &mut broadcast::Receiver<ViewerEvent>) -> Vec<ViewerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn statuses(events: &[ViewerEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            ViewerEvent::Status(status) => Some(status.clone()),
            _ => None,
        })
        .collect()
}

fn both_charts() -> SessionSettings {
    SessionSettings {
        auto_load_forecast: true,
        auto_load_retrospective: true,
    }
}

#[tokio::test]
async fn select_reach_loads_both_charts_when_enabled() {
    let (session, state) = session_with(both_charts()).await;
    let mut rx = session.subscribe_events();

    session.select_reach(ReachId(KNOWN_REACH)).await;

    let status = session.status().await;
    assert_eq!(status.reach_id, LoadState::Ready);
    assert_eq!(status.forecast, LoadState::Ready);
    assert_eq!(status.retro, LoadState::Ready);

    let events = drain(&mut rx);
    assert!(events.contains(&ViewerEvent::ChartsCleared));
    let ready: Vec<ChartKind> = events
        .iter()
        .filter_map(|event| match event {
            ViewerEvent::ChartReady { kind, .. } => Some(*kind),
            _ => None,
        })
        .collect();
    assert!(ready.contains(&ChartKind::Forecast));
    assert!(ready.contains(&ChartKind::Retrospective));
    assert!(events.iter().any(|event| matches!(
        event,
        ViewerEvent::DownloadLinks(Some(links)) if links.forecast.ends_with("/forecast/760021611")
    )));
    assert_eq!(
        statuses(&events).last().map(String::as_str),
        Some("River ID: 760021611 - Forecast: Ready - Retrospective: Ready")
    );

    let requests = state.requests().await;
    let forecast = requests
        .iter()
        .find(|request| request.resource == "forecast")
        .expect("forecast request");
    assert_eq!(forecast.query.get("date").map(String::as_str), Some("20240309"));
}

#[tokio::test]
async fn disabled_charts_are_offered_instead_of_fetched() {
    let (session, state) = session_with(SessionSettings {
        auto_load_forecast: false,
        auto_load_retrospective: false,
    })
    .await;
    let mut rx = session.subscribe_events();

    session.select_reach(ReachId(KNOWN_REACH)).await;

    let events = drain(&mut rx);
    assert!(events.contains(&ViewerEvent::RetryOffered {
        kind: ChartKind::Forecast,
        reach_id: ReachId(KNOWN_REACH),
    }));
    assert!(events.contains(&ViewerEvent::RetryOffered {
        kind: ChartKind::Retrospective,
        reach_id: ReachId(KNOWN_REACH),
    }));
    assert!(state.requests().await.is_empty());
}

#[tokio::test]
async fn failed_fetches_mark_status_and_offer_retry() {
    let (session, _state) = session_with(both_charts()).await;
    let mut rx = session.subscribe_events();

    session.select_reach(ReachId(FAILING_REACH)).await;

    let status = session.status().await;
    assert_eq!(status.forecast, LoadState::Fail);
    assert_eq!(status.retro, LoadState::Fail);

    let events = drain(&mut rx);
    assert!(events.contains(&ViewerEvent::RetryOffered {
        kind: ChartKind::Forecast,
        reach_id: ReachId(FAILING_REACH),
    }));
    assert!(events.contains(&ViewerEvent::RetryOffered {
        kind: ChartKind::Retrospective,
        reach_id: ReachId(FAILING_REACH),
    }));
    assert!(!events
        .iter()
        .any(|event| matches!(event, ViewerEvent::ChartReady { .. })));
}

#[tokio::test]
async fn retrospective_without_reach_column_fails() {
    let (session, _state) = session_with(SessionSettings {
        auto_load_forecast: false,
        auto_load_retrospective: true,
    })
    .await;

    session.select_reach(ReachId(MISSING_COLUMN_REACH)).await;
    assert_eq!(session.status().await.retro, LoadState::Fail);
}

#[tokio::test]
async fn loading_without_selected_reach_is_an_error() {
    let (session, state) = session_with(both_charts()).await;
    assert!(matches!(
        session.load_forecast().await,
        Err(ViewerError::NoReachSelected)
    ));
    assert!(matches!(
        session.load_retrospective().await,
        Err(ViewerError::NoReachSelected)
    ));
    assert!(state.requests().await.is_empty());
}

#[tokio::test]
async fn manual_entry_validates_nine_digits() {
    let (session, _state) = session_with(SessionSettings::default()).await;

    assert_eq!(session.enter_reach_id("   ").await.expect("blank"), None);
    assert!(matches!(
        session.enter_reach_id("12345").await,
        Err(ViewerError::InvalidReachId(_))
    ));
    assert_eq!(session.reach_id().await, None);

    let entered = session.enter_reach_id("760021611").await.expect("entry");
    assert_eq!(entered, Some(ReachId(KNOWN_REACH)));
    assert_eq!(session.reach_id().await, Some(ReachId(KNOWN_REACH)));
}

#[tokio::test]
async fn changing_forecast_date_reloads_forecast() {
    let (session, state) = session_with(SessionSettings {
        auto_load_forecast: false,
        auto_load_retrospective: false,
    })
    .await;
    let date = NaiveDate::from_ymd_opt(2024, 3, 1).expect("date");

    session.set_forecast_date(date).await.expect("date without reach");
    assert!(state.requests().await.is_empty());

    session.select_reach(ReachId(KNOWN_REACH)).await;
    session
        .set_forecast_date(NaiveDate::from_ymd_opt(2024, 3, 2).expect("date"))
        .await
        .expect("date with reach");

    let requests = state.requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].query.get("date").map(String::as_str), Some("20240302"));

    let too_new = NaiveDate::from_ymd_opt(2024, 3, 10).expect("date");
    assert!(matches!(
        session.set_forecast_date(too_new).await,
        Err(ViewerError::DateOutOfRange { .. })
    ));
    assert_eq!(
        session.forecast_date().await,
        NaiveDate::from_ymd_opt(2024, 3, 2).expect("date")
    );
}

#[tokio::test]
async fn click_below_query_zoom_only_zooms_in() {
    let (session, _state) = session_with(SessionSettings::default()).await;
    let mut rx = session.subscribe_events();
    let identifier = FakeIdentifier::new(IdentifyReply::Reach(KNOWN_REACH));
    let layer = LayerLoadState::new();
    layer.mark_loaded();

    let point = LatLng::new(45.0, 10.0);
    let outcome = session
        .handle_map_click(MapClick { point, zoom: 5 }, &identifier, &layer)
        .await;

    assert_eq!(outcome, ClickOutcome::ZoomedIn);
    assert_eq!(identifier.query_count(), 0);
    assert_eq!(
        drain(&mut rx),
        vec![ViewerEvent::FlyTo {
            center: point,
            zoom: MIN_QUERY_ZOOM,
        }]
    );
}

#[tokio::test]
async fn click_resolves_reach_and_selects_it() {
    let (session, _state) = session_with(SessionSettings::default()).await;
    let mut rx = session.subscribe_events();
    let identifier = FakeIdentifier::new(IdentifyReply::Reach(KNOWN_REACH));
    let layer = LayerLoadState::new();
    layer.mark_loaded();

    let outcome = session
        .handle_map_click(
            MapClick {
                point: LatLng::new(45.0, 10.0),
                zoom: 13,
            },
            &identifier,
            &layer,
        )
        .await;

    assert_eq!(outcome, ClickOutcome::Resolved(ReachId(KNOWN_REACH)));
    assert_eq!(session.reach_id().await, Some(ReachId(KNOWN_REACH)));

    let events = drain(&mut rx);
    assert!(events.contains(&ViewerEvent::Toast(TOAST_IDENTIFYING.to_string())));
    assert!(events.iter().any(|event| matches!(
        event,
        ViewerEvent::SegmentSelected { reach_id, .. } if *reach_id == ReachId(KNOWN_REACH)
    )));
    let rendered = statuses(&events);
    assert_eq!(
        rendered.first().map(String::as_str),
        Some("River ID: Identifying - Forecast: none - Retrospective: none")
    );
}

#[tokio::test]
async fn click_waits_for_streaming_layer_to_load() {
    let (session, _state) = session_with(SessionSettings {
        auto_load_forecast: false,
        auto_load_retrospective: false,
    })
    .await;
    let session = std::sync::Arc::new(session);
    let identifier = std::sync::Arc::new(FakeIdentifier::new(IdentifyReply::Reach(KNOWN_REACH)));
    let layer = LayerLoadState::new();
    let mut rx = session.subscribe_events();

    let click = {
        let session = session.clone();
        let identifier = identifier.clone();
        let layer = layer.clone();
        tokio::spawn(async move {
            session
                .handle_map_click(
                    MapClick {
                        point: LatLng::new(45.0, 10.0),
                        zoom: 14,
                    },
                    identifier.as_ref(),
                    &layer,
                )
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(identifier.query_count(), 0);
    assert!(drain(&mut rx).contains(&ViewerEvent::Toast(TOAST_LAYER_LOADING.to_string())));

    layer.mark_loaded();
    let outcome = tokio::time::timeout(Duration::from_secs(2), click)
        .await
        .expect("click finished")
        .expect("join");
    assert_eq!(outcome, ClickOutcome::Resolved(ReachId(KNOWN_REACH)));
    assert_eq!(identifier.query_count(), 1);
}

#[tokio::test]
async fn failed_or_empty_identify_marks_reach_failed() {
    let (session, _state) = session_with(SessionSettings::default()).await;
    let layer = LayerLoadState::new();
    layer.mark_loaded();
    let click = MapClick {
        point: LatLng::new(45.0, 10.0),
        zoom: 12,
    };

    let mut rx = session.subscribe_events();
    let failing = FakeIdentifier::new(IdentifyReply::Fail);
    assert_eq!(
        session.handle_map_click(click, &failing, &layer).await,
        ClickOutcome::QueryFailed
    );
    assert_eq!(session.status().await.reach_id, LoadState::Fail);
    assert!(drain(&mut rx).contains(&ViewerEvent::Toast(TOAST_QUERY_FAILED.to_string())));

    let empty = FakeIdentifier::new(IdentifyReply::Nothing);
    assert_eq!(
        session.handle_map_click(click, &empty, &layer).await,
        ClickOutcome::NotFound
    );
    assert_eq!(session.status().await.reach_id, LoadState::Fail);
    assert!(drain(&mut rx).contains(&ViewerEvent::Toast(
        "River not found. Try to zoom in and be precise when clicking the stream.".to_string()
    )));
    assert_eq!(session.reach_id().await, None);
}
