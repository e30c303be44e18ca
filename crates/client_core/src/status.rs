use shared::domain::{LoadState, ReachId};

/// Progress of the three requests that follow a map click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadingStatus {
    pub reach_id: LoadState,
    pub forecast: LoadState,
    pub retro: LoadState,
}

/// Partial status change; `None` slots are left as they are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusUpdate {
    pub reach_id: Option<LoadState>,
    pub forecast: Option<LoadState>,
    pub retro: Option<LoadState>,
}

impl StatusUpdate {
    pub fn reach_id(state: LoadState) -> Self {
        Self {
            reach_id: Some(state),
            ..Self::default()
        }
    }

    pub fn forecast(state: LoadState) -> Self {
        Self {
            forecast: Some(state),
            ..Self::default()
        }
    }

    pub fn retro(state: LoadState) -> Self {
        Self {
            retro: Some(state),
            ..Self::default()
        }
    }

    pub fn all(reach_id: LoadState, forecast: LoadState, retro: LoadState) -> Self {
        Self {
            reach_id: Some(reach_id),
            forecast: Some(forecast),
            retro: Some(retro),
        }
    }
}

impl LoadingStatus {
    pub fn apply(&mut self, update: StatusUpdate) {
        if let Some(state) = update.reach_id {
            self.reach_id = state;
        }
        if let Some(state) = update.forecast {
            self.forecast = state;
        }
        if let Some(state) = update.retro {
            self.retro = state;
        }
    }

    pub fn render(&self, reach_id: Option<ReachId>) -> String {
        let reach = match self.reach_id {
            LoadState::Load => "Identifying".to_string(),
            LoadState::Ready => reach_id.map_or_else(|| "none".to_string(), |id| id.to_string()),
            other => slot_message(other).to_string(),
        };
        format!(
            "River ID: {reach} - Forecast: {} - Retrospective: {}",
            slot_message(self.forecast),
            slot_message(self.retro)
        )
    }
}

fn slot_message(state: LoadState) -> &'static str {
    match state {
        LoadState::Load => "Loading",
        LoadState::Ready => "Ready",
        LoadState::Fail => "Failed",
        LoadState::Clear => "none",
    }
}
