//! Terminal stand-ins for the map page's layer and label widgets.

use animation::{LabelSink, StreamingLayer};
use chrono::{DateTime, Utc};
use tracing::info;

/// Logs every time range the streaming layer is asked to show.
pub struct ConsoleLayer {
    url: String,
}

impl ConsoleLayer {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl StreamingLayer for ConsoleLayer {
    fn set_time_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) {
        info!(
            layer = %self.url,
            from = %start.to_rfc3339(),
            to = %end.to_rfc3339(),
            "stream layer time range"
        );
    }
}

pub struct ConsoleLabel;

impl LabelSink for ConsoleLabel {
    fn show_label(&self, label: &str) {
        println!("{label}");
    }
}
