use chrono::NaiveDate;
use shared::{domain::ReachId, error::ReachIdError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error(transparent)]
    InvalidReachId(#[from] ReachIdError),
    #[error("River not found. Try to zoom in and be precise when clicking the stream.")]
    ReachNotFound,
    #[error("identify query failed: {0}")]
    Identify(String),
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("retrospective response has no flow column for river {0}")]
    MissingColumn(ReachId),
    #[error("forecast date {date} is outside {min}..={max}")]
    DateOutOfRange {
        date: NaiveDate,
        min: NaiveDate,
        max: NaiveDate,
    },
    #[error("no river selected")]
    NoReachSelected,
    #[error("invalid API endpoint '{0}'")]
    InvalidEndpoint(String),
}
