use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReachIdError {
    #[error("no river id entered")]
    Empty,
    #[error("River ID numbers should be 9 digit numbers (got '{0}')")]
    NotNineDigits(String),
}
