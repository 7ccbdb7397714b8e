use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrbitError {
    #[error("invalid tle format: expected a name line and two element lines, got {0} lines")]
    InvalidTleFormat(usize),
    #[error("invalid tle: {0}")]
    InvalidTle(#[from] sgp4::TleError),
    #[error("elements error: {0}")]
    Elements(#[from] sgp4::ElementsError),
    #[error("propagation error: {0}")]
    Propagation(String),
}

impl From<sgp4::Error> for OrbitError {
    fn from(err: sgp4::Error) -> Self {
        OrbitError::Propagation(err.to_string())
    }
}
