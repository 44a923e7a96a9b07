// Error taxonomy for the impact simulator
// Everything is rejected at the boundary; the physics core itself is total.

#[derive(thiserror::Error, Debug)]
pub enum SimError {
    #[error("invalid input for `{field}`: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("missing reference data: {0}")]
    MissingReferenceData(String),

    #[error(
        "mitigation `{method}` not applicable at {energy_megatons:.3} MT \
         (limit {max_energy_megatons} MT)"
    )]
    MitigationNotApplicable {
        method: String,
        energy_megatons: f64,
        max_energy_megatons: f64,
    },

    #[error("API error: {0}")]
    Api(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("embedded catalog is corrupt: {0}")]
    Catalog(#[from] serde_json::Error),
}

impl SimError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        SimError::InvalidInput {
            field,
            reason: reason.into(),
        }
    }
}

impl From<reqwest::Error> for SimError {
    fn from(e: reqwest::Error) -> Self {
        SimError::Api(format!("Request failed: {}", e))
    }
}

pub type SimResult<T> = Result<T, SimError>;
