//! Domain error types.

/// Top-level error type for genetrader.
#[derive(Debug, thiserror::Error)]
pub enum GenetraderError {
    #[error("catalog must register at least one indicator")]
    EmptyCatalog,

    #[error("duplicate indicator name in catalog: {name}")]
    DuplicateIndicator { name: String },

    #[error("chromosome has {actual} slots, catalog has {expected}")]
    SlotCountMismatch { expected: usize, actual: usize },

    #[error("slot {slot} ({indicator}) expects {expected} parameters, got {actual}")]
    ParameterKindMismatch {
        slot: usize,
        indicator: String,
        expected: String,
        actual: String,
    },

    #[error("invalid parameter {param} for {indicator}: {reason}")]
    InvalidParameter {
        indicator: String,
        param: String,
        reason: String,
    },

    #[error("gene array {genes} has length {actual}, expected {expected}")]
    GeneCountMismatch {
        genes: String,
        expected: usize,
        actual: usize,
    },

    #[error("mutation probability must be within [0, 1], got {0}")]
    InvalidProbability(f64),

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("no data for market {market}")]
    NoData { market: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl GenetraderError {
    pub(crate) fn invalid_parameter(
        indicator: &str,
        param: &str,
        reason: impl Into<String>,
    ) -> Self {
        GenetraderError::InvalidParameter {
            indicator: indicator.to_string(),
            param: param.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn config_invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        GenetraderError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&GenetraderError> for std::process::ExitCode {
    fn from(err: &GenetraderError) -> Self {
        let code: u8 = match err {
            GenetraderError::Io(_) => 1,
            GenetraderError::ConfigParse { .. }
            | GenetraderError::ConfigMissing { .. }
            | GenetraderError::ConfigInvalid { .. } => 2,
            GenetraderError::Data { .. } | GenetraderError::NoData { .. } => 3,
            GenetraderError::EmptyCatalog
            | GenetraderError::DuplicateIndicator { .. }
            | GenetraderError::SlotCountMismatch { .. }
            | GenetraderError::ParameterKindMismatch { .. }
            | GenetraderError::InvalidParameter { .. }
            | GenetraderError::GeneCountMismatch { .. }
            | GenetraderError::InvalidProbability(_) => 4,
            GenetraderError::Json(_) => 5,
        };
        std::process::ExitCode::from(code)
    }
}
