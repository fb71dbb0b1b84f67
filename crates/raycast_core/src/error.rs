use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("ray cast needs at least one of on_hit / on_miss")]
    NoCallbacks,

    #[error("non-finite coordinate in {field}")]
    NonFinitePoint { field: &'static str },

    #[error("start and end use different point representations")]
    MixedRepresentation,

    #[error("unsupported point value: {type_name}")]
    UnsupportedPoint { type_name: String },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

impl ConfigurationError {
    /// Errors caused by the calling script rather than by loaded data.
    pub fn is_programmer_error(&self) -> bool {
        match self {
            ConfigurationError::NoCallbacks => true,
            ConfigurationError::MixedRepresentation => true,
            ConfigurationError::UnsupportedPoint { .. } => true,
            ConfigurationError::NonFinitePoint { .. } => true,
            ConfigurationError::InvalidConfig(_) => false,
        }
    }
}

impl From<serde_json::Error> for ConfigurationError {
    fn from(err: serde_json::Error) -> Self {
        ConfigurationError::InvalidConfig(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ConfigurationError>;
