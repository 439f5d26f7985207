//! Error types for the lookup tool

use std::fmt;

#[derive(Debug)]
pub enum LookupError {
    Census(ps2_census::Error),
    Ess(ess_client::EssError),
    Config(String),
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupError::Census(err) => write!(f, "Census error: {}", err),
            LookupError::Ess(err) => write!(f, "Event stream error: {}", err),
            LookupError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for LookupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LookupError::Census(err) => Some(err),
            LookupError::Ess(err) => Some(err),
            LookupError::Config(_) => None,
        }
    }
}

impl From<ps2_census::Error> for LookupError {
    fn from(err: ps2_census::Error) -> Self {
        LookupError::Census(err)
    }
}

impl From<ess_client::EssError> for LookupError {
    fn from(err: ess_client::EssError) -> Self {
        LookupError::Ess(err)
    }
}

impl From<tracing_subscriber::filter::ParseError> for LookupError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        LookupError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LookupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = LookupError::Config("CHARACTER_CACHE_SIZE must be a number".to_string());
        assert_eq!(
            format!("{}", err),
            "Configuration error: CHARACTER_CACHE_SIZE must be a number"
        );
    }

    #[test]
    fn test_census_error_source() {
        let err: LookupError = ps2_census::Error::InvalidRequest("empty name".to_string()).into();
        assert!(format!("{}", err).starts_with("Census error:"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_ess_error_source_chain() {
        let err: LookupError = ess_client::EssError::Subscribe {
            trigger: "deaths".to_string(),
            reason: "bad key".to_string(),
        }
        .into();
        assert!(matches!(err, LookupError::Ess(_)));
        assert_eq!(
            format!("{}", err),
            "Event stream error: Cannot encode subscription for trigger deaths: bad key"
        );

        let source = std::error::Error::source(&err).unwrap();
        let ess = source.downcast_ref::<ess_client::EssError>().unwrap();
        assert!(!ess.is_retryable());
    }
}
