//! Internal error types for apisync-registry.

use thiserror::Error;

/// Result type alias for apisync-registry operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Internal error type for apisync-registry operations.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed or returned a non-success status.
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),
    /// A URL could not be parsed or extended.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
    /// The configuration was rejected.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<Error> for apisync_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Reqwest(e) => {
                let message = match e.status() {
                    Some(status) if status == reqwest::StatusCode::NOT_FOUND => {
                        "Artifact version not found".to_owned()
                    }
                    Some(status) => format!("Registry responded with {status}"),
                    None if e.is_timeout() => "Registry request timed out".to_owned(),
                    None if e.is_connect() => "Connection to registry failed".to_owned(),
                    None => e.to_string(),
                };
                let context = e.url().map(ToString::to_string);

                let error = apisync_core::Error::fetch()
                    .with_message(message)
                    .with_source(e);
                match context {
                    Some(url) => error.with_context(url),
                    None => error,
                }
            }
            Error::Url(e) => apisync_core::Error::configuration()
                .with_message(e.to_string())
                .with_source(e),
            Error::InvalidConfig(reason) => {
                apisync_core::Error::configuration().with_message(reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use apisync_core::ErrorKind;

    use super::*;

    #[test]
    fn test_config_errors_are_configuration_errors() {
        let error: apisync_core::Error = Error::InvalidConfig("bad scheme".into()).into();
        assert_eq!(error.kind, ErrorKind::Configuration);

        let parse = url::Url::parse("not a url").unwrap_err();
        let error: apisync_core::Error = Error::Url(parse).into();
        assert_eq!(error.kind, ErrorKind::Configuration);
    }
}
