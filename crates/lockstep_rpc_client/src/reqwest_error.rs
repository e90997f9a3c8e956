use core::fmt;

/// A [`reqwest::Error`] without its URL, as the URL of a remote node commonly
/// contains an API key.
#[derive(Debug)]
pub struct ReqwestError(reqwest::Error);

impl From<reqwest::Error> for ReqwestError {
    fn from(error: reqwest::Error) -> Self {
        Self(error.without_url())
    }
}

impl From<ReqwestError> for reqwest::Error {
    fn from(error: ReqwestError) -> Self {
        error.0
    }
}

impl fmt::Display for ReqwestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ReqwestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.0)
    }
}

/// A [`reqwest_middleware::Error`] without its URL.
#[derive(Debug)]
pub struct MiddlewareError(reqwest_middleware::Error);

impl From<reqwest_middleware::Error> for MiddlewareError {
    fn from(error: reqwest_middleware::Error) -> Self {
        match error {
            reqwest_middleware::Error::Middleware(error) => {
                Self(reqwest_middleware::Error::Middleware(error))
            }
            reqwest_middleware::Error::Reqwest(error) => {
                Self(reqwest_middleware::Error::Reqwest(error.without_url()))
            }
        }
    }
}

impl From<MiddlewareError> for reqwest_middleware::Error {
    fn from(error: MiddlewareError) -> Self {
        error.0
    }
}

impl fmt::Display for MiddlewareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for MiddlewareError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.0)
    }
}
