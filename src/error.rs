use reqwest::StatusCode;

/// Failure talking to the Plex catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Unauthorized: check the Plex token")]
    Unauthorized,
    #[error("Plex responded with {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("Failed to send http request: {0}")]
    Connection(#[source] reqwest::Error),
    #[error("Failed to parse response: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("Invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Unexpected response: {0}")]
    Unexpected(String),
}

impl CatalogError {
    /// Build the error for a non-success response.
    pub fn from_status(status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::BAD_REQUEST => CatalogError::BadRequest(body),
            StatusCode::NOT_FOUND => CatalogError::NotFound(body),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CatalogError::Unauthorized,
            status => CatalogError::Status { status, body },
        }
    }

    /// The "bad request / not found" class: the query yields nothing.
    pub fn is_missing(&self) -> bool {
        matches!(self, CatalogError::BadRequest(_) | CatalogError::NotFound(_))
    }

    /// Failures that are worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            CatalogError::Connection(_) => true,
            CatalogError::Status { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }
}

/// A search hit that lacks the metadata needed to judge it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CandidateError {
    #[error("Candidate {rating_key} has no {field}")]
    MissingField {
        field: &'static str,
        rating_key: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            CatalogError::from_status(StatusCode::BAD_REQUEST, "x".into()),
            CatalogError::BadRequest(_)
        ));
        assert!(matches!(
            CatalogError::from_status(StatusCode::NOT_FOUND, "x".into()),
            CatalogError::NotFound(_)
        ));
        assert!(matches!(
            CatalogError::from_status(StatusCode::FORBIDDEN, "x".into()),
            CatalogError::Unauthorized
        ));
        assert!(matches!(
            CatalogError::from_status(StatusCode::BAD_GATEWAY, "x".into()),
            CatalogError::Status { .. }
        ));
    }

    #[test]
    fn test_classification() {
        assert!(CatalogError::BadRequest(String::new()).is_missing());
        assert!(CatalogError::NotFound(String::new()).is_missing());
        assert!(!CatalogError::Unauthorized.is_missing());

        let unavailable = CatalogError::from_status(StatusCode::SERVICE_UNAVAILABLE, String::new());
        assert!(unavailable.is_transient());
        let throttled = CatalogError::from_status(StatusCode::TOO_MANY_REQUESTS, String::new());
        assert!(throttled.is_transient());
        assert!(!CatalogError::NotFound(String::new()).is_transient());
        assert!(!CatalogError::Unauthorized.is_transient());
    }
}
