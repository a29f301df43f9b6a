use axum::http::{HeaderMap, Uri, header, request::Parts};

/// The parts of an inbound request the authenticator reads.
///
/// Header names in an `http::HeaderMap` are always lower-case, which is
/// what attribute-name normalization relies on.
#[derive(Debug, Clone, Default)]
pub struct RequestInfo {
    /// Host name (and port, if any) the client addressed.
    pub host: String,
    /// Path and query of the request.
    pub path: String,
    pub headers: HeaderMap,
}

impl RequestInfo {
    pub fn new(host: impl Into<String>, path: impl Into<String>, headers: HeaderMap) -> Self {
        Self {
            host: host.into(),
            path: path.into(),
            headers,
        }
    }

    /// Build from request parts.
    ///
    /// The host comes from the `Host` header, falling back to the URI authority.
    pub fn from_parts(parts: &Parts) -> Self {
        Self::from_uri_and_headers(&parts.uri, &parts.headers)
    }

    pub fn from_uri_and_headers(uri: &Uri, headers: &HeaderMap) -> Self {
        let host = headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .or_else(|| uri.authority().map(|a| a.to_string()))
            .unwrap_or_default();
        if host.is_empty() {
            tracing::warn!(uri = %uri, "Request has no Host header or URI authority");
        }

        let path = uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/".to_string());

        Self {
            host,
            path,
            headers: headers.clone(),
        }
    }

    /// Whether a host is known, i.e. absolute login/logout URLs can be built.
    pub fn has_host(&self) -> bool {
        !self.host.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    #[test]
    fn test_from_parts_uses_host_header() {
        let (parts, _) = Request::builder()
            .uri("/courses?term=fall")
            .header("Host", "app.umn.edu")
            .header("Shib-Identity-Provider", "urn:idp")
            .body(())
            .unwrap()
            .into_parts();

        let info = RequestInfo::from_parts(&parts);

        assert_eq!(info.host, "app.umn.edu");
        assert_eq!(info.path, "/courses?term=fall");
        assert_eq!(info.headers.get("shib-identity-provider").unwrap(), "urn:idp");
    }

    #[test]
    fn test_from_parts_falls_back_to_authority() {
        let (parts, _) = Request::builder()
            .uri("https://fallback.umn.edu:8443/")
            .body(())
            .unwrap()
            .into_parts();

        let info = RequestInfo::from_parts(&parts);

        assert_eq!(info.host, "fallback.umn.edu:8443");
        assert_eq!(info.path, "/");
    }

    #[test]
    fn test_from_parts_without_host() {
        let (parts, _) = Request::builder()
            .uri("/courses")
            .body(())
            .unwrap()
            .into_parts();

        let info = RequestInfo::from_parts(&parts);

        assert!(!info.has_host());
        assert_eq!(info.path, "/courses");
        assert!(RequestInfo::new("app.umn.edu", "/", HeaderMap::new()).has_host());
    }
}
