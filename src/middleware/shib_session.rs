//! Shibboleth session middleware.
//!
//! Protects routes by requiring a live Shibboleth session. Browsers without
//! one are redirected to the SP login handler; XHR/API callers get a 401 with
//! the login URL so the frontend can navigate there itself.
//!
//! **Security:** attribute headers are trusted as-is. The web server in front
//! of the application must strip client-supplied copies of them (mod_shib does
//! this with `ShibUseHeaders` when the SP is configured correctly).

use std::sync::Arc;

use axum::{
    Json,
    extract::{OriginalUri, Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    auth::{Attributes, AuthError, RequestInfo, ShibAuthenticator},
    config::ShibgateConfig,
};

/// Session details inserted into request extensions for downstream handlers.
#[derive(Debug, Clone)]
pub struct ShibSession {
    /// Default plus configured attributes.
    pub attributes: Attributes,
    /// IdP that authenticated the user.
    pub idp_entity_id: Option<String>,
    /// When the user authenticated at the IdP, if shibd reported it.
    pub logged_in_since: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct LoginRequiredBody {
    code: &'static str,
    message: &'static str,
    login_url: String,
}

/// Middleware that requires a Shibboleth session.
///
/// Install with `axum::middleware::from_fn_with_state(config, shib_session_middleware)`.
pub async fn shib_session_middleware(
    State(config): State<Arc<ShibgateConfig>>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    // Nested routers strip their prefix from `req.uri()`; the login target
    // must be the URL the client actually requested.
    let uri = req
        .extensions()
        .get::<OriginalUri>()
        .map(|original| original.0.clone())
        .unwrap_or_else(|| req.uri().clone());
    let request = RequestInfo::from_uri_and_headers(&uri, req.headers());
    if !request.has_host() {
        return Err(
            AuthError::InvalidArgument("request has no Host header".to_string()).into_response(),
        );
    }
    let is_xhr = is_xhr_request(req.headers());
    let auth = ShibAuthenticator::from_config(request, &config.sso);

    let attributes = match auth.attributes_or_request_login(
        None,
        &config.sso.requested_attributes,
        Some(config.sso.session_max_age_secs),
    ) {
        Ok(attributes) => attributes,
        Err(AuthError::LoginRequired { redirect_url }) => {
            tracing::info!(
                path = %uri.path(),
                has_session = auth.has_session(),
                xhr = is_xhr,
                "Shibboleth login required"
            );
            if is_xhr {
                let body = LoginRequiredBody {
                    code: "login_required",
                    message: "Shibboleth login required",
                    login_url: redirect_url,
                };
                return Err((StatusCode::UNAUTHORIZED, Json(body)).into_response());
            }
            return Err(AuthError::LoginRequired { redirect_url }.into_response());
        }
        Err(e) => return Err(e.into_response()),
    };

    tracing::debug!(
        idp = ?auth.idp_entity_id(),
        uid = ?attributes.get("uid"),
        "Shibboleth session accepted"
    );

    req.extensions_mut().insert(ShibSession {
        attributes,
        idp_entity_id: auth.idp_entity_id(),
        logged_in_since: auth.logged_in_since(),
    });

    Ok(next.run(req).await)
}

/// Check if the request is an XHR/API request (as opposed to a browser navigation).
/// XHR requests should receive 401 responses, not redirects, to avoid CORS issues.
fn is_xhr_request(headers: &axum::http::HeaderMap) -> bool {
    if headers
        .get("x-requested-with")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("xmlhttprequest"))
    {
        return true;
    }

    // If Accept explicitly requests JSON and doesn't include text/html, it's an API request
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("application/json") && !accept.contains("text/html"))
}
