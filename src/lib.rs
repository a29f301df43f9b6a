//! Shibboleth SP helpers for applications behind `shibd`.
//!
//! The SP module in the web server performs the SAML exchange and forwards
//! the session as request headers (or CGI environment variables). This crate
//! turns those into session checks, attribute maps and login/logout
//! redirect URLs for the SP handler.
//!
//! ```
//! use axum::http::HeaderMap;
//! use shibgate::auth::{LoginOptions, LogoutOptions, RequestInfo, ShibAuthenticator};
//!
//! let request = RequestInfo::new("example.com", "/", HeaderMap::new());
//! let auth = ShibAuthenticator::new(request, LoginOptions::default(), LogoutOptions::default());
//!
//! assert!(!auth.has_session());
//! assert_eq!(
//!     auth.build_login_url(None),
//!     "https://example.com/Shibboleth.sso/Login?target=https%3A%2F%2Fexample.com%2F"
//! );
//! ```

pub mod auth;
pub mod config;
pub mod middleware;
pub mod observability;

pub use auth::{AuthError, ShibAuthenticator};
pub use config::{ConfigError, ShibgateConfig};
pub use middleware::{ShibSession, shib_session_middleware};
