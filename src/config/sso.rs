use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::auth::{
    AttributeSource, LoginOptions, LogoutOptions,
    constants::{SP_HANDLER_URL, UMN_SESSION_MAX_AGE},
};

/// Shibboleth SP integration settings.
///
/// These are the per-application defaults; callers can still override login
/// and logout options on each call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SsoConfig {
    /// Path of the SP handler (the `handlerURL` of the `<Sessions>` element in
    /// shibboleth2.xml).
    #[serde(default = "default_handler_url")]
    pub handler_url: String,

    /// Where shibd exposes attributes: request headers or the process environment.
    #[serde(default)]
    pub attribute_source: AttributeSource,

    /// Maximum session age in seconds before users are sent back to the IdP
    /// with `forceAuthn`.
    #[serde(default = "default_session_max_age")]
    pub session_max_age_secs: u64,

    /// Attributes to resolve on top of the defaults (uid, eppn, isGuest, umnDID).
    #[serde(default)]
    pub requested_attributes: Vec<String>,

    /// Base login options.
    #[serde(default)]
    pub login: LoginOptions,

    /// Base logout options. Unset fields fall back to logging out of the
    /// production IdP.
    #[serde(default)]
    pub logout: LogoutOptions,
}

impl Default for SsoConfig {
    fn default() -> Self {
        Self {
            handler_url: default_handler_url(),
            attribute_source: AttributeSource::default(),
            session_max_age_secs: default_session_max_age(),
            requested_attributes: Vec::new(),
            login: LoginOptions::default(),
            logout: LogoutOptions::default(),
        }
    }
}

impl SsoConfig {
    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        if !self.handler_url.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "sso.handler_url must be an absolute path starting with '/', got '{}'",
                self.handler_url
            )));
        }
        if self.handler_url.len() > 1 && self.handler_url.ends_with('/') {
            return Err(ConfigError::Validation(format!(
                "sso.handler_url must not end with '/', got '{}'",
                self.handler_url
            )));
        }
        if self.session_max_age_secs == 0 {
            return Err(ConfigError::Validation(
                "sso.session_max_age_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

fn default_handler_url() -> String {
    SP_HANDLER_URL.to_string()
}

fn default_session_max_age() -> u64 {
    UMN_SESSION_MAX_AGE
}
