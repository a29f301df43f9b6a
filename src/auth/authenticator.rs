//! Request-scoped view of a Shibboleth SP session.
//!
//! shibd and its web-server module do the SAML exchange and pass the result
//! to the application as request headers (or CGI environment variables).
//! [`ShibAuthenticator`] reads those values for one request and answers:
//!
//! - is there a session, and is it older than the allowed maximum age?
//! - which attributes did the IdP release?
//! - where should the browser go to log in or out?
//!
//! Nothing here is stored between requests; build one authenticator per request.

use axum::response::Response;
use chrono::{DateTime, Utc};
use url::form_urlencoded;

use super::{
    AuthError,
    attributes::{AttributeSource, Attributes},
    constants::{
        AUTHN_INSTANT_ATTRIBUTE, AUTHN_METHOD_ATTRIBUTE, DEFAULT_ATTRIBUTE_NAMES,
        DEFAULT_VALUE_DELIMITER, IDP_ENTITY_ID_ATTRIBUTE, RECOGNIZED_IDP_ENTITY_IDS,
        SP_HANDLER_URL, UMN_DUO_AUTHN_CONTEXT, UMN_IDP_LOGOUT_URL, UMN_MKEY_AUTHN_CONTEXT,
        UMN_SESSION_MAX_AGE,
    },
    error::found,
    options::{LoginOptions, LogoutOptions},
    request::RequestInfo,
};
use crate::config::SsoConfig;

/// Shibboleth session and attribute access for a single request.
#[derive(Debug, Clone)]
pub struct ShibAuthenticator {
    request: RequestInfo,
    login_options: LoginOptions,
    logout_options: LogoutOptions,
    handler_url: String,
    attribute_source: AttributeSource,
    default_attribute_names: Vec<String>,
}

impl ShibAuthenticator {
    /// Create an authenticator with base login/logout options.
    ///
    /// Logout options are layered over the SP defaults (`logout_from_idp = true`,
    /// production IdP logout page), so unset fields keep those defaults.
    pub fn new(
        request: RequestInfo,
        login_options: LoginOptions,
        logout_options: LogoutOptions,
    ) -> Self {
        Self {
            request,
            login_options,
            logout_options: LogoutOptions::sp_defaults().merge(&logout_options),
            handler_url: SP_HANDLER_URL.to_string(),
            attribute_source: AttributeSource::default(),
            default_attribute_names: DEFAULT_ATTRIBUTE_NAMES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Create an authenticator from the `[sso]` configuration section.
    pub fn from_config(request: RequestInfo, config: &SsoConfig) -> Self {
        let mut auth = Self::new(request, config.login.clone(), config.logout.clone());
        auth.handler_url = config.handler_url.clone();
        auth.attribute_source = config.attribute_source;
        auth
    }

    pub fn request(&self) -> &RequestInfo {
        &self.request
    }

    pub fn login_options(&self) -> &LoginOptions {
        &self.login_options
    }

    pub fn logout_options(&self) -> &LogoutOptions {
        &self.logout_options
    }

    pub fn handler_url(&self) -> &str {
        &self.handler_url
    }

    pub fn set_handler_url(&mut self, handler_url: impl Into<String>) {
        self.handler_url = handler_url.into();
    }

    // ========== Login / logout URLs ==========

    /// URL of the SP login handler for this request.
    ///
    /// `options` are merged over the authenticator's base login options.
    /// `mkey` and `duo` set `authnContextClassRef`; `duo` is applied last and wins.
    pub fn build_login_url(&self, options: Option<&LoginOptions>) -> String {
        let options = match options {
            Some(o) => self.login_options.merge(o),
            None => self.login_options.clone(),
        };

        let target = options
            .target
            .clone()
            .unwrap_or_else(|| format!("https://{}{}", self.request.host, self.request.path));

        let mut authn_context_class_ref = options.authn_context_class_ref.clone();
        if options.mkey == Some(true) {
            authn_context_class_ref = Some(UMN_MKEY_AUTHN_CONTEXT.to_string());
        }
        if options.duo == Some(true) {
            authn_context_class_ref = Some(UMN_DUO_AUTHN_CONTEXT.to_string());
        }

        let mut params = form_urlencoded::Serializer::new(String::new());
        params.append_pair("target", &target);
        if let Some(force_authn) = options.force_authn {
            params.append_pair("forceAuthn", bool_param(force_authn));
        }
        if let Some(entity_id) = &options.entity_id {
            params.append_pair("entityID", entity_id);
        }
        if let Some(class_ref) = &authn_context_class_ref {
            params.append_pair("authnContextClassRef", class_ref);
        }
        if let Some(passive) = options.passive {
            params.append_pair("isPassive", bool_param(passive));
        }

        let url = format!(
            "https://{}{}/Login?{}",
            self.request.host,
            self.handler_url,
            params.finish()
        );

        tracing::debug!(
            login_url = %url,
            authn_context = ?authn_context_class_ref,
            "Built Shibboleth login URL"
        );

        url
    }

    /// URL of the SP logout handler for this request.
    ///
    /// With `logout_from_idp` the SP returns to the IdP logout page. A `return`
    /// option is then attached to the IdP page as its own `return` parameter,
    /// percent-encoded before the whole value is form-encoded again, so the
    /// IdP receives it still encoded.
    pub fn build_logout_url(&self, options: Option<&LogoutOptions>) -> String {
        let options = match options {
            Some(o) => self.logout_options.merge(o),
            None => self.logout_options.clone(),
        };

        let mut params = form_urlencoded::Serializer::new(String::new());
        if options.logout_from_idp.unwrap_or(true) {
            let mut return_url = options
                .idp_logout_url
                .clone()
                .unwrap_or_else(|| UMN_IDP_LOGOUT_URL.to_string());
            if let Some(after_idp) = &options.return_url {
                return_url.push_str("?return=");
                return_url.push_str(&urlencoding::encode(after_idp));
            }
            params.append_pair("return", &return_url);
        } else if let Some(return_url) = &options.return_url {
            params.append_pair("return", return_url);
        }

        let url = format!(
            "https://{}{}/Logout?{}",
            self.request.host,
            self.handler_url,
            params.finish()
        );

        tracing::debug!(logout_url = %url, "Built Shibboleth logout URL");

        url
    }

    /// `302 Found` to the login URL.
    pub fn redirect_to_login(&self, options: Option<&LoginOptions>) -> Response {
        found(&self.build_login_url(options))
    }

    /// `302 Found` to the logout URL.
    pub fn redirect_to_logout(&self, options: Option<&LogoutOptions>) -> Response {
        found(&self.build_logout_url(options))
    }

    // ========== Session ==========

    /// Whether the request carries a session from one of the recognized IdPs.
    pub fn has_session(&self) -> bool {
        self.idp_entity_id()
            .is_some_and(|id| RECOGNIZED_IDP_ENTITY_IDS.contains(&id.as_str()))
    }

    /// Whether the session is older than `max_age` seconds (default 3 hours).
    ///
    /// No session counts as timed out. A session without a readable
    /// authentication instant does not.
    pub fn has_session_timed_out(&self, max_age: Option<u64>) -> bool {
        self.has_session_timed_out_at(max_age, Utc::now())
    }

    /// [`has_session_timed_out`](Self::has_session_timed_out) against an explicit clock.
    pub fn has_session_timed_out_at(&self, max_age: Option<u64>, now: DateTime<Utc>) -> bool {
        if !self.has_session() {
            return true;
        }

        let Some(auth_instant) = self.logged_in_since() else {
            return false;
        };

        let max_age = i64::try_from(max_age.unwrap_or(UMN_SESSION_MAX_AGE)).unwrap_or(i64::MAX);
        auth_instant.timestamp().saturating_add(max_age) <= now.timestamp()
    }

    pub fn logged_in_with_mkey(&self) -> bool {
        self.logged_in_with(UMN_MKEY_AUTHN_CONTEXT)
    }

    pub fn logged_in_with_duo(&self) -> bool {
        self.logged_in_with(UMN_DUO_AUTHN_CONTEXT)
    }

    fn logged_in_with(&self, authn_context: &str) -> bool {
        self.has_session()
            && self.attribute_value(AUTHN_METHOD_ATTRIBUTE).as_deref() == Some(authn_context)
    }

    /// When the user authenticated at the IdP.
    ///
    /// Returns `None` when the attribute is missing or is not an ISO-8601 timestamp.
    pub fn logged_in_since(&self) -> Option<DateTime<Utc>> {
        let raw = self.attribute_value(AUTHN_INSTANT_ATTRIBUTE)?;
        match DateTime::parse_from_rfc3339(raw.trim()) {
            Ok(instant) => Some(instant.with_timezone(&Utc)),
            Err(e) => {
                tracing::debug!(
                    value = %raw,
                    error = %e,
                    "Ignoring unparsable Shibboleth authentication instant"
                );
                None
            }
        }
    }

    pub fn idp_entity_id(&self) -> Option<String> {
        self.attribute_value(IDP_ENTITY_ID_ATTRIBUTE)
    }

    // ========== Attributes ==========

    pub fn attribute_access_method(&self) -> AttributeSource {
        self.attribute_source
    }

    /// Switch attribute source by name (`from_headers` or `from_environment`,
    /// any case).
    pub fn set_attribute_access_method(&mut self, method: &str) -> Result<(), AuthError> {
        self.attribute_source = method.parse()?;
        Ok(())
    }

    pub fn set_attribute_source(&mut self, source: AttributeSource) {
        self.attribute_source = source;
    }

    pub fn normalize_attribute_name(&self, name: &str) -> String {
        self.attribute_source.normalize_name(name)
    }

    /// Single attribute value from the active source.
    pub fn attribute_value(&self, name: &str) -> Option<String> {
        let key = self.normalize_attribute_name(name);
        match self.attribute_source {
            AttributeSource::FromHeaders => self
                .request
                .headers
                .get(key.as_str())
                .and_then(|v| String::from_utf8(v.as_bytes().to_vec()).ok()),
            AttributeSource::FromEnvironment => std::env::var(&key).ok(),
        }
    }

    /// Multi-valued attribute split on `delimiter` (default `;`).
    ///
    /// An empty delimiter splits the value into its characters.
    pub fn attribute_values(&self, name: &str, delimiter: Option<&str>) -> Option<Vec<String>> {
        let delimiter = delimiter.unwrap_or(DEFAULT_VALUE_DELIMITER);
        self.attribute_value(name).map(|v| {
            if delimiter.is_empty() {
                v.chars().map(String::from).collect()
            } else {
                v.split(delimiter).map(String::from).collect()
            }
        })
    }

    pub fn default_attribute_names(&self) -> &[String] {
        &self.default_attribute_names
    }

    /// Default attribute names followed by any requested names not already present.
    pub fn attribute_names<I, S>(&self, requested: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names = self.default_attribute_names.clone();
        for name in requested {
            let name = name.as_ref();
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        names
    }

    /// [`attribute_names`](Self::attribute_names) for untyped input, e.g. a JSON body.
    ///
    /// `null` means no extra names. Anything other than an array of strings
    /// is rejected.
    pub fn attribute_names_from_value(
        &self,
        requested: &serde_json::Value,
    ) -> Result<Vec<String>, AuthError> {
        let items = match requested {
            serde_json::Value::Null => return Ok(self.default_attribute_names.clone()),
            serde_json::Value::Array(items) => items,
            other => {
                return Err(AuthError::InvalidArgument(format!(
                    "requested attributes must be an array, got {}",
                    json_type_name(other)
                )));
            }
        };

        let names = items
            .iter()
            .map(|item| {
                item.as_str().ok_or_else(|| {
                    AuthError::InvalidArgument(format!(
                        "requested attribute names must be strings, got {}",
                        json_type_name(item)
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(self.attribute_names(names))
    }

    /// Look up the default attributes plus `requested`.
    pub fn attributes<I, S>(&self, requested: I) -> Attributes
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut attributes = Attributes::default();
        for name in self.attribute_names(requested) {
            let value = self.attribute_value(&name);
            attributes.push(name, value);
        }

        tracing::debug!(
            source = %self.attribute_source,
            released = attributes.iter().filter(|(_, v)| v.is_some()).count(),
            requested = attributes.len(),
            "Resolved Shibboleth attributes"
        );

        attributes
    }

    /// Attributes for a valid session, or a login redirect.
    ///
    /// Without a session the error carries the plain login URL. When the
    /// session is older than `max_age`, `force_authn` is added so the IdP
    /// asks for credentials again.
    pub fn attributes_or_request_login<I, S>(
        &self,
        options: Option<&LoginOptions>,
        requested: I,
        max_age: Option<u64>,
    ) -> Result<Attributes, AuthError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if !self.has_session() {
            return Err(AuthError::LoginRequired {
                redirect_url: self.build_login_url(options),
            });
        }

        if self.has_session_timed_out(max_age) {
            let forced = options
                .cloned()
                .unwrap_or_default()
                .with_force_authn(true);
            return Err(AuthError::LoginRequired {
                redirect_url: self.build_login_url(Some(&forced)),
            });
        }

        Ok(self.attributes(requested))
    }
}

fn bool_param(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
