use serde::{Deserialize, Serialize};

use super::constants::UMN_IDP_LOGOUT_URL;

/// Options for building a login (SessionInitiator) URL.
///
/// Every field is optional: an unset field falls through to the
/// authenticator's base options, and from there to the SP defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginOptions {
    /// Where the SP sends the user after login. Defaults to the current request URL.
    #[serde(default)]
    pub target: Option<String>,

    /// Ask the IdP to re-authenticate even with a live IdP session.
    #[serde(default, alias = "forceAuthn")]
    pub force_authn: Option<bool>,

    /// IdP to send the user to.
    #[serde(default, alias = "entityID")]
    pub entity_id: Option<String>,

    /// Requested authentication context class.
    #[serde(default, alias = "authnContextClassRef")]
    pub authn_context_class_ref: Option<String>,

    /// Passive login; sent as `isPassive`.
    #[serde(default)]
    pub passive: Option<bool>,

    /// Require MKey authentication.
    #[serde(default)]
    pub mkey: Option<bool>,

    /// Require Duo authentication. Takes precedence over `mkey`.
    #[serde(default)]
    pub duo: Option<bool>,
}

impl LoginOptions {
    /// Returns `self` with every field set in `overrides` replaced.
    pub fn merge(&self, overrides: &LoginOptions) -> LoginOptions {
        LoginOptions {
            target: overrides.target.clone().or_else(|| self.target.clone()),
            force_authn: overrides.force_authn.or(self.force_authn),
            entity_id: overrides.entity_id.clone().or_else(|| self.entity_id.clone()),
            authn_context_class_ref: overrides
                .authn_context_class_ref
                .clone()
                .or_else(|| self.authn_context_class_ref.clone()),
            passive: overrides.passive.or(self.passive),
            mkey: overrides.mkey.or(self.mkey),
            duo: overrides.duo.or(self.duo),
        }
    }

    /// Builder-style setter for `force_authn`.
    pub fn with_force_authn(mut self, force: bool) -> Self {
        self.force_authn = Some(force);
        self
    }
}

/// Options for building a logout URL.
///
/// `Default` leaves every field unset, so it is safe as a per-call override.
/// The SP's own defaults come from [`LogoutOptions::sp_defaults`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogoutOptions {
    /// Also end the IdP session by bouncing through the IdP logout page.
    #[serde(default, alias = "logoutFromIdP")]
    pub logout_from_idp: Option<bool>,

    /// IdP logout page used when `logout_from_idp` is set.
    #[serde(default, alias = "IdPLogoutURL")]
    pub idp_logout_url: Option<String>,

    /// Where to land after logout.
    #[serde(default, rename = "return")]
    pub return_url: Option<String>,
}

impl LogoutOptions {
    /// SP defaults: log out of the IdP too, via the production logout page.
    pub fn sp_defaults() -> Self {
        Self {
            logout_from_idp: Some(true),
            idp_logout_url: Some(UMN_IDP_LOGOUT_URL.to_string()),
            return_url: None,
        }
    }

    /// Returns `self` with every field set in `overrides` replaced.
    pub fn merge(&self, overrides: &LogoutOptions) -> LogoutOptions {
        LogoutOptions {
            logout_from_idp: overrides.logout_from_idp.or(self.logout_from_idp),
            idp_logout_url: overrides
                .idp_logout_url
                .clone()
                .or_else(|| self.idp_logout_url.clone()),
            return_url: overrides
                .return_url
                .clone()
                .or_else(|| self.return_url.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_merge_override_wins() {
        let base = LoginOptions {
            target: Some("https://base.example.com/".into()),
            entity_id: Some("urn:base".into()),
            mkey: Some(true),
            ..Default::default()
        };
        let overrides = LoginOptions {
            target: Some("https://override.example.com/".into()),
            mkey: Some(false),
            passive: Some(true),
            ..Default::default()
        };

        let merged = base.merge(&overrides);

        assert_eq!(merged.target.as_deref(), Some("https://override.example.com/"));
        assert_eq!(merged.entity_id.as_deref(), Some("urn:base"));
        assert_eq!(merged.mkey, Some(false));
        assert_eq!(merged.passive, Some(true));
        assert_eq!(merged.duo, None);
    }

    #[test]
    fn test_login_merge_does_not_mutate_inputs() {
        let base = LoginOptions {
            force_authn: Some(false),
            ..Default::default()
        };
        let overrides = LoginOptions::default().with_force_authn(true);

        let merged = base.merge(&overrides);

        assert_eq!(merged.force_authn, Some(true));
        assert_eq!(base.force_authn, Some(false));
        assert_eq!(overrides.force_authn, Some(true));
    }

    #[test]
    fn test_login_merge_with_empty_is_identity() {
        let base = LoginOptions {
            authn_context_class_ref: Some("urn:ctx".into()),
            duo: Some(true),
            ..Default::default()
        };
        assert_eq!(base.merge(&LoginOptions::default()), base);
        assert_eq!(LoginOptions::default().merge(&base), base);
    }

    #[test]
    fn test_logout_sp_defaults() {
        let opts = LogoutOptions::sp_defaults();
        assert_eq!(opts.logout_from_idp, Some(true));
        assert_eq!(opts.idp_logout_url.as_deref(), Some(UMN_IDP_LOGOUT_URL));
        assert!(opts.return_url.is_none());
    }

    #[test]
    fn test_logout_default_is_unset() {
        let opts = LogoutOptions::default();
        assert_eq!(opts.logout_from_idp, None);
        assert_eq!(opts.idp_logout_url, None);
        assert_eq!(opts.return_url, None);

        let base = LogoutOptions {
            logout_from_idp: Some(false),
            ..Default::default()
        };
        assert_eq!(base.merge(&LogoutOptions::default()), base);
    }

    #[test]
    fn test_logout_merge_keeps_base_defaults() {
        let overrides = LogoutOptions {
            return_url: Some("https://example.com/r".into()),
            ..Default::default()
        };
        let merged = LogoutOptions::sp_defaults().merge(&overrides);

        assert_eq!(merged.logout_from_idp, Some(true));
        assert_eq!(merged.idp_logout_url.as_deref(), Some(UMN_IDP_LOGOUT_URL));
        assert_eq!(merged.return_url.as_deref(), Some("https://example.com/r"));
    }

    #[test]
    fn test_deserialize_source_style_keys() {
        let opts: LoginOptions =
            serde_json::from_str(r#"{"forceAuthn": true, "entityID": "urn:idp"}"#).unwrap();
        assert_eq!(opts.force_authn, Some(true));
        assert_eq!(opts.entity_id.as_deref(), Some("urn:idp"));

        let opts: LogoutOptions =
            serde_json::from_str(r#"{"logoutFromIdP": false, "return": "https://x/"}"#).unwrap();
        assert_eq!(opts.logout_from_idp, Some(false));
        assert_eq!(opts.return_url.as_deref(), Some("https://x/"));
        assert!(opts.idp_logout_url.is_none());
    }

    #[test]
    fn test_deserialize_rejects_unknown_keys() {
        let result: Result<LoginOptions, _> = serde_json::from_str(r#"{"mfa": true}"#);
        assert!(result.is_err());
    }
}
