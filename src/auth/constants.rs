//! Fixed values for the University of Minnesota Shibboleth federation.

/// Path of the Shibboleth SP handler, relative to the host.
pub const SP_HANDLER_URL: &str = "/Shibboleth.sso";

/// Production IdP entity ID.
pub const UMN_IDP_ENTITY_ID: &str = "https://idp2.shib.umn.edu/idp/shibboleth";
/// Test IdP entity ID.
pub const UMN_TEST_IDP_ENTITY_ID: &str = "https://idp-test.shib.umn.edu/idp/shibboleth";
/// Spoof-test IdP entity ID.
pub const UMN_SPOOF_IDP_ENTITY_ID: &str = "https://idp-spoof-test.shib.umn.edu/idp/shibboleth";

/// Entity IDs that count as a valid session.
pub const RECOGNIZED_IDP_ENTITY_IDS: [&str; 3] = [
    UMN_IDP_ENTITY_ID,
    UMN_TEST_IDP_ENTITY_ID,
    UMN_SPOOF_IDP_ENTITY_ID,
];

pub const UMN_IDP_LOGOUT_URL: &str = "https://idp2.shib.umn.edu/idp/LogoutUMN";
pub const UMN_TEST_IDP_LOGOUT_URL: &str = "https://idp-test.shib.umn.edu/idp/LogoutUMN";
pub const UMN_SPOOF_IDP_LOGOUT_URL: &str = "https://idp-spoof-test.shib.umn.edu/idp/LogoutUMN";

/// Authentication context for MKey (hardware token) logins.
pub const UMN_MKEY_AUTHN_CONTEXT: &str = "https://www.umn.edu/shibboleth/classes/authncontext/mkey";
/// Authentication context for Duo two-factor logins.
pub const UMN_DUO_AUTHN_CONTEXT: &str = "https://www.umn.edu/shibboleth/classes/authncontext/duo";

/// Default session lifetime in seconds (3 hours).
pub const UMN_SESSION_MAX_AGE: u64 = 10800;

/// Attributes every lookup includes, in this order.
pub const DEFAULT_ATTRIBUTE_NAMES: [&str; 4] = ["uid", "eppn", "isGuest", "umnDID"];

/// Separator shibd uses between values of a multi-valued attribute.
pub const DEFAULT_VALUE_DELIMITER: &str = ";";

pub const IDP_ENTITY_ID_ATTRIBUTE: &str = "Shib-Identity-Provider";
pub const AUTHN_INSTANT_ATTRIBUTE: &str = "Shib-Authentication-Instant";
pub const AUTHN_METHOD_ATTRIBUTE: &str = "Shib-Authentication-Method";
