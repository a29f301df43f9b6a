use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize, ser::SerializeMap};

use super::AuthError;

/// Where shibd exposes attributes to the application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeSource {
    /// Request headers, as set by the web server module in front of us.
    #[default]
    FromHeaders,
    /// Process environment (CGI style).
    FromEnvironment,
}

impl AttributeSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeSource::FromHeaders => "from_headers",
            AttributeSource::FromEnvironment => "from_environment",
        }
    }

    /// Map an attribute name to the key it is stored under in this source.
    ///
    /// Headers: `HTTP_AN_ATTRIBUTE` and `An_Attribute` both become `an-attribute`.
    /// Environment variables are used as given.
    pub fn normalize_name(&self, name: &str) -> String {
        match self {
            AttributeSource::FromHeaders => {
                let name = name.replace('_', "-").to_lowercase();
                match name.strip_prefix("http-") {
                    Some(stripped) => stripped.to_string(),
                    None => name,
                }
            }
            AttributeSource::FromEnvironment => name.to_string(),
        }
    }
}

impl fmt::Display for AttributeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttributeSource {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "from_headers" => Ok(AttributeSource::FromHeaders),
            "from_environment" => Ok(AttributeSource::FromEnvironment),
            _ => Err(AuthError::InvalidAttributeSource(s.to_string())),
        }
    }
}

/// Attribute values keyed by name, in lookup order.
///
/// A `None` value means the attribute was requested but not released.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<(String, Option<String>)>,
}

impl Attributes {
    pub(crate) fn push(&mut self, name: String, value: Option<String>) {
        self.entries.push((name, value));
    }

    /// Value of `name`, if it was requested and released.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_deref())
    }

    /// Whether `name` was part of the lookup, released or not.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for Attributes {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("HTTP_AN_ATTRIBUTE", "an-attribute")]
    #[case("Shib-Identity-Provider", "shib-identity-provider")]
    #[case("Shib_Authentication_Instant", "shib-authentication-instant")]
    #[case("uid", "uid")]
    #[case("umnDID", "umndid")]
    #[case("http-x-forwarded-user", "x-forwarded-user")]
    #[case("my-http-header", "my-http-header")]
    fn test_normalize_header_names(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(AttributeSource::FromHeaders.normalize_name(input), expected);
    }

    #[rstest]
    #[case("AN_ATTRIBUTE")]
    #[case("HTTP_AN_ATTRIBUTE")]
    #[case("Shib-Identity-Provider")]
    fn test_normalize_environment_names_unchanged(#[case] input: &str) {
        assert_eq!(AttributeSource::FromEnvironment.normalize_name(input), input);
    }

    #[rstest]
    #[case("from_headers", AttributeSource::FromHeaders)]
    #[case("FROM_HEADERS", AttributeSource::FromHeaders)]
    #[case("From_Environment", AttributeSource::FromEnvironment)]
    fn test_parse_source(#[case] input: &str, #[case] expected: AttributeSource) {
        assert_eq!(input.parse::<AttributeSource>().unwrap(), expected);
    }

    #[rstest]
    #[case("from_cookies")]
    #[case("")]
    #[case("headers")]
    fn test_parse_source_rejects_unknown(#[case] input: &str) {
        let err = input.parse::<AttributeSource>().unwrap_err();
        assert!(matches!(err, AuthError::InvalidAttributeSource(v) if v == input));
    }

    #[test]
    fn test_source_serde_names() {
        let json = serde_json::to_string(&AttributeSource::FromEnvironment).unwrap();
        assert_eq!(json, "\"from_environment\"");
        assert_eq!(AttributeSource::FromHeaders.to_string(), "from_headers");
    }

    #[test]
    fn test_attributes_preserve_order_in_json() {
        let mut attrs = Attributes::default();
        attrs.push("uid".into(), Some("jdoe".into()));
        attrs.push("eppn".into(), None);
        attrs.push("mail".into(), Some("jdoe@umn.edu".into()));

        let json = serde_json::to_string(&attrs).unwrap();
        assert_eq!(json, r#"{"uid":"jdoe","eppn":null,"mail":"jdoe@umn.edu"}"#);
        assert_eq!(attrs.get("uid"), Some("jdoe"));
        assert_eq!(attrs.get("eppn"), None);
        assert!(attrs.contains("eppn"));
        assert!(!attrs.contains("isGuest"));
        assert_eq!(attrs.len(), 3);
    }
}
