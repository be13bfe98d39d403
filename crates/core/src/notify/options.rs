//! Deployment context fields interpolated into the Slack message.

use std::borrow::Cow;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::{ConfigError, NotificationError};

/// Host used when no deployment options are supplied.
pub const PLACEHOLDER_HOST: &str = "host";
/// Release used when no deployment options are supplied.
pub const PLACEHOLDER_RELEASE: &str = "release";
/// User used when no deployment options are supplied.
pub const PLACEHOLDER_USER: &str = "user";
/// Branch used when no deployment options are supplied.
pub const PLACEHOLDER_BRANCH: &str = "branch";
/// PHP version used when no deployment options are supplied.
pub const PLACEHOLDER_PHP_VERSION: &str = "php version";
/// GitHub URL used when no deployment options are supplied.
pub const PLACEHOLDER_GITHUB_URL: &str = "https://github.com";

/// Recognized option keys, in declaration order.
pub const OPTION_KEYS: [&str; 7] = [
    "success",
    "host",
    "release",
    "user",
    "branch",
    "php_version",
    "github_url",
];

/// The option set describing one deployment.
///
/// Every key is optional so that a partially filled set can be detected and
/// reported by the message builder. String fields also accept integers when
/// deserialized (`release = 42`). Floats are rejected because their text
/// form is not preserved (`8.0` would read back as `8`), and unknown keys
/// are rejected like they are for [`set`](Self::set).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeploymentOptions {
    /// Carried for compatibility with existing option sets. The outcome of
    /// the message is decided by the request's success flag, not this key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,

    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub host: Option<String>,

    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub release: Option<String>,

    /// Who triggered the deployment ("Created by").
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub user: Option<String>,

    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub branch: Option<String>,

    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub php_version: Option<String>,

    /// Target of the "View" button, passed through verbatim.
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub github_url: Option<String>,
}

impl DeploymentOptions {
    /// The fixed option set substituted for an empty one.
    pub fn placeholder() -> Self {
        Self {
            success: Some(false),
            host: Some(PLACEHOLDER_HOST.into()),
            release: Some(PLACEHOLDER_RELEASE.into()),
            user: Some(PLACEHOLDER_USER.into()),
            branch: Some(PLACEHOLDER_BRANCH.into()),
            php_version: Some(PLACEHOLDER_PHP_VERSION.into()),
            github_url: Some(PLACEHOLDER_GITHUB_URL.into()),
        }
    }

    /// True when no key at all is set.
    pub fn is_empty(&self) -> bool {
        self.success.is_none()
            && self.host.is_none()
            && self.release.is_none()
            && self.user.is_none()
            && self.branch.is_none()
            && self.php_version.is_none()
            && self.github_url.is_none()
    }

    /// The option set to render: `self`, or [`placeholder`](Self::placeholder)
    /// when `self` is empty.
    pub fn or_placeholder(&self) -> Cow<'_, Self> {
        if self.is_empty() {
            Cow::Owned(Self::placeholder())
        } else {
            Cow::Borrowed(self)
        }
    }

    /// Look up a string-valued key. `success` and unknown keys yield `None`.
    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            "host" => self.host.as_deref(),
            "release" => self.release.as_deref(),
            "user" => self.user.as_deref(),
            "branch" => self.branch.as_deref(),
            "php_version" => self.php_version.as_deref(),
            "github_url" => self.github_url.as_deref(),
            _ => None,
        }
    }

    /// Like [`get`](Self::get), but a missing key is an error naming it.
    pub fn require(&self, key: &'static str) -> Result<&str, NotificationError> {
        self.get(key).ok_or(NotificationError::MissingField { key })
    }

    /// Set a single key from its textual form.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let value = value.to_string();
        match key {
            "success" => {
                let flag = value.parse::<bool>().map_err(|_| ConfigError::InvalidValue {
                    field: "success".into(),
                    detail: format!("expected true or false, got '{}'", value),
                })?;
                self.success = Some(flag);
            }
            "host" => self.host = Some(value),
            "release" => self.release = Some(value),
            "user" => self.user = Some(value),
            "branch" => self.branch = Some(value),
            "php_version" => self.php_version = Some(value),
            "github_url" => self.github_url = Some(value),
            other => return Err(ConfigError::UnknownOption(other.to_string())),
        }
        Ok(())
    }

    /// Build an option set from `(key, value)` pairs. Later pairs win.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut options = Self::default();
        for (key, value) in pairs {
            options.set(key.as_ref(), value.as_ref())?;
        }
        Ok(options)
    }

    /// Overlay every key that `other` sets onto `self`.
    pub fn merge(&mut self, other: DeploymentOptions) {
        if other.success.is_some() {
            self.success = other.success;
        }
        if other.host.is_some() {
            self.host = other.host;
        }
        if other.release.is_some() {
            self.release = other.release;
        }
        if other.user.is_some() {
            self.user = other.user;
        }
        if other.branch.is_some() {
            self.branch = other.branch;
        }
        if other.php_version.is_some() {
            self.php_version = other.php_version;
        }
        if other.github_url.is_some() {
            self.github_url = other.github_url;
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Integer(i64),
    Float(f64),
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Scalar>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Scalar::Text(s)) => Ok(Some(s)),
        Some(Scalar::Integer(n)) => Ok(Some(n.to_string())),
        Some(Scalar::Float(n)) => Err(D::Error::custom(format!(
            "decimal number {:?} must be quoted to keep its exact text (e.g. \"8.0\")",
            n
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty() {
        assert!(DeploymentOptions::default().is_empty());
        assert!(!DeploymentOptions::placeholder().is_empty());
    }

    #[test]
    fn test_success_alone_makes_set_non_empty() {
        let options = DeploymentOptions {
            success: Some(true),
            ..Default::default()
        };
        assert!(!options.is_empty());
        assert!(matches!(options.or_placeholder(), Cow::Borrowed(_)));
    }

    #[test]
    fn test_or_placeholder_substitutes_empty_set() {
        let empty = DeploymentOptions::default();
        let resolved = empty.or_placeholder();
        assert_eq!(resolved.get("host"), Some("host"));
        assert_eq!(resolved.get("php_version"), Some("php version"));
        assert_eq!(resolved.get("github_url"), Some("https://github.com"));
        assert_eq!(resolved.success, Some(false));
    }

    #[test]
    fn test_require_names_missing_key() {
        let options = DeploymentOptions {
            host: Some("web1".into()),
            ..Default::default()
        };
        assert_eq!(options.require("host").unwrap(), "web1");
        assert!(matches!(
            options.require("branch"),
            Err(NotificationError::MissingField { key: "branch" })
        ));
    }

    #[test]
    fn test_from_pairs() {
        let options = DeploymentOptions::from_pairs([
            ("host", "web1"),
            ("release", "41"),
            ("release", "42"),
            ("success", "true"),
        ])
        .unwrap();
        assert_eq!(options.host.as_deref(), Some("web1"));
        assert_eq!(options.release.as_deref(), Some("42"));
        assert_eq!(options.success, Some(true));
    }

    #[test]
    fn test_from_pairs_rejects_unknown_key() {
        let result = DeploymentOptions::from_pairs([("colour", "red")]);
        assert!(matches!(result, Err(ConfigError::UnknownOption(ref k)) if k == "colour"));
    }

    #[test]
    fn test_from_pairs_rejects_bad_success_flag() {
        let result = DeploymentOptions::from_pairs([("success", "yes")]);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "success"
        ));
    }

    #[test]
    fn test_merge_overlays_only_set_keys() {
        let mut base = DeploymentOptions::from_pairs([("host", "web1"), ("branch", "main")]).unwrap();
        let overlay = DeploymentOptions::from_pairs([("branch", "hotfix")]).unwrap();
        base.merge(overlay);
        assert_eq!(base.host.as_deref(), Some("web1"));
        assert_eq!(base.branch.as_deref(), Some("hotfix"));
    }

    #[test]
    fn test_deserialize_accepts_integers() {
        let options: DeploymentOptions = toml::from_str(
            r#"
host = "web1"
release = 42
php_version = "8.0"
"#,
        )
        .unwrap();
        assert_eq!(options.release.as_deref(), Some("42"));
        assert_eq!(options.php_version.as_deref(), Some("8.0"));
        assert!(options.user.is_none());
    }

    #[test]
    fn test_deserialize_rejects_unquoted_decimals() {
        let err = toml::from_str::<DeploymentOptions>("php_version = 8.0")
            .expect_err("8.0 would render as 8");
        assert!(err.to_string().contains("must be quoted"), "{}", err);

        assert!(toml::from_str::<DeploymentOptions>("release = 1.10").is_err());
    }

    #[test]
    fn test_deserialize_rejects_unknown_keys() {
        let err = toml::from_str::<DeploymentOptions>("hostname = \"web1\"")
            .expect_err("misspelled key must not fall back to placeholders");
        assert!(err.to_string().contains("hostname"), "{}", err);
    }

    #[test]
    fn test_every_string_key_is_addressable() {
        let options = DeploymentOptions::placeholder();
        for key in OPTION_KEYS.iter().filter(|k| **k != "success") {
            assert!(options.get(key).is_some(), "key {} not addressable", key);
        }
    }
}
