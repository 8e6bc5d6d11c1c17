use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::store::DEFAULT_BASE_PATH;

/// Tokens shorter than this are accepted with a warning.
pub const MIN_RECOMMENDED_TOKEN_LEN: usize = 16;

/// SCIM endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScimConfig {
    /// Path prefix that all SCIM resource routes are mounted under.
    ///
    /// Entra ID tenants are usually pointed at `/scim/v2`; some deployments
    /// use `/scim/api/v2`.
    #[serde(default = "default_base_path")]
    pub base_path: String,

    /// Shared bearer token Entra ID presents on every request.
    /// Usually given as `${SCIM_BEARER_TOKEN}`.
    pub bearer_token: String,
}

fn default_base_path() -> String {
    DEFAULT_BASE_PATH.to_string()
}

impl ScimConfig {
    /// Whether the bearer token is shorter than the recommended minimum.
    /// Such tokens are accepted; the server logs a warning at startup.
    pub fn has_short_token(&self) -> bool {
        self.bearer_token.len() < MIN_RECOMMENDED_TOKEN_LEN
    }

    /// Validate and normalize the configuration.
    ///
    /// Strips a trailing `/` from `base_path`.
    pub(super) fn validate(&mut self) -> Result<(), ConfigError> {
        if self.bearer_token.trim().is_empty() {
            return Err(ConfigError::Validation(
                "scim.bearer_token must not be empty".into(),
            ));
        }
        if !self.base_path.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "scim.base_path must start with '/', got '{}'",
                self.base_path
            )));
        }
        let trimmed = self.base_path.trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(ConfigError::Validation(
                "scim.base_path must not be '/'".into(),
            ));
        }
        self.base_path = trimmed.to_string();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn config(base_path: &str, token: &str) -> ScimConfig {
        ScimConfig {
            base_path: base_path.to_string(),
            bearer_token: token.to_string(),
        }
    }

    #[rstest]
    #[case("/scim/v2", "/scim/v2")]
    #[case("/scim/api/v2", "/scim/api/v2")]
    #[case("/scim/v2/", "/scim/v2")]
    fn test_base_path_normalization(#[case] input: &str, #[case] expected: &str) {
        let mut config = config(input, "a-long-enough-token");
        config.validate().unwrap();
        assert_eq!(config.base_path, expected);
    }

    #[rstest]
    #[case::relative("scim/v2")]
    #[case::root("/")]
    #[case::empty("")]
    fn test_invalid_base_path(#[case] input: &str) {
        let mut config = config(input, "a-long-enough-token");
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_empty_token_rejected() {
        let mut config = config("/scim/v2", "   ");
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[rstest]
    #[case::short("short", true)]
    #[case::fifteen("fifteen-chars-x", true)]
    #[case::sixteen("sixteen-chars-xy", false)]
    fn test_short_token_allowed(#[case] token: &str, #[case] short: bool) {
        let mut config = config("/scim/v2", token);
        assert!(config.validate().is_ok());
        assert_eq!(config.has_short_token(), short);
    }
}
