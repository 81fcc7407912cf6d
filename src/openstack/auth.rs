//! Keystone v3 password credentials and catalog filtering.
//!
//! Token issuance and catalog parsing belong to the SDK session; this module
//! only turns driver configuration into the SDK's authentication plugin.

use osauth::EndpointFilters;
use osauth::common::IdOrName;
use osauth::identity::Password;

use super::error::CloudError;

/// Credentials and endpoint selection used to build a client.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AuthOptions {
    /// Identity endpoint, with or without the `/v3` suffix.
    pub auth_url: String,
    /// Account name.
    pub username: String,
    /// Account password.
    pub password: String,
    /// Domain the user belongs to.
    pub domain_name: String,
    /// Project the token is scoped to.
    pub project_id: String,
    /// Catalog region; empty matches any region.
    pub region: String,
    /// Optional HTTP proxy URL.
    pub proxy: Option<String>,
}

/// Password plugin scoped to the configured project.
///
/// # Errors
///
/// Returns [`CloudError::Api`] when the identity URL cannot be parsed.
pub(crate) fn password_auth(options: &AuthOptions) -> Result<Password, CloudError> {
    let auth = Password::new(
        options.auth_url.as_str(),
        options.username.as_str(),
        options.password.as_str(),
        options.domain_name.as_str(),
    )?;
    Ok(auth.with_project_scope(IdOrName::Id(options.project_id.clone()), None))
}

/// Catalog filters for the configured region; `None` keeps the SDK default.
pub(crate) fn endpoint_filters(region: &str) -> Option<EndpointFilters> {
    let trimmed = region.trim();
    (!trimmed.is_empty()).then(|| EndpointFilters::default().with_region(trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(auth_url: &str) -> AuthOptions {
        AuthOptions {
            auth_url: auth_url.to_owned(),
            username: String::from("builder"),
            password: String::from("secret"),
            domain_name: String::from("12345"),
            project_id: String::from("project"),
            region: String::new(),
            proxy: None,
        }
    }

    #[test]
    fn password_plugin_accepts_identity_url() {
        assert!(password_auth(&options("https://api.selvpc.ru/identity/v3")).is_ok());
    }

    #[test]
    fn password_plugin_rejects_malformed_url() {
        assert!(password_auth(&options("not a url")).is_err());
    }

    #[test]
    fn blank_region_keeps_default_filters() {
        assert!(endpoint_filters("").is_none());
        assert!(endpoint_filters("  ").is_none());
        assert!(endpoint_filters("ru-1").is_some());
    }
}
