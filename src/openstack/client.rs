//! SDK session setup shared by the per-service helpers.

use std::time::Duration;

use openstack::Cloud;
use osauth::Session;
use reqwest::Proxy;
use tracing::debug;

use super::auth::{self, AuthOptions};
use super::error::CloudError;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("selectel-machine/", env!("CARGO_PKG_VERSION"));

/// OpenStack client scoped to one project and region.
///
/// `cloud` serves every call the SDK models; `session` is the same
/// authenticated session, used for the few compute calls the SDK lacks.
pub struct OpenStackClient {
    pub(crate) cloud: Cloud,
    pub(crate) session: Session,
}

impl OpenStackClient {
    /// Authenticates with the password method and prepares the SDK session.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::InvalidProxy`] for an unusable proxy,
    /// [`CloudError::Authentication`] when the identity service rejects the
    /// credentials, and [`CloudError::Api`] for other identity failures.
    pub async fn connect(options: &AuthOptions) -> Result<Self, CloudError> {
        let http = build_http_client(options.proxy.as_deref())?;
        let password = auth::password_auth(options)?;

        debug!(auth_url = %options.auth_url, user = %options.username, "requesting identity token");
        let mut session = Session::new_with_client(http, password).await?;
        if let Some(filters) = auth::endpoint_filters(&options.region) {
            session = session.with_endpoint_filters(filters);
        }

        Ok(Self {
            cloud: Cloud::from(session.clone()),
            session,
        })
    }
}

fn build_http_client(proxy: Option<&str>) -> Result<reqwest::Client, CloudError> {
    let mut builder = reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .user_agent(USER_AGENT);
    if let Some(proxy_url) = proxy {
        let http_proxy = Proxy::all(proxy_url).map_err(|err| CloudError::InvalidProxy {
            proxy: proxy_url.to_owned(),
            message: err.to_string(),
        })?;
        builder = builder.proxy(http_proxy);
    }
    builder.build().map_err(|err| CloudError::InvalidProxy {
        proxy: proxy.unwrap_or_default().to_owned(),
        message: err.to_string(),
    })
}
