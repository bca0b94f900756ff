//! HTTP client for the portal's login and recovery endpoints.

use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::{DeviceKind, Endpoints};

use super::{AuthError, RecoveryError};

/// HTTP request timeout in seconds.
/// A hung login must convert to a network error instead of leaving the
/// session controller waiting forever; 20s is generous for mobile links.
const REQUEST_TIMEOUT_SECS: u64 = 20;

/// Client for the portal endpoints.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct PortalClient {
    client: Client,
    endpoints: Endpoints,
    device: DeviceKind,
}

impl PortalClient {
    pub fn new(endpoints: Endpoints, device: DeviceKind) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            endpoints,
            device,
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Submit one login attempt. 2xx means the portal accepted the
    /// credentials and set its session cookies; anything else is a
    /// credential failure.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), AuthError> {
        debug!(device = self.device.as_str(), "submitting login");

        let form = [
            ("usuario.email", email),
            ("usuario.senha", password),
            ("urlRedirect", self.endpoints.dashboard_url.as_str()),
            ("tipoDispositivo", self.device.as_str()),
        ];

        let response = self
            .client
            .post(&self.endpoints.login_url)
            .form(&form)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            warn!(status = %response.status(), "portal rejected login");
            Err(AuthError::InvalidCredentials)
        }
    }

    /// Fire-and-forget password recovery request. The portal emails the
    /// account data; all the client learns is accepted or not.
    pub async fn request_recovery(&self, email: &str) -> Result<(), RecoveryError> {
        debug!("submitting password recovery request");

        let response = self
            .client
            .post(&self.endpoints.recovery_url)
            .form(&[("email", email)])
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            warn!(status = %response.status(), "portal rejected recovery request");
            Err(RecoveryError::Rejected)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn endpoints(server: &MockServer) -> Endpoints {
        Endpoints {
            login_url: format!("{}/usuario/loginSmart", server.uri()),
            dashboard_url: format!("{}/inicio/dashboard?origem=login", server.uri()),
            logout_url: format!("{}/usuario/logout", server.uri()),
            recovery_url: format!("{}/sistema/recuperarSenha", server.uri()),
        }
    }

    fn client(server: &MockServer) -> PortalClient {
        PortalClient::new(endpoints(server), DeviceKind::Android).expect("client")
    }

    #[tokio::test]
    async fn test_login_posts_form_encoded_credentials() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/usuario/loginSmart"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string_contains("usuario.email=a%40x.com"))
            .and(body_string_contains("usuario.senha=p"))
            .and(body_string_contains("tipoDispositivo=android"))
            .and(body_string_contains("urlRedirect="))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        client(&server).login("a@x.com", "p").await.expect("login");
    }

    #[tokio::test]
    async fn test_login_rejection_is_invalid_credentials() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/usuario/loginSmart"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = client(&server)
            .login("a@x.com", "wrong")
            .await
            .expect_err("should fail");
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_login_server_error_is_invalid_credentials() {
        // The portal is the sole arbiter: any non-2xx is a credential failure
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/usuario/loginSmart"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client(&server)
            .login("a@x.com", "p")
            .await
            .expect_err("should fail");
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        let endpoints = Endpoints {
            login_url: "http://127.0.0.1:1/usuario/loginSmart".to_string(),
            dashboard_url: "http://127.0.0.1:1/inicio/dashboard".to_string(),
            logout_url: "http://127.0.0.1:1/usuario/logout".to_string(),
            recovery_url: "http://127.0.0.1:1/sistema/recuperarSenha".to_string(),
        };
        let client = PortalClient::new(endpoints, DeviceKind::Iphone).expect("client");

        let err = client
            .login("a@x.com", "p")
            .await
            .expect_err("should fail");
        assert!(matches!(err, AuthError::Network(_)));
    }

    #[tokio::test]
    async fn test_recovery_posts_single_email_key() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/sistema/recuperarSenha"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string_contains("email=a%40x.com"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .request_recovery("a@x.com")
            .await
            .expect("recovery");
    }

    #[tokio::test]
    async fn test_recovery_rejection_is_retryable_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/sistema/recuperarSenha"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        let err = client(&server)
            .request_recovery("nope")
            .await
            .expect_err("should fail");
        assert!(matches!(err, RecoveryError::Rejected));
    }
}
