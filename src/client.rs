// File: src/client.rs
use crate::model::{Session, User};
use crate::validation::RegisterForm;

use http::{Method, Request, Uri, header};
use http_body_util::BodyExt;
use hyper_rustls::HttpsConnectorBuilder;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use log::debug;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

pub const LOGIN_FAILED: &str = "Invalid credentials";
pub const REGISTER_FAILED: &str = "Registration failed";
pub const PROFILE_FAILED: &str = "Failed to get profile";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

type HttpsClient = Client<hyper_rustls::HttpsConnector<HttpConnector>, String>;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserDto {
    id: Value,
    username: String,
    email: String,
    first_name: String,
    last_name: String,
    #[serde(default)]
    image: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginDto {
    #[serde(flatten)]
    user: UserDto,
    access_token: String,
}

impl UserDto {
    fn into_user(self) -> User {
        // The demo API sends numeric ids; keep strings as they are.
        let id = match self.id {
            Value::String(s) => s,
            other => other.to_string(),
        };
        User {
            id,
            username: self.username,
            email: self.email,
            name: format!("{} {}", self.first_name, self.last_name),
            avatar: self.image,
        }
    }
}

/// Client for the demo auth service (DummyJSON-compatible).
///
/// Every failure collapses into one user-facing message per operation; the
/// underlying cause is only logged.
#[derive(Clone, Debug)]
pub struct AuthClient {
    base_url: String,
    http: HttpsClient,
    session_ttl_mins: u32,
}

impl AuthClient {
    pub fn new(base_url: &str, insecure: bool, session_ttl_mins: u32) -> Result<Self, String> {
        let base_url = base_url.trim_end_matches('/').to_string();
        base_url
            .parse::<Uri>()
            .map_err(|e: http::uri::InvalidUri| e.to_string())?;

        let https_connector = if insecure {
            let tls_config = rustls::ClientConfig::builder()
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(NoVerifier))
                .with_no_client_auth();
            HttpsConnectorBuilder::new()
                .with_tls_config(tls_config)
                .https_or_http()
                .enable_http1()
                .build()
        } else {
            let mut root_store = rustls::RootCertStore::empty();
            let result = rustls_native_certs::load_native_certs();
            root_store.add_parsable_certificates(result.certs);
            if root_store.is_empty() {
                return Err("No valid system certificates found.".to_string());
            }
            let tls_config = rustls::ClientConfig::builder()
                .with_root_certificates(root_store)
                .with_no_client_auth();
            HttpsConnectorBuilder::new()
                .with_tls_config(tls_config)
                .https_or_http()
                .enable_http1()
                .build()
        };

        let http = Client::builder(TokioExecutor::new()).build(https_connector);
        Ok(Self {
            base_url,
            http,
            session_ttl_mins,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        bearer: Option<&str>,
    ) -> Result<T, String> {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = Request::builder()
            .method(method)
            .uri(&url)
            .header(header::ACCEPT, "application/json");
        if body.is_some() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = builder
            .body(body.map(|b| b.to_string()).unwrap_or_default())
            .map_err(|e| e.to_string())?;

        let exchange = async {
            let response = self.http.request(request).await.map_err(|e| e.to_string())?;
            let status = response.status();
            let bytes = response
                .into_body()
                .collect()
                .await
                .map_err(|e| e.to_string())?
                .to_bytes();
            Ok::<_, String>((status, bytes))
        };
        let (status, bytes) = tokio::time::timeout(REQUEST_TIMEOUT, exchange)
            .await
            .map_err(|_| format!("Timed out after {:?}", REQUEST_TIMEOUT))??;

        if !status.is_success() {
            return Err(format!("{} returned {}", url, status));
        }
        serde_json::from_slice(&bytes).map_err(|e| format!("Bad response from {}: {}", url, e))
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Session, String> {
        let body = json!({
            "username": username,
            "password": password,
            "expiresInMins": self.session_ttl_mins,
        });
        let dto: LoginDto = self
            .send(Method::POST, "/auth/login", Some(body), None)
            .await
            .map_err(|e| {
                debug!("login failed: {}", e);
                LOGIN_FAILED.to_string()
            })?;
        Ok(Session {
            user: dto.user.into_user(),
            token: dto.access_token,
        })
    }

    /// The demo API stores nothing and issues no token, so one is made up.
    pub async fn register(&self, form: &RegisterForm) -> Result<Session, String> {
        let body = json!({
            "firstName": form.first_name,
            "lastName": form.last_name,
            "email": form.email,
            "username": form.username,
            "password": form.password,
        });
        let dto: UserDto = self
            .send(Method::POST, "/users/add", Some(body), None)
            .await
            .map_err(|e| {
                debug!("registration failed: {}", e);
                REGISTER_FAILED.to_string()
            })?;
        let mut user = dto.into_user();
        user.avatar = None;
        Ok(Session {
            user,
            token: format!("mock-token-{}", chrono::Utc::now().timestamp_millis()),
        })
    }

    pub async fn profile(&self, token: &str) -> Result<User, String> {
        let dto: UserDto = self
            .send(Method::GET, "/auth/me", None, Some(token))
            .await
            .map_err(|e| {
                debug!("profile fetch failed: {}", e);
                PROFILE_FAILED.to_string()
            })?;
        Ok(dto.into_user())
    }
}

#[derive(Debug)]
struct NoVerifier;
impl rustls::client::danger::ServerCertVerifier for NoVerifier {
    fn verify_server_cert(
        &self,
        _: &rustls::pki_types::CertificateDer<'_>,
        _: &[rustls::pki_types::CertificateDer<'_>],
        _: &rustls::pki_types::ServerName<'_>,
        _: &[u8],
        _: rustls::pki_types::UnixTime,
    ) -> Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }
    fn verify_tls12_signature(
        &self,
        _: &[u8],
        _: &rustls::pki_types::CertificateDer<'_>,
        _: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }
    fn verify_tls13_signature(
        &self,
        _: &[u8],
        _: &rustls::pki_types::CertificateDer<'_>,
        _: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }
    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        use rustls::SignatureScheme::*;
        vec![
            RSA_PKCS1_SHA256,
            RSA_PKCS1_SHA384,
            RSA_PKCS1_SHA512,
            ECDSA_NISTP256_SHA256,
            ECDSA_NISTP384_SHA384,
            RSA_PSS_SHA256,
            ED25519,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const EMILY: &str = r#"{
        "id": 1,
        "username": "emilys",
        "email": "emily.johnson@x.dummyjson.com",
        "firstName": "Emily",
        "lastName": "Johnson",
        "image": "https://dummyjson.com/icon/emilys/128",
        "accessToken": "access-123",
        "refreshToken": "refresh-456"
    }"#;

    fn client(server: &mockito::Server) -> AuthClient {
        AuthClient::new(&server.url(), true, 60).unwrap()
    }

    fn form() -> RegisterForm {
        RegisterForm {
            first_name: "Nimal".into(),
            last_name: "Silva".into(),
            username: "nimal_s".into(),
            email: "nimal@example.com".into(),
            password: "secret1".into(),
            confirm_password: "secret1".into(),
        }
    }

    #[tokio::test]
    async fn test_login_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/auth/login")
            .match_header("content-type", "application/json")
            .match_body(Matcher::PartialJson(json!({
                "username": "emilys",
                "password": "emilyspass",
                "expiresInMins": 60
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(EMILY)
            .create_async()
            .await;

        let session = client(&server).login("emilys", "emilyspass").await.unwrap();
        mock.assert_async().await;
        assert_eq!(session.token, "access-123");
        assert_eq!(session.user.id, "1");
        assert_eq!(session.user.name, "Emily Johnson");
        assert_eq!(
            session.user.avatar.as_deref(),
            Some("https://dummyjson.com/icon/emilys/128")
        );
    }

    #[tokio::test]
    async fn test_login_rejected_is_generic_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/auth/login")
            .with_status(400)
            .with_body(r#"{"message":"Invalid credentials"}"#)
            .create_async()
            .await;

        let err = client(&server).login("emilys", "nope").await.unwrap_err();
        assert_eq!(err, LOGIN_FAILED);
    }

    #[tokio::test]
    async fn test_login_malformed_body_is_generic_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/auth/login")
            .with_status(200)
            .with_body("<html>")
            .create_async()
            .await;

        let err = client(&server).login("emilys", "emilyspass").await.unwrap_err();
        assert_eq!(err, LOGIN_FAILED);
    }

    #[tokio::test]
    async fn test_register_synthesizes_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/users/add")
            .match_body(Matcher::PartialJson(json!({
                "firstName": "Nimal",
                "username": "nimal_s"
            })))
            .with_status(201)
            .with_body(
                r#"{"id": 209, "username": "nimal_s", "email": "nimal@example.com",
                    "firstName": "Nimal", "lastName": "Silva", "image": "x"}"#,
            )
            .create_async()
            .await;

        let session = client(&server).register(&form()).await.unwrap();
        mock.assert_async().await;
        assert_eq!(session.user.id, "209");
        assert_eq!(session.user.name, "Nimal Silva");
        assert!(session.user.avatar.is_none());
        assert!(session.token.starts_with("mock-token-"));
    }

    #[tokio::test]
    async fn test_register_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/users/add")
            .with_status(500)
            .create_async()
            .await;
        let err = client(&server).register(&form()).await.unwrap_err();
        assert_eq!(err, REGISTER_FAILED);
    }

    #[tokio::test]
    async fn test_profile_sends_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/auth/me")
            .match_header("authorization", "Bearer access-123")
            .with_status(200)
            .with_body(EMILY)
            .create_async()
            .await;

        let user = client(&server).profile("access-123").await.unwrap();
        mock.assert_async().await;
        assert_eq!(user.username, "emilys");
    }

    #[tokio::test]
    async fn test_profile_unauthorized() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/auth/me")
            .with_status(401)
            .create_async()
            .await;
        let err = client(&server).profile("stale").await.unwrap_err();
        assert_eq!(err, PROFILE_FAILED);
    }

    #[test]
    fn test_rejects_unparseable_base_url() {
        assert!(AuthClient::new("http://exa mple.com", true, 60).is_err());
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let c = AuthClient::new("http://localhost:1234/", true, 60).unwrap();
        assert_eq!(c.base_url(), "http://localhost:1234");
    }
}
