//! Authentication against the SSO server
//!
//! Two methods are supported and exactly one must be configured:
//! - API key: sent as-is under the `X-api-key` header
//! - OAuth2 token: exchanged once for a session token, sent under `IPLSSOTOKEN`

use crate::client::decode_json;
use crate::config::ConnectorConfig;
use crate::path::build_url;
use crate::transport::{HttpRequest, Method, Transport};
use crate::{Error, Result};
use tracing::{debug, info};

/// Header carrying a personal access token
pub const PAT_KEY: &str = "X-api-key";

/// Header carrying a session token
pub const SSO_TOKEN_KEY: &str = "IPLSSOTOKEN";

/// SSO path exchanging an OAuth2 token for a session token
pub const OAUTH2_SESSION_PATH: &str = "sso-server/ws/oauth2/session";

const JSON_CONTENT: &str = "application/json";

/// Long-lived credential read from the configuration
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    ApiKey(String),
    OAuth2(String),
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::ApiKey(_) => write!(f, "ApiKey(***)"),
            Credentials::OAuth2(_) => write!(f, "OAuth2(***)"),
        }
    }
}

impl Credentials {
    /// Identify the authentication method of a configuration
    pub fn from_config(config: &ConnectorConfig) -> Result<Self> {
        match (&config.api_key, &config.oauth2_token) {
            (Some(_), Some(_)) => Err(Error::AmbiguousAuthentication),
            (Some(key), None) => Ok(Credentials::ApiKey(key.clone())),
            (None, Some(token)) => Ok(Credentials::OAuth2(token.clone())),
            (None, None) => Err(Error::MissingAuthentication),
        }
    }
}

/// The single header authenticating every request of a session
#[derive(Clone, PartialEq, Eq)]
pub struct AuthHeader {
    pub name: String,
    pub value: String,
}

impl std::fmt::Debug for AuthHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthHeader({}: ***)", self.name)
    }
}

impl AuthHeader {
    pub fn as_pair(&self) -> (String, String) {
        (self.name.clone(), self.value.clone())
    }
}

/// Turn credentials into the session's authentication header
///
/// An OAuth2 token costs one request to the SSO server.
pub fn authenticate(
    transport: &dyn Transport,
    sso_base_url: &str,
    credentials: &Credentials,
) -> Result<AuthHeader> {
    match credentials {
        Credentials::ApiKey(key) => {
            debug!("Authenticating with an API key");
            Ok(AuthHeader { name: PAT_KEY.to_string(), value: key.clone() })
        }
        Credentials::OAuth2(token) => {
            let request = HttpRequest {
                method: Method::Get,
                url: build_url(sso_base_url, OAUTH2_SESSION_PATH, ""),
                headers: vec![("Authorization".to_string(), format!("Bearer {}", token))],
                body: None,
            };
            let session = decode_json(transport.perform_request(&request)?)?;
            let token = session
                .get("token")
                .and_then(|t| t.as_str())
                .ok_or_else(|| Error::malformed(&session.to_string()))?;
            info!("Opened SSO session from OAuth2 token");
            Ok(AuthHeader { name: SSO_TOKEN_KEY.to_string(), value: token.to_string() })
        }
    }
}

/// Headers sent with every API request
pub fn generate_headers(auth: &AuthHeader) -> Vec<(String, String)> {
    vec![
        auth.as_pair(),
        ("Content-Type".to_string(), JSON_CONTENT.to_string()),
        ("Accept".to_string(), JSON_CONTENT.to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::HttpResponse;
    use std::sync::Mutex;

    struct OneShot {
        response: HttpResponse,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl Transport for OneShot {
        fn perform_request(&self, request: &HttpRequest) -> Result<HttpResponse> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(self.response.clone())
        }
    }

    fn config(api_key: Option<&str>, oauth2: Option<&str>) -> ConnectorConfig {
        ConnectorConfig {
            domain: Some("test.com".to_string()),
            api_key: api_key.map(str::to_string),
            oauth2_token: oauth2.map(str::to_string),
            ..ConnectorConfig::default()
        }
    }

    #[test]
    fn test_credentials_from_config() {
        assert_eq!(
            Credentials::from_config(&config(Some("k"), None)).unwrap(),
            Credentials::ApiKey("k".to_string())
        );
        assert_eq!(
            Credentials::from_config(&config(None, Some("t"))).unwrap(),
            Credentials::OAuth2("t".to_string())
        );
        assert!(matches!(
            Credentials::from_config(&config(Some("k"), Some("t"))),
            Err(Error::AmbiguousAuthentication)
        ));
        assert!(matches!(
            Credentials::from_config(&config(None, None)),
            Err(Error::MissingAuthentication)
        ));
    }

    #[test]
    fn test_api_key_needs_no_request() {
        let transport = OneShot {
            response: HttpResponse { status: 500, body: Vec::new() },
            seen: Mutex::new(Vec::new()),
        };
        let header = authenticate(&transport, "https://test.com", &Credentials::ApiKey("abcd".into())).unwrap();
        assert_eq!(header.as_pair(), (PAT_KEY.to_string(), "abcd".to_string()));
        assert!(transport.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_oauth2_exchanges_token() {
        let transport = OneShot {
            response: HttpResponse { status: 200, body: br#"{"token": "session"}"#.to_vec() },
            seen: Mutex::new(Vec::new()),
        };
        let header = authenticate(&transport, "https://test.com/", &Credentials::OAuth2("oauth".into())).unwrap();
        assert_eq!(header.as_pair(), (SSO_TOKEN_KEY.to_string(), "session".to_string()));

        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen[0].url, "https://test.com/sso-server/ws/oauth2/session");
        assert_eq!(seen[0].headers[0], ("Authorization".to_string(), "Bearer oauth".to_string()));
    }

    #[test]
    fn test_generate_headers() {
        let headers = generate_headers(&AuthHeader { name: PAT_KEY.into(), value: "abcd".into() });
        assert_eq!(headers.len(), 3);
        assert!(headers.contains(&("Accept".to_string(), "application/json".to_string())));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let shown = format!("{:?}", Credentials::ApiKey("secret".into()));
        assert!(!shown.contains("secret"));
    }
}
