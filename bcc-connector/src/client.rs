//! Authenticated client
//!
//! Owns the transport, the session headers, the parameter store and the list
//! of cubes the user can access. Every entity keeps an `Arc<Client>` so it can
//! issue its own requests.

use crate::auth::{authenticate, generate_headers, AuthHeader, Credentials};
use crate::config::{ConfigLocator, ConnectorConfig};
use crate::entity::Cube;
use crate::params::Params;
use crate::path::build_url;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, Method, Transport};
use crate::{Error, Result};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};

/// SSO path listing the products a user can access
pub const USER_ME_PATH: &str = "sso-server/ws/user/me";

/// Parse a response body as JSON, failing on error statuses
pub fn decode_json(response: HttpResponse) -> Result<Value> {
    if response.status >= 400 {
        return Err(Error::RequestFailed {
            status: response.status,
            body: response.body_text(),
        });
    }
    serde_json::from_slice(&response.body).map_err(|_| Error::malformed(&response.body_text()))
}

/// An accessible cube as listed by the SSO server
#[derive(Debug, Clone, PartialEq)]
pub struct CubeInfo {
    pub product_id: String,
    pub name: String,
    pub metadata: Value,
}

impl CubeInfo {
    fn from_access(access: &Value) -> Result<Self> {
        let product = access
            .get("product")
            .ok_or_else(|| Error::malformed(&access.to_string()))?;
        let text = |key: &str| match product.get(key) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        match (text("productId"), text("name")) {
            (Some(product_id), Some(name)) => Ok(Self { product_id, name, metadata: access.clone() }),
            _ => Err(Error::malformed(&access.to_string())),
        }
    }
}

/// Client handling the requests to the web services
pub struct Client {
    transport: Box<dyn Transport>,
    sso_base_url: String,
    braincube_base_url: String,
    has_placeholder: bool,
    auth: AuthHeader,
    headers: Vec<(String, String)>,
    cubes: Vec<CubeInfo>,
    params: Arc<Params>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("sso_base_url", &self.sso_base_url)
            .field("braincube_base_url", &self.braincube_base_url)
            .field("cubes", &self.cubes.len())
            .finish()
    }
}

impl Client {
    /// Connect over HTTP with a resolved configuration
    pub fn connect(config: ConnectorConfig) -> Result<Arc<Self>> {
        let transport = HttpTransport::new(Duration::from_secs(config.timeout_secs), config.verify)?;
        Self::connect_with_transport(config, Box::new(transport))
    }

    /// Resolve the configuration (in-memory, file, defaults) then connect
    pub fn from_sources(config: Option<ConnectorConfig>, config_file: Option<&Path>) -> Result<Arc<Self>> {
        let config = ConfigLocator::default().resolve(config, config_file)?;
        Self::connect(config)
    }

    /// Authenticate and list the accessible cubes through a given transport
    pub fn connect_with_transport(config: ConnectorConfig, transport: Box<dyn Transport>) -> Result<Arc<Self>> {
        let credentials = Credentials::from_config(&config)?;
        let sso_base_url = config.sso_base_url()?;
        let braincube_base_url = config.braincube_base_url()?;
        let auth = authenticate(transport.as_ref(), &sso_base_url, &credentials)?;
        let headers = generate_headers(&auth);

        let mut client = Self {
            transport,
            sso_base_url,
            braincube_base_url,
            has_placeholder: config.has_tenant_placeholder(),
            auth,
            headers,
            cubes: Vec::new(),
            params: Arc::new(Params::from_overrides(&config.parameters)),
        };
        client.cubes = client.request_braincubes()?;

        info!(
            sso = %client.sso_base_url,
            api = %client.braincube_base_url,
            cubes = client.cubes.len(),
            "Client connected"
        );
        Ok(Arc::new(client))
    }

    fn request_braincubes(&self) -> Result<Vec<CubeInfo>> {
        let url = build_url(&self.sso_base_url, USER_ME_PATH, "");
        let access_data = self.send(Method::Get, url, vec![self.auth.as_pair()], None)?;
        match access_data.get("accessList") {
            Some(Value::Array(list)) => list.iter().map(CubeInfo::from_access).collect(),
            _ => Err(Error::malformed(&access_data.to_string())),
        }
    }

    fn send(
        &self,
        method: Method,
        url: String,
        headers: Vec<(String, String)>,
        body: Option<Vec<u8>>,
    ) -> Result<Value> {
        debug!(method = %method, url = %url, "Requesting web service");
        let request = HttpRequest { method, url, headers, body };
        decode_json(self.transport.perform_request(&request)?)
    }

    /// Request a path on the API server
    ///
    /// `braincube_name` replaces the tenant placeholder of the base URL or path.
    pub fn request_ws(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        braincube_name: &str,
    ) -> Result<Value> {
        let url = build_url(&self.braincube_base_url, path, braincube_name);
        let body = body.map(|b| b.to_string().into_bytes());
        self.send(method, url, self.headers.clone(), body)
    }

    /// Request a path on the SSO server with the session headers
    pub fn request_sso(&self, path: &str) -> Result<Value> {
        let url = build_url(&self.sso_base_url, path, "");
        self.send(Method::Get, url, self.headers.clone(), None)
    }

    pub fn params(&self) -> &Arc<Params> {
        &self.params
    }

    pub fn braincube_infos(&self) -> &[CubeInfo] {
        &self.cubes
    }

    /// Whether the API base URL holds the tenant placeholder
    pub fn has_placeholder_in_braincube_url(&self) -> bool {
        self.has_placeholder
    }

    /// A cube from its name
    pub fn braincube(self: &Arc<Self>, name: &str) -> Result<Cube> {
        let info = self
            .cubes
            .iter()
            .find(|info| info.name == name)
            .ok_or_else(|| Error::UnknownCube(name.to_string()))?;
        Ok(Cube::from_info(self, info))
    }

    /// Cubes by name, or every accessible cube when no name is given
    pub fn braincube_list(self: &Arc<Self>, names: Option<&[&str]>) -> Result<Vec<Cube>> {
        match names {
            Some(names) if !names.is_empty() => names.iter().map(|name| self.braincube(name)).collect(),
            _ => Ok(self.cubes.iter().map(|info| Cube::from_info(self, info)).collect()),
        }
    }
}

/// Holds at most one active client
///
/// Replaces a process-wide instance registry: whoever owns the slot decides
/// the scope of the "one session" rule.
#[derive(Debug, Default)]
pub struct ClientSlot {
    active: Mutex<Option<Arc<Client>>>,
}

impl ClientSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a client with `connect` unless one is already active
    pub fn open_with<F>(&self, connect: F) -> Result<Arc<Client>>
    where
        F: FnOnce() -> Result<Arc<Client>>,
    {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if active.is_some() {
            return Err(Error::SessionAlreadyActive);
        }
        let client = connect()?;
        *active = Some(Arc::clone(&client));
        Ok(client)
    }

    /// Open an HTTP client from a configuration
    pub fn open(&self, config: ConnectorConfig) -> Result<Arc<Client>> {
        self.open_with(|| Client::connect(config))
    }

    pub fn get(&self) -> Option<Arc<Client>> {
        self.active.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Release the active client, if any
    pub fn close(&self) -> Option<Arc<Client>> {
        self.active.lock().unwrap_or_else(|e| e.into_inner()).take()
    }
}
