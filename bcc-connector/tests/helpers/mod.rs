//! Shared test utilities
//!
//! A scripted in-memory transport and a client connected through it.

#![allow(dead_code)]

use bcc_connector::transport::{HttpRequest, HttpResponse, Method, Transport};
use bcc_connector::{Client, ConnectorConfig, Result};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const SSO: &str = "https://test.com";
pub const API: &str = "https://api.test.com";
pub const USER_ME: &str = "https://test.com/sso-server/ws/user/me";

#[derive(Default)]
struct Script {
    responses: HashMap<(Method, String), HttpResponse>,
    log: Vec<HttpRequest>,
}

/// Transport answering from a table keyed by method and URL
///
/// Unknown requests get a 404. Clones share the same table and log, so a
/// test keeps one clone after handing another to the client.
#[derive(Clone, Default)]
pub struct MockTransport {
    script: Arc<Mutex<Script>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, method: Method, url: &str, status: u16, body: Value) -> &Self {
        let response = HttpResponse { status, body: body.to_string().into_bytes() };
        self.script
            .lock()
            .unwrap()
            .responses
            .insert((method, url.to_string()), response);
        self
    }

    pub fn respond_text(&self, method: Method, url: &str, status: u16, body: &str) -> &Self {
        let response = HttpResponse { status, body: body.as_bytes().to_vec() };
        self.script
            .lock()
            .unwrap()
            .responses
            .insert((method, url.to_string()), response);
        self
    }

    pub fn get(&self, url: &str, body: Value) -> &Self {
        self.respond(Method::Get, url, 200, body)
    }

    pub fn post(&self, url: &str, body: Value) -> &Self {
        self.respond(Method::Post, url, 200, body)
    }

    /// Every request seen so far
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.script.lock().unwrap().log.clone()
    }

    /// URLs of the requests seen so far, minus the connection requests
    pub fn api_urls(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .map(|r| r.url)
            .filter(|url| url.starts_with(API))
            .collect()
    }

    pub fn clear_log(&self) {
        self.script.lock().unwrap().log.clear();
    }
}

impl Transport for MockTransport {
    fn perform_request(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let mut script = self.script.lock().unwrap();
        script.log.push(request.clone());
        let response = script
            .responses
            .get(&(request.method, request.url.clone()))
            .cloned()
            .unwrap_or_else(|| HttpResponse {
                status: 404,
                body: format!("no route for {} {}", request.method, request.url).into_bytes(),
            });
        Ok(response)
    }
}

/// Access list with the given cube names
pub fn access_list(names: &[&str]) -> Value {
    let list: Vec<Value> = names
        .iter()
        .enumerate()
        .map(|(i, name)| json!({"product": {"name": name, "productId": (i + 1).to_string()}}))
        .collect();
    json!({ "accessList": list })
}

pub fn test_config() -> ConnectorConfig {
    ConnectorConfig::with_api_key("test.com", "abcd")
}

/// Client for `config` whose access list holds the `demo` cube
pub fn connect_with(config: ConnectorConfig) -> (Arc<Client>, MockTransport) {
    let transport = MockTransport::new();
    transport.get(USER_ME, access_list(&["demo"]));
    let client = Client::connect_with_transport(config, Box::new(transport.clone())).unwrap();
    transport.clear_log();
    (client, transport)
}

pub fn connect() -> (Arc<Client>, MockTransport) {
    connect_with(test_config())
}

/// Url of a memory base resource of the `demo` cube
pub fn mb_url(rest: &str) -> String {
    format!("{}/braincube/demo/braincube/mb/{}", API, rest)
}
