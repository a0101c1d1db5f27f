use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{blocking::Client, Method};
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;
use wsx_domain::Environment;

const USER_AGENT: &str = concat!("wsx/", env!("CARGO_PKG_VERSION"));

/// Issues one authenticated REST action and returns the parsed body.
///
/// `action` is relative to the API base (for example `workspace/list`).
pub trait Transport {
    fn get(&self, action: &str, body: &Value) -> Result<Value>;
    fn post(&self, action: &str, body: &Value) -> Result<Value>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, action: &str, body: &Value) -> Result<Value> {
        (**self).get(action, body)
    }

    fn post(&self, action: &str, body: &Value) -> Result<Value> {
        (**self).post(action, body)
    }
}

pub struct HttpTransport {
    client: Client,
    base_url: Url,
    token: String,
}

impl HttpTransport {
    /// Builds a transport bound to the instance and token of `environment`.
    ///
    /// # Errors
    /// Returns an error if the host does not form a valid URL or the HTTP
    /// client cannot be constructed.
    pub fn for_environment(environment: &Environment, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(&environment.api_base())
            .with_context(|| format!("invalid workspace host {}", environment.host()))?;
        Self::with_base_url(base_url, environment.token(), timeout)
    }

    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn with_base_url(mut base_url: Url, token: &str, timeout: Duration) -> Result<Self> {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            client,
            base_url,
            token: token.to_string(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn send(&self, method: Method, action: &str, body: &Value) -> Result<Value> {
        let url = self
            .base_url
            .join(action)
            .with_context(|| format!("invalid action {action}"))?;
        debug!(%method, action, "workspace api request");
        let response = self
            .client
            .request(method.clone(), url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .with_context(|| format!("{method} {action} request failed"))?;
        let status = response.status();
        let text = response
            .text()
            .with_context(|| format!("failed to read {action} response"))?;
        debug!(action, status = status.as_u16(), bytes = text.len(), "workspace api response");
        if text.trim().is_empty() {
            return Ok(Value::Object(Map::new()));
        }
        serde_json::from_str(&text)
            .with_context(|| format!("{action} returned a non-JSON body (HTTP {status})"))
    }
}

impl Transport for HttpTransport {
    fn get(&self, action: &str, body: &Value) -> Result<Value> {
        self.send(Method::GET, action, body)
    }

    fn post(&self, action: &str, body: &Value) -> Result<Value> {
        self.send(Method::POST, action, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httptest::{matchers::*, responders::*, Expectation, Server};
    use serde_json::json;
    use std::panic;

    fn start_server() -> Option<Server> {
        match panic::catch_unwind(Server::run) {
            Ok(server) => Some(server),
            Err(_) => {
                eprintln!("skipping transport test (httptest server unavailable)");
                None
            }
        }
    }

    fn transport_for(server: &Server) -> HttpTransport {
        let base = Url::parse(&server.url_str("/api/2.0")).unwrap();
        HttpTransport::with_base_url(base, "dapi-test", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn get_sends_bearer_token_and_json_body() -> Result<()> {
        let Some(server) = start_server() else {
            return Ok(());
        };
        server.expect(
            Expectation::matching(all_of![
                request::method_path("GET", "/api/2.0/workspace/list"),
                request::headers(contains(("authorization", "Bearer dapi-test"))),
                request::body(json_decoded(eq(json!({"path": "/Shared"})))),
            ])
            .respond_with(json_encoded(json!({"objects": []}))),
        );

        let transport = transport_for(&server);
        let body = transport.get("workspace/list", &json!({"path": "/Shared"}))?;
        assert_eq!(body, json!({"objects": []}));
        Ok(())
    }

    #[test]
    fn error_statuses_still_yield_the_error_body() -> Result<()> {
        let Some(server) = start_server() else {
            return Ok(());
        };
        server.expect(
            Expectation::matching(request::method_path("POST", "/api/2.0/workspace/import"))
                .respond_with(
                    status_code(400)
                        .body(r#"{"error_code":"RESOURCE_ALREADY_EXISTS","message":"exists"}"#),
                ),
        );

        let transport = transport_for(&server);
        let body = transport.post("workspace/import", &json!({"path": "/a"}))?;
        assert_eq!(body["error_code"], "RESOURCE_ALREADY_EXISTS");
        Ok(())
    }

    #[test]
    fn empty_bodies_parse_as_empty_objects() -> Result<()> {
        let Some(server) = start_server() else {
            return Ok(());
        };
        server.expect(
            Expectation::matching(request::method_path("POST", "/api/2.0/workspace/mkdirs"))
                .respond_with(status_code(200)),
        );

        let transport = transport_for(&server);
        let body = transport.post("workspace/mkdirs", &json!({"path": "/a"}))?;
        assert_eq!(body, json!({}));
        Ok(())
    }

    #[test]
    fn non_json_bodies_are_transport_errors() {
        let Some(server) = start_server() else {
            return;
        };
        server.expect(
            Expectation::matching(request::method_path("GET", "/api/2.0/jobs/runs/get"))
                .respond_with(status_code(502).body("<html>bad gateway</html>")),
        );

        let transport = transport_for(&server);
        let err = transport
            .get("jobs/runs/get", &json!({"run_id": 1}))
            .expect_err("html body should not parse");
        assert!(
            err.to_string().contains("non-JSON body (HTTP 502"),
            "unexpected error text: {err}"
        );
    }

    #[test]
    fn base_url_gains_trailing_slash() {
        let base = Url::parse("https://example.net/api/2.0").unwrap();
        let transport = HttpTransport::with_base_url(base, "t", Duration::from_secs(1)).unwrap();
        assert_eq!(transport.base_url().as_str(), "https://example.net/api/2.0/");
    }
}
