//! The transport facade: [`GraphClient`] and the [`Call`] it hands out.
//!
//! Every outbound request goes through [`GraphClient::new_call`], which binds
//! the call to the configured base URL and lets the authorizer stamp
//! credentials on it exactly once. Swapping the HTTP library only touches
//! [`Transport`].

use std::fmt;
use std::sync::Arc;

use reqwest::Url;
use tracing::debug;

use crate::authorizer::Authorizer;
use crate::config::GraphConfig;
use crate::error::GraphError;
use crate::transport::{HttpRequest, Method, ReqwestTransport, Transport};
use crate::wire::remote_error;

/// Entry point for talking to the Graph API.
///
/// Cheap to clone; clones share the underlying transport.
#[derive(Clone)]
pub struct GraphClient {
    base_url: String,
    transport: Arc<dyn Transport>,
}

impl GraphClient {
    /// Build a client backed by [`ReqwestTransport`].
    pub fn new(config: &GraphConfig) -> Result<Self, GraphError> {
        let transport = ReqwestTransport::new(config)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Build a client on top of any [`Transport`].
    pub fn with_transport(
        config: &GraphConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, GraphError> {
        Url::parse(&config.base_url).map_err(|e| {
            GraphError::Config(format!("invalid base URL {:?}: {e}", config.base_url))
        })?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            transport,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Start a `GET` call with no function set, already processed by
    /// `authorizer`.
    pub fn new_call(&self, authorizer: &dyn Authorizer) -> Call<'_> {
        let mut call = Call {
            client: self,
            method: Method::Get,
            function: String::new(),
            params: Vec::new(),
            payload: None,
        };
        authorizer.process_call(&mut call);
        call
    }

    /// Fetch an absolute URL outside the API base, e.g. a photo source.
    ///
    /// The request is stamped with [`Authorizer::process_message`] and the
    /// response body is returned as-is.
    ///
    /// The access token is appended to the query of whatever host `url`
    /// names, including third-party CDNs. Only pass URLs you would hand the
    /// token to.
    pub fn download(&self, url: &str, authorizer: &dyn Authorizer) -> Result<Vec<u8>, GraphError> {
        let url = Url::parse(url)
            .map_err(|e| GraphError::InvalidArgument(format!("invalid download URL {url:?}: {e}")))?;
        let mut message = HttpRequest::get(url);
        authorizer.process_message(&mut message);

        debug!(host = message.url.host_str().unwrap_or_default(), "downloading");
        let response = self.transport.execute(&message)?;
        if !response.is_success() {
            return Err(remote_error(response.status, &response.body));
        }
        Ok(response.body)
    }
}

impl fmt::Debug for GraphClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// One request against the Graph API.
///
/// Built by [`GraphClient::new_call`]; configure it, [`send`](Call::send) it,
/// then read the [`payload`](Call::payload).
pub struct Call<'c> {
    client: &'c GraphClient,
    method: Method,
    function: String,
    params: Vec<(String, String)>,
    payload: Option<Vec<u8>>,
}

impl<'c> Call<'c> {
    pub fn set_method(&mut self, method: Method) -> &mut Self {
        self.method = method;
        self
    }

    /// Set the path appended to the base URL, e.g. `"me"` or `"10/albums"`.
    pub fn set_function(&mut self, function: impl Into<String>) -> &mut Self {
        self.function = function.into();
        self
    }

    /// Append a parameter. Keys may repeat; order is kept.
    pub fn add_param(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// First value of `key`, if any.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// `{base_url}/{function}`.
    pub fn url(&self) -> Result<Url, GraphError> {
        let raw = format!(
            "{}/{}",
            self.client.base_url,
            self.function.trim_start_matches('/')
        );
        Url::parse(&raw)
            .map_err(|e| GraphError::InvalidArgument(format!("invalid call URL {raw:?}: {e}")))
    }

    /// Execute the call, blocking until the response arrives.
    ///
    /// A non-2xx status becomes [`GraphError::Remote`]. On success the body is
    /// kept and available through [`payload`](Call::payload).
    pub fn send(&mut self) -> Result<(), GraphError> {
        let request = HttpRequest {
            method: self.method,
            url: self.url()?,
            params: self.params.clone(),
        };

        debug!(method = %self.method, function = %self.function, "sending graph call");
        let response = self.client.transport.execute(&request)?;
        if !response.is_success() {
            debug!(status = response.status, function = %self.function, "graph call failed");
            return Err(remote_error(response.status, &response.body));
        }

        self.payload = Some(response.body);
        Ok(())
    }

    /// Body of the last successful [`send`](Call::send).
    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }
}

impl fmt::Debug for Call<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Parameter values may carry the access token.
        let keys: Vec<&str> = self.params.iter().map(|(k, _)| k.as_str()).collect();
        f.debug_struct("Call")
            .field("method", &self.method)
            .field("function", &self.function)
            .field("param_keys", &keys)
            .finish_non_exhaustive()
    }
}
