//! The HTTP seam.
//!
//! Everything above this module speaks in [`HttpRequest`] and
//! [`HttpResponse`]; the [`Transport`] trait is the only place that touches a
//! real HTTP library. [`ReqwestTransport`] is the production implementation.

use std::fmt;
use std::sync::mpsc;
use std::thread;

use reqwest::Url;
use tracing::debug;

use crate::config::GraphConfig;
use crate::error::GraphError;

/// HTTP methods used by the Graph API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully resolved outbound request.
///
/// `params` go into the query string for `GET` and `DELETE`, and into an
/// `application/x-www-form-urlencoded` body for `POST`. Order is preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub params: Vec<(String, String)>,
}

impl HttpRequest {
    /// A parameterless `GET` for an absolute URL. Used for raw downloads that
    /// bypass [`Call`](crate::Call).
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::Get,
            url,
            params: Vec::new(),
        }
    }

    /// First value of `key`, looking at `params` and then the URL query.
    pub fn param(&self, key: &str) -> Option<String> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .or_else(|| {
                self.url
                    .query_pairs()
                    .find(|(k, _)| k == key)
                    .map(|(_, v)| v.into_owned())
            })
    }
}

/// Status and body of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A synchronous request/response client.
///
/// Implementations must not retry and must report non-2xx responses as
/// ordinary [`HttpResponse`]s; status handling happens in [`Call`](crate::Call).
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, GraphError>;
}

/// [`Transport`] backed by a blocking [`reqwest`] client.
///
/// The client lives on a dedicated `fbgraph-http` thread and requests are
/// handed to it over a channel. It is therefore created, used and dropped
/// outside any Tokio runtime, so a `ReqwestTransport` may be built and
/// dropped from async code and driven from the async façade's workers.
///
/// Clones share the worker; it exits once the last clone is dropped.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    jobs: mpsc::Sender<Job>,
}

type Reply = mpsc::SyncSender<Result<HttpResponse, GraphError>>;
type Job = (HttpRequest, Reply);

impl ReqwestTransport {
    /// Build a client with the timeout and user agent from `config`.
    pub fn new(config: &GraphConfig) -> Result<Self, GraphError> {
        let timeout = config.timeout;
        let user_agent = config.user_agent.clone();
        Self::spawn(move || {
            reqwest::blocking::Client::builder()
                .timeout(timeout)
                .user_agent(user_agent)
                .build()
        })
    }

    /// Wrap a pre-configured client.
    pub fn from_client(client: reqwest::blocking::Client) -> Result<Self, GraphError> {
        Self::spawn(move || Ok(client))
    }

    fn spawn<B>(build: B) -> Result<Self, GraphError>
    where
        B: FnOnce() -> Result<reqwest::blocking::Client, reqwest::Error> + Send + 'static,
    {
        let (jobs, queue) = mpsc::channel::<Job>();
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);

        thread::Builder::new()
            .name("fbgraph-http".into())
            .spawn(move || {
                let client = match build() {
                    Ok(client) => {
                        let _ = ready_tx.send(Ok(()));
                        client
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                for (request, reply) in queue {
                    let _ = reply.send(execute_blocking(&client, &request));
                }
                debug!("http worker stopped");
            })
            .map_err(|e| GraphError::Transport(format!("could not start HTTP worker: {e}")))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self { jobs }),
            Ok(Err(e)) => Err(GraphError::Http(e)),
            Err(_) => Err(GraphError::Transport("HTTP worker exited during startup".into())),
        }
    }
}

fn execute_blocking(
    client: &reqwest::blocking::Client,
    request: &HttpRequest,
) -> Result<HttpResponse, GraphError> {
    let url = request.url.clone();
    let builder = match request.method {
        Method::Get => client.get(url).query(&request.params),
        Method::Delete => client.delete(url).query(&request.params),
        Method::Post => client.post(url).form(&request.params),
    };

    let response = builder.send()?;
    let status = response.status().as_u16();
    let body = response.bytes()?.to_vec();
    Ok(HttpResponse { status, body })
}

impl Transport for ReqwestTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, GraphError> {
        let stopped = || GraphError::Transport("HTTP worker has stopped".into());
        let (reply, response) = mpsc::sync_channel(1);
        self.jobs
            .send((request.clone(), reply))
            .map_err(|_| stopped())?;
        response.recv().map_err(|_| stopped())?
    }
}
