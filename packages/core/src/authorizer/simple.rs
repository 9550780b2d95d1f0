//! Authorizer for a token obtained out of band.

use std::fmt;
use std::sync::Mutex;

use tokio_util::sync::CancellationToken;

use super::{append_token, lock, Authorizer, ACCESS_TOKEN_PARAM};
use crate::client::Call;
use crate::error::GraphError;
use crate::transport::HttpRequest;

/// Authorizer holding a literal access token, e.g. one copied from the Graph
/// API explorer.
pub struct SimpleAuthorizer {
    access_token: Mutex<String>,
}

impl SimpleAuthorizer {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: Mutex::new(access_token.into()),
        }
    }

    pub fn access_token(&self) -> String {
        lock(&self.access_token).clone()
    }

    /// Swap in a token obtained elsewhere.
    pub fn set_access_token(&self, access_token: impl Into<String>) {
        *lock(&self.access_token) = access_token.into();
    }
}

impl Authorizer for SimpleAuthorizer {
    fn process_call(&self, call: &mut Call<'_>) {
        let token = lock(&self.access_token);
        call.add_param(ACCESS_TOKEN_PARAM, token.as_str());
    }

    fn process_message(&self, message: &mut HttpRequest) {
        let token = lock(&self.access_token);
        append_token(message, &token);
    }

    fn refresh_authorization(&self, _cancel: &CancellationToken) -> Result<bool, GraphError> {
        Ok(false)
    }
}

impl fmt::Debug for SimpleAuthorizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleAuthorizer")
            .field("access_token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{client_with, StubTransport};
    use reqwest::Url;

    #[test]
    fn process_call_adds_current_token() {
        let (client, _) = client_with(StubTransport::new());
        let auth = SimpleAuthorizer::new("T");

        let call = client.new_call(&auth);
        assert_eq!(call.param("access_token"), Some("T"));

        auth.set_access_token("T2");
        let call = client.new_call(&auth);
        assert_eq!(call.param("access_token"), Some("T2"));
    }

    #[test]
    fn process_message_appends_to_query() {
        let auth = SimpleAuthorizer::new("T");
        let mut message = HttpRequest::get(Url::parse("https://cdn.example.com/a.jpg").unwrap());
        auth.process_message(&mut message);
        assert_eq!(message.url.query(), Some("access_token=T"));
    }

    #[test]
    fn cannot_refresh() {
        let auth = SimpleAuthorizer::new("T");
        assert!(!auth.refresh_authorization(&CancellationToken::new()).unwrap());
        assert_eq!(auth.access_token(), "T");
    }

    #[test]
    fn debug_hides_token() {
        let rendered = format!("{:?}", SimpleAuthorizer::new("secret-token"));
        assert!(!rendered.contains("secret-token"));
    }
}
