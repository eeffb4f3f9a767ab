#[cfg(test)]
pub(crate) mod test_server;

use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

const ERROR_BODY_PREVIEW_CHARS: usize = 240;

/// Blocking JSON-over-HTTP transport bound to one API base URL.
///
/// Every call is a single round trip with the configured connect/read
/// deadlines. Failures are never retried here; callers decide what a failed
/// call means for their flow.
#[derive(Debug, Clone)]
pub(crate) struct HttpClient {
    agent: ureq::Agent,
    config: ClientConfig,
}

impl HttpClient {
    pub(crate) fn new(config: &ClientConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(config.connect_timeout)
            .timeout_read(config.read_timeout)
            .timeout_write(config.read_timeout)
            .build();
        Self {
            agent,
            config: config.clone(),
        }
    }

    pub(crate) fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn get(&self, path: &str, bearer: Option<&str>) -> ClientResult<String> {
        self.send("GET", path, bearer, None)
    }

    pub(crate) fn post_json(
        &self,
        path: &str,
        bearer: Option<&str>,
        body: &str,
    ) -> ClientResult<String> {
        self.send("POST", path, bearer, Some(body))
    }

    fn send(
        &self,
        method: &str,
        path: &str,
        bearer: Option<&str>,
        body: Option<&str>,
    ) -> ClientResult<String> {
        let url = self.config.endpoint(path);
        debug!(method, path, authenticated = bearer.is_some(), "sending request");

        let mut request = self
            .agent
            .request(method, &url)
            .set("Content-Type", "application/json");
        if let Some(token) = bearer {
            request = request.set("Authorization", &format!("Bearer {token}"));
        }

        let result = match body {
            Some(body) => request.send_string(body),
            None => request.call(),
        };

        match result {
            Ok(response) => {
                debug!(method, path, status = response.status(), "request succeeded");
                response.into_string().map_err(|err| {
                    ClientError::transport(format!("response read failed: {err}"))
                })
            }
            Err(ureq::Error::Status(status, response)) => {
                let response_body = response.into_string().ok().unwrap_or_default();
                let message = describe_status(status, &response_body);
                debug!(method, path, status, "request rejected");
                Err(ClientError::Network {
                    status: Some(status),
                    message,
                })
            }
            Err(ureq::Error::Transport(err)) => {
                warn!(method, path, error = %err, "transport failure");
                Err(ClientError::transport(format!("transport error: {err}")))
            }
        }
    }
}

fn describe_status(status: u16, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        format!("HTTP status {status}")
    } else {
        let truncated = body
            .chars()
            .take(ERROR_BODY_PREVIEW_CHARS)
            .collect::<String>();
        format!("HTTP status {status} ({truncated})")
    }
}
