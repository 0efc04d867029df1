//! Blocking HTTP transport backed by ureq.

use std::time::Duration;

use catalog_core::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};

/// Executes requests with ureq. 4xx/5xx responses come back as data so the
/// core does all status interpretation.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn execute(&mut self, req: HttpRequest) -> Result<HttpResponse, TransportError> {
        tracing::trace!(method = req.method.as_str(), path = %req.path, "sending");
        let result = match req.method {
            HttpMethod::Get | HttpMethod::Delete => {
                let mut builder = match req.method {
                    HttpMethod::Get => self.agent.get(&req.path),
                    _ => self.agent.delete(&req.path),
                };
                for (name, value) in &req.headers {
                    builder = builder.header(name, value);
                }
                builder.call()
            }
            HttpMethod::Post | HttpMethod::Put => {
                let mut builder = match req.method {
                    HttpMethod::Post => self.agent.post(&req.path),
                    _ => self.agent.put(&req.path),
                };
                for (name, value) in &req.headers {
                    builder = builder.header(name, value);
                }
                match &req.body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
        };

        let mut response = result.map_err(transport_error)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| TransportError::NoResponse(e.to_string()))?;
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn transport_error(err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::BadUri(uri) => TransportError::InvalidRequest(uri),
        other => TransportError::NoResponse(other.to_string()),
    }
}
