use crate::auth::{AuthMiddleware, AuthState};
use crate::error::Error;
use async_trait::async_trait;
use serde_json::Value;
use surf::http::Method;
use surf::{Client, StatusCode, Url};
use utils::surf_logging::SurfLogging;

/// Boundary between the cache layer and the actual HTTP client. The backend
/// is an opaque collection of JSON REST resources, so everything comes back
/// as a raw `Value`; typed decoding happens above.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, method: Method, url: Url, body: Option<Value>) -> Result<Value, Error>;
}

/// Production transport over surf, with request logging and bearer-token
/// injection installed as middleware.
pub struct SurfTransport {
    http: Client,
}

impl SurfTransport {
    pub(crate) fn new(auth: AuthState) -> Self {
        Self {
            http: Client::new()
                .with(SurfLogging)
                .with(AuthMiddleware::new(auth)),
        }
    }
}

#[async_trait]
impl HttpTransport for SurfTransport {
    async fn send(&self, method: Method, url: Url, body: Option<Value>) -> Result<Value, Error> {
        let mut req = surf::Request::new(method, url);
        if let Some(body) = &body {
            req.body_json(body)
                .map_err(|err| Error::Decode(err.to_string()))?;
        }

        let mut res = self
            .http
            .send(req)
            .await
            .map_err(|err| Error::Network(err.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let message = error_message(&mut res, status).await;
            return Err(Error::Http {
                status: status.into(),
                message,
            });
        }

        if status == StatusCode::NoContent {
            return Ok(Value::Null);
        }

        let raw = res
            .body_string()
            .await
            .map_err(|err| Error::Network(err.to_string()))?;
        if raw.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&raw).map_err(|err| Error::Decode(err.to_string()))
    }
}

/// Pull a human-readable message out of an error response, preferring the
/// backend's own `message` field.
async fn error_message(res: &mut surf::Response, status: StatusCode) -> String {
    match res.body_string().await {
        Ok(body) if !body.is_empty() => serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|value| {
                value
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_owned)
            })
            .unwrap_or(body),
        _ => status.canonical_reason().to_string(),
    }
}
