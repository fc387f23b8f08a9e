use super::sanitizer::Sanitizer;
use super::types::{CorrelationId, CORRELATION_ID_HEADER};
use super::{Direction, EventType, RecordedEvent, RecordingLogger};
use reqwest::{Request, Response};
use reqwest_middleware::{Middleware, Next, Result as MiddlewareResult};
use std::collections::HashMap;

/// Records every outgoing GitHub request and its response (or error).
pub struct RecordingMiddleware {
    logger: RecordingLogger,
}

impl RecordingMiddleware {
    pub fn new(logger: RecordingLogger) -> Self {
        Self { logger }
    }
}

#[async_trait::async_trait]
impl Middleware for RecordingMiddleware {
    async fn handle(
        &self,
        mut req: Request,
        extensions: &mut http::Extensions,
        next: Next<'_>,
    ) -> MiddlewareResult<Response> {
        // Header wins, then extensions, then a fresh id
        let correlation_id = req
            .headers()
            .get(CORRELATION_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .or_else(|| extensions.get::<CorrelationId>().map(|id| id.0.clone()))
            .unwrap_or_else(|| CorrelationId::generate().0);

        if !req.headers().contains_key(CORRELATION_ID_HEADER) {
            if let Ok(value) = correlation_id.parse() {
                req.headers_mut().insert(CORRELATION_ID_HEADER, value);
            }
        }

        let request_data = extract_request_data(&req);
        let operation = format!("{} {}", request_data.method, req.url().path());
        self.logger.record(RecordedEvent::new(
            &correlation_id,
            EventType::GitHubApiCall,
            Direction::Request,
            operation,
            serde_json::to_value(&request_data).unwrap_or(serde_json::Value::Null),
        ));

        let response = next.run(req, extensions).await;

        let (operation, data) = match &response {
            Ok(resp) => {
                let data = ResponseData {
                    status_code: resp.status().as_u16(),
                    headers: Sanitizer::sanitize_header_map(resp.headers()),
                    body_size: resp.content_length().unwrap_or(0),
                };
                (
                    format!("response_{}", data.status_code),
                    serde_json::to_value(&data).unwrap_or(serde_json::Value::Null),
                )
            }
            Err(err) => (
                "error".to_string(),
                serde_json::json!({
                    "error": err.to_string(),
                    "error_type": format!("{:?}", err)
                }),
            ),
        };
        self.logger.record(RecordedEvent::new(
            &correlation_id,
            EventType::GitHubApiCall,
            Direction::Response,
            operation,
            data,
        ));

        response
    }
}

fn extract_request_data(request: &Request) -> RequestData {
    let body = match request.body().map(|body| body.as_bytes()) {
        None => "[NO_BODY]".to_string(),
        Some(None) => "[STREAM_BODY]".to_string(),
        Some(Some(bytes)) if bytes.len() > 10_000 => format!("[LARGE_BODY_{}b]", bytes.len()),
        Some(Some(bytes)) => match serde_json::from_slice::<serde_json::Value>(bytes) {
            Ok(json) => Sanitizer::sanitize_json(&json).to_string(),
            Err(_) => String::from_utf8_lossy(bytes).into_owned(),
        },
    };

    RequestData {
        method: request.method().to_string(),
        url: request.url().to_string(),
        headers: Sanitizer::sanitize_header_map(request.headers()),
        body,
    }
}

#[derive(Debug, serde::Serialize)]
struct RequestData {
    method: String,
    url: String,
    headers: HashMap<String, String>,
    body: String,
}

#[derive(Debug, serde::Serialize)]
struct ResponseData {
    status_code: u16,
    headers: HashMap<String, String>,
    body_size: u64,
}
