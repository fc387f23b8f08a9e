use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{Json, Response},
    routing::post,
    Router,
};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use std::sync::Arc;
use tracing::{error, info, warn};

use phasebot_core::{
    check_event_kind, run_invocation, CorrelationId, Direction, Effect, EngineError, EventType,
    GitHubClient, InvocationReport, IssueCommentPayload, RecordedEvent, Sanitizer,
    TriggerContext,
};

use crate::AppState;

pub const GITHUB_EVENT_HEADER: &str = "x-github-event";
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<InvocationReport>,
    /// Calls that went through before a tracker failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued: Option<Vec<Effect>>,
}

impl WebhookResponse {
    fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            report: None,
            issued: None,
        }
    }
}

type WebhookResult = (StatusCode, Json<WebhookResponse>);

fn reply(status: StatusCode, message: impl Into<String>) -> WebhookResult {
    (status, Json(WebhookResponse::message(message)))
}

type HmacSha256 = Hmac<Sha256>;

pub fn verify_github_signature(secret: &str, payload: &[u8], signature: &str) -> bool {
    let Some(signature_hex) = signature.strip_prefix("sha256=") else {
        return false;
    };

    let Ok(signature_bytes) = hex::decode(signature_hex) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };

    mac.update(payload);

    // Constant-time comparison
    mac.verify_slice(&signature_bytes).is_ok()
}

async fn verify_webhook_signature(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let correlation_id = CorrelationId::generate();

    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?;

    let signature = parts
        .headers
        .get(SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if !verify_github_signature(&state.webhook_secret, &bytes, signature) {
        error!("Invalid webhook signature");
        return Err(StatusCode::UNAUTHORIZED);
    }

    if let Some(ref logger) = state.recording_logger {
        let body = serde_json::from_slice::<serde_json::Value>(&bytes)
            .map(|value| Sanitizer::sanitize_json(&value))
            .unwrap_or(serde_json::Value::Null);
        logger.record(RecordedEvent::new(
            &correlation_id.0,
            EventType::WebhookReceived,
            Direction::Request,
            "webhook",
            serde_json::json!({
                "headers": Sanitizer::sanitize_header_map(&parts.headers),
                "body": body
            }),
        ));
    }

    let mut new_request = Request::from_parts(parts, axum::body::Body::from(bytes));
    new_request.extensions_mut().insert(correlation_id);

    Ok(next.run(new_request).await)
}

pub async fn github_webhook_handler(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> WebhookResult {
    let correlation_id = request
        .extensions()
        .get::<CorrelationId>()
        .cloned()
        .unwrap_or_else(CorrelationId::generate);

    let (parts, body) = request.into_parts();

    let Some(event_kind) = parts
        .headers
        .get(GITHUB_EVENT_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
    else {
        warn!("Webhook delivery without {} header", GITHUB_EVENT_HEADER);
        return reply(StatusCode::BAD_REQUEST, "missing X-GitHub-Event header");
    };

    info!("Received {} webhook", event_kind);

    if event_kind == "ping" {
        return reply(StatusCode::OK, "pong");
    }

    if let Err(e) = check_event_kind(&event_kind) {
        warn!("Rejecting delivery: {}", e);
        return reply(StatusCode::UNPROCESSABLE_ENTITY, e.to_string());
    }

    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(_) => return reply(StatusCode::BAD_REQUEST, "unreadable body"),
    };

    let payload: IssueCommentPayload = match serde_json::from_slice(&bytes) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Failed to parse webhook payload: {}", e);
            return reply(StatusCode::BAD_REQUEST, format!("invalid payload: {e}"));
        }
    };

    if payload.action.as_deref() != Some("created") {
        info!(
            "Ignoring issue_comment action {:?} on {}",
            payload.action,
            payload.repository_full_name()
        );
        return reply(StatusCode::OK, "ignored: only new comments are processed");
    }

    // Includes our own replies
    if payload.is_bot_comment() {
        info!(
            "Ignoring comment by a bot on {}",
            payload.repository_full_name()
        );
        return reply(StatusCode::OK, "ignored: comment by a bot");
    }

    if payload.is_pull_request() {
        info!(
            "Comment is on a pull request in {}, treating it as an issue",
            payload.repository_full_name()
        );
    }

    let installation_id = payload.installation_id();

    let event = match payload.into_comment_event() {
        Ok(event) => event,
        Err(e) => {
            warn!("Rejecting delivery: {}", e);
            return reply(StatusCode::UNPROCESSABLE_ENTITY, e.to_string());
        }
    };

    let tokens = match state.github_auth.token_provider(installation_id) {
        Ok(tokens) => tokens,
        Err(e) => {
            warn!("Rejecting delivery: {}", e);
            return reply(StatusCode::UNPROCESSABLE_ENTITY, e.to_string());
        }
    };

    let tracker = match GitHubClient::new_with_recording(
        &state.github_api_url,
        tokens,
        state.recording_logger.clone(),
    ) {
        Ok(client) => client.with_correlation_id(correlation_id.0.clone()),
        Err(e) => {
            error!("Failed to create GitHub client: {:#}", e);
            return reply(StatusCode::INTERNAL_SERVER_ERROR, "failed to create GitHub client");
        }
    };

    let ctx = TriggerContext {
        event_kind,
        event,
        phrases: state.phrases.clone(),
        phases: state.phases.clone(),
    };

    let result = run_invocation(&ctx, &tracker).await;
    record_invocation(&state, &correlation_id, &ctx, &result);

    match result {
        Ok(report) => (
            StatusCode::OK,
            Json(WebhookResponse {
                message: report.outcome.to_string(),
                report: Some(report),
                issued: None,
            }),
        ),
        Err(EngineError::Configuration(e)) => {
            warn!("Invocation on {} rejected: {}", ctx.event.issue, e);
            reply(StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
        }
        Err(e @ EngineError::Tracker { .. }) => {
            error!("Invocation on {} failed: {}", ctx.event.issue, e);
            (
                StatusCode::BAD_GATEWAY,
                Json(WebhookResponse {
                    message: e.to_string(),
                    report: None,
                    issued: Some(e.issued().to_vec()),
                }),
            )
        }
    }
}

fn record_invocation(
    state: &AppState,
    correlation_id: &CorrelationId,
    ctx: &TriggerContext,
    result: &Result<InvocationReport, EngineError>,
) {
    let Some(ref logger) = state.recording_logger else {
        return;
    };

    let data = match result {
        Ok(report) => serde_json::to_value(report).unwrap_or(serde_json::Value::Null),
        Err(e) => serde_json::json!({
            "error": e.to_string(),
            "issued": e.issued()
        }),
    };

    logger.record(
        RecordedEvent::new(
            &correlation_id.0,
            EventType::InvocationCompleted,
            Direction::Response,
            "invocation",
            data,
        )
        .with_metadata("issue", ctx.event.issue.to_string())
        .with_metadata("author", ctx.event.author_login.clone()),
    );
}

pub fn webhook_router(middleware_state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/webhook", post(github_webhook_handler))
        .route_layer(middleware::from_fn_with_state(
            middleware_state,
            verify_webhook_signature,
        ))
}
