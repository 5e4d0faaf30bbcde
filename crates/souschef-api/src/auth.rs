//! Slack request signing.
//!
//! Every Events API request carries `X-Slack-Request-Timestamp` and
//! `X-Slack-Signature: v0=<hex>`, an HMAC-SHA256 of `v0:<timestamp>:<body>`
//! keyed with the app's signing secret.

use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

use crate::error::ApiError;
use crate::state::{AppState, Backend};

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-slack-signature";
pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";

/// Requests older (or newer) than this are treated as replays.
pub const MAX_CLOCK_SKEW_SECS: i64 = 300;

/// Largest webhook body that will be buffered for verification.
const MAX_BODY_BYTES: usize = 1024 * 1024;

const VERSION: &str = "v0";

fn mac_for(secret: &str, timestamp: &str, body: &[u8]) -> Result<HmacSha256, &'static str> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| "Unusable signing secret")?;
    mac.update(VERSION.as_bytes());
    mac.update(b":");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);
    Ok(mac)
}

/// The `X-Slack-Signature` value Slack would send for this request.
pub fn sign(secret: &str, timestamp: &str, body: &[u8]) -> Result<String, &'static str> {
    let digest = mac_for(secret, timestamp, body)?.finalize().into_bytes();
    Ok(format!("{}={}", VERSION, hex::encode(digest)))
}

/// Check a request's signature headers against `body`, with `now` in epoch seconds.
///
/// Returns the reason for rejection on failure.
pub fn verify(
    secret: &str,
    headers: &HeaderMap,
    body: &[u8],
    now: i64,
) -> Result<(), &'static str> {
    let timestamp = headers
        .get(TIMESTAMP_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or("Missing request timestamp")?;
    let sent_at: i64 = timestamp.parse().map_err(|_| "Invalid request timestamp")?;
    if (now - sent_at).abs() > MAX_CLOCK_SKEW_SECS {
        return Err("Stale request timestamp");
    }

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or("Missing request signature")?;
    let digest = signature
        .strip_prefix("v0=")
        .and_then(|h| hex::decode(h).ok())
        .ok_or("Malformed request signature")?;

    mac_for(secret, timestamp, body)?
        .verify_slice(&digest)
        .map_err(|_| "Invalid request signature")
}

/// Middleware that rejects webhook requests not signed by Slack.
///
/// The body is buffered to compute the signature and handed on unchanged.
pub async fn verify_slack_signature(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let secret = match &state.backend {
        Backend::Slack(transport) => transport.signing_secret().to_string(),
        Backend::WebSocket(_) => return next.run(req).await,
    };

    let (parts, body) = req.into_parts();
    let bytes: Bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return ApiError::BadRequest("Request body too large or unreadable".into())
                .into_response()
        }
    };

    if let Err(reason) = verify(&secret, &parts.headers, &bytes, Utc::now().timestamp()) {
        warn!(reason, "Rejected unsigned Slack request");
        return ApiError::Unauthorized(reason.to_string()).into_response();
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}
