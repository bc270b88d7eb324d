//! `POST /content/suggest`.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use suggest_aggregator::RequestContext;
use uuid::Uuid;

use super::AppState;

/// Transaction id header, in and out.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
/// Calling system header.
pub const X_ORIGIN: HeaderName = HeaderName::from_static("x-origin");
/// Debug flag header.
pub const DEBUG: HeaderName = HeaderName::from_static("debug");

const INVALID_PAYLOAD: &str = "Payload should be a non-empty JSON object";
const AGGREGATION_FAILED: &str = "aggregating suggestions failed!";

/// JSON error body.
#[derive(Debug, Serialize)]
struct Message {
    message: &'static str,
}

/// Aggregate suggestions for the posted content.
pub async fn suggest(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let transaction_id = transaction_id(&headers);
    let mut ctx = RequestContext::new(transaction_id.clone());
    if let Some(origin) = header_str(&headers, &X_ORIGIN) {
        ctx = ctx.with_origin(origin);
    }
    if let Some(debug) = header_str(&headers, &DEBUG) {
        ctx = ctx.with_debug(debug);
    }
    // A dropped handler (client gone) cancels in-flight upstream lookups.
    let _cancel_on_drop = ctx.cancel.clone().drop_guard();

    tracing::debug!(
        transaction_id = %transaction_id,
        body = %String::from_utf8_lossy(&body),
        "request body"
    );

    if let Err(reason) = validate_payload(&body) {
        tracing::error!(
            transaction_id = %transaction_id,
            error = %reason,
            "client error: payload should be a non-empty JSON object"
        );
        return respond(
            StatusCode::BAD_REQUEST,
            &transaction_id,
            Json(Message {
                message: INVALID_PAYLOAD,
            }),
        );
    }

    match state.aggregator.aggregate(&body, &ctx).await {
        Ok(response) => {
            if response.suggestions.is_empty() {
                tracing::warn!(transaction_id = %transaction_id, "suggestions are empty");
            }
            respond(StatusCode::OK, &transaction_id, Json(response))
        }
        Err(e) => {
            tracing::error!(
                transaction_id = %transaction_id,
                error = %e,
                "aggregating suggestions failed"
            );
            respond(
                StatusCode::SERVICE_UNAVAILABLE,
                &transaction_id,
                Json(Message {
                    message: AGGREGATION_FAILED,
                }),
            )
        }
    }
}

fn respond(status: StatusCode, transaction_id: &str, body: impl IntoResponse) -> Response {
    let mut response = (status, body).into_response();
    if let Ok(value) = HeaderValue::from_str(transaction_id) {
        response.headers_mut().insert(X_REQUEST_ID, value);
    }
    response
}

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// The caller's transaction id, or a freshly generated one.
pub fn transaction_id(headers: &HeaderMap) -> String {
    header_str(headers, &X_REQUEST_ID)
        .map(str::to_owned)
        .unwrap_or_else(new_transaction_id)
}

/// Generate a transaction id of the form `tid_<uuid>`.
pub fn new_transaction_id() -> String {
    format!("tid_{}", Uuid::new_v4().simple())
}

/// Accept only a JSON object with at least one field.
fn validate_payload(body: &[u8]) -> Result<(), String> {
    let object: serde_json::Map<String, serde_json::Value> =
        serde_json::from_slice(body).map_err(|e| e.to_string())?;
    if object.is_empty() {
        return Err("valid but empty JSON request".into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_id_taken_from_header() {
        let mut headers = HeaderMap::new();
        headers.insert(X_REQUEST_ID, HeaderValue::from_static("tid_caller"));
        assert_eq!(transaction_id(&headers), "tid_caller");
    }

    #[test]
    fn transaction_id_generated_when_missing_or_blank() {
        let generated = transaction_id(&HeaderMap::new());
        assert!(generated.starts_with("tid_"));
        assert_eq!(generated.len(), "tid_".len() + 32);

        let mut headers = HeaderMap::new();
        headers.insert(X_REQUEST_ID, HeaderValue::from_static("  "));
        assert!(transaction_id(&headers).starts_with("tid_"));
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(new_transaction_id(), new_transaction_id());
    }

    #[test]
    fn payload_must_be_non_empty_object() {
        assert!(validate_payload(br#"{"bodyXML":"x"}"#).is_ok());
        assert!(validate_payload(b"{}").is_err());
        assert!(validate_payload(b"[1,2]").is_err());
        assert!(validate_payload(b"\"text\"").is_err());
        assert!(validate_payload(b"").is_err());
        assert!(validate_payload(b"{broken").is_err());
    }

    #[test]
    fn respond_echoes_transaction_id() {
        let response = respond(StatusCode::OK, "tid_echo", "body");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(X_REQUEST_ID).and_then(|v| v.to_str().ok()),
            Some("tid_echo")
        );
    }
}
