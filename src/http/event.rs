//! Invocation payloads: the inbound event, its context, and the result.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::http::headers::HeaderMapping;

/// Opaque invocation metadata, forwarded as-is.
pub type InvocationContext = Value;

/// One inbound request as delivered by the invocation runtime.
///
/// Fields the gateway does not interpret are kept in `extra` so the whole
/// event can be handed to the local server unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundEvent {
    pub http_method: String,

    pub path: String,

    #[serde(default)]
    pub query_string_parameters: Option<BTreeMap<String, String>>,

    /// `None` when the event carries `"headers": null` or omits the field.
    #[serde(default)]
    pub headers: Option<HeaderMapping>,

    #[serde(default)]
    pub body: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InboundEvent {
    pub fn new(http_method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            http_method: http_method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(HeaderMapping::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_string_parameters
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// The single response produced for an invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundResult {
    pub status_code: u16,
    pub headers: HeaderMapping,
    pub body: String,
}

impl OutboundResult {
    /// The local server could not be started.
    pub fn internal_error() -> Self {
        Self::error(500, "Internal Server Error")
    }

    /// The local server could not be reached or the exchange failed.
    pub fn bad_gateway() -> Self {
        Self::error(502, "502 Bad Gateway")
    }

    fn error(status_code: u16, message: &str) -> Self {
        Self {
            status_code,
            headers: HeaderMapping::new(),
            body: serde_json::json!({ "error": message }).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_gateway_event_and_keeps_unknown_fields() {
        let event: InboundEvent = serde_json::from_value(json!({
            "httpMethod": "POST",
            "path": "/users",
            "queryStringParameters": {"page": "2"},
            "headers": {"Content-Type": "application/json"},
            "body": "{\"name\":\"ada\"}",
            "requestContext": {"stage": "prod"},
            "isBase64Encoded": false
        }))
        .unwrap();

        assert_eq!(event.http_method, "POST");
        assert_eq!(event.path, "/users");
        assert_eq!(
            event.query_string_parameters.as_ref().unwrap()["page"],
            "2"
        );
        assert_eq!(event.headers.as_ref().unwrap()["Content-Type"], "application/json");
        assert_eq!(event.body.as_deref(), Some("{\"name\":\"ada\"}"));
        assert_eq!(event.extra["requestContext"], json!({"stage": "prod"}));

        let round_trip = serde_json::to_value(&event).unwrap();
        assert_eq!(round_trip["requestContext"]["stage"], "prod");
        assert_eq!(round_trip["httpMethod"], "POST");
    }

    #[test]
    fn null_fields_are_accepted() {
        let event: InboundEvent = serde_json::from_value(json!({
            "httpMethod": "GET",
            "path": "/",
            "queryStringParameters": null,
            "headers": null,
            "body": null
        }))
        .unwrap();

        assert!(event.query_string_parameters.is_none());
        assert!(event.headers.is_none());
        assert!(event.body.is_none());
    }

    #[test]
    fn null_headers_are_forwarded_as_null() {
        let event: InboundEvent = serde_json::from_value(json!({
            "httpMethod": "GET",
            "path": "/",
            "headers": null
        }))
        .unwrap();

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["headers"], Value::Null);

        let with_header = InboundEvent::new("GET", "/").with_header("X-Id", "7");
        let value = serde_json::to_value(&with_header).unwrap();
        assert_eq!(value["headers"], json!({"X-Id": "7"}));
    }

    #[test]
    fn error_results_have_fixed_shape() {
        let internal = OutboundResult::internal_error();
        assert_eq!(internal.status_code, 500);
        assert!(internal.headers.is_empty());
        assert_eq!(internal.body, r#"{"error":"Internal Server Error"}"#);

        let gateway = OutboundResult::bad_gateway();
        assert_eq!(gateway.status_code, 502);
        assert!(gateway.headers.is_empty());
        assert_eq!(gateway.body, r#"{"error":"502 Bad Gateway"}"#);
    }

    #[test]
    fn result_serializes_in_camel_case() {
        let value = serde_json::to_value(OutboundResult::bad_gateway()).unwrap();
        assert_eq!(value["statusCode"], 502);
        assert_eq!(value["headers"], json!({}));
    }
}
