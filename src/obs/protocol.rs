//! obs-websocket v5 payloads.
//!
//! Minimal subset of the protocol: the Hello/Identify handshake and the
//! request/response envelope, as plain JSON values. Only the ops this
//! client actually exchanges are modeled.

use base64::Engine;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

/// Op codes from the obs-websocket 5.x protocol.
pub mod opcode {
    pub const HELLO: u64 = 0;
    pub const IDENTIFY: u64 = 1;
    pub const IDENTIFIED: u64 = 2;
    pub const REQUEST: u64 = 6;
    pub const REQUEST_RESPONSE: u64 = 7;
}

/// RPC version this client negotiates.
pub const RPC_VERSION: u64 = 1;

/// Compute the Identify authentication string for a challenged Hello.
///
/// Two rounds of sha256+base64: first over `password + salt`, then over
/// that digest string + `challenge`.
pub fn auth_response(password: &str, salt: &str, challenge: &str) -> String {
    let engine = base64::engine::general_purpose::STANDARD;
    let secret = engine.encode(Sha256::digest(format!("{password}{salt}")));
    engine.encode(Sha256::digest(format!("{secret}{challenge}")))
}

/// Build the Identify message answering `hello`.
///
/// Includes an authentication string only when the Hello carried a
/// challenge. Subscribes to no events; this client only issues requests.
pub fn identify_for(hello: &Value, password: &str) -> Value {
    let mut data = json!({
        "rpcVersion": RPC_VERSION,
        "eventSubscriptions": 0,
    });

    if let Some(auth) = hello.get("d").and_then(|d| d.get("authentication")) {
        let salt = auth.get("salt").and_then(Value::as_str).unwrap_or_default();
        let challenge = auth
            .get("challenge")
            .and_then(Value::as_str)
            .unwrap_or_default();
        data["authentication"] = Value::String(auth_response(password, salt, challenge));
    }

    json!({ "op": opcode::IDENTIFY, "d": data })
}

/// Build a `SetCurrentProgramScene` request.
pub fn set_scene_request(request_id: &str, scene: &str) -> Value {
    json!({
        "op": opcode::REQUEST,
        "d": {
            "requestType": "SetCurrentProgramScene",
            "requestId": request_id,
            "requestData": { "sceneName": scene },
        }
    })
}

/// Build a `GetVersion` request.
pub fn get_version_request(request_id: &str) -> Value {
    json!({
        "op": opcode::REQUEST,
        "d": {
            "requestType": "GetVersion",
            "requestId": request_id,
        }
    })
}

/// Op code of a message, if present.
pub fn op_of(message: &Value) -> Option<u64> {
    message.get("op").and_then(Value::as_u64)
}

/// The `d` payload of a RequestResponse matching `request_id`.
///
/// `None` for any other op or another request's response.
pub fn response_for<'a>(message: &'a Value, request_id: &str) -> Option<&'a Value> {
    if op_of(message) != Some(opcode::REQUEST_RESPONSE) {
        return None;
    }
    let data = message.get("d")?;
    (data.get("requestId").and_then(Value::as_str) == Some(request_id)).then_some(data)
}

/// Outcome of one request, from the `requestStatus` object.
#[derive(Debug, Clone)]
pub struct RequestStatus {
    pub result: bool,
    pub code: u64,
    pub comment: Option<String>,
}

impl RequestStatus {
    pub fn from_data(data: &Value) -> Self {
        let status = data.get("requestStatus");
        Self {
            result: status
                .and_then(|s| s.get("result"))
                .and_then(Value::as_bool)
                .unwrap_or(false),
            code: status
                .and_then(|s| s.get("code"))
                .and_then(Value::as_u64)
                .unwrap_or(0),
            comment: status
                .and_then(|s| s.get("comment"))
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }
}
