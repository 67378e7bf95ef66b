//! Fixed replies sent by the service and admin listeners.

use std::sync::Arc;

use crate::http::message::Message;
use crate::http::method::Method;
use crate::server::dispatcher::Handler;

/// A response with a `{"message": ...}` JSON body.
pub fn json_message(status: u16, message: &str) -> Message {
    let body = serde_json::json!({ "message": message }).to_string();
    Message::response(status)
        .with_header("content-type", "application/json")
        .with_body(body)
}

/// The service reply: tells the client which method it used.
///
/// Requests whose method was not recognized get a 500.
pub fn respond(request: &Message) -> Message {
    if request.method() == Method::ERROR {
        return json_message(500, "Unrecognized request method");
    }
    json_message(
        200,
        &format!("You sent a {} request!", request.method_name()),
    )
}

pub fn handler() -> Handler {
    Arc::new(respond)
}
