use std::borrow::Cow;
use std::collections::HashMap;

use crate::http::method::Method;
use crate::http::status::reason_phrase;
use crate::http::writer;

/// A single HTTP message, either a request or a response.
///
/// A request has a method and `status_code == 0`; a response has a non-zero
/// status code and `Method::NONE`. Header keys are stored exactly as given,
/// so `Host` and `host` are different headers.
///
/// Two messages are equal only if every field matches, including the
/// reason phrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    status_code: u16,
    method: Method,
    target: String,
    status_reason: String,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

impl Message {
    /// Creates a request for the whole server, target `*`.
    pub fn new(method: Method) -> Self {
        Self::request(method, "*")
    }

    /// Creates a request with the given method and target.
    pub fn request(method: Method, target: impl Into<String>) -> Self {
        Self {
            status_code: 0,
            method,
            target: target.into(),
            status_reason: String::new(),
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    /// Creates a response with the given status code.
    ///
    /// The reason phrase is taken from the standard table.
    ///
    /// # Example
    ///
    /// ```
    /// # use wicket::http::message::Message;
    /// assert_eq!(Message::response(404).status_reason(), "Not Found");
    /// ```
    pub fn response(status_code: u16) -> Self {
        Self {
            status_code,
            method: Method::NONE,
            target: String::new(),
            status_reason: reason_phrase(status_code).to_string(),
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    pub(crate) fn from_parts(
        status_code: u16,
        method: Method,
        target: String,
        status_reason: String,
        headers: HashMap<String, String>,
        body: Vec<u8>,
    ) -> Self {
        Self {
            status_code,
            method,
            target,
            status_reason,
            headers,
            body,
        }
    }

    /// Adds or replaces a header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_header(key, value);
        self
    }

    /// Sets the body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Overrides the reason phrase.
    ///
    /// An empty reason restores the default for the current status code.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.set_status_reason(reason);
        self
    }

    pub fn set_method(&mut self, method: Method) {
        self.method = method;
    }

    pub fn set_target(&mut self, target: impl Into<String>) {
        self.target = target.into();
    }

    /// Sets the status code and resets the reason phrase from the table.
    pub fn set_status(&mut self, status_code: u16) {
        self.status_code = status_code;
        self.status_reason = reason_phrase(status_code).to_string();
    }

    pub fn set_status_reason(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        self.status_reason = if reason.is_empty() {
            reason_phrase(self.status_code).to_string()
        } else {
            reason
        };
    }

    /// Inserts a header. An existing header with the same key is replaced.
    pub fn set_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(key.into(), value.into());
    }

    pub fn remove_header(&mut self, key: &str) -> Option<String> {
        self.headers.remove(key)
    }

    pub fn set_body(&mut self, body: impl Into<Vec<u8>>) {
        self.body = body.into();
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// Wire name of the method, empty for `ERROR` and `NONE`.
    pub fn method_name(&self) -> &'static str {
        self.method.as_str()
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn status_reason(&self) -> &str {
        &self.status_reason
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Looks up a header by its exact key.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(|v| v.as_str())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The body decoded as UTF-8, with invalid sequences replaced.
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn is_request(&self) -> bool {
        self.status_code == 0
    }

    pub fn is_response(&self) -> bool {
        self.status_code != 0
    }

    /// Renders the message in request form.
    pub fn to_request_bytes(&self) -> Vec<u8> {
        writer::serialize_request(self)
    }

    /// Renders the message in response form.
    pub fn to_response_bytes(&self) -> Vec<u8> {
        writer::serialize_response(self)
    }
}
