use std::collections::HashMap;

use crate::http::message::Message;
use crate::http::method::Method;

const CRLF: &[u8] = b"\r\n";
const HEADERS_END: &[u8] = b"\r\n\r\n";

/// Parses a request from a raw buffer.
///
/// This never fails. Whatever cannot be recognized is left empty: an unknown
/// method token becomes `Method::ERROR`, a missing target becomes `""`, and a
/// header block without a blank line after it yields an empty body.
pub fn parse_message(buf: &[u8]) -> Message {
    let method_end = find(buf, b" ");
    let method_token = &buf[..method_end.unwrap_or(buf.len())];
    let method = Method::from_token(&String::from_utf8_lossy(method_token));

    let target = match method_end {
        Some(end) => parse_target(&buf[end + 1..]),
        None => String::new(),
    };

    // The version token is ignored; headers start after the first line feed.
    let (headers, body) = match find(buf, b"\n") {
        Some(line_end) => parse_headers_and_body(&buf[line_end + 1..]),
        None => (HashMap::new(), Vec::new()),
    };

    Message::from_parts(0, method, target, String::new(), headers, body)
}

/// Parses a response (`HTTP/1.1 <code> <reason>`) from a raw buffer.
///
/// Like [`parse_message`] this never fails; a status code that is not a
/// number is left as `0`.
pub fn parse_response(buf: &[u8]) -> Message {
    let line_end = find(buf, b"\n");
    let status_line = &buf[..line_end.unwrap_or(buf.len())];
    let status_line = String::from_utf8_lossy(status_line);
    let status_line = status_line.strip_suffix('\r').unwrap_or(&status_line);

    let mut parts = status_line.splitn(3, ' ');
    let _version = parts.next();
    let status_code = parts
        .next()
        .and_then(|code| code.parse::<u16>().ok())
        .unwrap_or(0);
    let reason = parts.next().unwrap_or("").to_string();

    let (headers, body) = match line_end {
        Some(end) => parse_headers_and_body(&buf[end + 1..]),
        None => (HashMap::new(), Vec::new()),
    };

    Message::from_parts(status_code, Method::NONE, String::new(), reason, headers, body)
}

/// Returns the offset of the blank line that ends the header block.
pub fn find_headers_end(buf: &[u8]) -> Option<usize> {
    find(buf, HEADERS_END)
}

/// Finds a declared body length in a header block.
///
/// The header name is matched case-insensitively here, unlike message
/// headers, since this only drives framing. Returns `None` when the header is
/// absent or its value is not a number.
pub fn content_length(head: &[u8]) -> Option<usize> {
    let head = String::from_utf8_lossy(head);
    head.split("\r\n").skip(1).find_map(|line| {
        let (key, value) = line.split_once(':')?;
        if key.trim().eq_ignore_ascii_case("content-length") {
            value.trim().parse().ok()
        } else {
            None
        }
    })
}

// A target only counts if a space follows it on the request line.
fn parse_target(rest: &[u8]) -> String {
    match rest.iter().position(|&b| b == b' ' || b == b'\n') {
        Some(end) if rest[end] == b' ' => String::from_utf8_lossy(&rest[..end]).into_owned(),
        _ => String::new(),
    }
}

fn parse_headers_and_body(rest: &[u8]) -> (HashMap<String, String>, Vec<u8>) {
    if rest.starts_with(CRLF) {
        return (HashMap::new(), rest[CRLF.len()..].to_vec());
    }

    match find(rest, HEADERS_END) {
        Some(end) => (
            parse_header_block(&rest[..end]),
            rest[end + HEADERS_END.len()..].to_vec(),
        ),
        None => (parse_header_block(rest), Vec::new()),
    }
}

fn parse_header_block(block: &[u8]) -> HashMap<String, String> {
    let block = String::from_utf8_lossy(block);
    let mut headers = HashMap::new();

    for entry in block.split("\r\n") {
        if entry.is_empty() {
            continue;
        }

        let (key, value) = entry.split_once(": ").unwrap_or((entry, ""));
        headers.insert(key.to_string(), value.to_string());
    }

    headers
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|w| w == needle)
}
