//! Canned responder replies

/// Reply the simulated responder sends for a request payload.
///
/// Matching is trimmed and case-insensitive. Every input has a reply.
pub fn canned_reply(payload: &str) -> String {
    let request = payload.trim();
    match request.to_ascii_lowercase().as_str() {
        "get" | "status" => "RUN".to_string(),
        "stop" => "STOPPED".to_string(),
        "start" => "STARTED".to_string(),
        "" => "ACK".to_string(),
        _ => format!("ACK {request}"),
    }
}
