use serde_json::Value;

/// Location of the reply text when the agent answers through an action group.
const ENVELOPE_TEXT_POINTER: &str = "/response/functionResponse/responseBody/TEXT/body";

/// Pick the message out of a reassembled reply.
///
/// Replies that are the JSON envelope of a function response yield the text
/// body inside it; anything else is returned as received.
pub fn extract_message(buffer: String) -> String {
    match envelope_text(&buffer) {
        Some(text) => text,
        None => buffer,
    }
}

pub fn envelope_text(buffer: &str) -> Option<String> {
    let value: Value = serde_json::from_str(buffer).ok()?;
    value
        .pointer(ENVELOPE_TEXT_POINTER)?
        .as_str()
        .map(str::to_string)
}
