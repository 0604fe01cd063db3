//! Tool-call detection in raw model output.
//!
//! A tool call is written by the model as
//!
//! ```text
//! TOOL:<name>:<json-object>
//! ```
//!
//! for example `TOOL:search:{"query": "Arctic animals"}`. The name is one or
//! more word characters. The payload runs from the opening `{` to its
//! matching `}`; braces inside JSON string literals do not count, so nested
//! objects are captured whole. A payload that never balances is ignored.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::error::Error;
use crate::Result;

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRequest {
    pub name: String,
    /// Raw payload text, braces included
    pub payload: String,
}

impl ToolRequest {
    /// Parse the payload as a JSON object.
    pub fn parameters(&self) -> Result<Value> {
        let value: Value = serde_json::from_str(&self.payload).map_err(|e| {
            Error::MalformedToolPayload {
                name: self.name.clone(),
                cause: e.to_string(),
            }
        })?;

        if !value.is_object() {
            return Err(Error::MalformedToolPayload {
                name: self.name.clone(),
                cause: "payload is not an object".to_string(),
            });
        }

        Ok(value)
    }
}

fn header_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"TOOL:(\w+):").expect("tool-call pattern is valid"))
}

/// Extract tool requests left to right, without overlap.
pub fn extract_tool_requests(response: &str) -> Vec<ToolRequest> {
    let pattern = header_pattern();
    let mut requests = Vec::new();
    let mut pos = 0;

    while let Some(caps) = pattern.captures_at(response, pos) {
        let header = caps.get(0).map(|m| m.end()).unwrap_or(response.len());
        let name = &caps[1];

        match balanced_object_len(&response[header..]) {
            Some(len) => {
                requests.push(ToolRequest {
                    name: name.to_string(),
                    payload: response[header..header + len].to_string(),
                });
                pos = header + len;
            }
            None => pos = header,
        }
    }

    requests
}

/// Byte length of the brace-balanced object at the start of `text`.
fn balanced_object_len(text: &str) -> Option<usize> {
    if !text.starts_with('{') {
        return None;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_no_tool_calls() {
        assert!(extract_tool_requests("Penguins live in the southern hemisphere.").is_empty());
    }

    #[test]
    fn test_single_tool_call() {
        let requests = extract_tool_requests(r#"Let me look. TOOL:search:{"query":"x"} done"#);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].name, "search");
        assert_eq!(requests[0].payload, r#"{"query":"x"}"#);
        assert_eq!(requests[0].parameters().unwrap(), json!({"query": "x"}));
    }

    #[test]
    fn test_multiple_in_order() {
        let text = r#"TOOL:wiki:{"topic":"penguin"} and TOOL:search:{"query":"arctic"}"#;
        let names: Vec<_> = extract_tool_requests(text).into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["wiki", "search"]);
    }

    #[test]
    fn test_nested_payload() {
        let text = r#"TOOL:search:{"query":"x","filter":{"lang":"en"}} tail }"#;
        let requests = extract_tool_requests(text);
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].parameters().unwrap(),
            json!({"query": "x", "filter": {"lang": "en"}})
        );
    }

    #[test]
    fn test_braces_inside_strings() {
        let text = r#"TOOL:search:{"query":"a } b { \" c"}"#;
        let requests = extract_tool_requests(text);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].parameters().unwrap()["query"], "a } b { \" c");
    }

    #[test]
    fn test_unbalanced_payload_skipped() {
        // The search payload never closes; scanning resumes after its header.
        let text = r#"TOOL:search:{"query":"x" TOOL:wiki:{"topic":"y"}"#;
        let requests = extract_tool_requests(text);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].name, "wiki");

        let text = r#"TOOL:search:nope TOOL:wiki:{"topic":"y"}"#;
        let requests = extract_tool_requests(text);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].name, "wiki");
    }

    #[test]
    fn test_malformed_payload_detected_on_parse() {
        let requests = extract_tool_requests("TOOL:search:{query: x}");
        assert_eq!(requests.len(), 1);
        assert!(matches!(
            requests[0].parameters(),
            Err(Error::MalformedToolPayload { .. })
        ));
    }
}
