//! Mapping a batch response back to the images that were sent.
//!
//! The batch prompt asks for a JSON array of `{"image_index": i, "data": {...}}`
//! elements. The index is the only link between an element and its source
//! file, so elements with a missing, out-of-range or repeated index are
//! dropped rather than guessed.

use serde_json::Value;

use crate::error::PipelineError;
use crate::llm::prompt::{DATA_KEY, INDEX_KEY};

/// Remove a markdown code fence the model tends to wrap JSON in.
///
/// Only an opening fence line (with optional language tag) and a closing
/// fence are dropped; backticks inside the payload are left alone.
pub fn strip_code_fences(text: &str) -> String {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```") {
        body = match rest.split_once('\n') {
            Some((_, after)) => after,
            None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
        };
    }
    if let Some(rest) = body.trim_end().strip_suffix("```") {
        body = rest;
    }
    body.trim().to_string()
}

/// One array element matched to a position in the batch.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledEntry {
    /// Position of the image in the request
    pub index: usize,
    /// Extracted data with the index key removed
    pub payload: Value,
}

/// Outcome of reconciling a batch response.
#[derive(Debug, Clone, Default)]
pub struct Reconciled {
    /// Accepted elements, in response order
    pub entries: Vec<ReconciledEntry>,
    /// Number of elements dropped (bad or duplicate index)
    pub rejected: usize,
    batch_len: usize,
}

impl Reconciled {
    /// Batch positions that received no element.
    pub fn missing(&self) -> Vec<usize> {
        (0..self.batch_len)
            .filter(|i| !self.entries.iter().any(|e| e.index == *i))
            .collect()
    }
}

/// Parse a (fence-stripped) batch response and match elements to positions
/// `0..batch_len`.
pub fn reconcile(text: &str, batch_len: usize) -> Result<Reconciled, PipelineError> {
    let value: Value = serde_json::from_str(text).map_err(|e| PipelineError::ResponseJson {
        message: e.to_string(),
    })?;

    let Value::Array(elements) = value else {
        return Err(PipelineError::ResponseNotArray {
            found: json_type_name(&value).to_string(),
        });
    };

    let mut reconciled = Reconciled {
        entries: Vec::with_capacity(elements.len()),
        rejected: 0,
        batch_len,
    };

    for element in elements {
        let index = match element_index(&element) {
            Some(i) if i < batch_len => i,
            Some(i) => {
                tracing::warn!("Invalid image index in response: {i} (batch of {batch_len})");
                reconciled.rejected += 1;
                continue;
            }
            None => {
                tracing::warn!("Response element without a usable \"{INDEX_KEY}\" skipped");
                reconciled.rejected += 1;
                continue;
            }
        };

        if reconciled.entries.iter().any(|e| e.index == index) {
            tracing::warn!("Duplicate image index {index} in response, keeping the first");
            reconciled.rejected += 1;
            continue;
        }

        reconciled.entries.push(ReconciledEntry {
            index,
            payload: extract_payload(element),
        });
    }

    Ok(reconciled)
}

fn element_index(element: &Value) -> Option<usize> {
    match element.get(INDEX_KEY)? {
        Value::Number(n) => n.as_u64().map(|n| n as usize),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// The `data` field when present, otherwise the element itself; either way
/// without the index key.
fn extract_payload(element: Value) -> Value {
    let mut payload = match element {
        Value::Object(mut map) => match map.remove(DATA_KEY) {
            Some(data) => data,
            None => Value::Object(map),
        },
        other => other,
    };
    if let Value::Object(map) = &mut payload {
        map.remove(INDEX_KEY);
    }
    payload
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n[1, 2]\n```"), "[1, 2]");
        assert_eq!(strip_code_fences("```\n{}\n```\n"), "{}");
        assert_eq!(strip_code_fences("  {\"a\": 1}  "), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```json [3]```"), "[3]");
    }

    #[test]
    fn test_strip_code_fences_keeps_inner_backticks() {
        let text = "```json\n[{\"image_index\": 0, \"data\": {\"note\": \"a ``` b\"}}]\n```";
        let stripped = strip_code_fences(text);
        assert_eq!(stripped, r#"[{"image_index": 0, "data": {"note": "a ``` b"}}]"#);

        let result = reconcile(&stripped, 1).unwrap();
        assert_eq!(result.entries[0].payload["note"], "a ``` b");
    }

    #[test]
    fn test_reconcile_maps_by_index_not_position() {
        let text = r#"[
            {"image_index": 1, "data": {"merchant": "B"}},
            {"image_index": 0, "data": {"merchant": "A"}}
        ]"#;
        let result = reconcile(text, 2).unwrap();
        assert_eq!(result.entries.len(), 2);
        assert_eq!(result.entries[0].index, 1);
        assert_eq!(result.entries[0].payload, json!({"merchant": "B"}));
        assert_eq!(result.entries[1].index, 0);
        assert!(result.missing().is_empty());
        assert_eq!(result.rejected, 0);
    }

    #[test]
    fn test_reconcile_without_data_uses_element() {
        let text = r#"[{"image_index": 0, "merchant": "A", "total": 12.5}]"#;
        let result = reconcile(text, 1).unwrap();
        assert_eq!(
            result.entries[0].payload,
            json!({"merchant": "A", "total": 12.5})
        );
    }

    #[test]
    fn test_reconcile_strips_index_inside_data() {
        let text = r#"[{"image_index": 0, "data": {"image_index": 0, "items": []}}]"#;
        let result = reconcile(text, 1).unwrap();
        assert_eq!(result.entries[0].payload, json!({"items": []}));
    }

    #[test]
    fn test_reconcile_keeps_array_payloads() {
        let text = r#"[{"image_index": 0, "data": [{"type": "header"}]}]"#;
        let result = reconcile(text, 1).unwrap();
        assert_eq!(result.entries[0].payload, json!([{"type": "header"}]));
    }

    #[test]
    fn test_reconcile_rejects_bad_indices() {
        let text = r#"[
            {"image_index": 0, "data": {}},
            {"image_index": 5, "data": {}},
            {"image_index": -1, "data": {}},
            {"data": {}},
            42
        ]"#;
        let result = reconcile(text, 3).unwrap();
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.rejected, 4);
        assert_eq!(result.missing(), vec![1, 2]);
    }

    #[test]
    fn test_reconcile_first_duplicate_wins() {
        let text = r#"[
            {"image_index": 0, "data": {"v": "first"}},
            {"image_index": 0, "data": {"v": "second"}}
        ]"#;
        let result = reconcile(text, 1).unwrap();
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].payload, json!({"v": "first"}));
        assert_eq!(result.rejected, 1);
    }

    #[test]
    fn test_reconcile_accepts_string_index() {
        let result = reconcile(r#"[{"image_index": "1", "data": {}}]"#, 2).unwrap();
        assert_eq!(result.entries[0].index, 1);
        assert_eq!(result.missing(), vec![0]);
    }

    #[test]
    fn test_reconcile_invalid_json() {
        let err = reconcile("Here is your data: [", 2).unwrap_err();
        assert!(matches!(err, PipelineError::ResponseJson { .. }));
    }

    #[test]
    fn test_reconcile_not_an_array() {
        let err = reconcile(r#"{"image_index": 0}"#, 1).unwrap_err();
        match err {
            PipelineError::ResponseNotArray { found } => assert_eq!(found, "object"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
