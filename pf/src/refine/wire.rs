//! Review payload wire format
//!
//! A [`RefinementResult`] travels between the submission stage and the
//! review stage as a percent-encoded JSON payload, with an optional,
//! separately encoded payload of existing finalized tasks. Encoding and
//! decoding must round-trip to an identical structure.

use serde_json::Value;

use super::normalizer::{MalformedResponse, RefinementResult, normalize_value};
use crate::domain::FinalizedTask;

/// Encode a refinement result as a percent-encoded JSON payload
pub fn encode_refinement(result: &RefinementResult) -> String {
    urlencoding::encode(&result.to_payload_value().to_string()).into_owned()
}

/// Decode a payload produced by [`encode_refinement`]
pub fn decode_refinement(payload: &str) -> Result<RefinementResult, MalformedResponse> {
    let decoded = urlencoding::decode(payload)
        .map_err(|e| MalformedResponse::new(format!("payload is not valid percent-encoding: {}", e), payload))?;

    let value: Value = serde_json::from_str(&decoded)
        .map_err(|e| MalformedResponse::new(format!("payload is not valid JSON: {}", e), decoded.as_ref()))?;

    // No requested-goal list at this stage: the payload is the request
    normalize_value(&value, &[], &decoded)
}

/// Encode existing finalized tasks as a percent-encoded JSON payload
pub fn encode_existing(tasks: &[FinalizedTask]) -> String {
    urlencoding::encode(&serde_json::json!(tasks).to_string()).into_owned()
}

/// Decode a payload produced by [`encode_existing`]
pub fn decode_existing(payload: &str) -> Result<Vec<FinalizedTask>, MalformedResponse> {
    let decoded = urlencoding::decode(payload)
        .map_err(|e| MalformedResponse::new(format!("payload is not valid percent-encoding: {}", e), payload))?;

    serde_json::from_str(&decoded)
        .map_err(|e| MalformedResponse::new(format!("existing-tasks payload is not valid: {}", e), decoded.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refine::normalize;

    #[test]
    fn test_refinement_roundtrip_is_exact() {
        let raw = r#"{"refinedTasks": {"Learn Spanish": ["Sign up for app (15 min)", "Practice 20 min"], "Get in shape": ["Go for a jog"]}, "clarificationNeeded": true}"#;
        let result = normalize(raw, &[]).unwrap();

        let payload = encode_refinement(&result);
        let decoded = decode_refinement(&payload).unwrap();

        assert_eq!(decoded, result);
    }

    #[test]
    fn test_refinement_payload_survives_special_characters() {
        let raw = r#"{"refinedTasks": {"Read & write": ["What genres? Sci-fi, 100%?", "Read \"Dune\""]}, "clarificationNeeded": false}"#;
        let result = normalize(raw, &[]).unwrap();

        let payload = encode_refinement(&result);
        // Percent-encoded payloads are URL-safe
        assert!(!payload.contains(' '));
        assert!(!payload.contains('"'));

        assert_eq!(decode_refinement(&payload).unwrap(), result);
    }

    #[test]
    fn test_decode_corrupted_payload_is_malformed() {
        let err = decode_refinement("%7Bnot-json").unwrap_err();
        assert!(err.reason.contains("JSON"));
    }

    #[test]
    fn test_existing_roundtrip() {
        let tasks = vec![
            FinalizedTask {
                id: "t1".to_string(),
                text: "Practice 20 min".to_string(),
                original_task: "Learn Spanish".to_string(),
            },
            FinalizedTask {
                id: "t2".to_string(),
                text: "Go for a jog".to_string(),
                original_task: "Get in shape".to_string(),
            },
        ];

        let payload = encode_existing(&tasks);
        assert_eq!(decode_existing(&payload).unwrap(), tasks);
    }

    #[test]
    fn test_existing_payload_uses_wire_key() {
        let tasks = vec![FinalizedTask {
            id: "t1".to_string(),
            text: "Practice".to_string(),
            original_task: "Learn Spanish".to_string(),
        }];

        let payload = encode_existing(&tasks);
        let decoded = urlencoding::decode(&payload).unwrap();
        assert!(decoded.contains("originalTask"));
    }
}
