//! Response documents for the forecast endpoint.

use crate::types::{ForecastOutcome, ForecastResult};

/// Fixed body for addresses the geocoder could not match.
pub const NOT_FOUND_RESPONSE: &str =
    r#"{ "success": false, "message": "Forecast not found for the provided address." }"#;

/// Wrap a forecast payload and its cache flag. The payload is embedded
/// verbatim, without parsing.
pub fn format_result(result: &ForecastResult) -> String {
    format!(
        "{{ \"forecast\": {}, \"cached\": {} }}",
        result.payload, result.cached
    )
}

pub fn render_outcome(outcome: &ForecastOutcome) -> String {
    match outcome {
        ForecastOutcome::Found(result) => format_result(result),
        ForecastOutcome::NotFound => NOT_FOUND_RESPONSE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_embeds_payload_verbatim() {
        let result = ForecastResult {
            payload: r#"{"type":"Feature","properties":{"periods":[]}}"#.to_string(),
            cached: true,
        };
        assert_eq!(
            format_result(&result),
            r#"{ "forecast": {"type":"Feature","properties":{"periods":[]}}, "cached": true }"#
        );
    }

    #[test]
    fn test_formatted_result_is_json() {
        let result = ForecastResult {
            payload: "{}".to_string(),
            cached: false,
        };
        let value: serde_json::Value = serde_json::from_str(&format_result(&result)).unwrap();
        assert_eq!(value["forecast"], serde_json::json!({}));
        assert_eq!(value["cached"], false);
    }

    #[test]
    fn test_not_found_document() {
        let value: serde_json::Value =
            serde_json::from_str(&render_outcome(&ForecastOutcome::NotFound)).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["message"], "Forecast not found for the provided address.");
    }
}
