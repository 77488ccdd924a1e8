use crate::{CoreError, CoreResult};
use serde::Deserialize;
use serde_json::{Map, Value};

/// One caller-supplied instruction for one output variant.
#[derive(Debug, Clone, Deserialize)]
pub struct OperationSpec {
    #[serde(default)]
    pub name: Option<NameAffixes>,
    #[serde(default)]
    pub resize: Option<ResizeSpec>,
    #[serde(default)]
    pub output: Option<OutputSpec>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NameAffixes {
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub suffix: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResizeSpec {
    pub strategy: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputSpec {
    #[serde(default)]
    pub format: Option<String>,
    /// Everything besides `format` is an encoder argument, passed through
    /// to the transform engine verbatim.
    #[serde(flatten)]
    pub encoder_args: Map<String, Value>,
}

/// The operations payload as the boundary hands it over: either structured
/// data or a string expected to be JSON text.
#[derive(Debug, Clone)]
pub enum OperationsPayload {
    Structured(Value),
    Text(String),
}

/// Normalize the payload into a typed operations list. A string that fails
/// to decode is a client error carrying the parse failure as cause.
pub fn parse_operations(payload: OperationsPayload) -> CoreResult<Vec<OperationSpec>> {
    let operations = match payload {
        OperationsPayload::Structured(value) => serde_json::from_value(value)?,
        OperationsPayload::Text(text) => serde_json::from_str(&text)?,
    };
    Ok(operations)
}

/// Check each operation carries the dimensions its declared strategy needs,
/// before any transform work begins. An unrecognized strategy is not an
/// error here: it plans to a no-op task.
pub fn validate(operations: &[OperationSpec]) -> CoreResult<()> {
    for (index, operation) in operations.iter().enumerate() {
        let resize = operation
            .resize
            .as_ref()
            .ok_or_else(|| CoreError::validation(format!("operation {}: missing resize", index)))?;

        match resize.strategy.as_str() {
            "landscape" => {
                if resize.width.is_none() {
                    return Err(CoreError::validation(format!(
                        "operation {}: landscape resize requires width",
                        index
                    )));
                }
            }
            "portrait" => {
                if resize.height.is_none() {
                    return Err(CoreError::validation(format!(
                        "operation {}: portrait resize requires height",
                        index
                    )));
                }
            }
            "exact" => {
                if resize.width.is_none() || resize.height.is_none() {
                    return Err(CoreError::validation(format!(
                        "operation {}: exact resize requires width and height",
                        index
                    )));
                }
            }
            _ => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_json_text() {
        let payload = OperationsPayload::Text(
            r#"[{"resize": {"strategy": "landscape", "width": 400}, "output": {"format": "jpeg"}}]"#
                .to_string(),
        );

        let operations = parse_operations(payload).unwrap();
        assert_eq!(operations.len(), 1);
        let resize = operations[0].resize.as_ref().unwrap();
        assert_eq!(resize.strategy, "landscape");
        assert_eq!(resize.width, Some(400));
        assert_eq!(
            operations[0].output.as_ref().unwrap().format.as_deref(),
            Some("jpeg")
        );
    }

    #[test]
    fn accepts_structured_payload() {
        let payload = OperationsPayload::Structured(json!([
            {"resize": {"strategy": "exact", "width": 100, "height": 100}}
        ]));

        let operations = parse_operations(payload).unwrap();
        assert_eq!(operations.len(), 1);
        assert!(operations[0].output.is_none());
    }

    #[test]
    fn invalid_json_text_is_a_malformed_payload() {
        let payload = OperationsPayload::Text("not json".to_string());
        let result = parse_operations(payload);
        assert!(matches!(result, Err(CoreError::MalformedOperations(_))));
    }

    #[test]
    fn extra_output_keys_are_collected_as_encoder_args() {
        let payload = OperationsPayload::Text(
            r#"[{"resize": {"strategy": "exact", "width": 10, "height": 10},
                 "output": {"format": "jpeg", "quality": 60, "progressive": true}}]"#
                .to_string(),
        );

        let operations = parse_operations(payload).unwrap();
        let output = operations[0].output.as_ref().unwrap();
        assert_eq!(output.encoder_args.get("quality"), Some(&json!(60)));
        assert_eq!(output.encoder_args.get("progressive"), Some(&json!(true)));
    }

    #[test]
    fn validate_requires_resize() {
        let operations = parse_operations(OperationsPayload::Structured(json!([
            {"output": {"format": "jpeg"}}
        ])))
        .unwrap();

        let result = validate(&operations);
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[test]
    fn validate_requires_strategy_dimensions() {
        let missing_width = parse_operations(OperationsPayload::Structured(json!([
            {"resize": {"strategy": "landscape"}}
        ])))
        .unwrap();
        assert!(validate(&missing_width).is_err());

        let missing_height = parse_operations(OperationsPayload::Structured(json!([
            {"resize": {"strategy": "portrait", "width": 100}}
        ])))
        .unwrap();
        assert!(validate(&missing_height).is_err());

        let missing_both = parse_operations(OperationsPayload::Structured(json!([
            {"resize": {"strategy": "exact", "width": 100}}
        ])))
        .unwrap();
        assert!(validate(&missing_both).is_err());
    }

    #[test]
    fn validate_allows_unrecognized_strategy() {
        // An unknown strategy plans to a no-op task, not a validation error.
        let operations = parse_operations(OperationsPayload::Structured(json!([
            {"resize": {"strategy": "fisheye"}}
        ])))
        .unwrap();

        assert!(validate(&operations).is_ok());
    }
}
