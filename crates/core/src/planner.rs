use crate::model::SourceImage;
use crate::operations::OperationSpec;
use crate::{CoreError, CoreResult};
use serde_json::{Map, Value};

/// Planner-resolved transform instructions for one operation, bound to the
/// source image. An absent plan is a valid value signaling "skip", not an
/// error.
#[derive(Debug, Clone)]
pub struct Task {
    pub filename: String,
    pub plan: Option<TransformPlan>,
}

#[derive(Debug, Clone)]
pub struct TransformPlan {
    pub resize: ResizeMode,
    pub format: String,
    pub encoder_args: Map<String, Value>,
}

/// How output dimensions are computed: a fixed extent with the other side
/// derived by the engine, or both fixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResizeMode {
    Width(u32),
    Height(u32),
    Exact(u32, u32),
}

/// Turn the parsed operations into concrete tasks, in input order. The
/// filename is deterministic in (prefix, source name, suffix, format);
/// operations sharing all four silently overwrite one another downstream.
pub fn plan_tasks(source: &SourceImage, operations: &[OperationSpec]) -> CoreResult<Vec<Task>> {
    operations
        .iter()
        .enumerate()
        .map(|(index, operation)| plan_task(source, operation, index))
        .collect()
}

fn plan_task(source: &SourceImage, operation: &OperationSpec, index: usize) -> CoreResult<Task> {
    let (prefix, suffix) = operation
        .name
        .as_ref()
        .map(|name| {
            (
                name.prefix.clone().unwrap_or_default(),
                name.suffix.clone().unwrap_or_default(),
            )
        })
        .unwrap_or_default();

    let output = operation.output.clone().unwrap_or_default();
    let format = output.format.unwrap_or_else(|| source.format.clone());

    let filename = format!("{}{}{}.{}", prefix, source.name, suffix, format);

    let resize = operation
        .resize
        .as_ref()
        .ok_or_else(|| CoreError::validation(format!("operation {}: missing resize", index)))?;

    let missing = |field: &str| {
        CoreError::validation(format!(
            "operation {}: {} resize requires {}",
            index, resize.strategy, field
        ))
    };

    let mode = match resize.strategy.as_str() {
        "landscape" => Some(ResizeMode::Width(resize.width.ok_or_else(|| missing("width"))?)),
        "portrait" => Some(ResizeMode::Height(resize.height.ok_or_else(|| missing("height"))?)),
        "exact" => Some(ResizeMode::Exact(
            resize.width.ok_or_else(|| missing("width"))?,
            resize.height.ok_or_else(|| missing("height"))?,
        )),
        _ => None,
    };

    let plan = mode.map(|resize| TransformPlan {
        resize,
        format: format.clone(),
        encoder_args: output.encoder_args,
    });

    Ok(Task { filename, plan })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::{parse_operations, OperationsPayload};
    use serde_json::json;

    fn source() -> SourceImage {
        SourceImage {
            width: 800,
            height: 600,
            format: "jpeg".to_string(),
            name: "abc123".to_string(),
        }
    }

    fn plan_one(spec: Value) -> Task {
        let operations =
            parse_operations(OperationsPayload::Structured(json!([spec]))).unwrap();
        plan_tasks(&source(), &operations).unwrap().remove(0)
    }

    #[test]
    fn filename_combines_affixes_name_and_format() {
        let task = plan_one(json!({
            "name": {"prefix": "lg-", "suffix": "-web"},
            "resize": {"strategy": "landscape", "width": 400},
            "output": {"format": "webp"}
        }));

        assert_eq!(task.filename, "lg-abc123-web.webp");
    }

    #[test]
    fn affixes_default_to_empty_and_format_to_source() {
        let task = plan_one(json!({
            "resize": {"strategy": "exact", "width": 10, "height": 10}
        }));

        assert_eq!(task.filename, "abc123.jpeg");
    }

    #[test]
    fn landscape_fixes_width_only() {
        let task = plan_one(json!({
            "resize": {"strategy": "landscape", "width": 400}
        }));

        assert_eq!(task.plan.unwrap().resize, ResizeMode::Width(400));
    }

    #[test]
    fn portrait_fixes_height_only() {
        let task = plan_one(json!({
            "resize": {"strategy": "portrait", "height": 500}
        }));

        assert_eq!(task.plan.unwrap().resize, ResizeMode::Height(500));
    }

    #[test]
    fn exact_fixes_both_dimensions_verbatim() {
        // Exact targets are not derived from the source aspect ratio.
        let task = plan_one(json!({
            "resize": {"strategy": "exact", "width": 123, "height": 457}
        }));

        assert_eq!(task.plan.unwrap().resize, ResizeMode::Exact(123, 457));
    }

    #[test]
    fn unrecognized_strategy_plans_to_a_no_op() {
        let task = plan_one(json!({
            "resize": {"strategy": "fisheye"},
            "output": {"format": "png"}
        }));

        // The filename is still derived, but there is nothing to execute.
        assert_eq!(task.filename, "abc123.png");
        assert!(task.plan.is_none());
    }

    #[test]
    fn encoder_args_ride_along_with_the_plan() {
        let task = plan_one(json!({
            "resize": {"strategy": "exact", "width": 10, "height": 10},
            "output": {"format": "jpeg", "quality": 42}
        }));

        let plan = task.plan.unwrap();
        assert_eq!(plan.format, "jpeg");
        assert_eq!(plan.encoder_args.get("quality"), Some(&json!(42)));
    }

    #[test]
    fn tasks_preserve_operation_order() {
        let operations = parse_operations(OperationsPayload::Structured(json!([
            {"name": {"suffix": "-a"}, "resize": {"strategy": "landscape", "width": 100}},
            {"name": {"suffix": "-b"}, "resize": {"strategy": "landscape", "width": 200}},
            {"name": {"suffix": "-c"}, "resize": {"strategy": "landscape", "width": 300}}
        ])))
        .unwrap();

        let tasks = plan_tasks(&source(), &operations).unwrap();
        let filenames: Vec<_> = tasks.iter().map(|t| t.filename.as_str()).collect();
        assert_eq!(
            filenames,
            vec!["abc123-a.jpeg", "abc123-b.jpeg", "abc123-c.jpeg"]
        );
    }
}
