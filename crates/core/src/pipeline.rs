use crate::config::FeatureFlags;
use crate::hash::content_address;
use crate::model::{aspect_ratio, SourceImage, VariantRecord};
use crate::operations::{parse_operations, validate, OperationSpec, OperationsPayload};
use crate::planner::{plan_tasks, Task};
use crate::transform;
use crate::{CoreError, CoreResult};
use futures::future::join_all;
use image::DynamicImage;
use imagemill_storage::VariantSink;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The outcome of one whole batch: successfully stored records in input
/// operation order, plus the tasks that failed. The join is per-task
/// result-or-error, so the caller decides whether partial success is
/// acceptable; already-stored siblings of a failed task stay durable and
/// are visible in `records`.
#[derive(Debug)]
pub struct BatchReport {
    pub records: Vec<VariantRecord>,
    pub failures: Vec<TaskFailure>,
}

#[derive(Debug)]
pub struct TaskFailure {
    pub filename: String,
    pub error: CoreError,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Collapse the report into the all-or-nothing contract: every valid
    /// operation produced a record, or the first failure wins.
    pub fn into_records(self) -> CoreResult<Vec<VariantRecord>> {
        match self.failures.into_iter().next() {
            None => Ok(self.records),
            Some(failure) => Err(failure.error),
        }
    }
}

enum TaskOutcome {
    Skipped,
    Stored(VariantRecord),
    Failed { filename: String, error: CoreError },
}

/// Drives the variant pipeline: parse and validate operations, plan tasks,
/// fan the transform+store work out concurrently, and join the results in
/// input order. The sink is an injected dependency constructed once at
/// startup.
pub struct Processor {
    sink: Arc<dyn VariantSink>,
    features: FeatureFlags,
}

impl Processor {
    pub fn new(sink: Arc<dyn VariantSink>, features: FeatureFlags) -> Self {
        Self { sink, features }
    }

    pub async fn process(
        &self,
        source_bytes: &[u8],
        payload: OperationsPayload,
    ) -> CoreResult<BatchReport> {
        if source_bytes.is_empty() {
            return Err(CoreError::MissingSource);
        }

        let operations = parse_operations(payload)?;
        validate(&operations)?;

        if self.features.enforce_supported_formats {
            check_output_formats(&operations)?;
        }

        let decoded = transform::decode_source(source_bytes)?;
        let name = content_address(source_bytes);

        info!(
            name = %name,
            width = decoded.width,
            height = decoded.height,
            format = %decoded.format,
            operations = operations.len(),
            "planning variant tasks"
        );

        let source = SourceImage {
            width: decoded.width,
            height: decoded.height,
            format: decoded.format,
            name,
        };

        let tasks = plan_tasks(&source, &operations)?;
        let pixels = Arc::new(decoded.pixels);

        // Ordered join over the per-task futures: result order follows
        // input order, never completion order. The futures run on this
        // request task, so dropping the request cancels in-flight work.
        let outcomes = join_all(
            tasks
                .into_iter()
                .map(|task| self.run_task(Arc::clone(&pixels), task)),
        )
        .await;

        let mut records = Vec::new();
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                TaskOutcome::Skipped => {}
                TaskOutcome::Stored(record) => records.push(record),
                TaskOutcome::Failed { filename, error } => {
                    warn!(filename = %filename, error = %error, "variant task failed");
                    failures.push(TaskFailure { filename, error });
                }
            }
        }

        Ok(BatchReport { records, failures })
    }

    async fn run_task(&self, pixels: Arc<DynamicImage>, task: Task) -> TaskOutcome {
        let Some(plan) = task.plan else {
            debug!(filename = %task.filename, "empty transform plan, skipping");
            return TaskOutcome::Skipped;
        };

        let filename = task.filename;

        let result: CoreResult<VariantRecord> = async {
            // Encode/resize is CPU-bound; keep it off the async workers.
            let output = tokio::task::spawn_blocking(move || transform::execute(&pixels, &plan))
                .await
                .map_err(|e| CoreError::Internal(e.to_string()))??;

            let stored = self.sink.store(&filename, &output.buffer).await?;

            debug!(filename = %filename, url = %stored.url, "variant stored");

            Ok(VariantRecord {
                aspect_ratio: aspect_ratio(stored.width, stored.height),
                url: stored.url,
                width: stored.width,
                height: stored.height,
                format: stored.format,
            })
        }
        .await;

        match result {
            Ok(record) => TaskOutcome::Stored(record),
            Err(error) => TaskOutcome::Failed { filename, error },
        }
    }
}

fn check_output_formats(operations: &[OperationSpec]) -> CoreResult<()> {
    for operation in operations {
        if let Some(format) = operation.output.as_ref().and_then(|o| o.format.as_deref()) {
            if !transform::is_supported_format(format) {
                return Err(CoreError::UnsupportedFormat(format.to_string()));
            }
        }
    }
    Ok(())
}
