//! Content record handler.

use std::sync::Arc;

use tracing::info;

use anvil_forms_config::ContentTarget;
use anvil_forms_core::FormsResult;
use anvil_forms_storage::{ContentRecord, ContentStorage};

use crate::submission::Submission;

/// Creates one typed content record per submission.
pub struct ContentHandler {
    storage: Arc<dyn ContentStorage>,
}

impl ContentHandler {
    /// Creates the handler over the given storage.
    pub fn new(storage: Arc<dyn ContentStorage>) -> Self {
        Self { storage }
    }

    /// Creates a record of the target content type from the submission's
    /// cleaned values.
    pub async fn handle(
        &self,
        target: &ContentTarget,
        submission: &Submission,
    ) -> FormsResult<()> {
        let record = ContentRecord::with_fields(&target.content_type, submission.to_row());
        self.storage.create_record(record).await?;

        info!(
            form = %submission.form_name,
            content_type = %target.content_type,
            id = %submission.id,
            "created content record"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anvil_forms_storage::{MemoryStorage, Value};

    #[tokio::test]
    async fn test_handle_creates_record() {
        let storage = Arc::new(MemoryStorage::new());
        let handler = ContentHandler::new(Arc::clone(&storage) as _);

        let mut submission = Submission::new("feedback");
        submission
            .cleaned
            .insert("message".to_string(), Value::from("Nice site"));

        let target = ContentTarget {
            content_type: "feedback_entries".to_string(),
        };
        handler.handle(&target, &submission).await.unwrap();

        let records = storage.records("feedback_entries");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("message"), Some(&Value::from("Nice site")));
    }
}
