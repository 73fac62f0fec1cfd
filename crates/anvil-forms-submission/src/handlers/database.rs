//! Database table handler.

use std::sync::Arc;

use tracing::info;

use anvil_forms_config::DatabaseTarget;
use anvil_forms_core::FormsResult;
use anvil_forms_storage::ContentStorage;

use crate::submission::Submission;

/// Inserts one row per submission into a configured table, mapping field
/// names to columns.
pub struct DatabaseHandler {
    storage: Arc<dyn ContentStorage>,
}

impl DatabaseHandler {
    /// Creates the handler over the given storage.
    pub fn new(storage: Arc<dyn ContentStorage>) -> Self {
        Self { storage }
    }

    /// Stores the submission's cleaned values in the target table.
    pub async fn handle(
        &self,
        target: &DatabaseTarget,
        submission: &Submission,
    ) -> FormsResult<()> {
        self.storage
            .insert_row(&target.table, submission.to_row())
            .await?;

        info!(
            form = %submission.form_name,
            table = %target.table,
            id = %submission.id,
            "stored submission row"
        );
        Ok(())
    }
}
