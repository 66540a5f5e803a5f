use anyhow::Result;
use chrono::{DateTime, Utc};
use std::path::Path;

use crate::client::ApplicationStore;
use crate::models::{ApplicationRecord, FieldUpdate, FilterCriteria};
use crate::notify::Notifier;
use crate::view::{derive_view_with, is_follow_up_soon, Denylist, ViewOptions};

/// Applied-jobs session state: the last fetched records plus the user's
/// criteria. Mutations go through the store and are followed by a refetch.
pub struct AppliedJobs {
    records: Vec<ApplicationRecord>,
    pub criteria: FilterCriteria,
    denylist: Denylist,
    options: ViewOptions,
}

impl AppliedJobs {
    pub fn new(denylist: Denylist, options: ViewOptions) -> Self {
        Self {
            records: Vec::new(),
            criteria: FilterCriteria::default(),
            denylist,
            options,
        }
    }

    pub fn records(&self) -> &[ApplicationRecord] {
        &self.records
    }

    pub fn options(&self) -> ViewOptions {
        self.options
    }

    pub fn visible(&self) -> Vec<ApplicationRecord> {
        derive_view_with(&self.records, &self.criteria, &self.denylist, self.options)
    }

    /// Visible records paired with their follow-up flag.
    pub fn visible_flagged(&self, now: DateTime<Utc>) -> Vec<(ApplicationRecord, bool)> {
        self.visible()
            .into_iter()
            .map(|r| {
                let soon = is_follow_up_soon(&r, now);
                (r, soon)
            })
            .collect()
    }

    /// Replaces the records with a fresh fetch. On failure the list is emptied.
    pub fn refresh(&mut self, store: &dyn ApplicationStore, notifier: &mut dyn Notifier) -> Result<()> {
        match store.list_applied() {
            Ok(records) => {
                self.records = records;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to fetch applied jobs");
                self.records.clear();
                notifier.error(&format!("Error fetching applied jobs: {}", e));
                Err(e)
            }
        }
    }

    pub fn update_field(
        &mut self,
        store: &dyn ApplicationStore,
        notifier: &mut dyn Notifier,
        id: i64,
        update: &FieldUpdate,
    ) -> Result<()> {
        self.mutate(
            store,
            notifier,
            |s| s.update_field(id, update),
            "Job updated!",
            "Error updating job",
        )
    }

    pub fn delete(&mut self, store: &dyn ApplicationStore, notifier: &mut dyn Notifier, id: i64) -> Result<()> {
        self.mutate(
            store,
            notifier,
            |s| s.delete_applied(id),
            "Job deleted!",
            "Error deleting job",
        )
    }

    pub fn upload_resume(
        &mut self,
        store: &dyn ApplicationStore,
        notifier: &mut dyn Notifier,
        id: i64,
        file: &Path,
    ) -> Result<()> {
        self.mutate(
            store,
            notifier,
            |s| s.upload_resume(id, file).map(|_| ()),
            "Resume uploaded!",
            "Error uploading resume",
        )
    }

    fn mutate<F>(
        &mut self,
        store: &dyn ApplicationStore,
        notifier: &mut dyn Notifier,
        op: F,
        success: &str,
        failure: &str,
    ) -> Result<()>
    where
        F: FnOnce(&dyn ApplicationStore) -> Result<()>,
    {
        if let Err(e) = op(store) {
            tracing::warn!(error = %e, "{}", failure);
            notifier.error(&format!("{}: {}", failure, e));
            return Err(e);
        }
        notifier.success(success);
        // The mutation already landed; a failed refetch replaces the success notice.
        if let Err(e) = self.refresh(store, notifier) {
            tracing::debug!(error = %e, "refetch after mutation failed");
        }
        Ok(())
    }
}
