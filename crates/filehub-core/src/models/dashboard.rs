use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::file::{FileCategory, FileRecord};

/// Usage summary from `GET /files/dashboard/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    #[serde(default)]
    pub total_files: u64,
    #[serde(default)]
    pub total_storage_used: u64,
    #[serde(default)]
    pub recent_uploads: Vec<FileRecord>,
    #[serde(default)]
    pub file_type_distribution: Vec<FileTypeCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTypeCount {
    pub file_type: String,
    pub count: u64,
}

impl DashboardStats {
    /// Type distribution recomputed from the recent uploads by extension.
    ///
    /// The server reports raw MIME types; the dashboard shows coarse categories
    /// instead. Ordered by count, largest first, then by name.
    pub fn recalculated_distribution(&self) -> Vec<FileTypeCount> {
        let mut counts: BTreeMap<FileCategory, u64> = BTreeMap::new();
        for upload in &self.recent_uploads {
            *counts.entry(upload.category()).or_default() += 1;
        }

        let mut distribution: Vec<FileTypeCount> = counts
            .into_iter()
            .map(|(category, count)| FileTypeCount {
                file_type: category.as_str().to_string(),
                count,
            })
            .collect();
        distribution.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.file_type.cmp(&b.file_type))
        });
        distribution
    }

    /// Copy of these stats with the distribution replaced by the recomputed one.
    pub fn normalized(mut self) -> Self {
        self.file_type_distribution = self.recalculated_distribution();
        self
    }
}
