use serde::{Deserialize, Serialize};

use crate::models::ApplicationRecord;

/// Application counts per outcome, as served by `/analytics/summary`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSummary {
    #[serde(default)]
    pub applied: u64,
    #[serde(default)]
    pub interview: u64,
    #[serde(default)]
    pub offer: u64,
    #[serde(default)]
    pub rejected: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slice {
    pub label: &'static str,
    pub count: u64,
    pub percent: u64,
}

impl StatusSummary {
    pub fn total(&self) -> u64 {
        self.applied + self.interview + self.offer + self.rejected
    }

    pub fn has_data(&self) -> bool {
        self.total() > 0
    }

    /// Chart slices in display order with rounded percentages.
    pub fn slices(&self) -> Vec<Slice> {
        let total = self.total();
        [
            ("Applied", self.applied),
            ("Interview", self.interview),
            ("Offer", self.offer),
            ("Rejected", self.rejected),
        ]
        .into_iter()
        .map(|(label, count)| Slice {
            label,
            count,
            percent: if total == 0 {
                0
            } else {
                (count as f64 * 100.0 / total as f64).round() as u64
            },
        })
        .collect()
    }
}

/// Computes the summary from fetched records. Status matching ignores case;
/// `Accepted` counts as an offer, anything unrecognized is left out.
pub fn summarize(records: &[ApplicationRecord]) -> StatusSummary {
    let mut summary = StatusSummary::default();
    for record in records {
        match record.status.as_str().trim().to_lowercase().as_str() {
            "applied" => summary.applied += 1,
            "interview" => summary.interview += 1,
            "offer" | "accepted" => summary.offer += 1,
            "rejected" => summary.rejected += 1,
            _ => {}
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn with_status(status: &str) -> ApplicationRecord {
        serde_json::from_value(json!({ "id": 1, "status": status })).unwrap()
    }

    #[test]
    fn test_summary_deserializes_partial_payload() {
        let summary: StatusSummary = serde_json::from_value(json!({ "applied": 3, "rejected": 1 })).unwrap();
        assert_eq!(summary.applied, 3);
        assert_eq!(summary.offer, 0);
        assert_eq!(summary.total(), 4);
        assert!(summary.has_data());
    }

    #[test]
    fn test_empty_summary_has_no_data() {
        let summary = StatusSummary::default();
        assert!(!summary.has_data());
        assert!(summary.slices().iter().all(|s| s.percent == 0));
    }

    #[test]
    fn test_slices_percentages_round() {
        let summary = StatusSummary {
            applied: 1,
            interview: 1,
            offer: 1,
            rejected: 0,
        };
        let slices = summary.slices();
        assert_eq!(slices[0].label, "Applied");
        assert_eq!(slices[0].percent, 33);
        assert_eq!(slices[3].label, "Rejected");
        assert_eq!(slices[3].percent, 0);

        let summary = StatusSummary {
            applied: 2,
            interview: 1,
            offer: 0,
            rejected: 0,
        };
        assert_eq!(summary.slices()[0].percent, 67);
    }

    #[test]
    fn test_summarize_counts_statuses() {
        let records = vec![
            with_status("Applied"),
            with_status("applied"),
            with_status("Interview"),
            with_status("Accepted"),
            with_status("Rejected"),
            with_status("ghosted"),
        ];
        let summary = summarize(&records);
        assert_eq!(
            summary,
            StatusSummary {
                applied: 2,
                interview: 1,
                offer: 1,
                rejected: 1,
            }
        );
    }
}
