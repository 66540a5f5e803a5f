//! Derives the visible applied-jobs list from fetched records and the user's
//! filter criteria. Everything here is pure and recomputed from scratch.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;

use crate::models::{ApplicationRecord, FilterCriteria, ReminderFilter, SortField};

pub const FOLLOW_UP_WINDOW_DAYS: i64 = 3;

/// Placeholder companies left behind by seed/demo data.
pub const DEFAULT_DENYLIST: [&str; 6] = [
    "Tech Corp",
    "Web Solutions",
    "Analytics Inc",
    "Cloud Systems",
    "Startup XYZ",
    "AI Company",
];

/// Company names that are never shown in the tracker. Matching is exact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denylist {
    companies: HashSet<String>,
}

impl Denylist {
    pub fn new<I, S>(companies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            companies: companies.into_iter().map(Into::into).collect(),
        }
    }

    #[cfg(test)]
    pub fn empty() -> Self {
        Self {
            companies: HashSet::new(),
        }
    }

    pub fn contains(&self, company: Option<&str>) -> bool {
        company.is_some_and(|c| self.companies.contains(c))
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.companies.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.companies.is_empty()
    }
}

impl Default for Denylist {
    fn default() -> Self {
        Self::new(DEFAULT_DENYLIST)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewOptions {
    /// Order by `FilterCriteria::sort_by` instead of always by `applied_at`.
    /// Off by default: the selector has historically been inert.
    pub honor_sort_by: bool,
}

/// Lowercases and strips whitespace and periods, so "A.I. Labs" matches "ai labs".
pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace() && *c != '.')
        .flat_map(char::to_lowercase)
        .collect()
}

pub fn derive_view(
    records: &[ApplicationRecord],
    criteria: &FilterCriteria,
    denylist: &Denylist,
) -> Vec<ApplicationRecord> {
    derive_view_with(records, criteria, denylist, ViewOptions::default())
}

pub fn derive_view_with(
    records: &[ApplicationRecord],
    criteria: &FilterCriteria,
    denylist: &Denylist,
    options: ViewOptions,
) -> Vec<ApplicationRecord> {
    let needle = normalize(&criteria.search);
    let sort_field = if options.honor_sort_by {
        criteria.sort_by
    } else {
        SortField::AppliedAt
    };

    let mut keyed: Vec<(Option<DateTime<Utc>>, &ApplicationRecord)> = records
        .iter()
        .filter(|r| !denylist.contains(r.company.as_deref()))
        .filter(|r| needle.is_empty() || matches_search(r, &needle))
        .filter(|r| criteria.status.as_ref().is_none_or(|s| &r.status == s))
        .filter(|r| match criteria.reminder {
            ReminderFilter::Any => true,
            ReminderFilter::HasReminder => r.reminder,
            ReminderFilter::NoReminder => !r.reminder,
        })
        .map(|r| (r.time_for(sort_field), r))
        .collect();

    // Newest first; `None` orders below every `Some`, so missing dates sink.
    // `sort_by` is stable, keeping backend order for equal keys.
    keyed.sort_by(|a, b| b.0.cmp(&a.0));

    keyed.into_iter().map(|(_, r)| r.clone()).collect()
}

/// `needle` must already be normalized.
fn matches_search(record: &ApplicationRecord, needle: &str) -> bool {
    [&record.company, &record.title, &record.notes]
        .into_iter()
        .any(|field| normalize(field.as_deref().unwrap_or("")).contains(needle))
}

/// True when a follow-up date is set and falls within the next three days,
/// including dates that have already passed.
pub fn is_follow_up_soon(record: &ApplicationRecord, now: DateTime<Utc>) -> bool {
    record
        .follow_up_time()
        .is_some_and(|due| due - now < Duration::days(FOLLOW_UP_WINDOW_DAYS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Status;
    use chrono::TimeZone;

    fn record(id: i64, company: &str, applied_at: Option<&str>) -> ApplicationRecord {
        ApplicationRecord {
            id,
            company: Some(company.to_string()),
            title: None,
            link: None,
            status: Status::Applied,
            hr_contact: None,
            follow_up_date: None,
            reminder: false,
            applied_at: applied_at.map(str::to_string),
            deadline: None,
            resume_path: None,
            notes: None,
            ctc: None,
        }
    }

    fn companies(view: &[ApplicationRecord]) -> Vec<&str> {
        view.iter().map(|r| r.company.as_deref().unwrap_or("")).collect()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_orders_newest_first() {
        let records = vec![
            record(1, "Acme", Some("2024-01-01")),
            record(2, "Globex", Some("2024-03-01")),
        ];
        let view = derive_view(&records, &FilterCriteria::default(), &Denylist::default());
        assert_eq!(companies(&view), vec!["Globex", "Acme"]);
    }

    #[test]
    fn test_excludes_denylisted_companies() {
        let records = vec![
            record(1, "Tech Corp", Some("2024-02-01")),
            record(2, "Acme", Some("2024-01-01")),
            record(3, "AI Company", Some("2024-03-01")),
            record(4, "tech corp", Some("2024-01-15")),
        ];
        let view = derive_view(&records, &FilterCriteria::default(), &Denylist::default());
        // Exact match only: a differently-cased name is a real company.
        assert_eq!(companies(&view), vec!["tech corp", "Acme"]);
    }

    #[test]
    fn test_injected_denylist_replaces_default() {
        let records = vec![
            record(1, "Tech Corp", Some("2024-02-01")),
            record(2, "Initech", Some("2024-01-01")),
        ];
        let denylist = Denylist::new(["Initech"]);
        let view = derive_view(&records, &FilterCriteria::default(), &denylist);
        assert_eq!(companies(&view), vec!["Tech Corp"]);
    }

    #[test]
    fn test_missing_company_is_never_denylisted() {
        let mut r = record(1, "", Some("2024-01-01"));
        r.company = None;
        let view = derive_view(&[r], &FilterCriteria::default(), &Denylist::default());
        assert_eq!(view.len(), 1);
    }

    #[test]
    fn test_search_normalizes_case_spaces_and_dots() {
        let mut a = record(1, "A.I. Labs", Some("2024-01-01"));
        a.title = Some("ML Engineer".to_string());
        let mut b = record(2, "Globex", Some("2024-02-01"));
        b.notes = Some("Referred by J. Smith".to_string());
        let c = record(3, "Initech", Some("2024-03-01"));
        let records = vec![a, b, c];

        let criteria = FilterCriteria {
            search: "ai labs".to_string(),
            ..Default::default()
        };
        let view = derive_view(&records, &criteria, &Denylist::empty());
        assert_eq!(companies(&view), vec!["A.I. Labs"]);

        let criteria = FilterCriteria {
            search: "JSMITH".to_string(),
            ..Default::default()
        };
        let view = derive_view(&records, &criteria, &Denylist::empty());
        assert_eq!(companies(&view), vec!["Globex"]);

        let criteria = FilterCriteria {
            search: "mlengineer".to_string(),
            ..Default::default()
        };
        let view = derive_view(&records, &criteria, &Denylist::empty());
        assert_eq!(companies(&view), vec!["A.I. Labs"]);
    }

    #[test]
    fn test_search_results_all_contain_needle() {
        let mut records = Vec::new();
        for (i, name) in ["Acme Corp", "Globex", "Acme Labs", "Hooli"].iter().enumerate() {
            records.push(record(i as i64, name, Some("2024-01-01")));
        }
        let criteria = FilterCriteria {
            search: " ACME ".to_string(),
            ..Default::default()
        };
        let view = derive_view(&records, &criteria, &Denylist::empty());
        assert_eq!(view.len(), 2);
        for r in &view {
            assert!(normalize(r.company.as_deref().unwrap()).contains("acme"));
        }
    }

    #[test]
    fn test_whitespace_only_search_matches_everything() {
        let records = vec![record(1, "Acme", None), record(2, "Globex", None)];
        let criteria = FilterCriteria {
            search: " . ".to_string(),
            ..Default::default()
        };
        let view = derive_view(&records, &criteria, &Denylist::empty());
        assert_eq!(view.len(), 2);
    }

    #[test]
    fn test_status_filter_is_exact() {
        let mut a = record(1, "Acme", Some("2024-01-01"));
        a.status = Status::Interview;
        let mut b = record(2, "Globex", Some("2024-02-01"));
        b.status = Status::Rejected;
        let mut c = record(3, "Initech", Some("2024-03-01"));
        c.status = Status::Other("interview".to_string());

        let criteria = FilterCriteria {
            status: Some(Status::Interview),
            ..Default::default()
        };
        let view = derive_view(&[a, b, c], &criteria, &Denylist::empty());
        assert_eq!(companies(&view), vec!["Acme"]);
        assert!(view.iter().all(|r| r.status == Status::Interview));
    }

    #[test]
    fn test_unknown_status_passes_when_filter_unset() {
        let mut a = record(1, "Acme", Some("2024-01-01"));
        a.status = Status::Other("ghosted".to_string());
        let view = derive_view(&[a], &FilterCriteria::default(), &Denylist::empty());
        assert_eq!(view.len(), 1);
    }

    #[test]
    fn test_reminder_filter() {
        let mut a = record(1, "Acme", Some("2024-01-01"));
        a.reminder = true;
        let b = record(2, "Globex", Some("2024-02-01"));
        let records = vec![a, b];

        let with = FilterCriteria {
            reminder: ReminderFilter::HasReminder,
            ..Default::default()
        };
        let view = derive_view(&records, &with, &Denylist::empty());
        assert_eq!(companies(&view), vec!["Acme"]);
        assert!(view.iter().all(|r| r.reminder));

        let without = FilterCriteria {
            reminder: ReminderFilter::NoReminder,
            ..Default::default()
        };
        let view = derive_view(&records, &without, &Denylist::empty());
        assert_eq!(companies(&view), vec!["Globex"]);
        assert!(view.iter().all(|r| !r.reminder));
    }

    #[test]
    fn test_missing_and_bad_dates_sink_to_bottom() {
        let records = vec![
            record(1, "NoDate", None),
            record(2, "Old", Some("2023-06-01")),
            record(3, "Garbage", Some("not a date")),
            record(4, "New", Some("2024-06-01T08:00:00Z")),
            record(5, "Empty", Some("")),
        ];
        let view = derive_view(&records, &FilterCriteria::default(), &Denylist::empty());
        assert_eq!(companies(&view), vec!["New", "Old", "NoDate", "Garbage", "Empty"]);
    }

    #[test]
    fn test_sort_is_stable_for_equal_dates() {
        let records = vec![
            record(1, "First", Some("2024-01-01")),
            record(2, "Second", Some("2024-01-01")),
            record(3, "Third", Some("2024-01-01 00:00:00")),
        ];
        let view = derive_view(&records, &FilterCriteria::default(), &Denylist::empty());
        assert_eq!(companies(&view), vec!["First", "Second", "Third"]);
    }

    #[test]
    fn test_sort_selector_ignored_by_default() {
        let mut a = record(1, "Acme", Some("2024-01-01"));
        a.deadline = Some("2024-12-01".to_string());
        let mut b = record(2, "Globex", Some("2024-03-01"));
        b.deadline = Some("2024-05-01".to_string());
        let records = vec![a, b];

        let criteria = FilterCriteria {
            sort_by: SortField::Deadline,
            ..Default::default()
        };
        let view = derive_view(&records, &criteria, &Denylist::empty());
        assert_eq!(companies(&view), vec!["Globex", "Acme"]);

        let honored = derive_view_with(
            &records,
            &criteria,
            &Denylist::empty(),
            ViewOptions { honor_sort_by: true },
        );
        assert_eq!(companies(&honored), vec!["Acme", "Globex"]);
    }

    #[test]
    fn test_honored_sort_sinks_missing_field() {
        let mut a = record(1, "Acme", Some("2024-01-01"));
        a.follow_up_date = Some("2024-02-01".to_string());
        let b = record(2, "Globex", Some("2024-03-01"));
        let criteria = FilterCriteria {
            sort_by: SortField::FollowUpDate,
            ..Default::default()
        };
        let view = derive_view_with(
            &[b, a],
            &criteria,
            &Denylist::empty(),
            ViewOptions { honor_sort_by: true },
        );
        assert_eq!(companies(&view), vec!["Acme", "Globex"]);
    }

    #[test]
    fn test_derive_view_is_idempotent() {
        let mut a = record(1, "Acme", Some("2024-01-01"));
        a.reminder = true;
        let records = vec![a, record(2, "Globex", None), record(3, "Tech Corp", None)];
        let criteria = FilterCriteria {
            search: "a".to_string(),
            ..Default::default()
        };
        let first = derive_view(&records, &criteria, &Denylist::default());
        let second = derive_view(&records, &criteria, &Denylist::default());
        assert_eq!(first, second);
    }

    #[test]
    fn test_follow_up_soon() {
        let mut r = record(1, "Acme", None);
        assert!(!is_follow_up_soon(&r, now()));

        r.follow_up_date = Some((now() + Duration::days(1)).to_rfc3339());
        assert!(is_follow_up_soon(&r, now()));

        r.follow_up_date = Some((now() + Duration::days(10)).to_rfc3339());
        assert!(!is_follow_up_soon(&r, now()));

        r.follow_up_date = Some((now() - Duration::days(5)).to_rfc3339());
        assert!(is_follow_up_soon(&r, now()));

        r.follow_up_date = Some("someday".to_string());
        assert!(!is_follow_up_soon(&r, now()));
    }

    #[test]
    fn test_follow_up_window_boundary() {
        let mut r = record(1, "Acme", None);
        r.follow_up_date = Some((now() + Duration::days(3)).to_rfc3339());
        assert!(!is_follow_up_soon(&r, now()));

        r.follow_up_date = Some((now() + Duration::days(3) - Duration::seconds(1)).to_rfc3339());
        assert!(is_follow_up_soon(&r, now()));

        // Date-only values are midnight UTC.
        r.follow_up_date = Some("2024-04-13".to_string());
        assert!(is_follow_up_soon(&r, now()));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Foo. Bar\tBaz\n"), "foobarbaz");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("Ünïcode Co."), "ünïcodeco");
    }
}
