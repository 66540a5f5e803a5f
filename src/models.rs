use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Status {
    #[default]
    Applied,
    Interview,
    Rejected,
    Accepted,
    /// Anything the backend sends that is not one of the four tracker states.
    Other(String),
}

impl Status {
    pub fn known() -> [Status; 4] {
        [Status::Applied, Status::Interview, Status::Rejected, Status::Accepted]
    }

    /// Exact, case-sensitive match; the backend stores the capitalized form.
    pub fn parse(raw: &str) -> Status {
        match raw {
            "Applied" => Status::Applied,
            "Interview" => Status::Interview,
            "Rejected" => Status::Rejected,
            "Accepted" => Status::Accepted,
            other => Status::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Status::Applied => "Applied",
            Status::Interview => "Interview",
            Status::Rejected => "Rejected",
            Status::Accepted => "Accepted",
            Status::Other(raw) => raw,
        }
    }

    /// Next known status, wrapping around. Unknown statuses move to `Applied`.
    pub fn next(&self) -> Status {
        match self {
            Status::Applied => Status::Interview,
            Status::Interview => Status::Rejected,
            Status::Rejected => Status::Accepted,
            Status::Accepted | Status::Other(_) => Status::Applied,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept any casing from the command line, but only the known states.
        Status::known()
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown status '{}' (expected Applied, Interview, Rejected or Accepted)", s))
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::String(s) => Status::parse(&s),
            Value::Null => Status::Other(String::new()),
            other => Status::Other(other.to_string()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReminderFilter {
    #[default]
    Any,
    HasReminder,
    NoReminder,
}

impl ReminderFilter {
    pub fn next(self) -> Self {
        match self {
            ReminderFilter::Any => ReminderFilter::HasReminder,
            ReminderFilter::HasReminder => ReminderFilter::NoReminder,
            ReminderFilter::NoReminder => ReminderFilter::Any,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReminderFilter::Any => "All",
            ReminderFilter::HasReminder => "With Reminder",
            ReminderFilter::NoReminder => "No Reminder",
        }
    }
}

impl FromStr for ReminderFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "any" | "all" => Ok(ReminderFilter::Any),
            "yes" | "y" | "with" => Ok(ReminderFilter::HasReminder),
            "no" | "n" | "without" => Ok(ReminderFilter::NoReminder),
            other => Err(format!("unknown reminder filter '{}' (expected any, yes or no)", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    AppliedAt,
    Deadline,
    FollowUpDate,
}

impl SortField {
    pub fn next(self) -> Self {
        match self {
            SortField::AppliedAt => SortField::Deadline,
            SortField::Deadline => SortField::FollowUpDate,
            SortField::FollowUpDate => SortField::AppliedAt,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortField::AppliedAt => "Applied Date",
            SortField::Deadline => "Deadline",
            SortField::FollowUpDate => "Follow Up Date",
        }
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "applied_at" | "applied" => Ok(SortField::AppliedAt),
            "deadline" => Ok(SortField::Deadline),
            "follow_up_date" | "follow_up" | "followup" => Ok(SortField::FollowUpDate),
            other => Err(format!(
                "unknown sort field '{}' (expected applied_at, deadline or follow_up_date)",
                other
            )),
        }
    }
}

/// User-entered criteria for the applied-jobs list. Owned by the UI session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub search: String,
    pub status: Option<Status>,
    pub reminder: ReminderFilter,
    pub sort_by: SortField,
}

/// A tracked application as the backend returns it from `/applied`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: i64,
    #[serde(default, deserialize_with = "lenient_text")]
    pub company: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub link: Option<String>,
    #[serde(default)]
    pub status: Status,
    #[serde(default, deserialize_with = "lenient_text")]
    pub hr_contact: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub follow_up_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub reminder: bool,
    #[serde(default, deserialize_with = "lenient_text")]
    pub applied_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub deadline: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub resume_path: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub ctc: Option<String>,
}

impl ApplicationRecord {
    pub fn applied_at_time(&self) -> Option<DateTime<Utc>> {
        self.applied_at.as_deref().and_then(parse_timestamp)
    }

    pub fn follow_up_time(&self) -> Option<DateTime<Utc>> {
        self.follow_up_date.as_deref().and_then(parse_timestamp)
    }

    pub fn deadline_time(&self) -> Option<DateTime<Utc>> {
        self.deadline.as_deref().and_then(parse_timestamp)
    }

    pub fn time_for(&self, field: SortField) -> Option<DateTime<Utc>> {
        match field {
            SortField::AppliedAt => self.applied_at_time(),
            SortField::Deadline => self.deadline_time(),
            SortField::FollowUpDate => self.follow_up_time(),
        }
    }
}

/// A row from `/analytics/recent`. The backend sends only these four columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentApplication {
    #[serde(default, deserialize_with = "lenient_text")]
    pub company: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(default)]
    pub status: Status,
    #[serde(default, deserialize_with = "lenient_text")]
    pub applied_at: Option<String>,
}

/// Parses the date formats the tracker backend produces. Returns `None` for
/// empty or unrecognized input rather than failing.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Date portion for display and for the `YYYY-MM-DD` inputs the backend expects.
pub fn date_only(raw: &str) -> &str {
    raw.split(['T', ' ']).next().unwrap_or(raw)
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    })
}

/// Text list whose entries may be null; nulls become empty strings.
fn lenient_text_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Null => String::new(),
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
        _ => Vec::new(),
    })
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(is_truthy(&value))
}

/// Truthiness for flags stored as integers, booleans or strings.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => {
            let s = s.trim();
            !(s.is_empty() || s == "0" || s.eq_ignore_ascii_case("false"))
        }
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// A posting returned by the scraper endpoint (`/jobs`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedJob {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub matched_keyword: Option<String>,
}

/// Fields accepted by the one-click tracker endpoint (`/applied/new`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewApplication {
    pub company: String,
    pub title: String,
    pub link: String,
    pub status: Option<Status>,
    pub hr_contact: Option<String>,
    pub follow_up_date: Option<NaiveDate>,
    pub reminder: bool,
    pub applied_at: Option<NaiveDate>,
    pub deadline: Option<NaiveDate>,
    pub notes: Option<String>,
    pub ctc: Option<String>,
}

impl NewApplication {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("company", self.company.clone()),
            ("title", self.title.clone()),
            ("link", self.link.clone()),
            ("reminder", if self.reminder { "1" } else { "0" }.to_string()),
        ];
        if let Some(status) = &self.status {
            pairs.push(("status", status.to_string()));
        }
        let optional_text = [
            ("hr_contact", &self.hr_contact),
            ("notes", &self.notes),
            ("ctc", &self.ctc),
        ];
        for (key, value) in optional_text {
            if let Some(v) = value {
                pairs.push((key, v.clone()));
            }
        }
        let dates = [
            ("follow_up_date", self.follow_up_date),
            ("applied_at", self.applied_at),
            ("deadline", self.deadline),
        ];
        for (key, value) in dates {
            if let Some(d) = value {
                pairs.push((key, d.format("%Y-%m-%d").to_string()));
            }
        }
        pairs
    }
}

/// A single-field edit sent as `PATCH /applied/{id}`.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    Status(Status),
    Ctc(String),
    Notes(String),
    HrContact(String),
    FollowUpDate(Option<NaiveDate>),
    Deadline(Option<NaiveDate>),
    Reminder(bool),
}

impl FieldUpdate {
    pub fn field_name(&self) -> &'static str {
        match self {
            FieldUpdate::Status(_) => "status",
            FieldUpdate::Ctc(_) => "ctc",
            FieldUpdate::Notes(_) => "notes",
            FieldUpdate::HrContact(_) => "hr_contact",
            FieldUpdate::FollowUpDate(_) => "follow_up_date",
            FieldUpdate::Deadline(_) => "deadline",
            FieldUpdate::Reminder(_) => "reminder",
        }
    }

    /// Parses a `field value` pair from the command line. Empty dates clear the field.
    pub fn parse(field: &str, value: &str) -> anyhow::Result<Self> {
        let parse_date = |v: &str| -> anyhow::Result<Option<NaiveDate>> {
            let v = v.trim();
            if v.is_empty() {
                return Ok(None);
            }
            NaiveDate::parse_from_str(v, "%Y-%m-%d")
                .map(Some)
                .map_err(|_| anyhow::anyhow!("Invalid date '{}', expected YYYY-MM-DD", v))
        };

        match field {
            "status" => value
                .parse::<Status>()
                .map(FieldUpdate::Status)
                .map_err(|e| anyhow::anyhow!(e)),
            "ctc" => Ok(FieldUpdate::Ctc(value.to_string())),
            "notes" => Ok(FieldUpdate::Notes(value.to_string())),
            "hr_contact" | "hr" => Ok(FieldUpdate::HrContact(value.to_string())),
            "follow_up_date" | "follow_up" => parse_date(value).map(FieldUpdate::FollowUpDate),
            "deadline" => parse_date(value).map(FieldUpdate::Deadline),
            "reminder" => Ok(FieldUpdate::Reminder(is_truthy(&Value::String(value.to_string())))),
            other => Err(anyhow::anyhow!(
                "Field '{}' is not editable. Editable: status, ctc, notes, hr_contact, follow_up_date, deadline, reminder",
                other
            )),
        }
    }

    pub fn to_payload(&self) -> Value {
        let value = match self {
            FieldUpdate::Status(status) => Value::String(status.to_string()),
            FieldUpdate::Ctc(s) | FieldUpdate::Notes(s) | FieldUpdate::HrContact(s) => {
                Value::String(s.clone())
            }
            FieldUpdate::FollowUpDate(date) | FieldUpdate::Deadline(date) => Value::String(
                date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
            ),
            FieldUpdate::Reminder(on) => Value::from(if *on { 1 } else { 0 }),
        };
        let mut payload = serde_json::Map::new();
        payload.insert(self.field_name().to_string(), value);
        Value::Object(payload)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewQuestion {
    pub id: i64,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_text_list")]
    pub companies: Vec<String>,
    #[serde(default, deserialize_with = "lenient_text_list")]
    pub ctc_offered: Vec<String>,
    #[serde(default)]
    pub asked_at: Vec<Option<String>>,
    #[serde(default)]
    pub link: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewQuestion {
    pub job_id: Option<i64>,
    pub company: String,
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ctc_offered: Option<String>,
}

/// Generic `{success, message}` acknowledgement from mutation endpoints.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizeRequest {
    pub resume_points: String,
    pub job_title: String,
    pub job_description: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OptimizedPoint {
    pub original: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OptimizeResponse {
    #[serde(default)]
    pub optimized_points: Vec<OptimizedPoint>,
}
