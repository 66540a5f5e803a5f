use anyhow::{anyhow, Context, Result};
use reqwest::blocking::{multipart, Client, Response};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

use crate::analytics::StatusSummary;
use crate::models::{
    Ack, ApplicationRecord, FieldUpdate, InterviewQuestion, NewApplication, NewQuestion,
    OptimizeRequest, OptimizeResponse, OptimizedPoint, RecentApplication, ScrapedJob,
};

const RESUME_EXTENSIONS: [&str; 2] = ["pdf", "docx"];

// --- Store trait ---

/// The applied-jobs resource. Every mutation is followed by a fresh
/// `list_applied`; nothing edits fetched records in place.
pub trait ApplicationStore {
    fn list_applied(&self) -> Result<Vec<ApplicationRecord>>;
    fn update_field(&self, id: i64, update: &FieldUpdate) -> Result<()>;
    fn delete_applied(&self, id: i64) -> Result<()>;
    fn upload_resume(&self, id: i64, file: &Path) -> Result<String>;
}

// --- HTTP client ---

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    filename: Option<String>,
}

#[derive(Debug)]
pub struct BackendClient {
    base_url: String,
    client: Client,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(anyhow!(
                "Backend URL not configured. Set APPLYTRACK_API_URL or pass --api-url"
            ));
        }

        // Tunnels in front of the backend serve an interstitial page without this.
        let mut headers = HeaderMap::new();
        headers.insert("ngrok-skip-browser-warning", HeaderValue::from_static("true"));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            // `/applied/new` answers with a redirect to the web frontend.
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Link to an uploaded resume, as served by the backend.
    pub fn resume_url(&self, resume_path: &str) -> String {
        self.url(&format!("/applied/resume/{}", resume_path))
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        tracing::debug!(%url, "GET");
        let response = self
            .client
            .get(&url)
            .send()
            .with_context(|| format!("Failed to reach backend at {}", url))?;
        let body = success_body(response, &url)?;
        serde_json::from_str(&body).with_context(|| format!("Failed to parse response from {}", url))
    }

    // --- Applied jobs ---

    pub fn quick_add(&self, application: &NewApplication) -> Result<()> {
        if application.company.trim().is_empty()
            || application.title.trim().is_empty()
            || application.link.trim().is_empty()
        {
            return Err(anyhow!("Missing required fields (company, title, link)"));
        }

        let url = self.url("/applied/new");
        tracing::info!(company = %application.company, title = %application.title, "adding application");
        let response = self
            .client
            .get(&url)
            .query(&application.query_pairs())
            .send()
            .with_context(|| format!("Failed to reach backend at {}", url))?;

        let status = response.status();
        if status.is_success() || status.is_redirection() {
            return Ok(());
        }
        let text = response.text().unwrap_or_default();
        Err(anyhow!("Adding application failed with status {}: {}", status, error_message(&text)))
    }

    // --- Scraped jobs ---

    pub fn list_jobs(&self) -> Result<Vec<ScrapedJob>> {
        self.get_json("/jobs")
    }

    pub fn scrape_and_email(&self) -> Result<String> {
        let url = self.url("/scrape-and-email");
        tracing::info!(%url, "triggering scrape");
        let response = self
            .client
            .post(&url)
            .send()
            .with_context(|| format!("Failed to reach backend at {}", url))?;
        let body = success_body(response, &url)
            .map_err(|e| anyhow!("Failed to scrape and email jobs: {}", e))?;
        let ack: Ack = serde_json::from_str(&body).unwrap_or_default();
        Ok(ack
            .message
            .unwrap_or_else(|| "Jobs scraped and emailed!".to_string()))
    }

    // --- Analytics ---

    pub fn analytics_summary(&self) -> Result<StatusSummary> {
        self.get_json("/analytics/summary")
    }

    pub fn recent_applications(&self) -> Result<Vec<RecentApplication>> {
        self.get_json("/analytics/recent")
    }

    // --- Interview questions ---

    pub fn list_questions(&self, job_id: Option<i64>) -> Result<Vec<InterviewQuestion>> {
        let path = match job_id {
            Some(id) => format!("/interview_questions?job_id={}", id),
            None => "/interview_questions".to_string(),
        };
        let value: Value = self.get_json(&path)?;
        if !value.is_array() {
            return Ok(Vec::new());
        }
        serde_json::from_value(value).context("Failed to parse interview questions")
    }

    pub fn add_question(&self, question: &NewQuestion) -> Result<Ack> {
        if question.question.trim().is_empty() || question.company.trim().is_empty() {
            return Err(anyhow!("Missing question or company."));
        }
        let url = self.url("/interview_questions");
        let response = self
            .client
            .post(&url)
            .json(question)
            .send()
            .with_context(|| format!("Failed to reach backend at {}", url))?;
        let body = success_body(response, &url)?;
        serde_json::from_str(&body).context("Failed to parse add-question response")
    }

    pub fn delete_question(&self, id: i64) -> Result<()> {
        let url = self.url(&format!("/interview_questions/{}", id));
        let response = self
            .client
            .delete(&url)
            .send()
            .with_context(|| format!("Failed to reach backend at {}", url))?;
        success_body(response, &url).map(|_| ())
    }

    // --- Resume optimizer ---

    pub fn optimize(&self, request: &OptimizeRequest) -> Result<Vec<OptimizedPoint>> {
        if request.job_title.trim().is_empty() || request.resume_points.trim().is_empty() {
            return Err(anyhow!("Missing job_title or resume_points"));
        }
        let url = self.url("/optimize");
        tracing::info!(job_title = %request.job_title, "requesting resume optimization");
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .with_context(|| format!("Failed to reach backend at {}", url))?;
        let body = success_body(response, &url)?;
        let parsed: OptimizeResponse =
            serde_json::from_str(&body).context("Failed to parse optimizer response")?;
        Ok(parsed.optimized_points)
    }
}

impl ApplicationStore for BackendClient {
    fn list_applied(&self) -> Result<Vec<ApplicationRecord>> {
        let url = self.url("/applied");
        tracing::debug!(%url, "fetching applied jobs");
        let response = self
            .client
            .get(&url)
            .send()
            .with_context(|| format!("Failed to reach backend at {}", url))?;
        let body = success_body(response, &url)?;
        let records = parse_applied_body(&body)?;
        tracing::debug!(count = records.len(), "fetched applied jobs");
        Ok(records)
    }

    fn update_field(&self, id: i64, update: &FieldUpdate) -> Result<()> {
        let url = self.url(&format!("/applied/{}", id));
        tracing::info!(id, field = update.field_name(), "updating application");
        let response = self
            .client
            .patch(&url)
            .json(&update.to_payload())
            .send()
            .with_context(|| format!("Failed to reach backend at {}", url))?;
        success_body(response, &url).map(|_| ())
    }

    fn delete_applied(&self, id: i64) -> Result<()> {
        let url = self.url(&format!("/applied/{}", id));
        tracing::info!(id, "deleting application");
        let response = self
            .client
            .delete(&url)
            .send()
            .with_context(|| format!("Failed to reach backend at {}", url))?;
        success_body(response, &url).map(|_| ())
    }

    fn upload_resume(&self, id: i64, file: &Path) -> Result<String> {
        check_resume_extension(file)?;
        let url = self.url(&format!("/applied/{}/upload_resume", id));
        tracing::info!(id, file = %file.display(), "uploading resume");

        let form = multipart::Form::new()
            .file("resume", file)
            .with_context(|| format!("Failed to read resume file: {}", file.display()))?;

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .with_context(|| format!("Failed to reach backend at {}", url))?;
        let body = success_body(response, &url)?;
        let parsed: UploadResponse =
            serde_json::from_str(&body).context("Failed to parse upload response")?;
        parsed
            .filename
            .ok_or_else(|| anyhow!("Upload response did not include a filename"))
    }
}

/// Returns the body of a 2xx response, or an error carrying the backend's message.
fn success_body(response: Response, url: &str) -> Result<String> {
    let status = response.status();
    let text = response
        .text()
        .with_context(|| format!("Failed to read response from {}", url))?;
    if !status.is_success() {
        return Err(anyhow!(
            "Request to {} failed with status {}: {}",
            url,
            status,
            error_message(&text)
        ));
    }
    Ok(text)
}

/// Pulls `message` or `error` out of a JSON error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        for key in ["message", "error"] {
            if let Some(msg) = value.get(key).and_then(Value::as_str) {
                return msg.to_string();
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "(empty response)".to_string()
    } else {
        trimmed.to_string()
    }
}

fn looks_like_html(body: &str) -> bool {
    let head: String = body
        .trim_start()
        .chars()
        .take(9)
        .collect::<String>()
        .to_ascii_lowercase();
    head.starts_with("<!doctype") || head.starts_with("<html")
}

/// Validates the `/applied` payload: a tunnel error page or a non-array body
/// is reported as an error instead of being treated as data.
pub fn parse_applied_body(body: &str) -> Result<Vec<ApplicationRecord>> {
    if looks_like_html(body) {
        return Err(anyhow!(
            "Backend returned an HTML page (tunnel error or rate limit). Restart the tunnel or try again later."
        ));
    }
    let value: Value = serde_json::from_str(body).context("Backend returned invalid JSON")?;
    if !value.is_array() {
        return Err(anyhow!("API did not return an array. Check backend."));
    }
    serde_json::from_value(value).context("Failed to parse applied jobs")
}

pub fn check_resume_extension(file: &Path) -> Result<()> {
    let ext = file
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    if RESUME_EXTENSIONS.contains(&ext.as_str()) {
        Ok(())
    } else {
        Err(anyhow!("Only PDF/DOCX allowed: {}", file.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Status;

    #[test]
    fn test_new_requires_base_url() {
        let result = BackendClient::new("   ", Duration::from_secs(5));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("APPLYTRACK_API_URL"));
    }

    #[test]
    fn test_urls_strip_trailing_slash() {
        let client = BackendClient::new("http://localhost:5002/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:5002");
        assert_eq!(client.url("/applied"), "http://localhost:5002/applied");
        assert_eq!(
            client.resume_url("job_3_cv.pdf"),
            "http://localhost:5002/applied/resume/job_3_cv.pdf"
        );
    }

    #[test]
    fn test_parse_applied_body_accepts_array() {
        let body = r#"[{"id": 1, "company": "Acme", "status": "Applied", "reminder": 0}]"#;
        let records = parse_applied_body(body).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, Status::Applied);
    }

    #[test]
    fn test_parse_applied_body_rejects_html() {
        let body = "<!DOCTYPE html><html><body>ERR_NGROK_6024</body></html>";
        let err = parse_applied_body(body).unwrap_err().to_string();
        assert!(err.contains("HTML"));

        let err = parse_applied_body("  <html>oops</html>").unwrap_err().to_string();
        assert!(err.contains("HTML"));
    }

    #[test]
    fn test_parse_applied_body_rejects_non_array() {
        let err = parse_applied_body(r#"{"error": "db locked"}"#).unwrap_err().to_string();
        assert!(err.contains("array"));
        assert!(parse_applied_body("not json").is_err());
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(error_message(r#"{"error": "Only PDF/DOCX allowed"}"#), "Only PDF/DOCX allowed");
        assert_eq!(error_message(r#"{"success": false, "message": "boom"}"#), "boom");
        assert_eq!(error_message("Database error: locked\n"), "Database error: locked");
        assert_eq!(error_message(""), "(empty response)");
    }

    #[test]
    fn test_check_resume_extension() {
        assert!(check_resume_extension(Path::new("cv.pdf")).is_ok());
        assert!(check_resume_extension(Path::new("/tmp/CV.DOCX")).is_ok());
        assert!(check_resume_extension(Path::new("cv.doc")).is_err());
        assert!(check_resume_extension(Path::new("cv")).is_err());
    }

    #[test]
    fn test_quick_add_validates_before_sending() {
        let client = BackendClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        let err = client.quick_add(&NewApplication::default()).unwrap_err();
        assert!(err.to_string().contains("Missing required fields"));
    }

    #[test]
    fn test_optimize_validates_before_sending() {
        let client = BackendClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        let request = OptimizeRequest {
            resume_points: String::new(),
            job_title: "SRE".to_string(),
            job_description: String::new(),
        };
        let err = client.optimize(&request).unwrap_err();
        assert!(err.to_string().contains("resume_points"));
    }

    #[test]
    #[ignore] // Requires a running backend
    fn test_list_applied_live() {
        let url = std::env::var("APPLYTRACK_API_URL").unwrap_or_else(|_| "http://localhost:5002".to_string());
        let client = BackendClient::new(&url, Duration::from_secs(10)).expect("Failed to create client");
        let records = client.list_applied();
        assert!(records.is_ok(), "{:?}", records.err());
    }
}
