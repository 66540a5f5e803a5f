use anyhow::{Context, Result};
use reqwest::Url;

use crate::models::ScrapedJob;

pub const CHATGPT_URL: &str = "https://chat.openai.com/";

/// Prompt for pasting into a chat assistant to tailor resume bullets to a posting.
pub fn tailoring_prompt(job: &ScrapedJob) -> String {
    format!(
        "Act as an AI assistant for resume tailoring.\n\n\
         Here is a job description:\n\
         Title: {}\n\
         Company: {}\n\
         Link: {}\n\n\
         Here is my resume:\n\
         [Paste Resume Text Here]\n\n\
         Give me resume bullet points that improve my ATS score for this job and ask me to select which ones to include.",
        job.title, job.company, job.link
    )
}

/// Frontend route that opens the resume optimizer prefilled with a job title.
pub fn optimizer_link(frontend_url: &str, job_title: &str) -> Result<String> {
    let base = format!("{}/form", frontend_url.trim_end_matches('/'));
    let url = Url::parse_with_params(&base, &[("job_title", job_title)])
        .with_context(|| format!("Invalid frontend URL: {}", frontend_url))?;
    Ok(url.to_string())
}
