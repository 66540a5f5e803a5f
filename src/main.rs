mod actions;
mod analytics;
mod client;
mod config;
mod models;
mod notify;
mod prompt;
mod questions;
mod telemetry;
mod tui;
mod view;

use anyhow::{anyhow, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use actions::AppliedJobs;
use client::{ApplicationStore, BackendClient};
use config::Config;
use models::{
    date_only, ApplicationRecord, FieldUpdate, NewApplication, NewQuestion, OptimizeRequest,
    ReminderFilter, SortField, Status,
};
use notify::ConsoleNotifier;
use view::is_follow_up_soon;

#[derive(Parser)]
#[command(name = "applytrack")]
#[command(about = "Job application assistant - browse postings, track applications, prepare for interviews")]
struct Cli {
    /// Backend base URL (overrides config and APPLYTRACK_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Path to config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Track applied jobs
    Applied {
        #[command(subcommand)]
        command: AppliedCommands,
    },

    /// List scraped job postings
    Jobs {
        /// Print the resume-tailoring prompt for posting N (1-based)
        #[arg(short, long)]
        prompt: Option<usize>,
    },

    /// Run the scrapers and email the results
    Scrape,

    /// Show application status breakdown
    Analytics {
        /// Also list the five most recent applications
        #[arg(long)]
        recent: bool,

        /// Compute from the applied-jobs list instead of the summary endpoint
        #[arg(long)]
        local: bool,
    },

    /// Manage interview questions
    Questions {
        #[command(subcommand)]
        command: QuestionCommands,
    },

    /// Get rewritten resume bullet points for a job title
    Optimize {
        /// Job title
        #[arg(short, long)]
        title: String,

        /// Job description
        #[arg(short, long, default_value = "")]
        description: String,

        /// File with one resume bullet point per line
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Resume bullet points, newline separated
        #[arg(long)]
        points: Option<String>,
    },

    /// Browse applied jobs interactively
    Browse {
        /// Order by the selected sort field instead of applied date
        #[arg(long)]
        honor_sort: bool,
    },
}

#[derive(Subcommand)]
enum AppliedCommands {
    /// List applied jobs
    List {
        /// Search company, title, or notes
        #[arg(short, long, default_value = "")]
        search: String,

        /// Filter by status (Applied, Interview, Rejected, Accepted)
        #[arg(long)]
        status: Option<Status>,

        /// Filter by reminder (yes, no, any)
        #[arg(short, long, default_value = "any")]
        reminder: ReminderFilter,

        /// Sort field (applied_at, deadline, follow_up_date); only used with --honor-sort
        #[arg(long, default_value = "applied_at")]
        sort_by: SortField,

        /// Order by --sort-by instead of applied date
        #[arg(long)]
        honor_sort: bool,

        /// Print the derived list as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one applied job
    Show {
        /// Applied job ID
        id: i64,
    },

    /// Update one field (status, ctc, notes, hr_contact, follow_up_date, deadline, reminder)
    Set {
        /// Applied job ID
        id: i64,

        /// Field name
        field: String,

        /// New value (dates as YYYY-MM-DD, empty to clear)
        value: String,
    },

    /// Delete an applied job
    Delete {
        /// Applied job ID
        id: i64,
    },

    /// Attach a resume (PDF or DOCX)
    Upload {
        /// Applied job ID
        id: i64,

        /// Path to resume file
        file: PathBuf,
    },

    /// Add a job to the tracker
    Add {
        #[arg(long)]
        company: String,

        #[arg(long)]
        title: String,

        /// Posting URL
        #[arg(long)]
        link: String,

        #[arg(long)]
        status: Option<Status>,

        #[arg(long)]
        hr_contact: Option<String>,

        /// YYYY-MM-DD
        #[arg(long)]
        follow_up: Option<NaiveDate>,

        /// YYYY-MM-DD
        #[arg(long)]
        deadline: Option<NaiveDate>,

        /// YYYY-MM-DD
        #[arg(long)]
        applied_at: Option<NaiveDate>,

        #[arg(long)]
        notes: Option<String>,

        #[arg(long)]
        ctc: Option<String>,

        /// Enable follow-up reminder
        #[arg(long)]
        reminder: bool,
    },
}

#[derive(Subcommand)]
enum QuestionCommands {
    /// List interview questions
    List {
        /// Search questions or companies
        #[arg(short, long, default_value = "")]
        search: String,

        /// Only questions recorded for this applied job
        #[arg(long)]
        job_id: Option<i64>,
    },

    /// Record a question you were asked
    Add {
        #[arg(long)]
        company: String,

        #[arg(long)]
        question: String,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        link: Option<String>,

        #[arg(long)]
        job_id: Option<i64>,

        /// CTC offered by the company
        #[arg(long)]
        ctc: Option<String>,
    },

    /// Delete a question
    Delete {
        /// Question ID
        id: i64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(url) = cli.api_url {
        config.api_url = Some(url);
    }

    // The TUI owns the terminal; logging to stderr would corrupt it.
    if !matches!(cli.command, Commands::Browse { .. }) {
        telemetry::init(&config.log_level)?;
    }

    let client = BackendClient::new(config.api_url()?, config.timeout())?;
    tracing::debug!(api_url = client.base_url(), "using backend");

    match cli.command {
        Commands::Applied { command } => run_applied(&client, &config, command)?,

        Commands::Jobs { prompt } => {
            let jobs = client.list_jobs()?;
            match prompt {
                Some(n) => {
                    let job = n
                        .checked_sub(1)
                        .and_then(|i| jobs.get(i))
                        .ok_or_else(|| anyhow!("No posting #{} ({} available)", n, jobs.len()))?;
                    println!("{}", prompt::tailoring_prompt(job));
                    println!("\n--- Links ---");
                    println!("Posting:   {}", job.link);
                    println!("ChatGPT:   {}", prompt::CHATGPT_URL);
                    println!("Optimizer: {}", prompt::optimizer_link(&config.frontend_url, &job.title)?);
                }
                None if jobs.is_empty() => println!("No job postings found."),
                None => {
                    println!("{:<4} {:<24} {:<36} {:<40}", "#", "COMPANY", "TITLE", "LINK");
                    println!("{}", "-".repeat(104));
                    for (i, job) in jobs.iter().enumerate() {
                        println!(
                            "{:<4} {:<24} {:<36} {:<40}",
                            i + 1,
                            truncate(&job.company, 22),
                            truncate(&job.title, 34),
                            job.link
                        );
                    }
                }
            }
        }

        Commands::Scrape => {
            println!("Scraping & emailing...");
            let message = client.scrape_and_email()?;
            println!("{}", message);
        }

        Commands::Analytics { recent, local } => {
            let summary = if local {
                analytics::summarize(&client.list_applied()?)
            } else {
                client.analytics_summary()?
            };

            if !summary.has_data() {
                println!("No job applications found. Start applying to see your analytics!");
            } else {
                println!("Application Status ({} total)\n", summary.total());
                for slice in summary.slices() {
                    println!(
                        "{:<10} {:>4} {:>4}%  {}",
                        slice.label,
                        slice.count,
                        slice.percent,
                        "#".repeat((slice.percent / 2) as usize)
                    );
                }
            }

            if recent {
                let records = client.recent_applications()?;
                println!("\nRecent applications:");
                if records.is_empty() {
                    println!("  (none)");
                }
                for record in records {
                    println!(
                        "  {:<12} {:<20} {:<30} {}",
                        record.applied_at.as_deref().map(date_only).unwrap_or("-"),
                        truncate(record.company.as_deref().unwrap_or(""), 18),
                        truncate(record.title.as_deref().unwrap_or(""), 28),
                        record.status
                    );
                }
            }
        }

        Commands::Questions { command } => match command {
            QuestionCommands::List { search, job_id } => {
                let all = client.list_questions(job_id)?;
                let questions = questions::filter_questions(&all, &search);
                if questions.is_empty() {
                    println!("No interview questions found.");
                }
                for q in questions {
                    println!("#{} {}", q.id, q.question);
                    if let Some(desc) = q.description.as_deref().filter(|d| *d != q.question && !d.is_empty()) {
                        for line in textwrap::fill(desc, 76).lines() {
                            println!("    {}", line);
                        }
                    }
                    let companies: Vec<&str> =
                        q.companies.iter().map(String::as_str).filter(|c| !c.is_empty()).collect();
                    if !companies.is_empty() {
                        println!("    Asked at: {}", companies.join(", "));
                    }
                    if !q.ctc_offered.is_empty() {
                        println!("    CTC offered: {}", q.ctc_offered.join(", "));
                    }
                    if let Some(link) = &q.link {
                        println!("    Link: {}", link);
                    }
                }
            }

            QuestionCommands::Add {
                company,
                question,
                description,
                link,
                job_id,
                ctc,
            } => {
                let ack = client.add_question(&NewQuestion {
                    job_id,
                    company,
                    question,
                    description,
                    link,
                    ctc_offered: ctc,
                })?;
                if ack.success {
                    println!("Question added!");
                } else {
                    println!("{}", ack.message.unwrap_or_else(|| "Question not added.".to_string()));
                }
            }

            QuestionCommands::Delete { id } => {
                client
                    .delete_question(id)
                    .with_context(|| format!("Error deleting question #{}", id))?;
                println!("Question deleted!");
            }
        },

        Commands::Optimize {
            title,
            description,
            file,
            points,
        } => {
            let resume_points = match (file, points) {
                (Some(path), _) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read points file: {}", path.display()))?,
                (None, Some(p)) => p,
                (None, None) => return Err(anyhow!("Provide resume points with --file or --points")),
            };

            println!("Optimizing...");
            let optimized = client.optimize(&OptimizeRequest {
                resume_points,
                job_title: title,
                job_description: description,
            })?;

            if optimized.is_empty() {
                println!("No suggestions returned.");
            }
            for group in optimized {
                println!("\nOriginal: {}", group.original);
                for suggestion in group.suggestions {
                    println!("  - {}", suggestion);
                }
            }
        }

        Commands::Browse { honor_sort } => {
            let mut options = config.view_options();
            options.honor_sort_by |= honor_sort;
            let jobs = AppliedJobs::new(config.denylist(), options);
            tui::run_browse(&client, jobs)?;
        }
    }

    Ok(())
}

fn run_applied(client: &BackendClient, config: &Config, command: AppliedCommands) -> Result<()> {
    let mut notifier = ConsoleNotifier;
    let mut options = config.view_options();

    match command {
        AppliedCommands::List {
            search,
            status,
            reminder,
            sort_by,
            honor_sort,
            json,
        } => {
            options.honor_sort_by |= honor_sort;
            let mut jobs = AppliedJobs::new(config.denylist(), options);
            jobs.refresh(client, &mut notifier)?;
            jobs.criteria.search = search;
            jobs.criteria.status = status;
            jobs.criteria.reminder = reminder;
            jobs.criteria.sort_by = sort_by;

            if sort_by != SortField::AppliedAt && !options.honor_sort_by {
                tracing::warn!(
                    sort_by = sort_by.label(),
                    "sort field ignored; pass --honor-sort to apply it"
                );
            }

            let visible = jobs.visible_flagged(Utc::now());
            if json {
                let records: Vec<&ApplicationRecord> = visible.iter().map(|(r, _)| r).collect();
                println!("{}", serde_json::to_string_pretty(&records)?);
                return Ok(());
            }

            if visible.is_empty() {
                println!("No applied jobs match your filters.");
                return Ok(());
            }

            println!(
                "{:<6} {:<10} {:<20} {:<26} {:<11} {:<11} {:<3}",
                "ID", "STATUS", "COMPANY", "TITLE", "APPLIED", "FOLLOW UP", "REM"
            );
            println!("{}", "-".repeat(93));
            for (job, soon) in visible {
                let follow_up = job.follow_up_date.as_deref().map(date_only).unwrap_or("-");
                println!(
                    "{:<6} {:<10} {:<20} {:<26} {:<11} {:<11} {:<3}{}",
                    job.id,
                    truncate(job.status.as_str(), 10),
                    truncate(job.company.as_deref().unwrap_or(""), 18),
                    truncate(job.title.as_deref().unwrap_or(""), 24),
                    job.applied_at.as_deref().map(date_only).unwrap_or("-"),
                    if follow_up.is_empty() { "-" } else { follow_up },
                    if job.reminder { "yes" } else { "" },
                    if soon { "  <- follow up soon" } else { "" }
                );
            }
        }

        AppliedCommands::Show { id } => {
            let records = client.list_applied()?;
            let job = records
                .iter()
                .find(|r| r.id == id)
                .ok_or_else(|| anyhow!("Applied job #{} not found", id))?;
            print_application(client, job);
        }

        AppliedCommands::Set { id, field, value } => {
            let update = FieldUpdate::parse(&field, &value)?;
            let mut jobs = AppliedJobs::new(config.denylist(), options);
            jobs.update_field(client, &mut notifier, id, &update)?;
        }

        AppliedCommands::Delete { id } => {
            let mut jobs = AppliedJobs::new(config.denylist(), options);
            jobs.delete(client, &mut notifier, id)?;
        }

        AppliedCommands::Upload { id, file } => {
            let mut jobs = AppliedJobs::new(config.denylist(), options);
            jobs.upload_resume(client, &mut notifier, id, &file)?;
            if let Some(path) = jobs
                .records()
                .iter()
                .find(|r| r.id == id)
                .and_then(|r| r.resume_path.as_deref())
            {
                println!("View: {}", client.resume_url(path));
            }
        }

        AppliedCommands::Add {
            company,
            title,
            link,
            status,
            hr_contact,
            follow_up,
            deadline,
            applied_at,
            notes,
            ctc,
            reminder,
        } => {
            let application = NewApplication {
                company,
                title,
                link,
                status,
                hr_contact,
                follow_up_date: follow_up,
                reminder,
                applied_at,
                deadline,
                notes,
                ctc,
            };
            client.quick_add(&application)?;
            println!("Added {} - {} to the tracker.", application.company, application.title);
        }
    }

    Ok(())
}

fn print_application(client: &BackendClient, job: &ApplicationRecord) {
    println!("Applied job #{}", job.id);
    println!("Company: {}", job.company.as_deref().unwrap_or("-"));
    println!("Title: {}", job.title.as_deref().unwrap_or("-"));
    println!("Status: {}", job.status);
    if let Some(link) = &job.link {
        println!("Link: {}", link);
    }
    if let Some(applied) = job.applied_at.as_deref().filter(|s| !s.is_empty()) {
        println!("Applied On: {}", date_only(applied));
    }
    if let Some(deadline) = job.deadline.as_deref().filter(|s| !s.is_empty()) {
        println!("Last Date to Apply: {}", date_only(deadline));
    }
    if let Some(follow_up) = job.follow_up_date.as_deref().filter(|s| !s.is_empty()) {
        let flag = if is_follow_up_soon(job, Utc::now()) { "  (Upcoming Follow Up!)" } else { "" };
        println!("Follow Up Date: {}{}", date_only(follow_up), flag);
    }
    println!("Reminder: {}", if job.reminder { "on" } else { "off" });
    if let Some(hr) = job.hr_contact.as_deref().filter(|s| !s.is_empty()) {
        println!("HR Contact: {}", hr);
    }
    if let Some(ctc) = job.ctc.as_deref().filter(|s| !s.is_empty()) {
        println!("CTC Offered: {}", ctc);
    }
    if let Some(path) = job.resume_path.as_deref().filter(|s| !s.is_empty()) {
        println!("Resume: {}", client.resume_url(path));
    }
    if let Some(notes) = job.notes.as_deref().filter(|s| !s.is_empty()) {
        println!("\n--- Notes ---\n{}", notes);
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
