use chrono::{DateTime, Local};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::session::Session;
use crate::stats::{session_accuracy, session_aggregate, SessionAggregate};
use crate::store::{Area, Store, StoreError, EMAIL_SETTINGS_KEY};

pub const EMAILJS_BASE_URL: &str = "https://api.emailjs.com";
pub const DASHBOARD_URL: &str = "https://dashboard.emailjs.com/";

/// Everything needed to send a report through EmailJS. The public key is
/// what EmailJS calls the user id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailSettings {
    pub email_from: String,
    pub email_to: String,
    pub emailjs_public_key: String,
    pub emailjs_service_id: String,
    pub emailjs_template_id: String,
}

impl EmailSettings {
    pub fn validate(&self) -> Result<(), EmailError> {
        if self.email_from.trim().is_empty() || self.email_to.trim().is_empty() {
            return Err(EmailError::MissingAddresses);
        }
        if self.emailjs_public_key.trim().is_empty()
            || self.emailjs_service_id.trim().is_empty()
            || self.emailjs_template_id.trim().is_empty()
        {
            return Err(EmailError::MissingCredentials);
        }
        Ok(())
    }
}

pub fn load_settings(store: &Store) -> EmailSettings {
    store.get_or(Area::Sync, EMAIL_SETTINGS_KEY, EmailSettings::default())
}

pub fn save_settings(store: &Store, settings: &EmailSettings) -> Result<(), StoreError> {
    store.set(Area::Sync, EMAIL_SETTINGS_KEY, settings)
}

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("Please fill in both From and To email addresses")]
    MissingAddresses,
    #[error("Please fill in all EmailJS credentials (Public Key, Service ID, and Template ID)")]
    MissingCredentials,
    #[error("No completed typing sessions to send")]
    NoSessions,
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("EmailJS rejected the request: {status}: {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Sends summary reports through the EmailJS REST endpoint.
pub struct Mailer {
    client: Client,
    base_url: String,
}

impl Mailer {
    pub fn new() -> Self {
        Self::with_base_url(EMAILJS_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Validate, render and send a report over the completed sessions.
    /// The caller keeps its sessions; [`Mailer::send_and_clear`] runs the
    /// full flow.
    pub fn send_report(
        &self,
        settings: &EmailSettings,
        sessions: &[Session],
    ) -> Result<(), EmailError> {
        settings.validate()?;
        let completed: Vec<Session> = sessions
            .iter()
            .filter(|s| s.is_complete())
            .cloned()
            .collect();
        if completed.is_empty() {
            return Err(EmailError::NoSessions);
        }

        let url = format!("{}/api/v1.0/email/send", self.base_url);
        let payload = json!({
            "service_id": settings.emailjs_service_id,
            "template_id": settings.emailjs_template_id,
            "user_id": settings.emailjs_public_key,
            "template_params": template_params(settings, &completed),
        });
        info!(sessions = completed.len(), "sending email report");

        let response = self.client.post(&url).json(&payload).send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(EmailError::Rejected { status, body });
        }
        Ok(())
    }

    /// Send the report, then drop the recorded sessions now that they are
    /// summarized. Returns how many sessions the report covered.
    pub fn send_and_clear(
        &self,
        settings: &EmailSettings,
        store: &Store,
    ) -> Result<usize, EmailError> {
        let sessions = store.sessions()?;
        self.send_report(settings, &sessions)?;
        let count = sessions.iter().filter(|s| s.is_complete()).count();
        store.clear_sessions()?;
        info!(count, "report sent; sessions cleared");
        Ok(count)
    }
}

impl Default for Mailer {
    fn default() -> Self {
        Self::new()
    }
}

fn template_params(settings: &EmailSettings, sessions: &[Session]) -> Value {
    let stats = session_aggregate(sessions);
    let details = session_details_html(sessions);
    let date = format_report_date(Local::now());
    json!({
        "to_email": settings.email_to,
        "from_name": "taipu",
        "from_email": settings.email_from,
        "subject": "Typing Practice Summary",
        "message_html": report_html(&stats, &details, &date),
        "total_sessions": stats.total_sessions.to_string(),
        "avg_score": format!("{:.1}", stats.avg_score),
        "avg_time": format!("{:.1}", stats.avg_time),
        "avg_accuracy": format!("{:.1}", stats.avg_accuracy),
        "session_details": details,
        "date": date,
    })
}

fn report_html(stats: &SessionAggregate, details: &str, date: &str) -> String {
    let mut html = String::new();
    html.push_str(r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">"#);
    html.push_str(r#"<h2 style="color: #333;">Typing Practice Summary</h2>"#);
    html.push_str(r#"<div style="background-color: #f5f5f5; padding: 15px; border-radius: 5px; margin-bottom: 20px;">"#);
    html.push_str(r#"<h3 style="margin-top: 0;">Overall Statistics</h3>"#);
    html.push_str(&format!(
        "<p><strong>Total Sessions:</strong> {}</p>",
        stats.total_sessions
    ));
    html.push_str(&format!(
        "<p><strong>Average Score:</strong> {:.1}</p>",
        stats.avg_score
    ));
    html.push_str(&format!(
        "<p><strong>Average Time:</strong> {:.1}s</p>",
        stats.avg_time
    ));
    html.push_str(&format!(
        "<p><strong>Average Accuracy:</strong> {:.1}%</p>",
        stats.avg_accuracy
    ));
    html.push_str("</div>");
    html.push_str("<h3>Session Details</h3>");
    html.push_str(details);
    html.push_str(r#"<p style="color: #666; font-size: 12px; margin-top: 20px;">"#);
    html.push_str("This email was sent by taipu.<br>");
    html.push_str(&format!("Sent on: {date}"));
    html.push_str("</p></div>");
    html
}

fn session_details_html(sessions: &[Session]) -> String {
    let mut html = String::new();
    html.push_str(r#"<table style="width: 100%; border-collapse: collapse; margin-top: 10px;">"#);
    html.push_str(r#"<thead><tr style="background-color: #4CAF50; color: white;">"#);
    for heading in ["Date", "Score", "Time (s)", "Keystrokes", "Mistakes", "Accuracy"] {
        html.push_str(&format!(
            r#"<th style="padding: 8px; text-align: left; border: 1px solid #ddd;">{heading}</th>"#
        ));
    }
    html.push_str("</tr></thead><tbody>");

    let mut row = 0;
    for session in sessions {
        let result = match session.result {
            Some(result) => result,
            None => continue,
        };
        let row_style = if row % 2 == 1 {
            r#" style="background-color: #f9f9f9;""#
        } else {
            ""
        };
        row += 1;

        html.push_str(&format!("<tr{row_style}>"));
        push_cell(
            &mut html,
            &format_row_date(session.start_time.with_timezone(&Local)),
        );
        push_cell(&mut html, &result.score.to_string());
        push_cell(&mut html, &format!("{:.1}", result.time));
        push_cell(&mut html, &result.total_keystrokes.to_string());
        push_cell(&mut html, &result.mistakes.to_string());
        push_cell(&mut html, &format!("{:.1}%", session_accuracy(&result)));
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
    html
}

fn push_cell(html: &mut String, value: &str) {
    html.push_str(&format!(
        r#"<td style="padding: 8px; border: 1px solid #ddd;">{value}</td>"#
    ));
}

fn format_report_date(at: DateTime<Local>) -> String {
    at.format("%B %-d, %Y, %I:%M %p").to_string()
}

fn format_row_date(at: DateTime<Local>) -> String {
    at.format("%b %-d, %I:%M %p").to_string()
}
