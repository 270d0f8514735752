//! Notification payloads produced by task transitions.
//!
//! The engine never sends mail. It builds a [`Notification`] for each message
//! that should go out and hands it to the store, whose outbox is drained by
//! whatever mail collaborator the host application wires in.

use chrono::{DateTime, Utc};
use common::config::Config;
use serde::{Deserialize, Serialize};

use crate::models::{Test, User};

/// Sender name and link base used when building notification bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationSettings {
    pub from_name: String,
    pub frontend_url: String,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Config::default().into()
    }
}

impl From<&Config> for NotificationSettings {
    fn from(config: &Config) -> Self {
        Self {
            from_name: config.email_from_name.clone(),
            frontend_url: config.frontend_url.trim_end_matches('/').to_string(),
        }
    }
}

impl From<Config> for NotificationSettings {
    fn from(config: Config) -> Self {
        Self::from(&config)
    }
}

/// A plain-text message addressed to one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub recipient: String,
    pub recipient_name: String,
    pub subject: String,
    pub body: String,
}

impl Notification {
    /// Tells a newly assigned corrector that marks are waiting to be entered.
    pub fn corrector_assigned(
        settings: &NotificationSettings,
        corrector: &User,
        test: &Test,
        due_date: Option<DateTime<Utc>>,
    ) -> Self {
        let link = format!("{}/tests/{}/tasks", settings.frontend_url, test.id);
        let due = match due_date {
            Some(due) => format!("Please enter the marks by {}.\n\n", due.format("%Y-%m-%d %H:%M UTC")),
            None => String::new(),
        };

        Self {
            recipient: corrector.email.clone(),
            recipient_name: corrector.name.clone(),
            subject: format!("Marking assigned: {}", test.name),
            body: format!(
                "Hello {},\n\n\
                You have been assigned as corrector for \"{}\". Open your tasks here:\n\n\
                {}\n\n\
                {}\
                Best regards,\n\
                {}",
                corrector.name, test.name, link, due, settings.from_name
            ),
        }
    }
}
