//!  QPX Fare Watch
//!
//!  Copyright (C) 2026  Mamy Ratsimbazafy
//!
//!  This program is free software: you can redistribute it and/or modify
//!  it under the terms of the GNU Affero General Public License as published by
//!  the Free Software Foundation, either version 3 of the License, or
//!  (at your option) any later version.
//!
//!  This program is distributed in the hope that it will be useful,
//!  but WITHOUT ANY WARRANTY; without even the implied warranty of
//!  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//!  GNU Affero General Public License for more details.
//!
//!  You should have received a copy of the GNU Affero General Public License
//!  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! # Notifiers
//!
//! Effectful delivery of the rendered report.

use std::future::Future;
use std::io::Write;

use qpx_mail_relay::{MailMessage, MailRelay};

use crate::config::NotificationConfig;
use crate::error::{ConfigError, NotificationError};

/// Subject and plain-text body of one search report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub body: String,
}

pub trait Notifier {
    fn notify(
        &self,
        notification: &Notification,
    ) -> impl Future<Output = Result<(), NotificationError>> + Send;
}

/// Mails the report to every configured recipient through an SMTP relay.
#[derive(Debug, Clone)]
pub struct EmailNotifier {
    relay: MailRelay,
    sender: String,
    recipients: Vec<String>,
}

impl EmailNotifier {
    pub fn new(relay: MailRelay, sender: impl Into<String>, recipients: Vec<String>) -> Self {
        Self {
            relay,
            sender: sender.into(),
            recipients,
        }
    }

    pub fn from_config(config: &NotificationConfig) -> Result<Self, ConfigError> {
        let relay = MailRelay::from_server(&config.smtp_server)
            .map_err(|e| ConfigError::Invalid(format!("notification.SMTP_server: {e}")))?;
        Ok(Self::new(
            relay,
            config.sender.clone(),
            config.recipients.email.clone(),
        ))
    }
}

impl Notifier for EmailNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotificationError> {
        let message = MailMessage::new(
            self.sender.clone(),
            self.recipients.clone(),
            notification.subject.clone(),
            notification.body.clone(),
        );
        let message_id = self.relay.send(&message).await?;
        tracing::info!(
            "📧 Notification {} sent to {} recipient(s) via {}",
            message_id,
            self.recipients.len(),
            self.relay.address()
        );
        Ok(())
    }
}

/// Prints the report instead of mailing it.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutNotifier;

impl Notifier for StdoutNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotificationError> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "Subject: {}\n", notification.subject)
            .and_then(|_| out.write_all(notification.body.as_bytes()))
            .and_then(|_| out.flush())
            .map_err(NotificationError::Stdout)
    }
}
