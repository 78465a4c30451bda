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

//! # Configuration
//!
//! JSON configuration file: API endpoint and key, notification settings and
//! the home directory for saved responses.
//!
//! ```json
//! {
//!   "QPX_URL": "https://www.googleapis.com/qpxExpress/v1/trips/search?key=",
//!   "API_KEY": "...",
//!   "home": "/home/qpx/",
//!   "notification": {
//!     "sender": "QPXsearcher@localhost",
//!     "SMTP_server": "localhost",
//!     "recipients": {"email": ["me@example.com"]}
//!   }
//! }
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use qpx_mail_relay::MailRelay;
use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    pub notification: NotificationConfig,
    pub home: PathBuf,
    #[serde(rename = "QPX_URL")]
    pub qpx_url: String,
    #[serde(rename = "API_KEY")]
    pub api_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NotificationConfig {
    pub sender: String,
    #[serde(rename = "SMTP_server")]
    pub smtp_server: String,
    pub recipients: Recipients,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Recipients {
    pub email: Vec<String>,
}

// Keeps the API key out of logs
impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("notification", &self.notification)
            .field("home", &self.home)
            .field("qpx_url", &self.qpx_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl AppConfig {
    /// Read, parse and validate the file. The handle is closed before parsing.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        tracing::debug!("Loaded configuration from {:?}: {:?}", path, config);
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.qpx_url.trim().is_empty() {
            return invalid("QPX_URL is empty");
        }
        if self.api_key.trim().is_empty() {
            return invalid("API_KEY is empty");
        }
        if self.notification.sender.trim().is_empty() {
            return invalid("notification.sender is empty");
        }
        if self.notification.recipients.email.is_empty() {
            return invalid("notification.recipients.email lists no recipients");
        }
        if self
            .notification
            .recipients
            .email
            .iter()
            .any(|r| r.trim().is_empty())
        {
            return invalid("notification.recipients.email contains an empty address");
        }
        MailRelay::from_server(&self.notification.smtp_server)
            .map_err(|e| ConfigError::Invalid(format!("notification.SMTP_server: {e}")))?;
        Ok(())
    }

    /// Where `--save-response` writes the raw body for a route.
    pub fn response_dump_path(&self, origin: &str, destination: &str) -> PathBuf {
        self.home.join(format!("qpx_{}_{}.json", origin, destination))
    }
}
