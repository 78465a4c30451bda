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

//! # Error taxonomy
//!
//! One error type per pipeline stage, gathered under [`QpxError`] which maps
//! every failure to the process exit code.

use std::path::PathBuf;

use chrono::NaiveDate;
use qpx_mail_relay::MailRelayError;
use thiserror::Error;

use crate::reference_index::ReferenceTable;

/// How much of an offending body is quoted in error messages.
pub(crate) const BODY_PREVIEW_CHARS: usize = 500;

pub(crate) fn body_preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read configuration file {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed configuration file {path:?}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum RequestBuildError {
    #[error("invalid date {input:?}, expected a calendar date as YYYY-MM-DD")]
    InvalidDate {
        input: String,
        /// Absent when the input is not zero-padded `YYYY-MM-DD` text.
        #[source]
        source: Option<chrono::ParseError>,
    },
    #[error("date out of range: {base} + {days} days")]
    DateOutOfRange { base: NaiveDate, days: u32 },
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to build HTTP client")]
    Client(#[source] wreq::Error),
    #[error("search request to {endpoint} failed")]
    Send {
        endpoint: String,
        #[source]
        source: wreq::Error,
    },
    #[error("failed to read response body")]
    Body(#[source] wreq::Error),
    #[error("HTTP error {status}: {body_preview}")]
    Status { status: u16, body_preview: String },
}

/// A trip references a code its reference table does not define.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no {table} entry for code {code:?}")]
pub struct MissingReferenceError {
    pub table: ReferenceTable,
    pub code: String,
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("failed to relay notification email")]
    Relay(#[from] MailRelayError),
    #[error("failed to write report to stdout")]
    Stdout(#[source] std::io::Error),
}

/// Response decoding failures, before the request payload is attached.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("response body is not a QPX search result (body: {body_preview})")]
    Malformed {
        body_preview: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("response lacks `{0}`")]
    Missing(&'static str),
}

#[derive(Debug, Error)]
pub enum QpxError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("cannot build search request")]
    RequestBuild(#[from] RequestBuildError),
    #[error("search call failed")]
    Transport(#[from] TransportError),
    #[error("empty or unparseable result set for payload {payload}")]
    EmptyResponse {
        payload: String,
        #[source]
        source: DecodeError,
    },
    #[error("no results found for payload {payload}: response lacks `{missing}`")]
    NoResults { payload: String, missing: String },
    #[error("cannot render itineraries")]
    MissingReference(#[from] MissingReferenceError),
    #[error("cannot save raw response to {path:?}")]
    SaveResponse {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("notification failed")]
    Notification(#[from] NotificationError),
}

impl QpxError {
    /// Attach the request payload to a decoding failure.
    pub fn from_decode(err: DecodeError, payload: &str) -> Self {
        match err {
            DecodeError::Missing(missing) => QpxError::NoResults {
                payload: payload.to_string(),
                missing: missing.to_string(),
            },
            malformed @ DecodeError::Malformed { .. } => QpxError::EmptyResponse {
                payload: payload.to_string(),
                source: malformed,
            },
        }
    }

    /// Process exit code: 2 for unparseable bodies, 3 for absent results or
    /// references, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        match self {
            QpxError::EmptyResponse { .. } => 2,
            QpxError::NoResults { .. } | QpxError::MissingReference(_) => 3,
            QpxError::Config(_)
            | QpxError::RequestBuild(_)
            | QpxError::Transport(_)
            | QpxError::SaveResponse { .. }
            | QpxError::Notification(_) => 1,
        }
    }
}
