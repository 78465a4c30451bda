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

//! # Flights Query Builder
//!
//! Side-effect free construction of the QPX `trips/search` request.
//! The only clock access is [`SearchRequestBuilder::build`], which reads the
//! local calendar date and defers to [`SearchRequestBuilder::build_relative_to`].

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::RequestBuildError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse an explicit `YYYY-MM-DD` date, rejecting impossible calendar days.
///
/// Only the zero-padded form is accepted: chrono alone would also take
/// `2017-9-16` or surrounding whitespace.
pub fn parse_date(input: &str) -> Result<NaiveDate, RequestBuildError> {
    let invalid = |source| RequestBuildError::InvalidDate {
        input: input.to_string(),
        source,
    };

    let padded = input.len() == 10
        && input.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !padded {
        return Err(invalid(None));
    }
    NaiveDate::parse_from_str(input, DATE_FORMAT).map_err(|e| invalid(Some(e)))
}

fn add_days(base: NaiveDate, days: u32) -> Result<NaiveDate, RequestBuildError> {
    base.checked_add_days(Days::new(u64::from(days)))
        .ok_or(RequestBuildError::DateOutOfRange { base, days })
}

/// A fully resolved search: concrete dates, one or two directions.
///
/// `return_date` is set iff a round trip was requested, and is never before
/// `departure_date`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub adult_count: u32,
    pub max_price: String,
    pub solutions: u32,
}

impl SearchRequest {
    pub fn builder(
        origin: impl Into<String>,
        destination: impl Into<String>,
        max_price: impl Into<String>,
    ) -> SearchRequestBuilder {
        SearchRequestBuilder {
            origin: origin.into(),
            destination: destination.into(),
            max_price: max_price.into(),
            date: None,
            delay_days: 0,
            duration_days: None,
            adult_count: 1,
            solutions: 3,
        }
    }

    pub fn is_round_trip(&self) -> bool {
        self.return_date.is_some()
    }

    /// Outbound slice first, then the reversed return slice for round trips.
    pub fn slices(&self) -> Vec<SliceInput> {
        let outbound = SliceInput {
            origin: self.origin.clone(),
            destination: self.destination.clone(),
            date: self.departure_date,
        };

        match self.return_date {
            Some(return_date) => {
                let inbound = SliceInput {
                    origin: self.destination.clone(),
                    destination: self.origin.clone(),
                    date: return_date,
                };
                vec![outbound, inbound]
            }
            None => vec![outbound],
        }
    }

    pub fn payload(&self) -> SearchPayload {
        SearchPayload {
            request: TripsSearchRequest {
                passengers: PassengerCounts {
                    adult_count: self.adult_count,
                },
                slice: self.slices(),
                max_price: self.max_price.clone(),
                solutions: self.solutions,
            },
        }
    }
}

/// Body of a `trips/search` POST.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPayload {
    pub request: TripsSearchRequest,
}

impl SearchPayload {
    /// Compact JSON, used both on the wire and in diagnostics.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| format!("<unserializable payload: {e}>"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripsSearchRequest {
    pub passengers: PassengerCounts,
    pub slice: Vec<SliceInput>,
    pub max_price: String,
    pub solutions: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassengerCounts {
    pub adult_count: u32,
}

/// One requested direction. `date` serializes as `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceInput {
    pub origin: String,
    pub destination: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct SearchRequestBuilder {
    origin: String,
    destination: String,
    max_price: String,
    date: Option<String>,
    delay_days: u32,
    duration_days: Option<u32>,
    adult_count: u32,
    solutions: u32,
}

impl SearchRequestBuilder {
    /// Explicit departure date. Takes precedence over [`Self::delay_days`].
    pub fn date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// Depart this many days after today when no explicit date is given.
    pub fn delay_days(mut self, delay_days: u32) -> Self {
        self.delay_days = delay_days;
        self
    }

    /// Stay length for a round trip; `None` searches one-way.
    pub fn duration_days(mut self, duration_days: Option<u32>) -> Self {
        self.duration_days = duration_days;
        self
    }

    pub fn adults(mut self, adult_count: u32) -> Self {
        self.adult_count = adult_count;
        self
    }

    pub fn solutions(mut self, solutions: u32) -> Self {
        self.solutions = solutions;
        self
    }

    pub fn build(self) -> Result<SearchRequest, RequestBuildError> {
        let today = chrono::Local::now().date_naive();
        self.build_relative_to(today)
    }

    pub fn build_relative_to(self, today: NaiveDate) -> Result<SearchRequest, RequestBuildError> {
        let departure_date = match &self.date {
            Some(date) => {
                if self.delay_days != 0 {
                    tracing::debug!(
                        "Explicit date {} given, ignoring delay of {} days",
                        date,
                        self.delay_days
                    );
                }
                parse_date(date)?
            }
            None => add_days(today, self.delay_days)?,
        };

        let return_date = self
            .duration_days
            .map(|days| add_days(departure_date, days))
            .transpose()?;

        Ok(SearchRequest {
            origin: self.origin,
            destination: self.destination,
            departure_date,
            return_date,
            adult_count: self.adult_count,
            max_price: self.max_price,
            solutions: self.solutions,
        })
    }
}
