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

//! # Itinerary Renderer
//!
//! Side-effect free rendering of coded trip options into report lines.
//!
//! Each segment gets a header line (flight number, carrier name and code) and
//! each leg gets its origin and destination cities plus timestamps. Every trip
//! option ends with its sale total and a separator. The price and the subject
//! cities of the *last* trip option rendered are kept as the representative
//! values for the notification subject.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::MissingReferenceError;
use crate::flights_response::{Segment, TripOption};
use crate::reference_index::{ReferenceIndex, ReferenceTable};

pub const SEGMENT_SEPARATOR: &str = "------------------";
pub const TRIP_SEPARATOR: &str = "__________________________________________";
pub const UNKNOWN_PLACEHOLDER: &str = "Unknown";

/// What to print when a trip code is absent from its reference table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingReferencePolicy {
    /// Abort the whole render.
    #[default]
    Fail,
    /// Print [`UNKNOWN_PLACEHOLDER`].
    Placeholder,
    /// Reuse the value last resolved for the same field in this render,
    /// failing if there is none yet.
    CarryForward,
}

impl FromStr for MissingReferencePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fail" => Ok(Self::Fail),
            "placeholder" | "unknown" => Ok(Self::Placeholder),
            "carry-forward" | "carry_forward" | "carry" => Ok(Self::CarryForward),
            _ => Err(format!(
                "Invalid missing reference policy: {}. Use: fail, placeholder, carry-forward",
                s
            )),
        }
    }
}

impl fmt::Display for MissingReferencePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fail => write!(f, "fail"),
            Self::Placeholder => write!(f, "placeholder"),
            Self::CarryForward => write!(f, "carry-forward"),
        }
    }
}

/// The caller's requested endpoints, used only for the notification subject.
#[derive(Debug, Clone, Copy)]
pub struct SubjectCodes<'s> {
    pub origin: &'s str,
    pub destination: &'s str,
}

/// Values of the last trip option, handed to the notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Representative {
    pub sale_total: String,
    pub origin_city: String,
    pub destination_city: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Report {
    pub lines: Vec<String>,
    pub trip_count: usize,
    pub representative: Option<Representative>,
    /// Placeholder or carried-forward values used.
    pub substitutions: usize,
}

impl Report {
    pub fn body(&self) -> String {
        let mut body = self.lines.join("\n");
        if !body.is_empty() {
            body.push('\n');
        }
        body
    }

    pub fn subject(&self, round_trip: bool) -> Option<String> {
        let r = self.representative.as_ref()?;
        let subject = if round_trip {
            format!(
                "Flights found: {} to {}, {} to {} for {} or less.",
                r.origin_city, r.destination_city, r.destination_city, r.origin_city, r.sale_total
            )
        } else {
            format!(
                "Flights found: {} to {} for {} or less.",
                r.origin_city, r.destination_city, r.sale_total
            )
        };
        Some(subject)
    }
}

/// Fields whose last resolved value is remembered for carry-forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Slot {
    Carrier,
    LegOrigin,
    LegDestination,
    SubjectOrigin,
    SubjectDestination,
}

/// Lookup state scoped to a single render.
struct RenderContext<'i, 'a> {
    index: &'i ReferenceIndex<'a>,
    policy: MissingReferencePolicy,
    previous: HashMap<Slot, &'a str>,
    substitutions: usize,
}

impl<'i, 'a> RenderContext<'i, 'a> {
    fn new(index: &'i ReferenceIndex<'a>, policy: MissingReferencePolicy) -> Self {
        Self {
            index,
            policy,
            previous: HashMap::new(),
            substitutions: 0,
        }
    }

    fn settle(
        &mut self,
        slot: Slot,
        lookup: Result<&'a str, MissingReferenceError>,
    ) -> Result<&'a str, MissingReferenceError> {
        let missing = match lookup {
            Ok(value) => {
                self.previous.insert(slot, value);
                return Ok(value);
            }
            Err(missing) => missing,
        };

        match self.policy {
            MissingReferencePolicy::Fail => Err(missing),
            MissingReferencePolicy::Placeholder => {
                tracing::warn!("{}, printing {:?}", missing, UNKNOWN_PLACEHOLDER);
                self.substitutions += 1;
                Ok(UNKNOWN_PLACEHOLDER)
            }
            MissingReferencePolicy::CarryForward => match self.previous.get(&slot) {
                Some(&previous) => {
                    tracing::warn!("{}, reusing previous value {:?}", missing, previous);
                    self.substitutions += 1;
                    Ok(previous)
                }
                None => Err(missing),
            },
        }
    }

    fn carrier(&mut self, code: &str) -> Result<&'a str, MissingReferenceError> {
        let lookup = self.index.carrier(code);
        self.settle(Slot::Carrier, lookup)
    }

    fn leg_city(
        &mut self,
        slot: Slot,
        airport_code: &str,
    ) -> Result<&'a str, MissingReferenceError> {
        let lookup = self.index.city_of_airport_code(airport_code);
        self.settle(slot, lookup)
    }

    /// Requested endpoints are typed by the user: matched case-insensitively
    /// against the upper-case IATA tables, and may be metropolitan city codes
    /// (e.g. `CHI`) rather than airports, so a code absent from the airport
    /// table is tried as a city code before giving up.
    fn subject_city(&mut self, slot: Slot, code: &str) -> Result<&'a str, MissingReferenceError> {
        let code = code.trim().to_ascii_uppercase();
        let lookup = match self.index.city_of_airport_code(&code) {
            Err(MissingReferenceError {
                table: ReferenceTable::Airport,
                code: missing_code,
            }) => self.index.city_name(&code).ok_or(MissingReferenceError {
                table: ReferenceTable::Airport,
                code: missing_code,
            }),
            resolved => resolved,
        };
        self.settle(slot, lookup)
    }

    fn render_segment(
        &mut self,
        segment: &Segment,
        lines: &mut Vec<String>,
    ) -> Result<(), MissingReferenceError> {
        let carrier_code = &segment.flight.carrier;
        let carrier_name = self.carrier(carrier_code)?;

        lines.push(SEGMENT_SEPARATOR.to_string());
        lines.push(format!(
            "Flight number: {} Carrier: {} ({})",
            segment.flight.number, carrier_name, carrier_code
        ));

        for leg in &segment.legs {
            let origin_city = self.leg_city(Slot::LegOrigin, &leg.origin)?;
            let destination_city = self.leg_city(Slot::LegDestination, &leg.destination)?;
            lines.push(format!(
                "Origin: {} ({}) -> Destination: {} ({})",
                origin_city, leg.origin, destination_city, leg.destination
            ));
            lines.push(format!("Departure time: {}", leg.departure_time));
            lines.push(format!("Arrival time: {}", leg.arrival_time));
        }
        Ok(())
    }
}

/// Render all trip options in API order.
pub fn render_itineraries(
    trip_options: &[TripOption],
    index: &ReferenceIndex<'_>,
    subject: SubjectCodes<'_>,
    policy: MissingReferencePolicy,
) -> Result<Report, MissingReferenceError> {
    let mut ctx = RenderContext::new(index, policy);
    let mut lines = Vec::new();
    let mut representative = None;

    for trip in trip_options {
        for slice in &trip.slices {
            for segment in &slice.segments {
                ctx.render_segment(segment, &mut lines)?;
            }
        }

        let origin_city = ctx.subject_city(Slot::SubjectOrigin, subject.origin)?;
        let destination_city = ctx.subject_city(Slot::SubjectDestination, subject.destination)?;

        lines.push(format!("Total price: {}", trip.sale_total));
        lines.push(TRIP_SEPARATOR.to_string());

        representative = Some(Representative {
            sale_total: trip.sale_total.clone(),
            origin_city: origin_city.to_string(),
            destination_city: destination_city.to_string(),
        });
    }

    tracing::debug!(
        "Rendered {} trip options into {} lines ({} substitutions, policy {})",
        trip_options.len(),
        lines.len(),
        ctx.substitutions,
        policy
    );

    Ok(Report {
        lines,
        trip_count: trip_options.len(),
        representative,
        substitutions: ctx.substitutions,
    })
}
