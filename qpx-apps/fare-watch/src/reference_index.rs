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

//! # Reference Index
//!
//! Hash lookups over the carrier, airport and city tables of one response.

use std::collections::HashMap;
use std::fmt;

use crate::error::MissingReferenceError;
use crate::flights_response::ReferenceTables;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceTable {
    Carrier,
    Airport,
    City,
}

impl fmt::Display for ReferenceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceTable::Carrier => write!(f, "carrier"),
            ReferenceTable::Airport => write!(f, "airport"),
            ReferenceTable::City => write!(f, "city"),
        }
    }
}

/// Borrowed view over [`ReferenceTables`].
///
/// When a table lists the same code twice, the later entry wins.
#[derive(Debug, Clone, Default)]
pub struct ReferenceIndex<'a> {
    carrier_names: HashMap<&'a str, &'a str>,
    airport_cities: HashMap<&'a str, &'a str>,
    city_names: HashMap<&'a str, &'a str>,
}

impl<'a> ReferenceIndex<'a> {
    pub fn build(tables: &'a ReferenceTables) -> Self {
        let carrier_names: HashMap<_, _> = tables
            .carriers
            .iter()
            .map(|c| (c.code.as_str(), c.name.as_str()))
            .collect();
        let airport_cities: HashMap<_, _> = tables
            .airports
            .iter()
            .map(|a| (a.code.as_str(), a.city.as_str()))
            .collect();
        let city_names: HashMap<_, _> = tables
            .cities
            .iter()
            .map(|c| (c.code.as_str(), c.name.as_str()))
            .collect();

        tracing::debug!(
            "Reference index: {} carriers, {} airports, {} cities",
            carrier_names.len(),
            airport_cities.len(),
            city_names.len()
        );

        Self {
            carrier_names,
            airport_cities,
            city_names,
        }
    }

    pub fn carrier_name(&self, code: &str) -> Option<&'a str> {
        self.carrier_names.get(code).copied()
    }

    pub fn city_code_of_airport(&self, airport_code: &str) -> Option<&'a str> {
        self.airport_cities.get(airport_code).copied()
    }

    pub fn city_name(&self, city_code: &str) -> Option<&'a str> {
        self.city_names.get(city_code).copied()
    }

    /// Airport code → city code → city name.
    ///
    /// The error names whichever hop had no entry.
    pub fn city_of_airport_code(
        &self,
        airport_code: &str,
    ) -> Result<&'a str, MissingReferenceError> {
        let city_code = self
            .city_code_of_airport(airport_code)
            .ok_or_else(|| MissingReferenceError {
                table: ReferenceTable::Airport,
                code: airport_code.to_string(),
            })?;
        self.city_name(city_code).ok_or_else(|| MissingReferenceError {
            table: ReferenceTable::City,
            code: city_code.to_string(),
        })
    }

    pub fn carrier(&self, code: &str) -> Result<&'a str, MissingReferenceError> {
        self.carrier_name(code).ok_or_else(|| MissingReferenceError {
            table: ReferenceTable::Carrier,
            code: code.to_string(),
        })
    }
}
