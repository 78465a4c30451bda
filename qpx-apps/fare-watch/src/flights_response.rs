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

//! # Flights Response Model
//!
//! Side-effect free decoding of a QPX `trips/search` response.
//!
//! Decoding happens in two steps: serde maps the body onto a typed model in
//! which every top-level key is optional, then [`SearchResponse::into_results`]
//! checks once that the reference tables and trip options are all present.

use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, body_preview};

/// Raw response as returned by the API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub trips: Option<RawTrips>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTrips {
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub data: Option<RawTripsData>,
    #[serde(default)]
    pub trip_option: Option<Vec<TripOption>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTripsData {
    #[serde(default)]
    pub carrier: Option<Vec<CarrierEntry>>,
    #[serde(default)]
    pub airport: Option<Vec<AirportEntry>>,
    #[serde(default)]
    pub city: Option<Vec<CityEntry>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarrierEntry {
    pub code: String,
    pub name: String,
}

/// `city` is a city code, resolved through the city table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AirportEntry {
    pub code: String,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityEntry {
    pub code: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// One candidate itinerary, in API order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripOption {
    pub sale_total: String,
    #[serde(rename = "slice", default)]
    pub slices: Vec<Slice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slice {
    #[serde(rename = "segment", default)]
    pub segments: Vec<Segment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub flight: Flight,
    #[serde(rename = "leg", default)]
    pub legs: Vec<Leg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cabin: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flight {
    pub carrier: String,
    pub number: String,
}

/// Timestamps are kept exactly as the API wrote them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leg {
    pub origin: String,
    pub destination: String,
    pub departure_time: String,
    pub arrival_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
}

/// The three lookup tables shipped alongside the trips.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceTables {
    pub carriers: Vec<CarrierEntry>,
    pub airports: Vec<AirportEntry>,
    pub cities: Vec<CityEntry>,
}

/// A response that passed the structural checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripsResults {
    pub request_id: Option<String>,
    pub tables: ReferenceTables,
    pub trip_options: Vec<TripOption>,
}

impl TripsResults {
    pub fn len(&self) -> usize {
        self.trip_options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trip_options.is_empty()
    }
}

impl SearchResponse {
    pub fn from_json(body: &str) -> Result<Self, DecodeError> {
        serde_json::from_str(body).map_err(|source| DecodeError::Malformed {
            body_preview: body_preview(body),
            source,
        })
    }

    /// Check that every key the renderer needs is present.
    ///
    /// An empty `tripOption` list counts as absent: there is nothing to report.
    pub fn into_results(self) -> Result<TripsResults, DecodeError> {
        let trips = self.trips.ok_or(DecodeError::Missing("trips"))?;
        let data = trips.data.ok_or(DecodeError::Missing("trips.data"))?;
        let carriers = data
            .carrier
            .ok_or(DecodeError::Missing("trips.data.carrier"))?;
        let airports = data
            .airport
            .ok_or(DecodeError::Missing("trips.data.airport"))?;
        let cities = data.city.ok_or(DecodeError::Missing("trips.data.city"))?;
        let trip_options = trips
            .trip_option
            .filter(|options| !options.is_empty())
            .ok_or(DecodeError::Missing("trips.tripOption"))?;

        Ok(TripsResults {
            request_id: trips.request_id,
            tables: ReferenceTables {
                carriers,
                airports,
                cities,
            },
            trip_options,
        })
    }
}

/// Decode and structurally validate a raw response body.
pub fn decode_search_response(body: &str) -> Result<TripsResults, DecodeError> {
    SearchResponse::from_json(body)?.into_results()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "kind": "qpxExpress#tripsSearch",
        "trips": {
            "requestId": "abc123",
            "data": {
                "carrier": [{"code": "AA", "name": "American Airlines"}],
                "airport": [{"code": "ORD", "city": "CHI", "name": "Chicago O'Hare"}],
                "city": [{"code": "CHI", "name": "Chicago", "country": "US"}]
            },
            "tripOption": [{
                "saleTotal": "USD120.00",
                "slice": [{"segment": [{
                    "flight": {"carrier": "AA", "number": "100"},
                    "leg": [{"origin": "ORD", "destination": "ORD",
                             "departureTime": "2017-09-16T06:05-05:00",
                             "arrivalTime": "2017-09-16T08:05-05:00"}]
                }]}]
            }]
        }
    }"#;

    #[test]
    fn test_decode_minimal() {
        let results = decode_search_response(MINIMAL).unwrap();
        assert_eq!(results.request_id.as_deref(), Some("abc123"));
        assert_eq!(results.len(), 1);
        assert_eq!(results.tables.carriers[0].name, "American Airlines");
        assert_eq!(results.tables.airports[0].city, "CHI");
        let leg = &results.trip_options[0].slices[0].segments[0].legs[0];
        assert_eq!(leg.departure_time, "2017-09-16T06:05-05:00");
    }

    #[test]
    fn test_not_json_is_malformed() {
        for body in ["", "<html>Service Unavailable</html>", "[1, 2"] {
            assert!(matches!(
                decode_search_response(body),
                Err(DecodeError::Malformed { .. })
            ));
        }
    }

    #[test]
    fn test_wrong_shape_is_malformed() {
        let body = r#"{"trips": {"tripOption": [{"saleTotal": 12}]}}"#;
        assert!(matches!(
            decode_search_response(body),
            Err(DecodeError::Malformed { .. })
        ));
    }

    #[test]
    fn test_missing_keys_reported_in_order() {
        let cases = [
            (r#"{"kind": "qpxExpress#tripsSearch"}"#, "trips"),
            (r#"{"trips": {"requestId": "x"}}"#, "trips.data"),
            (r#"{"trips": {"data": {"kind": "qpxexpress#data"}}}"#, "trips.data.carrier"),
            (r#"{"trips": {"data": {"carrier": []}}}"#, "trips.data.airport"),
            (r#"{"trips": {"data": {"carrier": [], "airport": []}}}"#, "trips.data.city"),
            (
                r#"{"trips": {"data": {"carrier": [], "airport": [], "city": []}}}"#,
                "trips.tripOption",
            ),
            (
                r#"{"trips": {"data": {"carrier": [], "airport": [], "city": []}, "tripOption": []}}"#,
                "trips.tripOption",
            ),
        ];
        for (body, expected) in cases {
            match decode_search_response(body) {
                Err(DecodeError::Missing(missing)) => assert_eq!(missing, expected, "{body}"),
                other => panic!("{body}: expected Missing({expected}), got {other:?}"),
            }
        }
    }
}
