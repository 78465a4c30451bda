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

//! Integration tests for itinerary rendering over recorded QPX responses.
//!
//! Fixtures live in tests/fixtures-qpx-responses/ and cover a round trip with
//! connections, a one-way search with a multi-leg segment, a response without
//! results and a response referencing a carrier it does not define.
//!
//! Run with:
//!     cargo test --test t_rendering_fixtures


use qpx_fare_watch::{
    DecodeError, MissingReferenceError, MissingReferencePolicy, ReferenceIndex, ReferenceTable,
    Report, SubjectCodes, TRIP_SEPARATOR, TripsResults, UNKNOWN_PLACEHOLDER,
    decode_search_response, render_itineraries,
};

struct FixtureTestCase {
    /// Filename in tests/fixtures-qpx-responses/
    name: &'static str,
    origin: &'static str,
    destination: &'static str,
    round_trip: bool,
    trip_count: usize,
    line_count: usize,
    subject: &'static str,
}

const FIXTURE_TESTS: &[FixtureTestCase] = &[
    FixtureTestCase {
        name: "round_trip_gdl_cuu.json",
        origin: "GDL",
        destination: "CUU",
        round_trip: true,
        trip_count: 2,
        line_count: 34,
        subject: "Flights found: Guadalajara to Chihuahua, Chihuahua to Guadalajara for USD412.60 or less.",
    },
    FixtureTestCase {
        name: "one_way_gdl_bos.json",
        origin: "GDL",
        destination: "BOS",
        round_trip: false,
        trip_count: 3,
        line_count: 34,
        subject: "Flights found: Guadalajara to Boston for USD342.00 or less.",
    },
];

fn decode(name: &str) -> TripsResults {
    decode_search_response(&qpx_helpers::load_fixture(name))
        .unwrap_or_else(|e| panic!("{} should decode: {}", name, e))
}

fn render(
    results: &TripsResults,
    origin: &str,
    destination: &str,
    policy: MissingReferencePolicy,
) -> Result<Report, MissingReferenceError> {
    let index = ReferenceIndex::build(&results.tables);
    render_itineraries(
        &results.trip_options,
        &index,
        SubjectCodes {
            origin,
            destination,
        },
        policy,
    )
}

#[test]
fn test_all_fixtures() {
    for case in FIXTURE_TESTS {
        let results = decode(case.name);
        let report = render(
            &results,
            case.origin,
            case.destination,
            MissingReferencePolicy::Fail,
        )
        .unwrap_or_else(|e| panic!("{} should render: {}", case.name, e));

        assert_eq!(report.trip_count, case.trip_count, "{}", case.name);
        assert_eq!(report.lines.len(), case.line_count, "{}", case.name);
        assert_eq!(report.substitutions, 0, "{}", case.name);

        let totals = report
            .lines
            .iter()
            .filter(|l| l.starts_with("Total price: "))
            .count();
        let separators = report.lines.iter().filter(|l| *l == TRIP_SEPARATOR).count();
        assert_eq!(totals, case.trip_count, "{}", case.name);
        assert_eq!(separators, case.trip_count, "{}", case.name);
        assert_eq!(report.lines.last().map(String::as_str), Some(TRIP_SEPARATOR));

        assert_eq!(
            report.subject(case.round_trip).as_deref(),
            Some(case.subject),
            "{}",
            case.name
        );
        println!("{}: {} trips, {} lines - OK", case.name, report.trip_count, report.lines.len());
    }
}

/// Segments render before their trip's total, in API order.
#[test]
fn test_round_trip_layout() {
    let results = decode("round_trip_gdl_cuu.json");
    let report = render(&results, "GDL", "CUU", MissingReferencePolicy::Fail).unwrap();

    let expected_first_trip = [
        "------------------",
        "Flight number: 1030 Carrier: Volaris (Y4)",
        "Origin: Guadalajara (GDL) -> Destination: Chihuahua (CUU)",
        "Departure time: 2026-11-15T07:10-06:00",
        "Arrival time: 2026-11-15T08:15-07:00",
        "------------------",
        "Flight number: 1031 Carrier: Volaris (Y4)",
        "Origin: Chihuahua (CUU) -> Destination: Guadalajara (GDL)",
        "Departure time: 2026-12-15T09:00-07:00",
        "Arrival time: 2026-12-15T12:00-06:00",
        "Total price: USD389.10",
        TRIP_SEPARATOR,
    ];
    assert_eq!(&report.lines[..expected_first_trip.len()], &expected_first_trip[..]);
    assert!(
        report
            .lines
            .contains(&"Origin: Guadalajara (GDL) -> Destination: Mexico City (MEX)".to_string())
    );
    assert!(report.body().ends_with(&format!("{}\n", TRIP_SEPARATOR)));
}

/// The last trip option is reported, even when an earlier one is cheaper.
#[test]
fn test_representative_is_last_trip_option() {
    let results = decode("round_trip_gdl_cuu.json");
    let report = render(&results, "GDL", "CUU", MissingReferencePolicy::Fail).unwrap();

    let representative = report.representative.expect("non-empty render has a representative");
    assert_eq!(representative.sale_total, "USD412.60");
    assert_eq!(representative.origin_city, "Guadalajara");
    assert_eq!(representative.destination_city, "Chihuahua");
}

/// One segment may hold several legs, each with its own three lines.
#[test]
fn test_multi_leg_segment() {
    let results = decode("one_way_gdl_bos.json");
    let report = render(&results, "GDL", "BOS", MissingReferencePolicy::Fail).unwrap();

    let start = report
        .lines
        .iter()
        .position(|l| l == "Flight number: 1500 Carrier: United Airlines (UA)")
        .expect("UA 1500 should be rendered");
    assert_eq!(
        report.lines[start + 1],
        "Origin: Guadalajara (GDL) -> Destination: Chicago (ORD)"
    );
    assert_eq!(report.lines[start + 4], "Origin: Chicago (ORD) -> Destination: Boston (BOS)");
    assert_eq!(report.lines[start + 7], "Total price: USD287.90");
    assert!(
        report
            .lines
            .contains(&"Flight number: 1234 Carrier: American Airlines (AA)".to_string())
    );
}

/// Rendering the same response twice gives the same report.
#[test]
fn test_render_is_repeatable() {
    let results = decode("one_way_gdl_bos.json");
    let first = render(&results, "GDL", "BOS", MissingReferencePolicy::Fail).unwrap();
    let second = render(&results, "GDL", "BOS", MissingReferencePolicy::Fail).unwrap();
    assert_eq!(first, second);
}

/// A requested metropolitan city code resolves through the city table.
#[test]
fn test_subject_accepts_city_code() {
    let results = decode("one_way_gdl_bos.json");
    let report = render(&results, "GDL", "CHI", MissingReferencePolicy::Fail).unwrap();
    assert_eq!(
        report.subject(false).as_deref(),
        Some("Flights found: Guadalajara to Chicago for USD342.00 or less.")
    );
}

#[test]
fn test_no_results_fixture() {
    let body = qpx_helpers::load_fixture("no_results.json");
    let err = decode_search_response(&body).expect_err("no trip options to report");
    assert!(matches!(err, DecodeError::Missing("trips.data.carrier")), "{err:?}");
}

#[test]
fn test_unknown_carrier_fails_by_default() {
    let results = decode("unknown_carrier.json");
    let err = render(&results, "GDL", "TIJ", MissingReferencePolicy::Fail).unwrap_err();
    assert_eq!(
        err,
        MissingReferenceError {
            table: ReferenceTable::Carrier,
            code: "4O".to_string(),
        }
    );
    assert_eq!(err.to_string(), "no carrier entry for code \"4O\"");
}

#[test]
fn test_unknown_carrier_placeholder() {
    let results = decode("unknown_carrier.json");
    let report = render(&results, "GDL", "TIJ", MissingReferencePolicy::Placeholder).unwrap();
    assert_eq!(report.substitutions, 1);
    assert!(report.lines.contains(&format!(
        "Flight number: 5210 Carrier: {} (4O)",
        UNKNOWN_PLACEHOLDER
    )));
    assert_eq!(
        report.subject(false).as_deref(),
        Some("Flights found: Guadalajara to Tijuana for MXN2380.00 or less.")
    );
}

#[test]
fn test_unknown_carrier_carry_forward() {
    let results = decode("unknown_carrier.json");
    let report = render(&results, "GDL", "TIJ", MissingReferencePolicy::CarryForward).unwrap();
    assert_eq!(report.substitutions, 1);
    assert!(
        report
            .lines
            .contains(&"Flight number: 5210 Carrier: Volaris (4O)".to_string())
    );
}

/// Carry-forward has nothing to reuse when the very first lookup misses.
#[test]
fn test_carry_forward_without_prior_value() {
    let mut results = decode("unknown_carrier.json");
    results.tables.carriers.clear();
    let err = render(&results, "GDL", "TIJ", MissingReferencePolicy::CarryForward).unwrap_err();
    assert_eq!(err.table, ReferenceTable::Carrier);
    assert_eq!(err.code, "Y4");
}
