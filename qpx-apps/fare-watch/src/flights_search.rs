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

//! # QPX Flights Search Client
//!
//! Effectful (network, filesystem) operations: the `trips/search` POST and
//! the pipeline that turns one request into one notification.
//!
//! No timeout, no retry: a failed or stalled call fails the whole run.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crate::error::{QpxError, TransportError, body_preview};
use crate::flights_query_builder::{SearchPayload, SearchRequest};
use crate::flights_response::decode_search_response;
use crate::itinerary_renderer::{MissingReferencePolicy, SubjectCodes, render_itineraries};
use crate::notifier::{Notification, Notifier};
use crate::reference_index::ReferenceIndex;

pub trait SearchTransport {
    /// POST the payload and return the raw response body.
    fn search(
        &self,
        payload: &SearchPayload,
    ) -> impl Future<Output = Result<String, TransportError>> + Send;
}

/// Append the API key the way the endpoint expects it.
///
/// An endpoint ending in `key=` only needs the key concatenated.
pub fn with_api_key(endpoint: &str, api_key: &str) -> String {
    if endpoint.ends_with("key=") {
        format!("{}{}", endpoint, api_key)
    } else if endpoint.contains('?') {
        format!("{}&key={}", endpoint, api_key)
    } else {
        format!("{}?key={}", endpoint, api_key)
    }
}

#[derive(Clone)]
pub struct QpxClient {
    client: Arc<wreq::Client>,
    endpoint: String,
    api_key: String,
}

impl QpxClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, TransportError> {
        let client = wreq::Client::builder()
            .build()
            .map_err(TransportError::Client)?;
        Ok(Self {
            client: Arc::new(client),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl SearchTransport for QpxClient {
    async fn search(&self, payload: &SearchPayload) -> Result<String, TransportError> {
        // The key rides in the query string: wreq errors must drop their URL
        let url = with_api_key(&self.endpoint, &self.api_key);

        let http_start = Instant::now();
        tracing::trace!("[search] POST {}", self.endpoint);
        let response = self
            .client
            .post(url.as_str())
            .json(payload)
            .send()
            .await
            .map_err(|source| TransportError::Send {
                endpoint: self.endpoint.clone(),
                source: source.without_url(),
            })?;

        let status = response.status();
        tracing::debug!(
            "[search] HTTP Status: {} {} after {:?}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown"),
            http_start.elapsed()
        );

        let body = response
            .text()
            .await
            .map_err(|source| TransportError::Body(source.without_url()))?;
        tracing::debug!("[search] Response body: {} KB", body.len() / 1024);

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body_preview: body_preview(&body),
            });
        }

        Ok(body)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub missing_reference: MissingReferencePolicy,
    /// Write the raw response body here before decoding it.
    pub save_response_to: Option<PathBuf>,
}

/// What was found and sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    pub trip_count: usize,
    pub sale_total: String,
    pub notification: Notification,
}

/// Request → search call → decode → index → render → notify.
pub struct FareSearch<T, N> {
    transport: T,
    notifier: N,
    options: SearchOptions,
}

impl<T: SearchTransport, N: Notifier> FareSearch<T, N> {
    pub fn new(transport: T, notifier: N, options: SearchOptions) -> Self {
        Self {
            transport,
            notifier,
            options,
        }
    }

    pub async fn run(&self, request: &SearchRequest) -> Result<SearchOutcome, QpxError> {
        let overall_start = Instant::now();
        let payload = request.payload();
        let payload_json = payload.to_json_string();

        tracing::info!(
            "🛫 Searching {} → {} on {}{} ({} adult(s), max {}, {} solution(s))",
            request.origin,
            request.destination,
            request.departure_date,
            request
                .return_date
                .map(|d| format!(", back on {}", d))
                .unwrap_or_default(),
            request.adult_count,
            request.max_price,
            request.solutions
        );
        tracing::debug!("Payload: {}", payload_json);

        let fetch_start = Instant::now();
        let body = self.transport.search(&payload).await?;
        tracing::info!(
            "Search call completed in {:?}, got {} KB",
            fetch_start.elapsed(),
            body.len() / 1024
        );

        if let Some(path) = &self.options.save_response_to {
            tokio::fs::write(path, &body)
                .await
                .map_err(|source| QpxError::SaveResponse {
                    path: path.clone(),
                    source,
                })?;
            tracing::info!("Saved raw response to {:?}", path);
        }

        let results = decode_search_response(&body).map_err(|e| {
            tracing::error!("Response preview: {}", body_preview(&body));
            QpxError::from_decode(e, &payload_json)
        })?;
        tracing::debug!(
            "Decoded {} trip options (request id {:?})",
            results.len(),
            results.request_id
        );

        let index = ReferenceIndex::build(&results.tables);
        let subject_codes = SubjectCodes {
            origin: &request.origin,
            destination: &request.destination,
        };
        let report = render_itineraries(
            &results.trip_options,
            &index,
            subject_codes,
            self.options.missing_reference,
        )?;

        let (Some(representative), Some(subject)) = (
            report.representative.clone(),
            report.subject(request.is_round_trip()),
        ) else {
            return Err(QpxError::NoResults {
                payload: payload_json,
                missing: "trips.tripOption".to_string(),
            });
        };

        let notification = Notification {
            subject,
            body: report.body(),
        };
        self.notifier.notify(&notification).await?;

        tracing::info!(
            "Total search time: {:?} ({} trip options, last price {})",
            overall_start.elapsed(),
            report.trip_count,
            representative.sale_total
        );

        Ok(SearchOutcome {
            trip_count: report.trip_count,
            sale_total: representative.sale_total,
            notification,
        })
    }
}
