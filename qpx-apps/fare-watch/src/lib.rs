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

// Library for qpx-fare-watch
// Flight search request building, response normalization and notification

pub mod config;
pub mod error;
mod flights_query_builder;
mod flights_response;
mod flights_search;
mod itinerary_renderer;
mod notifier;
mod reference_index;

pub use config::{AppConfig, NotificationConfig, Recipients};
pub use error::{
    ConfigError, DecodeError, MissingReferenceError, NotificationError, QpxError,
    RequestBuildError, TransportError,
};

// Re-export commonly used items from the pipeline stages
pub use flights_query_builder::*;
pub use flights_response::*;
pub use flights_search::*;
pub use itinerary_renderer::*;
pub use notifier::*;
pub use reference_index::*;
