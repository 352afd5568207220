//! Travel data for the travel assistant.
//!
//! This crate provides:
//!
//! - **Records**: flights, hotels, restaurants and weather forecasts
//! - **Data sources**: read-only access to those records
//! - **Lookups**: pure, conjunctive filtering of records into display text

pub mod error;
pub mod filter;
pub mod lookup;
pub mod record;
pub mod source;

pub use error::DataSourceError;
pub use filter::{DateFilter, InvalidDateFilter};
pub use lookup::{FlightQuery, HotelQuery, Lookup, RestaurantQuery, WeatherQuery};
pub use record::{FlightRecord, HotelRecord, RestaurantRecord, TravelData, WeatherRecord};
pub use source::{FileTravelData, InMemoryTravelData, TravelDataSource};
