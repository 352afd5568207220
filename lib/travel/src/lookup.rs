//! Lookups over travel records.
//!
//! Every lookup takes one mandatory locality and optional filters, applies
//! them conjunctively, and renders matching records one per line. An empty
//! match is [`Lookup::NoResults`], never an error.

use crate::filter::{DateFilter, TextMatcher, same_locality};
use crate::record::{FlightRecord, HotelRecord, RestaurantRecord, WeatherRecord};
use serde::Deserialize;

/// Outcome of a lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Matching records, rendered as text.
    Found(String),
    /// Nothing matched the filters.
    NoResults,
}

impl Lookup {
    fn from_lines<T: ToString>(records: impl Iterator<Item = T>) -> Self {
        let lines: Vec<String> = records.map(|record| record.to_string()).collect();
        if lines.is_empty() {
            Self::NoResults
        } else {
            Self::Found(lines.join("\n"))
        }
    }
}

/// Flight search parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FlightQuery {
    /// Departure city.
    pub origin: String,
    /// Arrival city.
    pub destination: String,
    /// Departure day or month.
    #[serde(default)]
    pub date: Option<DateFilter>,
}

impl FlightQuery {
    /// Returns the flights matching this query.
    #[must_use]
    pub fn search(&self, flights: &[FlightRecord]) -> Lookup {
        Lookup::from_lines(flights.iter().filter(|flight| {
            same_locality(&flight.origin, &self.origin)
                && same_locality(&flight.destination, &self.destination)
                && self.date.is_none_or(|date| date.matches(flight.date))
        }))
    }
}

/// Hotel search parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HotelQuery {
    /// City to search in.
    pub city: String,
    /// Exact star rating.
    #[serde(default)]
    pub stars: Option<u8>,
}

impl HotelQuery {
    /// Returns the hotels matching this query.
    #[must_use]
    pub fn search(&self, hotels: &[HotelRecord]) -> Lookup {
        Lookup::from_lines(hotels.iter().filter(|hotel| {
            same_locality(&hotel.city, &self.city)
                && self.stars.is_none_or(|stars| hotel.stars == stars)
        }))
    }
}

/// Restaurant search parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RestaurantQuery {
    /// City to search in.
    pub city: String,
    /// Cuisine pattern.
    #[serde(default)]
    pub cuisine: Option<String>,
    /// Price range, e.g. "cheap".
    #[serde(default)]
    pub budget: Option<String>,
    /// Minimum average rating.
    #[serde(default)]
    pub min_rating: Option<f32>,
}

impl RestaurantQuery {
    /// Returns the restaurants matching this query.
    #[must_use]
    pub fn search(&self, restaurants: &[RestaurantRecord]) -> Lookup {
        let cuisine = self.cuisine.as_deref().map(TextMatcher::new);

        Lookup::from_lines(restaurants.iter().filter(|restaurant| {
            same_locality(&restaurant.city, &self.city)
                && cuisine
                    .as_ref()
                    .is_none_or(|matcher| matcher.matches(&restaurant.cuisine))
                && self
                    .budget
                    .as_deref()
                    .is_none_or(|budget| same_locality(&restaurant.price_range, budget))
                && self
                    .min_rating
                    .is_none_or(|min_rating| restaurant.rating >= min_rating)
        }))
    }
}

/// Weather lookup parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WeatherQuery {
    /// City to look up.
    pub city: String,
    /// Forecast day or month.
    #[serde(default)]
    pub date: Option<DateFilter>,
}

impl WeatherQuery {
    /// Returns the forecasts matching this query.
    #[must_use]
    pub fn search(&self, forecasts: &[WeatherRecord]) -> Lookup {
        Lookup::from_lines(forecasts.iter().filter(|forecast| {
            same_locality(&forecast.city, &self.city)
                && self.date.is_none_or(|date| date.matches(forecast.date))
        }))
    }
}
