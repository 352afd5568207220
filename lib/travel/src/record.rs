//! Travel record types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A scheduled flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightRecord {
    /// Operating airline.
    pub airline: String,
    /// Flight number, e.g. "TP441".
    pub flight_number: String,
    /// Departure city.
    pub origin: String,
    /// Arrival city.
    pub destination: String,
    /// Departure date.
    pub date: NaiveDate,
    /// Local departure time, e.g. "08:30".
    pub departure_time: String,
    /// Ticket price in euros.
    pub price_eur: f64,
}

impl fmt::Display for FlightRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: {} -> {} on {} at {}, {:.2} EUR",
            self.airline,
            self.flight_number,
            self.origin,
            self.destination,
            self.date,
            self.departure_time,
            self.price_eur
        )
    }
}

/// A hotel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelRecord {
    /// Hotel name.
    pub name: String,
    /// City the hotel is in.
    pub city: String,
    /// Star rating (1-5).
    pub stars: u8,
    /// Street address.
    pub address: String,
    /// Price per night in euros.
    pub price_per_night_eur: f64,
}

impl fmt::Display for HotelRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} stars) - {}, {}, {:.2} EUR per night",
            self.name, self.stars, self.address, self.city, self.price_per_night_eur
        )
    }
}

/// A restaurant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantRecord {
    /// Restaurant name.
    pub name: String,
    /// City the restaurant is in.
    pub city: String,
    /// Cuisine, e.g. "Italian".
    pub cuisine: String,
    /// Price range, e.g. "cheap", "moderate", "expensive".
    pub price_range: String,
    /// Average rating out of 5.
    pub rating: f32,
}

impl fmt::Display for RestaurantRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {}) - {}, rated {:.1}/5",
            self.name, self.cuisine, self.price_range, self.city, self.rating
        )
    }
}

/// A daily weather forecast for a city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    /// City the forecast is for.
    pub city: String,
    /// Forecast date.
    pub date: NaiveDate,
    /// Short description, e.g. "Sunny".
    pub condition: String,
    /// Minimum temperature in degrees Celsius.
    pub min_temp_c: f32,
    /// Maximum temperature in degrees Celsius.
    pub max_temp_c: f32,
}

impl fmt::Display for WeatherRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} on {}: {}, {:.0}-{:.0} C",
            self.city, self.date, self.condition, self.min_temp_c, self.max_temp_c
        )
    }
}

/// The full set of travel records, as stored in a data file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TravelData {
    /// Scheduled flights.
    #[serde(default)]
    pub flights: Vec<FlightRecord>,
    /// Hotels.
    #[serde(default)]
    pub hotels: Vec<HotelRecord>,
    /// Restaurants.
    #[serde(default)]
    pub restaurants: Vec<RestaurantRecord>,
    /// Weather forecasts.
    #[serde(default)]
    pub forecasts: Vec<WeatherRecord>,
}
