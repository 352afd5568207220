//! Read-only travel data sources.

use crate::error::DataSourceError;
use crate::record::{FlightRecord, HotelRecord, RestaurantRecord, TravelData, WeatherRecord};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Trait for read-only access to travel records.
///
/// Implementations may be backed by remote services; every read can fail and
/// callers are expected to contain the failure.
#[async_trait]
pub trait TravelDataSource: Send + Sync {
    /// Returns all scheduled flights.
    async fn flights(&self) -> Result<Vec<FlightRecord>, DataSourceError>;

    /// Returns all hotels.
    async fn hotels(&self) -> Result<Vec<HotelRecord>, DataSourceError>;

    /// Returns all restaurants.
    async fn restaurants(&self) -> Result<Vec<RestaurantRecord>, DataSourceError>;

    /// Returns all weather forecasts.
    async fn forecasts(&self) -> Result<Vec<WeatherRecord>, DataSourceError>;
}

#[async_trait]
impl<T: TravelDataSource + ?Sized> TravelDataSource for Arc<T> {
    async fn flights(&self) -> Result<Vec<FlightRecord>, DataSourceError> {
        (**self).flights().await
    }

    async fn hotels(&self) -> Result<Vec<HotelRecord>, DataSourceError> {
        (**self).hotels().await
    }

    async fn restaurants(&self) -> Result<Vec<RestaurantRecord>, DataSourceError> {
        (**self).restaurants().await
    }

    async fn forecasts(&self) -> Result<Vec<WeatherRecord>, DataSourceError> {
        (**self).forecasts().await
    }
}

/// Travel records held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTravelData {
    data: TravelData,
}

impl InMemoryTravelData {
    /// Creates a source over the given records.
    #[must_use]
    pub fn new(data: TravelData) -> Self {
        Self { data }
    }

    /// Creates a source over the built-in sample records.
    #[must_use]
    pub fn sample() -> Self {
        Self::new(Self::sample_data())
    }

    /// Loads records from a JSON file once.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not decode.
    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DataSourceError> {
        read_travel_file(path.as_ref()).await.map(Self::new)
    }

    /// Returns the built-in sample records.
    #[must_use]
    pub fn sample_data() -> TravelData {
        TravelData {
            flights: vec![
                flight("TAP Air Portugal", "TP441", "Paris", "Lisbon", (2025, 7, 14), "08:30", 129.0),
                flight("Air France", "AF1024", "Paris", "Lisbon", (2025, 7, 18), "17:05", 154.5),
                flight("TAP Air Portugal", "TP438", "Lisbon", "Paris", (2025, 7, 21), "12:40", 118.0),
                flight("ITA Airways", "AZ317", "Paris", "Rome", (2025, 8, 2), "09:15", 97.0),
            ],
            hotels: vec![
                hotel("Avenida Palace", "Lisbon", 5, "Rua 1 de Dezembro 123", 260.0),
                hotel("Lisboa Tejo Hotel", "Lisbon", 4, "Rua dos Condes de Monsanto 2", 120.0),
                hotel("Lost Inn Lisbon", "Lisbon", 2, "Beco dos Apostolos 5", 45.0),
                hotel("Hotel du Marais", "Paris", 3, "Rue de Saintonge 8", 140.0),
                hotel("Le Grand Paris", "Paris", 5, "Place de l'Opera 2", 480.0),
                hotel("Hotel Artemide", "Rome", 4, "Via Nazionale 22", 190.0),
            ],
            restaurants: vec![
                restaurant("Le Petit Bistro", "Paris", "French", "moderate", 4.5),
                restaurant("Sakura", "Paris", "Japanese", "expensive", 4.7),
                restaurant("Chez Janou", "Paris", "Provencal", "cheap", 4.4),
                restaurant("Cervejaria Ramiro", "Lisbon", "Seafood", "moderate", 4.6),
                restaurant("Tasca do Chico", "Lisbon", "Portuguese", "cheap", 4.3),
                restaurant("Da Enzo al 29", "Rome", "Italian", "cheap", 4.6),
            ],
            forecasts: vec![
                forecast("Paris", (2025, 7, 14), "Sunny", 18.0, 27.0),
                forecast("Lisbon", (2025, 7, 14), "Sunny", 20.0, 29.0),
                forecast("Lisbon", (2025, 7, 15), "Cloudy", 19.0, 25.0),
                forecast("Rome", (2025, 8, 2), "Hot", 24.0, 35.0),
            ],
        }
    }
}

fn ymd((year, month, day): (i32, u32, u32)) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

fn flight(
    airline: &str,
    flight_number: &str,
    origin: &str,
    destination: &str,
    date: (i32, u32, u32),
    departure_time: &str,
    price_eur: f64,
) -> FlightRecord {
    FlightRecord {
        airline: airline.to_string(),
        flight_number: flight_number.to_string(),
        origin: origin.to_string(),
        destination: destination.to_string(),
        date: ymd(date),
        departure_time: departure_time.to_string(),
        price_eur,
    }
}

fn hotel(name: &str, city: &str, stars: u8, address: &str, price: f64) -> HotelRecord {
    HotelRecord {
        name: name.to_string(),
        city: city.to_string(),
        stars,
        address: address.to_string(),
        price_per_night_eur: price,
    }
}

fn restaurant(name: &str, city: &str, cuisine: &str, price_range: &str, rating: f32) -> RestaurantRecord {
    RestaurantRecord {
        name: name.to_string(),
        city: city.to_string(),
        cuisine: cuisine.to_string(),
        price_range: price_range.to_string(),
        rating,
    }
}

fn forecast(city: &str, date: (i32, u32, u32), condition: &str, min: f32, max: f32) -> WeatherRecord {
    WeatherRecord {
        city: city.to_string(),
        date: ymd(date),
        condition: condition.to_string(),
        min_temp_c: min,
        max_temp_c: max,
    }
}

#[async_trait]
impl TravelDataSource for InMemoryTravelData {
    async fn flights(&self) -> Result<Vec<FlightRecord>, DataSourceError> {
        Ok(self.data.flights.clone())
    }

    async fn hotels(&self) -> Result<Vec<HotelRecord>, DataSourceError> {
        Ok(self.data.hotels.clone())
    }

    async fn restaurants(&self) -> Result<Vec<RestaurantRecord>, DataSourceError> {
        Ok(self.data.restaurants.clone())
    }

    async fn forecasts(&self) -> Result<Vec<WeatherRecord>, DataSourceError> {
        Ok(self.data.forecasts.clone())
    }
}

/// Travel records read from a JSON file on every lookup.
///
/// Edits to the file are visible to the next lookup, and a missing or corrupt
/// file surfaces as an error from that lookup only.
#[derive(Debug, Clone)]
pub struct FileTravelData {
    path: PathBuf,
}

impl FileTravelData {
    /// Creates a source reading from `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<TravelData, DataSourceError> {
        read_travel_file(&self.path).await
    }
}

#[async_trait]
impl TravelDataSource for FileTravelData {
    async fn flights(&self) -> Result<Vec<FlightRecord>, DataSourceError> {
        Ok(self.load().await?.flights)
    }

    async fn hotels(&self) -> Result<Vec<HotelRecord>, DataSourceError> {
        Ok(self.load().await?.hotels)
    }

    async fn restaurants(&self) -> Result<Vec<RestaurantRecord>, DataSourceError> {
        Ok(self.load().await?.restaurants)
    }

    async fn forecasts(&self) -> Result<Vec<WeatherRecord>, DataSourceError> {
        Ok(self.load().await?.forecasts)
    }
}

async fn read_travel_file(path: &Path) -> Result<TravelData, DataSourceError> {
    let source = path.display().to_string();
    let contents =
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| DataSourceError::Unreachable {
                source: source.clone(),
                reason: e.to_string(),
            })?;

    serde_json::from_str(&contents).map_err(|e| DataSourceError::Malformed {
        source,
        reason: e.to_string(),
    })
}
