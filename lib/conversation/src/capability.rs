//! Capability registry for conversation mode.
//!
//! Capabilities are the read-only travel lookups the model may ask for. The
//! catalogue is closed: a name the model invents is rejected, never looked up
//! dynamically.

use crate::error::CapabilityError;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value as JsonValue, json};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};
use travel_assistant_ai::CapabilityManifestEntry;
use travel_assistant_travel::{
    DataSourceError, FlightQuery, HotelQuery, Lookup, RestaurantQuery, TravelDataSource,
    WeatherQuery,
};

/// JSON type of a capability parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    /// Free text.
    String,
    /// Whole number.
    Integer,
    /// Decimal number.
    Number,
}

impl ParameterKind {
    const fn json_type(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
        }
    }
}

/// A parameter accepted by a capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterSpec {
    /// Parameter name.
    pub name: &'static str,
    /// Expected JSON type.
    pub kind: ParameterKind,
    /// Description shown to the model.
    pub description: &'static str,
    /// Whether the parameter is mandatory.
    pub required: bool,
}

impl ParameterSpec {
    const fn required(name: &'static str, kind: ParameterKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            description,
            required: true,
        }
    }

    const fn optional(name: &'static str, kind: ParameterKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            description,
            required: false,
        }
    }
}

const DATE_DESCRIPTION: &str = "Day as YYYY-MM-DD or whole month as YYYY-MM";

const FLIGHT_PARAMETERS: &[ParameterSpec] = &[
    ParameterSpec::required("origin", ParameterKind::String, "Departure city"),
    ParameterSpec::required("destination", ParameterKind::String, "Arrival city"),
    ParameterSpec::optional("date", ParameterKind::String, DATE_DESCRIPTION),
];

const HOTEL_PARAMETERS: &[ParameterSpec] = &[
    ParameterSpec::required("city", ParameterKind::String, "City to search in"),
    ParameterSpec::optional("stars", ParameterKind::Integer, "Exact star rating, 1 to 5"),
];

const RESTAURANT_PARAMETERS: &[ParameterSpec] = &[
    ParameterSpec::required("city", ParameterKind::String, "City to search in"),
    ParameterSpec::optional(
        "cuisine",
        ParameterKind::String,
        "Cuisine, as a name or regular expression",
    ),
    ParameterSpec::optional(
        "budget",
        ParameterKind::String,
        "Price range: cheap, moderate or expensive",
    ),
    ParameterSpec::optional("min_rating", ParameterKind::Number, "Minimum rating out of 5"),
];

const WEATHER_PARAMETERS: &[ParameterSpec] = &[
    ParameterSpec::required("city", ParameterKind::String, "City to get the forecast for"),
    ParameterSpec::optional("date", ParameterKind::String, DATE_DESCRIPTION),
];

/// The closed set of capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Scheduled flights between two cities.
    Flights,
    /// Hotels in a city.
    Hotels,
    /// Restaurants in a city.
    Restaurants,
    /// Weather forecasts for a city.
    Weather,
}

impl Capability {
    /// Every capability, in manifest order.
    pub const ALL: [Self; 4] = [Self::Flights, Self::Hotels, Self::Restaurants, Self::Weather];

    /// Returns the name the model uses for this capability.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Flights => "get_flights_info",
            Self::Hotels => "get_hotels_info",
            Self::Restaurants => "get_restaurants_info",
            Self::Weather => "get_weather_info",
        }
    }

    /// Looks up a capability by name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|capability| capability.name() == name)
    }

    /// Returns the description shown to the model.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Flights => "Find scheduled flights from an origin city to a destination city",
            Self::Hotels => "Find hotels in a city, optionally with an exact star rating",
            Self::Restaurants => {
                "Find restaurants in a city, optionally filtered by cuisine, budget and minimum rating"
            }
            Self::Weather => "Get the weather forecast for a city",
        }
    }

    /// Returns the accepted parameters.
    #[must_use]
    pub const fn parameters(&self) -> &'static [ParameterSpec] {
        match self {
            Self::Flights => FLIGHT_PARAMETERS,
            Self::Hotels => HOTEL_PARAMETERS,
            Self::Restaurants => RESTAURANT_PARAMETERS,
            Self::Weather => WEATHER_PARAMETERS,
        }
    }

    /// Returns the reply used verbatim when a lookup matches nothing.
    #[must_use]
    pub const fn no_results_message(&self) -> &'static str {
        match self {
            Self::Flights => "No flights found matching your criteria.",
            Self::Hotels => "No hotels found matching your criteria.",
            Self::Restaurants => "No restaurants found matching your criteria.",
            Self::Weather => "No weather forecast found for your criteria.",
        }
    }

    /// Builds the manifest entry advertised to the model.
    #[must_use]
    pub fn manifest_entry(&self) -> CapabilityManifestEntry {
        let properties: Map<String, JsonValue> = self
            .parameters()
            .iter()
            .map(|parameter| {
                (
                    parameter.name.to_string(),
                    json!({
                        "type": parameter.kind.json_type(),
                        "description": parameter.description,
                    }),
                )
            })
            .collect();
        let required: Vec<&str> = self
            .parameters()
            .iter()
            .filter(|parameter| parameter.required)
            .map(|parameter| parameter.name)
            .collect();

        CapabilityManifestEntry::new(self.name(), self.description()).with_parameter_schema(
            json!({
                "type": "object",
                "properties": properties,
                "required": required,
            }),
        )
    }

    /// Validates raw JSON arguments from the model.
    ///
    /// Mandatory parameters must be present and non-blank. Blank optional
    /// parameters are treated as absent. Values of the wrong type, and dates
    /// that are neither a day nor a month, are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityError::MalformedArguments`] or
    /// [`CapabilityError::MissingParameter`].
    pub fn parse_arguments(&self, arguments_json: &str) -> Result<CapabilityArguments, CapabilityError> {
        let malformed = |reason: String| CapabilityError::MalformedArguments {
            capability: self.name().to_string(),
            reason,
        };

        let raw = if arguments_json.trim().is_empty() {
            JsonValue::Object(Map::new())
        } else {
            serde_json::from_str(arguments_json).map_err(|e| malformed(e.to_string()))?
        };
        let JsonValue::Object(mut arguments) = raw else {
            return Err(malformed("arguments are not a JSON object".to_string()));
        };

        arguments.retain(|_, value| !is_blank(value));

        if let Some(missing) = self
            .parameters()
            .iter()
            .find(|parameter| parameter.required && !arguments.contains_key(parameter.name))
        {
            return Err(CapabilityError::MissingParameter {
                capability: self.name().to_string(),
                parameter: missing.name.to_string(),
            });
        }

        let arguments = JsonValue::Object(arguments);
        let parsed = match self {
            Self::Flights => decode(arguments).map(CapabilityArguments::Flights),
            Self::Hotels => decode(arguments).map(CapabilityArguments::Hotels),
            Self::Restaurants => decode(arguments).map(CapabilityArguments::Restaurants),
            Self::Weather => decode(arguments).map(CapabilityArguments::Weather),
        };
        parsed.map_err(|e| malformed(e.to_string()))
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Capability {
    type Err = CapabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| CapabilityError::UnknownCapability {
            name: s.to_string(),
        })
    }
}

fn is_blank(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => true,
        JsonValue::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn decode<T: DeserializeOwned>(arguments: JsonValue) -> Result<T, serde_json::Error> {
    serde_json::from_value(arguments)
}

/// Validated arguments, ready to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum CapabilityArguments {
    /// Flight search.
    Flights(FlightQuery),
    /// Hotel search.
    Hotels(HotelQuery),
    /// Restaurant search.
    Restaurants(RestaurantQuery),
    /// Weather lookup.
    Weather(WeatherQuery),
}

impl CapabilityArguments {
    /// Returns the capability these arguments belong to.
    #[must_use]
    pub const fn capability(&self) -> Capability {
        match self {
            Self::Flights(_) => Capability::Flights,
            Self::Hotels(_) => Capability::Hotels,
            Self::Restaurants(_) => Capability::Restaurants,
            Self::Weather(_) => Capability::Weather,
        }
    }

    /// Runs the lookup against a data source.
    ///
    /// # Errors
    ///
    /// Returns an error if the data source cannot be read.
    pub async fn execute<D: TravelDataSource + ?Sized>(
        &self,
        data: &D,
    ) -> Result<Lookup, DataSourceError> {
        Ok(match self {
            Self::Flights(query) => query.search(&data.flights().await?),
            Self::Hotels(query) => query.search(&data.hotels().await?),
            Self::Restaurants(query) => query.search(&data.restaurants().await?),
            Self::Weather(query) => query.search(&data.forecasts().await?),
        })
    }
}

/// Outcome of invoking a capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityResult {
    /// Matching records, as text.
    Found(String),
    /// Nothing matched.
    NoResults,
    /// The lookup could not run.
    ExecutionFailed,
}

/// The capability catalogue bound to a travel data source.
#[derive(Debug)]
pub struct CapabilityRegistry<D> {
    data: D,
    manifest: Vec<CapabilityManifestEntry>,
}

impl<D: TravelDataSource> CapabilityRegistry<D> {
    /// Creates a registry over a data source.
    pub fn new(data: D) -> Self {
        Self {
            data,
            manifest: Capability::ALL.iter().map(Capability::manifest_entry).collect(),
        }
    }

    /// Returns the manifest advertised to the model.
    #[must_use]
    pub fn manifest(&self) -> &[CapabilityManifestEntry] {
        &self.manifest
    }

    /// Resolves a capability name chosen by the model.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityError::UnknownCapability`] for names outside the
    /// catalogue.
    pub fn lookup(&self, name: &str) -> Result<Capability, CapabilityError> {
        name.parse()
    }

    /// Invokes a capability with validated arguments.
    ///
    /// Data source faults are contained here and reported as
    /// [`CapabilityResult::ExecutionFailed`].
    pub async fn invoke(&self, arguments: &CapabilityArguments) -> CapabilityResult {
        let capability = arguments.capability();
        match arguments.execute(&self.data).await {
            Ok(Lookup::Found(text)) => {
                debug!(%capability, "capability found results");
                CapabilityResult::Found(text)
            }
            Ok(Lookup::NoResults) => {
                debug!(%capability, "capability found no results");
                CapabilityResult::NoResults
            }
            Err(e) => {
                warn!(%capability, error = %e, "capability execution failed");
                CapabilityResult::ExecutionFailed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FailingTravelData;
    use travel_assistant_travel::InMemoryTravelData;

    #[test]
    fn names_round_trip() {
        for capability in Capability::ALL {
            assert_eq!(Capability::from_name(capability.name()), Some(capability));
        }
        assert_eq!(Capability::from_name("book_flight"), None);
    }

    #[test]
    fn unknown_name_is_rejected() {
        let registry = CapabilityRegistry::new(InMemoryTravelData::sample());
        assert_eq!(
            registry.lookup("get_car_rentals"),
            Err(CapabilityError::UnknownCapability {
                name: "get_car_rentals".to_string()
            })
        );
    }

    #[test]
    fn manifest_lists_every_capability_with_required_parameters() {
        let registry = CapabilityRegistry::new(InMemoryTravelData::sample());
        let manifest = registry.manifest();
        assert_eq!(manifest.len(), 4);

        let flights = &manifest[0];
        assert_eq!(flights.name, "get_flights_info");
        assert_eq!(
            flights.parameter_schema["required"],
            json!(["origin", "destination"])
        );
        assert_eq!(
            flights.parameter_schema["properties"]["date"]["type"],
            "string"
        );

        let hotels = &manifest[1];
        assert_eq!(hotels.parameter_schema["properties"]["stars"]["type"], "integer");
    }

    #[test]
    fn parses_hotel_arguments() {
        let arguments = Capability::Hotels
            .parse_arguments(r#"{"city":"Lisbon","stars":4}"#)
            .expect("valid");
        assert_eq!(
            arguments,
            CapabilityArguments::Hotels(HotelQuery {
                city: "Lisbon".to_string(),
                stars: Some(4),
            })
        );
    }

    #[test]
    fn missing_mandatory_parameter() {
        let err = Capability::Flights
            .parse_arguments(r#"{"origin":"Paris"}"#)
            .unwrap_err();
        assert_eq!(
            err,
            CapabilityError::MissingParameter {
                capability: "get_flights_info".to_string(),
                parameter: "destination".to_string(),
            }
        );
    }

    #[test]
    fn blank_mandatory_parameter_counts_as_missing() {
        let err = Capability::Weather
            .parse_arguments(r#"{"city":"   "}"#)
            .unwrap_err();
        assert!(matches!(err, CapabilityError::MissingParameter { .. }));
    }

    #[test]
    fn blank_optional_parameter_is_ignored() {
        let arguments = Capability::Weather
            .parse_arguments(r#"{"city":"Lisbon","date":""}"#)
            .expect("valid");
        assert_eq!(
            arguments,
            CapabilityArguments::Weather(WeatherQuery {
                city: "Lisbon".to_string(),
                date: None,
            })
        );
    }

    #[test]
    fn malformed_arguments() {
        for raw in [
            "{city: Lisbon}",
            r#"["Lisbon"]"#,
            r#"{"city":"Lisbon","stars":"four"}"#,
        ] {
            let err = Capability::Hotels.parse_arguments(raw).unwrap_err();
            assert!(
                matches!(err, CapabilityError::MalformedArguments { .. }),
                "{raw} should be malformed"
            );
        }
    }

    #[test]
    fn invalid_date_is_malformed() {
        let err = Capability::Weather
            .parse_arguments(r#"{"city":"Lisbon","date":"next tuesday"}"#)
            .unwrap_err();
        assert!(matches!(err, CapabilityError::MalformedArguments { .. }));
    }

    #[tokio::test]
    async fn invoke_finds_lisbon_four_star_hotel() {
        let registry = CapabilityRegistry::new(InMemoryTravelData::sample());
        let arguments = Capability::Hotels
            .parse_arguments(r#"{"city":"Lisbon","stars":4}"#)
            .expect("valid");

        match registry.invoke(&arguments).await {
            CapabilityResult::Found(text) => assert!(text.contains("(4 stars)")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn invoke_reports_no_results() {
        let registry = CapabilityRegistry::new(InMemoryTravelData::sample());
        let arguments = Capability::Flights
            .parse_arguments(r#"{"origin":"Rome","destination":"Paris"}"#)
            .expect("valid");

        assert_eq!(registry.invoke(&arguments).await, CapabilityResult::NoResults);
    }

    #[tokio::test]
    async fn invoke_contains_data_source_faults() {
        let registry = CapabilityRegistry::new(FailingTravelData);
        let arguments = Capability::Restaurants
            .parse_arguments(r#"{"city":"Paris","cuisine":"french"}"#)
            .expect("valid");

        assert_eq!(
            registry.invoke(&arguments).await,
            CapabilityResult::ExecutionFailed
        );
    }
}
