use anyhow::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::Config;
use crate::constants::*;
use crate::models::{Coach, CoachListing};

static LABELED_COORDINATES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*latitude:\s*([-+]?\d+(?:\.\d+)?)\s*,\s*longitude:\s*([-+]?\d+(?:\.\d+)?)\s*$")
        .expect("labeled coordinate pattern is valid")
});

static BARE_COORDINATES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([-+]?\d+(?:\.\d+)?)\s*,\s*([-+]?\d+(?:\.\d+)?)\s*$")
        .expect("bare coordinate pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Returns `None` when either value is out of range or not finite.
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && latitude.abs() <= MAX_LATITUDE
            && longitude.abs() <= MAX_LONGITUDE;

        valid.then_some(Self { latitude, longitude })
    }
}

/// Parses "Latitude: <f>, Longitude: <f>" (markers case-insensitive) or a
/// bare "<lat>,<lng>" pair. Anything else, including out-of-range values,
/// is `None`; a real (0, 0) stays distinguishable from a parse failure.
pub fn parse_coordinates(raw: &str) -> Option<Coordinates> {
    let captures = LABELED_COORDINATES
        .captures(raw)
        .or_else(|| BARE_COORDINATES.captures(raw))?;

    let latitude: f64 = captures[1].parse().ok()?;
    let longitude: f64 = captures[2].parse().ok()?;

    Coordinates::new(round_coordinate(latitude), round_coordinate(longitude))
}

pub fn parse_latitude(raw: &str) -> Option<f64> {
    parse_coordinates(raw).map(|coords| coords.latitude)
}

pub fn parse_longitude(raw: &str) -> Option<f64> {
    parse_coordinates(raw).map(|coords| coords.longitude)
}

fn round_coordinate(value: f64) -> f64 {
    let scale = 10f64.powi(COORDINATE_DECIMAL_PLACES);
    (value * scale).round() / scale
}

/// Great-circle distance in kilometers (haversine).
pub fn distance_km(from: Coordinates, to: Coordinates) -> f64 {
    let dlat = (to.latitude - from.latitude).to_radians();
    let dlng = (to.longitude - from.longitude).to_radians();

    let a = (dlat / 2.0).sin().powi(2)
        + from.latitude.to_radians().cos() * to.latitude.to_radians().cos() * (dlng / 2.0).sin().powi(2);

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Outcome of a reverse geocoding call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceLookup {
    Found(String),
    NotFound,
    Error,
}

impl PlaceLookup {
    pub fn display(&self) -> &str {
        match self {
            PlaceLookup::Found(place) => place,
            PlaceLookup::NotFound => PLACE_NOT_FOUND,
            PlaceLookup::Error => PLACE_LOOKUP_ERROR,
        }
    }
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Never fails: transport and decoding problems come back as `PlaceLookup::Error`.
    async fn reverse_geocode(&self, coords: Coordinates) -> PlaceLookup;
}

#[derive(Debug, Deserialize)]
struct NominatimReverseResponse {
    address: Option<NominatimAddress>,
}

#[derive(Debug, Default, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    state: Option<String>,
    county: Option<String>,
}

/// "City, State" with the usual Nominatim fallbacks (town, village; county).
fn place_name(address: &NominatimAddress) -> String {
    let city = address
        .city
        .as_deref()
        .or(address.town.as_deref())
        .or(address.village.as_deref())
        .unwrap_or("Unknown");

    match address.state.as_deref().or(address.county.as_deref()) {
        Some(region) if !region.is_empty() => format!("{}, {}", city, region),
        _ => city.to_string(),
    }
}

/// Reverse geocoder backed by a Nominatim-compatible HTTP API.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
    user_agent: String,
    timeout: Duration,
}

impl NominatimGeocoder {
    pub fn new(client: Client, base_url: impl Into<String>, user_agent: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_agent: user_agent.into(),
            timeout,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Client::builder().timeout(config.geocoder_timeout).build()?;
        Ok(Self::new(
            client,
            config.geocoder_url.clone(),
            config.geocoder_user_agent.clone(),
            config.geocoder_timeout,
        ))
    }

    async fn fetch(&self, coords: Coordinates) -> Result<PlaceLookup> {
        let url = format!(
            "{}/reverse?format=json&lat={}&lon={}&zoom={}",
            self.base_url, coords.latitude, coords.longitude, GEOCODER_ZOOM
        );
        debug!("Reverse geocoding via {}", url);

        let response: NominatimReverseResponse = self
            .client
            .get(&url)
            .header("User-Agent", &self.user_agent)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(match response.address {
            Some(address) => PlaceLookup::Found(place_name(&address)),
            None => PlaceLookup::NotFound,
        })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn reverse_geocode(&self, coords: Coordinates) -> PlaceLookup {
        match self.fetch(coords).await {
            Ok(place) => place,
            Err(e) => {
                warn!(
                    error = %e,
                    latitude = coords.latitude,
                    longitude = coords.longitude,
                    "Reverse geocoding failed"
                );
                PlaceLookup::Error
            }
        }
    }
}

/// Human readable place for a stored coordinate string.
pub async fn describe_location(geocoder: &dyn Geocoder, location: Option<&str>) -> PlaceLookup {
    match location.and_then(parse_coordinates) {
        Some(coords) => geocoder.reverse_geocode(coords).await,
        None => PlaceLookup::NotFound,
    }
}

/// Pairs each coach with a display place, keeping the input order.
pub async fn describe_locations(geocoder: &dyn Geocoder, coaches: Vec<Coach>) -> Vec<CoachListing> {
    let mut listings = Vec::with_capacity(coaches.len());
    for coach in coaches {
        let place = describe_location(geocoder, coach.location.as_deref()).await;
        listings.push(CoachListing {
            place: place.display().to_string(),
            coach,
        });
    }
    listings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct StubGeocoder {
        answer: PlaceLookup,
        calls: Mutex<Vec<Coordinates>>,
    }

    impl StubGeocoder {
        fn new(answer: PlaceLookup) -> Self {
            Self { answer, calls: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl Geocoder for StubGeocoder {
        async fn reverse_geocode(&self, coords: Coordinates) -> PlaceLookup {
            self.calls.lock().unwrap().push(coords);
            self.answer.clone()
        }
    }

    fn coach(id: i32, location: Option<&str>) -> Coach {
        Coach {
            id,
            first_name: None,
            last_name: None,
            location: location.map(str::to_string),
            skills: Vec::new(),
        }
    }

    #[test]
    fn test_parse_labeled_coordinates() {
        let coords = parse_coordinates("Latitude: 42.02384529218001, Longitude: -93.64541386213286").unwrap();
        assert_eq!(coords.latitude, 42.02385);
        assert_eq!(coords.longitude, -93.64541);

        let coords = parse_coordinates("latitude: 1.5,LONGITUDE: 2").unwrap();
        assert_eq!(coords, Coordinates { latitude: 1.5, longitude: 2.0 });
    }

    #[test]
    fn test_parse_bare_coordinates() {
        let coords = parse_coordinates(" 44.98, -93.27 ").unwrap();
        assert_eq!(coords.latitude, 44.98);
        assert_eq!(coords.longitude, -93.27);

        assert_eq!(parse_latitude("0,0"), Some(0.0));
        assert_eq!(parse_longitude("0,0"), Some(0.0));
    }

    #[test]
    fn test_parse_rejects_garbage_and_out_of_range() {
        assert!(parse_coordinates("").is_none());
        assert!(parse_coordinates("Ames, Iowa").is_none());
        assert!(parse_coordinates("91,10").is_none());
        assert!(parse_coordinates("10,181").is_none());
        assert!(parse_coordinates("Latitude: 12.5").is_none());
        assert_eq!(parse_latitude("not a place"), None);
    }

    #[test]
    fn test_distance_km() {
        // Minneapolis to St. Paul (≈14.55 km)
        let minneapolis = Coordinates::new(44.98, -93.27).unwrap();
        let st_paul = Coordinates::new(44.95, -93.09).unwrap();

        let distance = distance_km(minneapolis, st_paul);
        assert!((distance - 14.549).abs() < 0.01, "got {}", distance);

        assert!(distance_km(minneapolis, minneapolis) < 0.001);
    }

    #[test]
    fn test_place_name_fallbacks() {
        let address = NominatimAddress {
            city: Some("Ames".to_string()),
            state: Some("Iowa".to_string()),
            ..Default::default()
        };
        assert_eq!(place_name(&address), "Ames, Iowa");

        let address = NominatimAddress {
            village: Some("Gilbert".to_string()),
            county: Some("Story County".to_string()),
            ..Default::default()
        };
        assert_eq!(place_name(&address), "Gilbert, Story County");

        assert_eq!(place_name(&NominatimAddress::default()), "Unknown");
    }

    #[test]
    fn test_reverse_response_without_address() {
        let response: NominatimReverseResponse =
            serde_json::from_str(r#"{"error":"Unable to geocode"}"#).unwrap();
        assert!(response.address.is_none());
    }

    #[tokio::test]
    async fn test_describe_locations_skips_unparsable() {
        let geocoder = StubGeocoder::new(PlaceLookup::Found("Ames, Iowa".to_string()));
        let coaches = vec![coach(1, Some("42.02,-93.64")), coach(2, None), coach(3, Some("somewhere"))];

        let listings = describe_locations(&geocoder, coaches).await;

        assert_eq!(listings.len(), 3);
        assert_eq!(listings[0].place, "Ames, Iowa");
        assert_eq!(listings[1].place, PLACE_NOT_FOUND);
        assert_eq!(listings[2].place, PLACE_NOT_FOUND);
        assert_eq!(geocoder.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_describe_location_degrades_on_error() {
        let geocoder = StubGeocoder::new(PlaceLookup::Error);
        let place = describe_location(&geocoder, Some("0,0")).await;
        assert_eq!(place.display(), PLACE_LOOKUP_ERROR);
    }

    #[tokio::test]
    async fn test_unreachable_geocoder_reports_error() {
        let client = Client::builder().timeout(Duration::from_millis(200)).build().unwrap();
        let geocoder = NominatimGeocoder::new(client, "http://127.0.0.1:9", "test", Duration::from_millis(200));

        let place = geocoder.reverse_geocode(Coordinates::new(0.0, 0.0).unwrap()).await;
        assert_eq!(place, PlaceLookup::Error);
    }

    #[tokio::test]
    async fn test_silent_geocoder_is_cut_off_at_timeout() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        // accept connections and hold them open without answering
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let timeout = Duration::from_millis(300);
        let geocoder = NominatimGeocoder::new(Client::new(), format!("http://{}", address), "test", timeout);

        let started = std::time::Instant::now();
        let place = geocoder.reverse_geocode(Coordinates::new(42.02, -93.64).unwrap()).await;
        let elapsed = started.elapsed();

        assert_eq!(place, PlaceLookup::Error);
        assert!(elapsed >= timeout, "returned after {:?}", elapsed);
        assert!(elapsed < Duration::from_secs(3), "returned after {:?}", elapsed);

        server.abort();
    }
}
