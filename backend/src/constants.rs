// =============================================================================
// CoachLink Backend Constants
// =============================================================================
// Tunable values for request validation, coach matching and geocoding,
// kept in one place so they can be adjusted together.

// =============================================================================
// COMPATIBILITY SCORING
// =============================================================================

/// Share of the composite score given to geographic closeness
pub const DISTANCE_WEIGHT: f64 = 0.7;

/// Share of the composite score given to requested-skill overlap
pub const SKILL_WEIGHT: f64 = 0.3;

/// Distances at or beyond this (km) all score zero closeness
pub const MAX_RELEVANT_DISTANCE_KM: f64 = 300.0;

/// Number of matched skills at which the skill term saturates
pub const SKILL_MATCH_SATURATION: usize = 5;

/// Mean Earth radius used by the haversine formula
pub const EARTH_RADIUS_KM: f64 = 6371.0;

// =============================================================================
// COORDINATES
// =============================================================================

/// Parsed coordinates are rounded to this many decimal places (~1 m)
pub const COORDINATE_DECIMAL_PLACES: i32 = 5;

pub const MAX_LATITUDE: f64 = 90.0;
pub const MAX_LONGITUDE: f64 = 180.0;

// =============================================================================
// REQUEST VALIDATION
// =============================================================================

/// Maximum characters in a request message
pub const MAX_MESSAGE_LENGTH: usize = 500;

/// Maximum characters in a session location or description
pub const MAX_SESSION_FIELD_LENGTH: usize = 500;

// =============================================================================
// GEOCODING
// =============================================================================

/// Nominatim-compatible reverse geocoding endpoint
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";

/// Nominatim's usage policy requires an identifying User-Agent
pub const DEFAULT_GEOCODER_USER_AGENT: &str = "CoachLink/0.1";

/// Upper bound on a single reverse geocoding call
pub const DEFAULT_GEOCODER_TIMEOUT_SECS: u64 = 5;

/// Zoom level 10 resolves to city granularity
pub const GEOCODER_ZOOM: u8 = 10;

pub const PLACE_NOT_FOUND: &str = "Location not found";
pub const PLACE_LOOKUP_ERROR: &str = "Error retrieving location";

// =============================================================================
// DATABASE CONFIGURATION
// =============================================================================

pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

pub const DB_ACQUIRE_TIMEOUT_SECS: u64 = 10;
