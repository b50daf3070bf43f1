pub mod catalogue;
pub mod geocoding;
pub mod matching;
pub mod requests;

pub use catalogue::{coaches_by_min_level, coaches_by_min_levels, coaches_grouped_by_level};
pub use geocoding::{Coordinates, Geocoder, NominatimGeocoder, PlaceLookup};
pub use matching::{rank, rank_scored, score, ScoreBreakdown};
pub use requests::RequestService;
