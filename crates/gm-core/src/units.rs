//! Distance units used by the route service.

/// Kilometers per statute mile.
pub const KM_PER_MILE: f64 = 1.609344;

/// Convert a length in route-service units (miles) to kilometers.
pub fn miles_to_km(miles: f64) -> f64 {
    miles * KM_PER_MILE
}
