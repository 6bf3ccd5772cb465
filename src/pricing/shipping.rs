use serde::{Deserialize, Serialize};

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Converts kilometers to an ETA in minutes, assuming ~30 km/h average
/// rider speed. Tunable policy constant.
const MINUTES_PER_KM: f64 = 2.0;

/// Per-minute delivery rate in currency units, with a fare floor and ceiling.
const FARE_PER_MINUTE: f64 = 50.0;
const FARE_MIN: i64 = 500;
const FARE_MAX: i64 = 5000;

/// Share of the distance-covered fee paid to a rider when a delivery is
/// cancelled after pickup.
const COMPENSATION_SHARE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ShippingQuote {
    pub distance_km: f64,
    pub estimated_minutes: i64,
    pub fare: i64,
}

#[derive(Debug, thiserror::Error)]
#[error("coordinates must be finite numbers")]
pub struct InvalidCoordinates;

/// Great-circle distance in kilometers.
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Quote a delivery between the seller and the buyer. Pure; callers that get
/// an error must fall back to the platform's flat fees, never default to
/// zero. A same-point pair quotes 1 minute at the fare floor.
pub fn quote(seller: Coordinates, user: Coordinates) -> Result<ShippingQuote, InvalidCoordinates> {
    let coords = [seller.lat, seller.lng, user.lat, user.lng];
    if coords.iter().any(|c| !c.is_finite()) {
        return Err(InvalidCoordinates);
    }

    let distance_km = haversine_km(seller, user);
    let estimated_minutes = ((distance_km * MINUTES_PER_KM).round() as i64).max(1);
    let fare = ((estimated_minutes as f64 * FARE_PER_MINUTE).round() as i64)
        .clamp(FARE_MIN, FARE_MAX);

    Ok(ShippingQuote {
        distance_km,
        estimated_minutes,
        fare,
    })
}

/// Partial payout owed to a rider for minutes already ridden when the buyer
/// cancels mid-delivery: half the value of the distance covered.
pub fn rider_compensation(minutes_covered: f64) -> i64 {
    let distance_covered_fee = (minutes_covered.max(0.0) * FARE_PER_MINUTE).round();
    (distance_covered_fee * COMPENSATION_SHARE).round() as i64
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
