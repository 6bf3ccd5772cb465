pub mod settlement;
pub mod shipping;

pub use settlement::{commission, split, SettlementSplit, COMMISSION_PERCENT, SERVICE_CHARGE_PERCENT};
pub use shipping::{
    haversine_km, quote, rider_compensation, Coordinates, InvalidCoordinates, ShippingQuote,
};
