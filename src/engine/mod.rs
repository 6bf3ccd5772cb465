pub mod checkout;
pub mod delivery;
pub mod dispatch;
pub mod settlement;
