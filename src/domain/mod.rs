// Domain layer - Glucose readings, classification and units
pub mod reading;
pub mod trend;
pub mod units;
