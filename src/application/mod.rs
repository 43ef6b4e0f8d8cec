// Application layer - Use cases over the glucose source
pub mod glucose_service;
pub mod glucose_source;
pub mod poller;
