//! Business logic services. Handlers stay thin; state mutation, routing,
//! and SQL live here.

pub mod account;
pub mod forum;
pub mod history;
pub mod presence;
pub mod relay;
