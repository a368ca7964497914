//! # Providers
//!
//! AI transport implementations and the factory that builds them from settings.

pub mod ai;
pub mod factory;

pub use factory::create_provider;
