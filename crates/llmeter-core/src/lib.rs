pub mod config;
pub mod error;
pub mod results;
pub mod session;
pub mod store;

pub use error::LlmeterError;
