pub mod binom;
pub mod chart_export;
pub mod config;
pub mod error;
pub mod inputs;
pub mod state;
