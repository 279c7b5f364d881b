//! Route modules for the API server
//!
//! - dashboard: snapshot and default range
//! - overrides: annotation log read/write
//! - balances: per-account balances as of a date
//! - system: health, summary, reload

pub mod balances;
pub mod dashboard;
pub mod overrides;
pub mod system;
