//! Report CPU package power from the cumulative socket energy counter
//! published by the `zenergy` hwmon driver.
//!
//! [`hwmon::locate`] finds the counter once at startup, [`monitor::Monitor`]
//! polls it and turns successive readings into watts, [`sink`] prints and logs
//! the results.

pub mod cli;
pub mod error;
pub mod hwmon;
pub mod monitor;
pub mod sink;

use simple_logger::SimpleLogger;

/// Shared logger setup for the binaries. `RUST_LOG` overrides the default.
pub fn init_logging() {
    if let Err(e) = SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .env()
        .init()
    {
        eprintln!("Failed to initialise logging: {e}");
    }
}
