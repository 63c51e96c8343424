use log::{trace, warn};
use std::process;
use zenergy_wattage::cli::CONFIGURATION;
use zenergy_wattage::error::MonitorError;
use zenergy_wattage::hwmon::{locate, EnergyFile, Hwmon};
use zenergy_wattage::monitor::{CancellationToken, Monitor, SystemClock};
use zenergy_wattage::sink::{Console, WattageLog};

fn main() {
    zenergy_wattage::init_logging();
    trace!("Configuration: {:#?}", *CONFIGURATION);

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(e.exit_code());
    }
}

fn run() -> Result<(), MonitorError> {
    let config = &*CONFIGURATION;
    let mut log = WattageLog::open(&config.log_path).map_err(|source| MonitorError::Setup {
        path: config.log_path.clone(),
        source,
    })?;

    println!(
        "Monitoring {}... Interval: {}s, Log: {}",
        config.device_name,
        config.interval.as_secs_f64(),
        log.path().display()
    );

    let channel = locate(
        &Hwmon::new(&config.hwmon_dir),
        &config.device_name,
        &config.channel_label,
    )?;
    println!("Found {} at {}", config.device_name, channel.device.display());
    println!("Reading from {}", channel.input.display());

    let token = CancellationToken::new();
    let handler_token = token.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_token.cancel()) {
        warn!("Failed to install Ctrl-C handler: {e}");
    }

    let mut monitor = Monitor::new(EnergyFile::new(&channel), SystemClock, config.interval)?;
    let stats = monitor.run(&token, &mut [&mut Console, &mut log]);
    trace!("Monitor stats: {stats:?}");

    println!("\nStopping monitor.");
    Ok(())
}
