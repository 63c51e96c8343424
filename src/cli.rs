use crate::hwmon::HWMON_DIR;
use ::clap::Parser;
use lazy_static::lazy_static;
use std::path::PathBuf;
use std::time::Duration;

const LOG_DIR: &str = ".local/share/zenergy-wattage";
const LOG_FILENAME: &str = "cpu_wattage.log";

lazy_static! {
  /*
    Global configuration variable, parsed from the command line on first use.

    It is the wrapped value that implements any traits (eg Debug),
    NOT the wrapper. Must deref (*CONFIGURATION) when debug/trace printing.
  */

  pub static ref CONFIGURATION: Configuration = Configuration::new();
}

#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    pub interval: Duration,
    pub log_path: PathBuf,
    pub hwmon_dir: PathBuf,
    pub device_name: String,
    pub channel_label: String,
}

impl Configuration {
    fn new() -> Self {
        Configuration::from_cli(CLI::parse())
    }

    fn from_cli(args: CLI) -> Self {
        Configuration {
            interval: args.interval,
            log_path: args.log.unwrap_or_else(default_log_path),
            hwmon_dir: args.hwmon_dir,
            device_name: args.device,
            channel_label: args.label,
        }
    }
}

/// `~/.local/share/zenergy-wattage/cpu_wattage.log`, relative to the working
/// directory when there is no home.
#[must_use]
pub fn default_log_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join(LOG_DIR)
        .join(LOG_FILENAME)
}

fn parse_interval(arg: &str) -> Result<Duration, String> {
    let secs: f64 = arg
        .parse()
        .map_err(|_| format!("{arg:?} is not a number of seconds"))?;
    match Duration::try_from_secs_f64(secs) {
        Ok(interval) if !interval.is_zero() => Ok(interval),
        _ => Err(String::from("interval must be a positive number of seconds")),
    }
}

/*
  >>> ATTENTION <<<

    When updating this structure, you probably want to update
    the Configuration structure (and its implementation) too.
*/

#[derive(Parser, Debug)]
#[command(author, version, about = "Monitor CPU wattage via zenergy", long_about=None)]
struct CLI {
    #[arg(
        long,
        short,
        default_value = "1.0",
        value_parser = parse_interval,
        help = "Refresh interval in seconds"
    )]
    interval: Duration,
    #[arg(
        long,
        short,
        help = "Log file path [default: ~/.local/share/zenergy-wattage/cpu_wattage.log]"
    )]
    log: Option<PathBuf>,
    #[arg(
        long,
        default_value = HWMON_DIR,
        help = "Directory holding the hwmon devices"
    )]
    hwmon_dir: PathBuf,
    #[arg(long, default_value = "zenergy", help = "Name of the hwmon device to read")]
    device: String,
    #[arg(long, default_value = "Esocket0", help = "Label of the energy channel to read")]
    label: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Configuration, clap::Error> {
        CLI::try_parse_from(std::iter::once("zenergy-wattage").chain(args.iter().copied()))
            .map(Configuration::from_cli)
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.interval, Duration::from_secs(1));
        assert!(config.log_path.ends_with(".local/share/zenergy-wattage/cpu_wattage.log"));
        assert_eq!(config.hwmon_dir, PathBuf::from("/sys/class/hwmon"));
        assert_eq!(config.device_name, "zenergy");
        assert_eq!(config.channel_label, "Esocket0");
    }

    #[test]
    fn test_overrides() {
        let config = parse(&["--interval", "0.25", "--log", "/tmp/w.log", "--label", "Esocket1"]).unwrap();
        assert_eq!(config.interval, Duration::from_millis(250));
        assert_eq!(config.log_path, PathBuf::from("/tmp/w.log"));
        assert_eq!(config.channel_label, "Esocket1");
    }

    #[test]
    fn test_rejects_bad_intervals() {
        for bad in ["0", "abc", "inf", "NaN", "1e20", "1e-12"] {
            assert!(parse(&["--interval", bad]).is_err(), "accepted {bad}");
        }
        let err = parse(&["--interval=-1"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
