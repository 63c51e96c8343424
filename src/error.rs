use std::io;
use std::num::ParseIntError;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to find the counter at startup. Fatal.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("no hwmon device named {name:?} found. Is the module loaded?")]
    DeviceNotFound { name: String },
    #[error("no energy channel labelled {label:?} found in {device:?}")]
    ChannelNotFound { label: String, device: PathBuf },
}

/// A single failed read of the energy counter.
#[derive(Error, Debug)]
pub enum ReadError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse energy reading {text:?}: {source}")]
    Parse {
        text: String,
        #[source]
        source: ParseIntError,
    },
}

/// Errors that stop the monitor. Anything else is handled inside the loop.
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("failed to prepare log file {path:?}: {source}")]
    Setup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    #[error("could not read initial energy value: {0}")]
    InitialRead(#[source] ReadError),
}

impl MonitorError {
    /// Process exit status for this failure.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            MonitorError::Setup { .. } => 1,
            MonitorError::Discovery(_) => 2,
            MonitorError::InitialRead(_) => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_errors_have_distinct_exit_codes() {
        let discovery = MonitorError::from(DiscoveryError::DeviceNotFound {
            name: "zenergy".into(),
        });
        let initial = MonitorError::InitialRead(ReadError::Parse {
            text: "x".into(),
            source: "x".parse::<u64>().unwrap_err(),
        });
        assert_ne!(discovery.exit_code(), 0);
        assert_ne!(initial.exit_code(), 0);
        assert_ne!(discovery.exit_code(), initial.exit_code());
    }

    #[test]
    fn discovery_message_names_the_device() {
        let err = DiscoveryError::DeviceNotFound {
            name: "zenergy".into(),
        };
        assert!(err.to_string().contains("zenergy"));
    }
}
