use crate::error::{DiscoveryError, ReadError};
use glob::{glob, Pattern};
use log::{debug, error, trace};
use std::fmt::{self, Display, Formatter};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

// Every sensor driver registers one hwmonN directory here. The N is assigned at
// probe time and changes between boots, so devices are matched on the content
// of their `name` attribute, never on the directory name.
pub const HWMON_DIR: &str = "/sys/class/hwmon";

const NAME_ATTRIBUTE: &str = "name";
const LABEL_SUFFIX: &str = "label";
const INPUT_SUFFIX: &str = "input";

/// A set of sensor devices, each with a name and labelled energy channels.
///
/// Ids are path-like: a device id is the grouping (directory) holding the
/// device's attributes, a channel id is the channel's label attribute.
pub trait EnumerableSensorNamespace {
    /// Every device grouping, in a stable order.
    fn list_devices(&self) -> Vec<PathBuf>;

    /// Label attributes of the energy channels belonging to `device`.
    fn list_channels(&self, device: &Path) -> Vec<PathBuf>;

    /// Raw text of a single attribute.
    fn read_attribute(&self, attribute: &Path) -> io::Result<String>;
}

/// The sysfs hwmon class directory.
#[derive(Debug, Clone)]
pub struct Hwmon {
    root: PathBuf,
}

impl Hwmon {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn expand(pattern: &str) -> Vec<PathBuf> {
        let mut paths = Vec::<PathBuf>::new();
        match glob(pattern) {
            Ok(entries) => {
                for entry in entries {
                    match entry {
                        Ok(p) => paths.push(p),
                        Err(e) => debug!("Skipping unreadable hwmon entry: {}", e),
                    }
                }
            }
            Err(e) => error!("Bad hwmon glob {pattern:?}: {e}"),
        }
        paths
    }
}

impl EnumerableSensorNamespace for Hwmon {
    fn list_devices(&self) -> Vec<PathBuf> {
        let root = Pattern::escape(&self.root.to_string_lossy());
        let devices: Vec<PathBuf> = Hwmon::expand(&format!("{root}/hwmon*/{NAME_ATTRIBUTE}"))
            .into_iter()
            .filter_map(|name_file| name_file.parent().map(Path::to_path_buf))
            .collect();
        trace!("hwmon devices: {:#?}", devices);
        devices
    }

    fn list_channels(&self, device: &Path) -> Vec<PathBuf> {
        let device = Pattern::escape(&device.to_string_lossy());
        Hwmon::expand(&format!("{device}/energy*_{LABEL_SUFFIX}"))
    }

    fn read_attribute(&self, attribute: &Path) -> io::Result<String> {
        fs::read_to_string(attribute)
    }
}

/// A located energy channel. `input` is the handle the counter is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub device: PathBuf,
    pub label: String,
    pub input: PathBuf,
}

impl Display for Channel {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.input.display(), self.label)
    }
}

/// Find the device named `capability_name` and, within it, the energy channel
/// labelled `channel_label`. First match wins at both levels.
///
/// Candidates that cannot be read are skipped, they never abort the scan.
pub fn locate<N: EnumerableSensorNamespace + ?Sized>(
    namespace: &N,
    capability_name: &str,
    channel_label: &str,
) -> Result<Channel, DiscoveryError> {
    let device = find_device(namespace, capability_name).ok_or_else(|| {
        DiscoveryError::DeviceNotFound {
            name: capability_name.to_owned(),
        }
    })?;
    debug!("Found {capability_name} at {}", device.display());

    for label_file in namespace.list_channels(&device) {
        let label = match namespace.read_attribute(&label_file) {
            Ok(text) => text.trim().to_owned(),
            Err(e) => {
                debug!("Skipping channel {}: {e}", label_file.display());
                continue;
            }
        };
        if label != channel_label {
            continue;
        }
        match input_from_label(&label_file) {
            Some(input) => {
                return Ok(Channel {
                    device,
                    label,
                    input,
                })
            }
            None => debug!("Label file {} has no suffix", label_file.display()),
        }
    }

    Err(DiscoveryError::ChannelNotFound {
        label: channel_label.to_owned(),
        device,
    })
}

fn find_device<N: EnumerableSensorNamespace + ?Sized>(
    namespace: &N,
    capability_name: &str,
) -> Option<PathBuf> {
    namespace.list_devices().into_iter().find(|device| {
        match namespace.read_attribute(&device.join(NAME_ATTRIBUTE)) {
            Ok(name) => name.trim() == capability_name,
            Err(e) => {
                debug!("Skipping device {}: {e}", device.display());
                false
            }
        }
    })
}

/// Turn `energyN_label` into its sibling `energyN_input`.
#[must_use]
pub fn input_from_label(label_file: &Path) -> Option<PathBuf> {
    let file_name = label_file.file_name()?.to_str()?;
    let (base, _) = file_name.rsplit_once('_')?;
    Some(label_file.with_file_name(format!("{base}_{INPUT_SUFFIX}")))
}

/// Summary of one device, for the `list_hwmon` diagnostic.
#[derive(Debug)]
pub struct DeviceSummary {
    pub device: PathBuf,
    pub name: Option<String>,
    pub channels: Vec<Channel>,
}

/// Describe every device and its labelled energy channels.
pub fn survey<N: EnumerableSensorNamespace + ?Sized>(namespace: &N) -> Vec<DeviceSummary> {
    namespace
        .list_devices()
        .into_iter()
        .map(|device| {
            let name = namespace
                .read_attribute(&device.join(NAME_ATTRIBUTE))
                .ok()
                .map(|n| n.trim().to_owned());
            let channels = namespace
                .list_channels(&device)
                .into_iter()
                .filter_map(|label_file| {
                    let label = namespace.read_attribute(&label_file).ok()?;
                    Some(Channel {
                        device: device.clone(),
                        label: label.trim().to_owned(),
                        input: input_from_label(&label_file)?,
                    })
                })
                .collect();
            DeviceSummary {
                device,
                name,
                channels,
            }
        })
        .collect()
}

/// Read a cumulative energy counter in µJ.
pub fn read_energy_uj(path: &Path) -> Result<u64, ReadError> {
    let text = fs::read_to_string(path).map_err(|source| ReadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let text = text.trim();
    text.parse::<u64>().map_err(|source| ReadError::Parse {
        text: text.to_owned(),
        source,
    })
}

/// Anything that yields successive readings of a cumulative energy counter.
pub trait EnergyCounter {
    fn read(&mut self) -> Result<u64, ReadError>;
}

/// The `energyN_input` file of a located channel.
#[derive(Debug, Clone)]
pub struct EnergyFile {
    path: PathBuf,
}

impl EnergyFile {
    #[must_use]
    pub fn new(channel: &Channel) -> Self {
        Self {
            path: channel.input.clone(),
        }
    }
}

impl EnergyCounter for EnergyFile {
    fn read(&mut self) -> Result<u64, ReadError> {
        read_energy_uj(&self.path)
    }
}
