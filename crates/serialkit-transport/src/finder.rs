use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// A registered tty driver and the device-node prefix its ports appear
/// under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Driver {
    pub name: String,
    pub device_root: String,
}

impl Driver {
    fn new(name: impl Into<String>, device_root: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            device_root: device_root.into(),
        }
    }

    /// Device nodes under `/dev` that belong to this driver.
    pub fn devices(&self) -> Vec<PathBuf> {
        self.devices_in(Path::new("/dev"))
    }

    fn devices_in(&self, dev_dir: &Path) -> Vec<PathBuf> {
        let entries = match fs::read_dir(dev_dir) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(?dev_dir, %err, "unable to list device directory");
                return Vec::new();
            }
        };
        entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.to_string_lossy().starts_with(&self.device_root))
            .inspect(|path| debug!(?path, driver = %self.name, "found device"))
            .collect()
    }
}

/// Discovers candidate serial device paths from the kernel's driver table.
///
/// Parses `/proc/tty/drivers`; when that is unreadable (non-Linux, locked
/// down procfs) a static table of common serial device prefixes is used
/// instead. No ordering of results is guaranteed.
pub struct SerialPortFinder {
    drivers_file: PathBuf,
}

impl SerialPortFinder {
    pub fn new() -> Self {
        Self {
            drivers_file: PathBuf::from("/proc/tty/drivers"),
        }
    }

    #[cfg(test)]
    fn with_drivers_file(path: impl Into<PathBuf>) -> Self {
        Self {
            drivers_file: path.into(),
        }
    }

    /// Serial drivers known to the kernel.
    pub fn drivers(&self) -> Vec<Driver> {
        match fs::read_to_string(&self.drivers_file) {
            Ok(contents) => contents.lines().filter_map(parse_driver_line).collect(),
            Err(err) => {
                warn!(%err, "unable to read tty driver table, using fallback drivers");
                default_drivers()
            }
        }
    }

    /// All candidate device paths, across all serial drivers.
    pub fn device_paths(&self) -> Vec<PathBuf> {
        self.drivers()
            .iter()
            .flat_map(|driver| driver.devices())
            .collect()
    }
}

impl Default for SerialPortFinder {
    fn default() -> Self {
        Self::new()
    }
}

/// One line of `/proc/tty/drivers`: the driver name occupies a fixed
/// 21-character column (it may contain spaces), the device root is the
/// fourth field from the end, and serial drivers carry a trailing `serial`
/// tag.
fn parse_driver_line(line: &str) -> Option<Driver> {
    if line.len() < 21 {
        return None;
    }
    let name = line[..21].trim();
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() >= 5 && *fields.last()? == "serial" {
        let device_root = fields[fields.len() - 4];
        debug!(driver = name, device_root, "found serial driver");
        Some(Driver::new(name, device_root))
    } else {
        None
    }
}

fn default_drivers() -> Vec<Driver> {
    vec![
        Driver::new("Serial", "/dev/ttyS"),
        Driver::new("USB", "/dev/ttyUSB"),
        Driver::new("ACM", "/dev/ttyACM"),
        Driver::new("AMA", "/dev/ttyAMA"),
        Driver::new("MXC", "/dev/ttymxc"),
        Driver::new("HS", "/dev/ttyHS"),
        Driver::new("SAC", "/dev/ttySAC"),
    ]
}
