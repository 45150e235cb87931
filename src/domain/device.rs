use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Device {
    pub uuid: String,
    pub name: String,
}

/// Read-only lookup from device uuid to its human readable name.
#[derive(Debug, Clone, Default)]
pub struct DeviceDirectory {
    names: HashMap<String, String>,
}

impl DeviceDirectory {
    pub fn new(devices: Vec<Device>) -> Self {
        DeviceDirectory {
            names: devices.into_iter().map(|device| (device.uuid, device.name)).collect(),
        }
    }

    /// Returns the device name, or the uuid itself when the device is unknown.
    pub fn display_name<'a>(&'a self, uuid: &'a str) -> &'a str {
        self.names.get(uuid).map(String::as_str).unwrap_or(uuid)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }
}
