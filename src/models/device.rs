//! Devices under test and the registry that orders them

use crate::error::{AppError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::OnceLock;

fn mac_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[0-9A-Fa-f]{2}(:[0-9A-Fa-f]{2}){5}$").ok())
        .as_ref()
}

/// Check that a string is a colon-separated 6-octet MAC address
pub fn is_valid_mac(mac: &str) -> bool {
    mac_pattern().is_some_and(|pattern| pattern.is_match(mac))
}

/// A device running the benchmark service.
///
/// Two devices are the same device when their MAC addresses match; the name
/// is only a display label and the IP address may change between runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub name: String,
    pub ip: String,
    pub mac: String,
}

impl Device {
    /// Create a device, validating and normalizing the MAC address to upper case
    pub fn new<N, I, M>(name: N, ip: I, mac: M) -> Result<Self>
    where
        N: Into<String>,
        I: Into<String>,
        M: AsRef<str>,
    {
        let mac = mac.as_ref().trim();
        if !is_valid_mac(mac) {
            return Err(AppError::discovery(format!("Invalid MAC address '{}'", mac)));
        }

        let name = name.into();
        if name.trim().is_empty() {
            return Err(AppError::discovery(format!("Device {} reported an empty name", mac)));
        }

        Ok(Self {
            name,
            ip: ip.into(),
            mac: mac.to_ascii_uppercase(),
        })
    }

    /// Parse the `/mac` endpoint body: the device name, a newline, the MAC address
    pub fn from_identity(ip: &str, body: &str) -> Result<Self> {
        let mut lines = body.trim().lines();
        let name = lines.next().map(str::trim).unwrap_or_default();
        let mac = lines.next().map(str::trim).ok_or_else(|| {
            AppError::discovery(format!(
                "Device at {} answered without a MAC address: {:?}",
                ip, body
            ))
        })?;

        Self::new(name, ip, mac)
    }
}

impl PartialEq for Device {
    fn eq(&self, other: &Self) -> bool {
        self.mac.eq_ignore_ascii_case(&other.mac)
    }
}

impl Eq for Device {}

impl Hash for Device {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.mac.to_ascii_uppercase().hash(state);
    }
}

/// Ordered set of devices taking part in a benchmark run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceRegistry {
    devices: Vec<Device>,
}

impl DeviceRegistry {
    /// Build a registry, rejecting invalid or duplicate MAC addresses
    pub fn new(devices: Vec<Device>) -> Result<Self> {
        let mut registry = Self::default();
        for device in devices {
            registry.push(device)?;
        }
        Ok(registry)
    }

    /// Append a device, keeping registration order
    pub fn push(&mut self, device: Device) -> Result<()> {
        if !is_valid_mac(&device.mac) {
            return Err(AppError::validation(format!(
                "Device '{}' has an invalid MAC address '{}'",
                device.name, device.mac
            )));
        }

        if let Some(existing) = self.devices.iter().find(|d| **d == device) {
            return Err(AppError::validation(format!(
                "Duplicate device {}: '{}' and '{}'",
                device.mac, existing.name, device.name
            )));
        }

        self.devices.push(Device {
            mac: device.mac.to_ascii_uppercase(),
            ..device
        });
        Ok(())
    }

    /// Load a registry from a JSON array of `{name, ip, mac}` objects
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::io(format!("Failed to read devices file {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let devices: Vec<Device> = serde_json::from_str(content)?;
        Self::new(devices)
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Device> {
        self.devices.iter()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Find a device by display name
    pub fn by_name(&self, name: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.name == name)
    }

    /// Find a device by MAC address, ignoring case
    pub fn by_mac(&self, mac: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.mac.eq_ignore_ascii_case(mac))
    }

    /// Every ordering of the registry, in lexicographic order of registry positions
    pub fn permutations(&self) -> Vec<Vec<Device>> {
        let mut result = Vec::new();
        let mut indices: Vec<usize> = (0..self.devices.len()).collect();

        loop {
            result.push(indices.iter().map(|&i| self.devices[i].clone()).collect());

            // Next lexicographic permutation of the index vector
            let pivot = match indices.windows(2).rposition(|w| w[0] < w[1]) {
                Some(pivot) => pivot,
                None => break,
            };
            let successor = indices
                .iter()
                .rposition(|&i| i > indices[pivot])
                .unwrap_or(pivot + 1);
            indices.swap(pivot, successor);
            indices[pivot + 1..].reverse();
        }

        result
    }
}

impl<'a> IntoIterator for &'a DeviceRegistry {
    type Item = &'a Device;
    type IntoIter = std::slice::Iter<'a, Device>;

    fn into_iter(self) -> Self::IntoIter {
        self.devices.iter()
    }
}
