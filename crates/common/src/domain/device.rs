use crate::domain::result::DomainResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;

/// Location assigned to a device when provisioning does not name one
pub const DEFAULT_LOCATION: &str = "Cairo";

/// Reverse vending machine as exposed by the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub id: i64,
    pub name: String,
    pub location: String,
    pub is_active: bool,
    /// Most recent recorded use; `None` means the machine was never used
    pub last_usage: Option<DateTime<Utc>>,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.location)
    }
}

/// Provisioning input for a device; the store assigns the id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDevice {
    pub name: String,
    pub location: String,
    pub is_active: bool,
    pub last_usage: Option<DateTime<Utc>>,
}

impl NewDevice {
    /// Device with the store defaults: located in Cairo, active, never used
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: DEFAULT_LOCATION.to_string(),
            is_active: true,
            last_usage: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    pub fn with_last_usage(mut self, last_usage: Option<DateTime<Utc>>) -> Self {
        self.last_usage = last_usage;
        self
    }

    pub fn into_device(self, id: i64) -> Device {
        Device {
            id,
            name: self.name,
            location: self.location,
            is_active: self.is_active,
            last_usage: self.last_usage,
        }
    }
}

/// Repository input for fetching a single device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetDeviceRepoInput {
    pub device_id: i64,
}

/// Read side of the device store
/// Infrastructure layer (postgres, in-memory) implements this trait
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait DeviceRepository: Send + Sync {
    /// List every device with `is_active = true`; callers must not rely on the order
    async fn list_active_devices(&self) -> DomainResult<Vec<Device>>;

    /// Get an active device by id
    async fn get_active_device(&self, input: GetDeviceRepoInput) -> DomainResult<Option<Device>>;
}
