use chrono::{DateTime, Utc};
use common::domain::Device;
use serde::{Deserialize, Serialize};

/// Wire shape of a device; `last_usage` serializes as RFC 3339 UTC or null
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceResponse {
    pub id: i64,
    pub name: String,
    pub location: String,
    pub is_active: bool,
    pub last_usage: Option<DateTime<Utc>>,
}

impl From<Device> for DeviceResponse {
    fn from(device: Device) -> Self {
        DeviceResponse {
            id: device.id,
            name: device.name,
            location: device.location,
            is_active: device.is_active,
            last_usage: device.last_usage,
        }
    }
}
