use crate::domain::{Device, DeviceRepository, DomainResult, GetDeviceRepoInput, NewDevice};
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

/// In-memory implementation of `DeviceRepository`
///
/// Ids are assigned sequentially starting at 1 and never reused.
pub struct InMemoryDeviceRepository {
    state: RwLock<State>,
}

struct State {
    devices: Vec<Device>,
    next_id: i64,
}

impl InMemoryDeviceRepository {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State {
                devices: Vec::new(),
                next_id: 1,
            }),
        }
    }

    /// Build a store holding the given devices, in order
    pub async fn with_devices(devices: impl IntoIterator<Item = NewDevice>) -> Self {
        let repository = Self::new();
        for device in devices {
            repository.insert(device).await;
        }
        repository
    }

    /// Provision a device and return it with its assigned id
    pub async fn insert(&self, device: NewDevice) -> Device {
        let mut state = self.state.write().await;
        let id = state.next_id;
        state.next_id += 1;

        let device = device.into_device(id);
        state.devices.push(device.clone());
        debug!(device_id = id, "inserted device");
        device
    }
}

impl Default for InMemoryDeviceRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeviceRepository for InMemoryDeviceRepository {
    async fn list_active_devices(&self) -> DomainResult<Vec<Device>> {
        let state = self.state.read().await;
        Ok(state
            .devices
            .iter()
            .filter(|device| device.is_active)
            .cloned()
            .collect())
    }

    async fn get_active_device(&self, input: GetDeviceRepoInput) -> DomainResult<Option<Device>> {
        let state = self.state.read().await;
        Ok(state
            .devices
            .iter()
            .find(|device| device.id == input.device_id && device.is_active)
            .cloned())
    }
}
