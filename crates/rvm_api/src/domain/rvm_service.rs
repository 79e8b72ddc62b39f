use chrono::{DateTime, Utc};
use common::domain::{Device, DeviceRepository, DomainError, DomainResult, GetDeviceRepoInput};
use std::sync::Arc;
use tracing::{debug, instrument};

use super::{sort_devices, DeviceQuery};

/// Read-only query engine over the device catalog
///
/// Every call reads a fresh snapshot of active devices from the repository,
/// filters it with the query's predicates and orders it. Nothing is cached
/// and nothing is written back.
pub struct RvmService {
    device_repository: Arc<dyn DeviceRepository>,
}

impl RvmService {
    pub fn new(device_repository: Arc<dyn DeviceRepository>) -> Self {
        Self { device_repository }
    }

    /// List active devices passing `query`, evaluated at `reference_time`
    #[instrument(skip(self, query), fields(predicates = query.predicates().len(), reference_time = %reference_time))]
    pub async fn list_devices(
        &self,
        query: &DeviceQuery,
        reference_time: DateTime<Utc>,
    ) -> DomainResult<Vec<Device>> {
        let candidates = self.device_repository.list_active_devices().await?;
        let fetched = candidates.len();

        let mut devices: Vec<Device> = candidates
            .into_iter()
            .filter(|device| device.is_active && query.matches(device, reference_time))
            .collect();
        sort_devices(&mut devices);

        debug!(fetched, matched = devices.len(), "listed devices");
        Ok(devices)
    }

    /// `list_devices` with the current time as reference
    pub async fn list_devices_now(&self, query: &DeviceQuery) -> DomainResult<Vec<Device>> {
        self.list_devices(query, Utc::now()).await
    }

    /// Fetch one active device; the query's predicates apply here too, so a
    /// device filtered out of the list is not found by id either
    #[instrument(skip(self, query, reference_time))]
    pub async fn get_device(
        &self,
        device_id: i64,
        query: &DeviceQuery,
        reference_time: DateTime<Utc>,
    ) -> DomainResult<Device> {
        let input = GetDeviceRepoInput { device_id };

        self.device_repository
            .get_active_device(input)
            .await?
            .filter(|device| device.is_active && query.matches(device, reference_time))
            .ok_or_else(|| DomainError::DeviceNotFound(device_id.to_string()))
    }

    pub async fn get_device_now(&self, device_id: i64, query: &DeviceQuery) -> DomainResult<Device> {
        self.get_device(device_id, query, Utc::now()).await
    }
}
