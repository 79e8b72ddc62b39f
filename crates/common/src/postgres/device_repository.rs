use crate::domain::{Device, DeviceRepository, DomainError, DomainResult, GetDeviceRepoInput};
use crate::postgres::PostgresClient;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_postgres::Row;
use tracing::{debug, instrument};

/// Device row as stored in the `rvms` table
#[derive(Debug, Clone)]
pub struct DeviceRow {
    pub id: i64,
    pub name: String,
    pub location: String,
    pub is_active: bool,
    pub last_usage: Option<DateTime<Utc>>,
}

impl From<&Row> for DeviceRow {
    fn from(row: &Row) -> Self {
        DeviceRow {
            id: row.get(0),
            name: row.get(1),
            location: row.get(2),
            is_active: row.get(3),
            last_usage: row.get(4),
        }
    }
}

/// Convert database DeviceRow to domain Device
impl From<DeviceRow> for Device {
    fn from(row: DeviceRow) -> Self {
        Device {
            id: row.id,
            name: row.name,
            location: row.location,
            is_active: row.is_active,
            last_usage: row.last_usage,
        }
    }
}

/// PostgreSQL implementation of DeviceRepository trait
#[derive(Clone)]
pub struct PostgresDeviceRepository {
    client: PostgresClient,
}

impl PostgresDeviceRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DeviceRepository for PostgresDeviceRepository {
    #[instrument(skip(self))]
    async fn list_active_devices(&self) -> DomainResult<Vec<Device>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        // is_active is pushed down; ordering is applied again by the query engine
        let rows = conn
            .query(
                "SELECT id, name, location, is_active, last_usage
                 FROM rvms
                 WHERE is_active = TRUE
                 ORDER BY last_usage DESC NULLS LAST, id ASC",
                &[],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        let devices: Vec<Device> = rows
            .iter()
            .map(|row| DeviceRow::from(row).into())
            .collect();

        debug!("found {} active devices", devices.len());

        Ok(devices)
    }

    #[instrument(skip(self, input), fields(device_id = input.device_id))]
    async fn get_active_device(&self, input: GetDeviceRepoInput) -> DomainResult<Option<Device>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let row = conn
            .query_opt(
                "SELECT id, name, location, is_active, last_usage
                 FROM rvms
                 WHERE id = $1 AND is_active = TRUE",
                &[&input.device_id],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(row.map(|row| DeviceRow::from(&row).into()))
    }
}
