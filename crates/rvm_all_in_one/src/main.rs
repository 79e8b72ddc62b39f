mod config;

use common::domain::DeviceRepository;
use common::memory::{load_seed_file, InMemoryDeviceRepository};
use common::postgres::{PostgresClient, PostgresDeviceRepository};
use common::telemetry::{init_telemetry, shutdown_telemetry, TelemetryConfig, TelemetryProviders};
use crate::config::{ServiceConfig, StoreBackend};
use goose::MigrationRunner;
use rvm_api::domain::RvmService;
use rvm_api::http::{HttpLoggingConfig, HttpServerConfig};
use rvm_api::rvm_api::RvmApi;
use rvm_runner::Runner;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() {
    let config = match ServiceConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let telemetry_providers: Option<TelemetryProviders> = match init_telemetry(&TelemetryConfig {
        service_name: config.otel_service_name.clone(),
        otel_endpoint: config.otel_endpoint.clone(),
        otel_enabled: config.otel_enabled,
        log_level: config.log_level.clone(),
    }) {
        Ok(providers) => providers,
        Err(e) => {
            eprintln!("Failed to initialize telemetry: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        otel_enabled = config.otel_enabled,
        store_backend = %config.store_backend,
        "Starting rvm-all-in-one service"
    );
    debug!("Configuration: {:?}", config);

    let device_repository = match initialize_device_repository(&config).await {
        Ok(repository) => repository,
        Err(e) => {
            error!("Failed to initialize device store: {:#}", e);
            shutdown_telemetry(telemetry_providers);
            std::process::exit(1);
        }
    };

    let rvm_service = Arc::new(RvmService::new(device_repository));

    let http_config = HttpServerConfig {
        host: config.http_host.clone(),
        port: config.http_port,
        logging_config: HttpLoggingConfig::from_comma_separated(&config.http_ignored_paths),
    };
    let rvm_api = RvmApi::new(rvm_service, http_config);

    let runner = Runner::new()
        .with_named_process("rvm_api", rvm_api.into_runner_process())
        .with_closer(move || async move {
            info!("Running cleanup tasks...");
            // Flush pending traces and logs
            shutdown_telemetry(telemetry_providers);
            info!("Cleanup complete");
            Ok(())
        })
        .with_closer_timeout(Duration::from_secs(10));

    let exit_code = runner.run().await;
    std::process::exit(exit_code);
}

async fn initialize_device_repository(
    config: &ServiceConfig,
) -> anyhow::Result<Arc<dyn DeviceRepository>> {
    match config.store_backend()? {
        StoreBackend::Postgres => {
            info!("Initializing PostgreSQL...");
            let postgres_config = config.postgres_config();

            if config.run_migrations {
                let migrations = MigrationRunner::new(
                    config.postgres_goose_binary_path.clone(),
                    config.postgres_migrations_dir.clone(),
                    "postgres".to_string(),
                    postgres_config.dsn(),
                );
                migrations.run_migrations().await?;
            }

            let client = PostgresClient::new(&postgres_config)?;
            client.ping().await?;
            Ok(Arc::new(PostgresDeviceRepository::new(client)))
        }
        StoreBackend::Memory => {
            let repository = match &config.seed_file {
                Some(path) => {
                    let devices = load_seed_file(path)?;
                    info!(count = devices.len(), seed_file = %path, "Seeding in-memory device store");
                    InMemoryDeviceRepository::with_devices(devices).await
                }
                None => {
                    info!("Starting with an empty in-memory device store");
                    InMemoryDeviceRepository::new()
                }
            };
            Ok(Arc::new(repository))
        }
    }
}
