use crate::domain::RvmService;
use crate::http::{run_http_server, HttpServerConfig};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// The catalog API as a runnable process
pub struct RvmApi {
    service: Arc<RvmService>,
    config: HttpServerConfig,
}

impl RvmApi {
    pub fn new(service: Arc<RvmService>, config: HttpServerConfig) -> Self {
        debug!("Initializing RVM API module");
        Self { service, config }
    }

    pub fn into_runner_process(
        self,
    ) -> impl FnOnce(CancellationToken) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>
    {
        move |ctx| Box::pin(async move { run_http_server(self.config, self.service, ctx).await })
    }
}
