use anyhow::Result;
use wayfinder_api::serve;
use wayfinder_core::ConciergeConfig;
use wayfinder_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("wayfinder_api");

    let config = ConciergeConfig::from_env();
    serve(&config).await
}
