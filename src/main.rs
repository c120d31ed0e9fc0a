use std::sync::Arc;

use anyhow::Context;
use log::{error, info};
use parking_lot::RwLock;
use tokio::{signal, task};
use tokio_util::sync::CancellationToken;

use network_dashboard::{
    DashboardConfig, Network, SharedNetwork, StatusReporter, dashboard, network,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = DashboardConfig::from_env()?;
    let net = Network::xor(config.rate, &mut rand::rng()).context("building network")?;
    let net: SharedNetwork = Arc::new(RwLock::new(net));

    let listener = dashboard::bind(&config.addr())
        .await
        .inspect_err(|e| error!("{e}"))?;

    let cancel = CancellationToken::new();
    let trainer = {
        let net = Arc::clone(&net);
        let cancel = cancel.clone();
        let (epochs, chunk) = (config.epochs, config.chunk);
        task::spawn_blocking(move || network::train_shared(&net, epochs, chunk, &cancel))
    };

    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("failed to listen for ctrl-c: {e}");
        }
        info!("received SIGINT, shutting down");
    };

    let served = StatusReporter::new(net)
        .serve_with_shutdown(listener, shutdown)
        .await
        .inspect_err(|e| error!("{e}"));

    cancel.cancel();
    trainer.await.context("training task panicked")?;

    served?;
    Ok(())
}
