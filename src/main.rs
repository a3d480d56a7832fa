//! # Node Image Updater
//!
//! Operator entrypoint. Configuration is read from the environment; see
//! [`node_image_updater::config`].

use anyhow::Result;
use node_image_updater::runtime::{initialize, run_watch_loop};

#[tokio::main]
async fn main() -> Result<()> {
    let init_result = initialize().await?;

    run_watch_loop(
        init_result.campaigns,
        init_result.reconciler,
        init_result.server_state,
    )
    .await
}
