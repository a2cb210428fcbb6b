//! Storage service.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package switchboard-storage-demo -- start
//! cargo run --package switchboard-storage-demo -- get '"X"'
//! cargo run --package switchboard-storage-demo -- call '{"method":"post","data":"X"}'
//! ```

mod handlers;

use anyhow::Result;
use switchboard::prelude::*;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let service = Service::new("storage").load_config()?;
    let ctx = service.context();

    service
        .init_task(Task::new(|| async {
            info!("Storage is ready");
        }))
        .handlers(handlers::handlers(ctx))
        .middlewares(handlers::middlewares())
        .run()
        .await?;

    Ok(())
}
