use std::sync::Arc;

use user_registry::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    init_tracing(&config)?;

    let store = Arc::new(InMemoryUserStore::default());
    let state = AppState::new(config.clone(), store, Arc::new(SystemClock));

    Server::new(config).serve(app(state)).await?;

    shutdown_tracing();
    Ok(())
}
