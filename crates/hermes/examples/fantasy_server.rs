//! Serves the fantasy database over HTTP.
//!
//! ```text
//! HERMES__SERVER__HTTP_ADDR=127.0.0.1:8080 cargo run -p hermes --example fantasy_server
//! curl 'http://127.0.0.1:8080/authors/1?include=books,books.series'
//! ```
//!
//! Settings come from an optional `hermes.toml`, then `.env`, then
//! `HERMES__*` variables.

use std::sync::Arc;

use hermes::core::fixtures::{fantasy_resources, FantasyStore};
use hermes::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigLoader::new()
        .with_defaults()
        .with_optional_file("hermes.toml")?
        .with_dotenv()
        .with_env_prefix("HERMES")
        .load()?;
    init_logging(&config.logging.to_log_config())?;

    let store = Arc::new(FantasyStore::new());
    let api = fantasy_resources(&store)
        .into_iter()
        .fold(config.api.json_api(), JsonApiBuilder::resource)
        .build()?;
    tracing::info!(base_url = %config.api.base_url, "serving the fantasy database");

    Server::new(config.server, App::new(Arc::new(api))).run().await?;
    Ok(())
}
