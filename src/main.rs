mod app;
mod backend;
mod color;
mod config;
mod pipeline;
mod session;
mod theme;
mod views;
mod wheel;

use tracing_subscriber::EnvFilter;

use crate::backend::Backend;
use crate::config::AppConfig;

fn main() -> iced::Result {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = AppConfig::from_env();
    tracing::debug!(?config, "configuration");
    let backend = Backend::system(&config);

    app::run(config, backend)
}
