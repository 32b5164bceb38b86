//! postr entry point.
//!
//! Renders the view addressed by a location (default `/users`) to stdout.
//! Logging goes to stderr so the rendered view stays clean on stdout.

use anyhow::Result;
use postr_app::views::View;
use postr_app::{App, Location, text};
use postr_core::AppConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let location = std::env::args().nth(1).unwrap_or_else(|| "/users".to_string());
    let location = Location::parse(&location)?;

    tracing::info!("rendering {}", location);
    let app = App::from_config(&config, location)?;

    let output = match View::for_current(&app) {
        View::Users(mut view) => {
            let state = view.settle().await;
            let count = view.settle_count().await.data().map(|count| **count);
            text::users(&state, &view.pager(), count)
        }
        View::Posts(view) => text::posts(&view.settle().await),
    };
    println!("{output}");

    Ok(())
}
