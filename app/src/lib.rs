//! Pagesight command line and HTTP server.

pub mod args;
pub mod error;
pub mod routes;
pub mod startup;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the default filter. actix-web's request
/// logger emits `log` records, which the subscriber picks up as well.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,pagesight=debug,actix_web=info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}
