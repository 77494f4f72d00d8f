use bookshelf::logger::Logger;
use bookshelf::{AppState, Args, Config, LibraryError, create_router};
use clap::Parser;
use log::{info, warn};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), LibraryError> {
    if let Err(e) = Logger::init() {
        eprintln!("Failed to initialize logger: {e}");
    }

    let config = Config::from_args(Args::parse());
    config.validate()?;

    let state = AppState::from_config(&config);
    if state.access.is_some() {
        info!("Password gate enabled");
    } else {
        warn!("No password configured, the library is open to anyone who can reach it");
    }

    let app = create_router(state);
    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!("Library '{}' serving {:?} on http://{}", config.site_title, config.base_dir, addr);
    axum::serve(listener, app)
        .await
        .map_err(|e| LibraryError::Server(e.to_string()))
}
