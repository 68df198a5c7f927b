use arena_server::config::ServerConfig;
use arena_server::game_loop::{run_game_loop, GameCommand};
use arena_server::ws::{router, AppState};
use tokio::sync::mpsc;
use tower_http::cors::CorsLayer;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    // Validate configuration before starting
    if let Err(e) = config.validate() {
        tracing::error!("Invalid server configuration: {}", e);
        std::process::exit(1);
    }

    let listen_addr = config.listen_addr.clone();
    let (game_tx, game_rx) = mpsc::channel::<GameCommand>(config.command_queue_len);

    let app_state = AppState {
        game_tx,
        outbound_queue_len: config.outbound_queue_len,
    };

    // Spawn simulation loop
    tokio::spawn(async move {
        run_game_loop(game_rx, config).await;
    });

    let app = router(app_state).layer(CorsLayer::permissive());

    tracing::info!("Starting arena server on {}", listen_addr);

    let listener = match tokio::net::TcpListener::bind(&listen_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Cannot bind {}: {}", listen_addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
    }
}
