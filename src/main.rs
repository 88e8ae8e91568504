use dotenv::dotenv;
use el_reenvio::engine::ForwardingEngine;

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();

    let engine = ForwardingEngine::new();

    if let Err(error) = engine.initialize().await {
        log::error!("Couldn't initialize the forwarding engine: {error}");
        return;
    }

    engine.start().await;

    match tokio::signal::ctrl_c().await {
        Ok(()) => log::info!("Shutting down"),
        Err(error) => log::error!("Failed to listen for the shutdown signal: {error}"),
    }

    engine.stop().await;
}
