mod app;
mod commands;
mod config;
mod logging;
mod recording;
mod ui;
mod upload;

#[tokio::main]
async fn main() {
    if let Err(e) = app::run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
