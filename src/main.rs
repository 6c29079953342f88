use foodgram::{config::Config, server::start_server};
use log::LevelFilter;
use simple_logger::SimpleLogger;

#[tokio::main]
async fn main() {
    if let Err(e) = SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .env()
        .init()
    {
        eprintln!("Failed to initialize logger: {e}");
    }

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = start_server(config).await {
        log::error!("Server stopped: {e}");
        std::process::exit(1);
    }
}
