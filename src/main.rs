use clap::Parser;
use enrollment_dashboard::app;
use enrollment_dashboard::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();
    log::info!(
        "starting dashboard on {} with data from {}",
        config.bind,
        config.data_url
    );

    app::run(config).await
}
