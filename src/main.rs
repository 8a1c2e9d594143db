//! wirebox CLI entry point

use clap::Parser;
use wirebox::cli::{Args, CliApp};
use wirebox::config::{AppConfig, ConfigLoader};
use wirebox::logging::{init_logging, LoggingConfig};

fn load_config(args: &Args) -> anyhow::Result<AppConfig> {
    let config = match &args.config {
        Some(path) => ConfigLoader::with_file(path).load_config()?,
        None => AppConfig::load()?,
    };
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ 配置加载失败: {e}");
            return Err(e);
        }
    };

    let mut logging = LoggingConfig::from_settings(&config.logging).map_err(anyhow::Error::msg)?;
    if args.verbose {
        logging = logging.verbose();
    }
    if let Err(e) = init_logging(logging) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let app = CliApp::new(args, config);
    app.bootstrap()?;

    let result = app.run();
    app.shutdown();
    result
}
