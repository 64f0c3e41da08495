use clap::Parser;
use glpi_import::utils::logger;
use glpi_import::{ArbiterModule, CliConfig, ImportModule};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting glpi-import");

    let config = match cli.load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Failed to load configuration: {}", e);
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    // 建立模組時會驗證配置
    let mut module = match ImportModule::from_config(&config) {
        Ok(module) => module,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    if !module.init().await {
        tracing::error!("❌ Could not connect to {}", config.uri);
        std::process::exit(2);
    }

    let aggregate = module.get_objects().await;
    tracing::info!(
        "✅ Import completed: {} objects in {} collections",
        aggregate.total_items(),
        aggregate.collection_names().count()
    );

    let output = if cli.compact {
        serde_json::to_string(&aggregate)?
    } else {
        serde_json::to_string_pretty(&aggregate)?
    };
    println!("{}", output);

    Ok(())
}
