use clap::Parser;
use foodwell::config::toml_config::LogFormat;
use foodwell::utils::{logger, validation::Validate};
use foodwell::{AppState, CliConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let config = match cli.load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    // 初始化日誌
    match config.logging.format {
        LogFormat::Json if !cli.verbose => logger::init_json_logger(config.logging.level.as_deref()),
        _ => logger::init_cli_logger(cli.verbose, config.logging.level.as_deref()),
    }

    tracing::info!("Starting foodwell server");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if cli.dry_run {
        println!("✅ Configuration is valid");
        println!("🌐 Bind: {}", config.server.bind);
        println!("💾 Store: {:?} ({})", config.store.backend, config.store.data_dir);
        println!("🔑 Auth: {:?}", config.auth.provider);
        println!(
            "🤖 Recipe agent: {}",
            config.agents.recipe_url.as_deref().unwrap_or("(not configured)")
        );
        println!(
            "🛒 Ingredient agent: {}",
            config.agents.ingredient_url.as_deref().unwrap_or("(not configured)")
        );
        return Ok(());
    }

    let state = AppState::from_config(&config)?;
    let app = foodwell::build_app(state, &config.server.cors_origins);

    let listener = tokio::net::TcpListener::bind(config.socket_addr()?).await?;
    foodwell::app::serve(listener, app).await?;

    Ok(())
}
