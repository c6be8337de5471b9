pub mod toml_config;

pub use toml_config::AppConfig;

#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "foodwell")]
#[command(about = "Meal-planning and grocery-delivery API server")]
pub struct CliConfig {
    #[arg(long, default_value = "foodwell.toml")]
    pub config: String,

    #[arg(long, help = "Override server.bind")]
    pub bind: Option<String>,

    #[arg(long, help = "Override store.data_dir")]
    pub data_dir: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Validate the configuration, print it and exit")]
    pub dry_run: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 載入 TOML 後套用命令列覆寫
    pub fn load(&self) -> crate::Result<AppConfig> {
        let mut config = AppConfig::from_file(&self.config)?;
        if let Some(bind) = &self.bind {
            config.server.bind = bind.clone();
        }
        if let Some(data_dir) = &self.data_dir {
            config.store.data_dir = data_dir.clone();
        }
        Ok(config)
    }
}
