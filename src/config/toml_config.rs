use crate::utils::error::{FoodError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_range, validate_required_field,
    validate_url, Validate,
};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";
pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_AGENT_TIMEOUT_SECONDS: u64 = 180;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub hosted: Option<HostedConfig>,
    pub agents: AgentsConfig,
    pub auth: AuthConfig,
    pub time: TimeConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            cors_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    File,
    Hosted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub data_dir: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::File,
            data_dir: DEFAULT_DATA_DIR.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostedConfig {
    pub url: String,
    pub anon_key: String,
    /// 資料存取用的伺服器端金鑰；未設定時沿用 anon_key
    #[serde(default)]
    pub service_key: Option<String>,
}

impl HostedConfig {
    pub fn data_key(&self) -> &str {
        self.service_key.as_deref().unwrap_or(&self.anon_key)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentsConfig {
    pub recipe_url: Option<String>,
    pub recipe_api_key: Option<String>,
    pub ingredient_url: Option<String>,
    pub ingredient_api_key: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            recipe_url: None,
            recipe_api_key: None,
            ingredient_url: None,
            ingredient_api_key: None,
            timeout_seconds: DEFAULT_AGENT_TIMEOUT_SECONDS,
        }
    }
}

impl AgentsConfig {
    pub fn recipe_key(&self) -> Option<String> {
        resolved_key(&self.recipe_api_key)
    }

    pub fn ingredient_key(&self) -> Option<String> {
        resolved_key(&self.ingredient_api_key)
    }
}

/// 未解析的 `${VAR}` 視為未設定
fn resolved_key(value: &Option<String>) -> Option<String> {
    value
        .as_ref()
        .filter(|v| reject_unresolved("", v).is_ok())
        .cloned()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    Hosted,
    #[default]
    Static,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub provider: AuthProvider,
    /// token → 使用者 id
    pub tokens: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    pub utc_offset_minutes: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub level: Option<String>,
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| FoodError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${RECIPE_AGENT_API_KEY})；未定義者保留原字串
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| FoodError::ConfigValidationError {
            field: "env_substitution".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.server
            .bind
            .parse()
            .map_err(|e| FoodError::InvalidConfigValueError {
                field: "server.bind".to_string(),
                value: self.server.bind.clone(),
                reason: format!("{}", e),
            })
    }

    /// 統計用的本地時區
    pub fn utc_offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.time.utc_offset_minutes * 60).ok_or_else(|| {
            FoodError::InvalidConfigValueError {
                field: "time.utc_offset_minutes".to_string(),
                value: self.time.utc_offset_minutes.to_string(),
                reason: "Offset is out of range".to_string(),
            }
        })
    }

    pub fn validate_config(&self) -> Result<()> {
        self.socket_addr()?;
        for origin in &self.server.cors_origins {
            if origin != "*" {
                validate_url("server.cors_origins", origin)?;
            }
        }

        match self.store.backend {
            StoreBackend::File => validate_path("store.data_dir", &self.store.data_dir)?,
            StoreBackend::Hosted => self.validate_hosted()?,
        }

        match self.auth.provider {
            AuthProvider::Hosted => self.validate_hosted()?,
            AuthProvider::Static => {
                if self.auth.tokens.is_empty() {
                    return Err(FoodError::MissingConfigError {
                        field: "auth.tokens".to_string(),
                    });
                }
                for (token, user_id) in &self.auth.tokens {
                    reject_unresolved("auth.tokens", token)?;
                    validate_non_empty_string("auth.tokens", user_id)?;
                }
            }
        }

        if let Some(url) = &self.agents.recipe_url {
            validate_url("agents.recipe_url", url)?;
        }
        if let Some(url) = &self.agents.ingredient_url {
            validate_url("agents.ingredient_url", url)?;
        }
        validate_range("agents.timeout_seconds", self.agents.timeout_seconds, 1, 600)?;
        validate_range(
            "time.utc_offset_minutes",
            self.time.utc_offset_minutes,
            -720,
            840,
        )?;

        if let Some(level) = &self.logging.level {
            let valid_levels = ["trace", "debug", "info", "warn", "error"];
            if !valid_levels.contains(&level.as_str()) {
                return Err(FoodError::InvalidConfigValueError {
                    field: "logging.level".to_string(),
                    value: level.clone(),
                    reason: format!("Valid levels: {}", valid_levels.join(", ")),
                });
            }
        }

        Ok(())
    }

    fn validate_hosted(&self) -> Result<()> {
        let hosted = validate_required_field("hosted", &self.hosted)?;
        validate_url("hosted.url", &hosted.url)?;
        validate_non_empty_string("hosted.anon_key", &hosted.anon_key)?;
        reject_unresolved("hosted.anon_key", &hosted.anon_key)?;
        if let Some(key) = &hosted.service_key {
            reject_unresolved("hosted.service_key", key)?;
        }
        Ok(())
    }
}

/// 環境變數未設定時 `${VAR}` 會原樣保留，視為缺少設定
fn reject_unresolved(field: &str, value: &str) -> Result<()> {
    if value.starts_with("${") && value.ends_with('}') {
        return Err(FoodError::MissingConfigError {
            field: format!("{} ({})", field, value),
        });
    }
    Ok(())
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const FILE_CONFIG: &str = r#"
[server]
bind = "0.0.0.0:8080"

[store]
backend = "file"
data_dir = "./test-data"

[auth.tokens]
"dev-token" = "1"
"#;

    #[test]
    fn test_parse_file_backend_config() {
        let config = AppConfig::from_toml_str(FILE_CONFIG).unwrap();

        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.store.backend, StoreBackend::File);
        assert_eq!(config.auth.provider, AuthProvider::Static);
        assert_eq!(config.agents.timeout_seconds, DEFAULT_AGENT_TIMEOUT_SECONDS);
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("FOODWELL_TEST_AGENT_URL", "https://agents.example.com/run");

        let config = AppConfig::from_toml_str(&format!(
            "{}\n[agents]\nrecipe_url = \"${{FOODWELL_TEST_AGENT_URL}}\"\n",
            FILE_CONFIG
        ))
        .unwrap();
        assert_eq!(
            config.agents.recipe_url.as_deref(),
            Some("https://agents.example.com/run")
        );

        std::env::remove_var("FOODWELL_TEST_AGENT_URL");
    }

    #[test]
    fn test_hosted_backend_requires_hosted_section() {
        let config = AppConfig::from_toml_str(
            r#"
[store]
backend = "hosted"

[auth]
provider = "hosted"
"#,
        )
        .unwrap();

        let err = config.validate().unwrap_err();
        assert!(matches!(err, FoodError::MissingConfigError { .. }));
    }

    #[test]
    fn test_unresolved_key_is_rejected() {
        let config = AppConfig::from_toml_str(
            r#"
[store]
backend = "hosted"

[hosted]
url = "https://project.example.co"
anon_key = "${FOODWELL_TEST_UNSET_KEY}"

[auth]
provider = "hosted"
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_values() {
        let mut config = AppConfig::from_toml_str(FILE_CONFIG).unwrap();
        config.server.bind = "not-an-address".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::from_toml_str(FILE_CONFIG).unwrap();
        config.agents.timeout_seconds = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::from_toml_str(FILE_CONFIG).unwrap();
        config.logging.level = Some("loud".to_string());
        assert!(config.validate().is_err());

        let mut config = AppConfig::from_toml_str(FILE_CONFIG).unwrap();
        config.auth.tokens.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_example_config_is_valid() {
        let config =
            AppConfig::from_toml_str(include_str!("../../foodwell.example.toml")).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.auth.tokens.get("dev-driver-token").map(String::as_str), Some("d1"));
    }

    #[test]
    fn test_unresolved_agent_key_is_dropped() {
        let mut config = AppConfig::default();
        config.agents.recipe_api_key = Some("${FOODWELL_TEST_UNSET_AGENT_KEY}".to_string());
        config.agents.ingredient_api_key = Some("th-123".to_string());

        assert!(config.agents.recipe_key().is_none());
        assert_eq!(config.agents.ingredient_key().as_deref(), Some("th-123"));
    }

    #[test]
    fn test_utc_offset() {
        let mut config = AppConfig::default();
        config.time.utc_offset_minutes = -300;
        assert_eq!(config.utc_offset().unwrap().local_minus_utc(), -300 * 60);
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(FILE_CONFIG.as_bytes()).unwrap();

        let config = AppConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.store.data_dir, "./test-data");
    }
}
