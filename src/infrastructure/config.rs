//! 配置加载

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::app::cart::service::UnknownCartPolicy;
use crate::app::CartSettings;
use crate::core::chaos::{
    FaultInjector, SeededRandom, ThreadRandom, DEFAULT_FAILURE_RATE, DEFAULT_TIMEOUT_RATE,
};

/// 默认的配置文件查找路径
pub const CONFIG_PATHS: [&str; 2] = ["config.toml", "./config/config.toml"];

/// 系统配置结构
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub catalog: CatalogConfig,
    pub cart: CartConfig,
    pub chaos: ChaosConfig,
    pub logging: LoggingConfig,
}

/// HTTP 服务配置
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

/// 商品目录配置
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// 存放 categories.json 与 products.json 的目录
    pub data_dir: PathBuf,
}

/// 购物车配置
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CartConfig {
    /// 未知购物车 ID 时返回 404，而不是新建购物车
    pub reject_unknown_cart_ids: bool,
    /// 添加商品时校验商品存在
    pub validate_products_on_add: bool,
    /// 闲置超过该秒数的购物车会被清理，未设置则永不清理
    pub idle_ttl_seconds: Option<u64>,
    pub sweep_interval_seconds: u64,
}

/// 故障注入配置
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ChaosConfig {
    pub enabled: bool,
    pub failure_rate: f64,
    pub timeout_rate: f64,
    /// 设置后使用固定种子，便于复现
    pub seed: Option<u64>,
    pub exclude_paths: Vec<String>,
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别 (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            reject_unknown_cart_ids: false,
            validate_products_on_add: false,
            idle_ttl_seconds: None,
            sweep_interval_seconds: 60,
        }
    }
}

impl Default for ChaosConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            failure_rate: DEFAULT_FAILURE_RATE,
            timeout_rate: DEFAULT_TIMEOUT_RATE,
            seed: None,
            exclude_paths: Vec::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// 从配置文件加载配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::FileRead(e.to_string()))?;

        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        Ok(config)
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("HTTP端口必须大于0".to_string()));
        }
        if self.server.bind_address.is_empty() {
            return Err(ConfigError::Validation("绑定地址不能为空".to_string()));
        }

        let chaos = &self.chaos;
        for (name, rate) in [
            ("failure_rate", chaos.failure_rate),
            ("timeout_rate", chaos.timeout_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(ConfigError::Validation(format!(
                    "{} 必须位于 [0, 1] 区间: {}",
                    name, rate
                )));
            }
        }
        if chaos.failure_rate + chaos.timeout_rate > 1.0 {
            return Err(ConfigError::Validation(
                "failure_rate 与 timeout_rate 之和不能大于 1".to_string(),
            ));
        }

        if self.cart.sweep_interval_seconds == 0 {
            return Err(ConfigError::Validation("清理间隔必须大于0".to_string()));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "无效的日志级别: {}，有效值: {:?}",
                self.logging.level, valid_levels
            )));
        }

        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.bind_address, self.server.port)
    }

    pub fn cart_policy(&self) -> UnknownCartPolicy {
        if self.cart.reject_unknown_cart_ids {
            UnknownCartPolicy::Reject
        } else {
            UnknownCartPolicy::CreateNew
        }
    }

    pub fn cart_settings(&self) -> CartSettings {
        CartSettings {
            validate_products_on_add: self.cart.validate_products_on_add,
        }
    }

    /// 返回 (闲置上限, 清理间隔)，未配置闲置上限时返回 None
    pub fn eviction(&self) -> Option<(Duration, Duration)> {
        self.cart.idle_ttl_seconds.map(|ttl| {
            (
                Duration::from_secs(ttl),
                Duration::from_secs(self.cart.sweep_interval_seconds),
            )
        })
    }

    pub fn fault_injector(&self) -> FaultInjector {
        let chaos = &self.chaos;
        if !chaos.enabled {
            return FaultInjector::disabled();
        }

        let injector = match chaos.seed {
            Some(seed) => {
                FaultInjector::new(chaos.failure_rate, chaos.timeout_rate, SeededRandom::new(seed))
            }
            None => FaultInjector::new(chaos.failure_rate, chaos.timeout_rate, ThreadRandom),
        };
        injector.with_exclude_paths(chaos.exclude_paths.clone())
    }
}

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("文件读取错误: {0}")]
    FileRead(String),
    #[error("配置解析错误: {0}")]
    Parse(String),
    #[error("配置验证错误: {0}")]
    Validation(String),
}

/// 确定配置文件路径
///
/// 优先使用显式给出的路径，其次依次尝试 [`CONFIG_PATHS`]。
pub fn resolve_config_path(explicit: Option<PathBuf>) -> Option<PathBuf> {
    explicit.or_else(|| {
        CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    })
}

/// 加载并验证配置，未给出路径时使用默认配置
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let config = match path {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.catalog.data_dir, PathBuf::from("data"));
        assert_eq!(config.chaos.failure_rate, 0.10);
        assert_eq!(config.chaos.timeout_rate, 0.05);
        assert!(config.chaos.enabled);
        assert_eq!(config.cart_policy(), UnknownCartPolicy::CreateNew);
        assert!(config.eviction().is_none());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.chaos.failure_rate = 1.5;
        assert!(config.validate().is_err());

        config.chaos.failure_rate = 0.7;
        config.chaos.timeout_rate = 0.4;
        assert!(config.validate().is_err());

        config.chaos.timeout_rate = 0.3;
        assert!(config.validate().is_ok());

        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [chaos]
            failure_rate = 0.0
            timeout_rate = 0.0

            [cart]
            reject_unknown_cart_ids = true
            idle_ttl_seconds = 600
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.chaos.failure_rate, 0.0);
        assert!(config.chaos.enabled);
        assert_eq!(config.cart_policy(), UnknownCartPolicy::Reject);
        assert_eq!(
            config.eviction(),
            Some((Duration::from_secs(600), Duration::from_secs(60)))
        );
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("test_config.toml");
        fs::write(
            &config_path,
            r#"
            [server]
            port = 8080

            [chaos]
            seed = 7
            exclude_paths = ["/health"]
            "#,
        )
        .unwrap();

        let loaded = Config::load_from_file(&config_path).unwrap();
        assert_eq!(loaded.server.port, 8080);
        assert_eq!(loaded.chaos.seed, Some(7));
        assert_eq!(loaded.chaos.exclude_paths, vec!["/health".to_string()]);
        assert_eq!(loaded.logging, LoggingConfig::default());

        let via_loader = load_config(Some(config_path.as_path())).unwrap();
        assert_eq!(via_loader, loaded);
    }

    #[test]
    fn test_explicit_path_wins() {
        let explicit = PathBuf::from("/tmp/custom.toml");
        assert_eq!(
            resolve_config_path(Some(explicit.clone())),
            Some(explicit)
        );
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let result = load_config(Some(missing.as_path()));
        assert!(matches!(result, Err(ConfigError::FileRead(_))));
    }

    #[test]
    fn test_fault_injector_from_config() {
        let mut config = Config::default();
        config.chaos.enabled = false;
        assert!(!config.fault_injector().is_enabled());

        config.chaos.enabled = true;
        config.chaos.failure_rate = 1.0;
        config.chaos.timeout_rate = 0.0;
        let injector = config.fault_injector();
        assert_eq!(injector.failure_rate(), 1.0);
    }
}
