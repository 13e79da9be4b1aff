//! 应用配置加载和管理

use config::{Config, ConfigError, Environment, File};
use secrecy::SecretString;
use serde::Deserialize;
use std::env;

/// 环境变量前缀
pub const ENV_PREFIX: &str = "VERBENA";

/// 应用配置结构
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub redis: RedisSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub cache: CacheSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// 0 表示按 CPU 核数
    #[serde(default)]
    pub workers: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            workers: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
    #[serde(default)]
    pub require_ssl: bool,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            connect_timeout_seconds: 5,
            idle_timeout_seconds: 600,
            require_ssl: false,
        }
    }
}

/// Redis 配置（仅用于 KPI 缓存，可关闭）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RedisSettings {
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    /// `json` 或 `pretty`
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl LoggingSettings {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    /// KPI 快照缓存时间（秒）
    pub kpi_ttl_seconds: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            kpi_ttl_seconds: 60,
        }
    }
}

impl Settings {
    /// 从配置文件和环境变量加载配置
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("APP_ENV").unwrap_or_else(|_| "development".into());

        let settings = Config::builder()
            // 默认配置
            .add_source(File::with_name("config/default").required(false))
            // 按环境覆盖
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // 环境变量覆盖，前缀 VERBENA，分隔符 __
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// 获取数据库连接 URL（从环境变量）
    pub fn database_url() -> Result<SecretString, ConfigError> {
        env::var("DATABASE_URL")
            .map(SecretString::new)
            .map_err(|_| ConfigError::NotFound("DATABASE_URL".to_string()))
    }

    /// 获取 Redis 连接 URL（从环境变量）
    pub fn redis_url() -> Result<SecretString, ConfigError> {
        env::var("REDIS_URL")
            .map(SecretString::new)
            .map_err(|_| ConfigError::NotFound("REDIS_URL".to_string()))
    }

    /// 获取服务器地址
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 实际工作线程数
    pub fn worker_count(&self) -> usize {
        if self.server.workers == 0 {
            num_cpus::get()
        } else {
            self.server.workers
        }
    }
}
