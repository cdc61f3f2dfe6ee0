use crate::domain::query::BatchSize;
use std::env;
use thiserror::Error;

/// データベース接続設定を管理する構造体
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    pub max_connections: u32,
    /// 注文商品をIN句でまとめて取得する際の最大件数
    pub default_batch_fetch_size: BatchSize,
}

/// 設定エラー
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl DatabaseConfig {
    /// 環境変数から設定を読み取る
    /// 環境変数が設定されていない場合はデフォルト値を使用
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env::var("DATABASE_HOST").unwrap_or_else(|_| "localhost".to_string());

        let port = env::var("DATABASE_PORT")
            .unwrap_or_else(|_| "3306".to_string())
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidValue(format!("Invalid DATABASE_PORT: {}", e)))?;

        let database = env::var("DATABASE_NAME").unwrap_or_else(|_| "shop_db".to_string());

        let username = env::var("DATABASE_USER").unwrap_or_else(|_| "shop_user".to_string());

        let password =
            env::var("DATABASE_PASSWORD").unwrap_or_else(|_| "shop_password".to_string());

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()
            .map_err(|e| {
                ConfigError::InvalidValue(format!("Invalid DATABASE_MAX_CONNECTIONS: {}", e))
            })?;

        let default_batch_fetch_size = env::var("DATABASE_DEFAULT_BATCH_FETCH_SIZE")
            .unwrap_or_else(|_| BatchSize::DEFAULT.get().to_string())
            .parse::<usize>()
            .map_err(|e| e.to_string())
            .and_then(|size| BatchSize::new(size).map_err(|e| e.to_string()))
            .map_err(|e| {
                ConfigError::InvalidValue(format!(
                    "Invalid DATABASE_DEFAULT_BATCH_FETCH_SIZE: {}",
                    e
                ))
            })?;

        Ok(Self {
            host,
            port,
            database,
            username,
            password,
            max_connections,
            default_batch_fetch_size,
        })
    }

    /// MySQL接続文字列を生成
    pub fn connection_string(&self) -> String {
        format!(
            "mysql://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }
}
