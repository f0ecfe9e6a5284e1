//! Configuration structs

mod app_config;

pub use app_config::{
    AppConfig, AppSettings, ConfigError, CorsConfig, DatabaseConfig, Environment, GatewayConfig,
    JwtConfig, LiveConfig, RateLimitConfig, RedisConfig, ServerConfig, SnowflakeConfig,
    StoreBackend, StoreConfig,
};
