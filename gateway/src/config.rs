use attendance_service::AttendanceConfig;
use directory::DirectoryConfig;
use store::StoreConfig;

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// HTTP listen address
    pub http_addr: String,

    /// Gateway version
    pub version: String,

    pub attendance: AttendanceConfig,

    pub store: StoreConfig,

    pub directory: DirectoryConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            http_addr: "127.0.0.1:8080".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            attendance: AttendanceConfig::default(),
            store: StoreConfig::default(),
            directory: DirectoryConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("HTTP_ADDR") {
            config.http_addr = addr;
        }

        config.attendance = AttendanceConfig::from_env();
        config.store = StoreConfig::from_env();
        config.directory = DirectoryConfig::from_env();

        config
    }
}
