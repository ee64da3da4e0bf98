//! 客户端配置

use std::time::Duration;

/// 默认 API 地址
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000/api/v1";

/// 客户端配置
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// 服务器 URL（含 API 前缀）
    pub server_url: String,
    /// 请求超时（秒）
    pub timeout: u64,
    /// 是否验证 TLS 证书
    pub verify_tls: bool,
    /// 商品列表每页条数
    pub page_size: u32,
    /// 缓存条目有效期（秒）
    pub cache_ttl: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            timeout: 30,
            verify_tls: true,
            page_size: 12,
            cache_ttl: 300,
        }
    }
}

impl ClientConfig {
    /// 使用指定服务器地址，其余取默认值
    pub fn with_server_url(server_url: &str) -> Self {
        Self {
            server_url: server_url.trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }
}
