//! 错误类型定义

use std::sync::Arc;
use thiserror::Error;

/// 错误类型
#[derive(Debug, Error)]
pub enum Error {
    /// 网络错误
    #[error("Network error: {0}")]
    Network(String),

    /// API 错误（非 2xx 响应）
    #[error("API error (HTTP {status}): {}", message.as_deref().unwrap_or("no message"))]
    Api {
        status: u16,
        message: Option<String>,
    },

    /// 401 且无法恢复
    #[error("Unauthorized")]
    Unauthorized,

    /// 未认证错误
    #[error("Not authenticated")]
    NotAuthenticated,

    /// 刷新令牌失败，会话已清除
    #[error("Session expired, please log in again")]
    SessionExpired,

    /// 参数错误
    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    /// 状态错误
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// 编解码错误
    #[error("Encoding/Decoding error: {0}")]
    Encoding(String),

    /// 持久化存储错误
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// 面向用户的提示文本：优先使用服务端返回的消息，否则使用 `fallback`
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Error::Api {
                message: Some(message),
                ..
            } => message.clone(),
            _ => fallback.to_string(),
        }
    }

    /// 是否为认证相关错误
    pub fn is_auth(&self) -> bool {
        match self {
            Error::Unauthorized | Error::NotAuthenticated | Error::SessionExpired => true,
            Error::Api { status, .. } => *status == 401,
            _ => false,
        }
    }

    /// 去重后的缓存请求共享同一个错误，按原变体还原
    pub(crate) fn from_shared(err: Arc<Error>) -> Self {
        Arc::try_unwrap(err).unwrap_or_else(|shared| Error::from(shared.as_ref()))
    }
}

impl From<&Error> for Error {
    fn from(err: &Error) -> Self {
        match err {
            Error::Network(msg) => Error::Network(msg.clone()),
            Error::Api { status, message } => Error::Api {
                status: *status,
                message: message.clone(),
            },
            Error::Unauthorized => Error::Unauthorized,
            Error::NotAuthenticated => Error::NotAuthenticated,
            Error::SessionExpired => Error::SessionExpired,
            Error::InvalidParam(msg) => Error::InvalidParam(msg.clone()),
            Error::InvalidState(msg) => Error::InvalidState(msg.clone()),
            Error::Encoding(msg) => Error::Encoding(msg.clone()),
            Error::Storage(msg) => Error::Storage(msg.clone()),
            Error::Io(e) => Error::Io(std::io::Error::new(e.kind(), e.to_string())),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Encoding(err.to_string())
    }
}

/// 结果类型
pub type Result<T> = std::result::Result<T, Error>;
