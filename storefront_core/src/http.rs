//! 带认证恢复的 HTTP 客户端
//!
//! 每个请求都从会话存储读取访问令牌并以 `Authorization: Bearer` 发送。
//! 首次请求收到 401 时，用刷新令牌换取新的访问令牌并重发一次；
//! 已重发过的请求不会再次重发。刷新失败会清除会话并跳转到登录入口。

use crate::error::{Error, Result};
use crate::session::SessionStore;
use crate::transport::{ApiRequest, ApiResponse, Transport};
use crate::types::RefreshResponse;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 刷新令牌接口
pub const REFRESH_PATH: &str = "/auth/token/refresh/";

/// 请求所处的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    Fresh,
    Retried,
}

/// HTTP 客户端适配层
#[derive(Clone)]
pub struct HttpClient {
    transport: Arc<dyn Transport>,
    session: Arc<SessionStore>,
}

impl HttpClient {
    pub fn new(transport: Arc<dyn Transport>, session: Arc<SessionStore>) -> Self {
        Self { transport, session }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// 发送请求，必要时刷新令牌后重发一次
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let mut attempt = Attempt::Fresh;
        loop {
            let mut outgoing = request.clone();
            outgoing.bearer = self.session.access_token()?;

            let response = self.transport.send(outgoing).await?;
            if !response.is_unauthorized() || attempt == Attempt::Retried {
                return Ok(response);
            }

            info!("Access token rejected for {}, refreshing", request.path);
            self.refresh_access_token().await?;
            attempt = Attempt::Retried;
        }
    }

    /// 不携带令牌、不做认证恢复的请求（登录等）
    pub async fn send_public(&self, request: ApiRequest) -> Result<ApiResponse> {
        self.transport.send(request).await
    }

    /// 发送请求并解析 JSON 响应
    pub async fn execute<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let response = self.send(request).await?;
        check(response)?.json()
    }

    /// 发送请求，只关心是否成功
    pub async fn execute_empty(&self, request: ApiRequest) -> Result<()> {
        let response = self.send(request).await?;
        check(response).map(|_| ())
    }

    async fn refresh_access_token(&self) -> Result<String> {
        let refresh = match self.session.refresh_token() {
            Ok(Some(token)) => token,
            Ok(None) => {
                warn!("No refresh token available, ending session");
                self.session.expire().await;
                return Err(Error::SessionExpired);
            }
            Err(e) => {
                warn!("Failed to read refresh token: {}", e);
                self.session.expire().await;
                return Err(Error::SessionExpired);
            }
        };

        let request =
            ApiRequest::post(REFRESH_PATH).json(serde_json::json!({ "refresh": refresh }));
        let access = match self.transport.send(request).await {
            Ok(response) if response.is_success() => response
                .json::<RefreshResponse>()
                .ok()
                .and_then(|data| data.access),
            Ok(response) => {
                debug!("Token refresh rejected with HTTP {}", response.status);
                None
            }
            Err(e) => {
                debug!("Token refresh request failed: {}", e);
                None
            }
        };

        match access {
            Some(access) => {
                self.session.store_access_token(&access)?;
                debug!("Access token refreshed");
                Ok(access)
            }
            None => {
                warn!("Session expired, logging out");
                self.session.expire().await;
                Err(Error::SessionExpired)
            }
        }
    }
}

/// 非 2xx 响应转换为错误
pub fn check(response: ApiResponse) -> Result<ApiResponse> {
    if response.is_success() {
        Ok(response)
    } else if response.is_unauthorized() {
        Err(Error::Unauthorized)
    } else {
        Err(response.into_error())
    }
}
