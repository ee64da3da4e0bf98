//! 登录

use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::notice::{Notice, Notifier};
use crate::transport::ApiRequest;
use crate::types::{Identity, LoginResponse};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

pub const LOGIN_PATH: &str = "/auth/login/";

/// 登录操作
#[derive(Clone)]
pub struct AuthService {
    http: HttpClient,
    notifier: Arc<dyn Notifier>,
}

impl AuthService {
    pub fn new(http: HttpClient, notifier: Arc<dyn Notifier>) -> Self {
        Self { http, notifier }
    }

    /// 用户登录（账号不存在时服务端会自动注册）
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity> {
        info!("Logging in user: {}", email);

        match self.request_tokens(email, password).await {
            Ok(data) => {
                let identity = data.identity();
                self.http
                    .session()
                    .login(&data.tokens.access, &data.tokens.refresh, identity.clone())
                    .await?;
                let message = if data.message.is_empty() {
                    "Logged in".to_string()
                } else {
                    data.message
                };
                self.notifier.notify(Notice::success(message));
                Ok(identity)
            }
            Err(e) => {
                self.notifier
                    .notify(Notice::error(e.user_message("Authentication failed")));
                Err(e)
            }
        }
    }

    async fn request_tokens(&self, email: &str, password: &str) -> Result<LoginResponse> {
        if email.is_empty() || password.is_empty() {
            return Err(Error::InvalidParam(
                "email and password are required".to_string(),
            ));
        }

        let request = ApiRequest::post(LOGIN_PATH).json(json!({
            "email": email,
            "password": password,
        }));
        let response = self.http.send_public(request).await?;
        if !response.is_success() {
            return Err(response.into_error());
        }
        response.json()
    }
}
