//! 会话存储
//!
//! 进程内唯一的会话对象：启动时从持久化存储恢复，登录时写入，登出时清除。
//! 用户信息只有在两个令牌都已保存时才会出现，清除时三者一起清除。

use crate::error::Result;
use crate::navigation::{Destination, Navigator};
use crate::storage::{SessionStorage, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_DATA_KEY};
use crate::types::Identity;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

const SESSION_KEYS: [&str; 3] = [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_DATA_KEY];

/// 会话存储
pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
    navigator: Arc<dyn Navigator>,
    /// 当前登录用户
    identity: RwLock<Option<Identity>>,
}

impl SessionStore {
    /// 从持久化存储恢复会话
    ///
    /// 残缺的记录（缺少任一令牌或用户信息无法解析）会被清除。
    pub fn restore(storage: Arc<dyn SessionStorage>, navigator: Arc<dyn Navigator>) -> Result<Self> {
        let access = storage.get(ACCESS_TOKEN_KEY)?;
        let refresh = storage.get(REFRESH_TOKEN_KEY)?;
        let user_data = storage.get(USER_DATA_KEY)?;

        let identity = match (&access, &refresh, &user_data) {
            (Some(_), Some(_), Some(raw)) => match serde_json::from_str::<Identity>(raw) {
                Ok(identity) => Some(identity),
                Err(e) => {
                    warn!("Stored user data is unreadable, clearing session: {}", e);
                    None
                }
            },
            _ => None,
        };

        let has_any = access.is_some() || refresh.is_some() || user_data.is_some();
        if identity.is_none() && has_any {
            debug!("Discarding incomplete persisted session");
            storage.remove_many(&SESSION_KEYS)?;
        }

        if let Some(identity) = &identity {
            info!("Restored session for {}", identity.email);
        }

        Ok(Self {
            storage,
            navigator,
            identity: RwLock::new(identity),
        })
    }

    /// 登录：保存令牌与用户信息并激活会话
    pub async fn login(&self, access: &str, refresh: &str, identity: Identity) -> Result<()> {
        let user_data = serde_json::to_string(&identity)?;
        self.storage.set_many(&[
            (ACCESS_TOKEN_KEY, access),
            (REFRESH_TOKEN_KEY, refresh),
            (USER_DATA_KEY, &user_data),
        ])?;

        info!("Session started for {}", identity.email);
        *self.identity.write().await = Some(identity);
        Ok(())
    }

    /// 登出：清除会话并跳转到登录入口
    pub async fn logout(&self) -> Result<()> {
        self.clear().await?;
        info!("User logged out");
        self.navigator.navigate(Destination::Login);
        Ok(())
    }

    /// 会话无法恢复时调用：清除会话并跳转到登录入口
    pub(crate) async fn expire(&self) {
        if let Err(e) = self.clear().await {
            warn!("Failed to clear expired session: {}", e);
        }
        self.navigator.navigate(Destination::Login);
    }

    async fn clear(&self) -> Result<()> {
        let mut identity = self.identity.write().await;
        self.storage.remove_many(&SESSION_KEYS)?;
        *identity = None;
        Ok(())
    }

    /// 获取当前用户
    pub async fn identity(&self) -> Option<Identity> {
        self.identity.read().await.clone()
    }

    /// 是否已登录
    pub async fn is_active(&self) -> bool {
        self.identity.read().await.is_some()
    }

    /// 当前访问令牌（每次请求都从存储读取）
    pub fn access_token(&self) -> Result<Option<String>> {
        self.storage.get(ACCESS_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Result<Option<String>> {
        self.storage.get(REFRESH_TOKEN_KEY)
    }

    /// 保存刷新得到的访问令牌，仅供 HTTP 适配层调用
    pub(crate) fn store_access_token(&self, access: &str) -> Result<()> {
        self.storage.set(ACCESS_TOKEN_KEY, access)
    }

    pub(crate) fn storage(&self) -> &Arc<dyn SessionStorage> {
        &self.storage
    }
}
