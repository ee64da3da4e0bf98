//! 页面跳转

/// 跳转目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// 登录入口
    Login,
    /// 应用外部页面（整页跳转，例如托管支付页）
    External(String),
}

/// 执行跳转的一方
#[cfg_attr(test, mockall::automock)]
pub trait Navigator: Send + Sync {
    fn navigate(&self, destination: Destination);
}

/// 不做任何跳转，仅记录日志
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn navigate(&self, destination: Destination) {
        tracing::debug!(?destination, "navigation ignored");
    }
}
