//! 商城客户端核心库
//!
//! 提供商城前端的数据与会话层，包括：
//! - 带令牌刷新的 HTTP 客户端
//! - 持久化会话
//! - 服务端数据缓存与分页商品列表
//! - 购物车、幸运优惠券、结算与订单

pub mod auth;
pub mod cache;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod feed;
pub mod http;
pub mod navigation;
pub mod notice;
pub mod orders;
pub mod products;
pub mod promotion;
pub mod session;
pub mod storage;
pub mod storefront;
pub mod theme;
pub mod transport;
pub mod types;

pub use cart::CartSummary;
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use feed::{FeedState, LoadOutcome};
pub use navigation::{Destination, Navigator};
pub use notice::{Notice, NoticeLevel, Notifier};
pub use promotion::{CouponState, PromotionResult};
pub use storage::{FileStorage, MemoryStorage, SessionStorage};
pub use storefront::Storefront;
pub use theme::Theme;
pub use transport::{ApiRequest, ApiResponse, Method, Transport};
pub use types::*;
