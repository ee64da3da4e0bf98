//! 商城客户端
//!
//! 把会话、HTTP 适配层、缓存和各项操作组装在一起，供界面层使用。

use crate::auth::AuthService;
use crate::cache::QueryCache;
use crate::cart::{CartService, CartSummary};
use crate::checkout::CheckoutService;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::feed::{Feed, FeedState, LoadOutcome};
use crate::http::HttpClient;
use crate::navigation::{Navigator, NoopNavigator};
use crate::notice::{LogNotifier, Notice, Notifier};
use crate::orders::OrderService;
use crate::products::ProductPages;
use crate::promotion::{CouponState, PromotionResult, PromotionService};
use crate::session::SessionStore;
use crate::storage::{MemoryStorage, SessionStorage};
use crate::theme::Theme;
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{CartLine, CheckoutResponse, Identity, Order, Product};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// 商城客户端
pub struct Storefront {
    config: ClientConfig,
    session: Arc<SessionStore>,
    cache: QueryCache,
    notifier: Arc<dyn Notifier>,
    auth: AuthService,
    cart: CartService,
    promotion: PromotionService,
    checkout: CheckoutService,
    orders: OrderService,
    products: Feed<Product>,
    /// 当前优惠码
    coupon: Mutex<CouponState>,
}

impl Storefront {
    /// 创建客户端，启动时同步恢复已保存的会话
    pub fn new(
        config: ClientConfig,
        storage: Arc<dyn SessionStorage>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(&config)?);
        Self::with_transport(config, transport, storage, notifier, navigator)
    }

    /// 使用内存存储和默认配置创建客户端
    pub fn with_server_url(server_url: &str) -> Result<Self> {
        Self::new(
            ClientConfig::with_server_url(server_url),
            Arc::new(MemoryStorage::new()),
            Arc::new(LogNotifier),
            Arc::new(NoopNavigator),
        )
    }

    /// 使用指定的传输层创建客户端
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        storage: Arc<dyn SessionStorage>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let session = Arc::new(SessionStore::restore(storage, navigator.clone())?);
        let http = HttpClient::new(transport, session.clone());
        let cache = QueryCache::new(config.cache_ttl());

        let products = Feed::<Product>::new(Arc::new(ProductPages::new(
            http.clone(),
            cache.clone(),
            config.page_size,
        )));

        Ok(Self {
            auth: AuthService::new(http.clone(), notifier.clone()),
            cart: CartService::new(http.clone(), cache.clone(), notifier.clone()),
            promotion: PromotionService::new(http.clone(), notifier.clone()),
            checkout: CheckoutService::new(
                http.clone(),
                cache.clone(),
                notifier.clone(),
                navigator,
            ),
            orders: OrderService::new(http, cache.clone()),
            products,
            coupon: Mutex::new(CouponState::default()),
            config,
            session,
            cache,
            notifier,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // ===== 会话 =====

    pub async fn login(&self, email: &str, password: &str) -> Result<Identity> {
        let identity = self.auth.login(email, password).await?;
        // 上一个用户的购物车和订单不能留在缓存中
        self.cache.clear();
        Ok(identity)
    }

    pub async fn logout(&self) -> Result<()> {
        self.session.logout().await?;
        self.cache.clear();
        self.coupon.lock().await.clear();
        Ok(())
    }

    pub async fn identity(&self) -> Option<Identity> {
        self.session.identity().await
    }

    // ===== 商品 =====

    /// 加载下一页商品
    pub async fn load_more_products(&self) -> Result<LoadOutcome> {
        self.products.need_more().await.map_err(|e| {
            self.notifier
                .notify(Notice::error(e.user_message("Could not load products")));
            e
        })
    }

    pub async fn products(&self) -> Vec<Product> {
        self.products.items().await
    }

    pub async fn products_state(&self) -> FeedState {
        self.products.state().await
    }

    // ===== 购物车 =====

    /// 未登录时返回 `None`
    pub async fn cart(&self) -> Result<Option<Arc<Vec<CartLine>>>> {
        self.cart.lines().await
    }

    pub async fn cart_summary(&self) -> Result<Option<CartSummary>> {
        let Some(lines) = self.cart.lines().await? else {
            return Ok(None);
        };
        let coupon = self.coupon.lock().await;
        Ok(Some(CartSummary::compute(&lines, coupon.applied())))
    }

    pub async fn add_to_cart(&self, product_id: u64, quantity: u32) -> Result<()> {
        self.cart.add_to_cart(product_id, quantity).await
    }

    pub async fn remove_from_cart(&self, line_id: u64) -> Result<()> {
        self.cart.remove_from_cart(line_id).await
    }

    pub async fn update_quantity(&self, line_id: u64, quantity: i64) -> Result<()> {
        self.cart.update_quantity(line_id, quantity).await
    }

    // ===== 优惠券 =====

    /// 试试手气；中奖时优惠码自动生效
    pub async fn try_luck(&self) -> Result<PromotionResult> {
        let result = self.promotion.try_luck().await?;
        if let PromotionResult::Awarded { code, .. } = &result {
            self.coupon.lock().await.apply_awarded(code);
        }
        Ok(result)
    }

    /// 手动使用优惠码，是否有效由服务端在结算时判断
    pub async fn apply_coupon(&self, code: &str) -> Option<String> {
        let mut coupon = self.coupon.lock().await;
        coupon.set_input(code);
        let applied = coupon.apply_input().map(str::to_string);
        if applied.is_some() {
            self.notifier.notify(Notice::success("Coupon code added"));
        }
        applied
    }

    pub async fn coupon_state(&self) -> CouponState {
        self.coupon.lock().await.clone()
    }

    // ===== 结算与订单 =====

    /// 提交结算，成功后跳转到托管支付页
    pub async fn checkout(&self) -> Result<CheckoutResponse> {
        let code = self.coupon.lock().await.applied().map(str::to_string);
        let response = self.checkout.checkout(code.as_deref()).await?;
        info!("Redirecting to hosted checkout");
        self.coupon.lock().await.clear();
        Ok(response)
    }

    pub async fn orders(&self) -> Result<Arc<Vec<Order>>> {
        self.orders.orders().await
    }

    // ===== 主题 =====

    pub fn theme(&self) -> Result<Theme> {
        Theme::load(self.session.storage().as_ref())
    }

    pub fn set_theme(&self, theme: Theme) -> Result<()> {
        theme.save(self.session.storage().as_ref())
    }
}
