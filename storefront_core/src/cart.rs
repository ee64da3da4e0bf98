//! 购物车
//!
//! 购物车数据归服务端所有，客户端只持有缓存副本。任何一次写操作成功后，
//! 整个购物车缓存失效，下一次读取重新拉取，不做局部修补，也不做乐观更新。

use crate::cache::{QueryCache, QueryKey};
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::notice::{Notice, Notifier};
use crate::transport::ApiRequest;
use crate::types::CartLine;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

pub const CART_PATH: &str = "/cart/";

/// 优惠券折扣比例（百分比），仅用于展示，最终金额以服务端结算为准
pub const COUPON_DISCOUNT_PERCENT: i64 = 10;

fn cart_item_path(line_id: u64) -> String {
    format!("/cart/item/{}/", line_id)
}

/// 数量最小为 1
pub fn clamp_quantity(quantity: i64) -> u32 {
    u32::try_from(quantity.max(1)).unwrap_or(u32::MAX)
}

/// 购物车操作
#[derive(Clone)]
pub struct CartService {
    http: HttpClient,
    cache: QueryCache,
    notifier: Arc<dyn Notifier>,
}

impl CartService {
    pub fn new(http: HttpClient, cache: QueryCache, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            http,
            cache,
            notifier,
        }
    }

    /// 读取购物车；未登录时不发请求，返回 `None`
    pub async fn lines(&self) -> Result<Option<Arc<Vec<CartLine>>>> {
        if !self.http.session().is_active().await {
            debug!("No active session, cart not fetched");
            return Ok(None);
        }

        let lines = self
            .cache
            .get_or_fetch(QueryKey::Cart, || {
                self.http
                    .execute::<Vec<CartLine>>(ApiRequest::get(CART_PATH))
            })
            .await?;
        Ok(Some(lines))
    }

    /// 加入购物车（已有则累加数量）
    pub async fn add_to_cart(&self, product_id: u64, quantity: u32) -> Result<()> {
        if quantity == 0 {
            self.notifier.notify(Notice::error("Quantity must be at least 1"));
            return Err(Error::InvalidParam("quantity must be at least 1".to_string()));
        }

        let request = ApiRequest::post(CART_PATH).json(json!({
            "product_id": product_id,
            "quantity": quantity,
        }));

        match self.http.execute_empty(request).await {
            Ok(()) => {
                info!("Added product {} x{} to cart", product_id, quantity);
                self.cache.invalidate(&[QueryKey::Cart]).await;
                self.notifier.notify(Notice::success("Added to bag"));
                Ok(())
            }
            Err(e) => {
                let message = if e.is_auth() {
                    "Please login to add items".to_string()
                } else {
                    e.user_message("Could not add item")
                };
                self.notifier.notify(Notice::error(message));
                Err(e)
            }
        }
    }

    /// 删除购物车条目
    pub async fn remove_from_cart(&self, line_id: u64) -> Result<()> {
        match self
            .http
            .execute_empty(ApiRequest::delete(cart_item_path(line_id)))
            .await
        {
            Ok(()) => {
                info!("Removed cart line {}", line_id);
                self.cache.invalidate(&[QueryKey::Cart]).await;
                Ok(())
            }
            Err(e) => {
                self.notifier
                    .notify(Notice::error(e.user_message("Could not remove item")));
                Err(e)
            }
        }
    }

    /// 修改数量，小于 1 的数量按 1 提交
    pub async fn update_quantity(&self, line_id: u64, quantity: i64) -> Result<()> {
        let quantity = clamp_quantity(quantity);
        let request =
            ApiRequest::patch(cart_item_path(line_id)).json(json!({ "quantity": quantity }));

        match self.http.execute_empty(request).await {
            Ok(()) => {
                debug!("Cart line {} quantity set to {}", line_id, quantity);
                self.cache.invalidate(&[QueryKey::Cart]).await;
                Ok(())
            }
            Err(e) => {
                self.notifier.notify(Notice::error("Could not update quantity"));
                Err(e)
            }
        }
    }
}

/// 购物车金额汇总（展示用）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSummary {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub coupon: Option<String>,
}

impl CartSummary {
    /// 小计取服务端给出的各行小计之和；有优惠券时折扣为小计的 10%
    pub fn compute(lines: &[CartLine], coupon: Option<&str>) -> Self {
        let subtotal: Decimal = lines.iter().map(|line| line.subtotal).sum();
        let discount = match coupon {
            Some(_) => (subtotal * Decimal::new(COUPON_DISCOUNT_PERCENT, 2))
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
            None => Decimal::ZERO,
        };

        Self {
            subtotal,
            discount,
            total: subtotal - discount,
            coupon: coupon.map(str::to_string),
        }
    }

    pub fn item_count(lines: &[CartLine]) -> u64 {
        lines.iter().map(|line| u64::from(line.quantity)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::NoopNavigator;
    use crate::notice::{MockNotifier, NoticeLevel};
    use crate::session::SessionStore;
    use crate::storage::MemoryStorage;
    use crate::transport::{ApiResponse, Method, MockTransport};
    use crate::types::{Identity, Product};
    use std::str::FromStr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio_test::{assert_err, assert_ok};

    fn line(id: u64, subtotal: &str) -> CartLine {
        CartLine {
            id,
            product: Product {
                id,
                name: format!("Product {}", id),
                description: String::new(),
                price: Decimal::from_str(subtotal).unwrap(),
                thumbnail_url: None,
            },
            quantity: 1,
            subtotal: Decimal::from_str(subtotal).unwrap(),
        }
    }

    async fn service(
        transport: MockTransport,
        notifier: MockNotifier,
        logged_in: bool,
    ) -> CartService {
        let session = Arc::new(
            SessionStore::restore(Arc::new(MemoryStorage::new()), Arc::new(NoopNavigator))
                .unwrap(),
        );
        if logged_in {
            session
                .login(
                    "a",
                    "r",
                    Identity {
                        id: 1,
                        email: "ada@example.com".to_string(),
                    },
                )
                .await
                .unwrap();
        }
        CartService::new(
            HttpClient::new(Arc::new(transport), session),
            QueryCache::new(Duration::from_secs(60)),
            Arc::new(notifier),
        )
    }

    fn cart_body() -> String {
        json!([{
            "id": 5,
            "product": { "id": 1, "name": "Lamp", "description": "", "price": "10.00" },
            "quantity": 1,
            "subtotal": "10.00"
        }])
        .to_string()
    }

    #[test]
    fn test_summary_with_coupon() {
        let lines = vec![line(1, "10.00"), line(2, "25.50")];
        let summary = CartSummary::compute(&lines, Some("LUCKY-10-AB12"));
        assert_eq!(summary.subtotal, Decimal::from_str("35.50").unwrap());
        assert_eq!(summary.discount, Decimal::from_str("3.55").unwrap());
        assert_eq!(summary.total, Decimal::from_str("31.95").unwrap());
    }

    #[test]
    fn test_summary_without_coupon() {
        let lines = vec![line(1, "10.00"), line(2, "25.50")];
        let summary = CartSummary::compute(&lines, None);
        assert_eq!(summary.discount, Decimal::ZERO);
        assert_eq!(summary.total, summary.subtotal);
        assert_eq!(CartSummary::item_count(&lines), 2);
    }

    #[test]
    fn test_discount_rounds_to_cents() {
        let summary = CartSummary::compute(&[line(1, "0.05")], Some("CODE"));
        assert_eq!(summary.discount, Decimal::from_str("0.01").unwrap());
        assert_eq!(summary.total, Decimal::from_str("0.04").unwrap());
    }

    #[test]
    fn test_clamp_quantity() {
        assert_eq!(clamp_quantity(0), 1);
        assert_eq!(clamp_quantity(-3), 1);
        assert_eq!(clamp_quantity(4), 4);
    }

    #[tokio::test]
    async fn test_logged_out_cart_is_not_fetched() {
        let cart = service(MockTransport::new(), MockNotifier::new(), false).await;
        assert!(cart.lines().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mutation_invalidates_cart() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let mut transport = MockTransport::new();
        {
            let fetches = fetches.clone();
            transport
                .expect_send()
                .withf(|r| r.method == Method::Get && r.path == CART_PATH)
                .times(2)
                .returning(move |_| {
                    fetches.fetch_add(1, Ordering::SeqCst);
                    Ok(ApiResponse::new(200, cart_body()))
                });
        }
        transport
            .expect_send()
            .withf(|r| {
                r.method == Method::Post
                    && r.path == CART_PATH
                    && r.body == Some(json!({ "product_id": 1, "quantity": 2 }))
            })
            .times(1)
            .returning(|_| Ok(ApiResponse::new(201, "{}")));

        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|n| n.level == NoticeLevel::Success && n.title == "Added to bag")
            .times(1)
            .return_const(());

        let cart = service(transport, notifier, true).await;
        cart.lines().await.unwrap();
        cart.lines().await.unwrap();
        assert_eq!(fetches.load(Ordering::SeqCst), 1);

        assert_ok!(cart.add_to_cart(1, 2).await);

        let lines = cart.lines().await.unwrap().unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_update_quantity_submits_clamped_value() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|r| {
                r.method == Method::Patch
                    && r.path == "/cart/item/5/"
                    && r.body == Some(json!({ "quantity": 1 }))
            })
            .times(1)
            .returning(|_| Ok(ApiResponse::new(200, "{}")));

        let cart = service(transport, MockNotifier::new(), true).await;
        assert_ok!(cart.update_quantity(5, 0).await);
    }

    #[tokio::test]
    async fn test_failed_add_leaves_cache_untouched() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|r| r.method == Method::Get)
            .times(1)
            .returning(|_| Ok(ApiResponse::new(200, cart_body())));
        transport
            .expect_send()
            .withf(|r| r.method == Method::Post)
            .times(1)
            .returning(|_| {
                Ok(ApiResponse::new(
                    404,
                    json!({ "detail": "No Product matches the given query." }).to_string(),
                ))
            });

        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|n| {
                n.level == NoticeLevel::Error && n.title == "No Product matches the given query."
            })
            .times(1)
            .return_const(());

        let cart = service(transport, notifier, true).await;
        cart.lines().await.unwrap();
        assert_err!(cart.add_to_cart(999, 1).await);

        // 仍然命中缓存
        assert_eq!(cart.lines().await.unwrap().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_and_update_failures_notify() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|r| r.method == Method::Delete && r.path == "/cart/item/8/")
            .times(1)
            .returning(|_| Ok(ApiResponse::new(204, "")));
        transport
            .expect_send()
            .withf(|r| r.method == Method::Patch)
            .times(1)
            .returning(|_| Ok(ApiResponse::new(400, r#"{"quantity":["Too many"]}"#)));

        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|n| n.title == "Could not update quantity")
            .times(1)
            .return_const(());

        let cart = service(transport, notifier, true).await;
        assert_ok!(cart.remove_from_cart(8).await);
        assert_err!(cart.update_quantity(8, 3).await);
    }

    #[tokio::test]
    async fn test_logged_out_add_asks_to_login() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|r| r.method == Method::Post && r.path == CART_PATH && r.bearer.is_none())
            .times(1)
            .returning(|_| {
                Ok(ApiResponse::new(
                    401,
                    json!({ "detail": "Authentication credentials were not provided." })
                        .to_string(),
                ))
            });

        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|n| n.level == NoticeLevel::Error && n.title == "Please login to add items")
            .times(1)
            .return_const(());

        let cart = service(transport, notifier, false).await;
        let err = assert_err!(cart.add_to_cart(1, 1).await);
        assert!(err.is_auth());
    }
}
