//! 订单历史（只读）

use crate::cache::{QueryCache, QueryKey};
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::transport::ApiRequest;
use crate::types::{Order, OrderStatus};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

pub const ORDERS_PATH: &str = "/orders/";

/// 服务端可能返回数组，也可能返回分页对象
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OrderList {
    Plain(Vec<Order>),
    Paged { results: Vec<Order> },
}

impl From<OrderList> for Vec<Order> {
    fn from(list: OrderList) -> Self {
        match list {
            OrderList::Plain(orders) => orders,
            OrderList::Paged { results } => results,
        }
    }
}

impl OrderStatus {
    /// 展示文案
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Payment Pending",
            OrderStatus::PaymentFailed => "Payment Failed",
            OrderStatus::Paid => "Processing",
            OrderStatus::Shipped => "In Transit",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled | OrderStatus::Refunded => "Cancelled",
            OrderStatus::Unknown => "Unknown",
        }
    }
}

/// 订单查询
#[derive(Clone)]
pub struct OrderService {
    http: HttpClient,
    cache: QueryCache,
}

impl OrderService {
    pub fn new(http: HttpClient, cache: QueryCache) -> Self {
        Self { http, cache }
    }

    /// 读取订单历史；会话失效后不再返回之前缓存的订单
    pub async fn orders(&self) -> Result<Arc<Vec<Order>>> {
        if !self.http.session().is_active().await {
            debug!("No active session, orders not fetched");
            return Err(Error::NotAuthenticated);
        }

        self.cache
            .get_or_fetch(QueryKey::Orders, || async {
                self.http
                    .execute::<OrderList>(ApiRequest::get(ORDERS_PATH))
                    .await
                    .map(Vec::from)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::{Destination, MockNavigator};
    use crate::session::SessionStore;
    use crate::storage::MemoryStorage;
    use crate::transport::{ApiResponse, Method, MockTransport};
    use crate::types::Identity;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio_test::assert_err;

    fn order_json(id: u64, status: &str) -> serde_json::Value {
        json!({
            "id": id,
            "status": status,
            "total_amount": "35.50",
            "discount_amount": "3.55",
            "final_amount": "31.95",
            "created_at": "2026-03-01T12:30:00Z",
            "items": [{
                "product": { "id": 1, "name": "Lamp", "description": "", "price": "10.00" },
                "quantity": 1,
                "price_at_purchase_time": "10.00"
            }]
        })
    }

    #[test]
    fn test_order_list_accepts_both_shapes() {
        let plain: OrderList =
            serde_json::from_value(json!([order_json(1, "PAID"), order_json(2, "SHIPPED")]))
                .unwrap();
        assert_eq!(Vec::from(plain).len(), 2);

        let paged: OrderList = serde_json::from_value(json!({
            "count": 1,
            "next": null,
            "results": [order_json(3, "DELIVERED")]
        }))
        .unwrap();
        let orders = Vec::from(paged);
        assert_eq!(orders[0].status, OrderStatus::Delivered);
        assert_eq!(orders[0].items.len(), 1);
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(OrderStatus::Paid.label(), "Processing");
        assert_eq!(OrderStatus::Refunded.label(), "Cancelled");
        assert_eq!(OrderStatus::PaymentFailed.label(), "Payment Failed");
    }

    #[tokio::test]
    async fn test_expired_session_hides_cached_orders() {
        let order_reads = AtomicUsize::new(0);
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|r| r.method == Method::Get && r.path == ORDERS_PATH)
            .times(2)
            .returning(move |_| {
                if order_reads.fetch_add(1, Ordering::SeqCst) == 0 {
                    Ok(ApiResponse::new(200, json!([order_json(1, "PAID")]).to_string()))
                } else {
                    Ok(ApiResponse::new(401, r#"{"detail":"Token expired"}"#))
                }
            });
        transport
            .expect_send()
            .withf(|r| r.method == Method::Post && r.path == "/auth/token/refresh/")
            .times(1)
            .returning(|_| Ok(ApiResponse::new(401, r#"{"detail":"Token is blacklisted"}"#)));

        let mut navigator = MockNavigator::new();
        navigator
            .expect_navigate()
            .withf(|d| *d == Destination::Login)
            .times(1)
            .return_const(());

        let session = Arc::new(
            SessionStore::restore(Arc::new(MemoryStorage::new()), Arc::new(navigator)).unwrap(),
        );
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

        let cache = QueryCache::new(Duration::from_secs(60));
        let http = HttpClient::new(Arc::new(transport), session);
        let service = OrderService::new(http, cache.clone());

        assert_eq!(service.orders().await.unwrap().len(), 1);

        // 模拟缓存过期，下一次读取触发刷新失败
        cache.invalidate(&[QueryKey::Orders]).await;
        let err = assert_err!(service.orders().await);
        assert!(matches!(err, Error::SessionExpired));

        // 会话已清除，不再发请求
        let err = assert_err!(service.orders().await);
        assert!(matches!(err, Error::NotAuthenticated));
    }
}
