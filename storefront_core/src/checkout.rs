//! 结算
//!
//! 提交当前使用的优惠码，成功后整页跳转到托管支付页。

use crate::cache::{QueryCache, QueryKey};
use crate::error::Result;
use crate::http::HttpClient;
use crate::navigation::{Destination, Navigator};
use crate::notice::{Notice, Notifier};
use crate::transport::ApiRequest;
use crate::types::CheckoutResponse;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

pub const CHECKOUT_PATH: &str = "/checkout/";

/// 结算操作
#[derive(Clone)]
pub struct CheckoutService {
    http: HttpClient,
    cache: QueryCache,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
}

impl CheckoutService {
    pub fn new(
        http: HttpClient,
        cache: QueryCache,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            http,
            cache,
            notifier,
            navigator,
        }
    }

    pub async fn checkout(&self, coupon_code: Option<&str>) -> Result<CheckoutResponse> {
        let request = ApiRequest::post(CHECKOUT_PATH).json(json!({ "coupon_code": coupon_code }));

        match self.http.execute::<CheckoutResponse>(request).await {
            Ok(response) => {
                info!(order_id = ?response.order_id, "Checkout session created");
                // 服务端已清空购物车并生成订单
                self.cache
                    .invalidate(&[QueryKey::Cart, QueryKey::Orders])
                    .await;
                self.navigator
                    .navigate(Destination::External(response.checkout_url.clone()));
                Ok(response)
            }
            Err(e) => {
                self.notifier
                    .notify(Notice::error(e.user_message("Checkout failed")));
                Err(e)
            }
        }
    }
}
