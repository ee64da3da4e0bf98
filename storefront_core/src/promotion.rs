//! 幸运优惠券
//!
//! 是否中奖、中奖概率全部由服务端决定，客户端只展示结果；
//! 中奖时把优惠码填入并视为已使用。

use crate::error::Result;
use crate::http::HttpClient;
use crate::notice::{Notice, Notifier};
use crate::transport::ApiRequest;
use crate::types::CouponResponse;
use std::sync::Arc;
use tracing::info;

pub const GENERATE_COUPON_PATH: &str = "/coupons/generate/";

/// 抽奖结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromotionResult {
    Awarded { code: String, message: String },
    NotAwarded { message: String },
}

impl From<CouponResponse> for PromotionResult {
    fn from(response: CouponResponse) -> Self {
        match response.coupon_code {
            Some(code) if !code.is_empty() => PromotionResult::Awarded {
                code,
                message: response.message,
            },
            _ => PromotionResult::NotAwarded {
                message: response.message,
            },
        }
    }
}

/// 优惠码输入状态
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CouponState {
    input: String,
    applied: Option<String>,
    awarded: bool,
}

impl CouponState {
    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// 使用手动输入的优惠码；输入为空时不做任何事
    pub fn apply_input(&mut self) -> Option<&str> {
        let code = self.input.trim();
        if code.is_empty() {
            return None;
        }
        self.applied = Some(code.to_string());
        self.applied.as_deref()
    }

    /// 抽中的优惠码直接填入并生效
    pub fn apply_awarded(&mut self, code: &str) {
        self.input = code.to_string();
        self.applied = Some(code.to_string());
        self.awarded = true;
    }

    pub fn applied(&self) -> Option<&str> {
        self.applied.as_deref()
    }

    pub fn awarded(&self) -> bool {
        self.awarded
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// 抽奖操作
#[derive(Clone)]
pub struct PromotionService {
    http: HttpClient,
    notifier: Arc<dyn Notifier>,
}

impl PromotionService {
    pub fn new(http: HttpClient, notifier: Arc<dyn Notifier>) -> Self {
        Self { http, notifier }
    }

    /// 请求服务端评估一次抽奖
    pub async fn try_luck(&self) -> Result<PromotionResult> {
        let response = self
            .http
            .execute::<CouponResponse>(ApiRequest::post(GENERATE_COUPON_PATH))
            .await;

        let result = match response {
            Ok(response) => PromotionResult::from(response),
            Err(e) => {
                self.notifier
                    .notify(Notice::error(e.user_message("Could not reach the promotion")));
                return Err(e);
            }
        };

        match &result {
            PromotionResult::Awarded { code, message } => {
                info!("Coupon awarded: {}", code);
                self.notifier.notify(
                    Notice::success("You got a reward!").with_description(format!(
                        "{} Your coupon {} has been applied.",
                        message, code
                    )),
                );
            }
            PromotionResult::NotAwarded { .. } => {
                self.notifier.notify(Notice::info(
                    "Not this time…",
                    "Keep shopping to increase your chances of winning a coupon!",
                ));
            }
        }
        Ok(result)
    }
}
