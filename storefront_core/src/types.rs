//! 数据类型定义

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 当前登录用户
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: u64,
    pub email: String,
}

/// 访问令牌与刷新令牌
#[derive(Debug, Clone, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// 登录响应数据
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub message: String,
    pub user_id: u64,
    pub email: String,
    pub tokens: TokenPair,
}

impl LoginResponse {
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.user_id,
            email: self.email.clone(),
        }
    }
}

/// 刷新令牌响应数据
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    pub access: Option<String>,
}

/// 商品（客户端只读）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

/// 分页游标，由服务端给出，客户端不做解析
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 一页分页数据
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Page<T> {
    pub results: Vec<T>,
    #[serde(default)]
    pub next: Option<Cursor>,
}

/// 购物车条目
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "CartLineWire")]
pub struct CartLine {
    pub id: u64,
    pub product: Product,
    pub quantity: u32,
    /// 服务端给出的小计，以此为准
    pub subtotal: Decimal,
}

/// 服务端购物车条目：`product` 可能是嵌套对象，也可能只是 id 加扁平字段
#[derive(Debug, Deserialize)]
struct CartLineWire {
    id: u64,
    product: ProductField,
    #[serde(default)]
    product_name: Option<String>,
    #[serde(default)]
    price: Option<Decimal>,
    #[serde(default)]
    thumbnail: Option<String>,
    quantity: u32,
    #[serde(default)]
    subtotal: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProductField {
    Full(Product),
    Id(u64),
}

impl TryFrom<CartLineWire> for CartLine {
    type Error = String;

    fn try_from(wire: CartLineWire) -> std::result::Result<Self, Self::Error> {
        let product = match wire.product {
            ProductField::Full(product) => product,
            ProductField::Id(id) => Product {
                id,
                name: wire
                    .product_name
                    .ok_or_else(|| format!("cart line {} has no product name", wire.id))?,
                description: String::new(),
                price: wire
                    .price
                    .ok_or_else(|| format!("cart line {} has no price", wire.id))?,
                thumbnail_url: wire.thumbnail,
            },
        };
        // 旧版接口不返回 subtotal
        let subtotal = wire
            .subtotal
            .unwrap_or_else(|| product.price * Decimal::from(wire.quantity));

        Ok(CartLine {
            id: wire.id,
            product,
            quantity: wire.quantity,
            subtotal,
        })
    }
}

/// 抽奖优惠券响应数据
#[derive(Debug, Clone, Deserialize)]
pub struct CouponResponse {
    pub message: String,
    #[serde(default)]
    pub coupon_code: Option<String>,
}

/// 结算响应数据
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutResponse {
    pub checkout_url: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub order_id: Option<u64>,
    #[serde(default)]
    pub total_paid: Option<Decimal>,
    #[serde(default)]
    pub discount_applied: Option<Decimal>,
}

/// 订单状态（由服务端流转）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    PaymentFailed,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
    #[serde(other)]
    Unknown,
}

/// 订单
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Order {
    pub id: u64,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    #[serde(default)]
    pub discount_amount: Decimal,
    pub final_amount: Decimal,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
}

/// 订单条目
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrderItem {
    pub product: Product,
    pub quantity: u32,
    pub price_at_purchase_time: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    #[test]
    fn test_cart_line_from_flat_serializer() {
        let line: CartLine = serde_json::from_value(json!({
            "id": 7,
            "cart_item_id": 7,
            "product": 3,
            "product_name": "Desk Lamp",
            "price": "12.50",
            "quantity": 2,
            "thumbnail": "https://cdn.example.com/lamp.png",
            "subtotal": 25.0
        }))
        .unwrap();

        assert_eq!(line.id, 7);
        assert_eq!(line.product.id, 3);
        assert_eq!(line.product.name, "Desk Lamp");
        assert_eq!(line.product.price, Decimal::from_str("12.50").unwrap());
        assert_eq!(line.subtotal, Decimal::from(25));
    }

    #[test]
    fn test_cart_line_nested_product_without_subtotal() {
        let line: CartLine = serde_json::from_value(json!({
            "id": 1,
            "product": {
                "id": 9,
                "name": "Mug",
                "description": "Ceramic",
                "price": "4.25"
            },
            "quantity": 3
        }))
        .unwrap();

        assert_eq!(line.product.thumbnail_url, None);
        assert_eq!(line.subtotal, Decimal::from_str("12.75").unwrap());
    }

    #[test]
    fn test_cart_line_rejects_missing_product_fields() {
        let result: std::result::Result<CartLine, _> =
            serde_json::from_value(json!({ "id": 1, "product": 9, "quantity": 1 }));
        assert!(result.is_err());
    }

    #[test]
    fn test_order_status_tolerates_unknown() {
        let status: OrderStatus = serde_json::from_value(json!("PAYMENT_FAILED")).unwrap();
        assert_eq!(status, OrderStatus::PaymentFailed);
        let status: OrderStatus = serde_json::from_value(json!("ON_HOLD")).unwrap();
        assert_eq!(status, OrderStatus::Unknown);
    }

    #[test]
    fn test_page_without_next_is_last() {
        let page: Page<u32> = serde_json::from_value(json!({
            "count": 3,
            "results": [3],
            "next": null,
            "previous": "http://localhost:8000/api/v1/products/?limit=2"
        }))
        .unwrap();
        assert_eq!(page.results, vec![3]);
        assert!(page.next.is_none());
    }
}
