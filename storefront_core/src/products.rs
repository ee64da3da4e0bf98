//! 商品列表

use crate::cache::{QueryCache, QueryKey};
use crate::error::Result;
use crate::feed::PageSource;
use crate::http::HttpClient;
use crate::transport::ApiRequest;
use crate::types::{Cursor, Page, Product};
use async_trait::async_trait;

pub const PRODUCTS_PATH: &str = "/products/";

/// 经缓存读取的商品分页
pub struct ProductPages {
    http: HttpClient,
    cache: QueryCache,
    page_size: u32,
}

impl ProductPages {
    pub fn new(http: HttpClient, cache: QueryCache, page_size: u32) -> Self {
        Self {
            http,
            cache,
            page_size,
        }
    }

    /// 第一页按 `limit`/`offset` 请求，之后直接请求服务端给出的游标
    fn page_request(&self, cursor: Option<&Cursor>) -> ApiRequest {
        match cursor {
            Some(cursor) if cursor.as_str().starts_with('?') => {
                ApiRequest::get(format!("{}{}", PRODUCTS_PATH, cursor.as_str()))
            }
            Some(cursor) => ApiRequest::get(cursor.as_str()),
            None => ApiRequest::get(PRODUCTS_PATH)
                .query("limit", self.page_size)
                .query("offset", 0),
        }
    }
}

#[async_trait]
impl PageSource<Product> for ProductPages {
    async fn fetch_page(&self, cursor: Option<Cursor>) -> Result<Page<Product>> {
        let request = self.page_request(cursor.as_ref());
        let page = self
            .cache
            .get_or_fetch(QueryKey::Products(cursor), || {
                self.http.execute::<Page<Product>>(request)
            })
            .await?;
        Ok(Page::clone(&page))
    }
}
