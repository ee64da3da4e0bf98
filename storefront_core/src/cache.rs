//! 服务端数据缓存
//!
//! 以查询键缓存远端资源。读取时命中则直接返回，否则发起请求并写入缓存；
//! 同一个键的并发读取只会发出一个请求。写操作成功后把相关键标记为过期，
//! 下一次读取会重新请求。

use crate::error::{Error, Result};
use crate::types::{CartLine, Cursor, Order, Page, Product};
use moka::future::Cache;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;

/// 查询键
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// 商品列表的一页，`None` 为第一页
    Products(Option<Cursor>),
    Cart,
    Orders,
}

/// 缓存值
#[derive(Debug, Clone)]
pub enum CacheValue {
    ProductPage(Arc<Page<Product>>),
    Cart(Arc<Vec<CartLine>>),
    Orders(Arc<Vec<Order>>),
}

/// 可放入缓存的类型
pub trait Cached: Send + Sync + 'static {
    fn wrap(value: Arc<Self>) -> CacheValue;

    fn unwrap(value: CacheValue) -> Option<Arc<Self>>;
}

impl Cached for Page<Product> {
    fn wrap(value: Arc<Self>) -> CacheValue {
        CacheValue::ProductPage(value)
    }

    fn unwrap(value: CacheValue) -> Option<Arc<Self>> {
        match value {
            CacheValue::ProductPage(page) => Some(page),
            _ => None,
        }
    }
}

impl Cached for Vec<CartLine> {
    fn wrap(value: Arc<Self>) -> CacheValue {
        CacheValue::Cart(value)
    }

    fn unwrap(value: CacheValue) -> Option<Arc<Self>> {
        match value {
            CacheValue::Cart(lines) => Some(lines),
            _ => None,
        }
    }
}

impl Cached for Vec<Order> {
    fn wrap(value: Arc<Self>) -> CacheValue {
        CacheValue::Orders(value)
    }

    fn unwrap(value: CacheValue) -> Option<Arc<Self>> {
        match value {
            CacheValue::Orders(orders) => Some(orders),
            _ => None,
        }
    }
}

/// 缓存槽位：查询键加上它当前的代数
///
/// 每次失效都会让键进入新的一代，旧一代上仍在进行的请求只能写入旧槽位，
/// 之后的读取不会再看到它。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Slot {
    key: QueryKey,
    generation: u64,
}

#[derive(Debug, Default)]
struct Generations {
    counter: u64,
    /// `clear` 之后所有键的最低代数
    floor: u64,
    keys: HashMap<QueryKey, u64>,
}

impl Generations {
    fn current(&self, key: &QueryKey) -> u64 {
        self.keys.get(key).copied().unwrap_or(0).max(self.floor)
    }

    fn bump(&mut self, key: &QueryKey) -> u64 {
        self.counter += 1;
        self.keys.insert(key.clone(), self.counter);
        self.counter
    }

    fn reset(&mut self) {
        self.counter += 1;
        self.floor = self.counter;
        self.keys.clear();
    }
}

/// 服务端数据缓存
#[derive(Clone)]
pub struct QueryCache {
    cache: Cache<Slot, CacheValue>,
    generations: Arc<Mutex<Generations>>,
}

impl QueryCache {
    pub fn new(ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(256)
            .time_to_live(ttl)
            .build();
        Self {
            cache,
            generations: Arc::new(Mutex::new(Generations::default())),
        }
    }

    fn generations(&self) -> MutexGuard<'_, Generations> {
        self.generations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn slot(&self, key: &QueryKey) -> Slot {
        Slot {
            key: key.clone(),
            generation: self.generations().current(key),
        }
    }

    /// 读取 `key`；未命中时执行 `fetch` 并缓存结果
    ///
    /// 请求失败不会写入缓存，等待同一请求的调用方都会收到该错误。
    /// 请求期间 `key` 被失效时，结果只返回给本次调用方，不会留在缓存中。
    pub async fn get_or_fetch<T, F, Fut>(&self, key: QueryKey, fetch: F) -> Result<Arc<T>>
    where
        T: Cached,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let slot = self.slot(&key);
        if let Some(value) = self.cache.get(&slot).await {
            debug!(?key, "Cache hit");
            return T::unwrap(value).ok_or_else(|| mismatch(&key));
        }

        let missed = key.clone();
        let value = self
            .cache
            .try_get_with(slot.clone(), async move {
                debug!(key = ?missed, "Cache miss, fetching");
                fetch().await.map(|value| T::wrap(Arc::new(value)))
            })
            .await
            .map_err(Error::from_shared)?;

        if self.slot(&key) != slot {
            debug!(?key, "Invalidated while fetching, discarding result");
            self.cache.invalidate(&slot).await;
        }

        T::unwrap(value).ok_or_else(|| mismatch(&key))
    }

    /// 把一组键标记为过期
    pub async fn invalidate(&self, keys: &[QueryKey]) {
        for key in keys {
            debug!(?key, "Invalidating cache entry");
            let stale = self.slot(key);
            self.generations().bump(key);
            self.cache.invalidate(&stale).await;
        }
    }

    /// 是否存在未过期的缓存
    pub fn contains(&self, key: &QueryKey) -> bool {
        self.cache.contains_key(&self.slot(key))
    }

    /// 清空全部缓存（登出时）
    pub fn clear(&self) {
        self.generations().reset();
        self.cache.invalidate_all();
    }
}

fn mismatch(key: &QueryKey) -> Error {
    Error::InvalidState(format!("cached value for {:?} has unexpected type", key))
}
