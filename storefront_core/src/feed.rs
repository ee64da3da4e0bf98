//! 分页列表控制器（"加载更多"）
//!
//! 状态：`Idle` → `Fetching` → `Idle`（追加一页），服务端不再给出游标时进入 `Exhausted`。
//! 同一时刻最多只有一个翻页请求；`Fetching` 期间的触发直接忽略。
//! 结果按拉取顺序拼接，不重排也不去重。

use crate::error::Result;
use crate::types::{Cursor, Page};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// 分页数据来源
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageSource<T: Send + Sync + 'static>: Send + Sync {
    /// 拉取一页；`cursor` 为 `None` 时拉取第一页
    async fn fetch_page(&self, cursor: Option<Cursor>) -> Result<Page<T>>;
}

/// 控制器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    Idle,
    Fetching,
    Exhausted,
}

/// 一次触发的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// 追加了一页，包含的条目数
    Loaded(usize),
    /// 已有请求在进行中，本次触发被忽略
    Busy,
    /// 没有更多数据
    Exhausted,
}

struct FeedInner<T> {
    state: FeedState,
    next: Option<Cursor>,
    items: Vec<T>,
    pages: usize,
}

/// 分页列表控制器
pub struct Feed<T> {
    source: Arc<dyn PageSource<T>>,
    inner: Mutex<FeedInner<T>>,
}

impl<T: Clone + Send + Sync + 'static> Feed<T> {
    pub fn new(source: Arc<dyn PageSource<T>>) -> Self {
        Self {
            source,
            inner: Mutex::new(FeedInner {
                state: FeedState::Idle,
                next: None,
                items: Vec::new(),
                pages: 0,
            }),
        }
    }

    /// 消费方需要更多数据
    pub async fn need_more(&self) -> Result<LoadOutcome> {
        let cursor = {
            let mut inner = self.inner.lock().await;
            match inner.state {
                FeedState::Fetching => {
                    debug!("Page fetch already in flight, ignoring trigger");
                    return Ok(LoadOutcome::Busy);
                }
                FeedState::Exhausted => return Ok(LoadOutcome::Exhausted),
                FeedState::Idle => {}
            }
            inner.state = FeedState::Fetching;
            inner.next.clone()
        };

        let result = self.source.fetch_page(cursor).await;

        let mut inner = self.inner.lock().await;
        match result {
            Ok(page) => {
                let count = page.results.len();
                inner.items.extend(page.results);
                inner.pages += 1;
                inner.state = if page.next.is_some() {
                    FeedState::Idle
                } else {
                    FeedState::Exhausted
                };
                inner.next = page.next;
                debug!(
                    page = inner.pages,
                    count,
                    exhausted = inner.state == FeedState::Exhausted,
                    "Appended page"
                );
                Ok(LoadOutcome::Loaded(count))
            }
            Err(e) => {
                // 游标不变，下次触发重试同一页
                inner.state = FeedState::Idle;
                Err(e)
            }
        }
    }

    /// 已拉取的全部条目
    pub async fn items(&self) -> Vec<T> {
        self.inner.lock().await.items.clone()
    }

    pub async fn state(&self) -> FeedState {
        self.inner.lock().await.state
    }

    pub async fn is_exhausted(&self) -> bool {
        self.state().await == FeedState::Exhausted
    }

    /// 已拉取的页数
    pub async fn page_count(&self) -> usize {
        self.inner.lock().await.pages
    }
}
