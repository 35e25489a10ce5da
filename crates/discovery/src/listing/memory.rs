//! 内存列举后端
//!
//! 用于单元测试的 fake 实现，支持注入失败场景并统计调用次数。

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use contracts::{ContractError, ListingClient};
use tracing::instrument;

#[derive(Debug, Default)]
struct ListingState {
    /// path -> 条目 (按插入顺序返回)
    entries: HashMap<String, Vec<String>>,
    /// 应该失败的 path -> 错误信息
    failing: HashMap<String, String>,
    /// path -> 调用次数
    calls: HashMap<String, usize>,
}

/// 内存列举后端
///
/// Clone 共享同一份状态，便于在 locator 与 enumerator 之间复用。
#[derive(Debug, Clone, Default)]
pub struct InMemoryListing {
    state: Arc<Mutex<ListingState>>,
}

impl InMemoryListing {
    /// 创建空的内存列举后端
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册 path 下的条目
    pub fn with_entries<I, S>(self, path: &str, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state()
            .entries
            .insert(path.to_string(), entries.into_iter().map(Into::into).collect());
        self
    }

    /// 让 path 的列举失败
    pub fn with_failure(self, path: &str, message: &str) -> Self {
        self.state()
            .failing
            .insert(path.to_string(), message.to_string());
        self
    }

    /// 获取 path 被列举的次数
    pub fn calls(&self, path: &str) -> usize {
        self.state().calls.get(path).copied().unwrap_or(0)
    }

    /// 获取总调用次数
    pub fn total_calls(&self) -> usize {
        self.state().calls.values().sum()
    }

    fn state(&self) -> MutexGuard<'_, ListingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ListingClient for InMemoryListing {
    fn name(&self) -> &str {
        "memory"
    }

    #[instrument(name = "memory_listing_list", skip(self), fields(path = %path))]
    async fn list(&self, path: &str) -> Result<Vec<String>, ContractError> {
        let mut state = self.state();
        *state.calls.entry(path.to_string()).or_default() += 1;

        if let Some(message) = state.failing.get(path) {
            return Err(ContractError::listing(path, message.clone()));
        }

        state
            .entries
            .get(path)
            .cloned()
            .ok_or_else(|| ContractError::listing(path, "no such file or directory"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_returns_registered_entries_in_order() {
        let listing = InMemoryListing::new().with_entries("/out", ["b", "a"]);
        assert_eq!(listing.list("/out").await.unwrap(), vec!["b", "a"]);
        assert_eq!(listing.calls("/out"), 1);
    }

    #[tokio::test]
    async fn test_unknown_path_fails() {
        let listing = InMemoryListing::new();
        assert!(listing.list("/missing").await.is_err());
        assert_eq!(listing.total_calls(), 1);
    }

    #[tokio::test]
    async fn test_injected_failure_wins() {
        let listing = InMemoryListing::new()
            .with_entries("/out", ["a"])
            .with_failure("/out", "permission denied");
        let err = listing.list("/out").await.unwrap_err();
        assert!(err.to_string().contains("permission denied"));
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let listing = InMemoryListing::new().with_entries("/out", ["a"]);
        let clone = listing.clone();
        clone.list("/out").await.unwrap();
        assert_eq!(listing.calls("/out"), 1);
    }
}
