//! 基金详情缓存
//!
//! 以 JSON 文件保存各数据源返回的详情，在有效期内不再重复请求

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::services::common::beijing_today;
use crate::services::providers::{DetailProvider, FundDetail, ProviderError};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    fetched_on: NaiveDate,
    detail: FundDetail,
}

pub struct DetailCache {
    path: PathBuf,
    ttl_days: i64,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl DetailCache {
    /// 加载缓存文件，文件不存在或已损坏时从空缓存开始
    pub fn load(path: impl Into<PathBuf>, ttl_days: i64) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(entries) => entries,
                Err(e) => {
                    log::warn!("⚠️ 缓存文件 {} 无法解析，忽略: {}", path.display(), e);
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        Self {
            path,
            ttl_days,
            entries: Mutex::new(entries),
        }
    }

    fn key(provider: &str, code: &str) -> String {
        format!("{}:{}", provider, code)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_fresh(&self, entry: &CacheEntry, today: NaiveDate) -> bool {
        (today - entry.fetched_on).num_days() < self.ttl_days
    }

    pub fn get(&self, provider: &str, code: &str, today: NaiveDate) -> Option<FundDetail> {
        let entries = self.lock();
        entries
            .get(&Self::key(provider, code))
            .filter(|entry| self.is_fresh(entry, today))
            .map(|entry| entry.detail.clone())
    }

    pub fn put(&self, provider: &str, code: &str, detail: FundDetail, today: NaiveDate) {
        self.lock().insert(
            Self::key(provider, code),
            CacheEntry {
                fetched_on: today,
                detail,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// 写回缓存文件，顺带清理过期条目
    pub fn save(&self) -> Result<()> {
        let today = beijing_today();
        let snapshot: HashMap<String, CacheEntry> = self
            .lock()
            .iter()
            .filter(|(_, entry)| self.is_fresh(entry, today))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("创建缓存目录 {} 失败", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(&snapshot)?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("写入缓存文件 {} 失败", self.path.display()))?;
        log::info!("💾 已保存 {} 条详情缓存到 {}", snapshot.len(), self.path.display());
        Ok(())
    }
}

/// 带缓存的详情数据源，只缓存成功且非空的结果
pub struct CachedProvider {
    inner: Arc<dyn DetailProvider>,
    cache: Arc<DetailCache>,
}

impl CachedProvider {
    pub fn new(inner: Arc<dyn DetailProvider>, cache: Arc<DetailCache>) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl DetailProvider for CachedProvider {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn fetch_detail(&self, code: &str) -> Result<FundDetail, ProviderError> {
        let today = beijing_today();
        if let Some(detail) = self.cache.get(self.inner.name(), code, today) {
            log::debug!("基金 {} 命中 {} 缓存", code, self.inner.name());
            return Ok(detail);
        }
        let detail = self.inner.fetch_detail(code).await?;
        if !detail.is_empty() {
            self.cache.put(self.inner.name(), code, detail.clone(), today);
        }
        Ok(detail)
    }
}
