//! 测试用的内存数据源

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::services::providers::{
    DetailProvider, FundDetail, FundNameLookup, FundSibling, ProviderError, SiblingSearch,
};

#[derive(Default)]
pub struct MockNames {
    pub names: HashMap<String, String>,
    pub fail: bool,
}

impl MockNames {
    pub fn with(pairs: &[(&str, &str)]) -> Self {
        Self {
            names: pairs.iter().map(|(c, n)| (c.to_string(), n.to_string())).collect(),
            fail: false,
        }
    }
}

#[async_trait]
impl FundNameLookup for MockNames {
    async fn display_name(&self, code: &str) -> Result<Option<String>, ProviderError> {
        if self.fail {
            return Err(ProviderError::Http("connection reset".to_string()));
        }
        Ok(self.names.get(code).cloned())
    }
}

/// 按基础名称返回预置的份额列表，未预置的名称返回格式错误
#[derive(Default)]
pub struct MockSearch {
    pub results: HashMap<String, Vec<FundSibling>>,
    pub calls: AtomicUsize,
}

impl MockSearch {
    pub fn with(base: &str, siblings: &[(&str, &str)]) -> Self {
        let mut search = Self::default();
        search.add(base, siblings);
        search
    }

    pub fn add(&mut self, base: &str, siblings: &[(&str, &str)]) {
        self.results.insert(
            base.to_string(),
            siblings
                .iter()
                .map(|(code, name)| FundSibling {
                    code: code.to_string(),
                    name: name.to_string(),
                })
                .collect(),
        );
    }
}

#[async_trait]
impl SiblingSearch for MockSearch {
    async fn search(&self, base_name: &str) -> Result<Vec<FundSibling>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.results
            .get(base_name)
            .cloned()
            .ok_or_else(|| ProviderError::shape("Datas 不是数组"))
    }
}

/// 按代码返回预置详情，未预置的代码返回接口错误
pub struct MockDetails {
    pub name: &'static str,
    pub details: HashMap<String, FundDetail>,
    pub calls: AtomicUsize,
}

impl MockDetails {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            details: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with(mut self, code: &str, detail: FundDetail) -> Self {
        self.details.insert(code.to_string(), detail);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DetailProvider for MockDetails {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch_detail(&self, code: &str) -> Result<FundDetail, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.details.get(code).cloned().ok_or(ProviderError::Remote {
            code: 404,
            message: format!("基金 {} 不存在", code),
        })
    }
}
