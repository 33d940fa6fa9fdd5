use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{FundRecord, HolderPoint, NetAssetPoint, ScaleAmount};

/// 外部数据源调用失败
#[derive(thiserror::Error, Debug)]
pub enum ProviderError {
    #[error("网络请求失败: {0}")]
    Http(String),
    #[error("HTTP 状态码异常: {0}")]
    Status(u16),
    #[error("请求超时 ({0:?})")]
    Timeout(Duration),
    #[error("接口返回错误 {code}: {message}")]
    Remote { code: i64, message: String },
    #[error("返回数据格式异常: {0}")]
    Shape(String),
}

impl ProviderError {
    /// 网络抖动、超时、限流和服务端错误值得重试，其余直接放弃
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Http(_) | ProviderError::Timeout(_) => true,
            ProviderError::Status(status) => *status == 429 || *status >= 500,
            ProviderError::Remote { .. } | ProviderError::Shape(_) => false,
        }
    }

    pub fn shape(message: impl Into<String>) -> Self {
        ProviderError::Shape(message.into())
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => ProviderError::Status(status.as_u16()),
            None => ProviderError::Http(e.to_string()),
        }
    }
}

/// 单只基金的详情，所有字段都可能缺失
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FundDetail {
    pub inception_date: Option<NaiveDate>,
    pub scale: Option<ScaleAmount>,
    pub turnover_rate: Option<f64>,
    pub top10_weight: Option<f64>,
    pub sector_concentration: Option<String>,
    /// 本份额最近几期的期末净资产
    #[serde(default)]
    pub net_asset_history: Vec<NetAssetPoint>,
    /// 本份额最近几期的持有人结构
    #[serde(default)]
    pub holder_history: Vec<HolderPoint>,
}

impl FundDetail {
    pub fn is_empty(&self) -> bool {
        self.inception_date.is_none()
            && self.scale.is_none()
            && self.turnover_rate.is_none()
            && self.top10_weight.is_none()
            && self.sector_concentration.is_none()
            && self.net_asset_history.is_empty()
            && self.holder_history.is_empty()
    }
}

/// 基金搜索结果中的一个份额
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundSibling {
    pub code: String,
    pub name: String,
}

/// 基金排行数据源
#[async_trait]
pub trait UniverseSource: Send + Sync {
    fn name(&self) -> &str;
    async fn load(&self) -> anyhow::Result<Vec<FundRecord>>;
}

/// 基金代码 -> 基金名称
#[async_trait]
pub trait FundNameLookup: Send + Sync {
    async fn display_name(&self, code: &str) -> Result<Option<String>, ProviderError>;
}

/// 按基础名称搜索同一基金的各份额
#[async_trait]
pub trait SiblingSearch: Send + Sync {
    async fn search(&self, base_name: &str) -> Result<Vec<FundSibling>, ProviderError>;
}

/// 基金详情数据源
#[async_trait]
pub trait DetailProvider: Send + Sync {
    fn name(&self) -> &'static str;
    async fn fetch_detail(&self, code: &str) -> Result<FundDetail, ProviderError>;
}
