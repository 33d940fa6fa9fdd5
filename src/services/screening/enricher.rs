//! 详情补充
//!
//! 对每只基金：
//! 1. 查基金名称（查不到时沿用排行中的简称）
//! 2. 去掉 A/C 后缀得到基础名称，搜索同一基金的各份额，汇总规模
//! 3. 档案数据源补充成立时间和最新规模
//! 4. 主数据源补充换手率、重仓股占比和行业集中度，重仓股占比缺失时用备用数据源补上
//! 5. 配置了份额历史数据源时，按报告期合并各份额的净资产和持有人结构
//!
//! 任何一次调用失败只记录日志，对应字段留空，不影响其他基金

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use futures::stream::{self, StreamExt};

use crate::models::{
    base_fund_name, normalize_code, FundRecord, HolderPoint, NetAssetPoint, ScaleAmount,
};
use crate::services::providers::{
    DetailProvider, FundDetail, FundNameLookup, FundSibling, SiblingSearch,
};
use crate::services::providers::eastmoney::HISTORY_PERIODS;

pub struct Enricher {
    names: Arc<dyn FundNameLookup>,
    search: Arc<dyn SiblingSearch>,
    profile: Arc<dyn DetailProvider>,
    primary: Arc<dyn DetailProvider>,
    secondary: Option<Arc<dyn DetailProvider>>,
    /// 份额历史数据源（规模变动、持有人结构），结果按报告期合并
    history: Vec<Arc<dyn DetailProvider>>,
    concurrency: usize,
}

impl Enricher {
    pub fn new(
        names: Arc<dyn FundNameLookup>,
        search: Arc<dyn SiblingSearch>,
        profile: Arc<dyn DetailProvider>,
        primary: Arc<dyn DetailProvider>,
    ) -> Self {
        Self {
            names,
            search,
            profile,
            primary,
            secondary: None,
            history: Vec::new(),
            concurrency: 1,
        }
    }

    pub fn with_secondary(mut self, secondary: Arc<dyn DetailProvider>) -> Self {
        self.secondary = Some(secondary);
        self
    }

    pub fn with_history(mut self, provider: Arc<dyn DetailProvider>) -> Self {
        self.history.push(provider);
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// 并发补充全部基金，结果保持输入顺序
    pub async fn enrich_all(&self, records: Vec<FundRecord>) -> Vec<FundRecord> {
        let total = records.len();
        log::info!("📡 开始补充 {} 只基金详情（并发 {}）", total, self.concurrency);

        stream::iter(records.into_iter().enumerate())
            .map(|(index, record)| async move {
                log::debug!("补充详情 {}/{}: {} {}", index + 1, total, record.code, record.name());
                self.enrich_one(record).await
            })
            .buffered(self.concurrency)
            .collect()
            .await
    }

    pub async fn enrich_one(&self, mut record: FundRecord) -> FundRecord {
        let display_name = self.resolve_name(&record).await;
        let base = base_fund_name(&display_name).to_string();
        let siblings = self.find_siblings(&base).await;
        record.aggregated_scale = self.aggregate_scale(&siblings).await;
        if !self.history.is_empty() {
            let (net_assets, holders) = self.aggregate_history(&siblings).await;
            record.net_asset_history = net_assets;
            record.holder_history = holders;
        }

        if let Some(detail) = self.fetch_logged(self.profile.as_ref(), &record.code).await {
            record.inception_date = detail.inception_date;
            record.latest_scale = detail.scale;
        }

        if let Some(detail) = self.fetch_logged(self.primary.as_ref(), &record.code).await {
            record.turnover_rate = detail.turnover_rate;
            record.top10_holding_weight = detail.top10_weight;
            record.sector_concentration = detail.sector_concentration;
        }

        if record.top10_holding_weight.is_none() {
            if let Some(secondary) = &self.secondary {
                if let Some(detail) = self.fetch_logged(secondary.as_ref(), &record.code).await {
                    record.top10_holding_weight = detail.top10_weight;
                }
            }
        }

        record
    }

    async fn resolve_name(&self, record: &FundRecord) -> String {
        match self.names.display_name(&record.code).await {
            Ok(Some(name)) if !name.trim().is_empty() => name.trim().to_string(),
            Ok(_) => {
                log::debug!("基金 {} 未在基金列表中找到，使用排行简称", record.code);
                record.name().to_string()
            }
            Err(e) => {
                log::warn!("⚠️ 查询基金 {} 名称失败，使用排行简称: {}", record.code, e);
                record.name().to_string()
            }
        }
    }

    /// 搜索同一基金的各份额，失败或没有结果时返回空列表
    async fn find_siblings(&self, base_name: &str) -> Vec<FundSibling> {
        if base_name.is_empty() {
            return Vec::new();
        }
        let siblings = match self.search.search(base_name).await {
            Ok(siblings) => dedupe_siblings(base_name, siblings),
            Err(e) => {
                log::warn!("⚠️ 搜索 {} 的份额失败: {}", base_name, e);
                return Vec::new();
            }
        };
        if siblings.is_empty() {
            log::debug!("{} 没有找到任何份额", base_name);
        }
        siblings
    }

    /// 汇总同一基金各份额的最新规模
    async fn aggregate_scale(&self, siblings: &[FundSibling]) -> Option<ScaleAmount> {
        let mut scales = Vec::with_capacity(siblings.len());
        for sibling in siblings {
            let scale = self
                .fetch_logged(self.profile.as_ref(), &sibling.code)
                .await
                .and_then(|d| d.scale);
            log::debug!("  份额 {} {} 规模: {:?}", sibling.code, sibling.name, scale);
            scales.push(scale);
        }
        sum_scales(scales)
    }

    /// 按报告期合并各份额的净资产和持有人结构
    async fn aggregate_history(
        &self,
        siblings: &[FundSibling],
    ) -> (Vec<NetAssetPoint>, Vec<HolderPoint>) {
        let mut net_assets = Vec::new();
        let mut holders = Vec::new();
        for sibling in siblings {
            for provider in &self.history {
                if let Some(detail) = self.fetch_logged(provider.as_ref(), &sibling.code).await {
                    net_assets.push(detail.net_asset_history);
                    holders.push(detail.holder_history);
                }
            }
        }
        (
            merge_net_assets(net_assets.iter().map(Vec::as_slice)),
            merge_holders(holders.iter().map(Vec::as_slice)),
        )
    }

    async fn fetch_logged(&self, provider: &dyn DetailProvider, code: &str) -> Option<FundDetail> {
        match provider.fetch_detail(code).await {
            Ok(detail) => Some(detail),
            Err(e) => {
                log::warn!("⚠️ {} 获取基金 {} 详情失败: {}", provider.name(), code, e);
                None
            }
        }
    }
}

/// 只保留名称以基础名称开头的份额，按代码去重
pub fn dedupe_siblings(base_name: &str, siblings: Vec<FundSibling>) -> Vec<FundSibling> {
    let mut seen = HashSet::new();
    siblings
        .into_iter()
        .filter(|s| s.name.starts_with(base_name))
        .filter_map(|s| {
            let code = normalize_code(&s.code)?;
            seen.insert(code.clone()).then(|| FundSibling { code, name: s.name })
        })
        .collect()
}

/// 规模求和（以亿为单位，保留两位小数）
///
/// 无法解析的规模记为 0 且不计数；没有任何份额贡献时返回 None
pub fn sum_scales<I>(scales: I) -> Option<ScaleAmount>
where
    I: IntoIterator<Item = Option<ScaleAmount>>,
{
    let (total, count) = scales
        .into_iter()
        .flatten()
        .fold((0.0_f64, 0_usize), |(total, count), s| (total + s.in_yi(), count + 1));
    (count > 0).then(|| ScaleAmount::yi((total * 100.0).round() / 100.0))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 同一报告期各份额的期末净资产相加，按报告期倒序保留最近几期
pub fn merge_net_assets<'a, I>(histories: I) -> Vec<NetAssetPoint>
where
    I: IntoIterator<Item = &'a [NetAssetPoint]>,
{
    let mut by_date = BTreeMap::new();
    for point in histories.into_iter().flatten() {
        *by_date.entry(point.date).or_insert(0.0) += point.net_assets;
    }
    by_date
        .into_iter()
        .rev()
        .take(HISTORY_PERIODS)
        .map(|(date, total)| NetAssetPoint {
            date,
            net_assets: round2(total),
        })
        .collect()
}

/// 同一报告期各份额的持有人结构合并，机构持有比例按总份额加权
///
/// 该期总份额为 0 时取各份额比例的简单平均
pub fn merge_holders<'a, I>(histories: I) -> Vec<HolderPoint>
where
    I: IntoIterator<Item = &'a [HolderPoint]>,
{
    // 报告期 -> (比例×份额之和, 份额之和, 比例之和, 份额数)
    let mut by_date: BTreeMap<_, (f64, f64, f64, usize)> = BTreeMap::new();
    for point in histories.into_iter().flatten() {
        let entry = by_date.entry(point.date).or_default();
        entry.0 += point.institution_ratio * point.total_shares;
        entry.1 += point.total_shares;
        entry.2 += point.institution_ratio;
        entry.3 += 1;
    }
    by_date
        .into_iter()
        .rev()
        .take(HISTORY_PERIODS)
        .map(|(date, (weighted, shares, ratio_sum, count))| {
            let ratio = if shares > 0.0 {
                weighted / shares
            } else {
                ratio_sum / count as f64
            };
            HolderPoint {
                date,
                institution_ratio: round2(ratio),
                total_shares: round2(shares),
            }
        })
        .collect()
}
