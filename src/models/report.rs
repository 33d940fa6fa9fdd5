//! 筛选报告模型
//!
//! 排名后的结果表，以及交给写出端的展示标记

use serde::{Deserialize, Serialize};

use super::fund::{FundRecord, Horizon};

/// 筛选流程所处阶段，只能前进
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PipelineStage {
    Loaded,
    KeywordFiltered,
    ThresholdFiltered,
    ExcessComputed,
    Enriched,
    PostFiltered,
    Ranked,
}

impl PipelineStage {
    pub fn label(&self) -> &'static str {
        match self {
            PipelineStage::Loaded => "加载排行",
            PipelineStage::KeywordFiltered => "关键词过滤",
            PipelineStage::ThresholdFiltered => "基准阈值过滤",
            PipelineStage::ExcessComputed => "超额收益计算",
            PipelineStage::Enriched => "详情补充",
            PipelineStage::PostFiltered => "补充后过滤",
            PipelineStage::Ranked => "排序",
        }
    }
}

/// 单个步骤的行数变化
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepCount {
    pub step: String,
    pub before: usize,
    pub after: usize,
}

/// 排名后的一行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedRow {
    /// 名次（从1开始）
    pub rank: usize,
    #[serde(flatten)]
    pub record: FundRecord,
    /// 进入前N名的收益周期，对应单元格需要高亮
    pub top_horizons: Vec<Horizon>,
    /// 进入前N名的周期数达到阈值时标记基金简称
    pub star: bool,
}

/// 最终结果表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedTable {
    pub plan: String,
    pub sheet: String,
    pub profile: String,
    pub rank_by: Horizon,
    /// 生成时间（北京时间）
    pub generated_at: String,
    pub steps: Vec<StepCount>,
    pub rows: Vec<RankedRow>,
}

impl RankedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
