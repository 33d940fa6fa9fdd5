//! 筛选流程
//!
//! 加载排行 → 关键词过滤 → 基准阈值过滤 → 超额收益计算 → 详情补充 → 补充后过滤 → 排序
//!
//! 只向前推进，每一步记录行数变化。某一步把非空结果过滤为空时输出警告。

use std::sync::Arc;

use crate::config::{AppConfig, ConfigError, PlanConfig, PostFilterConfig};
use crate::models::{BenchmarkProfile, FundRecord, PipelineStage, RankedTable, StepCount};
use crate::services::common::get_beijing_time;

use super::enricher::Enricher;
use super::excess::compute_excess;
use super::filters::{apply_include, apply_thresholds, drop_missing_pivot, exclude_keywords};
use super::post_filters::PostFilters;
use super::ranking::{rank, RankingOptions};

/// 记录各步骤行数，保证阶段只向前推进
struct StageTracker<'a> {
    plan: &'a str,
    stage: PipelineStage,
    steps: Vec<StepCount>,
}

impl<'a> StageTracker<'a> {
    fn new(plan: &'a str, loaded: usize) -> Self {
        log::info!("📊 [{}] {}: {} 只基金", plan, PipelineStage::Loaded.label(), loaded);
        Self {
            plan,
            stage: PipelineStage::Loaded,
            steps: vec![StepCount {
                step: PipelineStage::Loaded.label().to_string(),
                before: loaded,
                after: loaded,
            }],
        }
    }

    fn record(&mut self, stage: PipelineStage, step: &str, before: usize, after: usize) {
        debug_assert!(stage >= self.stage, "阶段不能回退: {:?} -> {:?}", self.stage, stage);
        self.stage = stage;
        log::info!("📊 [{}] {}: {} -> {}", self.plan, step, before, after);
        if before > 0 && after == 0 {
            log::warn!("⚠️ [{}] {} 之后没有剩余基金", self.plan, step);
        }
        self.steps.push(StepCount {
            step: step.to_string(),
            before,
            after,
        });
    }

    /// 执行一步过滤并记录行数
    fn filter<F>(&mut self, stage: PipelineStage, step: &str, records: Vec<FundRecord>, f: F) -> Vec<FundRecord>
    where
        F: FnOnce(Vec<FundRecord>) -> Vec<FundRecord>,
    {
        let before = records.len();
        let records = f(records);
        self.record(stage, step, before, records.len());
        records
    }
}

/// 单个方案的筛选流程
pub struct ScreeningPipeline {
    plan: PlanConfig,
    profile: BenchmarkProfile,
    post_filter: PostFilterConfig,
    ranking: RankingOptions,
    enricher: Option<Arc<Enricher>>,
}

impl ScreeningPipeline {
    pub fn new(
        plan: PlanConfig,
        config: &AppConfig,
        enricher: Option<Arc<Enricher>>,
    ) -> Result<Self, ConfigError> {
        let profile = config.profile(&plan.profile)?;
        let ranking = RankingOptions::new(plan.rank_by, &config.output);
        Ok(Self {
            plan,
            profile,
            post_filter: config.post_filter.clone(),
            ranking,
            enricher,
        })
    }

    pub async fn run(&self, universe: &[FundRecord]) -> RankedTable {
        let plan = &self.plan;
        let mut tracker = StageTracker::new(&plan.name, universe.len());
        let records = universe.to_vec();

        let records = if plan.include_keywords.is_empty() && plan.include_codes.is_empty() {
            records
        } else {
            tracker.filter(PipelineStage::KeywordFiltered, "包含条件过滤", records, |rs| {
                apply_include(rs, &plan.include_keywords, &plan.include_codes)
            })
        };
        let records = tracker.filter(PipelineStage::KeywordFiltered, "关键词过滤", records, |rs| {
            exclude_keywords(rs, &plan.exclude_keywords)
        });

        // 代码白名单方案保留缺少主周期收益的基金，排序时排在最后
        let records = if plan.include_codes.is_empty() {
            let pivot_step = format!("剔除{}收益缺失", plan.pivot);
            tracker.filter(PipelineStage::ThresholdFiltered, &pivot_step, records, |rs| {
                drop_missing_pivot(rs, plan.pivot)
            })
        } else {
            records
        };
        let mut records = tracker.filter(
            PipelineStage::ThresholdFiltered,
            PipelineStage::ThresholdFiltered.label(),
            records,
            |rs| apply_thresholds(rs, &self.profile, &plan.threshold_horizons),
        );

        compute_excess(&mut records, &self.profile);
        tracker.record(
            PipelineStage::ExcessComputed,
            PipelineStage::ExcessComputed.label(),
            records.len(),
            records.len(),
        );

        let records = match (&self.enricher, plan.enrich) {
            (Some(enricher), true) => {
                let before = records.len();
                let enriched = enricher.enrich_all(records).await;
                tracker.record(
                    PipelineStage::Enriched,
                    PipelineStage::Enriched.label(),
                    before,
                    enriched.len(),
                );
                enriched
            }
            (None, true) => {
                log::warn!("⚠️ [{}] 未配置详情数据源，跳过详情补充", plan.name);
                records
            }
            (_, false) => records,
        };

        let before = records.len();
        let (records, post_steps) = PostFilters::new(&self.post_filter, plan.post_filters).apply(records);
        for step in post_steps {
            tracker.record(PipelineStage::PostFiltered, &step.step, step.before, step.after);
        }
        log::debug!("[{}] 补充后过滤合计: {} -> {}", plan.name, before, records.len());

        let rows = rank(records, &self.ranking);
        tracker.record(PipelineStage::Ranked, PipelineStage::Ranked.label(), rows.len(), rows.len());
        log::info!("✅ [{}] 筛选完成，共 {} 只基金", plan.name, rows.len());

        RankedTable {
            plan: plan.name.clone(),
            sheet: plan.sheet_name().to_string(),
            profile: self.profile.name.clone(),
            rank_by: self.ranking.rank_by,
            generated_at: get_beijing_time(),
            steps: tracker.steps,
            rows,
        }
    }
}
