//! 公募基金筛选工具
//!
//! 从东方财富基金排行出发，按业绩基准和屏蔽关键词筛选，补充规模、换手率、
//! 重仓股占比等详情后再次过滤，排序写出
//! 数据来源：东方财富、韭菜说、蛋卷基金

mod config;   // 配置
mod models;   // 数据模型定义
mod services; // 业务逻辑服务

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use env_logger::Env;

use crate::config::{AppConfig, PlanConfig};
use crate::models::{FundRecord, Horizon};
use crate::services::cache::{CachedProvider, DetailCache};
use crate::services::common::build_http_client;
use crate::services::providers::{
    DanjuanProfile, DetailProvider, EastmoneyFundList, EastmoneyHolders, EastmoneyHoldings,
    EastmoneyNetAssets, EastmoneyRank, EastmoneySearch, FundListWorkbook, FundNameLookup,
    JiucaishuoHighlights, JsonSnapshot, UniverseSource,
};
use crate::services::retry::RetryPolicy;
use crate::services::screening::{Enricher, ScreeningPipeline};
use crate::services::sink::{JsonFileSink, ReportSink};

#[derive(Parser)]
#[command(name = "fund-screener", version, about = "公募基金超额收益筛选")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 执行筛选方案
    Run(RunArgs),
    /// 列出配置中的筛选方案
    Plans {
        /// 配置文件路径，默认查找 config.json 或 config/config.json
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Args)]
struct RunArgs {
    /// 配置文件路径，默认查找 config.json 或 config/config.json
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// 只执行指定方案，可重复；默认执行全部方案
    #[arg(short, long = "plan")]
    plans: Vec<String>,
    /// 使用本地排行快照（JSON）代替东方财富排行
    #[arg(long)]
    universe_file: Option<PathBuf>,
    /// 输出目录
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
    /// 详情补充并发数
    #[arg(long)]
    concurrency: Option<usize>,
    /// 覆盖所有方案的排序周期，如 1y、6m、近3月
    #[arg(long, value_parser = parse_horizon)]
    rank_by: Option<Horizon>,
    /// 跳过详情补充
    #[arg(long)]
    no_enrich: bool,
}

fn parse_horizon(text: &str) -> Result<Horizon, String> {
    Horizon::parse(text).ok_or_else(|| {
        let keys: Vec<&str> = Horizon::ALL.iter().map(Horizon::key).collect();
        format!("未知的收益周期 {}，可选: {}", text, keys.join(", "))
    })
}

/// 加载配置并初始化日志，日志级别取自配置，RUST_LOG 优先
fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let (config, used) = AppConfig::load(path)?;
    env_logger::init_from_env(Env::default().default_filter_or(config.log.level.as_str()));
    match used {
        Some(path) => log::info!("从 {} 加载配置", path.display()),
        None => log::info!("未找到配置文件，使用默认配置"),
    }
    Ok(config)
}

/// 数据源外面套一层缓存
fn with_cache(
    provider: Arc<dyn DetailProvider>,
    cache: Option<&Arc<DetailCache>>,
) -> Arc<dyn DetailProvider> {
    match cache {
        Some(cache) => Arc::new(CachedProvider::new(provider, cache.clone())),
        None => provider,
    }
}

fn build_enricher(
    config: &AppConfig,
    client: &reqwest::Client,
    retry: &RetryPolicy,
    cache: Option<&Arc<DetailCache>>,
) -> Result<Enricher> {
    let names: Arc<dyn FundNameLookup> = match &config.universe.fund_list_xlsx {
        Some(path) => Arc::new(FundListWorkbook::open(path)?),
        None => Arc::new(EastmoneyFundList::new(client.clone(), retry.clone())),
    };
    let search = Arc::new(EastmoneySearch::new(client.clone(), retry.clone()));
    let profile = with_cache(Arc::new(DanjuanProfile::new(client.clone(), retry.clone())), cache);
    let primary = with_cache(
        Arc::new(JiucaishuoHighlights::new(client.clone(), retry.clone())),
        cache,
    );
    let secondary = with_cache(
        Arc::new(EastmoneyHoldings::new(client.clone(), retry.clone())),
        cache,
    );

    let mut enricher = Enricher::new(names, search, profile, primary)
        .with_secondary(secondary)
        .with_concurrency(config.api.concurrency);
    if config.history.enabled {
        enricher = enricher
            .with_history(with_cache(
                Arc::new(EastmoneyNetAssets::new(client.clone(), retry.clone())),
                cache,
            ))
            .with_history(with_cache(
                Arc::new(EastmoneyHolders::new(client.clone(), retry.clone())),
                cache,
            ));
    }
    Ok(enricher)
}

async fn run(args: RunArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(dir) = &args.output_dir {
        config.output.dir = dir.display().to_string();
    }
    if let Some(concurrency) = args.concurrency {
        config.api.concurrency = concurrency;
    }
    if let Some(file) = &args.universe_file {
        config.universe.snapshot_file = Some(file.display().to_string());
    }
    config.validate()?;

    let mut plans = config.select_plans(&args.plans)?;
    for plan in &mut plans {
        if args.no_enrich {
            plan.enrich = false;
        }
        if let Some(rank_by) = args.rank_by {
            plan.rank_by = rank_by;
        }
    }
    log::info!(
        "启动基金筛选，方案: {}",
        plans.iter().map(|p| p.name.as_str()).collect::<Vec<_>>().join(", ")
    );

    let client = build_http_client(&config.api)?;
    let retry = RetryPolicy::from_config(&config.api);

    let source: Box<dyn UniverseSource> = match &config.universe.snapshot_file {
        Some(path) => Box::new(JsonSnapshot::new(path)),
        None => Box::new(EastmoneyRank::new(client.clone(), retry.clone())),
    };
    log::info!("📡 从{}加载基金排行", source.name());
    let universe = source
        .load()
        .await
        .with_context(|| format!("加载基金排行失败（{}）", source.name()))?;
    log::info!("📊 共加载 {} 只基金", universe.len());

    let needs_enrich = plans.iter().any(|p| p.enrich);
    let cache = (needs_enrich && config.cache.enabled)
        .then(|| Arc::new(DetailCache::load(&config.cache.path, config.cache.cache_days)));
    if let Some(cache) = &cache {
        log::info!("💾 详情缓存已有 {} 条", cache.len());
    }
    let enricher = if needs_enrich {
        Some(Arc::new(build_enricher(&config, &client, &retry, cache.as_ref())?))
    } else {
        None
    };

    let sink = JsonFileSink::new(&config.output.dir);
    let outcome = run_plans(plans, &config, &universe, enricher, &sink).await;
    save_cache_then(outcome, cache.as_deref())
}

/// 先保存详情缓存再返回运行结果，写出失败时已抓取的详情不丢失
fn save_cache_then(outcome: Result<()>, cache: Option<&DetailCache>) -> Result<()> {
    if let Some(cache) = cache {
        if let Err(e) = cache.save() {
            log::warn!("⚠️ 保存详情缓存失败: {:#}", e);
        }
    }
    outcome
}

async fn run_plans(
    plans: Vec<PlanConfig>,
    config: &AppConfig,
    universe: &[FundRecord],
    enricher: Option<Arc<Enricher>>,
    sink: &dyn ReportSink,
) -> Result<()> {
    for plan in plans {
        let target = plan.sheet_name().to_string();
        let pipeline = ScreeningPipeline::new(plan, config, enricher.clone())?;
        let table = pipeline.run(universe).await;
        if table.is_empty() {
            log::warn!("⚠️ 方案 {} 没有符合条件的基金，写出空表", table.plan);
        }
        sink.write(&table, &target).await?;
    }
    Ok(())
}

fn list_plans(path: Option<&Path>) -> Result<()> {
    let config = load_config(path)?;
    config.validate()?;

    for plan in &config.plans {
        println!("📋 {} -> {}", plan.name, plan.sheet_name());
        println!("   业绩基准: {}，排序周期: {}", plan.profile, plan.rank_by);
        if !plan.include_keywords.is_empty() {
            println!("   名称需包含: {}", plan.include_keywords.join(" + "));
        }
        if !plan.include_codes.is_empty() {
            println!("   代码白名单: {} 只", plan.include_codes.len());
        }
        println!("   屏蔽关键词: {} 个", plan.exclude_keywords.len());
        let thresholds: Vec<String> = plan.threshold_horizons.iter().map(|h| h.to_string()).collect();
        println!("   阈值周期: {}", if thresholds.is_empty() { "无".to_string() } else { thresholds.join(", ") });
        println!("   详情补充: {}", if plan.enrich { "是" } else { "否" });
    }
    Ok(())
}

/// 程序入口
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run(args).await,
        Command::Plans { config } => list_plans(config.as_deref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::models::RankedTable;
    use crate::services::common::beijing_today;
    use crate::services::providers::FundDetail;

    struct FailingSink;

    #[async_trait]
    impl ReportSink for FailingSink {
        async fn write(&self, _table: &RankedTable, target: &str) -> Result<()> {
            anyhow::bail!("写入 {} 失败: 磁盘已满", target)
        }
    }

    #[test]
    fn test_parse_horizon_arg() {
        assert_eq!(parse_horizon("1y"), Ok(Horizon::Y1));
        assert_eq!(parse_horizon("近3月"), Ok(Horizon::M3));
        let err = parse_horizon("10y").unwrap_err();
        println!("  错误信息: {}", err);
        assert!(err.contains("6m"));
    }

    #[tokio::test]
    async fn test_cache_saved_when_sink_fails() {
        println!("\n========== 测试写出失败时保存缓存 ==========");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let cache = DetailCache::load(&path, 1);
        let detail = FundDetail {
            turnover_rate: Some(210.0),
            ..FundDetail::default()
        };
        cache.put("韭菜说基金亮点", "015382", detail, beijing_today());

        let config = AppConfig::default();
        let plans = config.select_plans(&[]).unwrap();
        let outcome = run_plans(plans, &config, &[], None, &FailingSink).await;
        assert!(outcome.is_err());

        let result = save_cache_then(outcome, Some(&cache));
        println!("  运行结果: {:?}", result);
        assert!(result.is_err());
        assert_eq!(DetailCache::load(&path, 1).len(), 1);
        println!("✅ 写出失败时保存缓存测试通过！");
    }
}
