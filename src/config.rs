//! 配置模块
//!
//! 支持从 JSON 文件加载系统配置，包括业绩基准和筛选方案

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::{BenchmarkProfile, Horizon};

/// 配置错误，出现即终止本次运行
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("读取配置文件 {path} 失败: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path} 失败: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("未知的业绩基准: {0}")]
    UnknownProfile(String),
    #[error("业绩基准 {profile} 为空")]
    EmptyProfile { profile: String },
    #[error("业绩基准 {profile} 的 {horizon} 数值无效: {value}")]
    InvalidBenchmark {
        profile: String,
        horizon: Horizon,
        value: f64,
    },
    #[error("方案 {plan} 的{list}第 {index} 项为空")]
    EmptyKeyword {
        plan: String,
        list: &'static str,
        index: usize,
    },
    #[error("方案 {plan} 使用的周期 {horizon} 不在业绩基准 {profile} 中")]
    HorizonNotInProfile {
        plan: String,
        horizon: Horizon,
        profile: String,
    },
    #[error("未知的筛选方案: {0}")]
    UnknownPlan(String),
    #[error("没有可执行的筛选方案")]
    NoPlans,
    #[error("配置无效: {0}")]
    Invalid(String),
}

/// 外部接口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// 单次请求超时时间（秒）
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// 连接超时时间（秒）
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// 单次调用最多尝试次数（含首次）
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// 重试退避基数（毫秒），每次翻倍
    #[serde(default = "default_backoff_millis")]
    pub backoff_millis: u64,
    /// 详情补充并发数，1 表示逐只顺序处理
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 日志级别: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// 详情缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_cache_path")]
    pub path: String,
    /// 缓存有效天数
    #[serde(default = "default_cache_days")]
    pub cache_days: i64,
}

/// 份额历史配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// 详情补充时是否合并各份额的规模变动和持有人结构
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// 数据源配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UniverseConfig {
    /// 离线排行快照（JSON），为空则请求东方财富排行
    #[serde(default)]
    pub snapshot_file: Option<String>,
    /// 基金列表 Excel（含"基金代码""基金简称"列），为空则请求东方财富基金列表
    #[serde(default)]
    pub fund_list_xlsx: Option<String>,
}

/// 输出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: String,
    /// 每个周期高亮的前N名
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// 进入前N名的周期数达到该值时标记基金简称
    #[serde(default = "default_star_min")]
    pub star_min_horizons: usize,
    /// 参与高亮统计的周期
    #[serde(default = "default_highlight_horizons")]
    pub highlight_horizons: Vec<Horizon>,
}

/// 超额收益一致性规则：horizon 的超额收益不低于锚定周期超额收益的 ratio 倍
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyRule {
    pub horizon: Horizon,
    pub ratio: f64,
}

/// 补充后过滤的阈值
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostFilterConfig {
    /// 换手率下限（百分比），低于该值的基金被剔除
    #[serde(default = "default_min_turnover")]
    pub min_turnover: f64,
    /// 合并规模下限（亿）
    #[serde(default = "default_scale_min")]
    pub scale_min_yi: f64,
    /// 合并规模上限（亿）
    #[serde(default = "default_scale_max")]
    pub scale_max_yi: f64,
    /// 前10大重仓股占比上限（百分比，不含）
    #[serde(default = "default_max_top10")]
    pub max_top10_weight: f64,
    /// 一致性规则的锚定周期
    #[serde(default = "default_consistency_anchor")]
    pub consistency_anchor: Horizon,
    #[serde(default = "default_consistency_rules")]
    pub consistency_rules: Vec<ConsistencyRule>,
}

/// 单个方案启用的补充后过滤
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostFilterToggles {
    #[serde(default = "default_true")]
    pub turnover: bool,
    #[serde(default = "default_true")]
    pub scale: bool,
    #[serde(default = "default_true")]
    pub holdings: bool,
    #[serde(default = "default_true")]
    pub consistency: bool,
}

/// 筛选方案
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanConfig {
    pub name: String,
    /// 写出目标（工作表名），为空时使用方案名
    #[serde(default)]
    pub sheet: Option<String>,
    /// 业绩基准名称
    #[serde(default = "default_profile_name")]
    pub profile: String,
    /// 名称必须同时包含的关键词
    #[serde(default)]
    pub include_keywords: Vec<String>,
    /// 代码白名单，为空表示不限制
    #[serde(default)]
    pub include_codes: Vec<String>,
    /// 名称包含任一关键词即剔除
    #[serde(default)]
    pub exclude_keywords: Vec<String>,
    /// 缺失该周期收益的基金直接剔除
    #[serde(default = "default_pivot")]
    pub pivot: Horizon,
    /// 需要不低于基准的周期
    #[serde(default)]
    pub threshold_horizons: Vec<Horizon>,
    #[serde(default = "default_true")]
    pub enrich: bool,
    #[serde(default)]
    pub post_filters: PostFilterToggles,
    #[serde(default = "default_pivot")]
    pub rank_by: Horizon,
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub universe: UniverseConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub post_filter: PostFilterConfig,
    /// 业绩基准：名称 -> 周期 -> 收益率
    #[serde(default = "default_profiles")]
    pub profiles: BTreeMap<String, BTreeMap<Horizon, f64>>,
    #[serde(default = "default_plans")]
    pub plans: Vec<PlanConfig>,
}

// 默认值函数
fn default_timeout() -> u64 { 15 }
fn default_connect_timeout() -> u64 { 10 }
fn default_max_attempts() -> u32 { 3 }
fn default_backoff_millis() -> u64 { 1000 }
fn default_concurrency() -> usize { 4 }
fn default_log_level() -> String { "info".to_string() }
fn default_cache_path() -> String { "cache/fund_detail.json".to_string() }
fn default_cache_days() -> i64 { 1 }
fn default_output_dir() -> String { "output".to_string() }
fn default_top_n() -> usize { 10 }
fn default_star_min() -> usize { 5 }
fn default_min_turnover() -> f64 { 200.0 }
fn default_scale_min() -> f64 { 0.2 }
fn default_scale_max() -> f64 { 40.0 }
fn default_max_top10() -> f64 { 40.0 }
fn default_consistency_anchor() -> Horizon { Horizon::Y1 }
fn default_pivot() -> Horizon { Horizon::M6 }
fn default_true() -> bool { true }
fn default_profile_name() -> String { BenchmarkProfile::csi_all_share().name }

fn default_highlight_horizons() -> Vec<Horizon> {
    vec![Horizon::W1, Horizon::M1, Horizon::M3, Horizon::M6, Horizon::Y1, Horizon::Ytd]
}

fn default_consistency_rules() -> Vec<ConsistencyRule> {
    vec![
        ConsistencyRule { horizon: Horizon::M6, ratio: 0.5 },
        ConsistencyRule { horizon: Horizon::M3, ratio: 0.25 },
        // 按年化估算
        ConsistencyRule { horizon: Horizon::M1, ratio: 0.08 },
    ]
}

fn default_profiles() -> BTreeMap<String, BTreeMap<Horizon, f64>> {
    let profile = BenchmarkProfile::csi_all_share();
    BTreeMap::from([(profile.name, profile.returns)])
}

fn default_plans() -> Vec<PlanConfig> {
    vec![PlanConfig::momentum()]
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            max_attempts: default_max_attempts(),
            backoff_millis: default_backoff_millis(),
            concurrency: default_concurrency(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_cache_path(),
            cache_days: default_cache_days(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            top_n: default_top_n(),
            star_min_horizons: default_star_min(),
            highlight_horizons: default_highlight_horizons(),
        }
    }
}

impl Default for PostFilterConfig {
    fn default() -> Self {
        Self {
            min_turnover: default_min_turnover(),
            scale_min_yi: default_scale_min(),
            scale_max_yi: default_scale_max(),
            max_top10_weight: default_max_top10(),
            consistency_anchor: default_consistency_anchor(),
            consistency_rules: default_consistency_rules(),
        }
    }
}

impl Default for PostFilterToggles {
    fn default() -> Self {
        Self {
            turnover: true,
            scale: true,
            holdings: true,
            consistency: true,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            log: LogConfig::default(),
            cache: CacheConfig::default(),
            history: HistoryConfig::default(),
            universe: UniverseConfig::default(),
            output: OutputConfig::default(),
            post_filter: PostFilterConfig::default(),
            profiles: default_profiles(),
            plans: default_plans(),
        }
    }
}

impl PlanConfig {
    /// 全市场主动基金动量筛选：四个周期跑赢中证全指，剔除主题/指数/债券类
    pub fn momentum() -> Self {
        let exclude_keywords = [
            "持有", "A", "通信", "期货", "有色", "黄金", "半导体", "芯片", "云计算", "商品",
            "创业板", "中证资源", "电信", "物联网", "工程机械", "医药生物", "稀有金属", "科创板",
            "科创创业", "人工智能", "上海金", "TMT", "指数", "可转债", "债券", "化工", "碳中和",
            "ESG", "ETF",
        ];
        Self {
            name: "momentum".to_string(),
            sheet: Some("超额收益筛选".to_string()),
            profile: default_profile_name(),
            include_keywords: Vec::new(),
            include_codes: Vec::new(),
            exclude_keywords: exclude_keywords.iter().map(|s| s.to_string()).collect(),
            pivot: Horizon::M6,
            threshold_horizons: vec![Horizon::Y1, Horizon::M6, Horizon::M3, Horizon::M1],
            enrich: true,
            post_filters: PostFilterToggles::default(),
            rank_by: Horizon::M6,
        }
    }

    pub fn sheet_name(&self) -> &str {
        self.sheet.as_deref().unwrap_or(&self.name)
    }
}

impl AppConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// 加载配置：优先使用指定文件，其次查找默认位置，都没有则使用默认值
    ///
    /// 返回实际使用的配置文件路径。配置文件存在但无法解析时直接报错，
    /// 业绩基准和屏蔽词都来自配置，不能静默回退到默认值
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        if let Some(path) = explicit {
            return Ok((Self::from_file(path)?, Some(path.to_path_buf())));
        }

        let config_paths = ["config.json", "config/config.json"];
        for path in config_paths {
            let path = Path::new(path);
            if path.exists() {
                return Ok((Self::from_file(path)?, Some(path.to_path_buf())));
            }
        }

        Ok((Self::default(), None))
    }

    /// 按名称取业绩基准
    pub fn profile(&self, name: &str) -> Result<BenchmarkProfile, ConfigError> {
        self.profiles
            .get(name)
            .map(|returns| BenchmarkProfile::new(name, returns.clone()))
            .ok_or_else(|| ConfigError::UnknownProfile(name.to_string()))
    }

    /// 按名称选择方案，names 为空时返回全部方案
    pub fn select_plans(&self, names: &[String]) -> Result<Vec<PlanConfig>, ConfigError> {
        if names.is_empty() {
            if self.plans.is_empty() {
                return Err(ConfigError::NoPlans);
            }
            return Ok(self.plans.clone());
        }
        names
            .iter()
            .map(|name| {
                self.plans
                    .iter()
                    .find(|p| &p.name == name)
                    .cloned()
                    .ok_or_else(|| ConfigError::UnknownPlan(name.clone()))
            })
            .collect()
    }

    /// 校验配置，任何一项失败都不应开始抓取
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.concurrency == 0 {
            return Err(ConfigError::Invalid("api.concurrency 必须大于 0".to_string()));
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::Invalid("api.timeout_secs 必须大于 0".to_string()));
        }

        for (name, returns) in &self.profiles {
            if returns.is_empty() {
                return Err(ConfigError::EmptyProfile { profile: name.clone() });
            }
            for (horizon, value) in returns {
                if !value.is_finite() {
                    return Err(ConfigError::InvalidBenchmark {
                        profile: name.clone(),
                        horizon: *horizon,
                        value: *value,
                    });
                }
            }
        }

        let post = &self.post_filter;
        if !(post.scale_min_yi <= post.scale_max_yi) {
            return Err(ConfigError::Invalid(format!(
                "规模区间无效: [{}, {}]",
                post.scale_min_yi, post.scale_max_yi
            )));
        }
        if post.consistency_rules.iter().any(|r| !r.ratio.is_finite()) {
            return Err(ConfigError::Invalid("一致性规则比例无效".to_string()));
        }

        if self.plans.is_empty() {
            return Err(ConfigError::NoPlans);
        }
        for plan in &self.plans {
            self.validate_plan(plan)?;
        }
        Ok(())
    }

    fn validate_plan(&self, plan: &PlanConfig) -> Result<(), ConfigError> {
        let profile = self.profile(&plan.profile)?;

        let keyword_lists = [
            ("屏蔽关键词", &plan.exclude_keywords),
            ("包含关键词", &plan.include_keywords),
        ];
        for (list, keywords) in keyword_lists {
            if let Some(index) = keywords.iter().position(|k| k.is_empty()) {
                return Err(ConfigError::EmptyKeyword {
                    plan: plan.name.clone(),
                    list,
                    index,
                });
            }
        }

        // 排序只读取基金自身收益，不要求在业绩基准中
        let mut required: Vec<Horizon> = plan.threshold_horizons.clone();
        if plan.post_filters.consistency {
            required.push(self.post_filter.consistency_anchor);
            required.extend(self.post_filter.consistency_rules.iter().map(|r| r.horizon));
        }
        for horizon in required {
            if profile.get(horizon).is_none() {
                return Err(ConfigError::HorizonNotInProfile {
                    plan: plan.name.clone(),
                    horizon,
                    profile: profile.name.clone(),
                });
            }
        }
        Ok(())
    }
}
