//! 基金数据模型
//!
//! 定义基金排行行、收益周期、规模金额等数据结构

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// 收益统计周期
///
/// 序列化键为 `1w/1m/3m/6m/1y/2y/3y/ytd`，同时接受东方财富排行表的中文列名
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Horizon {
    #[serde(rename = "1w", alias = "近1周")]
    W1,
    #[serde(rename = "1m", alias = "近1月")]
    M1,
    #[serde(rename = "3m", alias = "近3月")]
    M3,
    #[serde(rename = "6m", alias = "近6月")]
    M6,
    #[serde(rename = "1y", alias = "近1年")]
    Y1,
    #[serde(rename = "2y", alias = "近2年")]
    Y2,
    #[serde(rename = "3y", alias = "近3年")]
    Y3,
    #[serde(rename = "ytd", alias = "今年来")]
    Ytd,
}

impl Horizon {
    pub const ALL: [Horizon; 8] = [
        Horizon::W1,
        Horizon::M1,
        Horizon::M3,
        Horizon::M6,
        Horizon::Y1,
        Horizon::Y2,
        Horizon::Y3,
        Horizon::Ytd,
    ];

    /// 配置和报告中使用的短键
    pub fn key(&self) -> &'static str {
        match self {
            Horizon::W1 => "1w",
            Horizon::M1 => "1m",
            Horizon::M3 => "3m",
            Horizon::M6 => "6m",
            Horizon::Y1 => "1y",
            Horizon::Y2 => "2y",
            Horizon::Y3 => "3y",
            Horizon::Ytd => "ytd",
        }
    }

    /// 东方财富排行表中的列名
    pub fn label(&self) -> &'static str {
        match self {
            Horizon::W1 => "近1周",
            Horizon::M1 => "近1月",
            Horizon::M3 => "近3月",
            Horizon::M6 => "近6月",
            Horizon::Y1 => "近1年",
            Horizon::Y2 => "近2年",
            Horizon::Y3 => "近3年",
            Horizon::Ytd => "今年来",
        }
    }

    /// 按短键或中文列名查找周期
    pub fn parse(text: &str) -> Option<Horizon> {
        let text = text.trim();
        Horizon::ALL
            .into_iter()
            .find(|h| h.key().eq_ignore_ascii_case(text) || h.label() == text)
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 规模单位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScaleUnit {
    #[serde(rename = "亿")]
    Yi,
    #[serde(rename = "万")]
    Wan,
}

/// 规模金额（数值 + 单位）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleAmount {
    pub value: f64,
    pub unit: ScaleUnit,
}

fn amount_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+(?:\.\d+)?)\s*(亿|万)?").expect("金额正则无效"))
}

impl ScaleAmount {
    pub fn yi(value: f64) -> Self {
        Self { value, unit: ScaleUnit::Yi }
    }

    pub fn wan(value: f64) -> Self {
        Self { value, unit: ScaleUnit::Wan }
    }

    /// 换算为以"亿"为单位的数值（1亿 = 10000万）
    pub fn in_yi(&self) -> f64 {
        match self.unit {
            ScaleUnit::Yi => self.value,
            ScaleUnit::Wan => self.value / 10_000.0,
        }
    }

    /// 解析本地化金额字符串，如 "12.50亿元"、"5692.07万"、"基金最新一期规模1.97亿"
    ///
    /// 没有单位的数字按"亿"处理；无法解析时返回 None
    pub fn parse(text: &str) -> Option<Self> {
        let caps = amount_regex().captures(text)?;
        let value: f64 = caps.get(1)?.as_str().parse().ok()?;
        if !value.is_finite() {
            return None;
        }
        match caps.get(2).map(|m| m.as_str()) {
            Some("万") => Some(Self::wan(value)),
            _ => Some(Self::yi(value)),
        }
    }
}

impl fmt::Display for ScaleAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.unit {
            ScaleUnit::Yi => write!(f, "{:.2}亿元", self.value),
            ScaleUnit::Wan => write!(f, "{:.2}万元", self.value),
        }
    }
}

/// 某一报告期的期末净资产（亿元）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetAssetPoint {
    pub date: NaiveDate,
    pub net_assets: f64,
}

/// 某一报告期的持有人结构
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HolderPoint {
    pub date: NaiveDate,
    /// 机构持有比例（百分比）
    pub institution_ratio: f64,
    /// 总份额（亿份）
    pub total_shares: f64,
}

/// 基金份额排行记录
///
/// 一行对应一个份额类别（A/C 类各自独立代码），筛选流程在其上逐步追加列
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FundRecord {
    /// 基金代码（6位，保留前导零）
    pub code: String,
    /// 基金简称，可能带 A/C 份额后缀
    pub short_name: Option<String>,
    /// 各周期收益率（百分比），缺失即不存在该键
    pub returns: BTreeMap<Horizon, f64>,
    /// 净值日期
    pub nav_date: Option<NaiveDate>,
    /// 单位净值
    pub unit_nav: Option<f64>,
    /// 成立时间
    pub inception_date: Option<NaiveDate>,
    /// 本份额最新规模
    pub latest_scale: Option<ScaleAmount>,
    /// 同一基金各份额规模之和
    pub aggregated_scale: Option<ScaleAmount>,
    /// 换手率（百分比）
    pub turnover_rate: Option<f64>,
    /// 前10大重仓股占净值比例（百分比）
    pub top10_holding_weight: Option<f64>,
    /// 持股行业集中度
    pub sector_concentration: Option<String>,
    /// 各份额合并后的净资产变动，按报告期倒序
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub net_asset_history: Vec<NetAssetPoint>,
    /// 各份额合并后的持有人结构，机构持有比例按份额加权
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub holder_history: Vec<HolderPoint>,
    /// 相对基准的超额收益（百分点），收益缺失时为 None
    pub excess: BTreeMap<Horizon, Option<f64>>,
}

impl FundRecord {
    /// 写入收益率，NaN 和 None 都视为缺失
    pub fn set_return(&mut self, horizon: Horizon, value: Option<f64>) {
        match value.filter(|v| v.is_finite()) {
            Some(v) => {
                self.returns.insert(horizon, v);
            }
            None => {
                self.returns.remove(&horizon);
            }
        }
    }

    pub fn return_of(&self, horizon: Horizon) -> Option<f64> {
        self.returns.get(&horizon).copied()
    }

    pub fn excess_of(&self, horizon: Horizon) -> Option<f64> {
        self.excess.get(&horizon).copied().flatten()
    }

    pub fn name(&self) -> &str {
        self.short_name.as_deref().unwrap_or("")
    }
}

#[cfg(test)]
impl FundRecord {
    pub fn new(code: impl Into<String>, short_name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            short_name: Some(short_name.into()),
            ..Self::default()
        }
    }

    pub fn with_return(mut self, horizon: Horizon, value: f64) -> Self {
        self.set_return(horizon, Some(value));
        self
    }
}

/// 规范化基金代码为6位数字，不足补零
pub fn normalize_code(raw: &str) -> Option<String> {
    let raw = raw.trim();
    // Excel 中的数字代码可能带 ".0"
    let raw = raw.strip_suffix(".0").unwrap_or(raw);
    if raw.is_empty() || raw.len() > 6 || !raw.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(format!("{:0>6}", raw))
}

/// 去掉名称末尾的 A/C 份额后缀，得到同一基金的基础名称
pub fn base_fund_name(name: &str) -> &str {
    name.strip_suffix('A')
        .or_else(|| name.strip_suffix('C'))
        .unwrap_or(name)
}
