//! 公共常量和辅助函数

use std::sync::OnceLock;
use std::time::Duration;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use chrono_tz::Asia::Shanghai;
use regex::Regex;
use reqwest::Client;

use crate::config::ApiConfig;

// ==================== 东方财富 API 常量 ====================

/// 开放式基金排行
pub const EASTMONEY_RANK_URL: &str = "https://fund.eastmoney.com/data/rankhandler.aspx";
/// 排行接口要求的来源页
pub const EASTMONEY_RANK_REFERER: &str = "https://fund.eastmoney.com/fundguzhi.html";
/// 基金搜索建议
pub const EASTMONEY_SEARCH_URL: &str =
    "https://fundsuggest.eastmoney.com/FundSearch/api/FundSearchAPI.ashx";
/// 全部基金代码与名称
pub const EASTMONEY_FUND_LIST_URL: &str = "http://fund.eastmoney.com/js/fundcode_search.js";
/// 基金档案（持仓明细等）
pub const EASTMONEY_ARCHIVES_URL: &str = "http://fundf10.eastmoney.com/FundArchivesDatas.aspx";

// ==================== 其他数据源常量 ====================

/// 韭菜说基金亮点（换手率、重仓占比、行业集中度）
pub const JIUCAISHUO_HIGHLIGHTS_URL: &str =
    "https://apiv2.jiucaishuo.com/funddetail/detail/fund-high-lights";
/// 蛋卷基金档案（成立时间、最新规模）
pub const DANJUAN_FUND_URL: &str = "https://danjuanfunds.com/djapi/fund";

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// 获取北京时间字符串（ISO 8601 格式，带+08:00时区）
pub fn get_beijing_time() -> String {
    Utc::now().with_timezone(&Shanghai).to_rfc3339()
}

/// 北京时间当天日期
pub fn beijing_today() -> NaiveDate {
    Utc::now().with_timezone(&Shanghai).date_naive()
}

/// 按配置构建 HTTP 客户端
pub fn build_http_client(api: &ApiConfig) -> Result<Client> {
    let client = Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(api.timeout_secs))
        .connect_timeout(Duration::from_secs(api.connect_timeout_secs))
        .gzip(true)
        .build()?;
    Ok(client)
}

fn numeric_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-?\d+(?:\.\d+)?(?:%|亿|万)?").expect("数值正则无效"))
}

fn percent_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(-?\d+(?:\.\d+)?)\s*%").expect("百分比正则无效"))
}

/// 从文本中提取第一个数字及其单位，例如从"基金最新一期规模5692.07万"提取"5692.07万"
pub fn extract_numeric_value(text: &str) -> Option<&str> {
    numeric_regex().find(text).map(|m| m.as_str())
}

/// 解析百分比字符串，如 "215.3%"、"换手率 30%"，纯数字按百分比数值处理
///
/// 无法解析（"获取失败"、"--"、空串）时返回 None
pub fn parse_percent(text: &str) -> Option<f64> {
    let text = text.trim();
    let value = match percent_regex().captures(text) {
        Some(caps) => caps.get(1)?.as_str().parse::<f64>().ok()?,
        None => text.parse::<f64>().ok()?,
    };
    value.is_finite().then_some(value)
}

/// 去掉 JSONP 包装，如 `cb({...})` -> `{...}`
pub fn unwrap_jsonp(text: &str) -> Option<&str> {
    let text = text.trim().trim_end_matches(';');
    let start = text.find('(')?;
    let end = text.rfind(')')?;
    (end > start).then(|| &text[start + 1..end])
}

/// 依次尝试 UTF-8 和 GBK 解码响应体
pub fn decode_body(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let (text, _, had_errors) = encoding_rs::GBK.decode(bytes);
            if had_errors {
                String::from_utf8_lossy(bytes).into_owned()
            } else {
                text.into_owned()
            }
        }
    }
}
