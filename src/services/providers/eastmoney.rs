//! 东方财富数据源
//!
//! - 开放式基金排行：对应 akshare 的 fund_open_fund_rank_em()
//! - 基金搜索：按名称查找同一基金的 A/C 份额
//! - 基金列表：对应 akshare 的 fund_name_em()
//! - 持仓明细：对应 akshare 的 fund_portfolio_hold_em()，计算前10大重仓股占比
//! - 规模变动和持有人结构：基金档案 gmbd / cyrjg 页面，各取最近5期

use std::collections::HashMap;
use std::sync::OnceLock;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate};
use regex::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use tokio::sync::OnceCell;

use super::types::{
    DetailProvider, FundDetail, FundNameLookup, FundSibling, ProviderError, SiblingSearch,
    UniverseSource,
};
use crate::models::{normalize_code, FundRecord, HolderPoint, Horizon, NetAssetPoint};
use crate::services::common::{
    beijing_today, parse_percent, unwrap_jsonp, EASTMONEY_ARCHIVES_URL, EASTMONEY_FUND_LIST_URL,
    EASTMONEY_RANK_REFERER, EASTMONEY_RANK_URL, EASTMONEY_SEARCH_URL,
};
use crate::services::retry::RetryPolicy;

/// 规模变动和持有人结构保留的报告期数
pub const HISTORY_PERIODS: usize = 5;

/// 排行行中各周期收益所在的列
const RANK_RETURN_COLUMNS: [(usize, Horizon); 8] = [
    (7, Horizon::W1),
    (8, Horizon::M1),
    (9, Horizon::M3),
    (10, Horizon::M6),
    (11, Horizon::Y1),
    (12, Horizon::Y2),
    (13, Horizon::Y3),
    (14, Horizon::Ytd),
];

async fn get_text(
    client: &Client,
    url: &str,
    query: &[(&str, String)],
    referer: &str,
) -> Result<String, ProviderError> {
    let response = client
        .get(url)
        .query(query)
        .header("Referer", referer)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(ProviderError::Status(response.status().as_u16()));
    }
    Ok(response.text().await?)
}

// ==================== 基金排行 ====================

/// 东方财富开放式基金排行（全部）
pub struct EastmoneyRank {
    client: Client,
    retry: RetryPolicy,
}

impl EastmoneyRank {
    pub fn new(client: Client, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }
}

fn rank_data_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)datas:\s*(\[.*?\])\s*,\s*allRecords").expect("排行正则无效")
    })
}

/// 解析排行接口返回的 `var rankData = {datas:[...],allRecords:...}`
pub fn parse_rank_data(text: &str) -> Result<Vec<FundRecord>, ProviderError> {
    let caps = rank_data_regex()
        .captures(text)
        .ok_or_else(|| ProviderError::shape("未找到排行数据 datas"))?;
    let lines: Vec<String> = serde_json::from_str(&caps[1])
        .map_err(|e| ProviderError::shape(format!("排行数据不是字符串列表: {}", e)))?;

    let mut records = Vec::with_capacity(lines.len());
    for line in &lines {
        match parse_rank_row(line) {
            Some(record) => records.push(record),
            None => log::warn!("⚠️ 跳过无法解析的排行行: {}", line),
        }
    }
    Ok(records)
}

/// 解析单行：代码,简称,拼音,日期,单位净值,累计净值,日增长率,近1周,...,今年来,成立来,...
fn parse_rank_row(line: &str) -> Option<FundRecord> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() < 15 {
        return None;
    }

    let code = normalize_code(fields[0])?;
    let name = fields[1].trim();
    let mut record = FundRecord {
        code,
        short_name: (!name.is_empty()).then(|| name.to_string()),
        nav_date: NaiveDate::parse_from_str(fields[3].trim(), "%Y-%m-%d").ok(),
        unit_nav: fields[4].trim().parse().ok(),
        ..FundRecord::default()
    };
    for (index, horizon) in RANK_RETURN_COLUMNS {
        record.set_return(horizon, fields[index].trim().parse().ok());
    }
    Some(record)
}

#[async_trait]
impl UniverseSource for EastmoneyRank {
    fn name(&self) -> &str {
        "东方财富开放式基金排行"
    }

    async fn load(&self) -> anyhow::Result<Vec<FundRecord>> {
        let today = beijing_today();
        let start = today - Duration::days(365);
        let query: Vec<(&str, String)> = vec![
            ("op", "ph".to_string()),
            ("dt", "kf".to_string()),
            ("ft", "all".to_string()),
            ("rs", String::new()),
            ("gs", "0".to_string()),
            ("sc", "6yzf".to_string()),
            ("st", "desc".to_string()),
            ("sd", start.format("%Y-%m-%d").to_string()),
            ("ed", today.format("%Y-%m-%d").to_string()),
            ("qdii", String::new()),
            ("tabSubtype", ",,,,,".to_string()),
            ("pi", "1".to_string()),
            ("pn", "30000".to_string()),
            ("dx", "1".to_string()),
            ("v", "0.1591891419018292".to_string()),
        ];

        log::info!("📡 请求东方财富基金排行 URL: {}", EASTMONEY_RANK_URL);
        let client = &self.client;
        let query = &query;
        let text = self
            .retry
            .run("基金排行", move || async move {
                get_text(client, EASTMONEY_RANK_URL, query, EASTMONEY_RANK_REFERER).await
            })
            .await
            .context("获取东方财富基金排行失败")?;

        let records = parse_rank_data(&text).context("解析东方财富基金排行失败")?;
        log::info!("📊 解析到 {} 条基金排行数据", records.len());
        Ok(records)
    }
}

// ==================== 基金搜索 ====================

/// 东方财富基金搜索，用于查找同一基金的各个份额
pub struct EastmoneySearch {
    client: Client,
    retry: RetryPolicy,
}

impl EastmoneySearch {
    pub fn new(client: Client, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }
}

/// 解析搜索接口响应，兼容 JSON 和 JSONP
///
/// ErrCode 不为 0 时返回 Remote 错误；Datas 不是列表时返回 Shape 错误
pub fn parse_search_response(text: &str) -> Result<Vec<FundSibling>, ProviderError> {
    let value: Value = match serde_json::from_str(text.trim()) {
        Ok(value) => value,
        Err(_) => {
            let inner = unwrap_jsonp(text).ok_or_else(|| ProviderError::shape("无效的响应格式"))?;
            serde_json::from_str(inner)
                .map_err(|e| ProviderError::shape(format!("搜索结果解析失败: {}", e)))?
        }
    };

    if !value.is_object() {
        return Err(ProviderError::shape("搜索结果不是对象"));
    }

    let err_code = value.get("ErrCode").and_then(Value::as_i64).unwrap_or(0);
    if err_code != 0 {
        return Err(ProviderError::Remote {
            code: err_code,
            message: value
                .get("ErrMsg")
                .and_then(Value::as_str)
                .unwrap_or("未知错误")
                .to_string(),
        });
    }

    let datas = match value.get("Datas") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(datas)) => datas,
        Some(other) => {
            return Err(ProviderError::shape(format!("Datas 不是列表: {}", other)));
        }
    };

    let mut siblings = Vec::new();
    for item in datas {
        let code = item
            .get("CODE")
            .and_then(Value::as_str)
            .and_then(normalize_code);
        let name = item.get("NAME").and_then(Value::as_str);
        match (code, name) {
            (Some(code), Some(name)) => siblings.push(FundSibling {
                code,
                name: name.trim().to_string(),
            }),
            _ => log::warn!("⚠️ 基金代码信息格式异常: {}", item),
        }
    }
    Ok(siblings)
}

#[async_trait]
impl SiblingSearch for EastmoneySearch {
    async fn search(&self, base_name: &str) -> Result<Vec<FundSibling>, ProviderError> {
        let client = &self.client;
        let query = [("m", "1".to_string()), ("key", base_name.to_string())];
        let query = &query;
        let text = self
            .retry
            .run("基金搜索", move || async move {
                get_text(client, EASTMONEY_SEARCH_URL, query, "https://fund.eastmoney.com/").await
            })
            .await?;
        parse_search_response(&text)
    }
}

// ==================== 基金列表 ====================

/// 东方财富全部基金列表，首次查询时下载并缓存
pub struct EastmoneyFundList {
    client: Client,
    retry: RetryPolicy,
    names: OnceCell<HashMap<String, String>>,
}

impl EastmoneyFundList {
    pub fn new(client: Client, retry: RetryPolicy) -> Self {
        Self {
            client,
            retry,
            names: OnceCell::new(),
        }
    }

    async fn fetch_names(&self) -> Result<HashMap<String, String>, ProviderError> {
        log::info!("📡 请求东方财富基金列表 URL: {}", EASTMONEY_FUND_LIST_URL);
        let client = &self.client;
        let text = self
            .retry
            .run("基金列表", move || async move {
                get_text(client, EASTMONEY_FUND_LIST_URL, &[], "http://fund.eastmoney.com/").await
            })
            .await?;
        let names = parse_fund_list_js(&text)?;
        log::info!("📊 基金列表共 {} 只基金", names.len());
        Ok(names)
    }
}

/// 解析 `var r = [["000001","HXCZHH","华夏成长混合","混合型-偏股","..."],...];`
pub fn parse_fund_list_js(text: &str) -> Result<HashMap<String, String>, ProviderError> {
    let start = text.find('[').ok_or_else(|| ProviderError::shape("基金列表缺少数组"))?;
    let end = text.rfind(']').ok_or_else(|| ProviderError::shape("基金列表缺少数组"))?;
    if end < start {
        return Err(ProviderError::shape("基金列表数组不完整"));
    }
    let rows: Vec<Vec<String>> = serde_json::from_str(&text[start..=end])
        .map_err(|e| ProviderError::shape(format!("基金列表解析失败: {}", e)))?;

    Ok(rows
        .into_iter()
        .filter_map(|row| {
            let code = normalize_code(row.first()?)?;
            let name = row.get(2)?.trim().to_string();
            Some((code, name))
        })
        .collect())
}

#[async_trait]
impl FundNameLookup for EastmoneyFundList {
    async fn display_name(&self, code: &str) -> Result<Option<String>, ProviderError> {
        let names = self.names.get_or_try_init(|| self.fetch_names()).await?;
        Ok(names.get(code).cloned())
    }
}

// ==================== 持仓明细 ====================

/// 东方财富季度持仓明细，作为前10大重仓股占比的备用来源
pub struct EastmoneyHoldings {
    client: Client,
    retry: RetryPolicy,
}

impl EastmoneyHoldings {
    pub fn new(client: Client, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    async fn fetch_year(&self, code: &str, year: i32) -> Result<String, ProviderError> {
        let client = &self.client;
        let query = [
            ("type", "jjcc".to_string()),
            ("code", code.to_string()),
            ("topline", "10".to_string()),
            ("year", year.to_string()),
            ("month", String::new()),
            ("rt", "0.913877".to_string()),
        ];
        let query = &query;
        let referer = format!("http://fundf10.eastmoney.com/ccmx_{}.html", code);
        let referer = referer.as_str();
        self.retry
            .run("持仓明细", move || async move {
                get_text(client, EASTMONEY_ARCHIVES_URL, query, referer).await
            })
            .await
    }
}

fn archives_content_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)content:\s*"((?:[^"\\]|\\.)*)""#).expect("档案正则无效")
    })
}

/// 取出 `var apidata={ content:"<div class='box'>...",arryear:[...],curyear:2024};` 中的 HTML
///
/// 持有人结构页面格式相同，只是 content 后面跟的字段不同
pub fn extract_archives_content(text: &str) -> Option<String> {
    let caps = archives_content_regex().captures(text)?;
    let html = caps[1].replace("\\\"", "\"").replace("\\/", "/");
    (!html.trim().is_empty()).then_some(html)
}

fn cell_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// 计算最新一个季度前10大重仓股的占净值比例之和（百分比，保留两位小数）
///
/// 页面按季度倒序排列，第一个 `div.box` 即最新季度
pub fn parse_top10_weight(html: &str) -> Option<f64> {
    let document = Html::parse_fragment(html);
    let box_selector = Selector::parse("div.box").ok()?;
    let table_selector = Selector::parse("table").ok()?;
    let th_selector = Selector::parse("th").ok()?;
    let tr_selector = Selector::parse("tr").ok()?;
    let td_selector = Selector::parse("td").ok()?;

    let table = match document.select(&box_selector).next() {
        Some(latest) => latest.select(&table_selector).next()?,
        None => document.select(&table_selector).next()?,
    };

    let headers: Vec<String> = table.select(&th_selector).map(cell_text).collect();
    let weight_index = headers.iter().position(|h| h.contains("占净值"));

    let mut total = 0.0;
    let mut counted = 0;
    let rows = table
        .select(&tr_selector)
        .map(|row| row.select(&td_selector).map(cell_text).collect::<Vec<_>>())
        .filter(|cells| !cells.is_empty())
        .take(10);
    for cells in rows {
        let cell = match weight_index {
            Some(index) => cells.get(index),
            None => cells.iter().rev().find(|c| c.ends_with('%')),
        };
        if let Some(weight) = cell.and_then(|c| parse_percent(c)) {
            total += weight;
            counted += 1;
        }
    }

    (counted > 0).then(|| (total * 100.0).round() / 100.0)
}

#[async_trait]
impl DetailProvider for EastmoneyHoldings {
    fn name(&self) -> &'static str {
        "东方财富持仓明细"
    }

    async fn fetch_detail(&self, code: &str) -> Result<FundDetail, ProviderError> {
        let current_year = beijing_today().year();
        // 年初时当年可能还没有披露，退回上一年
        for year in [current_year, current_year - 1] {
            let text = self.fetch_year(code, year).await?;
            let weight = extract_archives_content(&text).and_then(|html| parse_top10_weight(&html));
            if let Some(weight) = weight {
                return Ok(FundDetail {
                    top10_weight: Some(weight),
                    ..FundDetail::default()
                });
            }
            log::debug!("基金 {} {} 年无持仓明细", code, year);
        }
        Ok(FundDetail::default())
    }
}

// ==================== 规模变动 ====================

/// 东方财富份额/净资产规模变动（gmbd）
pub struct EastmoneyNetAssets {
    client: Client,
    retry: RetryPolicy,
}

impl EastmoneyNetAssets {
    pub fn new(client: Client, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }
}

fn gmbd_data_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""data":\s*(\[[^\]]*\])"#).expect("规模变动正则无效"))
}

/// 解析 `{"data":[{"FSRQ":"2024-03-31","NETNAV":1250000000.0,...}],...}`
///
/// 期末净资产换算为亿元保留两位小数，缺失记为 0；按日期倒序只保留最近几期
pub fn parse_net_assets(text: &str) -> Result<Vec<NetAssetPoint>, ProviderError> {
    let caps = gmbd_data_regex()
        .captures(text)
        .ok_or_else(|| ProviderError::shape("未找到规模变动数据 data"))?;
    let items: Vec<Value> = serde_json::from_str(&caps[1])
        .map_err(|e| ProviderError::shape(format!("规模变动数据解析失败: {}", e)))?;

    let mut points: Vec<NetAssetPoint> = items
        .iter()
        .filter_map(|item| {
            let date = item.get("FSRQ").and_then(Value::as_str)?;
            let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()?;
            let net_nav = match item.get("NETNAV") {
                Some(Value::Number(n)) => n.as_f64(),
                Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
                _ => None,
            };
            let net_assets = net_nav
                .filter(|v| v.is_finite())
                .map(|v| (v / 1e8 * 100.0).round() / 100.0)
                .unwrap_or(0.0);
            Some(NetAssetPoint { date, net_assets })
        })
        .collect();
    points.sort_by(|a, b| b.date.cmp(&a.date));
    points.truncate(HISTORY_PERIODS);
    Ok(points)
}

#[async_trait]
impl DetailProvider for EastmoneyNetAssets {
    fn name(&self) -> &'static str {
        "东方财富规模变动"
    }

    async fn fetch_detail(&self, code: &str) -> Result<FundDetail, ProviderError> {
        let client = &self.client;
        let query = [
            ("type", "gmbd".to_string()),
            ("mode", "0".to_string()),
            ("code", code.to_string()),
            ("rt", "0.3293533905262933".to_string()),
        ];
        let query = &query;
        let referer = format!("http://fundf10.eastmoney.com/gmbd_{}.html", code);
        let referer = referer.as_str();
        let text = self
            .retry
            .run("规模变动", move || async move {
                get_text(client, EASTMONEY_ARCHIVES_URL, query, referer).await
            })
            .await?;
        Ok(FundDetail {
            net_asset_history: parse_net_assets(&text)?,
            ..FundDetail::default()
        })
    }
}

// ==================== 持有人结构 ====================

/// 东方财富持有人结构（cyrjg）
pub struct EastmoneyHolders {
    client: Client,
    retry: RetryPolicy,
}

impl EastmoneyHolders {
    pub fn new(client: Client, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }
}

/// 解析持有人结构表：公告日期、机构持有比例、个人持有比例、内部持有比例、总份额（亿份）
///
/// "---" 等无法解析的比例和份额记为 0；表格按日期倒序，只取前几期
pub fn parse_holder_table(html: &str) -> Vec<HolderPoint> {
    let document = Html::parse_fragment(html);
    let (Ok(tr_selector), Ok(td_selector)) = (Selector::parse("tr"), Selector::parse("td")) else {
        return Vec::new();
    };

    document
        .select(&tr_selector)
        .map(|row| row.select(&td_selector).map(cell_text).collect::<Vec<_>>())
        .filter(|cells| cells.len() >= 5)
        .filter_map(|cells| {
            let date = NaiveDate::parse_from_str(&cells[0], "%Y-%m-%d").ok()?;
            Some(HolderPoint {
                date,
                institution_ratio: parse_percent(&cells[1]).unwrap_or(0.0),
                total_shares: cells[4]
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .unwrap_or(0.0),
            })
        })
        .take(HISTORY_PERIODS)
        .collect()
}

#[async_trait]
impl DetailProvider for EastmoneyHolders {
    fn name(&self) -> &'static str {
        "东方财富持有人结构"
    }

    async fn fetch_detail(&self, code: &str) -> Result<FundDetail, ProviderError> {
        let client = &self.client;
        let query = [
            ("type", "cyrjg".to_string()),
            ("code", code.to_string()),
            ("rt", "0.3293533905262933".to_string()),
        ];
        let query = &query;
        let referer = format!("http://fundf10.eastmoney.com/cyrjg_{}.html", code);
        let referer = referer.as_str();
        let text = self
            .retry
            .run("持有人结构", move || async move {
                get_text(client, EASTMONEY_ARCHIVES_URL, query, referer).await
            })
            .await?;
        let html = extract_archives_content(&text)
            .ok_or_else(|| ProviderError::shape("未找到持有人结构数据"))?;
        Ok(FundDetail {
            holder_history: parse_holder_table(&html),
            ..FundDetail::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rank_data() {
        println!("\n========== 测试解析基金排行 ==========");
        let text = r#"var rankData = {datas:["015381,东方兴瑞趋势领航混合A,DFXRQSLHHHA,2024-05-10,1.2345,1.2345,0.52,1.50,3.30,5.10,25.00,30.00,,,12.00,23.45,,",
"015382,东方兴瑞趋势领航混合C,DFXRQSLHHHC,2024-05-10,1.2200,1.2200,0.51,1.48,3.25,5.00,24.80,29.60,,,11.90,22.10,,",
"bad,row"],allRecords:3,pageIndex:1,pageNum:30000,allPages:1,allNum:3};"#;

        let records = parse_rank_data(text).unwrap();
        for r in &records {
            println!("  {} {} 近6月={:?}", r.code, r.name(), r.return_of(Horizon::M6));
        }
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.code, "015381");
        assert_eq!(first.name(), "东方兴瑞趋势领航混合A");
        assert_eq!(first.nav_date, NaiveDate::from_ymd_opt(2024, 5, 10));
        assert_eq!(first.return_of(Horizon::W1), Some(1.50));
        assert_eq!(first.return_of(Horizon::M6), Some(25.00));
        assert_eq!(first.return_of(Horizon::Y1), Some(30.00));
        assert_eq!(first.return_of(Horizon::Y2), None);
        assert_eq!(first.return_of(Horizon::Ytd), Some(12.00));
        println!("✅ 基金排行解析测试通过！");
    }

    #[test]
    fn test_parse_rank_data_missing_block() {
        assert!(matches!(parse_rank_data("<html></html>"), Err(ProviderError::Shape(_))));
    }

    #[test]
    fn test_parse_search_response_json_and_jsonp() {
        let json = r#"{"ErrCode":0,"ErrMsg":null,"Datas":[
            {"CODE":"015381","NAME":"东方兴瑞趋势领航混合A"},
            {"CODE":"015382","NAME":"东方兴瑞趋势领航混合C"},
            {"NAME":"缺少代码"}]}"#;
        let siblings = parse_search_response(json).unwrap();
        assert_eq!(siblings.len(), 2);
        assert_eq!(siblings[1].code, "015382");

        let jsonp = format!("jQuery18305({});", json);
        assert_eq!(parse_search_response(&jsonp).unwrap(), siblings);
    }

    #[test]
    fn test_parse_search_response_errors() {
        let err = parse_search_response(r#"{"ErrCode":1,"ErrMsg":"参数错误"}"#).unwrap_err();
        assert!(matches!(err, ProviderError::Remote { code: 1, .. }));

        let err = parse_search_response(r#"{"ErrCode":0,"Datas":"oops"}"#).unwrap_err();
        assert!(matches!(err, ProviderError::Shape(_)));

        assert!(parse_search_response("[1,2,3]").is_err());
        assert!(parse_search_response("not json").is_err());
        assert!(parse_search_response(r#"{"ErrCode":0}"#).unwrap().is_empty());
    }

    #[test]
    fn test_parse_fund_list_js() {
        let text = r#"var r = [["000001","HXCZHH","华夏成长混合","混合型-偏股","HUAXIACHENGZHANGHUNHE"],["015381","DFXR","东方兴瑞趋势领航混合A","混合型-偏股","DFXR"]];"#;
        let names = parse_fund_list_js(text).unwrap();
        assert_eq!(names.len(), 2);
        assert_eq!(names.get("000001").map(String::as_str), Some("华夏成长混合"));
    }

    #[test]
    fn test_parse_top10_weight() {
        println!("\n========== 测试前10大重仓股占比 ==========");
        let mut rows = String::new();
        for i in 1..=12 {
            rows.push_str(&format!(
                "<tr><td>{}</td><td>6000{:02}</td><td>股票{}</td><td class='tor'>5.00%</td><td class='tor'>100.00</td></tr>",
                i, i, i
            ));
        }
        let html = format!(
            "<div class='box'><h4>2024年1季度股票投资明细</h4><table><thead><tr><th>序号</th><th>股票代码</th><th>股票名称</th><th>占净值比例</th><th>持股数（万股）</th></tr></thead><tbody>{}</tbody></table></div>\
             <div class='box'><h4>2023年4季度股票投资明细</h4><table><thead><tr><th>序号</th><th>股票代码</th><th>股票名称</th><th>占净值比例</th><th>持股数（万股）</th></tr></thead><tbody><tr><td>1</td><td>600000</td><td>旧</td><td>99.00%</td><td>1</td></tr></tbody></table></div>",
            rows
        );
        let weight = parse_top10_weight(&html);
        println!("  前10大占比: {:?}", weight);
        // 只取最新季度的前10行
        assert_eq!(weight, Some(50.0));
        println!("✅ 前10大重仓股占比测试通过！");
    }

    #[test]
    fn test_extract_archives_content() {
        let text = r#"var apidata={ content:"<div class='box'><table></table></div>",arryear:[2024,2023],curyear:2024};"#;
        assert_eq!(
            extract_archives_content(text).as_deref(),
            Some("<div class='box'><table></table></div>")
        );
        let empty = r#"var apidata={ content:"",arryear:[],curyear:2024};"#;
        assert_eq!(extract_archives_content(empty), None);
        assert_eq!(parse_top10_weight("<div class='box'><table></table></div>"), None);
    }

    #[test]
    fn test_parse_net_assets() {
        println!("\n========== 测试解析规模变动 ==========");
        let text = r#"var gmbd_apidata={"data":[
            {"FSRQ":"2023-06-30","NETNAV":900000000.0},
            {"FSRQ":"2024-03-31","NETNAV":1254321000.0},
            {"FSRQ":"2023-12-31","NETNAV":null},
            {"FSRQ":"2023-09-30","NETNAV":"1000000000"},
            {"FSRQ":"2023-03-31","NETNAV":800000000.0},
            {"FSRQ":"2022-12-31","NETNAV":700000000.0},
            {"FSRQ":"bad","NETNAV":1.0}],"ErrCode":0};"#;
        let points = parse_net_assets(text).unwrap();
        for p in &points {
            println!("  {} {:.2}亿元", p.date, p.net_assets);
        }
        let dates: Vec<String> = points.iter().map(|p| p.date.to_string()).collect();
        assert_eq!(
            dates,
            vec!["2024-03-31", "2023-12-31", "2023-09-30", "2023-06-30", "2023-03-31"]
        );
        assert_eq!(points[0].net_assets, 12.54);
        assert_eq!(points[1].net_assets, 0.0);
        assert_eq!(points[2].net_assets, 10.0);
        assert!(matches!(parse_net_assets("<html></html>"), Err(ProviderError::Shape(_))));
        println!("✅ 规模变动解析测试通过！");
    }

    #[test]
    fn test_parse_holder_table() {
        let text = r#"var apidata={ content:"<table class='w782 comm cyrjg'><thead><tr><th>公告日期</th><th>机构持有比例</th><th>个人持有比例</th><th>内部持有比例</th><th>总份额（亿份）</th></tr></thead><tbody><tr><td>2024-06-30</td><td class='tor'>35.20%</td><td class='tor'>64.70%</td><td class='tor'>0.10%</td><td class='tor'>2.50</td></tr><tr><td>2023-12-31</td><td class='tor'>---</td><td class='tor'>---</td><td class='tor'>---</td><td class='tor'>---</td></tr></tbody></table>",summary:""};"#;
        let html = extract_archives_content(text).unwrap();
        let points = parse_holder_table(&html);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, NaiveDate::from_ymd_opt(2024, 6, 30).unwrap());
        assert_eq!(points[0].institution_ratio, 35.2);
        assert_eq!(points[0].total_shares, 2.5);
        // 无法解析的数值记为 0
        assert_eq!(points[1].institution_ratio, 0.0);
        assert_eq!(points[1].total_shares, 0.0);
    }
}
