//! 韭菜说基金亮点
//!
//! 主详情来源：换手率、前10大重仓股占比、持股行业集中度

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::types::{DetailProvider, FundDetail, ProviderError};
use crate::services::common::{
    decode_body, extract_numeric_value, parse_percent, JIUCAISHUO_HIGHLIGHTS_URL,
};
use crate::services::retry::RetryPolicy;

pub struct JiucaishuoHighlights {
    client: Client,
    retry: RetryPolicy,
}

impl JiucaishuoHighlights {
    pub fn new(client: Client, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    async fn post_highlights(&self, code: &str) -> Result<String, ProviderError> {
        let payload = json!({ "fund_code": code, "type": "h5" });
        let response = self
            .client
            .post(JIUCAISHUO_HIGHLIGHTS_URL)
            .header("Accept", "application/json, text/plain, */*")
            .header("Accept-Language", "zh-CN,zh;q=0.9,en;q=0.8")
            .header("Referer", "https://apiv2.jiucaishuo.com/")
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status().as_u16()));
        }
        let bytes = response.bytes().await?;
        Ok(decode_body(&bytes))
    }
}

/// 解析接口外层 `{code, message, data}`，返回 data
pub fn parse_envelope(text: &str) -> Result<Value, ProviderError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ProviderError::shape("接口返回空内容"));
    }
    if !(text.starts_with('{') || text.starts_with('[')) {
        let preview: String = text.chars().take(100).collect();
        return Err(ProviderError::shape(format!("接口返回非JSON内容: {}", preview)));
    }

    let value: Value = serde_json::from_str(text)
        .map_err(|e| ProviderError::shape(format!("JSON解析失败: {}", e)))?;
    let code = value.get("code").and_then(Value::as_i64).unwrap_or(-1);
    if code != 0 {
        return Err(ProviderError::Remote {
            code,
            message: value
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("未知错误")
                .to_string(),
        });
    }
    Ok(value.get("data").cloned().unwrap_or(Value::Null))
}

/// 持仓相关标签所在的分组
const HOLDINGS_GROUP: &str = "持仓特征";

/// 从亮点标签中提取换手率、重仓股占比和行业集中度
///
/// 标签结构: data.tssj_list[] = { name, tags[] = { left_title, info } }
/// 只读"持仓特征"分组，没有该分组时才扫描全部分组
pub fn parse_highlights(data: &Value) -> FundDetail {
    let mut detail = FundDetail::default();
    let features = data
        .get("tssj_list")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let is_holdings =
        |feature: &&Value| feature.get("name").and_then(Value::as_str) == Some(HOLDINGS_GROUP);
    let features: Vec<&Value> = if features.iter().any(|f| is_holdings(&f)) {
        features.iter().filter(is_holdings).collect()
    } else {
        features.iter().collect()
    };

    for feature in features {
        let tags = feature
            .get("tags")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        for tag in tags {
            let title = tag.get("left_title").and_then(Value::as_str).unwrap_or("");
            let info = tag.get("info").and_then(Value::as_str).unwrap_or("").trim();
            if info.is_empty() {
                continue;
            }

            if title.contains("换手率") {
                detail.turnover_rate = extract_numeric_value(info).and_then(parse_percent);
            } else if title.contains("重仓股") {
                detail.top10_weight = extract_numeric_value(info).and_then(parse_percent);
            } else if title.contains("行业集中度") {
                detail.sector_concentration = Some(info.to_string());
            }
        }
    }
    detail
}

#[async_trait]
impl DetailProvider for JiucaishuoHighlights {
    fn name(&self) -> &'static str {
        "韭菜说基金亮点"
    }

    async fn fetch_detail(&self, code: &str) -> Result<FundDetail, ProviderError> {
        let text = self
            .retry
            .run("基金亮点", move || self.post_highlights(code))
            .await?;
        let data = parse_envelope(&text)?;
        Ok(parse_highlights(&data))
    }
}
