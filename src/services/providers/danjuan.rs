//! 蛋卷基金档案
//!
//! 对应 akshare 的 fund_individual_basic_info_xq()，提供成立时间和最新规模

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde_json::Value;

use super::types::{DetailProvider, FundDetail, ProviderError};
use crate::models::ScaleAmount;
use crate::services::common::DANJUAN_FUND_URL;
use crate::services::retry::RetryPolicy;

pub struct DanjuanProfile {
    client: Client,
    retry: RetryPolicy,
}

impl DanjuanProfile {
    pub fn new(client: Client, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    async fn get_profile(&self, code: &str) -> Result<Value, ProviderError> {
        let url = format!("{}/{}", DANJUAN_FUND_URL, code);
        let response = self
            .client
            .get(&url)
            .header("Referer", "https://danjuanfunds.com/")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status().as_u16()));
        }
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| ProviderError::shape(format!("JSON解析失败: {}", e)))
    }
}

/// 解析 `{"data": {"found_date": "2019-07-25", "totshare": "12.34亿", ...}, "result_code": 0}`
pub fn parse_profile(value: &Value) -> Result<FundDetail, ProviderError> {
    let result_code = value.get("result_code").and_then(Value::as_i64).unwrap_or(0);
    if result_code != 0 {
        return Err(ProviderError::Remote {
            code: result_code,
            message: value
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("未知错误")
                .to_string(),
        });
    }

    let data = value
        .get("data")
        .filter(|d| d.is_object())
        .ok_or_else(|| ProviderError::shape("缺少 data 对象"))?;

    let inception_date = data
        .get("found_date")
        .and_then(Value::as_str)
        .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok());
    let scale = data
        .get("totshare")
        .and_then(Value::as_str)
        .and_then(ScaleAmount::parse);

    Ok(FundDetail {
        inception_date,
        scale,
        ..FundDetail::default()
    })
}

#[async_trait]
impl DetailProvider for DanjuanProfile {
    fn name(&self) -> &'static str {
        "蛋卷基金档案"
    }

    async fn fetch_detail(&self, code: &str) -> Result<FundDetail, ProviderError> {
        let value = self
            .retry
            .run("基金档案", move || self.get_profile(code))
            .await?;
        parse_profile(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_profile() {
        let value = json!({
            "data": { "fd_code": "015381", "fd_name": "东方兴瑞趋势领航混合A",
                      "found_date": "2022-04-19", "totshare": "12.5亿" },
            "result_code": 0
        });
        let detail = parse_profile(&value).unwrap();
        assert_eq!(detail.inception_date, NaiveDate::from_ymd_opt(2022, 4, 19));
        assert_eq!(detail.scale, Some(ScaleAmount::yi(12.5)));
    }

    #[test]
    fn test_parse_profile_partial_and_errors() {
        let detail = parse_profile(&json!({ "data": { "totshare": "--" }, "result_code": 0 })).unwrap();
        assert!(detail.is_empty());

        let err = parse_profile(&json!({ "result_code": 600001, "message": "fund not found" }))
            .unwrap_err();
        assert!(matches!(err, ProviderError::Remote { code: 600001, .. }));

        assert!(matches!(
            parse_profile(&json!({ "data": [], "result_code": 0 })),
            Err(ProviderError::Shape(_))
        ));
    }
}
