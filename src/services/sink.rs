//! 结果写出
//!
//! 每个方案的结果写成 `<输出目录>/<工作表名>.json`

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::models::RankedTable;

#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn write(&self, table: &RankedTable, target: &str) -> Result<()>;
}

pub struct JsonFileSink {
    dir: PathBuf,
}

impl JsonFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, target: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_file_name(target)))
    }
}

/// 替换文件名中不允许出现的字符
fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if cleaned.is_empty() {
        "report".to_string()
    } else {
        cleaned
    }
}

#[async_trait]
impl ReportSink for JsonFileSink {
    async fn write(&self, table: &RankedTable, target: &str) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("创建输出目录 {} 失败", self.dir.display()))?;

        let path = self.path_for(target);
        let content = serde_json::to_string_pretty(table)?;
        tokio::fs::write(&path, content)
            .await
            .with_context(|| format!("写入结果文件 {} 失败", path.display()))?;

        log::info!("✅ 已写出 {} 只基金到 {}", table.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FundRecord, Horizon, RankedRow};

    fn table() -> RankedTable {
        RankedTable {
            plan: "momentum".to_string(),
            sheet: "超额收益筛选".to_string(),
            profile: "中证全指".to_string(),
            rank_by: Horizon::M6,
            generated_at: "2024-05-10T09:30:00+08:00".to_string(),
            steps: Vec::new(),
            rows: vec![RankedRow {
                rank: 1,
                record: FundRecord::new("015382", "东方兴瑞趋势领航混合C")
                    .with_return(Horizon::M6, 30.0),
                top_horizons: vec![Horizon::M6],
                star: false,
            }],
        }
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("超额收益筛选"), "超额收益筛选");
        assert_eq!(sanitize_file_name("a/b:c"), "a_b_c");
        assert_eq!(sanitize_file_name("  "), "report");
    }

    #[tokio::test]
    async fn test_json_file_sink_writes_table() {
        println!("\n========== 测试结果写出 ==========");
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonFileSink::new(dir.path().join("output"));
        sink.write(&table(), "超额收益筛选").await.unwrap();

        let path = sink.path_for("超额收益筛选");
        let content = std::fs::read_to_string(&path).unwrap();
        println!("  {}", path.display());

        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["sheet"], "超额收益筛选");
        assert_eq!(value["rows"][0]["code"], "015382");
        assert_eq!(value["rows"][0]["returns"]["6m"], 30.0);
        assert_eq!(value["rows"][0]["top_horizons"][0], "6m");
        println!("✅ 结果写出测试通过！");
    }
}
