//! 本地数据源
//!
//! - 排行快照（JSON），离线运行和复现用
//! - 基金列表 Excel（fund_list.xlsx），按代码查基金简称

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use calamine::{open_workbook_auto, Data, Reader};

use super::types::{FundNameLookup, ProviderError, UniverseSource};
use crate::models::{normalize_code, FundRecord};

/// JSON 格式的排行快照，内容为 FundRecord 数组
pub struct JsonSnapshot {
    path: PathBuf,
}

impl JsonSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// 规范化快照中的基金代码，丢弃无效代码
pub fn normalize_records(records: Vec<FundRecord>) -> Vec<FundRecord> {
    records
        .into_iter()
        .filter_map(|mut record| match normalize_code(&record.code) {
            Some(code) => {
                record.code = code;
                Some(record)
            }
            None => {
                log::warn!("⚠️ 跳过代码无效的基金: {:?}", record.code);
                None
            }
        })
        .collect()
}

#[async_trait]
impl UniverseSource for JsonSnapshot {
    fn name(&self) -> &str {
        "本地排行快照"
    }

    async fn load(&self) -> Result<Vec<FundRecord>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("读取排行快照 {} 失败", self.path.display()))?;
        let records: Vec<FundRecord> = serde_json::from_str(&content)
            .with_context(|| format!("解析排行快照 {} 失败", self.path.display()))?;
        Ok(normalize_records(records))
    }
}

/// 从 Excel 基金列表中按代码查基金简称
pub struct FundListWorkbook {
    names: HashMap<String, String>,
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => format!("{}", f),
        Data::Int(i) => format!("{}", i),
        Data::Empty => String::new(),
        other => format!("{:?}", other),
    }
}

impl FundListWorkbook {
    /// 读取第一个工作表，表头需包含"基金代码"和"基金简称"
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut workbook = open_workbook_auto(path)
            .map_err(|e| anyhow!("打开Excel文件 {} 失败: {}", path.display(), e))?;

        let sheet_names = workbook.sheet_names().to_vec();
        let first = sheet_names
            .first()
            .ok_or_else(|| anyhow!("Excel文件没有工作表"))?;
        let range = workbook
            .worksheet_range(first)
            .map_err(|e| anyhow!("读取工作表失败: {}", e))?;

        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect();
        let names = Self::parse_rows(&rows)?;
        log::info!("📊 从 {} 读取到 {} 只基金名称", path.display(), names.len());
        Ok(Self { names })
    }

    /// 解析表格行，第一行为表头
    pub fn parse_rows(rows: &[Vec<String>]) -> Result<HashMap<String, String>> {
        let header = rows.first().ok_or_else(|| anyhow!("基金列表为空"))?;
        let code_col = header
            .iter()
            .position(|h| h.trim() == "基金代码")
            .ok_or_else(|| anyhow!("基金列表缺少'基金代码'列"))?;
        let name_col = header
            .iter()
            .position(|h| h.trim() == "基金简称")
            .ok_or_else(|| anyhow!("基金列表缺少'基金简称'列"))?;

        Ok(rows
            .iter()
            .skip(1)
            .filter_map(|row| {
                let code = normalize_code(row.get(code_col)?)?;
                let name = row.get(name_col)?.trim();
                (!name.is_empty()).then(|| (code, name.to_string()))
            })
            .collect())
    }
}

#[async_trait]
impl FundNameLookup for FundListWorkbook {
    async fn display_name(&self, code: &str) -> Result<Option<String>, ProviderError> {
        Ok(self.names.get(code).cloned())
    }
}
