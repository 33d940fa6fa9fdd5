//! 业绩基准
//!
//! 每个周期一个基准收益率，单次筛选中不可变

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::fund::Horizon;

/// 命名的基准收益配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkProfile {
    pub name: String,
    pub returns: BTreeMap<Horizon, f64>,
}

impl BenchmarkProfile {
    pub fn new(name: impl Into<String>, returns: BTreeMap<Horizon, f64>) -> Self {
        Self {
            name: name.into(),
            returns,
        }
    }

    pub fn get(&self, horizon: Horizon) -> Option<f64> {
        self.returns.get(&horizon).copied()
    }

    /// 中证全指各周期收益
    pub fn csi_all_share() -> Self {
        let returns = BTreeMap::from([
            (Horizon::W1, 1.50),
            (Horizon::M1, 3.25),
            (Horizon::M3, 0.74),
            (Horizon::M6, 19.48),
            (Horizon::Y1, 21.80),
            (Horizon::Y2, 33.86),
            (Horizon::Y3, 24.44),
            (Horizon::Ytd, 21.80),
        ]);
        Self::new("中证全指", returns)
    }
}
