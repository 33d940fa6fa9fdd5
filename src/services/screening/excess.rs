//! 超额收益计算
//!
//! 超额收益 = 基金收益 - 基准收益（百分点），收益缺失时超额收益为 None，不会当作 0

use std::collections::BTreeMap;

use crate::models::{BenchmarkProfile, FundRecord, Horizon};

pub fn excess_returns(record: &FundRecord, profile: &BenchmarkProfile) -> BTreeMap<Horizon, Option<f64>> {
    profile
        .returns
        .iter()
        .map(|(&h, &benchmark)| (h, record.return_of(h).map(|v| v - benchmark)))
        .collect()
}

pub fn compute_excess(records: &mut [FundRecord], profile: &BenchmarkProfile) {
    for record in records.iter_mut() {
        record.excess = excess_returns(record, profile);
    }
}
