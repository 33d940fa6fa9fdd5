//! 排序与高亮标记
//!
//! 按指定周期收益降序排列（缺失的排在最后），并标记每个周期的前N名。
//! 只排序和标注，不增删行。

use std::cmp::Ordering;

use crate::config::OutputConfig;
use crate::models::{FundRecord, Horizon, RankedRow};

#[derive(Debug, Clone)]
pub struct RankingOptions {
    pub rank_by: Horizon,
    pub top_n: usize,
    pub star_min_horizons: usize,
    pub highlight_horizons: Vec<Horizon>,
}

impl RankingOptions {
    pub fn new(rank_by: Horizon, output: &OutputConfig) -> Self {
        Self {
            rank_by,
            top_n: output.top_n,
            star_min_horizons: output.star_min_horizons,
            highlight_horizons: output.highlight_horizons.clone(),
        }
    }
}

/// 降序比较，缺失值排在最后
fn desc_missing_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn rank(mut records: Vec<FundRecord>, options: &RankingOptions) -> Vec<RankedRow> {
    let h = options.rank_by;
    records.sort_by(|a, b| desc_missing_last(a.return_of(h), b.return_of(h)));

    let mut top_horizons: Vec<Vec<Horizon>> = vec![Vec::new(); records.len()];
    for &horizon in &options.highlight_horizons {
        let mut present: Vec<(usize, f64)> = records
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.return_of(horizon).map(|v| (i, v)))
            .collect();
        present.sort_by(|a, b| b.1.total_cmp(&a.1));
        for (i, _) in present.into_iter().take(options.top_n) {
            top_horizons[i].push(horizon);
        }
    }

    records
        .into_iter()
        .zip(top_horizons)
        .enumerate()
        .map(|(i, (record, top))| RankedRow {
            rank: i + 1,
            star: options.star_min_horizons > 0 && top.len() >= options.star_min_horizons,
            top_horizons: top,
            record,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(top_n: usize, star_min: usize) -> RankingOptions {
        RankingOptions {
            rank_by: Horizon::M6,
            top_n,
            star_min_horizons: star_min,
            highlight_horizons: vec![Horizon::M6, Horizon::Y1],
        }
    }

    #[test]
    fn test_rank_descending_missing_last() {
        println!("\n========== 测试排序 ==========");
        let records = vec![
            FundRecord::new("000001", "甲").with_return(Horizon::M6, 10.0),
            FundRecord::new("000002", "乙"),
            FundRecord::new("000003", "丙").with_return(Horizon::M6, 30.0),
            FundRecord::new("000004", "丁").with_return(Horizon::M6, 20.0),
        ];
        let rows = rank(records.clone(), &options(10, 5));
        let codes: Vec<&str> = rows.iter().map(|r| r.record.code.as_str()).collect();
        println!("  排序结果: {:?}", codes);
        assert_eq!(codes, vec!["000003", "000004", "000001", "000002"]);
        assert_eq!(rows.iter().map(|r| r.rank).collect::<Vec<_>>(), vec![1, 2, 3, 4]);

        // 不增删行，记录内容不变
        assert_eq!(rows.len(), records.len());
        for row in &rows {
            assert!(records.contains(&row.record));
        }
        println!("✅ 排序测试通过！");
    }

    #[test]
    fn test_top_n_and_star() {
        let records = vec![
            FundRecord::new("000001", "甲")
                .with_return(Horizon::M6, 30.0)
                .with_return(Horizon::Y1, 10.0),
            FundRecord::new("000002", "乙")
                .with_return(Horizon::M6, 20.0)
                .with_return(Horizon::Y1, 50.0),
            FundRecord::new("000003", "丙")
                .with_return(Horizon::M6, 25.0)
                .with_return(Horizon::Y1, 40.0),
        ];
        let rows = rank(records, &options(2, 2));
        assert_eq!(rows[0].record.code, "000001");
        assert_eq!(rows[0].top_horizons, vec![Horizon::M6]);
        assert!(!rows[0].star);
        assert_eq!(rows[1].record.code, "000003");
        assert_eq!(rows[1].top_horizons, vec![Horizon::M6, Horizon::Y1]);
        assert!(rows[1].star);
        assert_eq!(rows[2].top_horizons, vec![Horizon::Y1]);
    }

    #[test]
    fn test_rank_empty() {
        assert!(rank(Vec::new(), &options(10, 5)).is_empty());
    }
}
