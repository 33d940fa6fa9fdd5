//! 关键词过滤和基准阈值过滤

use std::collections::HashSet;

use crate::models::{normalize_code, BenchmarkProfile, FundRecord, Horizon};

/// 名称是否命中任一屏蔽关键词（区分大小写），名称缺失视为不命中
pub fn name_is_blocked(name: Option<&str>, block_list: &[String]) -> bool {
    match name {
        Some(name) if !name.is_empty() => block_list.iter().any(|kw| name.contains(kw.as_str())),
        _ => false,
    }
}

/// 剔除名称命中屏蔽关键词的基金
pub fn exclude_keywords(records: Vec<FundRecord>, block_list: &[String]) -> Vec<FundRecord> {
    if block_list.is_empty() {
        return records;
    }
    records
        .into_iter()
        .filter(|r| !name_is_blocked(r.short_name.as_deref(), block_list))
        .collect()
}

/// 名称需同时包含全部关键词；代码白名单非空时只保留白名单内的基金
pub fn apply_include(
    records: Vec<FundRecord>,
    keywords: &[String],
    codes: &[String],
) -> Vec<FundRecord> {
    let whitelist: HashSet<String> = codes
        .iter()
        .map(|c| normalize_code(c).unwrap_or_else(|| c.trim().to_string()))
        .collect();

    records
        .into_iter()
        .filter(|r| whitelist.is_empty() || whitelist.contains(&r.code))
        .filter(|r| {
            let name = r.name();
            keywords.iter().all(|kw| name.contains(kw.as_str()))
        })
        .collect()
}

/// 剔除缺失主周期收益的基金
pub fn drop_missing_pivot(records: Vec<FundRecord>, pivot: Horizon) -> Vec<FundRecord> {
    records
        .into_iter()
        .filter(|r| {
            let keep = r.return_of(pivot).is_some();
            if !keep {
                log::debug!("基金 {} 缺少{}收益，剔除", r.code, pivot);
            }
            keep
        })
        .collect()
}

/// 所有指定周期的收益都不低于基准；收益缺失视为不满足
pub fn passes_thresholds(
    record: &FundRecord,
    profile: &BenchmarkProfile,
    horizons: &[Horizon],
) -> bool {
    horizons.iter().all(|&h| match (record.return_of(h), profile.get(h)) {
        (Some(value), Some(benchmark)) => value >= benchmark,
        _ => false,
    })
}

pub fn apply_thresholds(
    records: Vec<FundRecord>,
    profile: &BenchmarkProfile,
    horizons: &[Horizon],
) -> Vec<FundRecord> {
    records
        .into_iter()
        .filter(|r| passes_thresholds(r, profile, horizons))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kws(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_keyword_filter_iff() {
        println!("\n========== 测试关键词过滤 ==========");
        let block = kws(&["ETF", "债券", "指数"]);
        let records = vec![
            FundRecord::new("000001", "华夏沪深300ETF联接C"),
            FundRecord::new("000002", "易方达稳健债券C"),
            FundRecord::new("000003", "东方兴瑞趋势领航混合C"),
            FundRecord::new("000004", "某某etf联接C"),
            FundRecord { code: "000005".to_string(), ..FundRecord::default() },
            FundRecord::new("000006", ""),
        ];

        for r in &records {
            let blocked = name_is_blocked(r.short_name.as_deref(), &block);
            let expected = block.iter().any(|kw| r.name().contains(kw.as_str()));
            println!("  {:?} -> 命中: {}", r.short_name, blocked);
            assert_eq!(blocked, expected);
        }

        let kept: Vec<String> = exclude_keywords(records, &block)
            .into_iter()
            .map(|r| r.code)
            .collect();
        // 区分大小写，名称缺失或为空的基金保留
        assert_eq!(kept, vec!["000003", "000004", "000005", "000006"]);
        println!("✅ 关键词过滤测试通过！");
    }

    #[test]
    fn test_keyword_order_irrelevant() {
        let records = vec![
            FundRecord::new("000001", "某某红利C"),
            FundRecord::new("000002", "某某成长C"),
            FundRecord::new("000003", "某某价值C"),
        ];
        let a = exclude_keywords(records.clone(), &kws(&["红利", "价值"]));
        let b = exclude_keywords(records, &kws(&["价值", "红利", "红利"]));
        assert_eq!(a, b);
        assert_eq!(a.len(), 1);
    }

    #[test]
    fn test_apply_include() {
        let records = vec![
            FundRecord::new("000001", "华夏沪深300ETF联接C"),
            FundRecord::new("000002", "华夏沪深300ETF联接A"),
            FundRecord::new("000003", "中证500指数C"),
        ];
        let kept = apply_include(records.clone(), &kws(&["沪深300", "C"]), &[]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].code, "000001");

        let kept = apply_include(records.clone(), &[], &kws(&["3", "000002"]));
        let codes: Vec<&str> = kept.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["000002", "000003"]);

        assert_eq!(apply_include(records, &[], &[]).len(), 3);
    }

    #[test]
    fn test_drop_missing_pivot() {
        let records = vec![
            FundRecord::new("000001", "甲").with_return(Horizon::M6, 1.0),
            FundRecord::new("000002", "乙").with_return(Horizon::Y1, 1.0),
        ];
        let kept = drop_missing_pivot(records, Horizon::M6);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].code, "000001");
    }

    #[test]
    fn test_threshold_conjunction() {
        println!("\n========== 测试基准阈值过滤 ==========");
        let profile = BenchmarkProfile::csi_all_share();
        let horizons = [Horizon::Y1, Horizon::M6, Horizon::M3, Horizon::M1];
        let records = vec![
            // 全部达标，等于基准也算达标
            FundRecord::new("000001", "甲")
                .with_return(Horizon::Y1, 21.80)
                .with_return(Horizon::M6, 30.0)
                .with_return(Horizon::M3, 5.0)
                .with_return(Horizon::M1, 4.0),
            // 近1月不达标
            FundRecord::new("000002", "乙")
                .with_return(Horizon::Y1, 50.0)
                .with_return(Horizon::M6, 30.0)
                .with_return(Horizon::M3, 5.0)
                .with_return(Horizon::M1, 3.0),
            // 缺少近3月
            FundRecord::new("000003", "丙")
                .with_return(Horizon::Y1, 50.0)
                .with_return(Horizon::M6, 30.0)
                .with_return(Horizon::M1, 4.0),
        ];

        let kept = apply_thresholds(records.clone(), &profile, &horizons);
        assert_eq!(kept.len(), 1);
        for r in &kept {
            for h in horizons {
                assert!(r.return_of(h).unwrap() >= profile.get(h).unwrap());
            }
        }

        let mut reversed = horizons;
        reversed.reverse();
        assert_eq!(apply_thresholds(records.clone(), &profile, &reversed), kept);

        // 不检查任何周期时全部保留
        assert_eq!(apply_thresholds(records, &profile, &[]).len(), 3);
        println!("✅ 基准阈值过滤测试通过！");
    }
}
