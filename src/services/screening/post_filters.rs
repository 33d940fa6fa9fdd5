//! 补充后过滤
//!
//! 换手率、合并规模、重仓股占比和超额收益一致性四个独立条件，取交集。
//! 字段缺失的基金一律通过对应条件。

use crate::config::{ConsistencyRule, PostFilterConfig, PostFilterToggles};
use crate::models::{FundRecord, Horizon, StepCount};

/// 换手率不低于下限，或缺失
///
/// 原脚本注释写的是"剔除换手率超过200%"，实际保留的是高换手，这里照实际行为实现
pub fn passes_turnover(record: &FundRecord, min_turnover: f64) -> bool {
    record.turnover_rate.map_or(true, |t| t >= min_turnover)
}

/// 合并规模（换算为亿）落在 [min, max] 闭区间内，或缺失
pub fn passes_scale_band(record: &FundRecord, min_yi: f64, max_yi: f64) -> bool {
    record
        .aggregated_scale
        .map_or(true, |s| (min_yi..=max_yi).contains(&s.in_yi()))
}

/// 前10大重仓股占比低于上限，或缺失
pub fn passes_holding_ceiling(record: &FundRecord, max_weight: f64) -> bool {
    record.top10_holding_weight.map_or(true, |w| w < max_weight)
}

/// 锚定周期超额收益为正时，各周期超额收益不低于其 ratio 倍
///
/// 锚定周期超额收益非正或缺失时直接通过；某周期超额收益缺失时该项不检查
pub fn passes_excess_consistency(
    record: &FundRecord,
    anchor: Horizon,
    rules: &[ConsistencyRule],
) -> bool {
    let anchor_excess = match record.excess_of(anchor) {
        Some(v) if v > 0.0 => v,
        _ => return true,
    };
    rules.iter().all(|rule| {
        record
            .excess_of(rule.horizon)
            .map_or(true, |v| v >= rule.ratio * anchor_excess)
    })
}

/// 按方案开关依次应用补充后过滤
pub struct PostFilters<'a> {
    config: &'a PostFilterConfig,
    toggles: PostFilterToggles,
}

impl<'a> PostFilters<'a> {
    pub fn new(config: &'a PostFilterConfig, toggles: PostFilterToggles) -> Self {
        Self { config, toggles }
    }

    /// 返回保留的基金和每个条件的行数变化
    pub fn apply(&self, records: Vec<FundRecord>) -> (Vec<FundRecord>, Vec<StepCount>) {
        let cfg = self.config;
        let mut steps = Vec::new();
        let mut records = records;

        let filters: [(bool, &str, Box<dyn Fn(&FundRecord) -> bool + '_>); 4] = [
            (
                self.toggles.turnover,
                "换手率过滤",
                Box::new(|r| passes_turnover(r, cfg.min_turnover)),
            ),
            (
                self.toggles.scale,
                "规模过滤",
                Box::new(|r| passes_scale_band(r, cfg.scale_min_yi, cfg.scale_max_yi)),
            ),
            (
                self.toggles.holdings,
                "重仓股占比过滤",
                Box::new(|r| passes_holding_ceiling(r, cfg.max_top10_weight)),
            ),
            (
                self.toggles.consistency,
                "超额收益一致性过滤",
                Box::new(|r| {
                    passes_excess_consistency(r, cfg.consistency_anchor, &cfg.consistency_rules)
                }),
            ),
        ];

        for (enabled, step, predicate) in filters.iter() {
            if !*enabled {
                continue;
            }
            let before = records.len();
            records.retain(|r| predicate(r));
            steps.push(StepCount {
                step: step.to_string(),
                before,
                after: records.len(),
            });
        }
        (records, steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScaleAmount;

    fn with_scale(scale: ScaleAmount) -> FundRecord {
        FundRecord {
            aggregated_scale: Some(scale),
            ..FundRecord::new("000001", "甲")
        }
    }

    fn with_excess(pairs: &[(Horizon, f64)]) -> FundRecord {
        let mut r = FundRecord::new("000001", "甲");
        for &(h, v) in pairs {
            r.excess.insert(h, Some(v));
        }
        r
    }

    #[test]
    fn test_scale_band() {
        println!("\n========== 测试规模区间过滤 ==========");
        let cases = vec![
            (ScaleAmount::yi(0.15), false),
            (ScaleAmount::yi(0.2), true),
            (ScaleAmount::yi(40.0), true),
            (ScaleAmount::yi(40.01), false),
            (ScaleAmount::wan(5000.0), true),
            (ScaleAmount::wan(1000.0), false),
        ];
        for (scale, expected) in cases {
            let result = passes_scale_band(&with_scale(scale), 0.2, 40.0);
            println!("  {} -> {}", scale, result);
            assert_eq!(result, expected);
        }
        // 没有单位的字符串按亿处理
        let unitless = ScaleAmount::parse("12.3").unwrap();
        assert!(passes_scale_band(&with_scale(unitless), 0.2, 40.0));
        assert!(passes_scale_band(&FundRecord::default(), 0.2, 40.0));
        println!("✅ 规模区间过滤测试通过！");
    }

    #[test]
    fn test_turnover_floor() {
        println!("\n========== 测试换手率过滤 ==========");
        let mut record = FundRecord::new("000001", "甲");
        record.turnover_rate = crate::services::common::parse_percent("199%");
        assert!(!passes_turnover(&record, 200.0));
        record.turnover_rate = crate::services::common::parse_percent("200%");
        assert!(passes_turnover(&record, 200.0));
        record.turnover_rate = crate::services::common::parse_percent("获取失败");
        assert!(record.turnover_rate.is_none());
        assert!(passes_turnover(&record, 200.0));
        println!("✅ 换手率过滤测试通过！");
    }

    #[test]
    fn test_holding_ceiling() {
        let mut record = FundRecord::new("000001", "甲");
        assert!(passes_holding_ceiling(&record, 40.0));
        record.top10_holding_weight = Some(39.99);
        assert!(passes_holding_ceiling(&record, 40.0));
        record.top10_holding_weight = Some(40.0);
        assert!(!passes_holding_ceiling(&record, 40.0));
    }

    #[test]
    fn test_excess_consistency() {
        println!("\n========== 测试超额收益一致性 ==========");
        let cfg = PostFilterConfig::default();
        let check = |r: &FundRecord| {
            passes_excess_consistency(r, cfg.consistency_anchor, &cfg.consistency_rules)
        };

        // 近1年超额20，近6月至少需要10
        assert!(!check(&with_excess(&[(Horizon::Y1, 20.0), (Horizon::M6, 9.0)])));
        assert!(check(&with_excess(&[(Horizon::Y1, 20.0), (Horizon::M6, 10.0)])));
        // 近1月至少需要1.6
        assert!(!check(&with_excess(&[
            (Horizon::Y1, 20.0),
            (Horizon::M6, 12.0),
            (Horizon::M3, 6.0),
            (Horizon::M1, 1.5),
        ])));
        assert!(check(&with_excess(&[
            (Horizon::Y1, 20.0),
            (Horizon::M6, 12.0),
            (Horizon::M3, 6.0),
            (Horizon::M1, 1.7),
        ])));
        // 近1年超额非正时无条件通过
        assert!(check(&with_excess(&[
            (Horizon::Y1, -5.0),
            (Horizon::M6, -30.0),
            (Horizon::M1, -9.0),
        ])));
        assert!(check(&with_excess(&[(Horizon::Y1, 0.0), (Horizon::M6, -1.0)])));
        // 缺失的超额收益不参与检查
        let mut record = with_excess(&[(Horizon::Y1, 20.0), (Horizon::M6, 11.0)]);
        record.excess.insert(Horizon::M3, None);
        assert!(check(&record));
        assert!(check(&FundRecord::default()));
        println!("✅ 超额收益一致性测试通过！");
    }

    #[test]
    fn test_apply_respects_toggles() {
        let cfg = PostFilterConfig::default();
        let mut low_turnover = FundRecord::new("000001", "甲");
        low_turnover.turnover_rate = Some(50.0);
        let mut heavy = FundRecord::new("000002", "乙");
        heavy.top10_holding_weight = Some(65.0);
        let clean = FundRecord::new("000003", "丙");
        let records = vec![low_turnover, heavy, clean];

        let (kept, steps) = PostFilters::new(&cfg, PostFilterToggles::default()).apply(records.clone());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].code, "000003");
        assert_eq!(steps.len(), 4);
        assert_eq!((steps[0].before, steps[0].after), (3, 2));
        assert_eq!((steps[2].before, steps[2].after), (2, 1));

        let toggles = PostFilterToggles {
            turnover: false,
            ..PostFilterToggles::default()
        };
        let (kept, steps) = PostFilters::new(&cfg, toggles).apply(records);
        assert_eq!(kept.len(), 2);
        assert_eq!(steps.len(), 3);
    }
}
