//! 外部数据源
//!
//! 排行、基金名称、份额搜索和详情都通过 trait 接入，筛选流程只依赖 trait
//!
//! ## 数据来源
//! - 东方财富：基金排行、基金搜索、基金列表、季度持仓明细、规模变动、持有人结构
//! - 韭菜说：换手率、重仓股占比、行业集中度
//! - 蛋卷基金：成立时间、最新规模
//! - 本地文件：排行快照、fund_list.xlsx

pub mod danjuan;
pub mod eastmoney;
pub mod jiucaishuo;
pub mod local;
mod types;

pub use danjuan::DanjuanProfile;
pub use eastmoney::{
    EastmoneyFundList, EastmoneyHolders, EastmoneyHoldings, EastmoneyNetAssets, EastmoneyRank,
    EastmoneySearch,
};
pub use jiucaishuo::JiucaishuoHighlights;
pub use local::{FundListWorkbook, JsonSnapshot};
pub use types::{
    DetailProvider, FundDetail, FundNameLookup, FundSibling, ProviderError, SiblingSearch,
    UniverseSource,
};
