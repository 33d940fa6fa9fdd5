//! 基金筛选
//!
//! 各阶段都是纯函数，由 [`ScreeningPipeline`] 按方案串起来；
//! 只有详情补充需要访问外部数据源

pub mod enricher;
pub mod excess;
pub mod filters;
pub mod pipeline;
pub mod post_filters;
pub mod ranking;

#[cfg(test)]
pub(crate) mod mocks;

pub use enricher::Enricher;
pub use pipeline::ScreeningPipeline;
