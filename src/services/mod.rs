//! 业务逻辑服务模块
//!
//! 封装数据获取、筛选和结果写出

pub mod cache;      // 详情缓存
pub mod common;     // 公共常量和辅助函数
pub mod providers;  // 外部数据源
pub mod retry;      // 重试策略
pub mod screening;  // 筛选流程
pub mod sink;       // 结果写出
