//! 课程内容同步引擎
//!
//! 把代码书写的内容目录（课程 → 周 → 主题 → 题目 → 测试用例）
//! 幂等投影到 SQLite 持久层，同时定义外部评测引擎必须遵守的
//! 测试用例契约。自然键（slug）承载跨次同步的稳定身份，
//! 排序号每次运行从书写位置重算。

pub mod content;
pub mod models;
pub mod services;
pub mod utils;
