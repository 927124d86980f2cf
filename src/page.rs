//! 分页请求与结果。

use serde::{Deserialize, Serialize};

/// 分页容器：调用方给出 `current` / `size`，`total` 与 `records` 由 `Example::page` 填充。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub current: u64,
    pub size: u64,
    pub total: u64,
    pub records: Vec<T>,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::of(1, 10)
    }
}

impl<T> Page<T> {
    /// 页码从 1 开始；`current` / `size` 小于 1 时按 1 处理。
    pub fn of(current: u64, size: u64) -> Self {
        Self {
            current: current.max(1),
            size: size.max(1),
            total: 0,
            records: Vec::new(),
        }
    }

    pub fn offset(&self) -> u64 {
        (self.current.max(1) - 1).saturating_mul(self.size)
    }

    /// `LIMIT size OFFSET offset` 片段。
    pub(crate) fn limit_clause(&self) -> String {
        format!("LIMIT {} OFFSET {}", self.size, self.offset())
    }

    pub fn pages(&self) -> u64 {
        if self.size == 0 {
            return 0;
        }
        self.total.div_ceil(self.size)
    }
}
