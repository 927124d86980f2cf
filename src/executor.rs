//! 执行端边界：参数化 SQL 执行与结果行映射。
//!
//! 本 crate 不持有连接、不做事务；真正的驱动只需实现 `NamedParameterExecutor`。

use crate::error::{BoxError, CriteriaError, Result};
use crate::value::SqlValue;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// 命名参数：`:name` -> 值。序列值需由执行端在 `IN (:name)` 中展开。
pub type NamedParams = BTreeMap<String, SqlValue>;

/// 一行结果：列名 -> 值。
pub type Row = BTreeMap<String, SqlValue>;

/// 按命名参数执行查询的执行端（阻塞调用）。
pub trait NamedParameterExecutor: Send + Sync {
    fn query(&self, sql: &str, params: &NamedParams) -> Result<Vec<Row>, BoxError>;
}

impl<F> NamedParameterExecutor for F
where
    F: Fn(&str, &NamedParams) -> Result<Vec<Row>, BoxError> + Send + Sync,
{
    fn query(&self, sql: &str, params: &NamedParams) -> Result<Vec<Row>, BoxError> {
        self(sql, params)
    }
}

/// 由过滤对象序列化出的记录构造命名参数。
pub fn named_params(record: &Map<String, Value>) -> NamedParams {
    record
        .iter()
        .map(|(k, v)| (k.clone(), SqlValue::from_json(v)))
        .collect()
}

/// 列名统一转为小写，兼容不同驱动返回的大小写差异。
fn fold_row(row: Row) -> Map<String, Value> {
    row.into_iter()
        .map(|(k, v)| (k.to_lowercase(), v.to_json()))
        .collect()
}

/// 把结果行转换为目标类型。
pub fn map_rows<T: DeserializeOwned>(rows: Vec<Row>) -> Result<Vec<T>> {
    let values: Vec<Value> = rows
        .into_iter()
        .map(|r| Value::Object(fold_row(r)))
        .collect();
    serde_json::from_value(Value::Array(values)).map_err(CriteriaError::Mapping)
}
