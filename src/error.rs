//! 错误类型：字段解析、参数序列化、执行与结果映射。

/// 执行端返回的错误（原样透传给调用方）。
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = CriteriaError> = std::result::Result<T, E>;

/// 列解析错误：在构建谓词时产生，随 builder 一起复制。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// 列 token 的字段名不是合法标识符（无法作为 `:name` 命名参数）。
    #[error("criteria invalid field name: {0:?}")]
    InvalidField(String),
    #[error("criteria field `{field}` is not declared on `{entity}`")]
    UnknownField {
        entity: &'static str,
        field: &'static str,
    },
    #[error("criteria field `{field}` on `{entity}` is transient")]
    TransientField {
        entity: &'static str,
        field: &'static str,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum CriteriaError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("criteria filter `{entity}` must serialize into a record")]
    FilterNotRecord { entity: &'static str },
    /// 过滤对象序列化出的键不是已声明的字段名（通常是 serde 重命名导致）。
    #[error("criteria filter `{entity}` serialized undeclared key `{key}`")]
    UndeclaredFilterKey { entity: &'static str, key: String },
    #[error("criteria failed to serialize filter: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("criteria query execution failed: {0}")]
    Execute(#[source] BoxError),
    #[error("criteria failed to map rows: {0}")]
    Mapping(#[source] serde_json::Error),
}
