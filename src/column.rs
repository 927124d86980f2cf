//! 列引用 token 与解析后的列描述。

use crate::entity::Entity;
use crate::error::ResolveError;
use std::fmt;
use std::marker::PhantomData;

/// 对实体 `E` 某个字段的类型化引用。
///
/// 通常由 `entity!` 宏生成为关联常量（如 `User::USER_NAME`），
/// 编译期保证列引用属于过滤对象的类型。
pub struct Column<E> {
    field: &'static str,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for Column<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for Column<E> {}

impl<E> PartialEq for Column<E> {
    fn eq(&self, other: &Self) -> bool {
        self.field == other.field
    }
}

impl<E> Eq for Column<E> {}

impl<E> fmt::Debug for Column<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Column").field(&self.field).finish()
    }
}

impl<E: Entity> Column<E> {
    /// 字段名必须是合法标识符：它会作为 `:name` 命名参数出现在 SQL 中。
    /// 在常量上下文中使用时，非法名称会直接导致编译失败。
    pub const fn new(field: &'static str) -> Self {
        assert!(is_identifier(field), "column field must be an identifier");
        Self {
            field,
            _entity: PhantomData,
        }
    }

    /// 运行时构造：非法名称返回 `ResolveError::InvalidField`。
    pub fn try_new(field: &'static str) -> Result<Self, ResolveError> {
        if !is_identifier(field) {
            return Err(ResolveError::InvalidField(field.to_string()));
        }
        Ok(Self {
            field,
            _entity: PhantomData,
        })
    }

    pub const fn field(&self) -> &'static str {
        self.field
    }
}

pub(crate) const fn is_identifier(s: &str) -> bool {
    let b = s.as_bytes();
    if b.is_empty() {
        return false;
    }
    if !(b[0].is_ascii_alphabetic() || b[0] == b'_') {
        return false;
    }
    let mut i = 1;
    while i < b.len() {
        if !(b[i].is_ascii_alphanumeric() || b[i] == b'_') {
            return false;
        }
        i += 1;
    }
    true
}

/// 解析后的列描述；解析一次后不可变并被缓存。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub table_name: Option<String>,
    pub field_name: String,
    pub column_name: String,
    pub insertable: bool,
    pub updatable: bool,
}

impl ColumnInfo {
    /// `table.column`；没有表名时只返回列名。
    pub fn full_name(&self) -> String {
        match self.table_name.as_deref() {
            Some(t) if !t.is_empty() => format!("{t}.{}", self.column_name),
            _ => self.column_name.clone(),
        }
    }
}
