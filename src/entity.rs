//! Entity：实体类型的表级 / 字段级元数据。
//!
//! Rust 没有运行时反射与注解；元数据由 `entity!` 宏在编译期生成为常量，
//! 运行时由 `MetadataRegistry` 解析并缓存。

use std::any::TypeId;
use std::fmt;

/// 表级元数据（等价于类型上声明的表名 + schema）。空字符串表示未声明。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableAttr {
    pub name: &'static str,
    pub schema: &'static str,
}

impl TableAttr {
    pub const NONE: TableAttr = TableAttr {
        name: "",
        schema: "",
    };
}

/// 字段级元数据。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldAttr {
    /// Rust 字段名；同时是命名参数名和 serde 序列化后的 key。
    pub field: &'static str,
    /// 列名覆盖；为空时由命名转换推导。
    pub column: &'static str,
    /// 所属表覆盖；为空时继承实体的表名。
    pub table: &'static str,
    /// 非持久化字段：不参与列解析。
    pub transient: bool,
    pub insertable: bool,
    pub updatable: bool,
}

impl FieldAttr {
    pub const fn new(field: &'static str) -> Self {
        Self {
            field,
            column: "",
            table: "",
            transient: false,
            insertable: true,
            updatable: true,
        }
    }
}

/// 由 `entity!` 宏为业务 struct 实现的 trait：提供表名与字段元数据。
pub trait Entity: 'static {
    /// 类型的简单名（用于推导默认表名）。
    const NAME: &'static str;
    const TABLE: TableAttr = TableAttr::NONE;
    const FIELDS: &'static [FieldAttr];

    fn field_attr(field: &str) -> Option<&'static FieldAttr> {
        Self::FIELDS.iter().find(|f| f.field == field)
    }
}

/// 运行时的实体描述（结果类型描述符），传给钩子函数。
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct EntityInfo {
    pub type_id: TypeId,
    pub name: &'static str,
    pub table: TableAttr,
    pub fields: &'static [FieldAttr],
}

impl EntityInfo {
    pub fn of<E: Entity>() -> Self {
        Self {
            type_id: TypeId::of::<E>(),
            name: E::NAME,
            table: E::TABLE,
            fields: E::FIELDS,
        }
    }

    pub fn is<E: Entity>(&self) -> bool {
        self.type_id == TypeId::of::<E>()
    }
}

impl fmt::Debug for EntityInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityInfo")
            .field("name", &self.name)
            .field("table", &self.table)
            .field("fields", &self.fields.len())
            .finish()
    }
}

/// `count` 使用的结果类型：`COUNT(..) AS count_number`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
pub struct CountRow {
    #[serde(default, deserialize_with = "lenient_count")]
    pub count_number: i64,
}

/// 部分驱动把 COUNT 结果返回为十进制字符串；null 按 0 处理。
fn lenient_count<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum CountPayload {
        Int(i64),
        Text(String),
    }

    match <Option<CountPayload> as serde::Deserialize>::deserialize(deserializer)? {
        None => Ok(0),
        Some(CountPayload::Int(n)) => Ok(n),
        Some(CountPayload::Text(s)) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

impl Entity for CountRow {
    const NAME: &'static str = "CountRow";
    const FIELDS: &'static [FieldAttr] = &[FieldAttr::new("count_number")];
}
