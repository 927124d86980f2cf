//! halo-criteria：基于实体元数据的类型安全条件查询构建器。
//!
//! 由过滤对象生成参数化 SQL，交给执行端执行，再把结果行映射为目标类型。

pub mod column;
pub mod config;
pub mod criteria;
#[cfg(test)]
mod criteria_tests;
pub mod entity;
pub mod error;
pub mod example;
pub mod executor;
pub mod field_mapper;
pub mod hooks;
pub mod interpolate;
pub mod macros;
pub use crate::macros::*;
pub mod metadata;
pub mod page;
mod string_builder;
#[cfg(test)]
mod test_support;
pub mod value;

pub use crate::column::{Column, ColumnInfo};
pub use crate::config::{Configuration, ConfigurationBuilder};
pub use crate::criteria::{Clauses, Criteria, IntoColumns, LikePattern};
pub use crate::entity::{CountRow, Entity, EntityInfo, FieldAttr, TableAttr};
pub use crate::error::{BoxError, CriteriaError, ResolveError, Result};
pub use crate::example::{Example, LocalBeforeHook};
pub use crate::executor::{NamedParameterExecutor, NamedParams, Row, map_rows, named_params};
pub use crate::field_mapper::{
    FieldMapperFunc, default_field_mapper, identity_mapper, snake_case_mapper,
};
pub use crate::hooks::{AfterQueryHook, BeforeQueryHook, HookRegistry, typed_after_hook};
pub use crate::metadata::MetadataRegistry;
pub use crate::page::Page;
pub use crate::value::SqlValue;

/// 推荐的便捷命名空间：允许 `use halo_space::orm::{...}` 形式导入。
pub mod orm {
    pub use crate::*;
}
