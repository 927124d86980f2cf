//! MetadataRegistry：表名与列描述的解析和缓存。
//!
//! 生命周期：进程内首次使用时初始化（`global()`），之后只增不减，不做淘汰。
//! 缓存条目一旦写入即不可变；同一 (类型, 字段) 最多计算一次，
//! 并发首次访问时在 `DashMap` 的分片锁内完成写入，不会留下半构造的条目。
//! 测试可以用 `MetadataRegistry::new()` 得到一个独立的注册表。

use crate::column::{Column, ColumnInfo};
use crate::entity::{Entity, FieldAttr, TableAttr};
use crate::error::ResolveError;
use crate::field_mapper::{FieldMapperFunc, default_field_mapper};
use dashmap::DashMap;
use indexmap::IndexMap;
use std::any::TypeId;
use std::fmt;
use std::sync::{Arc, OnceLock};

type ColumnMap = IndexMap<&'static str, Arc<ColumnInfo>>;

static GLOBAL: OnceLock<Arc<MetadataRegistry>> = OnceLock::new();

pub struct MetadataRegistry {
    mapper: FieldMapperFunc,
    tables: DashMap<TypeId, Arc<str>>,
    columns: DashMap<TypeId, ColumnMap>,
    scans: DashMap<TypeId, Arc<[Arc<ColumnInfo>]>>,
}

impl fmt::Debug for MetadataRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // mapper 无法 Debug；只输出缓存规模。
        f.debug_struct("MetadataRegistry")
            .field("tables", &self.tables.len())
            .field("columns", &self.columns.len())
            .field("scans", &self.scans.len())
            .finish()
    }
}

impl Default for MetadataRegistry {
    fn default() -> Self {
        Self::with_mapper(default_field_mapper())
    }
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用自定义命名转换（影响未声明表名 / 列名时的推导结果）。
    pub fn with_mapper(mapper: FieldMapperFunc) -> Self {
        Self {
            mapper,
            tables: DashMap::new(),
            columns: DashMap::new(),
            scans: DashMap::new(),
        }
    }

    /// 进程级注册表。
    pub fn global() -> Arc<MetadataRegistry> {
        GLOBAL
            .get_or_init(|| Arc::new(MetadataRegistry::new()))
            .clone()
    }

    /// 解析实体的表名：声明的表名优先（有 schema 时为 `schema.name`），
    /// 否则把类型名做命名转换。
    pub fn table_name<E: Entity>(&self) -> Arc<str> {
        let id = TypeId::of::<E>();
        if let Some(t) = self.tables.get(&id) {
            return t.value().clone();
        }
        let resolved: Arc<str> = Arc::from(self.resolve_table(E::NAME, E::TABLE));
        self.tables.entry(id).or_insert(resolved).value().clone()
    }

    fn resolve_table(&self, type_name: &str, attr: TableAttr) -> String {
        if attr.name.is_empty() {
            return (self.mapper)(type_name);
        }
        if attr.schema.is_empty() {
            attr.name.to_string()
        } else {
            format!("{}.{}", attr.schema, attr.name)
        }
    }

    /// 解析列描述。未声明或标记为 transient 的字段返回错误（不会写入缓存）。
    pub fn column<E: Entity>(&self, column: &Column<E>) -> Result<Arc<ColumnInfo>, ResolveError> {
        self.resolve::<E>(column.field())
    }

    fn resolve<E: Entity>(&self, field: &'static str) -> Result<Arc<ColumnInfo>, ResolveError> {
        let id = TypeId::of::<E>();
        if let Some(map) = self.columns.get(&id)
            && let Some(info) = map.get(field)
        {
            return Ok(info.clone());
        }

        let Some(attr) = E::field_attr(field) else {
            tracing::trace!(entity = E::NAME, field, "field is not declared");
            return Err(ResolveError::UnknownField {
                entity: E::NAME,
                field,
            });
        };
        if attr.transient {
            tracing::trace!(entity = E::NAME, field, "field is transient");
            return Err(ResolveError::TransientField {
                entity: E::NAME,
                field,
            });
        }

        let table = self.table_name::<E>();
        let mut map = self.columns.entry(id).or_default();
        let info = map
            .entry(attr.field)
            .or_insert_with(|| Arc::new(self.describe(&table, attr)))
            .clone();
        Ok(info)
    }

    fn describe(&self, table: &str, attr: &FieldAttr) -> ColumnInfo {
        let column_name = if attr.column.is_empty() {
            (self.mapper)(attr.field)
        } else {
            attr.column.to_string()
        };
        let table_name = if attr.table.is_empty() {
            table
        } else {
            attr.table
        };
        ColumnInfo {
            table_name: Some(table_name.to_string()),
            field_name: attr.field.to_string(),
            column_name,
            insertable: attr.insertable,
            updatable: attr.updatable,
        }
    }

    /// 一次性扫描实体的全部字段（按字段名排序，跳过 transient），
    /// 逐个解析进缓存；结果用于生成隐式 SELECT 列表。
    pub fn columns<E: Entity>(&self) -> Arc<[Arc<ColumnInfo>]> {
        let id = TypeId::of::<E>();
        if let Some(scan) = self.scans.get(&id) {
            return scan.value().clone();
        }

        let mut fields: Vec<&'static FieldAttr> =
            E::FIELDS.iter().filter(|f| !f.transient).collect();
        fields.sort_by(|a, b| a.field.cmp(b.field));

        let scanned: Arc<[Arc<ColumnInfo>]> = fields
            .into_iter()
            .filter_map(|f| self.resolve::<E>(f.field).ok())
            .collect();
        self.scans.entry(id).or_insert(scanned).value().clone()
    }

    /// 隐式 SELECT 的列名列表。
    pub fn select_columns<E: Entity>(&self) -> Vec<String> {
        self.columns::<E>()
            .iter()
            .map(|c| c.column_name.clone())
            .collect()
    }

    /// 当前已缓存的列描述（按写入顺序）。
    pub fn cached_columns<E: Entity>(&self) -> Vec<Arc<ColumnInfo>> {
        self.columns
            .get(&TypeId::of::<E>())
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default()
    }
}
