//! Criteria：条件片段的累积、嵌套分组与 where 子句拼接。
//!
//! 片段分四组保存：`first`（SELECT 之前，如 CTE）、`select`、`where`、`last`（如排序、分页）。
//! 谓词以 `column <op> :field` 的形式写入，`:field` 在执行时绑定到过滤对象的同名字段。

use crate::column::{Column, ColumnInfo};
use crate::entity::Entity;
use crate::error::{CriteriaError, ResolveError, Result};
use crate::macros::{IntoStrings, collect_into_strings};
use crate::metadata::MetadataRegistry;
use crate::string_builder::StringBuilder;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

const AND_LED: &str = " AND ";
const OR_LED: &str = " OR ";

/// LIKE 的通配方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LikePattern {
    /// `CONCAT(:f, '%')`：前缀匹配。
    Right,
    /// `CONCAT('%', :f)`：后缀匹配。
    Left,
    /// `CONCAT('%', :f, '%')`：包含匹配。
    #[default]
    Both,
}

impl LikePattern {
    fn wrap(self, field: &str) -> String {
        match self {
            LikePattern::Right => format!("CONCAT(:{field}, '%')"),
            LikePattern::Left => format!("CONCAT('%', :{field})"),
            LikePattern::Both => format!("CONCAT('%', :{field}, '%')"),
        }
    }
}

/// 与过滤对象类型无关的片段存储；全局 before 钩子拿到的就是它。
#[derive(Debug, Clone, Default)]
pub struct Clauses {
    record: Arc<Map<String, Value>>,
    first: Vec<String>,
    select: Vec<String>,
    where_: Vec<String>,
    last: Vec<String>,
}

impl Clauses {
    pub(crate) fn new(record: Arc<Map<String, Value>>) -> Self {
        Self {
            record,
            ..Self::default()
        }
    }

    /// 过滤对象序列化后的记录（命名参数的来源）。
    pub fn record(&self) -> &Map<String, Value> {
        &self.record
    }

    pub fn param(&self, name: &str) -> Option<&Value> {
        self.record.get(name)
    }

    /// 参数为 null、缺失、空串、空数组或空对象时视为空。
    pub fn is_empty_param(&self, name: &str) -> bool {
        is_empty_value(self.record.get(name))
    }

    pub fn first(&mut self, raw: impl IntoStrings) -> &mut Self {
        self.first.extend(collect_into_strings(raw));
        self
    }

    pub fn last(&mut self, raw: impl IntoStrings) -> &mut Self {
        self.last.extend(collect_into_strings(raw));
        self
    }

    pub fn select_raw(&mut self, columns: impl IntoStrings) -> &mut Self {
        self.select.extend(collect_into_strings(columns));
        self
    }

    /// 直接追加 where 片段（原样写入，不做解析）。
    pub fn where_raw(&mut self, exprs: impl IntoStrings) -> &mut Self {
        self.where_.extend(collect_into_strings(exprs));
        self
    }

    pub fn clear_first(&mut self) -> &mut Self {
        self.first.clear();
        self
    }

    pub fn clear_last(&mut self) -> &mut Self {
        self.last.clear();
        self
    }

    pub fn clear_select(&mut self) -> &mut Self {
        self.select.clear();
        self
    }

    pub fn clear_where(&mut self) -> &mut Self {
        self.where_.clear();
        self
    }

    pub fn first_fragments(&self) -> &[String] {
        &self.first
    }

    pub fn select_fragments(&self) -> &[String] {
        &self.select
    }

    pub fn where_fragments(&self) -> &[String] {
        &self.where_
    }

    pub fn last_fragments(&self) -> &[String] {
        &self.last
    }

    /// 拼接后的 where 子句（不含 `WHERE` 关键字）。
    pub fn where_clause(&self) -> String {
        flatten(&self.where_)
    }
}

impl fmt::Display for Clauses {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.where_clause())
    }
}

pub(crate) fn is_empty_value(v: Option<&Value>) -> bool {
    match v {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        Some(Value::Object(o)) => o.is_empty(),
        Some(_) => false,
    }
}

fn is_connector_led(fragment: &str) -> bool {
    fragment.starts_with(AND_LED) || fragment.starts_with(OR_LED)
}

/// 把 where 片段按顺序合并成一个布尔表达式。
///
/// - 普通片段之间以 ` AND ` 连接
/// - 以 ` AND ` / ` OR ` 开头的分组片段会把之前累积的全部内容包进括号，再原样追加
/// - 第一个片段如果带连接词，则去掉该连接词
pub(crate) fn flatten(fragments: &[String]) -> String {
    let mut sb = StringBuilder::new();
    for (i, fragment) in fragments.iter().enumerate() {
        if i == 0 {
            let stripped = fragment
                .strip_prefix(AND_LED)
                .or_else(|| fragment.strip_prefix(OR_LED))
                .unwrap_or(fragment);
            sb.write_str(stripped);
        } else if is_connector_led(fragment) {
            if !sb.is_empty() {
                sb.wrap_parens();
            }
            sb.write_str(fragment);
        } else {
            sb.write_str(AND_LED);
            sb.write_str(fragment);
        }
    }
    sb.into_string().trim().to_string()
}

/// 把 `{0}`、`{1}`… 依次替换为给定的值。
fn fill_placeholders(template: &str, values: &[String]) -> String {
    let mut out = template.to_string();
    for (i, v) in values.iter().enumerate() {
        out = out.replace(&format!("{{{i}}}"), v);
    }
    out
}

/// 可以作为一组列引用传入的参数：单列、数组、切片或 `Vec`。
pub trait IntoColumns<E> {
    fn into_columns(self) -> Vec<Column<E>>;
}

impl<E> IntoColumns<E> for Column<E> {
    fn into_columns(self) -> Vec<Column<E>> {
        vec![self]
    }
}

impl<E, const N: usize> IntoColumns<E> for [Column<E>; N] {
    fn into_columns(self) -> Vec<Column<E>> {
        self.to_vec()
    }
}

impl<E> IntoColumns<E> for &[Column<E>] {
    fn into_columns(self) -> Vec<Column<E>> {
        self.to_vec()
    }
}

impl<E> IntoColumns<E> for Vec<Column<E>> {
    fn into_columns(self) -> Vec<Column<E>> {
        self
    }
}

/// 把过滤对象序列化为记录；非 struct / map 的类型会被拒绝。
///
/// 记录的键必须与 `entity!` 声明的字段名一致（`rename` / `rename_all` 改过的键会报错）；
/// 被 `skip_serializing_if` 省略的非 transient 字段补为 null，保证命名参数总能绑定。
pub(crate) fn record_of<F: Entity + Serialize>(filter: &F) -> Result<Map<String, Value>> {
    let mut map = match serde_json::to_value(filter).map_err(CriteriaError::Serialize)? {
        Value::Object(map) => map,
        _ => return Err(CriteriaError::FilterNotRecord { entity: F::NAME }),
    };
    if let Some(key) = map.keys().find(|k| F::field_attr(k.as_str()).is_none()) {
        return Err(CriteriaError::UndeclaredFilterKey {
            entity: F::NAME,
            key: key.clone(),
        });
    }
    for attr in F::FIELDS.iter().filter(|f| !f.transient) {
        map.entry(attr.field).or_insert(Value::Null);
    }
    Ok(map)
}

/// 基于过滤对象 `F` 的条件构建器。
///
/// 列引用解析失败（未声明或 transient 字段）不会中断链式调用：
/// 第一个错误被记录下来，在渲染或执行时返回。
pub struct Criteria<F> {
    filter: Arc<F>,
    registry: Arc<MetadataRegistry>,
    clauses: Clauses,
    error: Option<ResolveError>,
}

impl<F> Clone for Criteria<F> {
    fn clone(&self) -> Self {
        Self {
            filter: self.filter.clone(),
            registry: self.registry.clone(),
            clauses: self.clauses.clone(),
            error: self.error.clone(),
        }
    }
}

impl<F> fmt::Debug for Criteria<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Criteria")
            .field("clauses", &self.clauses)
            .field("error", &self.error)
            .finish()
    }
}

impl<F> fmt::Display for Criteria<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.clauses, f)
    }
}

/// 生成比较运算符及其“值为空时跳过”的版本。
macro_rules! comparison_ops {
    ($($name:ident, $if_present:ident => $op:literal;)*) => {
        $(
            #[doc = concat!("追加 `column ", $op, " :field`。")]
            pub fn $name(&mut self, cols: impl IntoColumns<F>) -> &mut Self {
                self.compare(false, $op, cols)
            }

            #[doc = concat!("同 [`Self::", stringify!($name), "`]，过滤值为空时跳过。")]
            pub fn $if_present(&mut self, cols: impl IntoColumns<F>) -> &mut Self {
                self.compare(true, $op, cols)
            }
        )*
    };
}

impl<F: Entity + Serialize> Criteria<F> {
    /// 使用进程级元数据注册表创建。
    pub fn new(filter: F) -> Result<Self> {
        Self::with_registry(filter, MetadataRegistry::global())
    }

    pub fn with_registry(filter: F, registry: Arc<MetadataRegistry>) -> Result<Self> {
        let record = record_of(&filter)?;
        Ok(Self::from_parts(Arc::new(filter), Arc::new(record), registry))
    }
}

impl<F: Entity> Criteria<F> {
    pub(crate) fn from_parts(
        filter: Arc<F>,
        record: Arc<Map<String, Value>>,
        registry: Arc<MetadataRegistry>,
    ) -> Self {
        Self {
            filter,
            registry,
            clauses: Clauses::new(record),
            error: None,
        }
    }

    /// 共享过滤对象与注册表的空构建器（用于嵌套分组）。
    fn sub(&self) -> Self {
        Self::from_parts(
            self.filter.clone(),
            self.clauses.record.clone(),
            self.registry.clone(),
        )
    }

    pub fn filter(&self) -> &F {
        &self.filter
    }

    pub fn registry(&self) -> &Arc<MetadataRegistry> {
        &self.registry
    }

    pub fn clauses(&self) -> &Clauses {
        &self.clauses
    }

    pub fn clauses_mut(&mut self) -> &mut Clauses {
        &mut self.clauses
    }

    /// 构建过程中记录的第一个解析错误。
    pub fn error(&self) -> Option<&ResolveError> {
        self.error.as_ref()
    }

    pub fn check(&self) -> Result<(), ResolveError> {
        match &self.error {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    fn resolve(&mut self, col: &Column<F>) -> Option<Arc<ColumnInfo>> {
        match self.registry.column(col) {
            Ok(info) => Some(info),
            Err(e) => {
                self.error.get_or_insert(e);
                None
            }
        }
    }

    fn skip(&self, ignore_null: bool, col: &Column<F>) -> bool {
        ignore_null && self.clauses.is_empty_param(col.field())
    }

    fn compare(&mut self, ignore_null: bool, op: &str, cols: impl IntoColumns<F>) -> &mut Self {
        for col in cols.into_columns() {
            if self.skip(ignore_null, &col) {
                continue;
            }
            if let Some(info) = self.resolve(&col) {
                self.clauses
                    .where_
                    .push(format!("{} {op} :{}", info.column_name, col.field()));
            }
        }
        self
    }

    comparison_ops! {
        equal, equal_if_present => "=";
        not_equal, not_equal_if_present => "<>";
        less_than, less_than_if_present => "<";
        less_or_equal, less_or_equal_if_present => "<=";
        greater_than, greater_than_if_present => ">";
        greater_or_equal, greater_or_equal_if_present => ">=";
    }

    fn membership(
        &mut self,
        ignore_null: bool,
        not_in: bool,
        cols: impl IntoColumns<F>,
    ) -> &mut Self {
        let keyword = if not_in { "NOT IN" } else { "IN" };
        for col in cols.into_columns() {
            if self.skip(ignore_null, &col) {
                continue;
            }
            if let Some(info) = self.resolve(&col) {
                self.clauses
                    .where_
                    .push(format!("{} {keyword} (:{})", info.column_name, col.field()));
            }
        }
        self
    }

    /// `column IN (:field)`；序列参数由执行端展开。
    pub fn in_(&mut self, cols: impl IntoColumns<F>) -> &mut Self {
        self.membership(false, false, cols)
    }

    pub fn in_if_present(&mut self, cols: impl IntoColumns<F>) -> &mut Self {
        self.membership(true, false, cols)
    }

    pub fn not_in(&mut self, cols: impl IntoColumns<F>) -> &mut Self {
        self.membership(false, true, cols)
    }

    pub fn not_in_if_present(&mut self, cols: impl IntoColumns<F>) -> &mut Self {
        self.membership(true, true, cols)
    }

    fn null_check(&mut self, suffix: &str, cols: impl IntoColumns<F>) -> &mut Self {
        for col in cols.into_columns() {
            if let Some(info) = self.resolve(&col) {
                self.clauses
                    .where_
                    .push(format!("{} {suffix}", info.column_name));
            }
        }
        self
    }

    pub fn is_null(&mut self, cols: impl IntoColumns<F>) -> &mut Self {
        self.null_check("IS NULL", cols)
    }

    pub fn is_not_null(&mut self, cols: impl IntoColumns<F>) -> &mut Self {
        self.null_check("IS NOT NULL", cols)
    }

    /// LIKE 的完整形式：是否跳过空值、是否取反、通配方式。
    pub fn like_with(
        &mut self,
        ignore_null: bool,
        not_like: bool,
        pattern: LikePattern,
        cols: impl IntoColumns<F>,
    ) -> &mut Self {
        let keyword = if not_like { "NOT LIKE" } else { "LIKE" };
        for col in cols.into_columns() {
            if self.skip(ignore_null, &col) {
                continue;
            }
            if let Some(info) = self.resolve(&col) {
                self.clauses.where_.push(format!(
                    "{} {keyword} {}",
                    info.column_name,
                    pattern.wrap(col.field())
                ));
            }
        }
        self
    }

    /// `column LIKE CONCAT('%', :field, '%')`。
    pub fn like(&mut self, cols: impl IntoColumns<F>) -> &mut Self {
        self.like_with(false, false, LikePattern::Both, cols)
    }

    pub fn like_if_present(
        &mut self,
        pattern: LikePattern,
        cols: impl IntoColumns<F>,
    ) -> &mut Self {
        self.like_with(true, false, pattern, cols)
    }

    pub fn not_like(&mut self, pattern: LikePattern, cols: impl IntoColumns<F>) -> &mut Self {
        self.like_with(false, true, pattern, cols)
    }

    pub fn not_like_if_present(
        &mut self,
        pattern: LikePattern,
        cols: impl IntoColumns<F>,
    ) -> &mut Self {
        self.like_with(true, true, pattern, cols)
    }

    /// 区间条件。只有一侧边界有值时退化为单边比较：
    /// `between` 为 `>= first` / `<= last`，`not_between` 为 `< first` / `> last`。
    fn range(
        &mut self,
        ignore_null: bool,
        negate: bool,
        col: Column<F>,
        first: Column<F>,
        last: Column<F>,
    ) -> &mut Self {
        let first_empty = self.clauses.is_empty_param(first.field());
        let last_empty = self.clauses.is_empty_param(last.field());
        let Some(info) = self.resolve(&col) else {
            return self;
        };
        if ignore_null && first_empty && last_empty {
            return self;
        }
        let name = &info.column_name;
        let (keyword, lower, upper) = if negate {
            ("NOT BETWEEN", "<", ">")
        } else {
            ("BETWEEN", ">=", "<=")
        };
        match (first_empty, last_empty) {
            (false, false) => {
                self.apply(&format!("{name} {keyword} {{0}} AND {{1}}"), [first, last])
            }
            (false, true) => self.apply(&format!("{name} {lower} {{0}}"), first),
            (true, false) => self.apply(&format!("{name} {upper} {{0}}"), last),
            (true, true) => self,
        }
    }

    pub fn between(&mut self, col: Column<F>, first: Column<F>, last: Column<F>) -> &mut Self {
        self.range(false, false, col, first, last)
    }

    pub fn between_if_present(
        &mut self,
        col: Column<F>,
        first: Column<F>,
        last: Column<F>,
    ) -> &mut Self {
        self.range(true, false, col, first, last)
    }

    pub fn not_between(&mut self, col: Column<F>, first: Column<F>, last: Column<F>) -> &mut Self {
        self.range(false, true, col, first, last)
    }

    pub fn not_between_if_present(
        &mut self,
        col: Column<F>,
        first: Column<F>,
        last: Column<F>,
    ) -> &mut Self {
        self.range(true, true, col, first, last)
    }

    /// 自定义片段：模板中的 `{0}`、`{1}`… 依次替换为各列对应的 `:field`。
    pub fn apply(&mut self, template: &str, cols: impl IntoColumns<F>) -> &mut Self {
        let mut params = Vec::new();
        for col in cols.into_columns() {
            if self.resolve(&col).is_none() {
                return self;
            }
            params.push(format!(":{}", col.field()));
        }
        self.clauses.where_.push(fill_placeholders(template, &params));
        self
    }

    /// 嵌套分组，与之前的条件以 AND 连接。
    pub fn and(&mut self, build: impl FnOnce(&mut Criteria<F>)) -> &mut Self {
        self.group(AND_LED, build)
    }

    /// 嵌套分组，与之前的全部条件以 OR 连接。
    pub fn or(&mut self, build: impl FnOnce(&mut Criteria<F>)) -> &mut Self {
        self.group(OR_LED, build)
    }

    fn group(&mut self, connector: &str, build: impl FnOnce(&mut Criteria<F>)) -> &mut Self {
        let mut sub = self.sub();
        build(&mut sub);
        if let Some(e) = sub.error {
            self.error.get_or_insert(e);
        }
        let fragments = &sub.clauses.where_;
        match fragments.len() {
            0 => {}
            1 => self
                .clauses
                .where_
                .push(format!("{connector}{}", flatten(fragments))),
            _ => self
                .clauses
                .where_
                .push(format!("{connector}({})", flatten(fragments))),
        }
        self
    }

    /// 按列引用追加 select 列。
    pub fn select(&mut self, cols: impl IntoColumns<F>) -> &mut Self {
        for col in cols.into_columns() {
            if let Some(info) = self.resolve(&col) {
                self.clauses.select.push(info.column_name.clone());
            }
        }
        self
    }

    /// 追加原始 select 表达式（不做解析）。
    pub fn select_raw(&mut self, columns: impl IntoStrings) -> &mut Self {
        self.clauses.select_raw(columns);
        self
    }

    pub fn where_raw(&mut self, exprs: impl IntoStrings) -> &mut Self {
        self.clauses.where_raw(exprs);
        self
    }

    pub fn first(&mut self, raw: impl IntoStrings) -> &mut Self {
        self.clauses.first(raw);
        self
    }

    pub fn last(&mut self, raw: impl IntoStrings) -> &mut Self {
        self.clauses.last(raw);
        self
    }

    pub fn clear_first(&mut self) -> &mut Self {
        self.clauses.clear_first();
        self
    }

    pub fn clear_last(&mut self) -> &mut Self {
        self.clauses.clear_last();
        self
    }

    pub fn clear_select(&mut self) -> &mut Self {
        self.clauses.clear_select();
        self
    }

    pub fn clear_where(&mut self) -> &mut Self {
        self.clauses.clear_where();
        self
    }

    /// 拼接后的 where 子句；存在解析错误时返回该错误。
    pub fn where_clause(&self) -> Result<String> {
        self.check()?;
        Ok(self.clauses.where_clause())
    }
}
