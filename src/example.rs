//! Example：条件构建器 + 执行流程。
//!
//! 执行顺序：before 钩子（全局 -> 本地）-> 拼接 SQL -> 执行 -> 结果映射 -> after 钩子（全局 -> 本地）。
//! SQL 按以下顺序以空格拼接：
//!
//! ```text
//! <first...> SELECT <select... | 结果类型的列 | *> FROM <table> [WHERE <where>] <last...>
//! ```

use crate::config::Configuration;
use crate::criteria::Criteria;
use crate::entity::{CountRow, Entity, EntityInfo};
use crate::error::{CriteriaError, Result};
use crate::executor::{map_rows, named_params};
use crate::hooks::{AfterQueryHook, typed_after_hook};
use crate::interpolate;
use crate::page::Page;
use crate::string_builder::{StringBuilder, join_non_empty};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::Instant;

/// 本地 before 钩子：可以继续向构建器追加条件（例如按租户过滤）。
pub type LocalBeforeHook<F> = Arc<dyn Fn(&mut Criteria<F>, &EntityInfo) + Send + Sync>;

/// 以过滤对象 `F` 为参数源、结果映射为 `T` 的查询。
///
/// 通过 `Deref` 暴露 [`Criteria`] 的全部条件方法：
///
/// ```ignore
/// let mut ex = Example::<UserQuery, User>::of(&config, query)?;
/// ex.equal(UserQuery::STATUS)
///     .like_if_present(LikePattern::Right, UserQuery::NAME)
///     .or(|c| {
///         c.is_null(UserQuery::DELETED_AT);
///     });
/// let users = ex.list()?;
/// ```
pub struct Example<F, T> {
    criteria: Criteria<F>,
    config: Configuration,
    table_name: Arc<str>,
    use_before: bool,
    use_after: bool,
    before: Vec<LocalBeforeHook<F>>,
    after: Vec<AfterQueryHook>,
    _shape: PhantomData<fn() -> T>,
}

impl<F, T> Deref for Example<F, T> {
    type Target = Criteria<F>;

    fn deref(&self) -> &Self::Target {
        &self.criteria
    }
}

impl<F, T> DerefMut for Example<F, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.criteria
    }
}

impl<F, T> fmt::Debug for Example<F, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Example")
            .field("table_name", &self.table_name)
            .field("criteria", &self.criteria)
            .field("use_before", &self.use_before)
            .field("use_after", &self.use_after)
            .field("before", &self.before.len())
            .field("after", &self.after.len())
            .finish()
    }
}

impl<F, T> fmt::Display for Example<F, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.criteria, f)
    }
}

impl<F: Entity + Serialize, T: Entity> Example<F, T> {
    /// 创建查询：立即解析结果类型的表名，并预热其列缓存。
    pub fn of(config: &Configuration, filter: F) -> Result<Self> {
        let registry = config.registry().clone();
        let table_name = registry.table_name::<T>();
        registry.columns::<T>();
        let criteria = Criteria::with_registry(filter, registry)?;
        Ok(Self {
            criteria,
            config: config.clone(),
            table_name,
            use_before: true,
            use_after: true,
            before: Vec::new(),
            after: Vec::new(),
            _shape: PhantomData,
        })
    }
}

impl<F: Entity, T: Entity> Example<F, T> {
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn criteria(&self) -> &Criteria<F> {
        &self.criteria
    }

    pub fn use_before(&mut self, enabled: bool) -> &mut Self {
        self.use_before = enabled;
        self
    }

    pub fn use_after(&mut self, enabled: bool) -> &mut Self {
        self.use_after = enabled;
        self
    }

    pub fn before_query<H>(&mut self, hook: H) -> &mut Self
    where
        H: Fn(&mut Criteria<F>, &EntityInfo) + Send + Sync + 'static,
    {
        self.before.push(Arc::new(hook));
        self
    }

    /// 本地 after 钩子；`copy_as` 到其他结果类型后不再生效。
    pub fn after_query<H>(&mut self, hook: H) -> &mut Self
    where
        H: Fn(&mut Vec<T>, &EntityInfo) + Send + Sync + 'static,
    {
        self.after.push(typed_after_hook(hook));
        self
    }

    pub fn clear_before(&mut self) -> &mut Self {
        self.before.clear();
        self
    }

    pub fn clear_after(&mut self) -> &mut Self {
        self.after.clear();
        self
    }

    /// 复制出一个独立的查询（片段、钩子、开关都会保留）。
    pub fn copy(&self) -> Self {
        self.copy_as::<T>()
    }

    /// 复制并改变结果类型；表名沿用当前查询。
    pub fn copy_as<R: Entity>(&self) -> Example<F, R> {
        Example {
            criteria: self.criteria.clone(),
            config: self.config.clone(),
            table_name: self.table_name.clone(),
            use_before: self.use_before,
            use_after: self.use_after,
            before: self.before.clone(),
            after: self.after.clone(),
            _shape: PhantomData,
        }
    }

    /// 渲染参数化 SQL；构建条件时记录的解析错误会在这里返回。
    pub fn to_sql(&self) -> Result<String> {
        self.criteria.check()?;
        let clauses = self.criteria.clauses();

        let mut sql = StringBuilder::new();
        sql.write_leading(&join_non_empty(clauses.first_fragments(), "\n"));
        sql.write_leading("SELECT");
        if clauses.select_fragments().is_empty() {
            let columns = self.criteria.registry().select_columns::<T>();
            if columns.is_empty() {
                sql.write_leading("*");
            } else {
                sql.write_leading(&columns.join(","));
            }
        } else {
            sql.write_leading(&join_non_empty(clauses.select_fragments(), "\n"));
        }
        sql.write_leading("FROM");
        sql.write_leading(&self.table_name);
        if !clauses.where_fragments().is_empty() {
            sql.write_leading("WHERE");
            sql.write_leading(&clauses.where_clause());
        }
        sql.write_leading(&join_non_empty(clauses.last_fragments(), "\n"));
        Ok(sql.into_string())
    }

    fn run_before_hooks(&mut self, info: &EntityInfo) {
        for hook in self.config.hooks().before_query_hooks() {
            hook(self.criteria.clauses_mut(), info);
        }
        for hook in self.before.clone() {
            hook(&mut self.criteria, info);
        }
    }

    fn run_after_hooks(&self, records: &mut Vec<T>, info: &EntityInfo) {
        for hook in self.config.hooks().after_query_hooks() {
            hook(&mut *records, info);
        }
        for hook in &self.after {
            hook(&mut *records, info);
        }
    }
}

impl<F: Entity, T: Entity + DeserializeOwned> Example<F, T> {
    /// 执行查询并映射结果。没有结果行时不调用 after 钩子。
    pub fn list(&mut self) -> Result<Vec<T>> {
        let info = EntityInfo::of::<T>();
        if self.use_before {
            self.run_before_hooks(&info);
        }

        let sql = self.to_sql()?;
        let params = named_params(self.criteria.clauses().record());
        let started = Instant::now();
        let rows = self
            .config
            .executor()
            .query(&sql, &params)
            .map_err(CriteriaError::Execute)?;
        let mut records: Vec<T> = map_rows(rows)?;

        if self.use_after && !records.is_empty() {
            self.run_after_hooks(&mut records, &info);
        }

        if tracing::enabled!(tracing::Level::DEBUG) {
            tracing::debug!(
                table = %self.table_name,
                rows = records.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "{}",
                interpolate::render(&sql, &params)
            );
        }
        Ok(records)
    }

    /// 分页查询：先在副本上 count，总数为 0 时不再执行数据查询。
    pub fn page(&mut self, mut page: Page<T>) -> Result<Page<T>> {
        let total = self.copy().use_after(false).count()?;
        page.total = u64::try_from(total).unwrap_or(0);
        if page.total == 0 {
            page.records.clear();
            return Ok(page);
        }
        self.criteria.last(page.limit_clause());
        page.records = self.list()?;
        Ok(page)
    }
}

impl<F: Entity, T: Entity> Example<F, T> {
    /// `COUNT(1)`。
    pub fn count(&self) -> Result<i64> {
        self.count_by("1")
    }

    /// `COUNT(<column>)`，例如 `count_by("DISTINCT user_id")`。
    pub fn count_by(&self, column: &str) -> Result<i64> {
        let mut counter = self.copy_as::<CountRow>();
        counter
            .clear_select()
            .select_raw(format!("COUNT({column}) AS count_number"));
        let rows = counter.list()?;
        Ok(rows.first().map_or(0, |r| r.count_number))
    }
}
