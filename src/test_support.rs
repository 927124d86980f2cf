//! 测试用的实体与执行端。

use crate::error::BoxError;
use crate::executor::{NamedParameterExecutor, NamedParams, Row};
use crate::value::SqlValue;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// 过滤对象。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct UserQuery {
    pub id: Option<i64>,
    pub user_name: Option<String>,
    pub status: Option<String>,
    pub tags: Vec<String>,
    pub age: Option<i64>,
    pub age_from: Option<i64>,
    pub age_to: Option<i64>,
    pub dept_id: Option<i64>,
    pub cache: Option<String>,
}

crate::entity! {
    UserQuery {
        const ID: id,
        const USER_NAME: user_name,
        const STATUS: status { column: "state" },
        const TAGS: tags { column: "tag" },
        const AGE: age,
        const AGE_FROM: age_from,
        const AGE_TO: age_to,
        const DEPT_ID: dept_id { table: "dept" },
        const CACHE: cache { transient: true },
    }
}

/// 结果类型。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct User {
    pub id: i64,
    pub user_name: String,
    #[serde(default)]
    pub age: Option<i64>,
}

crate::entity! {
    #[table(name = "users")]
    User {
        const ID: id,
        const USER_NAME: user_name,
        const AGE: age,
    }
}

pub(crate) fn user_query() -> UserQuery {
    UserQuery {
        id: Some(1),
        user_name: Some("tom".to_string()),
        status: Some("active".to_string()),
        ..UserQuery::default()
    }
}

pub(crate) fn row<const N: usize>(pairs: [(&str, SqlValue); N]) -> Row {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

pub(crate) fn user_row(id: i64, name: &str) -> Row {
    row([
        ("ID", SqlValue::I64(id)),
        ("USER_NAME", SqlValue::from(name.to_string())),
    ])
}

#[derive(Default)]
struct Recorded {
    calls: Vec<(String, NamedParams)>,
    responses: VecDeque<Result<Vec<Row>, String>>,
}

/// 记录收到的 SQL 与参数，按顺序返回预先设置的结果（没有时返回空结果）。
#[derive(Clone, Default)]
pub(crate) struct RecordingExecutor {
    inner: Arc<Mutex<Recorded>>,
}

impl RecordingExecutor {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(&self, rows: Vec<Row>) -> &Self {
        self.inner.lock().unwrap().responses.push_back(Ok(rows));
        self
    }

    pub(crate) fn fail(&self, message: &str) -> &Self {
        self.inner
            .lock()
            .unwrap()
            .responses
            .push_back(Err(message.to_string()));
        self
    }

    pub(crate) fn calls(&self) -> Vec<(String, NamedParams)> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub(crate) fn sqls(&self) -> Vec<String> {
        self.calls().into_iter().map(|(sql, _)| sql).collect()
    }
}

impl NamedParameterExecutor for RecordingExecutor {
    fn query(&self, sql: &str, params: &NamedParams) -> Result<Vec<Row>, BoxError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push((sql.to_string(), params.clone()));
        match inner.responses.pop_front() {
            Some(Ok(rows)) => Ok(rows),
            Some(Err(message)) => Err(message.into()),
            None => Ok(Vec::new()),
        }
    }
}
