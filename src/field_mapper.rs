//! 命名转换：把类型名 / 字段名映射为表名 / 列名。

use std::sync::{Arc, OnceLock};

/// 名称映射函数类型（元数据注册表持有一个，用于推导表名和列名）。
pub type FieldMapperFunc = Arc<dyn Fn(&str) -> String + Send + Sync + 'static>;

fn identity_impl(s: &str) -> String {
    s.to_string()
}

static IDENTITY_MAPPER: OnceLock<FieldMapperFunc> = OnceLock::new();
static SNAKE_CASE_MAPPER: OnceLock<FieldMapperFunc> = OnceLock::new();

/// 恒等 mapper：名称原样作为表名/列名。
pub fn identity_mapper() -> FieldMapperFunc {
    IDENTITY_MAPPER
        .get_or_init(|| Arc::new(identity_impl))
        .clone()
}

/// 默认 mapper：`snake_case_mapper` 的共享实例。
pub fn default_field_mapper() -> FieldMapperFunc {
    SNAKE_CASE_MAPPER
        .get_or_init(|| Arc::new(snake_case_mapper))
        .clone()
}

fn convert_with_separator(s: &str, sep: char) -> String {
    let mut out = String::with_capacity(s.len() + 8);
    let mut prev: Option<char> = None;
    let chars: Vec<char> = s.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        let next = chars.get(i + 1).copied();

        if c.is_ascii_uppercase() {
            if let Some(p) = prev {
                let prev_is_lower_or_digit = p.is_ascii_lowercase() || p.is_ascii_digit();
                let prev_is_upper = p.is_ascii_uppercase();
                let next_is_lower = next.map(|n| n.is_ascii_lowercase()).unwrap_or(false);

                if prev_is_lower_or_digit || (prev_is_upper && next_is_lower) {
                    out.push(sep);
                }
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }

        prev = Some(c);
    }

    out
}

/// SnakeCaseMapper：将 `CamelCase` / `camelCase` 转为 `snake_case`。
///
/// - 大写转小写
/// - 单词边界插入 `_`（`aB`/`a1B`/`ABc` 等）
/// - 已经是 snake_case 的名称保持不变
pub fn snake_case_mapper(s: &str) -> String {
    convert_with_separator(s, '_')
}
