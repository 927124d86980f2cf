//! SQL 插值：把 `:name` 命名参数替换为字面量，仅用于日志展示。
//!
//! 安全警告：插值结果只给人看，执行时始终使用参数化 SQL。

use crate::executor::NamedParams;
use crate::value::SqlValue;
use time::macros::format_description;

/// 把 `sql` 中引号外的 `:name` 替换为 `params` 中对应值的字面量。
///
/// - 没有对应参数的名称保持原样
/// - `::type` 形式的类型转换不会被当成参数
pub fn render(sql: &str, params: &NamedParams) -> String {
    let mut out = String::with_capacity(sql.len() + params.len() * 16);
    let mut quote: Option<char> = None;
    let mut escaping = false;
    let mut chars = sql.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if escaping {
            out.push(c);
            escaping = false;
            continue;
        }

        match c {
            '\\' if quote.is_some() => {
                out.push(c);
                escaping = true;
            }
            '\'' | '"' | '`' => {
                if quote == Some(c) {
                    quote = None;
                } else if quote.is_none() {
                    quote = Some(c);
                }
                out.push(c);
            }
            ':' if quote.is_none() => {
                if let Some(&(_, ':')) = chars.peek() {
                    chars.next();
                    out.push_str("::");
                    continue;
                }
                let start = i + 1;
                let mut end = start;
                while let Some(&(j, n)) = chars.peek() {
                    if n.is_ascii_alphanumeric() || n == '_' {
                        end = j + n.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let name = &sql[start..end];
                match params.get(name) {
                    Some(v) if !name.is_empty() => encode_value(&mut out, v),
                    _ => {
                        out.push(':');
                        out.push_str(name);
                    }
                }
            }
            _ => out.push(c),
        }
    }

    out
}

fn encode_value(out: &mut String, v: &SqlValue) {
    match v {
        SqlValue::Null => out.push_str("NULL"),
        SqlValue::Bool(b) => out.push_str(if *b { "TRUE" } else { "FALSE" }),
        SqlValue::I64(n) => out.push_str(&n.to_string()),
        SqlValue::U64(n) => out.push_str(&n.to_string()),
        SqlValue::F64(n) => out.push_str(&n.to_string()),
        SqlValue::String(s) => quote_string(out, s.as_ref()),
        SqlValue::Bytes(b) => encode_bytes(out, b),
        SqlValue::DateTime(dt) => encode_datetime(out, dt),
        SqlValue::List(items) => {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                encode_value(out, item);
            }
        }
    }
}

fn encode_bytes(out: &mut String, data: &[u8]) {
    if data.is_empty() {
        out.push_str("NULL");
        return;
    }
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    out.push_str("X'");
    for &b in data {
        out.push(HEX[((b >> 4) & 0xF) as usize] as char);
        out.push(HEX[(b & 0xF) as usize] as char);
    }
    out.push('\'');
}

fn quote_string(out: &mut String, s: &str) {
    out.push('\'');
    for ch in s.chars() {
        match ch {
            '\u{0000}' => out.push_str("\\0"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            _ => out.push(ch),
        }
    }
    out.push('\'');
}

fn encode_datetime(out: &mut String, dt: &time::OffsetDateTime) {
    let fmt = format_description!(
        "'[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6]'"
    );
    match dt.format(fmt) {
        Ok(s) => out.push_str(&s),
        Err(_) => quote_string(out, &dt.to_string()),
    }
}
