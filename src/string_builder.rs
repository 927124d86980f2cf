//! SQL 文本拼接工具：组装查询语句与 where 子句时使用。

#[derive(Debug, Default, Clone)]
pub(crate) struct StringBuilder {
    buf: String,
}

impl StringBuilder {
    pub(crate) fn new() -> Self {
        Self { buf: String::new() }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// 写入 `s`；如果不是首次写入，会先写入一个空格。空字符串不写入。
    pub(crate) fn write_leading(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        if !self.buf.is_empty() {
            self.buf.push(' ');
        }
        self.buf.push_str(s);
    }

    pub(crate) fn write_str(&mut self, s: &str) {
        self.buf.push_str(s);
    }

    /// 用 `sep` 连接 `items`，跳过空串。
    pub(crate) fn write_strings(&mut self, items: &[String], sep: &str) {
        let mut first_added = false;
        for s in items {
            if s.is_empty() {
                continue;
            }
            if first_added {
                self.buf.push_str(sep);
            }
            self.buf.push_str(s);
            first_added = true;
        }
    }

    /// 把当前内容整体包进括号。
    pub(crate) fn wrap_parens(&mut self) {
        self.buf.insert(0, '(');
        self.buf.push(')');
    }

    pub(crate) fn into_string(self) -> String {
        self.buf
    }
}

/// 用 `sep` 连接非空片段。
pub(crate) fn join_non_empty(items: &[String], sep: &str) -> String {
    let mut sb = StringBuilder::new();
    sb.write_strings(items, sep);
    sb.into_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn write_leading_separates_with_space() {
        let mut sb = StringBuilder::new();
        sb.write_leading("SELECT");
        sb.write_leading("");
        sb.write_leading("*");
        assert_eq!(sb.into_string(), "SELECT *");
    }

    #[test]
    fn join_skips_empty_items() {
        let items = vec!["a".to_string(), String::new(), "b".to_string()];
        assert_eq!(join_non_empty(&items, "\n"), "a\nb");
    }

    #[test]
    fn wrap_parens_encloses_everything() {
        let mut sb = StringBuilder::new();
        sb.write_str("a = 1 AND b = 2");
        sb.wrap_parens();
        sb.write_str(" OR c = 3");
        assert_eq!(sb.into_string(), "(a = 1 AND b = 2) OR c = 3");
    }
}
