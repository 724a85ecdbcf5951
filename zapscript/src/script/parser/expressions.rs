//! # 表达式占位符
//!
//! 两阶段处理：
//!
//! ```text
//! "Hi [[name]]" → [标记化] → "Hi \u{E000}name\u{E001}" → [求值] → "Hi Mario"
//! ```
//!
//! 标记化在解析时完成，求值可以稍后用不同的环境多次进行。

use serde::{Deserialize, Serialize};

use crate::error::{EvalError, ParseError};
use crate::script::expr::{EvalContext, ExprEngine};

use super::cursor::Cursor;
use super::helpers::push_escape;
use super::symbols::{ESCAPE, EXPR_CLOSE, EXPR_END, EXPR_OPEN, EXPR_START};

/// 标记化文本中的片段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ArgPart {
    /// 普通文本
    Text(String),
    /// 表达式源码（不含标记）
    Expression(String),
}

/// 扫描表达式（第一个 `[` 已消费）
///
/// 不是 `[[` 时返回字面量 `[`。
pub(crate) fn scan_expression(cursor: &mut Cursor<'_>) -> Result<String, ParseError> {
    match cursor.read() {
        Some(EXPR_OPEN) => {}
        _ => {
            // 末尾读到 None 时 unread 不产生效果
            cursor.unread();
            return Ok(EXPR_OPEN.to_string());
        }
    }

    let mut raw = String::from(EXPR_START);
    loop {
        let Some(ch) = cursor.read() else {
            return Err(ParseError::UnmatchedExpression {
                offset: cursor.pos(),
            });
        };

        if ch == EXPR_CLOSE && cursor.peek() == Some(EXPR_CLOSE) {
            cursor.skip();
            raw.push(EXPR_END);
            return Ok(raw);
        }

        raw.push(ch);
    }
}

/// 只处理转义和表达式的独立标记化
pub(crate) fn scan_template(cursor: &mut Cursor<'_>) -> Result<String, ParseError> {
    let mut result = String::new();

    while let Some(ch) = cursor.read() {
        match ch {
            ESCAPE => push_escape(cursor, &mut result),
            EXPR_OPEN => result.push_str(&scan_expression(cursor)?),
            c => result.push(c),
        }
    }

    Ok(result)
}

/// 把标记化文本拆分为文本与表达式片段
///
/// 相邻文本合并为一个片段；空输入返回空列表。
pub fn tokenize_parts(text: &str) -> Result<Vec<ArgPart>, EvalError> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars();

    while let Some(ch) = chars.next() {
        if ch != EXPR_START {
            current.push(ch);
            continue;
        }

        if !current.is_empty() {
            parts.push(ArgPart::Text(std::mem::take(&mut current)));
        }

        let mut source = String::new();
        let mut closed = false;
        for ch in chars.by_ref() {
            if ch == EXPR_END {
                closed = true;
                break;
            }
            source.push(ch);
        }
        if !closed {
            return Err(EvalError::UnmatchedExpression {
                offset: text.chars().count(),
            });
        }
        parts.push(ArgPart::Expression(source));
    }

    if !current.is_empty() {
        parts.push(ArgPart::Text(current));
    }

    Ok(parts)
}

/// 对标记化文本中的所有表达式求值并拼接结果
pub(crate) fn eval_parts(
    text: &str,
    engine: &impl ExprEngine,
    ctx: &dyn EvalContext,
) -> Result<String, EvalError> {
    let mut result = String::new();

    for part in tokenize_parts(text)? {
        match part {
            ArgPart::Text(s) => result.push_str(&s),
            ArgPart::Expression(source) => {
                let value =
                    engine
                        .eval(&source, ctx)
                        .map_err(|source_err| EvalError::Expression {
                            expression: source.clone(),
                            source: source_err,
                        })?;
                let output = value.to_output().ok_or_else(|| EvalError::BadReturnType {
                    expression: source.clone(),
                    kind: value.kind().to_string(),
                })?;
                result.push_str(&output);
            }
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(input: &str) -> Result<String, ParseError> {
        scan_template(&mut Cursor::new(input))
    }

    #[test]
    fn test_scan_expression_lone_bracket() {
        let mut cursor = Cursor::new("a]");
        assert_eq!(scan_expression(&mut cursor).unwrap(), "[");
        assert_eq!(cursor.peek(), Some('a'));

        let mut cursor = Cursor::new("");
        assert_eq!(scan_expression(&mut cursor).unwrap(), "[");
        assert_eq!(cursor.pos(), 0);
    }

    #[test]
    fn test_scan_expression_inner_bracket() {
        let mut cursor = Cursor::new("[a[0] + 1]]x");
        assert_eq!(
            scan_expression(&mut cursor).unwrap(),
            "\u{E000}a[0] + 1\u{E001}"
        );
        assert_eq!(cursor.peek(), Some('x'));
    }

    #[test]
    fn test_scan_template() {
        assert_eq!(template("").unwrap(), "");
        assert_eq!(template("hello world").unwrap(), "hello world");
        assert_eq!(
            template("[[first]] and [[second]]").unwrap(),
            "\u{E000}first\u{E001} and \u{E000}second\u{E001}"
        );
        assert_eq!(template("test]]closed").unwrap(), "test]]closed");
        assert_eq!(
            template("text with ^[[escaped]] brackets").unwrap(),
            "text with [[escaped]] brackets"
        );
        assert_eq!(template("line one^nline two").unwrap(), "line one\nline two");
        assert_eq!(template("trailing^").unwrap(), "trailing^");
        assert_eq!(template("a[").unwrap(), "a[");
        assert!(matches!(
            template("test[[unclosed"),
            Err(ParseError::UnmatchedExpression { offset: 14 })
        ));
    }

    #[test]
    fn test_tokenize_parts() {
        assert_eq!(tokenize_parts("").unwrap(), vec![]);
        assert_eq!(
            tokenize_parts("a \u{E000}x\u{E001}\u{E000}y\u{E001} b").unwrap(),
            vec![
                ArgPart::Text("a ".to_string()),
                ArgPart::Expression("x".to_string()),
                ArgPart::Expression("y".to_string()),
                ArgPart::Text(" b".to_string()),
            ]
        );
        assert!(matches!(
            tokenize_parts("a \u{E000}open"),
            Err(EvalError::UnmatchedExpression { offset: 7 })
        ));
    }

    #[test]
    fn test_arg_part_json_shape() {
        let parts = vec![
            ArgPart::Text("hi ".to_string()),
            ArgPart::Expression("name".to_string()),
        ];
        insta::assert_snapshot!(
            serde_json::to_string(&parts).unwrap(),
            @r#"[{"type":"text","value":"hi "},{"type":"expression","value":"name"}]"#
        );
    }
}
