//! # 辅助解析函数
//!
//! 各扫描器共用的小工具：转义、引号字面量、JSON 字面量、命令结束判断。

use crate::error::ParseError;

use super::cursor::Cursor;
use super::expressions::scan_expression;
use super::symbols::{CMD_SEP, ESCAPE, EXPR_OPEN, JSON_END, JSON_ESCAPE, JSON_START, JSON_STRING};

/// 子扫描器的结果
///
/// `Literal` 表示语法不成立，调用方应把携带的原始文本当作普通内容处理。
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Scanned<T> {
    Value(T),
    Literal(String),
}

/// 解码 `^` 之后的一个字符
///
/// 输入结束时返回 `None`，调用方需要原样输出 `^`。
pub(crate) fn decode_escape(cursor: &mut Cursor<'_>) -> Option<char> {
    let ch = cursor.read()?;
    Some(match ch {
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        other => other,
    })
}

/// 解码转义并追加到 `out`
pub(crate) fn push_escape(cursor: &mut Cursor<'_>, out: &mut String) {
    out.push(decode_escape(cursor).unwrap_or(ESCAPE));
}

/// 判断 `ch`（刚读到）是否构成命令链结束符
///
/// `||` 时消费第二个 `|`；`|` 后紧跟输入结束也算结束。单个 `|` 是普通内容。
pub(crate) fn check_end_of_cmd(cursor: &mut Cursor<'_>, ch: char) -> bool {
    if ch != CMD_SEP {
        return false;
    }
    match cursor.peek() {
        None => true,
        Some(CMD_SEP) => {
            cursor.skip();
            true
        }
        Some(_) => false,
    }
}

/// 下一个字符是否开始一个命令链结束符（读取后回退，不改变位置）
pub(crate) fn at_end_of_cmd(cursor: &mut Cursor<'_>) -> bool {
    match cursor.read() {
        None => true,
        Some(ch) => {
            let end = ch == CMD_SEP && matches!(cursor.peek(), None | Some(CMD_SEP));
            cursor.unread();
            end
        }
    }
}

/// 读取到当前命令段结束，返回读到的原始文本（不含结束符）
pub(crate) fn consume_to_end_of_cmd(cursor: &mut Cursor<'_>) -> String {
    let mut buf = String::new();
    while let Some(ch) = cursor.read() {
        if check_end_of_cmd(cursor, ch) {
            break;
        }
        buf.push(ch);
    }
    buf
}

/// 扫描引号字面量（开引号已消费）
///
/// 支持转义和内联表达式。
pub(crate) fn scan_quoted(cursor: &mut Cursor<'_>, quote: char) -> Result<String, ParseError> {
    let mut value = String::new();

    loop {
        let Some(ch) = cursor.read() else {
            return Err(ParseError::UnmatchedQuote {
                offset: cursor.pos(),
            });
        };

        match ch {
            ESCAPE => {
                // 末尾的 `^` 之后必然是未闭合引号，这里不需要补回
                if let Some(decoded) = decode_escape(cursor) {
                    value.push(decoded);
                }
            }
            EXPR_OPEN => value.push_str(&scan_expression(cursor)?),
            c if c == quote => return Ok(value),
            c => value.push(c),
        }
    }
}

/// 扫描 JSON 字面量（`{` 已消费），返回紧凑形式
pub(crate) fn scan_json(cursor: &mut Cursor<'_>) -> Result<String, ParseError> {
    let mut raw = String::from(JSON_START);
    let mut depth = 1usize;
    let mut in_string = false;
    let mut escaped = false;

    while depth > 0 {
        let Some(ch) = cursor.read() else {
            return Err(ParseError::InvalidJson {
                offset: cursor.pos(),
            });
        };
        raw.push(ch);

        if escaped {
            escaped = false;
            continue;
        }

        match ch {
            JSON_ESCAPE => escaped = true,
            JSON_STRING => in_string = !in_string,
            JSON_START if !in_string => depth += 1,
            JSON_END if !in_string => depth -= 1,
            _ => {}
        }
    }

    let value: serde_json::Value =
        serde_json::from_str(&raw).map_err(|_| ParseError::InvalidJson {
            offset: cursor.pos(),
        })?;

    serde_json::to_string(&value).map_err(|_| ParseError::InvalidJson {
        offset: cursor.pos(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn escape_of(input: &str) -> Option<char> {
        let mut cursor = Cursor::new(input);
        decode_escape(&mut cursor)
    }

    #[test]
    fn test_decode_escape() {
        assert_eq!(escape_of("n"), Some('\n'));
        assert_eq!(escape_of("r"), Some('\r'));
        assert_eq!(escape_of("t"), Some('\t'));
        assert_eq!(escape_of("^"), Some('^'));
        assert_eq!(escape_of("\""), Some('"'));
        assert_eq!(escape_of("'"), Some('\''));
        // 未知转义只保留字符本身
        assert_eq!(escape_of("x"), Some('x'));
        assert_eq!(escape_of(""), None);
    }

    #[test]
    fn test_push_escape_at_eof() {
        let mut cursor = Cursor::new("");
        let mut out = String::from("a");
        push_escape(&mut cursor, &mut out);
        assert_eq!(out, "a^");
    }

    #[test]
    fn test_check_end_of_cmd() {
        let mut cursor = Cursor::new("||x");
        let ch = cursor.read().unwrap();
        assert!(check_end_of_cmd(&mut cursor, ch));
        assert_eq!(cursor.peek(), Some('x'));

        let mut cursor = Cursor::new("|x");
        let ch = cursor.read().unwrap();
        assert!(!check_end_of_cmd(&mut cursor, ch));
        assert_eq!(cursor.peek(), Some('x'));

        let mut cursor = Cursor::new("|");
        let ch = cursor.read().unwrap();
        assert!(check_end_of_cmd(&mut cursor, ch));
    }

    #[test]
    fn test_at_end_of_cmd() {
        let at_end = |input: &str| {
            let mut cursor = Cursor::new(input);
            let end = at_end_of_cmd(&mut cursor);
            assert_eq!(cursor.pos(), 0, "{input:?} 不应消费字符");
            end
        };
        assert!(at_end(""));
        assert!(at_end("|"));
        assert!(at_end("||a"));
        assert!(!at_end("|a"));
        assert!(!at_end("a"));
    }

    #[test]
    fn test_consume_to_end_of_cmd() {
        let mut cursor = Cursor::new("abc|d||rest");
        assert_eq!(consume_to_end_of_cmd(&mut cursor), "abc|d");
        assert_eq!(cursor.peek(), Some('r'));
    }

    #[test]
    fn test_scan_quoted() {
        let mut cursor = Cursor::new(r#"a^"b, [[x]]"tail"#);
        let value = scan_quoted(&mut cursor, '"').unwrap();
        assert_eq!(value, "a\"b, \u{E000}x\u{E001}");
        assert_eq!(cursor.peek(), Some('t'));

        let mut cursor = Cursor::new("never closed");
        assert!(matches!(
            scan_quoted(&mut cursor, '\''),
            Err(ParseError::UnmatchedQuote { offset: 12 })
        ));
    }

    #[test]
    fn test_scan_json() {
        let mut cursor = Cursor::new(r#""a": {"b": "}"}, "c": 1}rest"#);
        assert_eq!(
            scan_json(&mut cursor).unwrap(),
            r#"{"a":{"b":"}"},"c":1}"#
        );
        assert_eq!(cursor.peek(), Some('r'));

        let mut cursor = Cursor::new(r#""k": "v""#);
        assert!(matches!(
            scan_json(&mut cursor),
            Err(ParseError::InvalidJson { .. })
        ));

        let mut cursor = Cursor::new("not json}");
        assert!(matches!(
            scan_json(&mut cursor),
            Err(ParseError::InvalidJson { .. })
        ));
    }
}
