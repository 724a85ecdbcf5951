//! # Traits 简写
//!
//! `#key=value #flag #list=[a, "b", 3]`
//!
//! 值的类型推断：`true`/`false` → 布尔，能完整解析为 i64 → 整数，
//! 能解析为 f64 → 浮点，否则为字符串。带引号的值总是字符串。

use tracing::debug;

use crate::error::ParseError;
use crate::script::ast::TraitValue;

use super::cursor::Cursor;
use super::helpers::{Scanned, at_end_of_cmd, check_end_of_cmd, consume_to_end_of_cmd, push_escape};
use super::symbols::{
    ADV_ARG_EQ, ARRAY_END, ARRAY_SEP, ARRAY_START, CMD_SEP, ESCAPE, TRAITS_START, is_adv_arg_name,
    is_quote, is_trait_key_start, is_whitespace,
};

/// 扫描一个 `#` 段（第一个 `#` 已消费）
///
/// 每解析出一个 trait 就调用 `record`。键名无效时返回 `Literal`，
/// 携带从 `#` 开始到命令段结束的原始文本；此前已记录的 trait 保留。
pub(crate) fn scan_traits(
    cursor: &mut Cursor<'_>,
    mut record: impl FnMut(String, TraitValue),
) -> Result<Scanned<()>, ParseError> {
    let mut segment_mark = cursor.mark();

    loop {
        let Some(ch) = cursor.read() else {
            return Ok(Scanned::Value(()));
        };

        if !is_trait_key_start(ch) {
            // 退回这个字符，让 `||` 能被正确识别为结束符
            cursor.unread();
            return Ok(fallback(cursor, segment_mark));
        }

        let mut key = ch.to_ascii_lowercase().to_string();
        while let Some(next) = cursor.peek() {
            if !is_adv_arg_name(next) {
                break;
            }
            cursor.skip();
            key.push(next.to_ascii_lowercase());
        }

        let value = match cursor.peek() {
            Some(ADV_ARG_EQ) => {
                cursor.skip();
                scan_trait_value(cursor)?
            }
            None | Some(TRAITS_START) => TraitValue::Bool(true),
            Some(c) if is_whitespace(c) => TraitValue::Bool(true),
            Some(CMD_SEP) if at_end_of_cmd(cursor) => TraitValue::Bool(true),
            Some(_) => return Ok(fallback(cursor, segment_mark)),
        };

        record(key, value);

        // 寻找下一个 trait、空白或结束
        loop {
            match cursor.peek() {
                None => return Ok(Scanned::Value(())),
                Some(CMD_SEP) => {
                    cursor.skip();
                    if check_end_of_cmd(cursor, CMD_SEP) {
                        return Ok(Scanned::Value(()));
                    }
                }
                Some(c) if is_whitespace(c) => cursor.skip(),
                Some(TRAITS_START) => {
                    cursor.skip();
                    segment_mark = cursor.mark();
                    break;
                }
                // 交还给顶层调度
                Some(_) => return Ok(Scanned::Value(())),
            }
        }
    }
}

/// 读取到命令段结束，返回 `#` 开始的原始文本
fn fallback(cursor: &mut Cursor<'_>, segment_mark: usize) -> Scanned<()> {
    let consumed = cursor.slice_from(segment_mark).to_string();
    let rest = consume_to_end_of_cmd(cursor);
    let raw = format!("{TRAITS_START}{consumed}{rest}");
    debug!(raw = %raw, "无效的 trait 名称，忽略该段");
    Scanned::Literal(raw)
}

/// 扫描 trait 值（`=` 已消费）
fn scan_trait_value(cursor: &mut Cursor<'_>) -> Result<TraitValue, ParseError> {
    match cursor.peek() {
        Some(q) if is_quote(q) => {
            cursor.skip();
            Ok(TraitValue::String(scan_trait_quoted(cursor, q)?))
        }
        Some(ARRAY_START) => {
            cursor.skip();
            scan_trait_array(cursor)
        }
        _ => {
            let mut value = String::new();
            while let Some(next) = cursor.peek() {
                if is_whitespace(next) || next == TRAITS_START || at_end_of_cmd(cursor) {
                    break;
                }
                cursor.skip();
                if next == ESCAPE {
                    push_escape(cursor, &mut value);
                } else {
                    value.push(next);
                }
            }
            Ok(infer_type(&value))
        }
    }
}

/// 扫描 trait 中的引号字符串（开引号已消费）；不处理表达式
fn scan_trait_quoted(cursor: &mut Cursor<'_>, quote: char) -> Result<String, ParseError> {
    let mut value = String::new();
    loop {
        match cursor.read() {
            None => {
                return Err(ParseError::UnmatchedQuote {
                    offset: cursor.pos(),
                });
            }
            Some(ESCAPE) => push_escape(cursor, &mut value),
            Some(c) if c == quote => return Ok(value),
            Some(c) => value.push(c),
        }
    }
}

/// 扫描数组（`[` 已消费）
fn scan_trait_array(cursor: &mut Cursor<'_>) -> Result<TraitValue, ParseError> {
    let mut elements = Vec::new();
    let unmatched = |cursor: &Cursor<'_>| ParseError::UnmatchedArrayBracket {
        offset: cursor.pos(),
    };

    loop {
        skip_whitespace(cursor);
        match cursor.peek() {
            None => return Err(unmatched(cursor)),
            Some(ARRAY_END) => {
                cursor.skip();
                return Ok(TraitValue::List(elements));
            }
            Some(_) => {}
        }

        elements.push(scan_array_element(cursor)?);

        skip_whitespace(cursor);
        match cursor.peek() {
            Some(ARRAY_END) => {
                cursor.skip();
                return Ok(TraitValue::List(elements));
            }
            Some(ARRAY_SEP) => cursor.skip(),
            _ => return Err(unmatched(cursor)),
        }
    }
}

fn scan_array_element(cursor: &mut Cursor<'_>) -> Result<TraitValue, ParseError> {
    if let Some(q) = cursor.peek().filter(|c| is_quote(*c)) {
        cursor.skip();
        return Ok(TraitValue::String(scan_trait_quoted(cursor, q)?));
    }

    let mut value = String::new();
    while let Some(next) = cursor.peek() {
        if next == ARRAY_SEP || next == ARRAY_END || is_whitespace(next) {
            break;
        }
        cursor.skip();
        if next == ESCAPE {
            push_escape(cursor, &mut value);
        } else {
            value.push(next);
        }
    }
    Ok(infer_type(value.trim()))
}

fn skip_whitespace(cursor: &mut Cursor<'_>) {
    while cursor.peek().is_some_and(is_whitespace) {
        cursor.skip();
    }
}

/// 未加引号的值的类型推断
pub(crate) fn infer_type(value: &str) -> TraitValue {
    match value {
        "true" => TraitValue::Bool(true),
        "false" => TraitValue::Bool(false),
        _ => {
            if let Ok(n) = value.parse::<i64>() {
                TraitValue::Int(n)
            } else if let Some(f) = parse_float(value) {
                TraitValue::Float(f)
            } else {
                TraitValue::String(value.to_string())
            }
        }
    }
}

/// 只接受普通的十进制写法，`inf`/`nan` 之类保持为字符串
fn parse_float(value: &str) -> Option<f64> {
    let looks_numeric = value
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'));
    if !looks_numeric || !value.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    value.parse::<f64>().ok()
}
