//! # 参数扫描
//!
//! - 高级参数：`?key=value&key2=value2`
//! - 位置参数：`:a,b,c`（也用于自动启动和 `traits` 命令的单参数形式）
//! - 输入宏：`input.keyboard` / `input.gamepad` 逐字符拆分

use std::collections::BTreeMap;

use tracing::debug;

use crate::command::AdvArgs;
use crate::error::ParseError;

use super::cursor::Cursor;
use super::expressions::scan_expression;
use super::helpers::{Scanned, check_end_of_cmd, push_escape, scan_json, scan_quoted};
use super::symbols::{
    ADV_ARG_EQ, ADV_ARG_SEP, ADV_ARG_START, ARG_SEP, CMD_SEP, ESCAPE, EXPR_OPEN,
    INPUT_MACRO_ESCAPE, INPUT_MACRO_EXT_END, INPUT_MACRO_EXT_START, JSON_START, is_adv_arg_name,
    is_quote,
};

/// 位置参数的扫描方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArgStyle {
    /// `,` 分隔，参数开头识别引号和 JSON
    Positional,
    /// 单个参数，开头识别引号和 JSON（`traits` 命令）
    Single,
    /// 单个参数，不识别引号和 JSON（自动启动）
    AutoLaunch,
}

impl ArgStyle {
    fn splits_on_comma(self) -> bool {
        self == Self::Positional
    }

    fn value_literals(self) -> bool {
        self != Self::AutoLaunch
    }
}

/// 扫描得到的参数
#[derive(Debug, Default)]
pub(crate) struct ScannedArgs {
    pub(crate) args: Vec<String>,
    pub(crate) adv_args: AdvArgs,
}

/// 只有非空的高级参数表才记录为"存在"
pub(crate) fn adv_args_from(map: BTreeMap<String, String>) -> AdvArgs {
    if map.is_empty() {
        AdvArgs::default()
    } else {
        AdvArgs::new(map)
    }
}

/// 扫描高级参数（`?` 已消费）
///
/// 键名出现非法字符时返回 `Literal`，携带 `?` 之后读到的全部原始文本。
pub(crate) fn scan_adv_args(
    cursor: &mut Cursor<'_>,
) -> Result<Scanned<BTreeMap<String, String>>, ParseError> {
    let mark = cursor.mark();
    let mut args = BTreeMap::new();
    let mut key = String::new();
    let mut value = String::new();
    let mut in_value = false;
    let mut value_start = 0;

    let mut store = |key: &mut String, value: &mut String| {
        if !key.is_empty() {
            args.insert(std::mem::take(key), value.trim().to_string());
        }
        key.clear();
        value.clear();
    };

    while let Some(ch) = cursor.read() {
        if in_value {
            let at_start = cursor.pos() - 1 == value_start;
            if at_start && is_quote(ch) {
                value = scan_quoted(cursor, ch)?;
                continue;
            }
            if at_start && ch == JSON_START {
                value = scan_json(cursor)?;
                continue;
            }
            if ch == ESCAPE {
                push_escape(cursor, &mut value);
                continue;
            }
        }

        if check_end_of_cmd(cursor, ch) {
            break;
        }

        if ch == ADV_ARG_SEP {
            store(&mut key, &mut value);
            in_value = false;
            continue;
        }

        if ch == ADV_ARG_EQ && !in_value {
            value_start = cursor.pos();
            in_value = true;
            continue;
        }

        if in_value {
            if ch == EXPR_OPEN {
                value.push_str(&scan_expression(cursor)?);
            } else {
                value.push(ch);
            }
            continue;
        }

        if !is_adv_arg_name(ch) {
            let raw = cursor.slice_from(mark).to_string();
            debug!(raw = %raw, invalid = %ch, "无效的高级参数名，回退为普通文本");
            return Ok(Scanned::Literal(raw));
        }

        key.push(ch);
    }

    store(&mut key, &mut value);

    Ok(Scanned::Value(args))
}

/// 扫描位置参数
///
/// - `prefix`: 第一个参数的已有内容（自动启动回退时使用）
/// - `only_adv_args`: 命令名后直接是 `?`，此时空的位置参数不记录
pub(crate) fn scan_args(
    cursor: &mut Cursor<'_>,
    prefix: &str,
    only_adv_args: bool,
    style: ArgStyle,
) -> Result<ScannedArgs, ParseError> {
    let mut scanned = ScannedArgs::default();
    let mut current = prefix.to_string();
    let mut arg_start = cursor.pos();

    while let Some(ch) = cursor.read() {
        let at_start = cursor.pos() - 1 == arg_start;
        if at_start && style.value_literals() {
            if is_quote(ch) {
                current = scan_quoted(cursor, ch)?;
                continue;
            }
            if ch == JSON_START {
                current = scan_json(cursor)?;
                continue;
            }
        }

        if ch == ESCAPE {
            push_escape(cursor, &mut current);
            continue;
        }

        if check_end_of_cmd(cursor, ch) {
            break;
        }

        match ch {
            ARG_SEP if style.splits_on_comma() => {
                scanned.args.push(current.trim().to_string());
                current.clear();
                arg_start = cursor.pos();
            }
            ADV_ARG_START => match scan_adv_args(cursor)? {
                Scanned::Value(map) => {
                    // 高级参数总是命令的最后一部分
                    scanned.adv_args = adv_args_from(map);
                    break;
                }
                Scanned::Literal(raw) => {
                    current.push(ADV_ARG_START);
                    current.push_str(&raw);
                }
            },
            EXPR_OPEN => current.push_str(&scan_expression(cursor)?),
            c => current.push(c),
        }
    }

    let current = current.trim();
    if !only_adv_args || !current.is_empty() {
        // 使用了 `:` 的命令至少有一个（可能为空的）参数
        scanned.args.push(current.to_string());
    }

    Ok(scanned)
}

/// 扫描输入宏参数：每个字符一个参数
pub(crate) fn scan_input_macro_args(cursor: &mut Cursor<'_>) -> Result<ScannedArgs, ParseError> {
    let mut scanned = ScannedArgs::default();

    while let Some(ch) = cursor.read() {
        if ch == INPUT_MACRO_ESCAPE {
            match cursor.read() {
                Some(next) => scanned.args.push(next.to_string()),
                None => {
                    scanned.args.push(INPUT_MACRO_ESCAPE.to_string());
                    break;
                }
            }
            continue;
        }

        if check_end_of_cmd(cursor, ch) {
            break;
        }

        match ch {
            INPUT_MACRO_EXT_START => {
                let ext = scan_macro_ext(cursor)?;
                scanned.args.push(ext);
            }
            ADV_ARG_START => match scan_adv_args(cursor)? {
                Scanned::Value(map) => {
                    scanned.adv_args = adv_args_from(map);
                    break;
                }
                Scanned::Literal(raw) => {
                    scanned.args.push(ADV_ARG_START.to_string());
                    scanned.args.extend(raw.chars().map(String::from));
                }
            },
            c => scanned.args.push(c.to_string()),
        }
    }

    Ok(scanned)
}

/// 扫描 `{...}` 扩展宏（`{` 已消费），返回含括号的完整文本
fn scan_macro_ext(cursor: &mut Cursor<'_>) -> Result<String, ParseError> {
    let mut ext = String::from(INPUT_MACRO_EXT_START);

    loop {
        let Some(ch) = cursor.read() else {
            return Err(ParseError::UnmatchedInputMacroExt {
                offset: cursor.pos(),
            });
        };

        // 扩展宏不能跨越命令链
        if ch == CMD_SEP && matches!(cursor.peek(), None | Some(CMD_SEP)) {
            return Err(ParseError::UnmatchedInputMacroExt {
                offset: cursor.pos(),
            });
        }

        ext.push(ch);
        if ch == INPUT_MACRO_EXT_END {
            return Ok(ext);
        }
    }
}
