//! # Parser 模块
//!
//! 单遍扫描的 ZapScript 解析器（手写状态机，一个字符的回看）。
//!
//! ## 架构
//!
//! ```text
//! 原始文本 → Cursor → [调度: 按段首字符选择扫描器] → Command / traits → Script
//! ```
//!
//! ## 设计原则
//!
//! - 解析器只产生数据，从不执行命令
//! - 语法不成立时静默回退为普通文本（`Scanned::Literal`），
//!   只有确定的结构错误才返回 [`ParseError`]
//! - 表达式在解析时只做标记化，求值留给之后的 [`Parser::eval_expressions`]
//!
//! ## 模块结构
//!
//! - `cursor`: 字符游标
//! - `symbols`: 语法符号
//! - `helpers`: 转义、引号、JSON、命令结束判断
//! - `expressions`: 表达式标记化与求值
//! - `arguments`: 位置参数、高级参数、输入宏
//! - `media_title`: `@system/title`
//! - `traits`: `#key=value`
//! - `dispatch`: 顶层调度
//! - `expr_parser`: 内置表达式引擎的语法解析

mod arguments;
mod cursor;
mod dispatch;
mod expr_parser;
mod expressions;
mod helpers;
mod media_title;
mod symbols;
mod traits;


use crate::error::{EvalError, ParseError};
use crate::script::ast::Script;
use crate::script::expr::{DefaultEngine, EvalContext, ExprEngine};

use cursor::Cursor;

// 重新导出表达式相关的公共接口
pub use expr_parser::parse_expression;
pub use expressions::{ArgPart, tokenize_parts};
pub use symbols::{EXPR_END, EXPR_START};

/// ZapScript 解析器
///
/// 每个实例只能使用一次：所有操作都按值消费 `self`。
#[derive(Debug, Clone)]
pub struct Parser<'a> {
    input: &'a str,
}

impl<'a> Parser<'a> {
    /// 创建解析器
    pub fn new(input: &'a str) -> Self {
        Self { input }
    }

    /// 从字节创建解析器
    ///
    /// 输入不是合法 UTF-8 时返回 [`ParseError::InvalidUtf8`]，
    /// 偏移为第一个非法序列之前的字符数。
    pub fn from_bytes(bytes: &'a [u8]) -> Result<Self, ParseError> {
        match std::str::from_utf8(bytes) {
            Ok(input) => Ok(Self::new(input)),
            Err(err) => {
                let valid = &bytes[..err.valid_up_to()];
                let offset = std::str::from_utf8(valid).map_or(0, |s| s.chars().count());
                Err(ParseError::InvalidUtf8 { offset })
            }
        }
    }

    /// 解析完整脚本
    ///
    /// # 返回
    ///
    /// 命令列表与合并后的 traits；既没有命令也没有 traits 时返回错误。
    pub fn parse_script(self) -> Result<Script, ParseError> {
        dispatch::parse_script(&mut Cursor::new(self.input))
    }

    /// 只处理转义和 `[[...]]` 表达式，不应用其他任何语法
    ///
    /// 用于独立的模板文本。
    pub fn parse_expressions(self) -> Result<String, ParseError> {
        expressions::scan_template(&mut Cursor::new(self.input))
    }

    /// 用内置引擎对已标记化文本中的表达式求值
    pub fn eval_expressions(self, ctx: &impl EvalContext) -> Result<String, EvalError> {
        self.eval_expressions_with(&DefaultEngine, ctx)
    }

    /// 用指定引擎对已标记化文本中的表达式求值
    pub fn eval_expressions_with(
        self,
        engine: &impl ExprEngine,
        ctx: &dyn EvalContext,
    ) -> Result<String, EvalError> {
        expressions::eval_parts(self.input, engine, ctx)
    }
}
