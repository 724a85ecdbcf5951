//! # Error 模块
//!
//! 定义 zapscript 中使用的错误类型。
//!
//! 所有解析错误都携带检测到错误时的字符偏移（按 Unicode 码点计数），
//! 不携带行号：ZapScript 永远是单行输入。

use thiserror::Error;

use crate::script::expr::ExprError;

/// 解析错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// 脚本为空（既没有命令也没有 traits）
    #[error("位置 {offset}：脚本为空")]
    EmptyScript { offset: usize },

    /// 单独的 `*` 之后输入意外结束
    #[error("位置 {offset}：输入意外结束")]
    UnexpectedEof { offset: usize },

    /// 命令名为空
    #[error("位置 {offset}：命令名为空")]
    EmptyCommandName { offset: usize },

    /// 引号未闭合
    #[error("位置 {offset}：引号未闭合")]
    UnmatchedQuote { offset: usize },

    /// 无效的 JSON 参数
    #[error("位置 {offset}：无效的 JSON 参数")]
    InvalidJson { offset: usize },

    /// 表达式 `[[` 未闭合
    #[error("位置 {offset}：表达式未闭合")]
    UnmatchedExpression { offset: usize },

    /// 输入宏扩展 `{` 未闭合
    #[error("位置 {offset}：输入宏扩展未闭合")]
    UnmatchedInputMacroExt { offset: usize },

    /// trait 数组 `[` 未闭合
    #[error("位置 {offset}：trait 数组括号未闭合")]
    UnmatchedArrayBracket { offset: usize },

    /// 无效的 trait 名称（且脚本没有其他内容）
    #[error("位置 {offset}：无效的 trait 名称 '{key}'")]
    InvalidTraitKey { offset: usize, key: String },

    /// 输入不是合法的 UTF-8
    #[error("位置 {offset}：无效的 UTF-8 字节序列")]
    InvalidUtf8 { offset: usize },
}

impl ParseError {
    /// 检测到错误时的字符偏移
    pub fn offset(&self) -> usize {
        match self {
            Self::EmptyScript { offset }
            | Self::UnexpectedEof { offset }
            | Self::EmptyCommandName { offset }
            | Self::UnmatchedQuote { offset }
            | Self::InvalidJson { offset }
            | Self::UnmatchedExpression { offset }
            | Self::UnmatchedInputMacroExt { offset }
            | Self::UnmatchedArrayBracket { offset }
            | Self::InvalidTraitKey { offset, .. }
            | Self::InvalidUtf8 { offset } => *offset,
        }
    }
}

/// 表达式求值错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// 表达式返回了不支持的类型
    #[error("表达式 '{expression}' 的返回类型不受支持: {kind}")]
    BadReturnType { expression: String, kind: String },

    /// 表达式引擎求值失败
    #[error("表达式 '{expression}' 求值失败: {source}")]
    Expression {
        expression: String,
        #[source]
        source: ExprError,
    },

    /// 表达式标记未闭合
    #[error("位置 {offset}：表达式标记未闭合")]
    UnmatchedExpression { offset: usize },
}

/// zapscript 统一错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ZapError {
    /// 解析错误
    #[error("解析错误: {0}")]
    Parse(#[from] ParseError),

    /// 求值错误
    #[error("求值错误: {0}")]
    Eval(#[from] EvalError),
}

/// Result 类型别名
pub type ZapResult<T> = Result<T, ZapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_accessor() {
        assert_eq!(ParseError::UnmatchedQuote { offset: 7 }.offset(), 7);
        assert_eq!(
            ParseError::InvalidTraitKey {
                offset: 1,
                key: "#1".to_string()
            }
            .offset(),
            1
        );
    }

    #[test]
    fn test_error_display_contains_offset() {
        let err = ParseError::InvalidJson { offset: 12 };
        assert!(err.to_string().contains("12"));

        let err = EvalError::BadReturnType {
            expression: "device".to_string(),
            kind: "map".to_string(),
        };
        assert!(err.to_string().contains("device"));
        assert!(err.to_string().contains("map"));
    }

    #[test]
    fn test_zap_error_from() {
        let err: ZapError = ParseError::EmptyScript { offset: 0 }.into();
        assert!(matches!(err, ZapError::Parse(ParseError::EmptyScript { .. })));

        let err: ZapError = EvalError::UnmatchedExpression { offset: 3 }.into();
        assert!(matches!(err, ZapError::Eval(_)));
    }
}
