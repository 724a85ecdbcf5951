//! 语法符号表

pub(crate) const CMD_START: char = '*';
pub(crate) const CMD_SEP: char = '|';
pub(crate) const ESCAPE: char = '^';
pub(crate) const ARG_START: char = ':';
pub(crate) const ARG_SEP: char = ',';
pub(crate) const DOUBLE_QUOTE: char = '"';
pub(crate) const SINGLE_QUOTE: char = '\'';
pub(crate) const ADV_ARG_START: char = '?';
pub(crate) const ADV_ARG_SEP: char = '&';
pub(crate) const ADV_ARG_EQ: char = '=';
pub(crate) const JSON_START: char = '{';
pub(crate) const JSON_END: char = '}';
pub(crate) const JSON_ESCAPE: char = '\\';
pub(crate) const JSON_STRING: char = '"';
pub(crate) const INPUT_MACRO_ESCAPE: char = '\\';
pub(crate) const INPUT_MACRO_EXT_START: char = '{';
pub(crate) const INPUT_MACRO_EXT_END: char = '}';
pub(crate) const EXPR_OPEN: char = '[';
pub(crate) const EXPR_CLOSE: char = ']';
pub(crate) const MEDIA_TITLE_START: char = '@';
pub(crate) const MEDIA_TITLE_SEP: char = '/';
pub(crate) const TRAITS_START: char = '#';
pub(crate) const ARRAY_START: char = '[';
pub(crate) const ARRAY_END: char = ']';
pub(crate) const ARRAY_SEP: char = ',';

/// 表达式开始标记（私有区码点，不会出现在正常输入中）
pub const EXPR_START: char = '\u{E000}';
/// 表达式结束标记
pub const EXPR_END: char = '\u{E001}';

pub(crate) fn is_cmd_name(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '.'
}

pub(crate) fn is_adv_arg_name(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

pub(crate) fn is_trait_key_start(ch: char) -> bool {
    ch.is_ascii_alphabetic()
}

pub(crate) fn is_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\r')
}

pub(crate) fn is_quote(ch: char) -> bool {
    ch == DOUBLE_QUOTE || ch == SINGLE_QUOTE
}
