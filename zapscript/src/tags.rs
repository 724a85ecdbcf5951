//! # 标签过滤器
//!
//! 解析 `tags` 高级参数：逗号分隔的 `type:value` 列表，可带运算符前缀。
//!
//! | 前缀 | 运算符 | 含义 |
//! |------|--------|------|
//! | 无 / `+` | AND | 必须带有该标签 |
//! | `-` | NOT | 必须不带该标签 |
//! | `~` | OR | 至少匹配一个 OR 标签 |
//!
//! 示例：`region:usa,-unfinished:demo,~lang:en,~lang:es`

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static COLON_SPACING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*:\s*").expect("colon spacing regex must compile"));

static SPECIAL_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9:,+\-]").expect("special chars regex must compile"));

/// 标签运算符
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TagOperator {
    #[default]
    And,
    Not,
    Or,
}

impl TagOperator {
    fn from_prefix(ch: char) -> Option<Self> {
        match ch {
            '+' => Some(Self::And),
            '-' => Some(Self::Not),
            '~' => Some(Self::Or),
            _ => None,
        }
    }
}

/// 单个标签过滤条件
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TagFilter {
    #[serde(rename = "type")]
    pub tag_type: String,
    pub value: String,
    pub operator: TagOperator,
}

/// 标签解析错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TagError {
    /// 缺少 `:`
    #[error("无效的标签格式 '{tag}'：必须是 'type:value'")]
    MissingSeparator { tag: String },

    /// 规范化后类型或值为空
    #[error("无效的标签 '{tag}'：类型和值规范化后不能为空")]
    EmptyPart { tag: String },
}

/// 规范化标签文本（类型和值分别调用）
///
/// 去除首尾空白，去掉冒号两侧空白，转小写，空格和 `.` 变为 `-`，
/// 最后删除 `a-z 0-9 : , + -` 以外的字符。
pub fn normalize_tag(s: &str) -> String {
    let s = COLON_SPACING.replace_all(s.trim(), ":");
    let s = s.to_lowercase().replace([' ', '.'], "-");
    SPECIAL_CHARS.replace_all(&s, "").into_owned()
}

/// 解析标签过滤器列表
///
/// 结果已规范化并去重（保留首次出现的顺序）；空输入返回空列表。
pub fn parse_tag_filters(raw: &str) -> Result<Vec<TagFilter>, TagError> {
    let mut seen = HashSet::new();
    let mut filters = Vec::new();

    for part in raw.split(',') {
        let trimmed = part.trim();
        if trimmed.is_empty() {
            continue;
        }

        let mut chars = trimmed.chars();
        let (operator, body) = match chars.next().and_then(TagOperator::from_prefix) {
            Some(op) => (op, chars.as_str()),
            None => (TagOperator::And, trimmed),
        };

        let (tag_type, value) = body
            .split_once(':')
            .ok_or_else(|| TagError::MissingSeparator {
                tag: part.to_string(),
            })?;

        let filter = TagFilter {
            tag_type: normalize_tag(tag_type),
            value: normalize_tag(value),
            operator,
        };
        if filter.tag_type.is_empty() || filter.value.is_empty() {
            return Err(TagError::EmptyPart {
                tag: part.to_string(),
            });
        }

        if seen.insert(filter.clone()) {
            filters.push(filter);
        }
    }

    Ok(filters)
}
