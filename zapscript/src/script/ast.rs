//! # AST 模块
//!
//! 解析结果的顶层结构：命令列表加上整个脚本共享的 traits。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::command::Command;

/// 脚本级元数据，键为小写 trait 名
pub type Traits = BTreeMap<String, TraitValue>;

/// trait 值
///
/// 简写语法只会产生 `Bool`/`Int`/`Float`/`String`/`List`，
/// `Null` 和 `Map` 只来自完整 JSON 形式 `**traits:{...}`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TraitValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<TraitValue>),
    Map(BTreeMap<String, TraitValue>),
}

impl TraitValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[TraitValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<serde_json::Value> for TraitValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                Self::Map(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<bool> for TraitValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for TraitValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<f64> for TraitValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for TraitValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for TraitValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

/// 解析后的脚本
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    /// 按出现顺序排列的命令
    pub cmds: Vec<Command>,
    /// 合并后的 traits（后出现的键覆盖先出现的）
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub traits: Traits,
}

impl Script {
    /// 获取指定名称的 trait
    pub fn get_trait(&self, key: &str) -> Option<&TraitValue> {
        self.traits.get(key)
    }

    /// 命令名列表（调试和测试用）
    pub fn command_names(&self) -> Vec<&str> {
        self.cmds.iter().map(|cmd| cmd.name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty() && self.traits.is_empty()
    }
}
