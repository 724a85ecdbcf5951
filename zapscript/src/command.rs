//! # Command 模块
//!
//! 定义解析器输出的命令结构。
//!
//! ## 设计原则
//!
//! - **纯数据**：Command 只描述"做什么"，解析器从不执行命令
//! - **不可变**：`AdvArgs` 只能通过 [`AdvArgs::with`] 派生新值，从不原地修改
//! - **可序列化**：所有类型都可 JSON 往返，`AdvArgs` 区分"不存在"与"空"

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::EvalError;
use crate::script::expr::{DefaultEngine, EvalContext};
use crate::script::parser::Parser;

/// 自动启动命令（无法识别的输入）
pub const CMD_LAUNCH: &str = "launch";
/// 按媒体标题启动（`@system/title` 语法）
pub const CMD_LAUNCH_TITLE: &str = "launch.title";
/// 完整 JSON traits 语法使用的保留命令名
pub const CMD_TRAITS: &str = "traits";
/// 键盘输入宏
pub const CMD_INPUT_KEYBOARD: &str = "input.keyboard";
/// 手柄输入宏
pub const CMD_INPUT_GAMEPAD: &str = "input.gamepad";

/// 判断命令是否使用输入宏参数模式（逐字符拆分）
pub fn is_input_macro_cmd(name: &str) -> bool {
    matches!(name, CMD_INPUT_KEYBOARD | CMD_INPUT_GAMEPAD)
}

/// 常用的高级参数键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgKey {
    /// 条件执行：非空且为假值时跳过命令
    When,
    /// 覆盖默认启动器
    Launcher,
    /// 目标系统
    System,
    /// 启动动作（run / details）
    Action,
    /// 标签过滤器
    Tags,
    /// 播放列表模式
    Mode,
    /// 远程文件安装时的文件名
    Name,
    /// 远程下载前显示的提示
    PreNotice,
    /// 是否隐藏脚本窗口
    Hidden,
}

impl ArgKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::When => "when",
            Self::Launcher => "launcher",
            Self::System => "system",
            Self::Action => "action",
            Self::Tags => "tags",
            Self::Mode => "mode",
            Self::Name => "name",
            Self::PreNotice => "pre_notice",
            Self::Hidden => "hidden",
        }
    }
}

impl AsRef<str> for ArgKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for ArgKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 高级参数（`?key=value&key2=value2`）
///
/// 不透明的只读容器。`AdvArgs::default()` 表示"不存在"，序列化为 `null`；
/// `AdvArgs::new(map)` 表示"存在"，即使为空也序列化为 `{}`。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdvArgs {
    raw: Option<BTreeMap<String, String>>,
}

impl AdvArgs {
    /// 从键值表创建
    pub fn new(map: BTreeMap<String, String>) -> Self {
        Self { raw: Some(map) }
    }

    /// 获取参数值
    pub fn get(&self, key: impl AsRef<str>) -> Option<&str> {
        self.raw
            .as_ref()
            .and_then(|m| m.get(key.as_ref()))
            .map(String::as_str)
    }

    /// 返回设置了 `key` 的新 `AdvArgs`，不修改自身
    #[must_use]
    pub fn with(&self, key: impl AsRef<str>, value: impl Into<String>) -> Self {
        let mut map = self.raw.clone().unwrap_or_default();
        map.insert(key.as_ref().to_string(), value.into());
        Self { raw: Some(map) }
    }

    /// `when` 参数（条件执行）
    pub fn when(&self) -> Option<&str> {
        self.get(ArgKey::When)
    }

    pub fn is_empty(&self) -> bool {
        self.raw.as_ref().is_none_or(BTreeMap::is_empty)
    }

    pub fn len(&self) -> usize {
        self.raw.as_ref().map_or(0, BTreeMap::len)
    }

    /// 按键顺序遍历；提前停止用普通的迭代器适配器即可
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.raw
            .iter()
            .flat_map(|m| m.iter())
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// 底层键值表（不存在时为 `None`）
    pub fn raw(&self) -> Option<&BTreeMap<String, String>> {
        self.raw.as_ref()
    }
}

impl From<BTreeMap<String, String>> for AdvArgs {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self::new(map)
    }
}

/// 解析得到的单条命令
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// 命令名（小写）
    pub name: String,
    /// 位置参数
    ///
    /// - 未使用 `:` 时为空
    /// - 使用了 `:` 但没有内容时为 `[""]`
    #[serde(default)]
    pub args: Vec<String>,
    /// 高级参数
    #[serde(default)]
    pub adv_args: AdvArgs,
}

impl Command {
    /// 创建无参数命令
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// 创建带位置参数的命令
    pub fn with_args(name: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            args,
            adv_args: AdvArgs::default(),
        }
    }

    /// 设置高级参数
    #[must_use]
    pub fn adv(mut self, adv_args: AdvArgs) -> Self {
        self.adv_args = adv_args;
        self
    }

    /// 对所有位置参数和高级参数值中的表达式求值，返回新的命令
    pub fn eval_args(&self, ctx: &impl EvalContext) -> Result<Command, EvalError> {
        let engine = DefaultEngine;

        let args = self
            .args
            .iter()
            .map(|arg| Parser::new(arg).eval_expressions_with(&engine, ctx))
            .collect::<Result<Vec<_>, _>>()?;

        let adv_args = match self.adv_args.raw() {
            None => AdvArgs::default(),
            Some(raw) => {
                let mut evaluated = BTreeMap::new();
                for (key, value) in raw {
                    let value = Parser::new(value).eval_expressions_with(&engine, ctx)?;
                    evaluated.insert(key.clone(), value);
                }
                AdvArgs::new(evaluated)
            }
        };

        Ok(Command {
            name: self.name.clone(),
            args,
            adv_args,
        })
    }
}
