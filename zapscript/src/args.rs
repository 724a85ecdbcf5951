//! # 类型化高级参数
//!
//! 在 [`AdvArgs`] 之上为常用命令提供只读的类型化视图。
//!
//! 值为空字符串与未设置等价。`action` 和 `mode` 取值不区分大小写，
//! `tags` 在读取时解析为 [`TagFilter`] 列表。

use thiserror::Error;

use crate::command::{AdvArgs, ArgKey};
use crate::tags::{TagError, TagFilter, parse_tag_filters};

/// 默认动作：启动/播放
pub const ACTION_RUN: &str = "run";
/// 显示详情页而不是启动
pub const ACTION_DETAILS: &str = "details";
/// 播放列表随机顺序
pub const MODE_SHUFFLE: &str = "shuffle";

/// 动作是否为 `details`（不区分大小写）
pub fn is_action_details(action: &str) -> bool {
    action.eq_ignore_ascii_case(ACTION_DETAILS)
}

/// 动作是否为 `run` 或空（不区分大小写）
pub fn is_action_run(action: &str) -> bool {
    action.is_empty() || action.eq_ignore_ascii_case(ACTION_RUN)
}

/// 模式是否为 `shuffle`（不区分大小写）
pub fn is_mode_shuffle(mode: &str) -> bool {
    mode.eq_ignore_ascii_case(MODE_SHUFFLE)
}

/// 类型化参数校验错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgsError {
    #[error("无效的 action '{value}'：必须是 run 或 details")]
    InvalidAction { value: String },

    #[error("无效的 mode '{value}'：必须是 shuffle")]
    InvalidMode { value: String },

    #[error("无效的 tags 参数: {0}")]
    Tags(#[from] TagError),
}

fn text(adv: &AdvArgs, key: ArgKey) -> Option<String> {
    adv.get(key).filter(|v| !v.is_empty()).map(str::to_string)
}

fn action(adv: &AdvArgs) -> Result<Option<String>, ArgsError> {
    match text(adv, ArgKey::Action) {
        Some(value) if !is_action_run(&value) && !is_action_details(&value) => {
            Err(ArgsError::InvalidAction { value })
        }
        other => Ok(other),
    }
}

fn tags(adv: &AdvArgs) -> Result<Vec<TagFilter>, ArgsError> {
    match adv.get(ArgKey::Tags) {
        Some(raw) => Ok(parse_tag_filters(raw)?),
        None => Ok(Vec::new()),
    }
}

/// 所有命令共用的参数
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalArgs {
    /// 条件执行：非空且为假值时跳过命令
    pub when: Option<String>,
}

impl GlobalArgs {
    pub fn from_adv_args(adv: &AdvArgs) -> Result<Self, ArgsError> {
        Ok(Self {
            when: text(adv, ArgKey::When),
        })
    }
}

/// `launch` 命令参数
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchArgs {
    pub global: GlobalArgs,
    /// 覆盖默认启动器 ID
    pub launcher: Option<String>,
    /// 路径解析使用的目标系统
    pub system: Option<String>,
    pub action: Option<String>,
    /// 远程文件安装时使用的文件名
    pub name: Option<String>,
    /// 远程下载前显示的提示
    pub pre_notice: Option<String>,
}

impl LaunchArgs {
    pub fn from_adv_args(adv: &AdvArgs) -> Result<Self, ArgsError> {
        Ok(Self {
            global: GlobalArgs::from_adv_args(adv)?,
            launcher: text(adv, ArgKey::Launcher),
            system: text(adv, ArgKey::System),
            action: action(adv)?,
            name: text(adv, ArgKey::Name),
            pre_notice: text(adv, ArgKey::PreNotice),
        })
    }

    pub fn is_details(&self) -> bool {
        self.action.as_deref().is_some_and(is_action_details)
    }
}

/// `launch.random` 命令参数
///
/// `launch.search` 与 `launch.title` 接受相同的参数。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchRandomArgs {
    pub global: GlobalArgs,
    pub launcher: Option<String>,
    pub action: Option<String>,
    /// 按标签过滤结果
    pub tags: Vec<TagFilter>,
}

impl LaunchRandomArgs {
    pub fn from_adv_args(adv: &AdvArgs) -> Result<Self, ArgsError> {
        Ok(Self {
            global: GlobalArgs::from_adv_args(adv)?,
            launcher: text(adv, ArgKey::Launcher),
            action: action(adv)?,
            tags: tags(adv)?,
        })
    }

    pub fn is_details(&self) -> bool {
        self.action.as_deref().is_some_and(is_action_details)
    }
}

/// `launch.search` 命令参数
pub type LaunchSearchArgs = LaunchRandomArgs;
/// `launch.title` 命令参数
pub type LaunchTitleArgs = LaunchRandomArgs;

/// 播放列表命令参数
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaylistArgs {
    pub global: GlobalArgs,
    pub mode: Option<String>,
}

impl PlaylistArgs {
    pub fn from_adv_args(adv: &AdvArgs) -> Result<Self, ArgsError> {
        let mode = match text(adv, ArgKey::Mode) {
            Some(value) if !is_mode_shuffle(&value) => {
                return Err(ArgsError::InvalidMode { value });
            }
            other => other,
        };

        Ok(Self {
            global: GlobalArgs::from_adv_args(adv)?,
            mode,
        })
    }

    pub fn is_shuffle(&self) -> bool {
        self.mode.as_deref().is_some_and(is_mode_shuffle)
    }
}

/// MiSTer 脚本命令参数
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MisterScriptArgs {
    pub global: GlobalArgs,
    /// 是否隐藏脚本窗口（原样保留）
    pub hidden: Option<String>,
}

impl MisterScriptArgs {
    pub fn from_adv_args(adv: &AdvArgs) -> Result<Self, ArgsError> {
        Ok(Self {
            global: GlobalArgs::from_adv_args(adv)?,
            hidden: text(adv, ArgKey::Hidden),
        })
    }
}
