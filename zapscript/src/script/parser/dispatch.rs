//! # 顶层调度
//!
//! 在每个命令段的开头根据第一个有效字符选择扫描器：
//!
//! | 字符 | 扫描器 |
//! |------|--------|
//! | `@`  | 媒体标题 |
//! | `#`  | traits 简写 |
//! | `**` | 命令 |
//! | 其他 | 自动启动 |
//!
//! 所有段的结果累积到同一个 [`Script`]。

use tracing::{debug, trace};

use crate::command::{CMD_LAUNCH, CMD_LAUNCH_TITLE, CMD_TRAITS, Command, is_input_macro_cmd};
use crate::error::ParseError;
use crate::script::ast::{Script, TraitValue};

use super::arguments::{ArgStyle, ScannedArgs, scan_args, scan_input_macro_args};
use super::cursor::Cursor;
use super::helpers::{Scanned, check_end_of_cmd};
use super::media_title::scan_media_title;
use super::symbols::{
    ADV_ARG_START, ARG_START, CMD_SEP, CMD_START, JSON_START, MEDIA_TITLE_START, TRAITS_START,
    is_cmd_name, is_whitespace,
};
use super::traits::scan_traits;

/// 解析整个脚本
pub(crate) fn parse_script(cursor: &mut Cursor<'_>) -> Result<Script, ParseError> {
    ScriptBuilder::default().run(cursor)
}

/// 跨命令段的累积状态
#[derive(Default)]
struct ScriptBuilder {
    script: Script,
    /// 是否有 trait 写入（简写或完整 JSON 形式）
    traits_seen: bool,
    /// 第一个被忽略的无效 trait 段：(偏移, 原始文本)
    invalid_trait: Option<(usize, String)>,
}

impl ScriptBuilder {
    fn run(mut self, cursor: &mut Cursor<'_>) -> Result<Script, ParseError> {
        loop {
            let before = cursor.prev();
            let Some(ch) = cursor.read() else {
                break;
            };

            if is_whitespace(ch) {
                continue;
            }

            // 结束符之后多余的 `|` 和只有 `||` 的空段被跳过；
            // 后面跟内容的单个 `|` 是普通内容
            if ch == CMD_SEP
                && (before == Some(CMD_SEP) || matches!(cursor.peek(), None | Some(CMD_SEP)))
            {
                continue;
            }

            match ch {
                // 保留给将来的整段 JSON 脚本
                JSON_START if cursor.pos() == 1 => {
                    return Err(ParseError::InvalidJson { offset: 1 });
                }
                MEDIA_TITLE_START => self.media_title(cursor)?,
                TRAITS_START => self.traits(cursor)?,
                CMD_START => match cursor.peek() {
                    None => {
                        return Err(ParseError::UnexpectedEof {
                            offset: cursor.pos(),
                        });
                    }
                    Some(CMD_START) => {
                        cursor.skip();
                        self.command(cursor)?;
                    }
                    Some(_) => self.auto_launch(cursor, "*")?,
                },
                _ => {
                    cursor.unread();
                    self.auto_launch(cursor, "")?;
                }
            }
        }

        self.finish(cursor.pos())
    }

    fn finish(self, end: usize) -> Result<Script, ParseError> {
        if self.script.cmds.is_empty() && !self.traits_seen {
            if let Some((offset, key)) = self.invalid_trait {
                return Err(ParseError::InvalidTraitKey { offset, key });
            }
            return Err(ParseError::EmptyScript { offset: end });
        }
        Ok(self.script)
    }

    /// `**` 之后：命令名与参数
    fn command(&mut self, cursor: &mut Cursor<'_>) -> Result<(), ParseError> {
        let mark = cursor.mark();
        let mut name = String::new();

        while let Some(ch) = cursor.read() {
            if check_end_of_cmd(cursor, ch) {
                break;
            }

            if is_cmd_name(ch) {
                name.push(ch);
                continue;
            }

            if ch == ARG_START || ch == ADV_ARG_START {
                if name.is_empty() {
                    break;
                }
                let only_adv_args = ch == ADV_ARG_START;
                if only_adv_args {
                    // 交给参数扫描器处理 `?`
                    cursor.unread();
                }
                name.make_ascii_lowercase();
                return self.command_body(cursor, name, only_adv_args);
            }

            let prefix = format!("{CMD_START}{CMD_START}{}", cursor.slice_from(mark));
            debug!(prefix = %prefix, invalid = %ch, "无效的命令名，按自动启动处理");
            return self.auto_launch(cursor, &prefix);
        }

        if name.is_empty() {
            return Err(ParseError::EmptyCommandName {
                offset: cursor.pos(),
            });
        }

        name.make_ascii_lowercase();
        if name == CMD_TRAITS {
            return Err(ParseError::InvalidJson {
                offset: cursor.pos(),
            });
        }

        trace!(name = %name, "无参数命令");
        self.script.cmds.push(Command::new(name));
        Ok(())
    }

    fn command_body(
        &mut self,
        cursor: &mut Cursor<'_>,
        name: String,
        only_adv_args: bool,
    ) -> Result<(), ParseError> {
        let ScannedArgs { args, adv_args } = if is_input_macro_cmd(&name) {
            scan_input_macro_args(cursor)?
        } else if name == CMD_TRAITS {
            scan_args(cursor, "", only_adv_args, ArgStyle::Single)?
        } else {
            scan_args(cursor, "", only_adv_args, ArgStyle::Positional)?
        };

        // traits 不是命令，其后的高级参数被丢弃
        if name == CMD_TRAITS {
            return self.merge_json_traits(cursor, args.first().map(String::as_str));
        }

        trace!(name = %name, args = args.len(), "命令");
        self.script.cmds.push(Command {
            name,
            args,
            adv_args,
        });
        Ok(())
    }

    /// `**traits:{...}`：合并到脚本 traits，不记录为命令
    fn merge_json_traits(
        &mut self,
        cursor: &Cursor<'_>,
        arg: Option<&str>,
    ) -> Result<(), ParseError> {
        let invalid = || ParseError::InvalidJson {
            offset: cursor.pos(),
        };

        let value: serde_json::Value =
            serde_json::from_str(arg.ok_or_else(invalid)?).map_err(|_| invalid())?;
        let serde_json::Value::Object(map) = value else {
            return Err(invalid());
        };

        for (key, value) in map {
            self.script.traits.insert(key, TraitValue::from(value));
        }
        self.traits_seen = true;
        Ok(())
    }

    /// `@` 之后：媒体标题，无效时回退为自动启动
    fn media_title(&mut self, cursor: &mut Cursor<'_>) -> Result<(), ParseError> {
        let title = scan_media_title(cursor)?;

        let cmd = if title.is_valid() {
            trace!(content = %title.content, "媒体标题");
            Command {
                name: CMD_LAUNCH_TITLE.to_string(),
                args: vec![title.content],
                adv_args: title.adv_args,
            }
        } else {
            debug!(content = %title.content, "无效的媒体标题，按自动启动处理");
            Command {
                name: CMD_LAUNCH.to_string(),
                args: vec![format!("{MEDIA_TITLE_START}{}", title.content)],
                adv_args: title.adv_args,
            }
        };

        self.script.cmds.push(cmd);
        Ok(())
    }

    /// `#` 之后：traits 简写，无效段被忽略
    fn traits(&mut self, cursor: &mut Cursor<'_>) -> Result<(), ParseError> {
        let offset = cursor.pos();
        let traits = &mut self.script.traits;
        let seen = &mut self.traits_seen;

        let scanned = scan_traits(cursor, |key, value| {
            traits.insert(key, value);
            *seen = true;
        })?;

        if let Scanned::Literal(raw) = scanned {
            self.invalid_trait.get_or_insert((offset, raw));
        }
        Ok(())
    }

    /// 自动启动：剩余内容作为 `launch` 的唯一参数
    fn auto_launch(&mut self, cursor: &mut Cursor<'_>, prefix: &str) -> Result<(), ParseError> {
        let ScannedArgs { args, adv_args } =
            scan_args(cursor, prefix, false, ArgStyle::AutoLaunch)?;

        trace!(args = ?args, "自动启动");
        self.script.cmds.push(Command {
            name: CMD_LAUNCH.to_string(),
            args,
            adv_args,
        });
        Ok(())
    }
}
