//! # ZapScript
//!
//! 单行 ZapScript 文本的解析库。
//!
//! ## 架构概述
//!
//! `zapscript` 是纯逻辑库，不执行任何命令，也不做 IO。
//! 解析器把一行文本转换为 [`Script`]，由调用方决定如何执行：
//!
//! ```text
//! "**launch.random:snes?tags=region:usa||#arcade"
//!         │
//!         ▼ parse_script()
//! Script { cmds: [Command { name: "launch.random", .. }], traits: { arcade: true } }
//!         │
//!         ▼ eval_script() / Command::eval_args()
//! 参数中的 [[...]] 表达式被替换为求值结果
//! ```
//!
//! ## 核心类型
//!
//! - [`Script`]：命令列表与 traits
//! - [`Command`]：单条命令（名称、位置参数、高级参数）
//! - [`AdvArgs`]：不可变的高级参数容器
//! - [`Parser`]：单次使用的解析器
//!
//! ## 使用示例
//!
//! ```ignore
//! use zapscript::{ArgExprEnv, eval_script};
//!
//! let env = ArgExprEnv { platform: "mister".into(), ..Default::default() };
//! let script = eval_script("**echo:running on [[platform]]", &env)?;
//! assert_eq!(script.cmds[0].args, vec!["running on mister"]);
//! ```
//!
//! ## 模块结构
//!
//! - [`command`]：Command、AdvArgs、命令名常量
//! - [`script`]：AST、表达式引擎、解析器
//! - [`args`]：类型化高级参数
//! - [`tags`]：标签过滤器
//! - [`env`]：表达式环境
//! - [`error`]：错误类型定义

pub mod args;
pub mod command;
pub mod env;
pub mod error;
pub mod script;
pub mod tags;

// 重导出核心类型
pub use args::{
    ArgsError, GlobalArgs, LaunchArgs, LaunchRandomArgs, LaunchSearchArgs, LaunchTitleArgs,
    MisterScriptArgs, PlaylistArgs,
};
pub use command::{AdvArgs, ArgKey, Command};
pub use env::{ArgExprEnv, CustomLauncherExprEnv};
pub use error::{EvalError, ParseError, ZapError, ZapResult};
pub use script::{
    ArgPart, DefaultEngine, EXPR_END, EXPR_START, EvalContext, ExprEngine, ExprError, ExprValue,
    Parser, Script, TraitValue, Traits, tokenize_parts,
};
pub use tags::{TagError, TagFilter, TagOperator};

/// 解析一行脚本
pub fn parse_script(input: &str) -> Result<Script, ParseError> {
    Parser::new(input).parse_script()
}

/// 解析一行脚本并对所有参数中的表达式求值
///
/// traits 原样保留，只处理命令的位置参数和高级参数值。
pub fn eval_script(input: &str, ctx: &impl EvalContext) -> ZapResult<Script> {
    let script = parse_script(input)?;
    let cmds = script
        .cmds
        .iter()
        .map(|cmd| cmd.eval_args(ctx))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Script {
        cmds,
        traits: script.traits,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_accessible() {
        let _cmd = Command::new("launch");
        let _adv = AdvArgs::default().with(ArgKey::When, "true");
        let _env = ArgExprEnv::default();
        let _parser = Parser::new("**echo");
        let _value = TraitValue::from(true);
    }

    #[test]
    fn test_eval_script() {
        let env = ArgExprEnv {
            platform: "mister".to_string(),
            ..Default::default()
        };
        let script = eval_script("**echo:on [[platform]]?when=[[platform == 'mister']]||#x", &env)
            .unwrap();

        assert_eq!(script.cmds[0].args, vec!["on mister"]);
        assert_eq!(script.cmds[0].adv_args.when(), Some("true"));
        assert_eq!(script.traits.get("x"), Some(&TraitValue::Bool(true)));
    }

    #[test]
    fn test_eval_script_errors() {
        let env = ArgExprEnv::default();
        assert!(matches!(
            eval_script("", &env),
            Err(ZapError::Parse(ParseError::EmptyScript { .. }))
        ));
        assert!(matches!(
            eval_script("**echo:[[missing]]", &env),
            Err(ZapError::Eval(EvalError::Expression { .. }))
        ));
    }
}
