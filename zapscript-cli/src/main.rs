//! # zapscript
//!
//! ZapScript 命令行工具 - 解析脚本、展开表达式、解析标签过滤器。
//!
//! ## 用法
//!
//! ```bash
//! zapscript parse '**launch.random:snes?tags=region:usa||#arcade'
//! zapscript expr 'hello [[platform]]'
//! zapscript eval 'running on [[platform]]' --config zapscript.json
//! zapscript tags 'region:usa,-lang:ja'
//! zapscript parse --script-file token.txt --pretty
//! ```

mod config;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, bail};
use clap::{Parser as ClapParser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};
use zapscript::{EXPR_END, EXPR_START, EvalContext, Parser, Script, TagFilter, tags};

use config::CliConfig;

#[derive(ClapParser)]
#[command(name = "zapscript")]
#[command(about = "ZapScript 命令行工具 - 解析脚本、展开表达式、解析标签过滤器")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 从文件读取输入（替代位置参数）
    #[arg(short = 'f', long, global = true)]
    script_file: Option<PathBuf>,

    /// 美化 JSON 输出
    #[arg(short, long, global = true)]
    pretty: bool,

    /// 配置文件路径（默认：zapscript.json，不存在时忽略）
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// 日志详细程度（-v info，-vv debug，-vvv trace）
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// 解析脚本并输出 JSON
    Parse {
        /// 脚本文本
        script: Option<String>,
    },

    /// 标记表达式，标记以 [[...]] 显示
    Expr {
        /// 含表达式的文本
        text: Option<String>,
    },

    /// 在配置的环境中对表达式求值
    Eval {
        /// 含表达式的文本
        text: Option<String>,
    },

    /// 解析标签过滤器并输出 JSON
    Tags {
        /// 过滤器文本，如 region:usa,-lang:ja
        filter: Option<String>,
    },
}

/// 输入来源：位置参数或 `--script-file`
enum Input {
    Text(String),
    File(Vec<u8>),
}

impl Input {
    fn resolve(text: Option<String>, file: Option<&Path>) -> anyhow::Result<Self> {
        match (text, file) {
            (Some(_), Some(_)) => bail!("位置参数与 --script-file 不能同时使用"),
            (Some(text), None) => Ok(Self::Text(text)),
            (None, Some(path)) => {
                let mut bytes =
                    fs::read(path).with_context(|| format!("读取失败: {}", path.display()))?;
                // 单行格式，去掉文件末尾的换行
                while matches!(bytes.last(), Some(b'\n' | b'\r')) {
                    bytes.pop();
                }
                Ok(Self::File(bytes))
            }
            (None, None) => bail!("缺少输入：请提供文本参数或 --script-file"),
        }
    }

    fn into_string(self) -> anyhow::Result<String> {
        match self {
            Self::Text(text) => Ok(text),
            Self::File(bytes) => String::from_utf8(bytes).context("输入不是有效的 UTF-8"),
        }
    }
}

fn to_json(value: &impl Serialize, pretty: bool) -> anyhow::Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

fn run_parse(input: Input) -> anyhow::Result<Script> {
    let script = match &input {
        Input::Text(text) => Parser::new(text).parse_script(),
        Input::File(bytes) => Parser::from_bytes(bytes).and_then(Parser::parse_script),
    }
    .context("脚本解析失败")?;

    debug!(cmds = script.cmds.len(), traits = script.traits.len(), "脚本解析完成");
    Ok(script)
}

/// 表达式标记替换为可见的 `[[` `]]`
fn run_expr(text: &str) -> anyhow::Result<String> {
    let tokenized = Parser::new(text)
        .parse_expressions()
        .context("表达式标记失败")?;
    Ok(tokenized
        .replace(EXPR_START, "[[")
        .replace(EXPR_END, "]]"))
}

fn run_eval(text: &str, env: &impl EvalContext) -> anyhow::Result<String> {
    let tokenized = Parser::new(text)
        .parse_expressions()
        .context("表达式标记失败")?;
    let output = Parser::new(&tokenized)
        .eval_expressions(env)
        .context("表达式求值失败")?;
    Ok(output)
}

fn run_tags(filter: &str) -> anyhow::Result<Vec<TagFilter>> {
    tags::parse_tag_filters(filter).context("标签过滤器解析失败")
}

fn real_main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_max_level(config.level_filter(cli.verbose)?)
        .with_writer(std::io::stderr)
        .init();

    let pretty = cli.pretty || config.pretty;
    let file = cli.script_file.as_deref();

    let output = match cli.command {
        Commands::Parse { script } => {
            let script = run_parse(Input::resolve(script, file)?)?;
            to_json(&script, pretty)?
        }
        Commands::Expr { text } => run_expr(&Input::resolve(text, file)?.into_string()?)?,
        Commands::Eval { text } => {
            info!(platform = %config.env.platform, "使用配置的表达式环境");
            run_eval(&Input::resolve(text, file)?.into_string()?, &config.env)?
        }
        Commands::Tags { filter } => {
            let filters = run_tags(&Input::resolve(filter, file)?.into_string()?)?;
            to_json(&filters, pretty)?
        }
    };

    println!("{output}");
    Ok(())
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("zapscript error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}
