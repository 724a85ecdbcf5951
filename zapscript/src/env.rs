//! # 表达式环境
//!
//! 交给表达式引擎的变量集合。所有字段序列化为 snake_case，
//! 嵌套结构在表达式中以成员访问读取，如 `[[device.hostname]]`。

use serde::{Deserialize, Serialize};

use crate::script::expr::{EvalContext, ExprValue};

/// 设备信息
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExprEnvDevice {
    pub hostname: String,
    pub os: String,
    pub arch: String,
}

/// 上一次扫描的令牌
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExprEnvLastScanned {
    pub id: String,
    pub value: String,
    pub data: String,
}

/// 当前正在处理的令牌
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExprEnvScanned {
    pub id: String,
    pub value: String,
    pub data: String,
}

/// 正在运行的媒体
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExprEnvActiveMedia {
    pub launcher_id: String,
    pub system_id: String,
    pub system_name: String,
    pub path: String,
    pub name: String,
}

/// 即将启动的媒体
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExprEnvLaunching {
    pub path: String,
    pub system_id: String,
    pub launcher_id: String,
}

/// 命令参数求值时的环境
///
/// 空的嵌套结构同样会序列化，脚本可以依赖字段始终存在。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArgExprEnv {
    pub active_media: ExprEnvActiveMedia,
    pub device: ExprEnvDevice,
    pub last_scanned: ExprEnvLastScanned,
    pub scanned: ExprEnvScanned,
    pub launching: ExprEnvLaunching,
    pub platform: String,
    pub version: String,
    pub scan_mode: String,
    pub media_playing: bool,
}

/// 自定义启动器命令求值时的环境
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomLauncherExprEnv {
    pub platform: String,
    pub version: String,
    pub device: ExprEnvDevice,
    pub media_path: String,
    pub action: String,
    pub install_dir: String,
    pub server_url: String,
    pub system_id: String,
    pub launcher_id: String,
}

/// 嵌套结构转为引擎的 Map 值
fn to_value(value: &impl Serialize) -> Option<ExprValue> {
    serde_json::to_value(value).ok().map(ExprValue::from)
}

impl EvalContext for ArgExprEnv {
    fn get_var(&self, name: &str) -> Option<ExprValue> {
        match name {
            "active_media" => to_value(&self.active_media),
            "device" => to_value(&self.device),
            "last_scanned" => to_value(&self.last_scanned),
            "scanned" => to_value(&self.scanned),
            "launching" => to_value(&self.launching),
            "platform" => Some(self.platform.as_str().into()),
            "version" => Some(self.version.as_str().into()),
            "scan_mode" => Some(self.scan_mode.as_str().into()),
            "media_playing" => Some(self.media_playing.into()),
            _ => None,
        }
    }
}

impl EvalContext for CustomLauncherExprEnv {
    fn get_var(&self, name: &str) -> Option<ExprValue> {
        match name {
            "device" => to_value(&self.device),
            "platform" => Some(self.platform.as_str().into()),
            "version" => Some(self.version.as_str().into()),
            "media_path" => Some(self.media_path.as_str().into()),
            "action" => Some(self.action.as_str().into()),
            "install_dir" => Some(self.install_dir.as_str().into()),
            "server_url" => Some(self.server_url.as_str().into()),
            "system_id" => Some(self.system_id.as_str().into()),
            "launcher_id" => Some(self.launcher_id.as_str().into()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvalError;
    use crate::script::parser::Parser;

    fn test_env() -> ArgExprEnv {
        ArgExprEnv {
            platform: "mister".to_string(),
            version: "1.2.3".to_string(),
            media_playing: true,
            scan_mode: "tap".to_string(),
            device: ExprEnvDevice {
                hostname: "test-device".to_string(),
                os: "linux".to_string(),
                arch: "arm".to_string(),
            },
            ..Default::default()
        }
    }

    fn eval(text: &str, env: &impl EvalContext) -> Result<String, EvalError> {
        let tokenized = Parser::new(text).parse_expressions().unwrap();
        Parser::new(&tokenized).eval_expressions(env)
    }

    #[test]
    fn test_arg_env_variables() {
        let env = test_env();
        assert_eq!(eval("[[platform]]", &env).unwrap(), "mister");
        assert_eq!(eval("v[[version]]", &env).unwrap(), "v1.2.3");
        assert_eq!(eval("[[media_playing]]", &env).unwrap(), "true");
        assert_eq!(eval("[[device.hostname]]", &env).unwrap(), "test-device");
        assert_eq!(eval("[[scan_mode == 'tap']]", &env).unwrap(), "true");
        assert_eq!(eval("[[5+5]]", &env).unwrap(), "10");
        assert_eq!(eval("[[2.5]]", &env).unwrap(), "2.5");
        // 空的嵌套结构依然可访问
        assert_eq!(eval("[[launching.path]]", &env).unwrap(), "");
    }

    #[test]
    fn test_arg_env_struct_result_rejected() {
        let err = eval("[[device]]", &test_env()).unwrap_err();
        assert!(matches!(err, EvalError::BadReturnType { .. }));
    }

    #[test]
    fn test_custom_launcher_env() {
        let env = CustomLauncherExprEnv {
            media_path: "/games/snes/mario.sfc".to_string(),
            install_dir: "/opt/app".to_string(),
            device: ExprEnvDevice {
                os: "linux".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(
            eval("[[install_dir]]/run [[media_path]]", &env).unwrap(),
            "/opt/app/run /games/snes/mario.sfc"
        );
        assert_eq!(eval("[[device.os]]", &env).unwrap(), "linux");
        assert!(eval("[[scan_mode]]", &env).is_err());
    }

    #[test]
    fn test_json_field_names() {
        let env = ArgExprEnv {
            platform: "test".to_string(),
            version: "1.0.0".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(&env).unwrap();
        let keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        assert_eq!(
            keys,
            vec![
                "active_media",
                "device",
                "last_scanned",
                "scanned",
                "launching",
                "platform",
                "version",
                "scan_mode",
                "media_playing",
            ]
        );
        assert_eq!(json["launching"]["system_id"], "");
    }

    #[test]
    fn test_json_round_trip_and_partial() {
        let env = test_env();
        let decoded: ArgExprEnv =
            serde_json::from_str(&serde_json::to_string(&env).unwrap()).unwrap();
        assert_eq!(decoded, env);

        // 缺失字段取默认值
        let partial: ArgExprEnv =
            serde_json::from_str(r#"{"platform":"linux","device":{"os":"linux"}}"#).unwrap();
        assert_eq!(partial.platform, "linux");
        assert_eq!(partial.device.os, "linux");
        assert!(!partial.media_playing);
    }
}
