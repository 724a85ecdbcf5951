//! # 表达式模块
//!
//! 定义 `[[...]]` 占位符使用的内置表达式引擎：AST、值类型与求值器。
//!
//! ## 设计原则
//!
//! - 表达式是**无副作用**的纯函数
//! - 求值是**确定性**的，不依赖 IO 或真实时间
//! - 变量查找通过 [`EvalContext`] 抽象，引擎本身通过 [`ExprEngine`] 可替换
//!
//! ## 支持的类型
//!
//! - `Nil` / `Bool` / `Int` / `Float` / `String`
//! - `List` / `Map`（只能作为中间值，不能作为占位符的最终结果）
//!
//! ## 支持的操作
//!
//! - 算术: `+`, `-`, `*`, `/`, `%`（`/` 总是得到浮点数）
//! - 比较: `==`, `!=`, `<`, `<=`, `>`, `>=`
//! - 逻辑: `&&`/`and`, `||`/`or`, `!`/`not`
//! - 条件: `cond ? a : b`
//! - 成员/索引: `device.hostname`, `list[0]`, `map["key"]`
//! - 列表字面量: `[1, 2]`，数字支持指数形式 `1e20`
//! - 函数: `len`, `upper`, `lower`, `trim`, `string`, `int`, `float`, `contains`

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use thiserror::Error;

use crate::script::parser::parse_expression;

/// 表达式求值得到的值
#[derive(Debug, Clone, PartialEq)]
pub enum ExprValue {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<ExprValue>),
    Map(BTreeMap<String, ExprValue>),
}

impl ExprValue {
    /// 类型名（用于错误信息）
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    /// 转为占位符输出文本
    ///
    /// 只有标量可以输出；`nil`、列表和映射返回 `None`。
    pub fn to_output(&self) -> Option<String> {
        match self {
            Self::String(s) => Some(s.clone()),
            Self::Bool(b) => Some(b.to_string()),
            Self::Int(n) => Some(n.to_string()),
            Self::Float(f) => Some(format_float(*f)),
            Self::Nil | Self::List(_) | Self::Map(_) => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(n) => Some(*n as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }
}

/// 浮点数格式化：不使用科学计数法，去掉多余的零（`4.0` → `4`）
pub fn format_float(value: f64) -> String {
    format!("{value}")
}

impl fmt::Display for ExprValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => f.write_str("nil"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(v) => f.write_str(&format_float(*v)),
            Self::String(s) => f.write_str(s),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Map(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<serde_json::Value> for ExprValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Self::Nil,
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

impl From<&str> for ExprValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for ExprValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for ExprValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for ExprValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<f64> for ExprValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

/// 一元运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

/// 二元运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
}

impl BinaryOp {
    fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::And => "&&",
            Self::Or => "||",
        }
    }
}

/// 表达式 AST 节点
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// 字面量值
    Literal(ExprValue),

    /// 变量引用
    Variable(String),

    /// 成员访问 `a.b`
    Member(Box<Expr>, String),

    /// 索引访问 `a[0]` / `a["k"]`
    Index(Box<Expr>, Box<Expr>),

    /// 一元运算
    Unary(UnaryOp, Box<Expr>),

    /// 二元运算
    Binary(BinaryOp, Box<Expr>, Box<Expr>),

    /// 条件 `cond ? a : b`
    Ternary(Box<Expr>, Box<Expr>, Box<Expr>),

    /// 内置函数调用
    Call(String, Vec<Expr>),

    /// 列表字面量 `[a, b]`
    List(Vec<Expr>),
}

impl Expr {
    /// 创建字符串字面量
    pub fn string(s: impl Into<String>) -> Self {
        Self::Literal(ExprValue::String(s.into()))
    }

    /// 创建布尔字面量
    pub fn bool(b: bool) -> Self {
        Self::Literal(ExprValue::Bool(b))
    }

    /// 创建整数字面量
    pub fn int(n: i64) -> Self {
        Self::Literal(ExprValue::Int(n))
    }

    /// 创建浮点字面量
    pub fn float(f: f64) -> Self {
        Self::Literal(ExprValue::Float(f))
    }

    /// 创建变量引用
    pub fn var(name: impl Into<String>) -> Self {
        Self::Variable(name.into())
    }

    /// 创建成员访问
    pub fn member(object: Expr, name: impl Into<String>) -> Self {
        Self::Member(Box::new(object), name.into())
    }

    /// 创建索引访问
    pub fn index(object: Expr, index: Expr) -> Self {
        Self::Index(Box::new(object), Box::new(index))
    }

    /// 创建一元运算
    pub fn unary(op: UnaryOp, expr: Expr) -> Self {
        Self::Unary(op, Box::new(expr))
    }

    /// 创建二元运算
    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Self::Binary(op, Box::new(left), Box::new(right))
    }

    /// 创建列表字面量
    pub fn list(items: Vec<Expr>) -> Self {
        Self::List(items)
    }

    /// 创建条件表达式
    pub fn ternary(cond: Expr, then: Expr, otherwise: Expr) -> Self {
        Self::Ternary(Box::new(cond), Box::new(then), Box::new(otherwise))
    }
}

/// 表达式引擎错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExprError {
    /// 语法错误
    #[error("语法错误: {message}")]
    Syntax { message: String },

    /// 变量未定义
    #[error("变量 '{name}' 未定义")]
    UndefinedVariable { name: String },

    /// 类型不匹配
    #[error("类型不匹配: 期望 {expected}，实际 {actual} ({context})")]
    TypeMismatch {
        expected: &'static str,
        actual: String,
        context: String,
    },

    /// 除数为零
    #[error("除数为零")]
    DivisionByZero,

    /// 未知函数
    #[error("未知函数 '{name}'")]
    UnknownFunction { name: String },
}

impl ExprError {
    fn mismatch(expected: &'static str, actual: &ExprValue, context: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected,
            actual: actual.kind().to_string(),
            context: context.into(),
        }
    }
}

/// 表达式求值上下文
///
/// 提供顶层变量查找能力
pub trait EvalContext {
    /// 获取变量值
    fn get_var(&self, name: &str) -> Option<ExprValue>;
}

impl EvalContext for serde_json::Value {
    fn get_var(&self, name: &str) -> Option<ExprValue> {
        self.as_object()?.get(name).cloned().map(ExprValue::from)
    }
}

impl EvalContext for serde_json::Map<String, serde_json::Value> {
    fn get_var(&self, name: &str) -> Option<ExprValue> {
        self.get(name).cloned().map(ExprValue::from)
    }
}

impl EvalContext for HashMap<String, ExprValue> {
    fn get_var(&self, name: &str) -> Option<ExprValue> {
        self.get(name).cloned()
    }
}

/// 可替换的表达式引擎
pub trait ExprEngine {
    /// 对表达式源码求值
    fn eval(&self, source: &str, ctx: &dyn EvalContext) -> Result<ExprValue, ExprError>;
}

/// 内置表达式引擎
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultEngine;

impl ExprEngine for DefaultEngine {
    fn eval(&self, source: &str, ctx: &dyn EvalContext) -> Result<ExprValue, ExprError> {
        let expr = parse_expression(source)?;
        evaluate(&expr, ctx)
    }
}

/// 对表达式求值
///
/// # 参数
///
/// - `expr`: 要求值的表达式
/// - `ctx`: 求值上下文（提供变量查找）
pub fn evaluate(expr: &Expr, ctx: &dyn EvalContext) -> Result<ExprValue, ExprError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),

        Expr::Variable(name) => ctx
            .get_var(name)
            .ok_or_else(|| ExprError::UndefinedVariable { name: name.clone() }),

        Expr::Member(object, name) => match evaluate(object, ctx)? {
            ExprValue::Map(mut map) => Ok(map.remove(name).unwrap_or(ExprValue::Nil)),
            other => Err(ExprError::mismatch("map", &other, format!("成员访问 .{name}"))),
        },

        Expr::Index(object, index) => {
            let object = evaluate(object, ctx)?;
            let index = evaluate(index, ctx)?;
            index_value(object, &index)
        }

        Expr::Unary(UnaryOp::Neg, inner) => match evaluate(inner, ctx)? {
            ExprValue::Int(n) => Ok(n
                .checked_neg()
                .map_or(ExprValue::Float(-(n as f64)), ExprValue::Int)),
            ExprValue::Float(f) => Ok(ExprValue::Float(-f)),
            other => Err(ExprError::mismatch("number", &other, "取负")),
        },

        Expr::Unary(UnaryOp::Not, inner) => {
            let value = evaluate(inner, ctx)?;
            Ok(ExprValue::Bool(!to_bool(&value, "not 操作数")?))
        }

        Expr::Binary(BinaryOp::And, left, right) => {
            let left_val = evaluate(left, ctx)?;
            // 短路求值
            if !to_bool(&left_val, "and 左操作数")? {
                return Ok(ExprValue::Bool(false));
            }
            let right_val = evaluate(right, ctx)?;
            Ok(ExprValue::Bool(to_bool(&right_val, "and 右操作数")?))
        }

        Expr::Binary(BinaryOp::Or, left, right) => {
            let left_val = evaluate(left, ctx)?;
            // 短路求值
            if to_bool(&left_val, "or 左操作数")? {
                return Ok(ExprValue::Bool(true));
            }
            let right_val = evaluate(right, ctx)?;
            Ok(ExprValue::Bool(to_bool(&right_val, "or 右操作数")?))
        }

        Expr::Binary(op, left, right) => {
            let left_val = evaluate(left, ctx)?;
            let right_val = evaluate(right, ctx)?;
            binary(*op, left_val, right_val)
        }

        Expr::Ternary(cond, then, otherwise) => {
            let cond_val = evaluate(cond, ctx)?;
            if to_bool(&cond_val, "条件表达式")? {
                evaluate(then, ctx)
            } else {
                evaluate(otherwise, ctx)
            }
        }

        Expr::Call(name, args) => {
            let args = args
                .iter()
                .map(|arg| evaluate(arg, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            call(name, args)
        }

        Expr::List(items) => items
            .iter()
            .map(|item| evaluate(item, ctx))
            .collect::<Result<Vec<_>, _>>()
            .map(ExprValue::List),
    }
}

fn index_value(object: ExprValue, index: &ExprValue) -> Result<ExprValue, ExprError> {
    match (object, index) {
        (ExprValue::List(items), ExprValue::Int(i)) => {
            let len = items.len() as i64;
            let i = if *i < 0 { len + i } else { *i };
            Ok(usize::try_from(i)
                .ok()
                .and_then(|i| items.into_iter().nth(i))
                .unwrap_or(ExprValue::Nil))
        }
        (ExprValue::Map(mut map), ExprValue::String(key)) => {
            Ok(map.remove(key).unwrap_or(ExprValue::Nil))
        }
        (ExprValue::String(s), ExprValue::Int(i)) => Ok(usize::try_from(*i)
            .ok()
            .and_then(|i| s.chars().nth(i))
            .map_or(ExprValue::Nil, |c| ExprValue::String(c.to_string()))),
        (object, index) => Err(ExprError::TypeMismatch {
            expected: "list[int] / map[string] / string[int]",
            actual: format!("{}[{}]", object.kind(), index.kind()),
            context: "索引访问".to_string(),
        }),
    }
}

fn binary(op: BinaryOp, left: ExprValue, right: ExprValue) -> Result<ExprValue, ExprError> {
    use ExprValue::{Float, Int};

    match op {
        BinaryOp::Eq => return Ok(ExprValue::Bool(values_equal(&left, &right))),
        BinaryOp::NotEq => return Ok(ExprValue::Bool(!values_equal(&left, &right))),
        BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
            return compare(op, &left, &right);
        }
        _ => {}
    }

    if let (BinaryOp::Add, ExprValue::String(l), ExprValue::String(r)) = (op, &left, &right) {
        return Ok(ExprValue::String(format!("{l}{r}")));
    }

    let context = || format!("{} 运算", op.symbol());

    match (op, &left, &right) {
        (BinaryOp::Div, _, _) => {
            let l = left
                .as_f64()
                .ok_or_else(|| ExprError::mismatch("number", &left, context()))?;
            let r = right
                .as_f64()
                .ok_or_else(|| ExprError::mismatch("number", &right, context()))?;
            if r == 0.0 {
                return Err(ExprError::DivisionByZero);
            }
            Ok(Float(l / r))
        }
        (BinaryOp::Rem, Int(l), Int(r)) => {
            if *r == 0 {
                return Err(ExprError::DivisionByZero);
            }
            Ok(Int(l.wrapping_rem(*r)))
        }
        (BinaryOp::Rem, _, _) => {
            let culprit = if matches!(left, Int(_)) { &right } else { &left };
            Err(ExprError::mismatch("int", culprit, context()))
        }
        (_, Int(l), Int(r)) => {
            let checked = match op {
                BinaryOp::Add => l.checked_add(*r),
                BinaryOp::Sub => l.checked_sub(*r),
                BinaryOp::Mul => l.checked_mul(*r),
                _ => None,
            };
            // 溢出时退化为浮点运算
            match checked {
                Some(n) => Ok(Int(n)),
                None => float_arith(op, *l as f64, *r as f64),
            }
        }
        _ => {
            let l = left
                .as_f64()
                .ok_or_else(|| ExprError::mismatch("number", &left, context()))?;
            let r = right
                .as_f64()
                .ok_or_else(|| ExprError::mismatch("number", &right, context()))?;
            float_arith(op, l, r)
        }
    }
}

fn float_arith(op: BinaryOp, l: f64, r: f64) -> Result<ExprValue, ExprError> {
    let value = match op {
        BinaryOp::Add => l + r,
        BinaryOp::Sub => l - r,
        BinaryOp::Mul => l * r,
        _ => {
            return Err(ExprError::Syntax {
                message: format!("运算符 {} 不能用于浮点运算", op.symbol()),
            });
        }
    };
    Ok(ExprValue::Float(value))
}

fn compare(op: BinaryOp, left: &ExprValue, right: &ExprValue) -> Result<ExprValue, ExprError> {
    let ordering = match (left, right) {
        (ExprValue::String(l), ExprValue::String(r)) => Some(l.cmp(r)),
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(l), Some(r)) => l.partial_cmp(&r),
            _ => {
                return Err(ExprError::TypeMismatch {
                    expected: "number 或 string",
                    actual: format!("{} {} {}", left.kind(), op.symbol(), right.kind()),
                    context: "比较".to_string(),
                });
            }
        },
    };

    // NaN 参与的比较一律为 false
    let Some(ordering) = ordering else {
        return Ok(ExprValue::Bool(false));
    };

    let result = match op {
        BinaryOp::Lt => ordering.is_lt(),
        BinaryOp::LtEq => ordering.is_le(),
        BinaryOp::Gt => ordering.is_gt(),
        _ => ordering.is_ge(),
    };
    Ok(ExprValue::Bool(result))
}

fn call(name: &str, args: Vec<ExprValue>) -> Result<ExprValue, ExprError> {
    let context = |n: usize| format!("{name}() 的第 {n} 个参数");

    let arity = match name {
        "len" | "upper" | "lower" | "trim" | "string" | "int" | "float" => 1,
        "contains" => 2,
        _ => {
            return Err(ExprError::UnknownFunction {
                name: name.to_string(),
            });
        }
    };
    if args.len() != arity {
        return Err(ExprError::TypeMismatch {
            expected: if arity == 1 { "1 个参数" } else { "2 个参数" },
            actual: format!("{} 个参数", args.len()),
            context: format!("调用 {name}()"),
        });
    }

    let mut args = args.into_iter();
    let first = args.next().unwrap_or(ExprValue::Nil);

    match name {
        "len" => match &first {
            ExprValue::String(s) => Ok(ExprValue::Int(s.chars().count() as i64)),
            ExprValue::List(items) => Ok(ExprValue::Int(items.len() as i64)),
            ExprValue::Map(map) => Ok(ExprValue::Int(map.len() as i64)),
            other => Err(ExprError::mismatch("string / list / map", other, context(1))),
        },
        "upper" | "lower" | "trim" => match &first {
            ExprValue::String(s) => Ok(ExprValue::String(match name {
                "upper" => s.to_uppercase(),
                "lower" => s.to_lowercase(),
                _ => s.trim().to_string(),
            })),
            other => Err(ExprError::mismatch("string", other, context(1))),
        },
        "string" => Ok(ExprValue::String(first.to_string())),
        "int" => match &first {
            ExprValue::Int(n) => Ok(ExprValue::Int(*n)),
            ExprValue::Float(f) => Ok(ExprValue::Int(f.trunc() as i64)),
            ExprValue::Bool(b) => Ok(ExprValue::Int(i64::from(*b))),
            ExprValue::String(s) => {
                s.trim()
                    .parse::<i64>()
                    .map(ExprValue::Int)
                    .map_err(|_| ExprError::TypeMismatch {
                        expected: "整数字符串",
                        actual: format!("'{s}'"),
                        context: context(1),
                    })
            }
            other => Err(ExprError::mismatch("int / float / bool / string", other, context(1))),
        },
        "float" => match &first {
            ExprValue::Int(n) => Ok(ExprValue::Float(*n as f64)),
            ExprValue::Float(f) => Ok(ExprValue::Float(*f)),
            ExprValue::String(s) => {
                s.trim()
                    .parse::<f64>()
                    .map(ExprValue::Float)
                    .map_err(|_| ExprError::TypeMismatch {
                        expected: "数字字符串",
                        actual: format!("'{s}'"),
                        context: context(1),
                    })
            }
            other => Err(ExprError::mismatch("int / float / string", other, context(1))),
        },
        _ => {
            let needle = args.next().unwrap_or(ExprValue::Nil);
            match (&first, &needle) {
                (ExprValue::String(s), ExprValue::String(sub)) => {
                    Ok(ExprValue::Bool(s.contains(sub.as_str())))
                }
                (ExprValue::String(_), other) => {
                    Err(ExprError::mismatch("string", other, context(2)))
                }
                (ExprValue::List(items), _) => Ok(ExprValue::Bool(
                    items.iter().any(|item| values_equal(item, &needle)),
                )),
                (ExprValue::Map(map), ExprValue::String(key)) => {
                    Ok(ExprValue::Bool(map.contains_key(key)))
                }
                (other, _) => Err(ExprError::mismatch("string / list / map", other, context(1))),
            }
        }
    }
}

/// 比较两个值是否相等（整数与浮点数按数值比较）
fn values_equal(left: &ExprValue, right: &ExprValue) -> bool {
    match (left, right) {
        (ExprValue::Int(_), ExprValue::Float(_)) | (ExprValue::Float(_), ExprValue::Int(_)) => {
            left.as_f64() == right.as_f64()
        }
        _ => left == right,
    }
}

/// 将值转换为布尔值
fn to_bool(value: &ExprValue, context: &str) -> Result<bool, ExprError> {
    match value {
        ExprValue::Bool(b) => Ok(*b),
        other => Err(ExprError::mismatch("bool", other, context)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> HashMap<String, ExprValue> {
        let mut device = BTreeMap::new();
        device.insert("hostname".to_string(), ExprValue::from("mister"));
        device.insert("os".to_string(), ExprValue::from("linux"));

        let mut vars = HashMap::new();
        vars.insert("platform".to_string(), ExprValue::from("mister"));
        vars.insert("count".to_string(), ExprValue::Int(3));
        vars.insert("playing".to_string(), ExprValue::Bool(true));
        vars.insert("device".to_string(), ExprValue::Map(device));
        vars.insert(
            "tags".to_string(),
            ExprValue::List(vec![ExprValue::from("rpg"), ExprValue::from("action")]),
        );
        vars
    }

    fn eval(source: &str) -> Result<ExprValue, ExprError> {
        DefaultEngine.eval(source, &ctx())
    }

    #[test]
    fn test_literal_and_variable() {
        assert_eq!(evaluate(&Expr::int(5), &ctx()).unwrap(), ExprValue::Int(5));
        assert_eq!(eval("platform").unwrap(), ExprValue::from("mister"));
        assert_eq!(
            eval("missing"),
            Err(ExprError::UndefinedVariable {
                name: "missing".to_string()
            })
        );
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval("2 + 2").unwrap(), ExprValue::Int(4));
        assert_eq!(eval("2 + 3 * 4").unwrap(), ExprValue::Int(14));
        assert_eq!(eval("(2 + 3) * 4").unwrap(), ExprValue::Int(20));
        assert_eq!(eval("10 - count").unwrap(), ExprValue::Int(7));
        assert_eq!(eval("7 % 3").unwrap(), ExprValue::Int(1));
        assert_eq!(eval("-count").unwrap(), ExprValue::Int(-3));
        assert_eq!(eval("1 + 0.5").unwrap(), ExprValue::Float(1.5));
        assert_eq!(eval("8 / 2").unwrap(), ExprValue::Float(4.0));
        assert_eq!(eval("1 / 0"), Err(ExprError::DivisionByZero));
        assert_eq!(eval("1 % 0"), Err(ExprError::DivisionByZero));
    }

    #[test]
    fn test_int_overflow_becomes_float() {
        let value = eval("9223372036854775807 + 1").unwrap();
        assert!(matches!(value, ExprValue::Float(_)));
    }

    #[test]
    fn test_string_concat() {
        assert_eq!(
            eval("platform + '-' + device.os").unwrap(),
            ExprValue::from("mister-linux")
        );
        assert!(matches!(
            eval("platform + 1"),
            Err(ExprError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_comparison() {
        assert_eq!(eval("count == 3").unwrap(), ExprValue::Bool(true));
        assert_eq!(eval("count == 3.0").unwrap(), ExprValue::Bool(true));
        assert_eq!(eval("count != 3").unwrap(), ExprValue::Bool(false));
        assert_eq!(eval("count < 4").unwrap(), ExprValue::Bool(true));
        assert_eq!(eval("count >= 4").unwrap(), ExprValue::Bool(false));
        assert_eq!(eval("'a' < 'b'").unwrap(), ExprValue::Bool(true));
        assert_eq!(eval("platform == 'mister'").unwrap(), ExprValue::Bool(true));
    }

    #[test]
    fn test_logic_and_short_circuit() {
        assert_eq!(eval("playing && count > 1").unwrap(), ExprValue::Bool(true));
        assert_eq!(eval("not playing").unwrap(), ExprValue::Bool(false));
        assert_eq!(eval("!playing || true").unwrap(), ExprValue::Bool(true));
        // 右侧未定义变量不会被求值
        assert_eq!(eval("false and missing").unwrap(), ExprValue::Bool(false));
        assert_eq!(eval("true or missing").unwrap(), ExprValue::Bool(true));
        assert!(matches!(
            eval("count and true"),
            Err(ExprError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_ternary() {
        assert_eq!(
            eval("playing ? 'yes' : 'no'").unwrap(),
            ExprValue::from("yes")
        );
        assert_eq!(
            eval("count > 5 ? 'big' : count > 2 ? 'mid' : 'small'").unwrap(),
            ExprValue::from("mid")
        );
    }

    #[test]
    fn test_member_and_index() {
        assert_eq!(eval("device.hostname").unwrap(), ExprValue::from("mister"));
        assert_eq!(eval("device[\"os\"]").unwrap(), ExprValue::from("linux"));
        assert_eq!(eval("device.missing").unwrap(), ExprValue::Nil);
        assert_eq!(eval("tags[0]").unwrap(), ExprValue::from("rpg"));
        assert_eq!(eval("tags[-1]").unwrap(), ExprValue::from("action"));
        assert_eq!(eval("tags[9]").unwrap(), ExprValue::Nil);
        assert_eq!(eval("platform[0]").unwrap(), ExprValue::from("m"));
        assert!(matches!(
            eval("platform.name"),
            Err(ExprError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_functions() {
        assert_eq!(eval("len(platform)").unwrap(), ExprValue::Int(6));
        assert_eq!(eval("len(tags)").unwrap(), ExprValue::Int(2));
        assert_eq!(eval("upper(platform)").unwrap(), ExprValue::from("MISTER"));
        assert_eq!(eval("lower('ABC')").unwrap(), ExprValue::from("abc"));
        assert_eq!(eval("trim('  x ')").unwrap(), ExprValue::from("x"));
        assert_eq!(eval("string(count)").unwrap(), ExprValue::from("3"));
        assert_eq!(eval("int('42')").unwrap(), ExprValue::Int(42));
        assert_eq!(eval("int(2.9)").unwrap(), ExprValue::Int(2));
        assert_eq!(eval("float(count)").unwrap(), ExprValue::Float(3.0));
        assert_eq!(eval("contains(platform, 'ist')").unwrap(), ExprValue::Bool(true));
        assert_eq!(eval("contains(tags, 'rpg')").unwrap(), ExprValue::Bool(true));
        assert_eq!(
            eval("nope(1)"),
            Err(ExprError::UnknownFunction {
                name: "nope".to_string()
            })
        );
        assert!(matches!(
            eval("len(1, 2)"),
            Err(ExprError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_to_output() {
        assert_eq!(ExprValue::from("x").to_output(), Some("x".to_string()));
        assert_eq!(ExprValue::Bool(false).to_output(), Some("false".to_string()));
        assert_eq!(ExprValue::Int(-7).to_output(), Some("-7".to_string()));
        assert_eq!(ExprValue::Float(4.0).to_output(), Some("4".to_string()));
        assert_eq!(ExprValue::Float(2.5).to_output(), Some("2.5".to_string()));
        assert_eq!(
            ExprValue::Float(1e21).to_output(),
            Some("1000000000000000000000".to_string())
        );
        assert_eq!(ExprValue::Nil.to_output(), None);
        assert_eq!(ExprValue::List(vec![]).to_output(), None);
        assert_eq!(ExprValue::Map(BTreeMap::new()).to_output(), None);
    }

    #[test]
    fn test_json_context() {
        let env = serde_json::json!({
            "platform": "test",
            "device": { "hostname": "box" },
            "n": 1.5
        });
        assert_eq!(
            DefaultEngine.eval("platform", &env).unwrap(),
            ExprValue::from("test")
        );
        assert_eq!(
            DefaultEngine.eval("device.hostname", &env).unwrap(),
            ExprValue::from("box")
        );
        assert_eq!(
            DefaultEngine.eval("n * 2", &env).unwrap(),
            ExprValue::Float(3.0)
        );
        // 非对象 JSON 没有任何变量
        assert!(serde_json::Value::Null.get_var("platform").is_none());
    }

    #[test]
    fn test_list_literal_and_exponent() {
        assert_eq!(
            eval("[1, 'a', count]").unwrap(),
            ExprValue::List(vec![
                ExprValue::Int(1),
                ExprValue::from("a"),
                ExprValue::Int(3)
            ])
        );
        assert_eq!(eval("[]").unwrap(), ExprValue::List(vec![]));
        assert_eq!(eval("[10, 20][1]").unwrap(), ExprValue::Int(20));
        assert_eq!(eval("len([1, 2, 3])").unwrap(), ExprValue::Int(3));
        assert_eq!(eval("contains(['snes', 'nes'], platform)").unwrap(), ExprValue::Bool(false));

        assert_eq!(eval("1e20").unwrap(), ExprValue::Float(1e20));
        assert_eq!(eval("2.5E-1").unwrap(), ExprValue::Float(0.25));
        assert_eq!(eval("3e+2 + 1").unwrap(), ExprValue::Float(301.0));
    }

    #[test]
    fn test_syntax_error() {
        assert!(matches!(eval("1 +"), Err(ExprError::Syntax { .. })));
        assert!(matches!(eval(""), Err(ExprError::Syntax { .. })));
        assert!(matches!(eval("(1"), Err(ExprError::Syntax { .. })));
    }
}
