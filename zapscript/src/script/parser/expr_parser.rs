//! # 表达式解析器
//!
//! 递归下降表达式解析器，把 `[[...]]` 中捕获的源码解析为 [`Expr`]。

use crate::script::expr::{BinaryOp, Expr, ExprError, UnaryOp};

/// 解析表达式字符串
///
/// 优先级从低到高：
/// - 条件: `cond ? a : b`
/// - 逻辑: `||`/`or`，`&&`/`and`，`!`/`not`
/// - 比较: `==`, `!=`, `<`, `<=`, `>`, `>=`
/// - 加减: `+`, `-`
/// - 乘除: `*`, `/`, `%`
/// - 一元: `-`
/// - 后缀: `a.b`, `a[0]`
/// - 基本: 字面量、列表、变量、括号、函数调用
///
/// 嵌套层数超过 `MAX_DEPTH` 时返回语法错误。
pub fn parse_expression(input: &str) -> Result<Expr, ExprError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(syntax("空表达式"));
    }

    let mut parser = ExprParser::new(input);
    let expr = parser.parse_ternary()?;
    parser.skip_whitespace();
    if !parser.remaining().is_empty() {
        return Err(syntax(format!(
            "表达式末尾存在无法解析的内容: '{}'",
            parser.remaining()
        )));
    }
    Ok(expr)
}

/// 表达式嵌套层数上限（括号、一元运算、运算符链都计入）
pub const MAX_DEPTH: usize = 128;

fn syntax(message: impl Into<String>) -> ExprError {
    ExprError::Syntax {
        message: message.into(),
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// 表达式解析器
struct ExprParser<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> ExprParser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            depth: 0,
        }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn consume_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// 跳过空白后尝试消费符号
    fn eat(&mut self, symbol: &str) -> bool {
        self.skip_whitespace();
        if self.remaining().starts_with(symbol) {
            self.pos += symbol.len();
            true
        } else {
            false
        }
    }

    /// 关键字后面必须是标识符边界
    fn starts_with_keyword(&self, keyword: &str) -> bool {
        self.remaining()
            .strip_prefix(keyword)
            .is_some_and(|after| !after.starts_with(is_ident_char))
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        self.skip_whitespace();
        if self.starts_with_keyword(keyword) {
            self.pos += keyword.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, symbol: &str) -> Result<(), ExprError> {
        if self.eat(symbol) {
            Ok(())
        } else {
            Err(syntax(format!("缺少 '{symbol}'")))
        }
    }

    /// 进入一层嵌套
    fn descend(&mut self) -> Result<(), ExprError> {
        if self.depth >= MAX_DEPTH {
            return Err(syntax(format!("表达式嵌套超过 {MAX_DEPTH} 层")));
        }
        self.depth += 1;
        Ok(())
    }

    /// 在新的一层嵌套中执行 `f`
    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ExprError>,
    ) -> Result<T, ExprError> {
        self.descend()?;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// 解析条件表达式（最低优先级）
    fn parse_ternary(&mut self) -> Result<Expr, ExprError> {
        self.nested(|p| {
            let cond = p.parse_or()?;

            if p.eat("?") {
                let then = p.parse_ternary()?;
                p.expect(":")?;
                let otherwise = p.parse_ternary()?;
                return Ok(Expr::ternary(cond, then, otherwise));
            }

            Ok(cond)
        })
    }

    /// 左结合的运算符链：每个新节点都包住之前的结果，按层计入深度
    fn parse_chain(
        &mut self,
        operand: fn(&mut Self) -> Result<Expr, ExprError>,
        operator: fn(&mut Self) -> Option<BinaryOp>,
    ) -> Result<Expr, ExprError> {
        let base = self.depth;
        let mut left = operand(self)?;

        let result = loop {
            let Some(op) = operator(self) else {
                break Ok(left);
            };
            if let Err(err) = self.descend() {
                break Err(err);
            }
            match operand(self) {
                Ok(right) => left = Expr::binary(op, left, right),
                Err(err) => break Err(err),
            }
        };

        self.depth = base;
        result
    }

    /// 解析 or 表达式
    fn parse_or(&mut self) -> Result<Expr, ExprError> {
        self.parse_chain(Self::parse_and, |p| {
            (p.eat("||") || p.eat_keyword("or")).then_some(BinaryOp::Or)
        })
    }

    /// 解析 and 表达式
    fn parse_and(&mut self) -> Result<Expr, ExprError> {
        self.parse_chain(Self::parse_not, |p| {
            (p.eat("&&") || p.eat_keyword("and")).then_some(BinaryOp::And)
        })
    }

    /// 解析 not 表达式
    fn parse_not(&mut self) -> Result<Expr, ExprError> {
        self.skip_whitespace();
        let bang = self.remaining().starts_with('!') && !self.remaining().starts_with("!=");
        if bang {
            self.pos += 1;
        }
        if bang || self.eat_keyword("not") {
            let expr = self.nested(Self::parse_not)?;
            return Ok(Expr::unary(UnaryOp::Not, expr));
        }
        self.parse_comparison()
    }

    /// 解析比较表达式（不可结合）
    fn parse_comparison(&mut self) -> Result<Expr, ExprError> {
        let left = self.parse_additive()?;

        // 双字符运算符必须先于单字符匹配
        const OPS: [(&str, BinaryOp); 6] = [
            ("==", BinaryOp::Eq),
            ("!=", BinaryOp::NotEq),
            ("<=", BinaryOp::LtEq),
            (">=", BinaryOp::GtEq),
            ("<", BinaryOp::Lt),
            (">", BinaryOp::Gt),
        ];

        for (symbol, op) in OPS {
            if self.eat(symbol) {
                let right = self.parse_additive()?;
                return Ok(Expr::binary(op, left, right));
            }
        }

        Ok(left)
    }

    /// 解析加减
    fn parse_additive(&mut self) -> Result<Expr, ExprError> {
        self.parse_chain(Self::parse_multiplicative, |p| {
            if p.eat("+") {
                Some(BinaryOp::Add)
            } else if p.eat("-") {
                Some(BinaryOp::Sub)
            } else {
                None
            }
        })
    }

    /// 解析乘除取余
    fn parse_multiplicative(&mut self) -> Result<Expr, ExprError> {
        self.parse_chain(Self::parse_unary, |p| {
            if p.eat("*") {
                Some(BinaryOp::Mul)
            } else if p.eat("/") {
                Some(BinaryOp::Div)
            } else if p.eat("%") {
                Some(BinaryOp::Rem)
            } else {
                None
            }
        })
    }

    /// 解析一元负号
    fn parse_unary(&mut self) -> Result<Expr, ExprError> {
        if self.eat("-") {
            let expr = self.nested(Self::parse_unary)?;
            return Ok(Expr::unary(UnaryOp::Neg, expr));
        }
        self.parse_postfix()
    }

    /// 解析成员访问和索引
    fn parse_postfix(&mut self) -> Result<Expr, ExprError> {
        let base = self.depth;
        let result = self.parse_postfix_chain();
        self.depth = base;
        result
    }

    fn parse_postfix_chain(&mut self) -> Result<Expr, ExprError> {
        let mut expr = self.parse_primary()?;

        loop {
            if self.eat(".") {
                self.descend()?;
                let name = self.parse_identifier()?;
                expr = Expr::member(expr, name);
            } else if self.eat("[") {
                self.descend()?;
                let index = self.parse_ternary()?;
                self.expect("]")?;
                expr = Expr::index(expr, index);
            } else {
                break;
            }
        }

        Ok(expr)
    }

    /// 解析基本表达式
    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        self.skip_whitespace();

        let c = self
            .peek_char()
            .ok_or_else(|| syntax("表达式意外结束"))?;

        match c {
            // 括号
            '(' => {
                self.consume_char();
                let expr = self.parse_ternary()?;
                self.expect(")")?;
                Ok(expr)
            }

            // 列表字面量
            '[' => {
                self.consume_char();
                let items = self.parse_items("]")?;
                Ok(Expr::list(items))
            }

            // 字符串字面量
            '"' | '\'' => {
                let s = self.parse_string_literal(c)?;
                Ok(Expr::string(s))
            }

            c if c.is_ascii_digit() => self.parse_number(),

            c if is_ident_start(c) => {
                let name = self.parse_identifier()?;
                match name.as_str() {
                    "true" => Ok(Expr::bool(true)),
                    "false" => Ok(Expr::bool(false)),
                    "nil" => Ok(Expr::Literal(crate::script::expr::ExprValue::Nil)),
                    _ => {
                        if self.eat("(") {
                            let args = self.parse_items(")")?;
                            Ok(Expr::Call(name, args))
                        } else {
                            Ok(Expr::var(name))
                        }
                    }
                }
            }

            _ => Err(syntax(format!("无法解析表达式，意外字符: '{c}'"))),
        }
    }

    /// 解析逗号分隔的表达式直到 `close`（开括号已消费）
    ///
    /// 用于函数参数和列表字面量。
    fn parse_items(&mut self, close: &str) -> Result<Vec<Expr>, ExprError> {
        let mut items = Vec::new();
        if self.eat(close) {
            return Ok(items);
        }
        loop {
            items.push(self.parse_ternary()?);
            if self.eat(close) {
                return Ok(items);
            }
            self.expect(",")?;
        }
    }

    /// 解析标识符
    fn parse_identifier(&mut self) -> Result<String, ExprError> {
        self.skip_whitespace();
        let start = self.pos;

        match self.peek_char() {
            Some(c) if is_ident_start(c) => {}
            _ => return Err(syntax("期望标识符")),
        }

        while let Some(c) = self.peek_char() {
            if !is_ident_char(c) {
                break;
            }
            self.pos += c.len_utf8();
        }

        Ok(self.input[start..self.pos].to_string())
    }

    /// 解析字符串字面量，支持 `\` 转义
    fn parse_string_literal(&mut self, quote: char) -> Result<String, ExprError> {
        self.consume_char(); // 消费开始引号
        let mut s = String::new();

        while let Some(c) = self.consume_char() {
            match c {
                c if c == quote => return Ok(s),
                '\\' => match self.consume_char() {
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some('r') => s.push('\r'),
                    Some(other) => s.push(other),
                    None => break,
                },
                c => s.push(c),
            }
        }

        Err(syntax(format!("字符串字面量未闭合，缺少 '{quote}'")))
    }

    /// 解析数字（整数、小数或指数形式）
    fn parse_number(&mut self) -> Result<Expr, ExprError> {
        let start = self.pos;
        self.consume_digits();

        let rest = self.remaining();
        let has_fraction =
            rest.starts_with('.') && rest[1..].starts_with(|c: char| c.is_ascii_digit());
        if has_fraction {
            self.pos += 1;
            self.consume_digits();
        }

        let exponent = self.exponent_len();
        if exponent > 0 {
            self.pos += exponent;
            self.consume_digits();
        }
        let is_float = has_fraction || exponent > 0;

        let num_str = &self.input[start..self.pos];
        if is_float {
            num_str
                .parse::<f64>()
                .map(Expr::float)
                .map_err(|_| syntax(format!("无法解析数字: '{num_str}'")))
        } else {
            num_str
                .parse::<i64>()
                .map(Expr::int)
                .map_err(|_| syntax(format!("整数超出范围: '{num_str}'")))
        }
    }

    /// `e`/`E` 加可选符号的长度，后面必须是数字，否则为 0
    fn exponent_len(&self) -> usize {
        let bytes = self.remaining().as_bytes();
        if !matches!(bytes.first(), Some(b'e' | b'E')) {
            return 0;
        }
        let len = if matches!(bytes.get(1), Some(b'+' | b'-')) { 2 } else { 1 };
        if bytes.get(len).is_some_and(u8::is_ascii_digit) {
            len
        } else {
            0
        }
    }

    fn consume_digits(&mut self) {
        while let Some(c) = self.peek_char() {
            if !c.is_ascii_digit() {
                break;
            }
            self.pos += 1;
        }
    }
}
