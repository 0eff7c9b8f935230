// SPDX-License-Identifier: GPL-3.0-only

//! Selection condition expressions
//!
//! A small, explicitly-scoped predicate language over a fixed disk
//! property schema. Supported: identifiers from the schema below,
//! string/integer/boolean literals (integers take an optional KB /
//! MB / GB / TB binary suffix), comparisons (`==`, `!=`, `<`, `<=`,
//! `>`, `>=`), logical `&&`, `||`, `!` and parentheses.
//!
//! Expressions are compiled once per step. Unknown identifiers and
//! type mismatches are compile/eval errors, never a silent match or
//! non-match — an expression that cannot be evaluated fails its step.

use std::fmt;

use deploy_types::DiskInfo;

/// Disk property schema visible to expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    BusType,
    Size,
    SectorSize,
    FriendlyName,
    PartitionStyle,
    PartitionCount,
    IsReadOnly,
    IsOffline,
    IsUninitialised,
}

const SCHEMA: &[(&str, Field)] = &[
    ("BusType", Field::BusType),
    ("Size", Field::Size),
    ("SectorSize", Field::SectorSize),
    ("FriendlyName", Field::FriendlyName),
    ("PartitionStyle", Field::PartitionStyle),
    ("PartitionCount", Field::PartitionCount),
    ("IsReadOnly", Field::IsReadOnly),
    ("IsOffline", Field::IsOffline),
    ("IsUninitialised", Field::IsUninitialised),
];

#[derive(Debug, Clone, PartialEq)]
enum Value {
    Int(u64),
    Str(String),
    Bool(bool),
}

impl Value {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "integer",
            Self::Str(_) => "string",
            Self::Bool(_) => "boolean",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Literal(Value),
    Field(Field),
    Not(Box<Expr>),
    Cmp(CmpOp, Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

/// Compile or evaluation failure. Carries enough context to fix the
/// task-sequence condition string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExprError(pub String);

impl fmt::Display for ExprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ExprError {}

fn err(message: impl Into<String>) -> ExprError {
    ExprError(message.into())
}

// --- Lexer ---

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Int(u64),
    Str(String),
    True,
    False,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    Not,
    LParen,
    RParen,
}

fn suffix_multiplier(suffix: &str) -> Option<u64> {
    match suffix.to_ascii_uppercase().as_str() {
        "" => Some(1),
        "KB" => Some(1024),
        "MB" => Some(1024 * 1024),
        "GB" => Some(1024 * 1024 * 1024),
        "TB" => Some(1024u64.pow(4)),
        _ => None,
    }
}

fn lex(input: &str) -> Result<Vec<Token>, ExprError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '\r' | '\n' => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '=' => {
                chars.next();
                match chars.next() {
                    Some('=') => tokens.push(Token::EqEq),
                    _ => return Err(err("expected '==' (single '=' is not assignment here)")),
                }
            }
            '!' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::NotEq);
                } else {
                    tokens.push(Token::Not);
                }
            }
            '<' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Le);
                } else {
                    tokens.push(Token::Lt);
                }
            }
            '>' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Ge);
                } else {
                    tokens.push(Token::Gt);
                }
            }
            '&' => {
                chars.next();
                match chars.next() {
                    Some('&') => tokens.push(Token::AndAnd),
                    _ => return Err(err("expected '&&'")),
                }
            }
            '|' => {
                chars.next();
                match chars.next() {
                    Some('|') => tokens.push(Token::OrOr),
                    _ => return Err(err("expected '||'")),
                }
            }
            '"' => {
                chars.next();
                let mut text = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some(c) => text.push(c),
                        None => return Err(err("unterminated string literal")),
                    }
                }
                tokens.push(Token::Str(text));
            }
            '0'..='9' => {
                let mut digits = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_digit() || c == '_' {
                        digits.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let mut suffix = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_alphabetic() {
                        suffix.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let base: u64 = digits
                    .replace('_', "")
                    .parse()
                    .map_err(|_| err(format!("bad integer literal {digits:?}")))?;
                let multiplier = suffix_multiplier(&suffix)
                    .ok_or_else(|| err(format!("unknown size suffix {suffix:?}")))?;
                let value = base
                    .checked_mul(multiplier)
                    .ok_or_else(|| err(format!("integer literal {digits}{suffix} overflows")))?;
                tokens.push(Token::Int(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        ident.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                match ident.as_str() {
                    "true" => tokens.push(Token::True),
                    "false" => tokens.push(Token::False),
                    _ => tokens.push(Token::Ident(ident)),
                }
            }
            other => return Err(err(format!("unexpected character {other:?}"))),
        }
    }

    Ok(tokens)
}

// --- Parser (recursive descent, || < && < comparison < unary) ---

struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn parse_or(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_and()?;
        while self.peek() == Some(&Token::OrOr) {
            self.next();
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_cmp()?;
        while self.peek() == Some(&Token::AndAnd) {
            self.next();
            let right = self.parse_cmp()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_cmp(&mut self) -> Result<Expr, ExprError> {
        let left = self.parse_unary()?;
        let op = match self.peek() {
            Some(Token::EqEq) => Some(CmpOp::Eq),
            Some(Token::NotEq) => Some(CmpOp::Ne),
            Some(Token::Lt) => Some(CmpOp::Lt),
            Some(Token::Le) => Some(CmpOp::Le),
            Some(Token::Gt) => Some(CmpOp::Gt),
            Some(Token::Ge) => Some(CmpOp::Ge),
            _ => None,
        };
        if let Some(op) = op {
            self.next();
            let right = self.parse_unary()?;
            return Ok(Expr::Cmp(op, Box::new(left), Box::new(right)));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ExprError> {
        if self.peek() == Some(&Token::Not) {
            self.next();
            let inner = self.parse_unary()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        match self.next() {
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(err("missing closing parenthesis")),
                }
            }
            Some(Token::Int(value)) => Ok(Expr::Literal(Value::Int(value))),
            Some(Token::Str(value)) => Ok(Expr::Literal(Value::Str(value))),
            Some(Token::True) => Ok(Expr::Literal(Value::Bool(true))),
            Some(Token::False) => Ok(Expr::Literal(Value::Bool(false))),
            Some(Token::Ident(name)) => SCHEMA
                .iter()
                .find(|(field_name, _)| *field_name == name)
                .map(|(_, field)| Expr::Field(*field))
                .ok_or_else(|| {
                    let known: Vec<&str> = SCHEMA.iter().map(|(n, _)| *n).collect();
                    err(format!(
                        "unknown field {name:?}; known fields: {}",
                        known.join(", ")
                    ))
                }),
            other => Err(err(format!("unexpected token {other:?}"))),
        }
    }
}

/// A compiled selection condition.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledCondition {
    source: String,
    expr: Expr,
}

impl CompiledCondition {
    /// Compile a condition string against the fixed schema.
    pub fn compile(source: &str) -> Result<Self, ExprError> {
        let tokens = lex(source)?;
        if tokens.is_empty() {
            return Err(err("empty condition"));
        }
        let mut parser = Parser {
            tokens,
            position: 0,
        };
        let expr = parser.parse_or()?;
        if parser.position != parser.tokens.len() {
            return Err(err(format!(
                "trailing input after expression: {:?}",
                &parser.tokens[parser.position..]
            )));
        }
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether evaluation needs the disk's partition collection.
    pub fn needs_partitions(&self) -> bool {
        fn walk(expr: &Expr) -> bool {
            match expr {
                Expr::Field(Field::PartitionCount) => true,
                Expr::Field(_) | Expr::Literal(_) => false,
                Expr::Not(inner) => walk(inner),
                Expr::Cmp(_, l, r) | Expr::And(l, r) | Expr::Or(l, r) => walk(l) || walk(r),
            }
        }
        walk(&self.expr)
    }

    /// Evaluate against one disk. `partition_count` must be supplied
    /// when [`Self::needs_partitions`] is true.
    pub fn evaluate(
        &self,
        disk: &DiskInfo,
        partition_count: Option<usize>,
    ) -> Result<bool, ExprError> {
        match eval(&self.expr, disk, partition_count)? {
            Value::Bool(result) => Ok(result),
            other => Err(err(format!(
                "condition evaluates to a {} value, not a boolean",
                other.type_name()
            ))),
        }
    }
}

fn field_value(
    field: Field,
    disk: &DiskInfo,
    partition_count: Option<usize>,
) -> Result<Value, ExprError> {
    Ok(match field {
        Field::BusType => Value::Str(disk.bus_type.as_str().to_string()),
        Field::Size => Value::Int(disk.size),
        Field::SectorSize => Value::Int(u64::from(disk.sector_size)),
        Field::FriendlyName => Value::Str(disk.friendly_name.clone()),
        Field::PartitionStyle => Value::Str(disk.partition_style.as_str().to_string()),
        Field::PartitionCount => Value::Int(
            partition_count.ok_or_else(|| err("partition count was not resolved"))? as u64,
        ),
        Field::IsReadOnly => Value::Bool(disk.is_read_only()),
        Field::IsOffline => Value::Bool(disk.is_offline()),
        Field::IsUninitialised => Value::Bool(disk.is_uninitialised()),
    })
}

fn eval(
    expr: &Expr,
    disk: &DiskInfo,
    partition_count: Option<usize>,
) -> Result<Value, ExprError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Field(field) => field_value(*field, disk, partition_count),
        Expr::Not(inner) => match eval(inner, disk, partition_count)? {
            Value::Bool(value) => Ok(Value::Bool(!value)),
            other => Err(err(format!("'!' applied to a {} value", other.type_name()))),
        },
        Expr::And(left, right) => {
            match eval(left, disk, partition_count)? {
                Value::Bool(false) => Ok(Value::Bool(false)),
                Value::Bool(true) => match eval(right, disk, partition_count)? {
                    Value::Bool(value) => Ok(Value::Bool(value)),
                    other => Err(err(format!("'&&' applied to a {} value", other.type_name()))),
                },
                other => Err(err(format!("'&&' applied to a {} value", other.type_name()))),
            }
        }
        Expr::Or(left, right) => {
            match eval(left, disk, partition_count)? {
                Value::Bool(true) => Ok(Value::Bool(true)),
                Value::Bool(false) => match eval(right, disk, partition_count)? {
                    Value::Bool(value) => Ok(Value::Bool(value)),
                    other => Err(err(format!("'||' applied to a {} value", other.type_name()))),
                },
                other => Err(err(format!("'||' applied to a {} value", other.type_name()))),
            }
        }
        Expr::Cmp(op, left, right) => {
            let left = eval(left, disk, partition_count)?;
            let right = eval(right, disk, partition_count)?;
            compare(*op, &left, &right).map(Value::Bool)
        }
    }
}

fn compare(op: CmpOp, left: &Value, right: &Value) -> Result<bool, ExprError> {
    match (left, right) {
        (Value::Int(l), Value::Int(r)) => Ok(match op {
            CmpOp::Eq => l == r,
            CmpOp::Ne => l != r,
            CmpOp::Lt => l < r,
            CmpOp::Le => l <= r,
            CmpOp::Gt => l > r,
            CmpOp::Ge => l >= r,
        }),
        (Value::Str(l), Value::Str(r)) => match op {
            CmpOp::Eq => Ok(l == r),
            CmpOp::Ne => Ok(l != r),
            _ => Err(err("strings only support '==' and '!='")),
        },
        (Value::Bool(l), Value::Bool(r)) => match op {
            CmpOp::Eq => Ok(l == r),
            CmpOp::Ne => Ok(l != r),
            _ => Err(err("booleans only support '==' and '!='")),
        },
        (l, r) => Err(err(format!(
            "cannot compare {} with {}",
            l.type_name(),
            r.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use deploy_types::{BusType, DiskFlag, PartitionStyle};
    use enumflags2::BitFlags;
    use uuid::Uuid;

    use super::*;

    fn nvme_disk() -> DiskInfo {
        DiskInfo {
            id: Uuid::new_v4(),
            friendly_name: "Samsung SSD 970 EVO".to_string(),
            bus_type: BusType::Nvme,
            size: 256 * 1024 * 1024 * 1024,
            sector_size: 512,
            partition_style: PartitionStyle::Gpt,
            flags: BitFlags::empty(),
        }
    }

    #[test]
    fn bus_type_equality_matches() {
        let condition = CompiledCondition::compile(r#"BusType == "Nvme""#).unwrap();
        assert!(condition.evaluate(&nvme_disk(), None).unwrap());

        let condition = CompiledCondition::compile(r#"BusType == "Usb""#).unwrap();
        assert!(!condition.evaluate(&nvme_disk(), None).unwrap());
    }

    #[test]
    fn size_suffixes_are_binary_multiples() {
        let condition = CompiledCondition::compile("Size >= 200GB && Size < 1TB").unwrap();
        assert!(condition.evaluate(&nvme_disk(), None).unwrap());

        let condition = CompiledCondition::compile("Size == 262144MB").unwrap();
        assert!(condition.evaluate(&nvme_disk(), None).unwrap());
    }

    #[test]
    fn logical_operators_and_parentheses_nest() {
        let condition = CompiledCondition::compile(
            r#"(BusType == "Usb" || BusType == "Nvme") && !IsReadOnly"#,
        )
        .unwrap();
        assert!(condition.evaluate(&nvme_disk(), None).unwrap());
    }

    #[test]
    fn partition_count_requires_resolution() {
        let condition = CompiledCondition::compile("PartitionCount == 0").unwrap();
        assert!(condition.needs_partitions());
        assert!(condition.evaluate(&nvme_disk(), Some(0)).unwrap());
        assert!(condition.evaluate(&nvme_disk(), None).is_err());

        let condition = CompiledCondition::compile("Size > 0").unwrap();
        assert!(!condition.needs_partitions());
    }

    #[test]
    fn unknown_field_is_a_compile_error_naming_the_schema() {
        let error = CompiledCondition::compile("Color == \"red\"").unwrap_err();
        assert!(error.to_string().contains("unknown field"));
        assert!(error.to_string().contains("BusType"));
    }

    #[test]
    fn type_mismatch_fails_instead_of_matching() {
        let condition = CompiledCondition::compile(r#"Size == "big""#).unwrap();
        assert!(condition.evaluate(&nvme_disk(), None).is_err());

        let condition = CompiledCondition::compile("Size < \"10\"").unwrap();
        assert!(condition.evaluate(&nvme_disk(), None).is_err());
    }

    #[test]
    fn non_boolean_expression_fails_closed() {
        let condition = CompiledCondition::compile("Size").unwrap();
        assert!(condition.evaluate(&nvme_disk(), None).is_err());
    }

    #[test]
    fn malformed_input_is_rejected_at_compile_time() {
        assert!(CompiledCondition::compile("").is_err());
        assert!(CompiledCondition::compile("Size >").is_err());
        assert!(CompiledCondition::compile("(Size > 1").is_err());
        assert!(CompiledCondition::compile("Size > 1 extra").is_err());
        assert!(CompiledCondition::compile("Size = 1").is_err());
        assert!(CompiledCondition::compile("Size > 10XB").is_err());
    }
}
