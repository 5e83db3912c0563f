//! Основные структуры Абстрактного Синтаксического Дерева (AST).
//!
//! Дерево строится внешним парсером через конструкторы узлов и
//! декорируется на месте при семантическом анализе: поля `decl`
//! заполняются идентификаторами разрешённых объявлений.

use serde::{Deserialize, Serialize};

use crate::error::{CompileError, CompileResult};

/// Уникальный идентификатор объявления (индекс в таблице объявлений).
pub type DeclId = u64;

// === Программа ===

/// Корневой узел: одна единица компиляции.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl Program {
    /// Создать программу из списка операторов.
    pub fn new(statements: Vec<Stmt>) -> Self {
        Self { statements }
    }

    /// Сериализовать дерево в JSON.
    pub fn to_json(&self) -> CompileResult<String> {
        serde_json::to_string(self).map_err(|e| CompileError::Internal(e.to_string()))
    }

    /// Восстановить дерево из JSON.
    pub fn from_json(json: &str) -> CompileResult<Self> {
        serde_json::from_str(json).map_err(|e| CompileError::Internal(e.to_string()))
    }
}

// === Операторы ===

/// Оператор Pyrite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    /// Объявление функции.
    Function(FunctionDecl),
    /// Присваивание (возможно, нескольким целям сразу).
    Assign { targets: Vec<Target>, sources: Vec<Expr> },
    /// Выход из цикла.
    Break,
    /// Возврат из функции.
    Return(Option<Expr>),
    /// Условный оператор: упорядоченные ветки плюс необязательный else.
    If { cases: Vec<IfCase>, else_body: Option<Vec<Stmt>> },
    /// Цикл с предусловием.
    While { condition: Expr, body: Vec<Stmt> },
}

impl Stmt {
    /// Присваивание одной цели.
    pub fn assign(name: impl Into<String>, source: Expr) -> Self {
        Stmt::Assign {
            targets: vec![Target::new(name)],
            sources: vec![source],
        }
    }

    /// Присваивание нескольким целям.
    pub fn assign_many(names: Vec<&str>, sources: Vec<Expr>) -> Self {
        Stmt::Assign {
            targets: names.into_iter().map(Target::new).collect(),
            sources,
        }
    }
}

/// Объявление функции. Поле `decl` заполняется анализом.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub body: Vec<Stmt>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decl: Option<DeclId>,
}

impl FunctionDecl {
    /// Создать объявление функции.
    pub fn new(name: impl Into<String>, parameters: Vec<Parameter>, body: Vec<Stmt>) -> Self {
        Self {
            name: name.into(),
            parameters,
            body,
            decl: None,
        }
    }
}

/// Параметр функции. Параметр со значением по умолчанию — необязательный.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub default: Option<Expr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decl: Option<DeclId>,
}

impl Parameter {
    /// Обязательный параметр.
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
            decl: None,
        }
    }

    /// Необязательный параметр со значением по умолчанию.
    pub fn optional(name: impl Into<String>, default: Expr) -> Self {
        Self {
            name: name.into(),
            default: Some(default),
            decl: None,
        }
    }
}

/// Цель присваивания. Если имя не было видно в момент анализа,
/// присваивание объявляет его (`declares = true`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decl: Option<DeclId>,
    #[serde(default)]
    pub declares: bool,
}

impl Target {
    /// Создать цель присваивания.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            decl: None,
            declares: false,
        }
    }
}

/// Одна ветка условного оператора: условие плюс тело.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfCase {
    pub condition: Expr,
    pub body: Vec<Stmt>,
}

impl IfCase {
    /// Создать ветку условного оператора.
    pub fn new(condition: Expr, body: Vec<Stmt>) -> Self {
        Self { condition, body }
    }
}

// === Выражения ===

/// Выражение Pyrite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Бинарная операция.
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Унарная операция.
    Unary { op: UnaryOp, operand: Box<Expr> },
    /// Ссылка на переменную. Поле `decl` заполняется анализом.
    Variable {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        decl: Option<DeclId>,
    },
    /// Вызов функции. Поле `callee_decl` заполняется анализом.
    Call {
        callee: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        callee_decl: Option<DeclId>,
        arguments: Vec<Argument>,
    },
    /// Булев литерал.
    Bool(bool),
    /// Числовой литерал.
    Number(f64),
}

impl Expr {
    /// Бинарная операция.
    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Унарная операция.
    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    /// Ссылка на переменную.
    pub fn variable(name: impl Into<String>) -> Self {
        Expr::Variable {
            name: name.into(),
            decl: None,
        }
    }

    /// Вызов функции.
    pub fn call(callee: impl Into<String>, arguments: Vec<Argument>) -> Self {
        Expr::Call {
            callee: callee.into(),
            callee_decl: None,
            arguments,
        }
    }

    /// Получить число из литерала.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Expr::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Получить булево значение из литерала.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Expr::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Является ли выражение литералом.
    pub fn is_literal(&self) -> bool {
        matches!(self, Expr::Bool(_) | Expr::Number(_))
    }
}

/// Аргумент вызова: позиционный или именованный.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    pub name: Option<String>,
    pub value: Expr,
}

impl Argument {
    /// Позиционный аргумент.
    pub fn positional(value: Expr) -> Self {
        Self { name: None, value }
    }

    /// Именованный аргумент (допустим только для необязательных параметров).
    pub fn named(name: impl Into<String>, value: Expr) -> Self {
        Self {
            name: Some(name.into()),
            value,
        }
    }
}

// === Операции ===

/// Бинарные операции.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    /// Сложение (+)
    Add,
    /// Вычитание (-)
    Sub,
    /// Умножение (*)
    Mul,
    /// Деление (/)
    Div,
    /// Меньше (<)
    Lt,
    /// Меньше или равно (<=)
    Le,
    /// Больше (>)
    Gt,
    /// Больше или равно (>=)
    Ge,
    /// Равенство (==)
    Eq,
    /// Неравенство (!=)
    Ne,
    /// Логическое И (and)
    And,
    /// Логическое ИЛИ (or)
    Or,
}

/// Унарные операции.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Унарный минус
    Neg,
    /// Логическое НЕ (not)
    Not,
}
