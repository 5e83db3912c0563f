//! # Pyrite Core
//!
//! Основная библиотека компилятора языка Pyrite.
//!
//! ## Основные модули
//!
//! - [`ast`] - Абстрактное Синтаксическое Дерево (AST)
//! - [`context`] - Цепочка лексических областей видимости
//! - [`analyzer`] - Семантический анализ (разрешение имён, привязки вызовов)
//! - [`optimizer`] - Локальные оптимизации дерева
//! - [`generator`] - Генерация JavaScript
//! - [`compiler`] - Конвейер analyze → optimize → generate
//!
//! Дерево строится внешним парсером через конструкторы узлов; ядро
//! текст не разбирает.
//!
//! ## Пример использования
//!
//! ```rust
//! use pyrite_lang::ast::{Expr, Program, Stmt};
//! use pyrite_lang::compile;
//!
//! // x = 3 + 4
//! let mut program = Program::new(vec![Stmt::assign(
//!     "x",
//!     Expr::binary(
//!         pyrite_lang::ast::BinaryOp::Add,
//!         Expr::Number(3.0),
//!         Expr::Number(4.0),
//!     ),
//! )]);
//!
//! let js = compile(&mut program).unwrap();
//! assert_eq!(js, "let x_1 = 7;");
//! ```

// === Основные модули ===
pub mod analyzer;
pub mod ast;
pub mod compiler;
pub mod concurrency;
pub mod context;
pub mod error;
pub mod generator;
pub mod optimizer;

// === Re-exports для удобства ===
pub use analyzer::{analyze, Analysis, DeclKind, Declaration, ParamSig};
pub use ast::{
    Argument, BinaryOp, DeclId, Expr, FunctionDecl, IfCase, Parameter, Program, Stmt, Target,
    UnaryOp,
};
pub use compiler::{compile, compile_with_options, CompileOptions};
pub use concurrency::compile_units;
pub use context::{ScopeChain, ScopeId};
pub use error::{CompileError, CompileResult};
pub use generator::generate;
pub use optimizer::optimize;
