//! Модуль `compiler`
//!
//! Конвейер компиляции Pyrite:
//! - Frontend: семантический анализ дерева (разрешение имён, привязки);
//! - Middle: необязательная оптимизация (свёртка констант, мёртвый код);
//! - Backend: генерация JavaScript.
//!
//! Каждая стадия завершается до начала следующей; единицы компиляции
//! полностью изолированы друг от друга.

use log::debug;

use crate::analyzer::{analyze, Analysis};
use crate::ast::Program;
use crate::error::CompileResult;
use crate::generator::generate;
use crate::optimizer::optimize;

/// Настройки конвейера.
#[derive(Debug, Clone, Copy)]
pub struct CompileOptions {
    /// Запускать ли оптимизатор между анализом и генерацией.
    pub optimize: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self { optimize: true }
    }
}

/// Скомпилировать программу в JavaScript с настройками по умолчанию.
///
/// Дерево декорируется (и при включённой оптимизации переписывается)
/// на месте.
pub fn compile(program: &mut Program) -> CompileResult<String> {
    compile_with_options(program, CompileOptions::default())
}

/// Скомпилировать программу с явными настройками.
pub fn compile_with_options(
    program: &mut Program,
    options: CompileOptions,
) -> CompileResult<String> {
    let analysis: Analysis = analyze(program)?;
    if options.optimize {
        optimize(program);
    }
    debug!("compiler: analysis done, generating JavaScript");
    Ok(generate(program, &analysis))
}
