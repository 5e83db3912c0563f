//! Модуль `concurrency`
//!
//! Параллельная компиляция независимых единиц:
//! - каждая единица получает собственный поток, дерево и таблицу
//!   объявлений;
//! - общего изменяемого состояния нет, координация не нужна.

use std::thread;

use crate::ast::Program;
use crate::compiler::compile;
use crate::error::{CompileError, CompileResult};

/// Скомпилировать несколько независимых единиц параллельно.
///
/// Результаты возвращаются в порядке исходного списка. Первая ошибка
/// компиляции любой из единиц становится результатом всего вызова.
pub fn compile_units(units: Vec<Program>) -> CompileResult<Vec<String>> {
    let handles: Vec<_> = units
        .into_iter()
        .map(|mut program| thread::spawn(move || compile(&mut program)))
        .collect();

    let mut outputs = Vec::with_capacity(handles.len());
    for handle in handles {
        let output = handle
            .join()
            .map_err(|_| CompileError::Internal("compilation thread panicked".into()))??;
        outputs.push(output);
    }
    Ok(outputs)
}
