//! Модуль `generator`
//!
//! Генерация JavaScript из декорированного дерева.
//!
//! Контракт: дерево прошло успешный анализ (и, возможно, оптимизацию).
//! Каждое объявление получает детерминированное уникальное имя вида
//! `name_N` в порядке первого появления в выводе, поэтому затенение
//! исходных имён не приводит к коллизиям в целевом коде.

use std::collections::HashMap;

use log::debug;

use crate::analyzer::{Analysis, DeclKind, ParamSig};
use crate::ast::{Argument, BinaryOp, DeclId, Expr, Program, Stmt, Target, UnaryOp};

// === Приоритеты операций JavaScript ===

const PREC_OR: u8 = 1;
const PREC_AND: u8 = 2;
const PREC_EQUALITY: u8 = 3;
const PREC_COMPARISON: u8 = 4;
const PREC_ADDITIVE: u8 = 5;
const PREC_MULTIPLICATIVE: u8 = 6;
const PREC_UNARY: u8 = 7;
const PREC_PRIMARY: u8 = 8;

fn precedence(op: BinaryOp) -> u8 {
    use BinaryOp::*;
    match op {
        Or => PREC_OR,
        And => PREC_AND,
        Eq | Ne => PREC_EQUALITY,
        Lt | Le | Gt | Ge => PREC_COMPARISON,
        Add | Sub => PREC_ADDITIVE,
        Mul | Div => PREC_MULTIPLICATIVE,
    }
}

fn js_symbol(op: BinaryOp) -> &'static str {
    use BinaryOp::*;
    match op {
        Add => "+",
        Sub => "-",
        Mul => "*",
        Div => "/",
        Lt => "<",
        Le => "<=",
        Gt => ">",
        Ge => ">=",
        Eq => "===",
        Ne => "!==",
        And => "&&",
        Or => "||",
    }
}

/// Числовой литерал в JS-форме: целые без дробной части.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Сгенерировать JavaScript для программы.
pub fn generate(program: &Program, analysis: &Analysis) -> String {
    let mut generator = Generator::new(analysis);
    let output = generator.program(program);
    debug!("generator: emitted {} line(s)", output.lines().count());
    output
}

/// Генератор одной единицы компиляции.
struct Generator<'a> {
    analysis: &'a Analysis,
    /// Уникальные целевые имена объявлений, в порядке первого появления.
    names: HashMap<DeclId, String>,
}

impl<'a> Generator<'a> {
    fn new(analysis: &'a Analysis) -> Self {
        Self {
            analysis,
            names: HashMap::new(),
        }
    }

    fn program(&mut self, program: &Program) -> String {
        let mut lines = Vec::new();
        self.statements(&program.statements, &mut lines, 0);
        lines.join("\n")
    }

    /// Целевое имя объявления. Недекорированный узел (вне контракта)
    /// выводится под исходным именем.
    fn target_name(&mut self, decl: Option<DeclId>, source_name: &str) -> String {
        let decl = match decl {
            Some(decl) => decl,
            None => return source_name.to_string(),
        };
        if let Some(name) = self.names.get(&decl) {
            return name.clone();
        }
        let base = self
            .analysis
            .declaration(decl)
            .map(|d| d.name.as_str())
            .unwrap_or(source_name);
        let name = format!("{}_{}", base, self.names.len() + 1);
        self.names.insert(decl, name.clone());
        name
    }

    fn statements(&mut self, statements: &[Stmt], lines: &mut Vec<String>, indent: usize) {
        for statement in statements {
            self.statement(statement, lines, indent);
        }
    }

    fn statement(&mut self, statement: &Stmt, lines: &mut Vec<String>, indent: usize) {
        let pad = "  ".repeat(indent);
        match statement {
            Stmt::Function(function) => {
                let name = self.target_name(function.decl, &function.name);
                let parameters: Vec<String> = function
                    .parameters
                    .iter()
                    .map(|parameter| {
                        let parameter_name =
                            self.target_name(parameter.decl, &parameter.name);
                        match &parameter.default {
                            // Значение по умолчанию несёт сигнатура JS
                            Some(default) => {
                                format!("{} = {}", parameter_name, self.expression(default, 0))
                            }
                            None => parameter_name,
                        }
                    })
                    .collect();
                lines.push(format!(
                    "{}function {}({}) {{",
                    pad,
                    name,
                    parameters.join(", ")
                ));
                self.statements(&function.body, lines, indent + 1);
                lines.push(format!("{}}}", pad));
            }
            Stmt::Assign { targets, sources } => {
                self.assignment(targets, sources, lines, &pad);
            }
            Stmt::Break => lines.push(format!("{}break;", pad)),
            Stmt::Return(value) => match value {
                Some(value) => {
                    let value = self.expression(value, 0);
                    lines.push(format!("{}return {};", pad, value));
                }
                None => lines.push(format!("{}return;", pad)),
            },
            Stmt::If { cases, else_body } => {
                for (index, case) in cases.iter().enumerate() {
                    let condition = self.expression(&case.condition, 0);
                    if index == 0 {
                        lines.push(format!("{}if ({}) {{", pad, condition));
                    } else {
                        lines.push(format!("{}}} else if ({}) {{", pad, condition));
                    }
                    self.statements(&case.body, lines, indent + 1);
                }
                if let Some(else_body) = else_body {
                    lines.push(format!("{}}} else {{", pad));
                    self.statements(else_body, lines, indent + 1);
                }
                lines.push(format!("{}}}", pad));
            }
            Stmt::While { condition, body } => {
                let condition = self.expression(condition, 0);
                lines.push(format!("{}while ({}) {{", pad, condition));
                self.statements(body, lines, indent + 1);
                lines.push(format!("{}}}", pad));
            }
        }
    }

    /// Присваивание: `let` на первом появлении объявляющей цели, массивная
    /// деструктуризация для нескольких целей.
    fn assignment(
        &mut self,
        targets: &[Target],
        sources: &[Expr],
        lines: &mut Vec<String>,
        pad: &str,
    ) {
        let values: Vec<String> = sources
            .iter()
            .map(|source| self.expression(source, 0))
            .collect();

        if targets.len() == 1 {
            let name = self.target_name(targets[0].decl, &targets[0].name);
            if targets[0].declares {
                lines.push(format!("{}let {} = {};", pad, name, values[0]));
            } else {
                lines.push(format!("{}{} = {};", pad, name, values[0]));
            }
            return;
        }

        let names: Vec<String> = targets
            .iter()
            .map(|target| self.target_name(target.decl, &target.name))
            .collect();
        if targets.iter().all(|target| target.declares) {
            lines.push(format!(
                "{}let [{}] = [{}];",
                pad,
                names.join(", "),
                values.join(", ")
            ));
        } else {
            // Смешанный случай: свежие цели объявляем заранее
            for (target, name) in targets.iter().zip(&names) {
                if target.declares {
                    lines.push(format!("{}let {};", pad, name));
                }
            }
            lines.push(format!(
                "{}[{}] = [{}];",
                pad,
                names.join(", "),
                values.join(", ")
            ));
        }
    }

    fn expression(&mut self, expression: &Expr, min_prec: u8) -> String {
        // Глубокая рекурсия по выражениям защищена расширением стека
        stacker::maybe_grow(256 * 1024, 8 * 1024 * 1024, || {
            let (text, prec) = match expression {
                Expr::Binary { op, lhs, rhs } => {
                    let prec = precedence(*op);
                    let lhs = self.expression(lhs, prec);
                    let rhs = self.expression(rhs, prec + 1);
                    (format!("{} {} {}", lhs, js_symbol(*op), rhs), prec)
                }
                Expr::Unary { op, operand } => {
                    let operand = self.expression(operand, PREC_UNARY + 1);
                    let symbol = match op {
                        UnaryOp::Neg => "-",
                        UnaryOp::Not => "!",
                    };
                    (format!("{}{}", symbol, operand), PREC_UNARY)
                }
                Expr::Variable { name, decl } => {
                    (self.target_name(*decl, name), PREC_PRIMARY)
                }
                Expr::Call {
                    callee,
                    callee_decl,
                    arguments,
                } => (self.call(callee, *callee_decl, arguments), PREC_PRIMARY),
                Expr::Bool(value) => (value.to_string(), PREC_PRIMARY),
                Expr::Number(value) => (format_number(*value), PREC_PRIMARY),
            };
            if prec < min_prec {
                format!("({})", text)
            } else {
                text
            }
        })
    }

    /// Вызов: аргументы раскладываются по позициям параметров; внутренние
    /// пропуски заполняются `undefined`, и сигнатурное значение по
    /// умолчанию вступает в силу. Хвостовые пропуски опускаются.
    fn call(
        &mut self,
        callee: &str,
        callee_decl: Option<DeclId>,
        arguments: &[Argument],
    ) -> String {
        let name = self.target_name(callee_decl, callee);
        let parameters: Option<Vec<ParamSig>> = callee_decl
            .and_then(|decl| self.analysis.declaration(decl))
            .and_then(|declaration| match &declaration.kind {
                DeclKind::Function { params } => Some(params.clone()),
                _ => None,
            });

        let slots: Vec<Option<String>> = match parameters {
            Some(parameters) => {
                let mut slots: Vec<Option<String>> = vec![None; parameters.len()];
                let mut positional = 0usize;
                for argument in arguments {
                    let value = self.expression(&argument.value, 0);
                    match &argument.name {
                        None => {
                            if positional < slots.len() {
                                slots[positional] = Some(value);
                                positional += 1;
                            }
                        }
                        Some(argument_name) => {
                            if let Some(index) =
                                parameters.iter().position(|p| &p.name == argument_name)
                            {
                                slots[index] = Some(value);
                            }
                        }
                    }
                }
                while matches!(slots.last(), Some(None)) {
                    slots.pop();
                }
                slots
            }
            // Недекорированный вызов (вне контракта): аргументы как есть
            None => arguments
                .iter()
                .map(|argument| Some(self.expression(&argument.value, 0)))
                .collect(),
        };

        let arguments: Vec<String> = slots
            .into_iter()
            .map(|slot| slot.unwrap_or_else(|| "undefined".to_string()))
            .collect();
        format!("{}({})", name, arguments.join(", "))
    }
}
