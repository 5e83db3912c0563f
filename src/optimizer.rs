//! Модуль `optimizer`
//!
//! Локальные переписывания дерева после успешного анализа:
//! - свёртка константных выражений (снизу вверх);
//! - удаление статически мёртвых веток `if` и циклов `while false`;
//! - удаление самоприсваиваний (`x = x`).
//!
//! Проход идемпотентен: повторный запуск не меняет дерево. Переписывание
//! оператора возвращает список замен (пустой — оператор удалён), родитель
//! подклеивает его на место.

use log::{debug, trace};

use crate::ast::{Argument, BinaryOp, Expr, IfCase, Program, Stmt, Target, UnaryOp};

/// Оптимизировать программу на месте.
///
/// Предусловие: дерево прошло успешный анализ. На неанализированном
/// дереве проход не проверяет инварианты языка.
pub fn optimize(program: &mut Program) {
    debug!(
        "optimizer: running on {} top-level statement(s)",
        program.statements.len()
    );
    let statements = std::mem::take(&mut program.statements);
    program.statements = optimize_statements(statements);
}

fn optimize_statements(statements: Vec<Stmt>) -> Vec<Stmt> {
    statements.into_iter().flat_map(optimize_stmt).collect()
}

fn optimize_stmt(statement: Stmt) -> Vec<Stmt> {
    match statement {
        Stmt::Function(mut function) => {
            for parameter in &mut function.parameters {
                if let Some(default) = parameter.default.take() {
                    parameter.default = Some(fold_expr(default));
                }
            }
            function.body = optimize_statements(function.body);
            vec![Stmt::Function(function)]
        }
        Stmt::Assign { targets, sources } => {
            let sources: Vec<Expr> = sources.into_iter().map(fold_expr).collect();
            if is_self_assignment(&targets, &sources) {
                trace!("optimizer: dropping self-assignment");
                return Vec::new();
            }
            vec![Stmt::Assign { targets, sources }]
        }
        Stmt::Break => vec![Stmt::Break],
        Stmt::Return(value) => vec![Stmt::Return(value.map(fold_expr))],
        Stmt::If { cases, else_body } => optimize_if(cases, else_body),
        Stmt::While { condition, body } => {
            let condition = fold_expr(condition);
            if condition.as_bool() == Some(false) {
                trace!("optimizer: dropping 'while false' loop");
                return Vec::new();
            }
            vec![Stmt::While {
                condition,
                body: optimize_statements(body),
            }]
        }
    }
}

/// Чистка условного оператора.
///
/// Ветки со статически ложным условием выбрасываются. Статически
/// истинная ветка обрывает список: если она первая из оставшихся, её
/// тело заменяет весь оператор, иначе она становится `else`.
fn optimize_if(cases: Vec<IfCase>, else_body: Option<Vec<Stmt>>) -> Vec<Stmt> {
    let mut kept: Vec<IfCase> = Vec::new();
    let mut else_body = else_body.map(optimize_statements);

    for case in cases {
        let condition = fold_expr(case.condition);
        match condition.as_bool() {
            Some(false) => {
                trace!("optimizer: dropping statically false branch");
            }
            Some(true) => {
                let body = optimize_statements(case.body);
                if kept.is_empty() {
                    return body;
                }
                else_body = Some(body);
                break;
            }
            None => kept.push(IfCase::new(condition, optimize_statements(case.body))),
        }
    }

    if let Some(body) = &else_body {
        if body.is_empty() {
            else_body = None;
        }
    }
    if kept.is_empty() {
        return else_body.unwrap_or_default();
    }
    vec![Stmt::If {
        cases: kept,
        else_body,
    }]
}

/// Все цели присваивания совпадают со своими источниками по разрешённым
/// объявлениям.
fn is_self_assignment(targets: &[Target], sources: &[Expr]) -> bool {
    !targets.is_empty()
        && targets.len() == sources.len()
        && targets
            .iter()
            .zip(sources)
            .all(|(target, source)| match source {
                Expr::Variable { decl, .. } => {
                    !target.declares && target.decl.is_some() && target.decl == *decl
                }
                _ => false,
            })
}

/// Свёртка выражения снизу вверх.
fn fold_expr(expression: Expr) -> Expr {
    // Глубокая рекурсия по выражениям защищена расширением стека
    stacker::maybe_grow(256 * 1024, 8 * 1024 * 1024, || match expression {
        Expr::Binary { op, lhs, rhs } => {
            let lhs = fold_expr(*lhs);
            let rhs = fold_expr(*rhs);
            fold_binary(op, lhs, rhs)
        }
        Expr::Unary { op, operand } => {
            let operand = fold_expr(*operand);
            fold_unary(op, operand)
        }
        Expr::Call {
            callee,
            callee_decl,
            arguments,
        } => Expr::Call {
            callee,
            callee_decl,
            arguments: arguments
                .into_iter()
                .map(|argument| Argument {
                    name: argument.name,
                    value: fold_expr(argument.value),
                })
                .collect(),
        },
        other => other,
    })
}

fn fold_binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    use BinaryOp::*;

    match (op, &lhs, &rhs) {
        (Add, Expr::Number(a), Expr::Number(b)) => Expr::Number(a + b),
        (Sub, Expr::Number(a), Expr::Number(b)) => Expr::Number(a - b),
        (Mul, Expr::Number(a), Expr::Number(b)) => Expr::Number(a * b),
        // Деление на статический ноль не сворачиваем
        (Div, Expr::Number(a), Expr::Number(b)) if *b != 0.0 => Expr::Number(a / b),
        (Lt, Expr::Number(a), Expr::Number(b)) => Expr::Bool(a < b),
        (Le, Expr::Number(a), Expr::Number(b)) => Expr::Bool(a <= b),
        (Gt, Expr::Number(a), Expr::Number(b)) => Expr::Bool(a > b),
        (Ge, Expr::Number(a), Expr::Number(b)) => Expr::Bool(a >= b),
        (Eq, Expr::Number(a), Expr::Number(b)) => Expr::Bool(a == b),
        (Eq, Expr::Bool(a), Expr::Bool(b)) => Expr::Bool(a == b),
        (Ne, Expr::Number(a), Expr::Number(b)) => Expr::Bool(a != b),
        (Ne, Expr::Bool(a), Expr::Bool(b)) => Expr::Bool(a != b),
        (And, Expr::Bool(a), Expr::Bool(b)) => Expr::Bool(*a && *b),
        (Or, Expr::Bool(a), Expr::Bool(b)) => Expr::Bool(*a || *b),
        _ => Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
    }
}

fn fold_unary(op: UnaryOp, operand: Expr) -> Expr {
    match (op, &operand) {
        (UnaryOp::Neg, Expr::Number(n)) => Expr::Number(-n),
        (UnaryOp::Not, Expr::Bool(b)) => Expr::Bool(!b),
        _ => Expr::Unary {
            op,
            operand: Box::new(operand),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::analyze;
    use crate::ast::{FunctionDecl, Parameter};

    fn fold(expression: Expr) -> Expr {
        fold_expr(expression)
    }

    #[test]
    fn test_fold_arithmetic_bottom_up() {
        // 3 + 4 * 2 -> 11
        let expression = Expr::binary(
            BinaryOp::Add,
            Expr::Number(3.0),
            Expr::binary(BinaryOp::Mul, Expr::Number(4.0), Expr::Number(2.0)),
        );
        assert_eq!(fold(expression), Expr::Number(11.0));
    }

    #[test]
    fn test_fold_comparison_and_logic() {
        // (1 < 2) and (not false) -> true
        let expression = Expr::binary(
            BinaryOp::And,
            Expr::binary(BinaryOp::Lt, Expr::Number(1.0), Expr::Number(2.0)),
            Expr::unary(UnaryOp::Not, Expr::Bool(false)),
        );
        assert_eq!(fold(expression), Expr::Bool(true));
    }

    #[test]
    fn test_fold_unary_minus() {
        assert_eq!(
            fold(Expr::unary(UnaryOp::Neg, Expr::Number(5.0))),
            Expr::Number(-5.0)
        );
    }

    #[test]
    fn test_division_by_literal_zero_is_kept() {
        let expression = Expr::binary(BinaryOp::Div, Expr::Number(1.0), Expr::Number(0.0));
        match fold(expression) {
            Expr::Binary { op: BinaryOp::Div, .. } => {}
            other => panic!("Expected Binary, got {:?}", other),
        }
    }

    #[test]
    fn test_non_literal_operands_are_kept() {
        let expression = Expr::binary(BinaryOp::Add, Expr::variable("x"), Expr::Number(1.0));
        match fold(expression) {
            Expr::Binary { op: BinaryOp::Add, .. } => {}
            other => panic!("Expected Binary, got {:?}", other),
        }
    }

    #[test]
    fn test_statically_false_branch_is_pruned_to_else() {
        // if false: a = 1 else: b = 2  ->  b = 2
        let mut program = Program::new(vec![Stmt::If {
            cases: vec![IfCase::new(
                Expr::Bool(false),
                vec![Stmt::assign("a", Expr::Number(1.0))],
            )],
            else_body: Some(vec![Stmt::assign("b", Expr::Number(2.0))]),
        }]);
        analyze(&mut program).unwrap();
        optimize(&mut program);

        assert_eq!(program.statements.len(), 1);
        match &program.statements[0] {
            Stmt::Assign { targets, .. } => assert_eq!(targets[0].name, "b"),
            other => panic!("Expected Assign, got {:?}", other),
        }
    }

    #[test]
    fn test_statically_true_first_branch_replaces_statement() {
        // if 1 < 2: a = 1 else: b = 2  ->  a = 1
        let mut program = Program::new(vec![Stmt::If {
            cases: vec![IfCase::new(
                Expr::binary(BinaryOp::Lt, Expr::Number(1.0), Expr::Number(2.0)),
                vec![Stmt::assign("a", Expr::Number(1.0))],
            )],
            else_body: Some(vec![Stmt::assign("b", Expr::Number(2.0))]),
        }]);
        analyze(&mut program).unwrap();
        optimize(&mut program);

        assert_eq!(program.statements.len(), 1);
        match &program.statements[0] {
            Stmt::Assign { targets, .. } => assert_eq!(targets[0].name, "a"),
            other => panic!("Expected Assign, got {:?}", other),
        }
    }

    #[test]
    fn test_statically_true_later_branch_becomes_else() {
        // if x > 0: a = 1
        // elif true: b = 2
        // elif x < 0: c = 3
        // else: d = 4
        // -> if x > 0: a = 1 else: b = 2
        let mut program = Program::new(vec![
            Stmt::assign("x", Expr::Number(0.0)),
            Stmt::If {
                cases: vec![
                    IfCase::new(
                        Expr::binary(BinaryOp::Gt, Expr::variable("x"), Expr::Number(0.0)),
                        vec![Stmt::assign("a", Expr::Number(1.0))],
                    ),
                    IfCase::new(Expr::Bool(true), vec![Stmt::assign("b", Expr::Number(2.0))]),
                    IfCase::new(
                        Expr::binary(BinaryOp::Lt, Expr::variable("x"), Expr::Number(0.0)),
                        vec![Stmt::assign("c", Expr::Number(3.0))],
                    ),
                ],
                else_body: Some(vec![Stmt::assign("d", Expr::Number(4.0))]),
            },
        ]);
        analyze(&mut program).unwrap();
        optimize(&mut program);

        match &program.statements[1] {
            Stmt::If { cases, else_body } => {
                assert_eq!(cases.len(), 1);
                let else_body = else_body.as_ref().unwrap();
                match &else_body[0] {
                    Stmt::Assign { targets, .. } => assert_eq!(targets[0].name, "b"),
                    other => panic!("Expected Assign, got {:?}", other),
                }
            }
            other => panic!("Expected If, got {:?}", other),
        }
    }

    #[test]
    fn test_while_false_is_removed() {
        let mut program = Program::new(vec![
            Stmt::assign("x", Expr::Number(1.0)),
            Stmt::While {
                condition: Expr::Bool(false),
                body: vec![Stmt::assign("x", Expr::Number(2.0))],
            },
        ]);
        analyze(&mut program).unwrap();
        optimize(&mut program);
        assert_eq!(program.statements.len(), 1);
    }

    #[test]
    fn test_while_true_is_kept() {
        let mut program = Program::new(vec![Stmt::While {
            condition: Expr::Bool(true),
            body: vec![Stmt::Break],
        }]);
        analyze(&mut program).unwrap();
        optimize(&mut program);
        assert_eq!(program.statements.len(), 1);
    }

    #[test]
    fn test_self_assignment_is_removed() {
        // x = 1
        // x = x
        let mut program = Program::new(vec![
            Stmt::assign("x", Expr::Number(1.0)),
            Stmt::assign("x", Expr::variable("x")),
        ]);
        analyze(&mut program).unwrap();
        optimize(&mut program);
        assert_eq!(program.statements.len(), 1);
    }

    #[test]
    fn test_swap_assignment_is_kept() {
        // x, y = y, x — не самоприсваивание
        let mut program = Program::new(vec![
            Stmt::assign("x", Expr::Number(1.0)),
            Stmt::assign("y", Expr::Number(2.0)),
            Stmt::assign_many(
                vec!["x", "y"],
                vec![Expr::variable("y"), Expr::variable("x")],
            ),
        ]);
        analyze(&mut program).unwrap();
        optimize(&mut program);
        assert_eq!(program.statements.len(), 3);
    }

    #[test]
    fn test_optimizer_is_idempotent() {
        let mut program = Program::new(vec![
            Stmt::assign(
                "x",
                Expr::binary(
                    BinaryOp::Add,
                    Expr::Number(3.0),
                    Expr::binary(BinaryOp::Mul, Expr::Number(4.0), Expr::Number(2.0)),
                ),
            ),
            Stmt::Function(FunctionDecl::new(
                "f",
                vec![Parameter::optional(
                    "n",
                    Expr::binary(BinaryOp::Sub, Expr::Number(2.0), Expr::Number(1.0)),
                )],
                vec![Stmt::Return(Some(Expr::binary(
                    BinaryOp::Mul,
                    Expr::variable("n"),
                    Expr::variable("n"),
                )))],
            )),
            Stmt::If {
                cases: vec![
                    IfCase::new(Expr::Bool(false), vec![Stmt::assign("a", Expr::Number(1.0))]),
                    IfCase::new(
                        Expr::binary(BinaryOp::Gt, Expr::variable("x"), Expr::Number(5.0)),
                        vec![Stmt::assign("x", Expr::variable("x"))],
                    ),
                ],
                else_body: Some(vec![Stmt::While {
                    condition: Expr::Bool(false),
                    body: vec![Stmt::assign("x", Expr::Number(0.0))],
                }]),
            },
        ]);
        analyze(&mut program).unwrap();

        optimize(&mut program);
        let once = program.clone();
        optimize(&mut program);
        assert_eq!(program, once);
    }
}
