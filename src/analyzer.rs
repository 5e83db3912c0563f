//! Модуль `analyzer`
//!
//! Семантический анализ Pyrite: разрешение имён по цепочке областей
//! видимости, проверка инвариантов параметров и привязка аргументов
//! вызовов.
//!
//! Анализ декорирует дерево на месте: поля `decl` узлов получают
//! идентификаторы объявлений из таблицы [`Analysis`]. Первый нарушенный
//! инвариант прерывает проход (fail-fast).

use log::{debug, trace};

use crate::ast::{Argument, DeclId, Expr, FunctionDecl, Program, Stmt, Target};
use crate::context::{ScopeChain, ScopeId};
use crate::error::{CompileError, CompileResult};

// === Таблица объявлений ===

/// Сигнатура одного параметра в объявлении функции.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSig {
    pub name: String,
    /// Параметр со значением по умолчанию.
    pub optional: bool,
}

/// Вид объявления.
#[derive(Debug, Clone, PartialEq)]
pub enum DeclKind {
    /// Функция с её сигнатурой параметров в порядке объявления.
    Function { params: Vec<ParamSig> },
    /// Параметр функции.
    Parameter,
    /// Переменная, введённая присваиванием.
    Variable,
}

/// Одно объявление: имя плюс вид.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub name: String,
    pub kind: DeclKind,
}

/// Результат успешного анализа: таблица всех объявлений единицы
/// компиляции. Поля `decl` декорированного дерева индексируют её.
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    declarations: Vec<Declaration>,
}

impl Analysis {
    /// Найти объявление по ID.
    pub fn declaration(&self, id: DeclId) -> Option<&Declaration> {
        self.declarations.get(id as usize)
    }

    /// Количество объявлений.
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    /// Пуста ли таблица.
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    fn add(&mut self, decl: Declaration) -> DeclId {
        let id = self.declarations.len() as DeclId;
        self.declarations.push(decl);
        id
    }

    fn set_function_params(&mut self, id: DeclId, params: Vec<ParamSig>) {
        if let Some(decl) = self.declarations.get_mut(id as usize) {
            decl.kind = DeclKind::Function { params };
        }
    }
}

// === Анализатор ===

/// Проанализировать программу.
///
/// Успех декорирует дерево на месте и возвращает таблицу объявлений;
/// дерево после неудачного анализа может быть декорировано частично и
/// к дальнейшим проходам непригодно.
pub fn analyze(program: &mut Program) -> CompileResult<Analysis> {
    let mut analyzer = Analyzer::new();
    let root = analyzer.scopes.root();
    analyzer.statements(&mut program.statements, root)?;
    debug!(
        "analyzer: resolved {} declaration(s)",
        analyzer.analysis.len()
    );
    Ok(analyzer.analysis)
}

struct Analyzer {
    scopes: ScopeChain,
    analysis: Analysis,
}

impl Analyzer {
    fn new() -> Self {
        Self {
            scopes: ScopeChain::new(),
            analysis: Analysis::default(),
        }
    }

    fn statements(&mut self, statements: &mut [Stmt], scope: ScopeId) -> CompileResult<()> {
        for statement in statements {
            self.statement(statement, scope)?;
        }
        Ok(())
    }

    fn statement(&mut self, statement: &mut Stmt, scope: ScopeId) -> CompileResult<()> {
        match statement {
            Stmt::Function(function) => self.function(function, scope),
            Stmt::Assign { targets, sources } => self.assign(targets, sources, scope),
            Stmt::Break => {
                if !self.scopes.in_loop(scope) {
                    return Err(CompileError::IllegalBreak);
                }
                Ok(())
            }
            Stmt::Return(value) => {
                if self.scopes.function(scope).is_none() {
                    return Err(CompileError::IllegalReturn);
                }
                if let Some(value) = value {
                    self.expression(value, scope)?;
                }
                Ok(())
            }
            Stmt::If { cases, else_body } => {
                for case in cases {
                    // Условие видит охватывающую область, тело — свою
                    self.expression(&mut case.condition, scope)?;
                    let body_scope = self.scopes.push_child(scope);
                    self.statements(&mut case.body, body_scope)?;
                }
                if let Some(else_body) = else_body {
                    let body_scope = self.scopes.push_child(scope);
                    self.statements(else_body, body_scope)?;
                }
                Ok(())
            }
            Stmt::While { condition, body } => {
                self.expression(condition, scope)?;
                let body_scope = self.scopes.push_loop_body(scope);
                self.statements(body, body_scope)
            }
        }
    }

    /// Анализ объявления функции.
    ///
    /// Порядок существенный: сначала параметры в области тела, затем
    /// инвариант порядка параметров, затем регистрация имени функции в
    /// охватывающей области и только после этого — тело. Значение по
    /// умолчанию параметра поэтому не может ссылаться на объявляемую
    /// функцию, а тело может (рекурсия).
    fn function(&mut self, function: &mut FunctionDecl, scope: ScopeId) -> CompileResult<()> {
        trace!("analyzer: function '{}'", function.name);

        let decl = self.analysis.add(Declaration {
            name: function.name.clone(),
            kind: DeclKind::Function { params: Vec::new() },
        });
        let body_scope = self.scopes.push_function_body(scope, decl);

        for parameter in &mut function.parameters {
            // Значение по умолчанию видит внешние имена и более ранние
            // параметры, но не сам параметр и не объявляемую функцию
            if let Some(default) = &mut parameter.default {
                self.expression(default, body_scope)?;
            }
            let param_decl = self.analysis.add(Declaration {
                name: parameter.name.clone(),
                kind: DeclKind::Parameter,
            });
            self.scopes.declare(body_scope, &parameter.name, param_decl)?;
            parameter.decl = Some(param_decl);
        }

        let mut seen_optional = false;
        for parameter in &function.parameters {
            if parameter.default.is_some() {
                seen_optional = true;
            } else if seen_optional {
                return Err(CompileError::ParameterOrder {
                    function: function.name.clone(),
                    parameter: parameter.name.clone(),
                });
            }
        }

        let params = function
            .parameters
            .iter()
            .map(|p| ParamSig {
                name: p.name.clone(),
                optional: p.default.is_some(),
            })
            .collect();
        self.analysis.set_function_params(decl, params);

        self.scopes.declare(scope, &function.name, decl)?;
        function.decl = Some(decl);

        self.statements(&mut function.body, body_scope)
    }

    /// Анализ присваивания: источники строго до целей, чтобы источник
    /// не увидел ещё не объявленную цель.
    fn assign(
        &mut self,
        targets: &mut [Target],
        sources: &mut [Expr],
        scope: ScopeId,
    ) -> CompileResult<()> {
        if targets.len() != sources.len() {
            return Err(CompileError::ArityMismatch {
                targets: targets.len(),
                sources: sources.len(),
            });
        }
        for source in sources {
            self.expression(source, scope)?;
        }
        for target in targets {
            match self.scopes.try_lookup(scope, &target.name) {
                Some(decl) => {
                    target.decl = Some(decl);
                    target.declares = false;
                }
                None => {
                    // Первое присваивание объявляет переменную
                    let decl = self.analysis.add(Declaration {
                        name: target.name.clone(),
                        kind: DeclKind::Variable,
                    });
                    self.scopes.declare(scope, &target.name, decl)?;
                    target.decl = Some(decl);
                    target.declares = true;
                }
            }
        }
        Ok(())
    }

    fn expression(&mut self, expression: &mut Expr, scope: ScopeId) -> CompileResult<()> {
        // Глубокая рекурсия по выражениям защищена расширением стека
        stacker::maybe_grow(256 * 1024, 8 * 1024 * 1024, || {
            match expression {
                Expr::Binary { lhs, rhs, .. } => {
                    self.expression(lhs, scope)?;
                    self.expression(rhs, scope)
                }
                Expr::Unary { operand, .. } => self.expression(operand, scope),
                Expr::Variable { name, decl } => {
                    *decl = Some(self.scopes.lookup(scope, name)?);
                    Ok(())
                }
                Expr::Call {
                    callee,
                    callee_decl,
                    arguments,
                } => {
                    let decl = self.scopes.lookup(scope, callee)?;
                    *callee_decl = Some(decl);
                    for argument in arguments.iter_mut() {
                        self.expression(&mut argument.value, scope)?;
                    }
                    self.bind_call(callee, decl, arguments)
                }
                Expr::Bool(_) | Expr::Number(_) => Ok(()),
            }
        })
    }

    /// Проверка привязки аргументов к параметрам вызываемой функции:
    /// позиционные по порядку, именованные — только к необязательным
    /// параметрам.
    fn bind_call(
        &self,
        callee: &str,
        decl: DeclId,
        arguments: &[Argument],
    ) -> CompileResult<()> {
        let params = match self.analysis.declaration(decl).map(|d| &d.kind) {
            Some(DeclKind::Function { params }) => params,
            _ => {
                return Err(CompileError::CallBinding {
                    callee: callee.to_string(),
                    detail: format!("'{}' is not a function", callee),
                })
            }
        };

        let binding_error = |detail: String| CompileError::CallBinding {
            callee: callee.to_string(),
            detail,
        };

        let mut bound = vec![false; params.len()];
        let mut positional = 0usize;
        let mut seen_named = false;

        for argument in arguments {
            match &argument.name {
                None => {
                    if seen_named {
                        return Err(binding_error(
                            "positional argument after named argument".to_string(),
                        ));
                    }
                    if positional >= params.len() {
                        return Err(binding_error(format!(
                            "too many positional arguments (expected {})",
                            params.len()
                        )));
                    }
                    bound[positional] = true;
                    positional += 1;
                }
                Some(name) => {
                    seen_named = true;
                    let index = params.iter().position(|p| &p.name == name).ok_or_else(
                        || binding_error(format!("unknown named argument '{}'", name)),
                    )?;
                    if !params[index].optional {
                        return Err(binding_error(format!(
                            "named argument '{}' binds a required parameter",
                            name
                        )));
                    }
                    if bound[index] {
                        return Err(binding_error(format!(
                            "parameter '{}' bound more than once",
                            name
                        )));
                    }
                    bound[index] = true;
                }
            }
        }

        for (index, param) in params.iter().enumerate() {
            if !param.optional && !bound[index] {
                return Err(binding_error(format!(
                    "missing required parameter '{}'",
                    param.name
                )));
            }
        }
        Ok(())
    }
}
