//! Цепочка лексических областей видимости.
//!
//! Области хранятся в плоской арене и ссылаются на родителя по индексу.
//! Поиск имени идёт строго изнутри наружу: объявление во внутренней
//! области затеняет одноимённое объявление в любой охватывающей — без
//! ошибок и предупреждений.

use std::collections::HashMap;

use crate::ast::DeclId;
use crate::error::{CompileError, CompileResult};

/// Идентификатор области видимости (индекс в арене).
pub type ScopeId = usize;

/// Одна лексическая область видимости.
#[derive(Debug, Clone)]
struct Scope {
    parent: Option<ScopeId>,
    names: HashMap<String, DeclId>,
    /// Допустим ли здесь `break`.
    in_loop: bool,
    /// Охватывающая функция, если есть (для легальности `return`).
    function: Option<DeclId>,
}

/// Арена областей видимости одной единицы компиляции.
#[derive(Debug, Clone)]
pub struct ScopeChain {
    scopes: Vec<Scope>,
}

impl ScopeChain {
    /// Создать цепочку с корневой областью.
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope {
                parent: None,
                names: HashMap::new(),
                in_loop: false,
                function: None,
            }],
        }
    }

    /// Корневая область.
    pub fn root(&self) -> ScopeId {
        0
    }

    /// Дочерняя область; флаги наследуются от родителя.
    pub fn push_child(&mut self, parent: ScopeId) -> ScopeId {
        let in_loop = self.scopes[parent].in_loop;
        let function = self.scopes[parent].function;
        self.push(parent, in_loop, function)
    }

    /// Область тела функции: `function` указывает на новую функцию,
    /// `in_loop` сбрасывается даже внутри цикла.
    pub fn push_function_body(&mut self, parent: ScopeId, function: DeclId) -> ScopeId {
        self.push(parent, false, Some(function))
    }

    /// Область тела цикла: `in_loop` включён.
    pub fn push_loop_body(&mut self, parent: ScopeId) -> ScopeId {
        let function = self.scopes[parent].function;
        self.push(parent, true, function)
    }

    fn push(&mut self, parent: ScopeId, in_loop: bool, function: Option<DeclId>) -> ScopeId {
        let id = self.scopes.len();
        self.scopes.push(Scope {
            parent: Some(parent),
            names: HashMap::new(),
            in_loop,
            function,
        });
        id
    }

    /// Объявить имя в области `scope`.
    ///
    /// Повторное объявление в той же области — ошибка; охватывающие
    /// области не проверяются.
    pub fn declare(&mut self, scope: ScopeId, name: &str, decl: DeclId) -> CompileResult<()> {
        let names = &mut self.scopes[scope].names;
        if names.contains_key(name) {
            return Err(CompileError::DuplicateDeclaration(name.to_string()));
        }
        names.insert(name.to_string(), decl);
        Ok(())
    }

    /// Найти имя, поднимаясь по цепочке областей. Ближайшее объявление
    /// побеждает.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> CompileResult<DeclId> {
        self.try_lookup(scope, name)
            .ok_or_else(|| CompileError::UndeclaredIdentifier(name.to_string()))
    }

    /// Как [`lookup`](Self::lookup), но без ошибки при неудаче.
    pub fn try_lookup(&self, scope: ScopeId, name: &str) -> Option<DeclId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            if let Some(decl) = self.scopes[id].names.get(name) {
                return Some(*decl);
            }
            current = self.scopes[id].parent;
        }
        None
    }

    /// Допустим ли `break` в области `scope`.
    pub fn in_loop(&self, scope: ScopeId) -> bool {
        self.scopes[scope].in_loop
    }

    /// Охватывающая функция области `scope`, если есть.
    pub fn function(&self, scope: ScopeId) -> Option<DeclId> {
        self.scopes[scope].function
    }
}

impl Default for ScopeChain {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_walks_parent_chain() {
        let mut chain = ScopeChain::new();
        let root = chain.root();
        chain.declare(root, "x", 1).unwrap();

        let inner = chain.push_child(root);
        let innermost = chain.push_child(inner);

        assert_eq!(chain.lookup(innermost, "x").unwrap(), 1);
    }

    #[test]
    fn test_lookup_fails_when_chain_is_exhausted() {
        let chain = ScopeChain::new();
        match chain.lookup(chain.root(), "ghost") {
            Err(CompileError::UndeclaredIdentifier(name)) => assert_eq!(name, "ghost"),
            other => panic!("Expected UndeclaredIdentifier, got {:?}", other),
        }
    }

    #[test]
    fn test_inner_declaration_shadows_outer() {
        let mut chain = ScopeChain::new();
        let root = chain.root();
        chain.declare(root, "x", 1).unwrap();

        let inner = chain.push_child(root);
        chain.declare(inner, "x", 2).unwrap();

        // Внутри видна внутренняя, снаружи — внешняя
        assert_eq!(chain.lookup(inner, "x").unwrap(), 2);
        assert_eq!(chain.lookup(root, "x").unwrap(), 1);
    }

    #[test]
    fn test_duplicate_in_same_scope_is_rejected() {
        let mut chain = ScopeChain::new();
        let root = chain.root();
        chain.declare(root, "x", 1).unwrap();

        match chain.declare(root, "x", 2) {
            Err(CompileError::DuplicateDeclaration(name)) => assert_eq!(name, "x"),
            other => panic!("Expected DuplicateDeclaration, got {:?}", other),
        }
    }

    #[test]
    fn test_loop_and_function_flags() {
        let mut chain = ScopeChain::new();
        let root = chain.root();
        assert!(!chain.in_loop(root));
        assert!(chain.function(root).is_none());

        let loop_body = chain.push_loop_body(root);
        assert!(chain.in_loop(loop_body));

        // Обычный потомок цикла наследует in_loop
        let branch = chain.push_child(loop_body);
        assert!(chain.in_loop(branch));

        // Тело функции сбрасывает in_loop даже внутри цикла
        let fn_body = chain.push_function_body(loop_body, 7);
        assert!(!chain.in_loop(fn_body));
        assert_eq!(chain.function(fn_body), Some(7));
    }
}
