//! Определения ошибок для Pyrite.

use thiserror::Error;

/// Основной тип `Result` для библиотеки.
pub type CompileResult<T> = Result<T, CompileError>;

/// Перечисление всех возможных ошибок компиляции.
///
/// Анализ работает в режиме fail-fast: первый нарушенный инвариант
/// прерывает весь проход.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    /// Обязательный параметр идёт после необязательного.
    #[error("Required parameter '{parameter}' follows an optional parameter in function '{function}'")]
    ParameterOrder { function: String, parameter: String },

    /// Имя уже объявлено в этой же области видимости.
    #[error("Duplicate declaration of '{0}' in the same scope")]
    DuplicateDeclaration(String),

    /// Ссылка на имя, не объявленное ни в одной охватывающей области.
    #[error("Unknown identifier: {0}")]
    UndeclaredIdentifier(String),

    /// Количество целей присваивания не совпадает с количеством значений.
    #[error("Assignment count mismatch: {targets} target(s) but {sources} value(s)")]
    ArityMismatch { targets: usize, sources: usize },

    /// `break` вне цикла.
    #[error("'break' can only appear inside a loop")]
    IllegalBreak,

    /// `return` вне функции.
    #[error("'return' can only appear inside a function")]
    IllegalReturn,

    /// Аргументы вызова не привязываются к списку параметров.
    #[error("Cannot bind arguments in call to '{callee}': {detail}")]
    CallBinding { callee: String, detail: String },

    /// Внутренняя ошибка (например, паника потока компиляции).
    #[error("Internal error: {0}")]
    Internal(String),
}
