use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SwizzleError {
    #[error("class id {0} does not denote a defined class")]
    UndefinedClass(usize),

    #[error("class '{0}' is already defined")]
    DuplicateClass(String),

    #[error("selector '{selector}' has no implementation reachable from class '{class}'")]
    UnresolvedSelector { class: String, selector: String },

    #[error("selector '{selector}' is unbound on class '{class}' and its ancestors")]
    UnboundSelector { class: String, selector: String },

    #[error("origin and replacement both name selector '{0}'; nothing to exchange")]
    IdenticalSelectors(String),

    #[error("fallback selector '{selector}' is already bound directly on class '{class}'")]
    SelectorCollision { class: String, selector: String },

    #[error("fallback selector '{0}' must be distinct from the selectors being exchanged")]
    AliasedFallback(String),

    #[error("selector id {0} was not interned by this runtime")]
    ForeignSelector(u32),
}

pub type Result<T> = std::result::Result<T, SwizzleError>;
