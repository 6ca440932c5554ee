//! The DDL subset interpreter: splitting, identifiers, column lists and
//! statement classification.

pub mod columns;
pub mod ident;
pub mod splitter;
pub mod statement;

pub use splitter::split_statements;
pub use statement::{classify, ColumnAction, Statement};
