//! Compiler and validator for jSchema, a JSON superset where example values
//! carry their rules in comments:
//!
//! ```text
//! {
//!     "id": 123, // {min: 1}
//!     "email": "me@example.com", // {type: "email", optional: true}
//!     "pet": @Cat | @Dog
//! }
//! ```
pub mod ast;
mod checker;
pub mod constraint;
pub mod error;
pub mod json_type;
pub mod jschema;
pub mod lexeme;
pub mod loader;
pub mod node;
pub mod number;
pub mod scanner;
pub mod schema;
pub mod source;
mod validator;
pub mod value;

pub use ast::{AstNode, RuleAstNode};
pub use error::{DocumentError, Error, ErrorCode, Result};
pub use jschema::JSchema;
pub use number::Number;
pub use schema::Rule;
