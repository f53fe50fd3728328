//! The type and value universe consumed by the signature model.
//!
//! Types are plain, structurally comparable handles. Values are typed literals
//! with a type-less persisted form, [`ValueRecord`], which is read back against
//! a known [`Type`].

pub mod sql;
pub mod utils;

mod err;
mod ty;
mod value;

pub use self::err::Error;
pub use self::sql::{ProductMode, ToSql};
pub use self::ty::{StructField, Type};
pub use self::value::{Value, ValueRecord};
