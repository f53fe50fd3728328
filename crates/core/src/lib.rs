//! # sqlsig core
//!
//! The function signature model of a SQL analyzer. A [`Signature`] lists the
//! arguments and result of one overload of a function. Each position is an
//! [`ArgumentType`]: either a fixed [`Type`](sqlsig_types::Type) or a templated
//! [`Kind`] that is bound when a call is resolved, together with shared
//! [`ArgumentOptions`].
//!
//! Signatures are validated when built and are immutable afterwards, so they
//! can be shared freely between threads.

#[macro_use]
extern crate tracing;

#[macro_use]
mod mac;

pub mod cnf;
pub mod err;
pub mod lang;
pub mod sig;

pub use self::err::Error;
pub use self::lang::{LanguageFeature, LanguageOptions};
pub use self::sig::{
	ArgumentOptions, ArgumentType, Cardinality, Kind, NamePrintingStyle, Signature,
	SignatureOptions, Slot,
};
