//! Function signatures: argument kinds, argument options and validated signatures.

pub mod argument;
pub mod kind;
pub mod options;
pub mod record;
pub mod relation;
pub mod signature;
pub mod signature_options;

pub use self::argument::{ArgumentType, LambdaPayload, NamePrintingStyle, UNINSTANTIATED};
pub use self::kind::{Binding, Kind, Slot};
pub use self::options::{
	ArgumentAliasKind, ArgumentCollationMode, ArgumentConstraints, ArgumentName, ArgumentOptions,
	Cardinality, NamedArgumentKind, ParseLocationRange, ProcedureArgumentMode,
};
pub use self::record::{
	ArgumentOptionsRecord, ArgumentTypeRecord, LambdaRecord, SignatureOptionsRecord,
	SignatureRecord,
};
pub use self::relation::{RelationColumn, RelationSchema};
pub use self::signature::{Signature, SignatureBuilder};
pub use self::signature_options::{ConstraintCallback, RewriteOptions, SignatureOptions};
