use thiserror::Error;

/// An error raised when building or decoding values.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[non_exhaustive]
pub enum Error {
	/// The invalid value marker was used where a real value is required.
	#[error("An invalid value cannot be persisted")]
	InvalidValue,

	#[error("Expected a value of type {expected} but found {found}")]
	TypeMismatch {
		expected: String,
		found: String,
	},

	#[error("Expected {expected} struct fields but found {found}")]
	FieldCount {
		expected: usize,
		found: usize,
	},

	#[error("Values of type {0} are not supported")]
	UnsupportedType(String),
}
