use revision::Error as RevisionError;
use sqlsig_types::Error as TypesError;
use thiserror::Error;

/// An error raised while declaring, validating or loading a function signature.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
	/// A signature or argument broke one of the structural rules
	#[error("{0}")]
	InvalidSignature(String),

	/// A function-type argument uses a shape that is not supported
	#[error("Unimplemented functionality: {0}")]
	Unimplemented(String),

	/// The calling engine code used the model incorrectly
	#[error("Internal error: {0}")]
	Internal(String),

	/// A persisted signature record could not be loaded
	#[error("Unable to decode the signature record: {0}")]
	Deserialize(String),

	/// Represents an underlying error with versioned data encoding / decoding
	#[error("Versioned error: {0}")]
	Revision(#[from] RevisionError),

	/// A value or type in the record was not usable
	#[error("Invalid value: {0}")]
	Value(#[from] TypesError),
}

impl Error {
	/// Check if this error reports a structural signature violation
	pub fn is_invalid_signature(&self) -> bool {
		matches!(self, Error::InvalidSignature(_))
	}
}

impl From<Error> for String {
	fn from(e: Error) -> String {
		e.to_string()
	}
}
