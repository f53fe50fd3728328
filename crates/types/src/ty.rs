use std::fmt;

use revision::revisioned;
use serde::{Deserialize, Serialize};

use crate::sql::{ProductMode, ToSql};
use crate::utils::display::format_separated;
use crate::utils::escape::EscapeIdent;
use crate::write_sql;

/// A concrete SQL type.
///
/// Types compare structurally: two `ARRAY<INT64>` handles are equal regardless of
/// where they were built.
#[revisioned(revision = 1)]
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Type {
	Bool,
	Int32,
	Int64,
	Uint32,
	Uint64,
	Float,
	Double,
	Numeric,
	String,
	Bytes,
	Date,
	Timestamp,
	Interval,
	Json,
	Array(Box<Type>),
	Struct(Vec<StructField>),
	/// An enum type, by fully qualified name.
	Enum(String),
	/// A protocol buffer message type, by fully qualified name.
	Proto(String),
	Map(Box<Type>, Box<Type>),
	Range(Box<Type>),
}

/// A named field of a struct type. Anonymous fields have an empty name.
#[revisioned(revision = 1)]
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct StructField {
	pub name: String,
	pub ty: Type,
}

impl StructField {
	pub fn new(name: impl Into<String>, ty: Type) -> Self {
		Self {
			name: name.into(),
			ty,
		}
	}
}

impl Type {
	pub fn array(element: Type) -> Self {
		Self::Array(Box::new(element))
	}

	pub fn map(key: Type, value: Type) -> Self {
		Self::Map(Box::new(key), Box::new(value))
	}

	pub fn range(element: Type) -> Self {
		Self::Range(Box::new(element))
	}

	pub fn is_array(&self) -> bool {
		matches!(self, Self::Array(_))
	}

	pub fn is_struct(&self) -> bool {
		matches!(self, Self::Struct(_))
	}

	pub fn is_proto(&self) -> bool {
		matches!(self, Self::Proto(_))
	}

	pub fn is_enum(&self) -> bool {
		matches!(self, Self::Enum(_))
	}

	pub fn is_map(&self) -> bool {
		matches!(self, Self::Map(..))
	}

	pub fn is_range(&self) -> bool {
		matches!(self, Self::Range(_))
	}

	pub fn is_simple(&self) -> bool {
		!matches!(
			self,
			Self::Array(_)
				| Self::Struct(_) | Self::Enum(_)
				| Self::Proto(_) | Self::Map(..)
				| Self::Range(_)
		)
	}

	/// Returns the element type of an array or range type.
	pub fn element(&self) -> Option<&Type> {
		match self {
			Self::Array(t) | Self::Range(t) => Some(t),
			_ => None,
		}
	}

	fn simple_name(&self, mode: ProductMode) -> &'static str {
		match (self, mode) {
			(Self::Bool, _) => "BOOL",
			(Self::Int32, _) => "INT32",
			(Self::Int64, _) => "INT64",
			(Self::Uint32, _) => "UINT32",
			(Self::Uint64, _) => "UINT64",
			(Self::Float, ProductMode::Internal) => "FLOAT",
			(Self::Float, ProductMode::External) => "FLOAT32",
			(Self::Double, ProductMode::Internal) => "DOUBLE",
			(Self::Double, ProductMode::External) => "FLOAT64",
			(Self::Numeric, _) => "NUMERIC",
			(Self::String, _) => "STRING",
			(Self::Bytes, _) => "BYTES",
			(Self::Date, _) => "DATE",
			(Self::Timestamp, _) => "TIMESTAMP",
			(Self::Interval, _) => "INTERVAL",
			(Self::Json, _) => "JSON",
			(Self::Array(_), _) => "ARRAY",
			(Self::Struct(_), _) => "STRUCT",
			(Self::Enum(_), _) => "ENUM",
			(Self::Proto(_), _) => "PROTO",
			(Self::Map(..), _) => "MAP",
			(Self::Range(_), _) => "RANGE",
		}
	}

	/// The SQL spelling of this type, usable in a declaration.
	pub fn type_name(&self, mode: ProductMode) -> String {
		self.to_sql_in(mode)
	}

	/// The short spelling of this type used in user-facing signature text.
	///
	/// Enum and proto types are named by the last segment of their qualified name.
	pub fn short_type_name(&self, mode: ProductMode) -> String {
		match self {
			Self::Enum(name) | Self::Proto(name) => {
				name.rsplit('.').next().unwrap_or(name.as_str()).to_string()
			}
			_ => self.type_name(mode),
		}
	}

	/// The debug spelling of this type.
	pub fn debug_string(&self) -> String {
		self.to_string()
	}
}

impl ToSql for Type {
	fn fmt_sql(&self, f: &mut String, mode: ProductMode) {
		match self {
			Self::Array(t) => {
				f.push_str("ARRAY<");
				t.fmt_sql(f, mode);
				f.push('>');
			}
			Self::Range(t) => {
				f.push_str("RANGE<");
				t.fmt_sql(f, mode);
				f.push('>');
			}
			Self::Map(k, v) => {
				f.push_str("MAP<");
				k.fmt_sql(f, mode);
				f.push_str(", ");
				v.fmt_sql(f, mode);
				f.push('>');
			}
			Self::Struct(fields) => {
				f.push_str("STRUCT<");
				for (i, field) in fields.iter().enumerate() {
					if i > 0 {
						f.push_str(", ");
					}
					if !field.name.is_empty() {
						write_sql!(f, "{} ", EscapeIdent(&field.name));
					}
					field.ty.fmt_sql(f, mode);
				}
				f.push('>');
			}
			Self::Enum(name) | Self::Proto(name) => {
				write_sql!(f, "{}", EscapeIdent(name))
			}
			t => f.push_str(t.simple_name(mode)),
		}
	}
}

impl fmt::Display for StructField {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.name.is_empty() {
			write!(f, "{}", self.ty)
		} else {
			write!(f, "{} {}", self.name, self.ty)
		}
	}
}

impl fmt::Display for Type {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Array(t) => write!(f, "ARRAY<{t}>"),
			Self::Range(t) => write!(f, "RANGE<{t}>"),
			Self::Map(k, v) => write!(f, "MAP<{k}, {v}>"),
			Self::Struct(fields) => write!(f, "STRUCT<{}>", format_separated(fields, ", ")),
			Self::Enum(name) => write!(f, "ENUM<{name}>"),
			Self::Proto(name) => write!(f, "PROTO<{name}>"),
			t => f.write_str(t.simple_name(ProductMode::Internal)),
		}
	}
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::*;

	#[rstest]
	#[case::double_internal(Type::Double, ProductMode::Internal, "DOUBLE")]
	#[case::double_external(Type::Double, ProductMode::External, "FLOAT64")]
	#[case::float_external(Type::Float, ProductMode::External, "FLOAT32")]
	#[case::array(Type::array(Type::Int64), ProductMode::External, "ARRAY<INT64>")]
	#[case::map(Type::map(Type::String, Type::Double), ProductMode::External, "MAP<STRING, FLOAT64>")]
	#[case::structure(
		Type::Struct(vec![StructField::new("a", Type::Int64), StructField::new("", Type::Bool)]),
		ProductMode::Internal,
		"STRUCT<a INT64, BOOL>"
	)]
	#[case::proto(Type::Proto("pkg.Msg".into()), ProductMode::Internal, "`pkg.Msg`")]
	fn type_name(#[case] ty: Type, #[case] mode: ProductMode, #[case] expected: &str) {
		assert_eq!(ty.type_name(mode), expected);
	}

	#[rstest]
	#[case::scalar(Type::Int64, "INT64")]
	#[case::proto(Type::Proto("pkg.Msg".into()), "Msg")]
	#[case::enumeration(Type::Enum("a.b.Color".into()), "Color")]
	fn short_type_name(#[case] ty: Type, #[case] expected: &str) {
		assert_eq!(ty.short_type_name(ProductMode::External), expected);
	}

	#[test]
	fn debug_string() {
		let ty = Type::Struct(vec![StructField::new("x", Type::array(Type::Double))]);
		assert_eq!(ty.debug_string(), "STRUCT<x ARRAY<DOUBLE>>");
		assert_eq!(Type::Proto("pkg.Msg".into()).to_string(), "PROTO<pkg.Msg>");
	}

	#[test]
	fn structural_equality() {
		assert_eq!(Type::array(Type::Int64), Type::array(Type::Int64));
		assert_ne!(Type::array(Type::Int64), Type::array(Type::Int32));
		assert_eq!(Type::array(Type::Int64).element(), Some(&Type::Int64));
	}
}
