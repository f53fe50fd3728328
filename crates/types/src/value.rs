use std::fmt;

use chrono::NaiveDate;
use revision::revisioned;
use serde::{Deserialize, Serialize};

use crate::err::Error;
use crate::sql::{ProductMode, ToSql};
use crate::ty::{StructField, Type};
use crate::utils::escape::{QuoteBytes, QuoteStr};
use crate::write_sql;

/// Days between 0001-01-01 and 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// A typed literal value.
///
/// `Invalid` is the marker for a value that was never set. It has no type and
/// cannot be persisted.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
	#[default]
	Invalid,
	Null(Type),
	Bool(bool),
	Int32(i32),
	Int64(i64),
	Uint32(u32),
	Uint64(u64),
	Float(f32),
	Double(f64),
	String(String),
	Bytes(Vec<u8>),
	/// Days since the unix epoch.
	Date(i32),
	/// Elements of the given element type.
	Array(Type, Vec<Value>),
	/// Field values of the given struct fields, in field order.
	Struct(Vec<StructField>, Vec<Value>),
}

impl Value {
	/// Builds an array value, checking that every element has the element type.
	pub fn array(element: Type, values: Vec<Value>) -> Result<Self, Error> {
		for v in &values {
			match v.ty() {
				Some(t) if t == element => {}
				found => {
					return Err(Error::TypeMismatch {
						expected: element.to_string(),
						found: found.map(|t| t.to_string()).unwrap_or_else(|| "INVALID".into()),
					});
				}
			}
		}
		Ok(Self::Array(element, values))
	}

	/// Builds a struct value, checking arity and field types.
	pub fn structure(fields: Vec<StructField>, values: Vec<Value>) -> Result<Self, Error> {
		if fields.len() != values.len() {
			return Err(Error::FieldCount {
				expected: fields.len(),
				found: values.len(),
			});
		}
		for (field, v) in fields.iter().zip(&values) {
			if v.ty().as_ref() != Some(&field.ty) {
				return Err(Error::TypeMismatch {
					expected: field.ty.to_string(),
					found: v.ty().map(|t| t.to_string()).unwrap_or_else(|| "INVALID".into()),
				});
			}
		}
		Ok(Self::Struct(fields, values))
	}

	/// The type of this value, or `None` for the invalid marker.
	pub fn ty(&self) -> Option<Type> {
		Some(match self {
			Self::Invalid => return None,
			Self::Null(t) => t.clone(),
			Self::Bool(_) => Type::Bool,
			Self::Int32(_) => Type::Int32,
			Self::Int64(_) => Type::Int64,
			Self::Uint32(_) => Type::Uint32,
			Self::Uint64(_) => Type::Uint64,
			Self::Float(_) => Type::Float,
			Self::Double(_) => Type::Double,
			Self::String(_) => Type::String,
			Self::Bytes(_) => Type::Bytes,
			Self::Date(_) => Type::Date,
			Self::Array(t, _) => Type::array(t.clone()),
			Self::Struct(fields, _) => Type::Struct(fields.clone()),
		})
	}

	pub fn is_valid(&self) -> bool {
		!matches!(self, Self::Invalid)
	}

	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null(_))
	}

	/// The SQL literal for this value in the given product mode.
	pub fn sql_literal(&self, mode: ProductMode) -> String {
		self.to_sql_in(mode)
	}

	/// Converts this value into its type-less persisted form.
	pub fn to_record(&self) -> Result<ValueRecord, Error> {
		Ok(match self {
			Self::Invalid => return Err(Error::InvalidValue),
			Self::Null(_) => ValueRecord::Null,
			Self::Bool(v) => ValueRecord::Bool(*v),
			Self::Int32(v) => ValueRecord::Int32(*v),
			Self::Int64(v) => ValueRecord::Int64(*v),
			Self::Uint32(v) => ValueRecord::Uint32(*v),
			Self::Uint64(v) => ValueRecord::Uint64(*v),
			Self::Float(v) => ValueRecord::Float(*v),
			Self::Double(v) => ValueRecord::Double(*v),
			Self::String(v) => ValueRecord::String(v.clone()),
			Self::Bytes(v) => ValueRecord::Bytes(v.clone()),
			Self::Date(v) => ValueRecord::Date(*v),
			Self::Array(_, values) => {
				ValueRecord::Array(values.iter().map(Value::to_record).collect::<Result<_, _>>()?)
			}
			Self::Struct(_, values) => {
				ValueRecord::Struct(values.iter().map(Value::to_record).collect::<Result<_, _>>()?)
			}
		})
	}

	/// Rebuilds a value from its persisted form, interpreting it as the given type.
	pub fn from_record(record: &ValueRecord, ty: &Type) -> Result<Self, Error> {
		let mismatch = || Error::TypeMismatch {
			expected: ty.to_string(),
			found: record.kind_name().to_string(),
		};
		Ok(match (record, ty) {
			(ValueRecord::Null, _) => Self::Null(ty.clone()),
			(ValueRecord::Bool(v), Type::Bool) => Self::Bool(*v),
			(ValueRecord::Int32(v), Type::Int32) => Self::Int32(*v),
			(ValueRecord::Int64(v), Type::Int64) => Self::Int64(*v),
			(ValueRecord::Uint32(v), Type::Uint32) => Self::Uint32(*v),
			(ValueRecord::Uint64(v), Type::Uint64) => Self::Uint64(*v),
			(ValueRecord::Float(v), Type::Float) => Self::Float(*v),
			(ValueRecord::Double(v), Type::Double) => Self::Double(*v),
			(ValueRecord::String(v), Type::String) => Self::String(v.clone()),
			(ValueRecord::Bytes(v), Type::Bytes) => Self::Bytes(v.clone()),
			(ValueRecord::Date(v), Type::Date) => Self::Date(*v),
			(ValueRecord::Array(values), Type::Array(element)) => Self::Array(
				(**element).clone(),
				values.iter().map(|v| Self::from_record(v, element)).collect::<Result<_, _>>()?,
			),
			(ValueRecord::Struct(values), Type::Struct(fields)) => {
				if values.len() != fields.len() {
					return Err(Error::FieldCount {
						expected: fields.len(),
						found: values.len(),
					});
				}
				Self::Struct(
					fields.clone(),
					values
						.iter()
						.zip(fields)
						.map(|(v, field)| Self::from_record(v, &field.ty))
						.collect::<Result<_, _>>()?,
				)
			}
			(_, t) if !t.is_simple() && !t.is_array() && !t.is_struct() => {
				return Err(Error::UnsupportedType(t.to_string()));
			}
			_ => return Err(mismatch()),
		})
	}
}

fn fmt_non_finite(f: &mut String, v: f64, mode: ProductMode, ty: &Type) {
	let text = if v.is_nan() {
		"nan"
	} else if v > 0.0 {
		"inf"
	} else {
		"-inf"
	};
	write_sql!(f, "CAST({} AS {})", QuoteStr(text), ty.type_name(mode));
}

impl ToSql for Value {
	fn fmt_sql(&self, f: &mut String, mode: ProductMode) {
		match self {
			Self::Invalid => f.push_str("<invalid>"),
			Self::Null(_) => f.push_str("NULL"),
			Self::Bool(v) => v.fmt_sql(f, mode),
			Self::Int32(v) => write_sql!(f, "{v}"),
			Self::Int64(v) => write_sql!(f, "{v}"),
			Self::Uint32(v) => write_sql!(f, "{v}"),
			Self::Uint64(v) => write_sql!(f, "{v}"),
			Self::Float(v) if v.is_finite() => write_sql!(f, "{v:?}"),
			Self::Double(v) if v.is_finite() => write_sql!(f, "{v:?}"),
			Self::Float(v) => fmt_non_finite(f, f64::from(*v), mode, &Type::Float),
			Self::Double(v) => fmt_non_finite(f, *v, mode, &Type::Double),
			Self::String(v) => write_sql!(f, "{}", QuoteStr(v)),
			Self::Bytes(v) => write_sql!(f, "{}", QuoteBytes(v)),
			Self::Date(days) => match days
				.checked_add(UNIX_EPOCH_DAYS_FROM_CE)
				.and_then(NaiveDate::from_num_days_from_ce_opt)
			{
				Some(d) => write_sql!(f, "DATE {}", QuoteStr(&d.format("%Y-%m-%d").to_string())),
				None => write_sql!(f, "DATE_FROM_UNIX_DATE({days})"),
			},
			Self::Array(_, values) => {
				f.push('[');
				crate::sql::fmt_sql_comma_separated(values, f, mode);
				f.push(']');
			}
			Self::Struct(_, values) => {
				f.push('(');
				crate::sql::fmt_sql_comma_separated(values, f, mode);
				f.push(')');
			}
		}
	}
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.to_sql())
	}
}

/// The type-less persisted form of a [`Value`].
///
/// The type needed to read it back is stored alongside it by the owner of the
/// record.
#[revisioned(revision = 1)]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ValueRecord {
	Null,
	Bool(bool),
	Int32(i32),
	Int64(i64),
	Uint32(u32),
	Uint64(u64),
	Float(f32),
	Double(f64),
	String(String),
	Bytes(Vec<u8>),
	Date(i32),
	Array(Vec<ValueRecord>),
	Struct(Vec<ValueRecord>),
}

impl ValueRecord {
	fn kind_name(&self) -> &'static str {
		match self {
			Self::Null => "NULL",
			Self::Bool(_) => "BOOL",
			Self::Int32(_) => "INT32",
			Self::Int64(_) => "INT64",
			Self::Uint32(_) => "UINT32",
			Self::Uint64(_) => "UINT64",
			Self::Float(_) => "FLOAT",
			Self::Double(_) => "DOUBLE",
			Self::String(_) => "STRING",
			Self::Bytes(_) => "BYTES",
			Self::Date(_) => "DATE",
			Self::Array(_) => "ARRAY",
			Self::Struct(_) => "STRUCT",
		}
	}
}
