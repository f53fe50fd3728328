//! SQL utilities.

use std::fmt;

use crate::utils::escape::QuoteStr;

/// Product mode selects which spelling of type names is produced.
///
/// `Internal` is the engine's own dialect (`DOUBLE`, `FLOAT`), `External` is the
/// public dialect (`FLOAT64`, `FLOAT32`). Every other type name is shared.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum ProductMode {
	#[default]
	Internal,
	External,
}

impl fmt::Display for ProductMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Internal => f.write_str("PRODUCT_INTERNAL"),
			Self::External => f.write_str("PRODUCT_EXTERNAL"),
		}
	}
}

/// Trait for types that can be converted to SQL representation.
///
/// There's an important distinction between this trait and `Display`.
/// `Display` should be used for human-readable output, it does not particularly
/// need to be SQL compatible but it may happen to be.
/// `ToSql` should be used for SQL compatible output in a given product mode.
pub trait ToSql {
	/// Convert the type to a SQL string in the internal product mode.
	fn to_sql(&self) -> String {
		self.to_sql_in(ProductMode::Internal)
	}

	/// Convert the type to a SQL string in the given product mode.
	fn to_sql_in(&self, mode: ProductMode) -> String {
		let mut f = String::new();
		self.fmt_sql(&mut f, mode);
		f
	}

	/// Format the type to a SQL string.
	fn fmt_sql(&self, f: &mut String, mode: ProductMode);
}

/// Formats a slice of items that implement ToSql with comma separation.
pub fn fmt_sql_comma_separated<T: ToSql>(items: &[T], f: &mut String, mode: ProductMode) {
	for (i, item) in items.iter().enumerate() {
		if i > 0 {
			f.push_str(", ");
		}
		item.fmt_sql(f, mode);
	}
}

/// Macro for writing to a SQL string.
///
/// This will panic if the write fails but the expectation is that it is only used in ToSql
/// implementations which operate on a `&mut String`. `write!` cannot fail when writing to a
/// `String`.
#[macro_export]
macro_rules! write_sql {
	($f:expr, $($tt:tt)*) => {{
		use std::fmt::Write;
		let __f: &mut String = $f;
		write!(__f, $($tt)*).expect("Write cannot fail when writing to a String")
	}}
}

impl ToSql for String {
	fn fmt_sql(&self, f: &mut String, _mode: ProductMode) {
		write_sql!(f, "{}", QuoteStr(self))
	}
}

impl ToSql for &str {
	fn fmt_sql(&self, f: &mut String, _mode: ProductMode) {
		write_sql!(f, "{}", QuoteStr(self))
	}
}

impl ToSql for bool {
	fn fmt_sql(&self, f: &mut String, _mode: ProductMode) {
		f.push_str(if *self {
			"true"
		} else {
			"false"
		})
	}
}

impl ToSql for i64 {
	fn fmt_sql(&self, f: &mut String, _mode: ProductMode) {
		write_sql!(f, "{}", self)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn comma_separated() {
		let mut f = String::new();
		fmt_sql_comma_separated(&["a", "b\"c"], &mut f, ProductMode::External);
		assert_eq!(f, "\"a\", \"b\\\"c\"");
	}

	#[test]
	fn scalars() {
		assert_eq!(true.to_sql(), "true");
		assert_eq!((-4_i64).to_sql(), "-4");
		assert_eq!(String::from("x").to_sql_in(ProductMode::External), "\"x\"");
	}
}
