use std::collections::HashSet;
use std::fmt;

use revision::revisioned;
use serde::{Deserialize, Serialize};
use sqlsig_types::utils::escape::EscapeIdent;
use sqlsig_types::{ProductMode, Type};
use unicase::UniCase;

/// A column of a table argument or table result.
#[revisioned(revision = 1)]
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct RelationColumn {
	pub name: String,
	pub ty: Type,
}

impl RelationColumn {
	pub fn new(name: impl Into<String>, ty: Type) -> Self {
		Self {
			name: name.into(),
			ty,
		}
	}
}

/// The fixed column layout of a table argument or table-valued function result.
#[revisioned(revision = 1)]
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct RelationSchema {
	pub columns: Vec<RelationColumn>,
	/// A value table has one anonymous column holding the whole row.
	pub is_value_table: bool,
}

impl RelationSchema {
	pub fn new(columns: Vec<RelationColumn>) -> Self {
		Self {
			columns,
			is_value_table: false,
		}
	}

	pub fn value_table(ty: Type) -> Self {
		Self {
			columns: vec![RelationColumn::new("", ty)],
			is_value_table: true,
		}
	}

	/// Returns the first column name that appears more than once, ignoring case.
	pub fn duplicate_column(&self) -> Option<&str> {
		let mut seen = HashSet::new();
		self.columns
			.iter()
			.filter(|c| !c.name.is_empty())
			.find(|c| !seen.insert(UniCase::new(c.name.as_str())))
			.map(|c| c.name.as_str())
	}

	pub fn debug_string(&self) -> String {
		self.to_string()
	}

	/// The schema as it appears in a function declaration, `TABLE<a INT64>`.
	pub fn sql_declaration(&self, mode: ProductMode) -> String {
		let columns = self
			.columns
			.iter()
			.map(|c| {
				if self.is_value_table || c.name.is_empty() {
					c.ty.type_name(mode)
				} else {
					format!("{} {}", EscapeIdent(&c.name), c.ty.type_name(mode))
				}
			})
			.collect::<Vec<_>>();
		format!("TABLE<{}>", columns.join(", "))
	}
}

impl fmt::Display for RelationSchema {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("TABLE<")?;
		for (i, c) in self.columns.iter().enumerate() {
			if i > 0 {
				f.write_str(", ")?;
			}
			if self.is_value_table || c.name.is_empty() {
				write!(f, "{}", c.ty)?;
			} else {
				write!(f, "{} {}", c.name, c.ty)?;
			}
		}
		f.write_str(">")
	}
}
