use std::fmt;
use std::sync::{Arc, LazyLock};

use revision::revisioned;
use serde::{Deserialize, Serialize};
use sqlsig_types::{ProductMode, Value};

use crate::sig::relation::RelationSchema;

/// How many times an argument may appear in a call.
#[revisioned(revision = 1)]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Cardinality {
	#[default]
	Required,
	Optional,
	Repeated,
}

impl fmt::Display for Cardinality {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Required => f.write_str("REQUIRED"),
			Self::Optional => f.write_str("OPTIONAL"),
			Self::Repeated => f.write_str("REPEATED"),
		}
	}
}

/// The direction of a procedure argument.
#[revisioned(revision = 1)]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ProcedureArgumentMode {
	#[default]
	NotSet,
	In,
	Out,
	InOut,
}

impl fmt::Display for ProcedureArgumentMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::NotSet => Ok(()),
			Self::In => f.write_str("IN"),
			Self::Out => f.write_str("OUT"),
			Self::InOut => f.write_str("INOUT"),
		}
	}
}

/// How a named argument may be passed.
#[revisioned(revision = 1)]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum NamedArgumentKind {
	PositionalOnly,
	#[default]
	PositionalOrNamed,
	NamedOnly,
}

/// Whether an argument takes part in collation resolution.
#[revisioned(revision = 1)]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ArgumentCollationMode {
	AffectsNone,
	AffectsOperation,
	AffectsPropagation,
	#[default]
	AffectsOperationAndPropagation,
}

#[revisioned(revision = 1)]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ArgumentAliasKind {
	#[default]
	NonAliased,
	Aliased,
}

impl fmt::Display for ArgumentAliasKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::NonAliased => f.write_str("ARGUMENT_NON_ALIASED"),
			Self::Aliased => f.write_str("ARGUMENT_ALIASED"),
		}
	}
}

/// A source range, kept for diagnostics only.
#[revisioned(revision = 1)]
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ParseLocationRange {
	pub filename: String,
	pub start: u32,
	pub end: u32,
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ArgumentName {
	pub name: String,
	pub kind: NamedArgumentKind,
}

/// Checks the analyzer applies to the expression passed for an argument.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct ArgumentConstraints {
	pub must_be_constant: bool,
	pub must_be_constant_expression: bool,
	pub must_be_non_null: bool,
	pub is_not_aggregate: bool,
	pub must_support_equality: bool,
	pub must_support_ordering: bool,
	pub must_support_grouping: bool,
	pub array_element_must_support_ordering: bool,
	pub array_element_must_support_equality: bool,
	pub array_element_must_support_grouping: bool,
}

/// The options of one argument or result position.
///
/// Options are immutable once attached to an [`ArgumentType`](crate::ArgumentType)
/// and are shared through an `Arc`, so many declared signatures can reuse the
/// same record.
#[derive(Clone, Debug, PartialEq)]
pub struct ArgumentOptions {
	pub cardinality: Cardinality,
	pub procedure_mode: ProcedureArgumentMode,
	pub constraints: ArgumentConstraints,
	/// Inclusive lower bound for a constant argument.
	pub min_value: Option<i64>,
	/// Inclusive upper bound for a constant argument.
	pub max_value: Option<i64>,
	/// The required columns of a table argument or result.
	pub relation_schema: Option<Arc<RelationSchema>>,
	pub extra_relation_columns_allowed: bool,
	/// Index of the table argument a descriptor resolves its column names against.
	pub descriptor_table_offset: Option<i32>,
	pub default: Option<Value>,
	pub name: Option<ArgumentName>,
	pub name_location: Option<ParseLocationRange>,
	pub type_location: Option<ParseLocationRange>,
	pub collation_mode: ArgumentCollationMode,
	pub uses_array_element_for_collation: bool,
	pub alias_kind: ArgumentAliasKind,
}

impl Default for ArgumentOptions {
	fn default() -> Self {
		Self {
			cardinality: Cardinality::Required,
			procedure_mode: ProcedureArgumentMode::NotSet,
			constraints: ArgumentConstraints::default(),
			min_value: None,
			max_value: None,
			relation_schema: None,
			extra_relation_columns_allowed: true,
			descriptor_table_offset: None,
			default: None,
			name: None,
			name_location: None,
			type_location: None,
			collation_mode: ArgumentCollationMode::default(),
			uses_array_element_for_collation: false,
			alias_kind: ArgumentAliasKind::NonAliased,
		}
	}
}

static SIMPLE_REQUIRED: LazyLock<Arc<ArgumentOptions>> =
	LazyLock::new(|| Arc::new(ArgumentOptions::new(Cardinality::Required)));
static SIMPLE_OPTIONAL: LazyLock<Arc<ArgumentOptions>> =
	LazyLock::new(|| Arc::new(ArgumentOptions::new(Cardinality::Optional)));
static SIMPLE_REPEATED: LazyLock<Arc<ArgumentOptions>> =
	LazyLock::new(|| Arc::new(ArgumentOptions::new(Cardinality::Repeated)));

impl ArgumentOptions {
	pub fn new(cardinality: Cardinality) -> Self {
		Self {
			cardinality,
			..Default::default()
		}
	}

	/// The shared options with only a cardinality set.
	pub fn simple(cardinality: Cardinality) -> Arc<ArgumentOptions> {
		match cardinality {
			Cardinality::Required => SIMPLE_REQUIRED.clone(),
			Cardinality::Optional => SIMPLE_OPTIONAL.clone(),
			Cardinality::Repeated => SIMPLE_REPEATED.clone(),
		}
	}

	/// True when nothing but the cardinality differs from the defaults.
	pub fn is_simple(&self) -> bool {
		*self == Self::new(self.cardinality)
	}

	pub fn with_name(mut self, name: impl Into<String>, kind: NamedArgumentKind) -> Self {
		self.name = Some(ArgumentName {
			name: name.into(),
			kind,
		});
		self
	}

	pub fn with_default(mut self, value: Value) -> Self {
		self.default = Some(value);
		self
	}

	pub fn with_constraints(mut self, constraints: ArgumentConstraints) -> Self {
		self.constraints = constraints;
		self
	}

	pub fn with_relation_schema(mut self, schema: RelationSchema, extra_columns: bool) -> Self {
		self.relation_schema = Some(Arc::new(schema));
		self.extra_relation_columns_allowed = extra_columns;
		self
	}

	pub fn with_descriptor_table_offset(mut self, offset: i32) -> Self {
		self.descriptor_table_offset = Some(offset);
		self
	}

	pub fn with_procedure_mode(mut self, mode: ProcedureArgumentMode) -> Self {
		self.procedure_mode = mode;
		self
	}

	pub fn with_bounds(mut self, min: Option<i64>, max: Option<i64>) -> Self {
		self.min_value = min;
		self.max_value = max;
		self
	}

	pub fn with_alias_kind(mut self, kind: ArgumentAliasKind) -> Self {
		self.alias_kind = kind;
		self
	}

	pub fn with_collation(mut self, mode: ArgumentCollationMode, uses_array_element: bool) -> Self {
		self.collation_mode = mode;
		self.uses_array_element_for_collation = uses_array_element;
		self
	}

	pub fn with_locations(
		mut self,
		name: Option<ParseLocationRange>,
		ty: Option<ParseLocationRange>,
	) -> Self {
		self.name_location = name;
		self.type_location = ty;
		self
	}

	pub fn required(&self) -> bool {
		self.cardinality == Cardinality::Required
	}

	pub fn optional(&self) -> bool {
		self.cardinality == Cardinality::Optional
	}

	pub fn repeated(&self) -> bool {
		self.cardinality == Cardinality::Repeated
	}

	pub fn has_default(&self) -> bool {
		self.default.is_some()
	}

	pub fn argument_name(&self) -> Option<&str> {
		self.name.as_ref().map(|n| n.name.as_str())
	}

	pub fn named_argument_kind(&self) -> Option<NamedArgumentKind> {
		self.name.as_ref().map(|n| n.kind)
	}

	/// True when the argument can be passed by name.
	pub fn is_named(&self) -> bool {
		matches!(
			self.named_argument_kind(),
			Some(NamedArgumentKind::NamedOnly | NamedArgumentKind::PositionalOrNamed)
		)
	}

	/// The verbose options block of an argument debug string, or an empty string.
	pub fn debug_string(&self) -> String {
		let c = &self.constraints;
		let mut parts = Vec::new();
		if c.must_be_constant {
			parts.push("must_be_constant: true".to_string());
		}
		if c.must_be_constant_expression {
			parts.push("must_be_constant_expression: true".to_string());
		}
		if c.must_be_non_null {
			parts.push("must_be_non_null: true".to_string());
		}
		if let Some(v) = &self.default {
			parts.push(format!("default_value: {v}"));
		}
		if c.is_not_aggregate {
			parts.push("is_not_aggregate: true".to_string());
		}
		if self.procedure_mode != ProcedureArgumentMode::NotSet {
			parts.push(format!("procedure_argument_mode: {}", self.procedure_mode));
		}
		if self.alias_kind == ArgumentAliasKind::Aliased {
			parts.push(format!("argument_alias_kind: {}", self.alias_kind));
		}
		if parts.is_empty() {
			return String::new();
		}
		format!(" {{{}}}", parts.join(", "))
	}

	/// The trailing options of an argument in a function declaration, or an empty string.
	pub fn sql_declaration(&self, mode: ProductMode) -> String {
		let c = &self.constraints;
		let mut out = String::new();
		if c.must_be_constant {
			out.push_str(" /*must_be_constant*/");
		}
		if c.must_be_constant_expression {
			out.push_str(" /*must_be_constant_expression*/");
		}
		if c.must_be_non_null {
			out.push_str(" /*must_be_non_null*/");
		}
		if let Some(v) = &self.default {
			out.push_str(" DEFAULT ");
			out.push_str(&v.sql_literal(mode));
		}
		if c.is_not_aggregate {
			out.push_str(" NOT AGGREGATE");
		}
		out
	}
}
