//! Persisted forms of signatures.
//!
//! Records are plain data. They are stored with `revision` and exchanged as
//! JSON through serde. Fields equal to their in-memory default are left out
//! when encoding and restored when decoding.

use std::sync::Arc;

use anyhow::{Result, bail};
use revision::revisioned;
use serde::{Deserialize, Serialize};
use sqlsig_types::{Type, Value, ValueRecord};

use crate::cnf::{MAX_LAMBDA_DEPTH, MAX_SIGNATURE_ARGUMENTS};
use crate::err::Error;
use crate::lang::LanguageFeature;
use crate::sig::argument::{ArgumentType, UNINSTANTIATED};
use crate::sig::kind::Kind;
use crate::sig::options::{
	ArgumentAliasKind, ArgumentCollationMode, ArgumentConstraints, ArgumentName, ArgumentOptions,
	Cardinality, NamedArgumentKind, ParseLocationRange, ProcedureArgumentMode,
};
use crate::sig::relation::RelationSchema;
use crate::sig::signature::Signature;
use crate::sig::signature_options::{RewriteOptions, SignatureOptions};

#[revisioned(revision = 1)]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArgumentOptionsRecord {
	pub cardinality: Option<Cardinality>,
	pub procedure_argument_mode: Option<ProcedureArgumentMode>,
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
	pub min_value: Option<i64>,
	pub max_value: Option<i64>,
	pub relation_input_schema: Option<RelationSchema>,
	pub extra_relation_input_columns_allowed: Option<bool>,
	pub descriptor_resolution_table_offset: Option<i32>,
	pub default_value: Option<ValueRecord>,
	/// Only set for arguments without a fixed type.
	pub default_value_type: Option<Type>,
	pub argument_name: Option<String>,
	pub named_argument_kind: Option<NamedArgumentKind>,
	pub argument_name_parse_location: Option<ParseLocationRange>,
	pub argument_type_parse_location: Option<ParseLocationRange>,
	pub argument_collation_mode: Option<ArgumentCollationMode>,
	pub uses_array_element_for_collation: bool,
	pub argument_alias_kind: Option<ArgumentAliasKind>,
}

#[revisioned(revision = 1)]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArgumentTypeRecord {
	/// The stable code of the argument kind.
	pub kind: Option<u8>,
	pub num_occurrences: i32,
	pub ty: Option<Type>,
	pub options: ArgumentOptionsRecord,
	pub lambda: Option<LambdaRecord>,
}

impl Default for ArgumentTypeRecord {
	fn default() -> Self {
		Self {
			kind: None,
			num_occurrences: UNINSTANTIATED,
			ty: None,
			options: ArgumentOptionsRecord::default(),
			lambda: None,
		}
	}
}

#[revisioned(revision = 1)]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LambdaRecord {
	pub arguments: Vec<ArgumentTypeRecord>,
	pub body: Box<ArgumentTypeRecord>,
}

#[revisioned(revision = 1)]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignatureOptionsRecord {
	pub is_deprecated: bool,
	pub additional_deprecation_warnings: Vec<String>,
	pub required_language_features: Vec<u32>,
	pub is_aliased_signature: bool,
	pub propagates_collation: Option<bool>,
	pub uses_operation_collation: bool,
	pub rejects_collation: bool,
	pub rewrite_options: Option<RewriteOptions>,
}

#[revisioned(revision = 1)]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignatureRecord {
	pub arguments: Vec<ArgumentTypeRecord>,
	pub result: ArgumentTypeRecord,
	pub options: SignatureOptionsRecord,
	pub context_id: i64,
}

impl ArgumentOptionsRecord {
	fn new(options: &ArgumentOptions, ty: Option<&Type>) -> Result<Self> {
		let c = &options.constraints;
		let default_value = match &options.default {
			Some(v) => Some(v.to_record().map_err(Error::Value)?),
			None => None,
		};
		let default_value_type = match ty {
			Some(_) => None,
			None => options.default.as_ref().and_then(Value::ty),
		};
		Ok(Self {
			cardinality: (options.cardinality != Cardinality::Required).then_some(options.cardinality),
			procedure_argument_mode: (options.procedure_mode != ProcedureArgumentMode::NotSet)
				.then_some(options.procedure_mode),
			must_be_constant: c.must_be_constant,
			must_be_constant_expression: c.must_be_constant_expression,
			must_be_non_null: c.must_be_non_null,
			is_not_aggregate: c.is_not_aggregate,
			must_support_equality: c.must_support_equality,
			must_support_ordering: c.must_support_ordering,
			must_support_grouping: c.must_support_grouping,
			array_element_must_support_ordering: c.array_element_must_support_ordering,
			array_element_must_support_equality: c.array_element_must_support_equality,
			array_element_must_support_grouping: c.array_element_must_support_grouping,
			min_value: options.min_value,
			max_value: options.max_value,
			relation_input_schema: options.relation_schema.as_deref().cloned(),
			extra_relation_input_columns_allowed: (!options.extra_relation_columns_allowed)
				.then_some(false),
			descriptor_resolution_table_offset: options.descriptor_table_offset,
			default_value,
			default_value_type,
			argument_name: options.name.as_ref().map(|n| n.name.clone()),
			named_argument_kind: options
				.named_argument_kind()
				.filter(|k| *k != NamedArgumentKind::PositionalOrNamed),
			argument_name_parse_location: options.name_location.clone(),
			argument_type_parse_location: options.type_location.clone(),
			argument_collation_mode: (options.collation_mode
				!= ArgumentCollationMode::AffectsOperationAndPropagation)
				.then_some(options.collation_mode),
			uses_array_element_for_collation: options.uses_array_element_for_collation,
			argument_alias_kind: (options.alias_kind != ArgumentAliasKind::NonAliased)
				.then_some(options.alias_kind),
		})
	}

	fn decode(&self, ty: Option<&Type>) -> Result<Arc<ArgumentOptions>> {
		let default = match (&self.default_value, ty, &self.default_value_type) {
			(None, _, _) => None,
			(Some(v), Some(ty), None) | (Some(v), None, Some(ty)) => {
				Some(Value::from_record(v, ty).map_err(Error::Value)?)
			}
			(Some(_), Some(_), Some(_)) => bail!(Error::Deserialize(
				"A default value type was stored for an argument with a fixed type".to_string()
			)),
			(Some(_), None, None) => bail!(Error::Deserialize(
				"The default value of a templated argument has no stored type".to_string()
			)),
		};
		let name = match (&self.argument_name, self.named_argument_kind) {
			(Some(name), kind) => Some(ArgumentName {
				name: name.clone(),
				kind: kind.unwrap_or_default(),
			}),
			(None, None) => None,
			(None, Some(kind)) => bail!(Error::Deserialize(format!(
				"A named argument kind ({kind:?}) was stored without an argument name"
			))),
		};
		let options = ArgumentOptions {
			cardinality: self.cardinality.unwrap_or_default(),
			procedure_mode: self.procedure_argument_mode.unwrap_or_default(),
			constraints: ArgumentConstraints {
				must_be_constant: self.must_be_constant,
				must_be_constant_expression: self.must_be_constant_expression,
				must_be_non_null: self.must_be_non_null,
				is_not_aggregate: self.is_not_aggregate,
				must_support_equality: self.must_support_equality,
				must_support_ordering: self.must_support_ordering,
				must_support_grouping: self.must_support_grouping,
				array_element_must_support_ordering: self.array_element_must_support_ordering,
				array_element_must_support_equality: self.array_element_must_support_equality,
				array_element_must_support_grouping: self.array_element_must_support_grouping,
			},
			min_value: self.min_value,
			max_value: self.max_value,
			relation_schema: self.relation_input_schema.clone().map(Arc::new),
			extra_relation_columns_allowed: self.extra_relation_input_columns_allowed.unwrap_or(true),
			descriptor_table_offset: self.descriptor_resolution_table_offset,
			default,
			name,
			name_location: self.argument_name_parse_location.clone(),
			type_location: self.argument_type_parse_location.clone(),
			collation_mode: self.argument_collation_mode.unwrap_or_default(),
			uses_array_element_for_collation: self.uses_array_element_for_collation,
			alias_kind: self.argument_alias_kind.unwrap_or_default(),
		};
		// Reuse the shared singletons for plain options
		if options.is_simple() {
			return Ok(ArgumentOptions::simple(options.cardinality));
		}
		Ok(Arc::new(options))
	}
}

impl ArgumentType {
	pub fn to_record(&self) -> Result<ArgumentTypeRecord> {
		let lambda = match self.lambda_payload() {
			Some(payload) => Some(LambdaRecord {
				arguments: payload
					.arguments
					.iter()
					.map(ArgumentType::to_record)
					.collect::<Result<Vec<_>>>()?,
				body: Box::new(payload.body.to_record()?),
			}),
			None => None,
		};
		Ok(ArgumentTypeRecord {
			kind: Some(self.kind().code()),
			num_occurrences: self.num_occurrences(),
			ty: self.ty().cloned(),
			options: ArgumentOptionsRecord::new(self.options(), self.ty())?,
			lambda,
		})
	}

	pub fn from_record(record: &ArgumentTypeRecord) -> Result<Self> {
		Self::decode_at_depth(record, 0)
	}

	fn decode_at_depth(record: &ArgumentTypeRecord, depth: usize) -> Result<Self> {
		let Some(code) = record.kind else {
			bail!(Error::Deserialize("The argument record has no kind".to_string()));
		};
		let Some(kind) = Kind::from_code(code) else {
			bail!(Error::Deserialize(format!("Unknown argument kind code {code}")));
		};
		let options = record.options.decode(record.ty.as_ref())?;
		let argument = match (kind, &record.ty, &record.lambda) {
			(Kind::Fixed, Some(ty), None) => ArgumentType::fixed_with(ty.clone(), options),
			(Kind::Fixed, None, _) => {
				bail!(Error::Deserialize("A fixed argument record has no type".to_string()))
			}
			(Kind::Lambda, None, Some(lambda)) => {
				if depth >= *MAX_LAMBDA_DEPTH {
					debug!("Refusing a function-type argument nested {} levels deep", depth + 1);
					bail!(Error::Deserialize(format!(
						"Function-type arguments are nested deeper than {} levels",
						*MAX_LAMBDA_DEPTH
					)));
				}
				let arguments = lambda
					.arguments
					.iter()
					.map(|a| Self::decode_at_depth(a, depth + 1))
					.collect::<Result<Vec<_>>>()?;
				let body = Self::decode_at_depth(&lambda.body, depth + 1)?;
				ArgumentType::lambda_with(arguments, body, options)
			}
			(Kind::Lambda, _, None) => bail!(Error::Deserialize(
				"A function-type argument record has no argument or body types".to_string()
			)),
			(_, Some(_), _) => bail!(Error::Deserialize(format!(
				"Only fixed arguments carry a type, found one on {kind}"
			))),
			(_, None, Some(_)) => bail!(Error::Deserialize(format!(
				"Only function-type arguments carry argument and body types, found them on {kind}"
			))),
			(_, None, None) => ArgumentType::templated_with(kind, options),
		};
		Ok(argument.with_occurrences(record.num_occurrences))
	}
}

impl From<&SignatureOptions> for SignatureOptionsRecord {
	fn from(options: &SignatureOptions) -> Self {
		Self {
			is_deprecated: options.is_deprecated,
			additional_deprecation_warnings: options.deprecation_warnings.clone(),
			required_language_features: options.required_features.iter().map(|f| f.0).collect(),
			is_aliased_signature: options.is_aliased_signature,
			propagates_collation: (!options.propagates_collation).then_some(false),
			uses_operation_collation: options.uses_operation_collation,
			rejects_collation: options.rejects_collation,
			rewrite_options: options.rewrite.clone(),
		}
	}
}

impl From<&SignatureOptionsRecord> for SignatureOptions {
	fn from(record: &SignatureOptionsRecord) -> Self {
		Self {
			is_deprecated: record.is_deprecated,
			deprecation_warnings: record.additional_deprecation_warnings.clone(),
			required_features: record
				.required_language_features
				.iter()
				.copied()
				.map(LanguageFeature)
				.collect(),
			is_aliased_signature: record.is_aliased_signature,
			propagates_collation: record.propagates_collation.unwrap_or(true),
			uses_operation_collation: record.uses_operation_collation,
			rejects_collation: record.rejects_collation,
			rewrite: record.rewrite_options.clone(),
			..SignatureOptions::default()
		}
	}
}

impl Signature {
	/// The persisted form of this signature.
	///
	/// The argument constraint callback is not persisted.
	pub fn to_record(&self) -> Result<SignatureRecord> {
		Ok(SignatureRecord {
			arguments: self
				.arguments()
				.iter()
				.map(ArgumentType::to_record)
				.collect::<Result<Vec<_>>>()?,
			result: self.result().to_record()?,
			options: self.options().into(),
			context_id: self.context_id(),
		})
	}

	/// Rebuilds and validates a signature from its persisted form.
	pub fn from_record(record: &SignatureRecord) -> Result<Self> {
		let limit = *MAX_SIGNATURE_ARGUMENTS;
		if record.arguments.len() > limit {
			debug!(
				"Refusing a signature record with {} arguments, the limit is {limit}",
				record.arguments.len()
			);
			bail!(Error::Deserialize(format!(
				"The signature has {} arguments, more than the limit of {limit}",
				record.arguments.len()
			)));
		}
		trace!("Decoding a signature record with {} arguments", record.arguments.len());
		let arguments = record
			.arguments
			.iter()
			.map(ArgumentType::from_record)
			.collect::<Result<Vec<_>>>()?;
		let result = ArgumentType::from_record(&record.result)?;
		Signature::with_options(result, arguments, record.context_id, (&record.options).into())
	}

	/// Encodes the signature for storage.
	pub fn encode(&self) -> Result<Vec<u8>> {
		Ok(revision::to_vec(&self.to_record()?).map_err(Error::Revision)?)
	}

	/// Decodes a signature written by [`Signature::encode`].
	pub fn decode(bytes: &[u8]) -> Result<Self> {
		let record: SignatureRecord = revision::from_slice(bytes).map_err(Error::Revision)?;
		Self::from_record(&record)
	}
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::*;
	use crate::sig::kind::Slot;

	fn fixed(ty: Type) -> ArgumentTypeRecord {
		ArgumentTypeRecord {
			kind: Some(Kind::Fixed.code()),
			ty: Some(ty),
			..Default::default()
		}
	}

	fn templated(kind: Kind) -> ArgumentTypeRecord {
		ArgumentTypeRecord {
			kind: Some(kind.code()),
			..Default::default()
		}
	}

	fn deserialize_error(record: &ArgumentTypeRecord) -> String {
		let err = ArgumentType::from_record(record).unwrap_err();
		match err.downcast_ref::<Error>() {
			Some(Error::Deserialize(message)) => message.clone(),
			other => panic!("unexpected error: {other:?}"),
		}
	}

	#[rstest]
	#[case::missing_kind(ArgumentTypeRecord::default(), "The argument record has no kind")]
	#[case::unknown_kind(
		ArgumentTypeRecord { kind: Some(200), ..Default::default() },
		"Unknown argument kind code 200"
	)]
	#[case::fixed_without_type(templated(Kind::Fixed), "A fixed argument record has no type")]
	#[case::typed_template(
		ArgumentTypeRecord { ty: Some(Type::Int64), ..templated(Kind::Any(Slot::T1)) },
		"Only fixed arguments carry a type, found one on <T1>"
	)]
	#[case::lambda_without_payload(
		templated(Kind::Lambda),
		"A function-type argument record has no argument or body types"
	)]
	#[case::payload_on_array(
		ArgumentTypeRecord {
			lambda: Some(LambdaRecord::default()),
			..templated(Kind::Array(Slot::T1))
		},
		"Only function-type arguments carry argument and body types, found them on <array<T1>>"
	)]
	#[case::untyped_default(
		ArgumentTypeRecord {
			options: ArgumentOptionsRecord {
				cardinality: Some(Cardinality::Optional),
				default_value: Some(ValueRecord::Int64(1)),
				..Default::default()
			},
			..templated(Kind::Any(Slot::T1))
		},
		"The default value of a templated argument has no stored type"
	)]
	#[case::doubly_typed_default(
		ArgumentTypeRecord {
			options: ArgumentOptionsRecord {
				cardinality: Some(Cardinality::Optional),
				default_value: Some(ValueRecord::Int64(1)),
				default_value_type: Some(Type::Int64),
				..Default::default()
			},
			..fixed(Type::Int64)
		},
		"A default value type was stored for an argument with a fixed type"
	)]
	fn malformed_records(#[case] record: ArgumentTypeRecord, #[case] expected: &str) {
		assert_eq!(deserialize_error(&record), expected);
	}

	#[test]
	fn default_value_of_wrong_shape() {
		let record = ArgumentTypeRecord {
			options: ArgumentOptionsRecord {
				cardinality: Some(Cardinality::Optional),
				default_value: Some(ValueRecord::String("x".into())),
				..Default::default()
			},
			..fixed(Type::Int64)
		};
		let err = ArgumentType::from_record(&record).unwrap_err();
		assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Value(_))));
	}

	#[test]
	fn lambda_nesting_is_limited() {
		let mut record = fixed(Type::Bool);
		for _ in 0..=*MAX_LAMBDA_DEPTH {
			record = ArgumentTypeRecord {
				lambda: Some(LambdaRecord {
					arguments: vec![],
					body: Box::new(record),
				}),
				..templated(Kind::Lambda)
			};
		}
		assert!(deserialize_error(&record).starts_with("Function-type arguments are nested deeper"));
	}

	#[test]
	fn argument_count_is_limited() {
		let record = SignatureRecord {
			arguments: vec![fixed(Type::Int64); *MAX_SIGNATURE_ARGUMENTS + 1],
			result: fixed(Type::Bool),
			..Default::default()
		};
		let err = Signature::from_record(&record).unwrap_err();
		assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Deserialize(_))));
	}

	#[test]
	fn omits_default_fields() {
		let record = ArgumentType::fixed(Type::Int64).to_record().unwrap();
		assert_eq!(record.kind, Some(0));
		assert_eq!(record.options, ArgumentOptionsRecord::default());

		let decoded = ArgumentType::from_record(&record).unwrap();
		assert!(Arc::ptr_eq(decoded.shared_options(), &ArgumentOptions::simple(Cardinality::Required)));
	}

	#[test]
	fn templated_default_keeps_its_type() {
		let argument = ArgumentType::templated_with(
			Kind::Array(Slot::T1),
			Arc::new(
				ArgumentOptions::new(Cardinality::Optional)
					.with_default(Value::Null(Type::array(Type::String))),
			),
		);
		let record = argument.to_record().unwrap();
		assert_eq!(record.options.default_value_type, Some(Type::array(Type::String)));
		assert_eq!(ArgumentType::from_record(&record).unwrap(), argument);
	}

	#[test]
	fn named_kind_defaults_when_absent() {
		let record = ArgumentTypeRecord {
			options: ArgumentOptionsRecord {
				argument_name: Some("n".into()),
				..Default::default()
			},
			..fixed(Type::Int64)
		};
		let argument = ArgumentType::from_record(&record).unwrap();
		assert_eq!(argument.options().named_argument_kind(), Some(NamedArgumentKind::PositionalOrNamed));

		let record = ArgumentTypeRecord {
			options: ArgumentOptionsRecord {
				named_argument_kind: Some(NamedArgumentKind::NamedOnly),
				..Default::default()
			},
			..fixed(Type::Int64)
		};
		assert!(deserialize_error(&record).contains("without an argument name"));
	}
}
