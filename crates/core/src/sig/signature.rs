use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Result, bail};
use sqlsig_types::utils::escape::EscapeIdent;
use sqlsig_types::{ProductMode, Type};
use unicase::UniCase;

use crate::cnf::VALIDATION_PRODUCT_MODE;
use crate::err::Error;
use crate::lang::LanguageOptions;
use crate::sig::argument::{ArgumentType, NamePrintingStyle};
use crate::sig::kind::{Kind, Slot};
use crate::sig::options::{
	ArgumentAliasKind, ArgumentOptions, NamedArgumentKind, ProcedureArgumentMode,
};
use crate::sig::signature_options::SignatureOptions;

/// The declared arguments and result of one overload of a function.
///
/// A signature is validated when it is built and never changes afterwards.
/// [`Signature::finalize`] produces a new signature with a concrete result.
#[derive(Clone, Debug)]
pub struct Signature {
	arguments: Vec<ArgumentType>,
	result: ArgumentType,
	options: SignatureOptions,
	context_id: i64,
	num_repeated: usize,
	num_optional: usize,
	concrete_arguments: Vec<ArgumentType>,
	named_arguments: HashMap<UniCase<String>, usize>,
	last_named_arg_index: Option<usize>,
	last_default_arg_index: Option<usize>,
	has_concrete_arguments: bool,
	is_concrete: bool,
}

/// Collects the parts of a signature before it is validated.
#[derive(Clone, Debug)]
pub struct SignatureBuilder {
	result: ArgumentType,
	arguments: Vec<ArgumentType>,
	options: SignatureOptions,
	context_id: i64,
}

impl SignatureBuilder {
	pub fn arg(mut self, argument: ArgumentType) -> Self {
		self.arguments.push(argument);
		self
	}

	pub fn args(mut self, arguments: impl IntoIterator<Item = ArgumentType>) -> Self {
		self.arguments.extend(arguments);
		self
	}

	pub fn context_id(mut self, context_id: i64) -> Self {
		self.context_id = context_id;
		self
	}

	pub fn options(mut self, options: SignatureOptions) -> Self {
		self.options = options;
		self
	}

	/// Builds and validates the signature.
	pub fn build(self) -> Result<Signature> {
		Signature::with_options(self.result, self.arguments, self.context_id, self.options)
	}

	/// Builds a signature that is compiled into the engine.
	///
	/// # Panics
	///
	/// Panics if the signature is invalid. Use [`SignatureBuilder::build`] for
	/// signatures that come from user input.
	pub fn declare(self) -> Signature {
		match self.build() {
			Ok(signature) => signature,
			Err(e) => panic!("Invalid built-in function signature: {e}"),
		}
	}
}

impl Signature {
	/// Starts building a signature with the given result.
	pub fn returning(result: ArgumentType) -> SignatureBuilder {
		SignatureBuilder {
			result,
			arguments: Vec::new(),
			options: SignatureOptions::default(),
			context_id: 0,
		}
	}

	pub fn new(result: ArgumentType, arguments: Vec<ArgumentType>, context_id: i64) -> Result<Self> {
		Self::with_options(result, arguments, context_id, SignatureOptions::default())
	}

	pub fn with_options(
		result: ArgumentType,
		arguments: Vec<ArgumentType>,
		context_id: i64,
		options: SignatureOptions,
	) -> Result<Self> {
		let mut signature = Self {
			arguments,
			result,
			options,
			context_id,
			num_repeated: 0,
			num_optional: 0,
			concrete_arguments: Vec::new(),
			named_arguments: HashMap::new(),
			last_named_arg_index: None,
			last_default_arg_index: None,
			has_concrete_arguments: false,
			is_concrete: false,
		};
		signature.compute_repeated_and_optional();
		if let Err(e) =
			signature.build_named_arguments().and_then(|_| signature.validate(VALIDATION_PRODUCT_MODE))
		{
			debug!("Rejected signature {}: {e}", signature.debug_string("", false));
			return Err(e);
		}
		signature.compute_concrete();
		trace!("Declared signature {}", signature.debug_string("", true));
		Ok(signature)
	}

	fn compute_repeated_and_optional(&mut self) {
		self.num_repeated = match (self.first_repeated_index(), self.last_repeated_index()) {
			(Some(first), Some(last)) => last - first + 1,
			_ => 0,
		};
		self.num_optional = self.arguments.iter().rev().take_while(|a| a.optional()).count();
	}

	fn build_named_arguments(&mut self) -> Result<()> {
		for (i, argument) in self.arguments.iter().enumerate() {
			if argument.has_default() {
				self.last_default_arg_index = Some(i);
			}
			let Some(name) = &argument.options().name else {
				continue;
			};
			if name.kind == NamedArgumentKind::PositionalOnly {
				continue;
			}
			if self.named_arguments.insert(UniCase::new(name.name.clone()), i).is_some() {
				bail!(Error::InvalidSignature(format!(
					"Duplicate named argument {} found in signature: {}",
					name.name,
					self.debug_string("", false)
				)));
			}
			self.last_named_arg_index = Some(i);
		}
		Ok(())
	}

	fn compute_concrete(&mut self) {
		// Absent arguments may keep an unresolved template.
		self.has_concrete_arguments = self
			.arguments
			.iter()
			.all(|a| a.num_occurrences() == 0 || (a.num_occurrences() > 0 && a.is_concrete()));
		self.is_concrete =
			self.has_concrete_arguments && (self.result.is_relation() || self.result.is_concrete());
		self.concrete_arguments.clear();
		if !self.has_concrete_arguments {
			return;
		}
		let present = |a: &&ArgumentType| a.num_occurrences() == 1;
		match (self.first_repeated_index(), self.last_repeated_index()) {
			(Some(first), Some(last)) => {
				let occurrences = self.arguments[first].num_occurrences().max(0);
				let before = self.arguments[..first].iter().filter(present).cloned();
				let block = &self.arguments[first..=last];
				let repeated = (0..occurrences)
					.flat_map(|_| block.iter().cloned());
				let after = self.arguments[last + 1..].iter().filter(present).cloned();
				self.concrete_arguments = before.chain(repeated).chain(after).collect();
			}
			_ => {
				self.concrete_arguments = self.arguments.iter().filter(present).cloned().collect();
			}
		}
	}

	/// Returns this signature with its result replaced by a concrete type.
	///
	/// This is the last step of resolving a call, before the signature is
	/// shared with other readers.
	pub fn finalize(mut self, ty: Type) -> Signature {
		let options = self.result.shared_options().clone();
		self.result = ArgumentType::fixed_with(ty, options).with_occurrences(1);
		self.compute_concrete();
		self
	}

	/// Checks every structural rule, stopping at the first violation.
	pub fn validate(&self, mode: ProductMode) -> Result<()> {
		if self.result.repeated() || self.result.optional() {
			return self.invalid("Result type cannot be repeated or optional");
		}
		let result_kind = self.result.kind();
		if self.result.is_templated() && result_kind != Kind::Arbitrary && !self.result.is_relation()
		{
			if result_kind == Kind::Map {
				let key = self.any_argument_related_to(Kind::Any(Slot::T1));
				let value = self.any_argument_related_to(Kind::Any(Slot::T2));
				if !(key && value) {
					return self.invalid(
						"Result map type template must match an argument type template for both key and value",
					);
				}
			} else if !self.any_argument_related_to(result_kind) {
				return self.invalid("Result type template must match an argument type template");
			}
		}

		let mut seen_optional = false;
		let mut seen_default = false;
		let mut seen_repeated = false;
		let mut repeated_ended = false;
		let mut lambda_kinds: Vec<Kind> = Vec::new();
		for (i, argument) in self.arguments.iter().enumerate() {
			argument.validate(mode)?;
			if argument.is_void() {
				return self.invalid("Arguments cannot have type VOID");
			}
			if argument.optional() {
				seen_optional = true;
				if argument.has_default() {
					seen_default = true;
				} else if seen_default {
					return self.invalid(
						"Optional arguments with default values must be at the end of the argument list",
					);
				}
			} else if seen_optional {
				return self.invalid("Optional arguments must be at the end of the argument list");
			}
			if argument.repeated() {
				if repeated_ended {
					return self.invalid("Repeated arguments must be consecutive");
				}
				seen_repeated = true;
			} else if seen_repeated {
				repeated_ended = true;
			}
			if let Some(payload) = argument.lambda_payload() {
				for nested in payload.arguments.iter().filter(|t| t.is_templated()) {
					let bound = self.arguments[..i]
						.iter()
						.any(|a| !a.is_lambda() && a.templated_kind_is_related(nested.kind()));
					if !bound {
						bail!(Error::InvalidSignature(format!(
							"Templated argument of function-type argument type must match an \
							 argument type before the function-type argument. Function signature: {}",
							self.debug_string("", false)
						)));
					}
				}
				let consumed = payload.arguments.iter().filter(|t| t.is_templated());
				lambda_kinds.extend(consumed.map(ArgumentType::kind));
			} else if argument.is_templated() && lambda_kinds.contains(&argument.kind()) {
				bail!(Error::InvalidSignature(format!(
					"Templated argument kind used by function-type argument cannot be used by \
					 arguments to the right of the function-type using it. Kind: {} at index: {i}",
					argument.kind()
				)));
			}
		}

		if let (Some(first), Some(last)) = (self.first_repeated_index(), self.last_repeated_index())
		{
			let occurrences = self.arguments[first].num_occurrences();
			if self.arguments[first..=last].iter().any(|a| a.num_occurrences() != occurrences) {
				return self.invalid("Repeated arguments must have the same num_occurrences");
			}
			if self.num_repeated <= self.num_optional {
				bail!(Error::InvalidSignature(format!(
					"The number of repeated arguments ({}) must be greater than the number of \
					 optional arguments ({}) for signature: {}",
					self.num_repeated,
					self.num_optional,
					self.debug_string("", false)
				)));
			}
		}

		for (i, argument) in self.arguments.iter().enumerate() {
			if !argument.is_descriptor() {
				continue;
			}
			let Some(offset) = argument.options().descriptor_table_offset else {
				continue;
			};
			let valid = usize::try_from(offset)
				.ok()
				.and_then(|t| self.arguments.get(t))
				.is_some_and(ArgumentType::is_relation);
			if !valid {
				bail!(Error::InvalidSignature(format!(
					"The table offset argument ({offset}) of descriptor at argument ({i}) should \
					 point to a valid table argument for signature: {}",
					self.debug_string("", false)
				)));
			}
		}
		Ok(())
	}

	fn invalid(&self, message: &str) -> Result<()> {
		bail!(Error::InvalidSignature(format!("{message}: {}", self.debug_string("", false))))
	}

	pub fn arguments(&self) -> &[ArgumentType] {
		&self.arguments
	}

	pub fn argument(&self, index: usize) -> Option<&ArgumentType> {
		self.arguments.get(index)
	}

	pub fn result(&self) -> &ArgumentType {
		&self.result
	}

	pub fn options(&self) -> &SignatureOptions {
		&self.options
	}

	/// Identifies the function this signature belongs to, for the declaring catalog.
	pub fn context_id(&self) -> i64 {
		self.context_id
	}

	pub fn num_repeated(&self) -> usize {
		self.num_repeated
	}

	pub fn num_optional(&self) -> usize {
		self.num_optional
	}

	pub fn num_required(&self) -> usize {
		self.arguments.len().saturating_sub(self.num_repeated + self.num_optional)
	}

	pub fn first_repeated_index(&self) -> Option<usize> {
		self.arguments.iter().position(ArgumentType::repeated)
	}

	pub fn last_repeated_index(&self) -> Option<usize> {
		self.arguments.iter().rposition(ArgumentType::repeated)
	}

	/// The arguments of a concrete call, with the repeated block expanded.
	///
	/// Empty unless every present argument is concrete.
	pub fn concrete_arguments(&self) -> &[ArgumentType] {
		&self.concrete_arguments
	}

	pub fn num_concrete_arguments(&self) -> usize {
		self.concrete_arguments.len()
	}

	pub fn concrete_argument_type(&self, index: usize) -> Option<&Type> {
		self.concrete_arguments.get(index).and_then(ArgumentType::ty)
	}

	pub fn has_concrete_arguments(&self) -> bool {
		self.has_concrete_arguments
	}

	pub fn is_concrete(&self) -> bool {
		self.is_concrete
	}

	pub fn is_templated(&self) -> bool {
		self.result.is_templated() || self.arguments.iter().any(ArgumentType::is_templated)
	}

	/// True when some argument binds a template related to `kind`.
	pub fn any_argument_related_to(&self, kind: Kind) -> bool {
		self.arguments.iter().any(|a| a.templated_kind_is_related(kind))
	}

	/// The index of the argument that can be passed with this name, ignoring case.
	pub fn named_argument_index(&self, name: &str) -> Option<usize> {
		self.named_arguments.get(&UniCase::new(name.to_string())).copied()
	}

	/// The options of the argument that can be passed with this name, ignoring case.
	pub fn named_argument(&self, name: &str) -> Option<&Arc<ArgumentOptions>> {
		self.named_argument_index(name).map(|i| self.arguments[i].shared_options())
	}

	pub fn last_named_arg_index(&self) -> Option<usize> {
		self.last_named_arg_index
	}

	pub fn last_default_arg_index(&self) -> Option<usize> {
		self.last_default_arg_index
	}

	pub fn is_deprecated(&self) -> bool {
		self.options.is_deprecated
	}

	pub fn has_enabled_rewrite_implementation(&self) -> bool {
		self.options.rewrite.as_ref().is_some_and(|r| r.enabled)
	}

	pub fn supports_argument_aliases(&self) -> bool {
		self.arguments.iter().any(|a| a.options().alias_kind == ArgumentAliasKind::Aliased)
	}

	pub fn hide_in_supported_signature_list(&self, language: &LanguageOptions) -> bool {
		self.options.is_deprecated
			|| self.options.is_internal
			|| self.options.is_hidden
			|| !self.options.check_all_required_features_are_enabled(language)
	}

	/// Runs the argument constraint callback against the types of a concrete call.
	pub fn check_argument_constraints(&self, arguments: &[Type]) -> Result<Option<String>> {
		if !self.is_concrete {
			bail!(Error::Internal(format!(
				"Argument constraints can only be checked on a concrete signature: {}",
				self.debug_string("", false)
			)));
		}
		match &self.options.constraints {
			Some(check) => check(self, arguments),
			None => Ok(None),
		}
	}

	/// Checks the extra rules for a scalar or aggregate function.
	pub fn is_valid_for_function(&self) -> Result<()> {
		if self.arguments.iter().any(ArgumentType::is_relation) {
			return self.invalid("Relation arguments are only allowed in table-valued functions");
		}
		if self.result.is_relation() {
			return self.invalid("Relation return types are only allowed in table-valued functions");
		}
		if self.result.is_void() {
			return self.invalid("Function must not return VOID");
		}
		Ok(())
	}

	/// Checks the extra rules for a table-valued function.
	pub fn is_valid_for_table_valued_function(&self) -> Result<()> {
		if !self.result.is_relation() {
			return self.invalid("Table-valued functions must have relation return type");
		}
		let mut seen_repeated = false;
		for argument in &self.arguments {
			if argument.relation_schema().is_some() && !argument.is_relation() {
				return self.invalid("Only relation arguments may have a relation schema");
			}
			if argument.is_relation() {
				if argument.repeated() {
					return self.invalid("Repeated relation arguments are not supported");
				}
				if seen_repeated {
					return self.invalid("Relation arguments cannot follow repeated arguments");
				}
				if let Some(column) = argument.relation_schema().and_then(|s| s.duplicate_column()) {
					bail!(Error::InvalidSignature(format!(
						"Duplicate column name {column} in relation schema of signature: {}",
						self.debug_string("", false)
					)));
				}
			}
			seen_repeated |= argument.repeated();
		}
		if let Some(column) = self.result.relation_schema().and_then(|s| s.duplicate_column()) {
			bail!(Error::InvalidSignature(format!(
				"Duplicate column name {column} in result schema of signature: {}",
				self.debug_string("", false)
			)));
		}
		Ok(())
	}

	/// Checks the extra rules for a procedure.
	pub fn is_valid_for_procedure(&self) -> Result<()> {
		if self.arguments.iter().any(ArgumentType::is_relation) {
			return self.invalid("Relation arguments are not allowed in procedures");
		}
		if self.result.is_relation() {
			return self.invalid("Procedures cannot return relations");
		}
		Ok(())
	}

	/// `name(arguments) -> result`, with options and warnings when `verbose`.
	pub fn debug_string(&self, function_name: &str, verbose: bool) -> String {
		let arguments =
			self.arguments.iter().map(|a| a.debug_string(verbose)).collect::<Vec<_>>().join(", ");
		let mut out =
			format!("{function_name}({arguments}) -> {}", self.result.debug_string(verbose));
		if verbose {
			if let Some(warnings) = self.options.deprecation_warnings_debug_string() {
				out.push(' ');
				out.push_str(&warnings);
			}
			if self.options.rejects_collation {
				out.push_str(" rejects_collation=TRUE");
			}
		}
		out
	}

	/// Renders each signature on its own line with a prefix.
	pub fn signatures_to_string(
		signatures: &[Signature],
		verbose: bool,
		prefix: &str,
		separator: &str,
	) -> String {
		signatures
			.iter()
			.map(|s| format!("{prefix}{}", s.debug_string("", verbose)))
			.collect::<Vec<_>>()
			.join(separator)
	}

	/// The argument list and `RETURNS` clause of a function declaration.
	///
	/// Argument names are applied positionally; arguments beyond the names are unnamed.
	pub fn sql_declaration<S: AsRef<str>>(&self, argument_names: &[S], mode: ProductMode) -> String {
		let mut out = String::from("(");
		for (i, argument) in self.arguments.iter().enumerate() {
			if i > 0 {
				out.push_str(", ");
			}
			let procedure_mode = argument.options().procedure_mode;
			if procedure_mode != ProcedureArgumentMode::NotSet {
				out.push_str(&format!("{procedure_mode} "));
			}
			if let Some(name) = argument_names.get(i) {
				out.push_str(&format!("{} ", EscapeIdent(name.as_ref())));
			}
			out.push_str(&argument.sql_declaration(mode));
		}
		out.push(')');
		let no_returns = self.result.is_void()
			|| self.result.kind() == Kind::Arbitrary
			|| (self.result.is_relation() && self.result.relation_schema().is_none());
		if !no_returns {
			out.push_str(" RETURNS ");
			out.push_str(&self.result.sql_declaration(mode));
		}
		out
	}

	/// The arguments as shown to users in a supported signature list.
	///
	/// A repeated block of several arguments is shown as `[[A, B], ...]`.
	pub fn arguments_user_facing_text(
		&self,
		mode: ProductMode,
		style: NamePrintingStyle,
		print_template_details: bool,
	) -> String {
		let block = match (self.first_repeated_index(), self.last_repeated_index()) {
			(Some(first), Some(last)) if last > first => Some((first, last)),
			_ => None,
		};
		let mut texts = Vec::new();
		let mut grouped = Vec::new();
		for (i, argument) in self.arguments.iter().enumerate() {
			match block {
				Some((first, last)) if (first..=last).contains(&i) => {
					grouped.push(argument.user_facing_name(mode, print_template_details));
					if i == last {
						texts.push(format!("[[{}], ...]", grouped.join(", ")));
					}
				}
				_ => texts.push(argument.user_facing_name_with_cardinality(
					mode,
					style,
					print_template_details,
				)),
			}
		}
		texts.join(", ")
	}
}

#[cfg(test)]
mod tests {
	use rstest::rstest;
	use sqlsig_types::Value;

	use super::*;
	use crate::sig::options::Cardinality;
	use crate::sig::relation::{RelationColumn, RelationSchema};

	const T1: Kind = Kind::Any(Slot::T1);
	const T2: Kind = Kind::Any(Slot::T2);

	fn opts(cardinality: Cardinality) -> Arc<ArgumentOptions> {
		ArgumentOptions::simple(cardinality)
	}

	fn int(cardinality: Cardinality) -> ArgumentType {
		ArgumentType::fixed_with(Type::Int64, opts(cardinality))
	}

	fn defaulted(value: i64) -> ArgumentType {
		ArgumentType::fixed_with(
			Type::Int64,
			Arc::new(ArgumentOptions::new(Cardinality::Optional).with_default(Value::Int64(value))),
		)
	}

	fn build(result: ArgumentType, arguments: Vec<ArgumentType>) -> Result<Signature> {
		Signature::new(result, arguments, 0)
	}

	fn message(result: ArgumentType, arguments: Vec<ArgumentType>) -> String {
		let err = build(result, arguments).unwrap_err();
		assert!(
			err.downcast_ref::<Error>().is_some_and(Error::is_invalid_signature),
			"unexpected error: {err}"
		);
		err.to_string()
	}

	#[test]
	fn empty_signature_is_valid() {
		let sig = build(ArgumentType::fixed(Type::Bool), vec![]).unwrap();
		assert_eq!(sig.num_required(), 0);
		assert_eq!(sig.first_repeated_index(), None);
		assert_eq!(sig.debug_string("f", false), "f() -> BOOL");
	}

	#[rstest]
	#[case::optional_result(
		ArgumentType::fixed_with(Type::Bool, opts(Cardinality::Optional)),
		vec![],
		"Result type cannot be repeated or optional: () -> optional BOOL"
	)]
	#[case::unbound_result(
		ArgumentType::templated(T1),
		vec![ArgumentType::templated(T2)],
		"Result type template must match an argument type template: (<T2>) -> <T1>"
	)]
	#[case::unbound_map_value(
		ArgumentType::templated(Kind::Map),
		vec![ArgumentType::templated(Kind::Array(Slot::T1))],
		"Result map type template must match an argument type template for both key and value: \
		 (<array<T1>>) -> <map<T1, T2>>"
	)]
	#[case::void_argument(
		ArgumentType::fixed(Type::Bool),
		vec![ArgumentType::templated(Kind::Void)],
		"Arguments cannot have type VOID: (<void>) -> BOOL"
	)]
	#[case::required_after_optional(
		ArgumentType::fixed(Type::Bool),
		vec![int(Cardinality::Optional), int(Cardinality::Required)],
		"Optional arguments must be at the end of the argument list: (optional INT64, INT64) -> BOOL"
	)]
	#[case::default_before_plain(
		ArgumentType::fixed(Type::Bool),
		vec![defaulted(1), int(Cardinality::Optional)],
		"Optional arguments with default values must be at the end of the argument list: \
		 (optional INT64, optional INT64) -> BOOL"
	)]
	#[case::split_repeated(
		ArgumentType::fixed(Type::Bool),
		vec![int(Cardinality::Repeated), int(Cardinality::Required), int(Cardinality::Repeated)],
		"Repeated arguments must be consecutive: (repeated INT64, INT64, repeated INT64) -> BOOL"
	)]
	#[case::too_few_repeated(
		ArgumentType::fixed(Type::Bool),
		vec![int(Cardinality::Repeated), int(Cardinality::Optional)],
		"The number of repeated arguments (1) must be greater than the number of optional \
		 arguments (1) for signature: (repeated INT64, optional INT64) -> BOOL"
	)]
	fn invalid_signatures(
		#[case] result: ArgumentType,
		#[case] arguments: Vec<ArgumentType>,
		#[case] expected: &str,
	) {
		assert_eq!(message(result, arguments), expected);
	}

	#[test]
	fn defaults_trail_optional_run() {
		let sig = build(
			ArgumentType::fixed(Type::Bool),
			vec![
				int(Cardinality::Required),
				int(Cardinality::Optional),
				int(Cardinality::Optional),
				defaulted(1),
				defaulted(2),
			],
		)
		.unwrap();
		assert_eq!(sig.num_optional(), 4);
		assert_eq!(sig.num_required(), 1);
		assert_eq!(sig.last_default_arg_index(), Some(4));
	}

	#[test]
	fn repeated_block_bookkeeping() {
		let sig = build(
			ArgumentType::fixed(Type::Bool),
			vec![int(Cardinality::Required), int(Cardinality::Repeated), int(Cardinality::Repeated)],
		)
		.unwrap();
		assert_eq!(sig.first_repeated_index(), Some(1));
		assert_eq!(sig.last_repeated_index(), Some(2));
		assert_eq!(sig.num_repeated(), 2);
		assert_eq!(sig.num_required(), 1);
		assert_eq!(
			sig.arguments_user_facing_text(ProductMode::External, NamePrintingStyle::IfNamedOnly, true),
			"INT64, [[INT64, INT64], ...]"
		);
	}

	#[test]
	fn repeated_occurrences_must_match() {
		let err = build(
			ArgumentType::fixed(Type::Bool).with_occurrences(1),
			vec![
				int(Cardinality::Repeated).with_occurrences(2),
				int(Cardinality::Repeated).with_occurrences(3),
			],
		)
		.unwrap_err();
		assert!(err.to_string().starts_with("Repeated arguments must have the same num_occurrences"));
	}

	#[test]
	fn expands_repeated_block() {
		let repeated = |ty: Type| {
			ArgumentType::fixed_with(ty, opts(Cardinality::Repeated)).with_occurrences(2)
		};
		let sig = build(
			ArgumentType::fixed(Type::Bool).with_occurrences(1),
			vec![
				int(Cardinality::Required).with_occurrences(1),
				repeated(Type::String),
				repeated(Type::Double),
				ArgumentType::fixed_with(Type::Bytes, opts(Cardinality::Optional)).with_occurrences(0),
			],
		)
		.unwrap();
		assert!(sig.is_concrete());
		let types: Vec<_> =
			(0..sig.num_concrete_arguments()).filter_map(|i| sig.concrete_argument_type(i)).collect();
		assert_eq!(types, [&Type::Int64, &Type::String, &Type::Double, &Type::String, &Type::Double]);
		let occurrences: Vec<_> = sig.concrete_arguments().iter().map(|a| a.num_occurrences()).collect();
		assert_eq!(occurrences, [1, 2, 2, 2, 2]);
	}

	#[test]
	fn declared_signature_is_not_concrete() {
		let sig = build(ArgumentType::fixed(Type::Bool), vec![ArgumentType::templated(T1)]).unwrap();
		assert!(!sig.has_concrete_arguments());
		assert!(!sig.is_concrete());
		assert!(sig.concrete_arguments().is_empty());
		assert!(sig.is_templated());
	}

	#[test]
	fn named_arguments_ignore_case() {
		let named = |name: &str, kind| {
			ArgumentType::fixed_with(
				Type::Int64,
				Arc::new(ArgumentOptions::new(Cardinality::Required).with_name(name, kind)),
			)
		};
		let sig = build(
			ArgumentType::fixed(Type::Bool),
			vec![
				named("a", NamedArgumentKind::PositionalOnly),
				named("Limit", NamedArgumentKind::PositionalOrNamed),
				named("offset", NamedArgumentKind::NamedOnly),
			],
		)
		.unwrap();
		assert_eq!(sig.named_argument_index("LIMIT"), Some(1));
		assert!(sig.named_argument("OffSet").is_some());
		assert_eq!(sig.named_argument_index("a"), None);
		assert_eq!(sig.last_named_arg_index(), Some(2));

		let err = build(
			ArgumentType::fixed(Type::Bool),
			vec![
				named("x", NamedArgumentKind::NamedOnly),
				named("X", NamedArgumentKind::PositionalOrNamed),
			],
		)
		.unwrap_err();
		assert!(err.to_string().starts_with("Duplicate named argument X found in signature"));
	}

	#[test]
	fn lambda_kind_cannot_be_reused_to_the_right() {
		let err = message(
			ArgumentType::fixed(Type::Bool),
			vec![
				ArgumentType::templated(Kind::Array(Slot::T1)),
				ArgumentType::lambda(vec![ArgumentType::templated(T1)], ArgumentType::fixed(Type::Bool)),
				ArgumentType::templated(T1),
			],
		);
		assert_eq!(
			err,
			"Templated argument kind used by function-type argument cannot be used by arguments \
			 to the right of the function-type using it. Kind: <T1> at index: 2"
		);
	}

	#[test]
	fn lambda_body_may_introduce_a_template() {
		let sig = build(
			ArgumentType::templated(Kind::Array(Slot::T2)),
			vec![
				ArgumentType::templated(Kind::Array(Slot::T1)),
				ArgumentType::lambda(vec![ArgumentType::templated(T1)], ArgumentType::templated(T2)),
			],
		)
		.unwrap();
		assert_eq!(
			sig.debug_string("array_transform", false),
			"array_transform(<array<T1>>, FUNCTION<<T1>-><T2>>) -> <array<T2>>"
		);
	}

	#[rstest]
	#[case::out_of_range(5)]
	#[case::negative(-1)]
	#[case::not_a_table(1)]
	fn descriptor_offsets(#[case] offset: i32) {
		let descriptor = ArgumentType::templated_with(
			Kind::Descriptor,
			Arc::new(ArgumentOptions::default().with_descriptor_table_offset(offset)),
		);
		let err = message(
			ArgumentType::templated(Kind::Relation),
			vec![ArgumentType::templated(Kind::Relation), descriptor],
		);
		assert!(err.starts_with(&format!(
			"The table offset argument ({offset}) of descriptor at argument (1) should point"
		)));
	}

	#[test]
	fn descriptor_pointing_at_table() {
		let descriptor = ArgumentType::templated_with(
			Kind::Descriptor,
			Arc::new(ArgumentOptions::default().with_descriptor_table_offset(0)),
		);
		let sig = build(
			ArgumentType::templated(Kind::Relation),
			vec![ArgumentType::templated(Kind::Relation), descriptor],
		)
		.unwrap();
		sig.is_valid_for_table_valued_function().unwrap();
		assert!(sig.is_valid_for_function().is_err());
		assert!(sig.is_valid_for_procedure().is_err());
	}

	#[test]
	fn table_valued_function_rules() {
		let schema = |names: &[&str]| {
			RelationSchema::new(names.iter().map(|n| RelationColumn::new(*n, Type::Int64)).collect())
		};
		let table = |names: &[&str], cardinality| {
			ArgumentType::templated_with(
				Kind::Relation,
				Arc::new(ArgumentOptions::new(cardinality).with_relation_schema(schema(names), true)),
			)
		};
		let result = ArgumentType::templated(Kind::Relation);

		let sig = build(result.clone(), vec![table(&["a", "A"], Cardinality::Required)]).unwrap();
		let err = sig.is_valid_for_table_valued_function().unwrap_err();
		assert!(err.to_string().starts_with("Duplicate column name A in relation schema"));

		let sig = build(result.clone(), vec![table(&["a"], Cardinality::Repeated)]).unwrap();
		let err = sig.is_valid_for_table_valued_function().unwrap_err();
		assert!(err.to_string().starts_with("Repeated relation arguments are not supported"));

		let sig = build(
			result.clone(),
			vec![int(Cardinality::Repeated), table(&["a"], Cardinality::Optional)],
		);
		assert!(sig.is_err());

		let sig = build(ArgumentType::fixed(Type::Bool), vec![table(&["a"], Cardinality::Required)])
			.unwrap();
		let err = sig.is_valid_for_table_valued_function().unwrap_err();
		assert!(err.to_string().starts_with("Table-valued functions must have relation return type"));
	}

	#[test]
	fn sql_declarations() {
		let sig = build(
			ArgumentType::fixed(Type::Double),
			vec![
				ArgumentType::fixed_with(
					Type::Int64,
					Arc::new(ArgumentOptions::new(Cardinality::Required).with_procedure_mode(ProcedureArgumentMode::In)),
				),
				defaulted(3),
			],
		)
		.unwrap();
		assert_eq!(
			sig.sql_declaration(&["x", "my arg"], ProductMode::External),
			"(IN x INT64, `my arg` /*optional*/ INT64 DEFAULT 3) RETURNS FLOAT64"
		);
		let sig = build(ArgumentType::templated(Kind::Relation), vec![int(Cardinality::Required)]).unwrap();
		assert_eq!(sig.sql_declaration::<&str>(&[], ProductMode::External), "(INT64)");
	}

	#[test]
	fn verbose_debug_string() {
		let options = SignatureOptions {
			rejects_collation: true,
			..SignatureOptions::default()
		}
		.with_deprecation_warning("old")
		.with_deprecation_warning("older");
		let sig = Signature::returning(ArgumentType::fixed(Type::Bool))
			.arg(defaulted(1))
			.options(options)
			.build()
			.unwrap();
		assert_eq!(
			sig.debug_string("f", true),
			"f(optional INT64 {default_value: 1}) -> BOOL (2 deprecation warnings) rejects_collation=TRUE"
		);
		assert_eq!(
			Signature::signatures_to_string(&[sig.clone(), sig], false, "  ", "\n"),
			"  (optional INT64) -> BOOL\n  (optional INT64) -> BOOL"
		);
	}

	#[test]
	#[should_panic(expected = "Invalid built-in function signature")]
	fn declare_panics_on_invalid_signature() {
		Signature::returning(ArgumentType::templated(T1)).declare();
	}

	#[test]
	fn finalize_sets_a_concrete_result() {
		let sig = build(
			ArgumentType::templated(T1),
			vec![ArgumentType::fixed(Type::Int64).with_occurrences(1)],
		);
		// A fixed argument does not bind T1.
		assert!(sig.is_err());

		let sig = build(
			ArgumentType::templated(Kind::Arbitrary),
			vec![ArgumentType::fixed(Type::Int64).with_occurrences(1)],
		)
		.unwrap();
		assert!(sig.has_concrete_arguments());
		assert!(!sig.is_concrete());
		let sig = sig.finalize(Type::String);
		assert!(sig.is_concrete());
		assert_eq!(sig.result().ty(), Some(&Type::String));
		assert_eq!(sig.result().num_occurrences(), 1);
	}

	#[test]
	fn constraint_callback() {
		let options = SignatureOptions::default().with_constraints(|_, types| {
			Ok((types.first() != Some(&Type::Int64)).then(|| "expected INT64".to_string()))
		});
		let sig = Signature::returning(ArgumentType::fixed(Type::Bool).with_occurrences(1))
			.arg(int(Cardinality::Required).with_occurrences(1))
			.options(options)
			.build()
			.unwrap();
		assert_eq!(sig.check_argument_constraints(&[Type::Int64]).unwrap(), None);
		assert_eq!(
			sig.check_argument_constraints(&[Type::String]).unwrap().as_deref(),
			Some("expected INT64")
		);

		let declared = build(ArgumentType::fixed(Type::Bool), vec![int(Cardinality::Required)]).unwrap();
		let err = declared.check_argument_constraints(&[]).unwrap_err();
		assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Internal(_))));
	}
}
