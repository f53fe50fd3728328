use std::sync::Arc;

use anyhow::{Result, bail};
use sqlsig_types::{ProductMode, Type, Value};

use crate::err::Error;
use crate::sig::kind::Kind;
use crate::sig::options::{ArgumentOptions, Cardinality, NamedArgumentKind};
use crate::sig::relation::RelationSchema;

/// The occurrence count of an argument that has not been matched to a call.
pub const UNINSTANTIATED: i32 = -1;

/// Which argument names are shown in user-facing signature text.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum NamePrintingStyle {
	/// Show the name of named-only arguments.
	#[default]
	IfNamedOnly,
	/// Show the name of every argument that can be passed by name.
	IfNotPositionalOnly,
	Never,
}

/// The argument types and body type of a function-type argument.
#[derive(Clone, Debug, PartialEq)]
pub struct LambdaPayload {
	pub arguments: Vec<ArgumentType>,
	pub body: ArgumentType,
}

impl LambdaPayload {
	/// The nested argument types followed by the body type.
	pub fn types(&self) -> impl Iterator<Item = &ArgumentType> {
		self.arguments.iter().chain(std::iter::once(&self.body))
	}
}

/// One argument or result position of a signature.
#[derive(Clone, Debug, PartialEq)]
pub struct ArgumentType {
	kind: Kind,
	ty: Option<Type>,
	options: Arc<ArgumentOptions>,
	num_occurrences: i32,
	lambda: Option<Arc<LambdaPayload>>,
}

impl ArgumentType {
	/// A required argument of a fixed type.
	pub fn fixed(ty: Type) -> Self {
		Self::fixed_with(ty, ArgumentOptions::simple(Cardinality::Required))
	}

	pub fn fixed_with(ty: Type, options: Arc<ArgumentOptions>) -> Self {
		Self {
			kind: Kind::Fixed,
			ty: Some(ty),
			options,
			num_occurrences: UNINSTANTIATED,
			lambda: None,
		}
	}

	/// A required argument of a template or special purpose kind.
	///
	/// # Panics
	///
	/// Panics if `kind` is [`Kind::Fixed`], which needs a type.
	pub fn templated(kind: Kind) -> Self {
		Self::templated_with(kind, ArgumentOptions::simple(Cardinality::Required))
	}

	/// # Panics
	///
	/// Panics if `kind` is [`Kind::Fixed`], which needs a type.
	pub fn templated_with(kind: Kind, options: Arc<ArgumentOptions>) -> Self {
		assert!(kind != Kind::Fixed, "a fixed argument must be built with ArgumentType::fixed");
		Self {
			kind,
			ty: None,
			options,
			num_occurrences: UNINSTANTIATED,
			lambda: None,
		}
	}

	/// A required function-type argument.
	pub fn lambda(arguments: Vec<ArgumentType>, body: ArgumentType) -> Self {
		Self::lambda_with(arguments, body, ArgumentOptions::simple(Cardinality::Required))
	}

	pub fn lambda_with(
		arguments: Vec<ArgumentType>,
		body: ArgumentType,
		options: Arc<ArgumentOptions>,
	) -> Self {
		Self {
			kind: Kind::Lambda,
			ty: None,
			options,
			num_occurrences: UNINSTANTIATED,
			lambda: Some(Arc::new(LambdaPayload {
				arguments,
				body,
			})),
		}
	}

	/// Returns this argument with the given occurrence count.
	pub fn with_occurrences(mut self, num_occurrences: i32) -> Self {
		self.num_occurrences = num_occurrences;
		self
	}

	pub fn kind(&self) -> Kind {
		self.kind
	}

	/// The concrete type of a fixed argument.
	pub fn ty(&self) -> Option<&Type> {
		self.ty.as_ref()
	}

	pub fn options(&self) -> &ArgumentOptions {
		&self.options
	}

	pub fn shared_options(&self) -> &Arc<ArgumentOptions> {
		&self.options
	}

	pub fn num_occurrences(&self) -> i32 {
		self.num_occurrences
	}

	pub fn lambda_payload(&self) -> Option<&LambdaPayload> {
		self.lambda.as_deref()
	}

	/// The payload of a function-type argument.
	///
	/// # Panics
	///
	/// Panics if this is not a function-type argument built with
	/// [`ArgumentType::lambda`].
	pub fn lambda_ref(&self) -> &LambdaPayload {
		match self.lambda.as_deref() {
			Some(payload) => payload,
			None => panic!("{} is not a function-type argument", self.kind),
		}
	}

	pub fn cardinality(&self) -> Cardinality {
		self.options.cardinality
	}

	pub fn required(&self) -> bool {
		self.options.required()
	}

	pub fn optional(&self) -> bool {
		self.options.optional()
	}

	pub fn repeated(&self) -> bool {
		self.options.repeated()
	}

	pub fn has_default(&self) -> bool {
		self.options.has_default()
	}

	pub fn default_value(&self) -> Option<&Value> {
		self.options.default.as_ref()
	}

	pub fn argument_name(&self) -> Option<&str> {
		self.options.argument_name()
	}

	pub fn relation_schema(&self) -> Option<&RelationSchema> {
		self.options.relation_schema.as_deref()
	}

	pub fn is_fixed(&self) -> bool {
		self.kind == Kind::Fixed
	}

	pub fn is_lambda(&self) -> bool {
		self.kind == Kind::Lambda
	}

	pub fn is_relation(&self) -> bool {
		self.kind == Kind::Relation
	}

	pub fn is_void(&self) -> bool {
		self.kind == Kind::Void
	}

	pub fn is_descriptor(&self) -> bool {
		self.kind == Kind::Descriptor
	}

	pub fn is_model(&self) -> bool {
		self.kind == Kind::Model
	}

	pub fn is_connection(&self) -> bool {
		self.kind == Kind::Connection
	}

	pub fn is_sequence(&self) -> bool {
		self.kind == Kind::Sequence
	}

	pub fn is_scalar(&self) -> bool {
		self.kind.is_scalar()
	}

	/// A table argument or result with a fixed column schema.
	pub fn is_fixed_relation(&self) -> bool {
		self.is_relation() && self.options.relation_schema.is_some()
	}

	/// True once the argument has been matched to a call and needs no template binding.
	pub fn is_concrete(&self) -> bool {
		if let Some(payload) = self.lambda_payload() {
			return payload.types().all(ArgumentType::is_concrete);
		}
		matches!(
			self.kind,
			Kind::Fixed | Kind::Relation | Kind::Model | Kind::Connection | Kind::Sequence
		) && self.num_occurrences >= 0
	}

	/// True when the argument needs a template binding.
	pub fn is_templated(&self) -> bool {
		if let Some(payload) = self.lambda_payload() {
			return payload.types().any(ArgumentType::is_templated);
		}
		!(self.is_fixed() || self.is_fixed_relation() || self.is_void())
	}

	/// True when this templated argument binds a template related to `kind`.
	///
	/// A function-type argument is related through any of its nested types.
	pub fn templated_kind_is_related(&self, kind: Kind) -> bool {
		if !self.is_templated() {
			return false;
		}
		if self.kind == Kind::Arbitrary || kind == Kind::Arbitrary {
			return false;
		}
		if self.kind == kind {
			return true;
		}
		if let Some(payload) = self.lambda_payload() {
			return payload.types().any(|t| t.templated_kind_is_related(kind));
		}
		self.kind.is_related(kind)
	}

	/// Checks the argument on its own.
	pub fn validate(&self, mode: ProductMode) -> Result<()> {
		match self.cardinality() {
			Cardinality::Repeated => {
				if self.is_concrete() && self.num_occurrences < 0 {
					bail!(Error::InvalidSignature(format!(
						"REPEATED concrete argument has {} occurrences but must have at least 0: {}",
						self.num_occurrences,
						self.debug_string(false)
					)));
				}
				if self.has_default() {
					bail!(Error::InvalidSignature(
						"Default value cannot be applied to a REPEATED argument".to_string()
					));
				}
			}
			Cardinality::Optional => {
				if self.is_concrete() && !(0..=1).contains(&self.num_occurrences) {
					bail!(Error::InvalidSignature(format!(
						"OPTIONAL concrete argument has {} occurrences but must have 0 or 1: {}",
						self.num_occurrences,
						self.debug_string(false)
					)));
				}
				if let Some(default) = self.default_value() {
					self.validate_default(default, mode)?;
				}
			}
			Cardinality::Required => {
				if self.is_concrete() && self.num_occurrences != 1 {
					bail!(Error::InvalidSignature(format!(
						"REQUIRED concrete argument has {} occurrences but must have exactly 1: {}",
						self.num_occurrences,
						self.debug_string(false)
					)));
				}
				if self.has_default() {
					bail!(Error::InvalidSignature(
						"Default value cannot be applied to a REQUIRED argument".to_string()
					));
				}
			}
		}
		if self.is_lambda() {
			self.validate_lambda()?;
		}
		Ok(())
	}

	fn validate_default(&self, default: &Value, mode: ProductMode) -> Result<()> {
		if !self.kind.can_have_default_value() {
			bail!(Error::InvalidSignature(format!(
				"{} argument cannot have a default value",
				self.user_facing_name(mode, true)
			)));
		}
		let Some(default_type) = default.ty() else {
			bail!(Error::InvalidSignature(format!(
				"Default value must be a valid value; {}",
				self.debug_string(false)
			)));
		};
		if let Some(ty) = &self.ty {
			if *ty != default_type {
				bail!(Error::InvalidSignature(format!(
					"Default value type does not match the argument type: {} vs {}; {}",
					ty.short_type_name(mode),
					default_type.short_type_name(mode),
					self.debug_string(false)
				)));
			}
		}
		Ok(())
	}

	fn validate_lambda(&self) -> Result<()> {
		let Some(payload) = self.lambda_payload() else {
			bail!(Error::Internal(
				"A function-type argument was constructed directly from its kind. Use \
				 ArgumentType::lambda instead"
					.to_string()
			));
		};
		if !self.required() {
			bail!(Error::InvalidSignature(format!(
				"Function-type arguments must be REQUIRED; {}",
				self.debug_string(false)
			)));
		}
		for nested in payload.types() {
			if !(nested.is_fixed() || nested.kind.is_any_scalar()) {
				bail!(Error::Unimplemented(format!(
					"Argument kind not supported by function-type argument: {}",
					nested.kind
				)));
			}
			if **nested.shared_options() != ArgumentOptions::new(Cardinality::Required) {
				bail!(Error::Unimplemented(format!(
					"Options are not supported on the types of a function-type argument: {}",
					nested.debug_string(true)
				)));
			}
		}
		Ok(())
	}

	/// The debug name of the kind, `<T1>`, `ANY TABLE` and so on.
	pub fn kind_name(&self) -> &'static str {
		self.kind.name()
	}

	/// The type or kind as shown to users, without cardinality.
	pub fn user_facing_name(&self, mode: ProductMode, print_template_details: bool) -> String {
		if let Some(ty) = &self.ty {
			return ty.short_type_name(mode);
		}
		if let Some(payload) = self.lambda_payload() {
			return lambda_text(payload, |t| t.user_facing_name(mode, print_template_details));
		}
		self.kind.user_facing_name(print_template_details).to_string()
	}

	/// The type or kind as shown to users, with cardinality brackets and the
	/// argument name when `style` asks for it.
	pub fn user_facing_name_with_cardinality(
		&self,
		mode: ProductMode,
		style: NamePrintingStyle,
		print_template_details: bool,
	) -> String {
		let mut text = self.user_facing_name(mode, print_template_details);
		if let Some(name) = &self.options.name {
			let show = match style {
				NamePrintingStyle::IfNamedOnly => name.kind == NamedArgumentKind::NamedOnly,
				NamePrintingStyle::IfNotPositionalOnly => {
					name.kind != NamedArgumentKind::PositionalOnly
				}
				NamePrintingStyle::Never => false,
			};
			if show {
				text = if name.kind == NamedArgumentKind::PositionalOrNamed {
					format!("[{}=>]{text}", name.name)
				} else {
					format!("{} => {text}", name.name)
				};
			}
		}
		match self.cardinality() {
			Cardinality::Optional => format!("[{text}]"),
			Cardinality::Repeated => format!("[{text}, ...]"),
			Cardinality::Required => text,
		}
	}

	/// The debug rendering used in diagnostics, with the options block when `verbose`.
	pub fn debug_string(&self, verbose: bool) -> String {
		let mut out = String::new();
		match self.cardinality() {
			Cardinality::Repeated => out.push_str("repeated"),
			Cardinality::Optional => out.push_str("optional"),
			Cardinality::Required => {}
		}
		if !self.required() {
			if self.is_concrete() {
				out.push_str(&format!("({})", self.num_occurrences));
			}
			out.push(' ');
		}
		if let Some(payload) = self.lambda_payload() {
			let arguments = payload.arguments.iter().map(|a| a.debug_string(verbose)).collect();
			out.push_str(&arrow_text(arguments, payload.body.debug_string(false)));
		} else if let Some(ty) = &self.ty {
			out.push_str(&ty.debug_string());
		} else if let Some(schema) = self.relation_schema().filter(|_| self.is_relation()) {
			// The schema rendering replaces the cardinality prefix.
			out = schema.debug_string();
		} else if self.kind == Kind::Arbitrary {
			out.push_str("ANY TYPE");
		} else {
			out.push_str(self.kind.name());
		}
		if verbose {
			out.push_str(&self.options.debug_string());
		}
		if let Some(name) = self.argument_name() {
			out.push(' ');
			out.push_str(name);
		}
		out
	}

	/// The argument as written in a function declaration.
	pub fn sql_declaration(&self, mode: ProductMode) -> String {
		let mut out = String::new();
		match self.cardinality() {
			Cardinality::Repeated => out.push_str("/*repeated*/ "),
			Cardinality::Optional => out.push_str("/*optional*/ "),
			Cardinality::Required => {}
		}
		if let Some(payload) = self.lambda_payload() {
			out.push_str(&lambda_text(payload, |t| t.sql_declaration(mode)));
			return out;
		}
		if let Some(ty) = &self.ty {
			out.push_str(&ty.type_name(mode));
		} else if let Some(schema) = self.relation_schema().filter(|_| self.is_relation()) {
			out.push_str(&schema.sql_declaration(mode));
		} else if self.kind == Kind::Arbitrary {
			out.push_str("ANY TYPE");
		} else {
			out.push_str(self.kind.name());
		}
		out.push_str(&self.options.sql_declaration(mode));
		out
	}
}

fn lambda_text(payload: &LambdaPayload, render: impl Fn(&ArgumentType) -> String) -> String {
	let arguments = payload.arguments.iter().map(&render).collect();
	arrow_text(arguments, render(&payload.body))
}

fn arrow_text(arguments: Vec<String>, body: String) -> String {
	if arguments.len() == 1 {
		format!("FUNCTION<{}->{body}>", arguments[0])
	} else {
		format!("FUNCTION<({})->{body}>", arguments.join(", "))
	}
}
