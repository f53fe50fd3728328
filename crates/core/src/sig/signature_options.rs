use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use revision::revisioned;
use serde::{Deserialize, Serialize};
use sqlsig_types::Type;

use crate::lang::{LanguageFeature, LanguageOptions};
use crate::sig::signature::Signature;

/// Checks the argument types of a concrete call.
///
/// Returns `Ok(None)` when the arguments are accepted, or the reason they are not.
pub type ConstraintCallback =
	Arc<dyn Fn(&Signature, &[Type]) -> Result<Option<String>> + Send + Sync>;

/// Describes a signature implemented by rewriting the call into SQL.
#[revisioned(revision = 1)]
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewriteOptions {
	pub enabled: bool,
	/// The engine-defined identifier of the rewriter that expands the call.
	pub rewriter: u32,
	pub sql: String,
	pub allow_table_references: bool,
	pub allowed_function_groups: Vec<String>,
}

/// Options that apply to a whole signature.
#[derive(Clone)]
pub struct SignatureOptions {
	pub is_deprecated: bool,
	pub deprecation_warnings: Vec<String>,
	pub required_features: BTreeSet<LanguageFeature>,
	pub is_aliased_signature: bool,
	pub propagates_collation: bool,
	pub uses_operation_collation: bool,
	pub rejects_collation: bool,
	pub is_internal: bool,
	pub is_hidden: bool,
	pub rewrite: Option<RewriteOptions>,
	pub constraints: Option<ConstraintCallback>,
}

impl Default for SignatureOptions {
	fn default() -> Self {
		Self {
			is_deprecated: false,
			deprecation_warnings: Vec::new(),
			required_features: BTreeSet::new(),
			is_aliased_signature: false,
			propagates_collation: true,
			uses_operation_collation: false,
			rejects_collation: false,
			is_internal: false,
			is_hidden: false,
			rewrite: None,
			constraints: None,
		}
	}
}

impl fmt::Debug for SignatureOptions {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SignatureOptions")
			.field("is_deprecated", &self.is_deprecated)
			.field("deprecation_warnings", &self.deprecation_warnings)
			.field("required_features", &self.required_features)
			.field("is_aliased_signature", &self.is_aliased_signature)
			.field("propagates_collation", &self.propagates_collation)
			.field("uses_operation_collation", &self.uses_operation_collation)
			.field("rejects_collation", &self.rejects_collation)
			.field("is_internal", &self.is_internal)
			.field("is_hidden", &self.is_hidden)
			.field("rewrite", &self.rewrite)
			.field("constraints", &self.constraints.as_ref().map(|_| "<callback>"))
			.finish()
	}
}

impl SignatureOptions {
	pub fn deprecated(mut self) -> Self {
		self.is_deprecated = true;
		self
	}

	pub fn with_deprecation_warning(mut self, warning: impl Into<String>) -> Self {
		self.deprecation_warnings.push(warning.into());
		self
	}

	pub fn requires(mut self, feature: LanguageFeature) -> Self {
		self.required_features.insert(feature);
		self
	}

	pub fn with_rewrite(mut self, rewrite: RewriteOptions) -> Self {
		self.rewrite = Some(rewrite);
		self
	}

	pub fn with_constraints(
		mut self,
		check: impl Fn(&Signature, &[Type]) -> Result<Option<String>> + Send + Sync + 'static,
	) -> Self {
		self.constraints = Some(Arc::new(check));
		self
	}

	pub fn check_all_required_features_are_enabled(&self, language: &LanguageOptions) -> bool {
		self.required_features.iter().all(|f| language.is_enabled(*f))
	}

	/// The deprecation warning summary shown in verbose signature text.
	pub fn deprecation_warnings_debug_string(&self) -> Option<String> {
		match self.deprecation_warnings.len() {
			0 => None,
			1 => Some("(1 deprecation warning)".to_string()),
			n => Some(format!("({n} deprecation warnings)")),
		}
	}
}
