use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use sqlsig_types::ProductMode;

/// An optional engine feature that a signature can depend on.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageFeature(pub u32);

impl fmt::Display for LanguageFeature {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "FEATURE_{}", self.0)
	}
}

/// The language settings a signature is checked against.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LanguageOptions {
	pub product_mode: ProductMode,
	enabled: BTreeSet<LanguageFeature>,
}

impl LanguageOptions {
	pub fn new(product_mode: ProductMode) -> Self {
		Self {
			product_mode,
			enabled: BTreeSet::new(),
		}
	}

	pub fn enable(&mut self, feature: LanguageFeature) {
		self.enabled.insert(feature);
	}

	pub fn disable(&mut self, feature: LanguageFeature) {
		self.enabled.remove(&feature);
	}

	pub fn with_features(mut self, features: impl IntoIterator<Item = LanguageFeature>) -> Self {
		self.enabled.extend(features);
		self
	}

	pub fn is_enabled(&self, feature: LanguageFeature) -> bool {
		self.enabled.contains(&feature)
	}

	pub fn enabled_features(&self) -> impl Iterator<Item = LanguageFeature> + '_ {
		self.enabled.iter().copied()
	}
}
