use std::sync::LazyLock;

use sqlsig_types::ProductMode;

/// The maximum number of arguments accepted when decoding a persisted signature.
pub static MAX_SIGNATURE_ARGUMENTS: LazyLock<usize> =
	lazy_env_parse!("SQLSIG_MAX_SIGNATURE_ARGUMENTS", usize, 1024);

/// Specifies how deeply function-type arguments may nest in a persisted signature.
pub static MAX_LAMBDA_DEPTH: LazyLock<usize> =
	lazy_env_parse!("SQLSIG_MAX_LAMBDA_DEPTH", usize, 8);

/// The product mode used when validating a signature during construction.
pub const VALIDATION_PRODUCT_MODE: ProductMode = ProductMode::External;
