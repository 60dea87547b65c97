//! Common test utilities for the SCIM model test suite.
//!
//! This module provides assertion macros, RFC fixtures and fluent builders
//! shared by the engine and message tests.

use scim_models::SchemaRegistry;
use std::sync::Once;

pub mod builders;
pub mod fixtures;

static INIT: Once = Once::new();

/// Route `log` output through the test harness once per binary.
pub fn init_logging() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// A registry with the embedded RFC 7643 schemas and resource types.
pub fn registry() -> SchemaRegistry {
    init_logging();
    SchemaRegistry::new().expect("embedded schemas register")
}

/// [`registry`] plus the Device schema from [`fixtures::device_schema`].
pub fn registry_with_device() -> SchemaRegistry {
    let mut registry = registry();
    let device = SchemaRegistry::load_schema_from_str(&fixtures::device_schema().to_string())
        .expect("device schema parses");
    registry.register(device).expect("device schema registers");
    registry
}

/// Custom assertion macro for validation errors
#[macro_export]
macro_rules! assert_validation_error {
    ($result:expr) => {
        match $result {
            Err(scim_models::ScimError::Validation(_)) => {
                // Error occurred as expected
            }
            Ok(_) => panic!("Expected validation error, but validation passed"),
            Err(other) => panic!("Expected validation error, got {:?}", other),
        }
    };
}

/// Custom assertion macro for specific validation error types
#[macro_export]
macro_rules! assert_specific_validation_error {
    ($result:expr, $error_variant:pat) => {
        match $result {
            Err(scim_models::ScimError::Validation($error_variant)) => {
                // Specific error type matched
            }
            Ok(_) => panic!("Expected validation error, but validation passed"),
            Err(other) => panic!("Expected specific validation error, got {:?}", other),
        }
    };
}

/// Custom assertion macro for the attribute path an error names
#[macro_export]
macro_rules! assert_error_attribute {
    ($result:expr, $attribute:expr) => {
        match $result {
            Err(scim_models::ScimError::Validation(error)) => assert_eq!(
                error.attribute(),
                Some($attribute),
                "unexpected attribute in {}",
                error
            ),
            Ok(_) => panic!("Expected error on '{}', but validation passed", $attribute),
            Err(other) => panic!("Expected validation error on '{}', got {:?}", $attribute, other),
        }
    };
}

/// Custom assertion macro for validation success
#[macro_export]
macro_rules! assert_validation_success {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(err) => panic!("Expected validation to succeed, but got error: {}", err),
        }
    };
}
