//! Mutability enforcement while reading client payloads.

use crate::common::builders::{GroupBuilder, UserBuilder};
use crate::common::fixtures::{self, GROUP, USER};
use crate::common::{registry, registry_with_device};
use crate::{assert_error_attribute, assert_specific_validation_error, assert_validation_success};
use scim_models::{Context, DeserializeOptions, ValidationError};
use serde_json::json;

#[test]
fn test_read_only_rejected_in_every_request() {
    let registry = registry();
    let payload = json!({"schemas": [USER], "id": "2819c223", "userName": "bjensen"});

    for context in Context::ALL.into_iter().filter(|c| c.is_request()) {
        let result = registry.from_json(&payload, context, &DeserializeOptions::strict());
        assert_specific_validation_error!(result, ValidationError::ReadOnlyViolation { .. });
    }
    assert_validation_success!(registry.from_json(&payload, Context::Response, &DeserializeOptions::strict()));
}

#[test]
fn test_read_only_sub_attribute_named_in_error() {
    let registry = registry();
    let payload = json!({
        "schemas": [GROUP],
        "displayName": "Tour Guides",
        "members": [{"value": "2819c223", "display": "Babs Jensen"}]
    });
    assert_error_attribute!(
        registry.from_json(&payload, Context::RequestCreate, &DeserializeOptions::strict()),
        "members.display"
    );
}

#[test]
fn test_read_only_violation_names_context() {
    let registry = registry();
    let result = registry.from_json(&fixtures::user_full(), Context::RequestReplace, &DeserializeOptions::strict());
    match result {
        Err(scim_models::ScimError::Validation(ValidationError::ReadOnlyViolation { attribute, context })) => {
            assert_eq!(attribute, "id");
            assert_eq!(context, Context::RequestReplace.to_string());
        }
        other => panic!("expected a read-only violation, got {other:?}"),
    }
}

#[test]
fn test_write_only_rejected_in_searches() {
    let registry = registry();
    let payload = json!({"schemas": [USER], "userName": "bjensen", "password": "secret"});

    for context in [Context::RequestQuery, Context::RequestSearch] {
        assert_specific_validation_error!(
            registry.from_json(&payload, context, &DeserializeOptions::strict()),
            ValidationError::WriteOnlyViolation { .. }
        );
    }
    for context in [Context::RequestCreate, Context::RequestReplace, Context::RequestPatch] {
        assert_validation_success!(registry.from_json(&payload, context, &DeserializeOptions::strict()));
    }
}

#[test]
fn test_required_enforced_only_on_create_and_replace() {
    let registry = registry();
    let payload = json!({"schemas": [USER], "displayName": "Nobody"});

    for context in Context::ALL {
        let result = registry.from_json(&payload, context, &DeserializeOptions::strict());
        if context.enforces_required() {
            assert_error_attribute!(result, "userName");
        } else if context.is_request() {
            assert_validation_success!(result);
        }
    }
}

#[test]
fn test_immutable_compared_with_original_on_replace() {
    let registry = registry();
    let stored = GroupBuilder::new("Tour Guides")
        .with_member("2819c223", "Babs Jensen")
        .build();
    let replacement = json!({
        "schemas": [GROUP],
        "displayName": "Tour Guides",
        "members": [{"value": "902c246b"}]
    });

    // multi-valued members are replaced wholesale; only single values are compared
    let options = DeserializeOptions::strict().with_original(&stored);
    assert_validation_success!(registry.from_json(&replacement, Context::RequestReplace, &options));
}

#[test]
fn test_immutable_sub_attribute_of_single_complex() {
    let registry = registry_with_device();
    let stored = registry
        .from_json(
            &json!({
                "schemas": ["urn:example:params:scim:schemas:Device"],
                "serial": "SN-1",
                "firmware": {"version": "1.0", "channel": "stable"}
            }),
            Context::Response,
            &DeserializeOptions::strict(),
        )
        .unwrap();
    let options = DeserializeOptions::strict().with_original(&stored);

    let same_serial = json!({
        "schemas": ["urn:example:params:scim:schemas:Device"],
        "serial": "SN-1",
        "firmware": {"version": "1.1", "channel": "STABLE"}
    });
    assert_validation_success!(registry.from_json(&same_serial, Context::RequestReplace, &options));

    let new_channel = json!({
        "schemas": ["urn:example:params:scim:schemas:Device"],
        "serial": "SN-1",
        "firmware": {"version": "1.1", "channel": "beta"}
    });
    assert_error_attribute!(
        registry.from_json(&new_channel, Context::RequestReplace, &options),
        "firmware.channel"
    );

    let new_serial = json!({
        "schemas": ["urn:example:params:scim:schemas:Device"],
        "serial": "sn-1"
    });
    assert_specific_validation_error!(
        registry.from_json(&new_serial, Context::RequestReplace, &options),
        ValidationError::ImmutableViolation { .. }
    );

    // without an original there is nothing to compare against
    assert_validation_success!(registry.from_json(
        &new_serial,
        Context::RequestReplace,
        &DeserializeOptions::strict()
    ));
}

#[test]
fn test_dropping_immutable_values_on_replace() {
    let registry = registry_with_device();
    let stored = registry
        .from_json(
            &json!({
                "schemas": ["urn:example:params:scim:schemas:Device"],
                "serial": "SN-1",
                "firmware": {"version": "1.0", "channel": "stable"}
            }),
            Context::Response,
            &DeserializeOptions::strict(),
        )
        .unwrap();
    let options = DeserializeOptions::strict().with_original(&stored);

    let no_serial = json!({
        "schemas": ["urn:example:params:scim:schemas:Device"],
        "firmware": {"version": "1.0", "channel": "stable"}
    });
    assert_error_attribute!(
        registry.from_json(&no_serial, Context::RequestReplace, &options),
        "serial"
    );

    let no_channel = json!({
        "schemas": ["urn:example:params:scim:schemas:Device"],
        "serial": "SN-1",
        "firmware": {"version": "1.1"}
    });
    assert_error_attribute!(
        registry.from_json(&no_channel, Context::RequestReplace, &options),
        "firmware.channel"
    );

    let no_firmware = json!({"schemas": ["urn:example:params:scim:schemas:Device"], "serial": "SN-1"});
    assert_specific_validation_error!(
        registry.from_json(&no_firmware, Context::RequestReplace, &options),
        ValidationError::ImmutableViolation { .. }
    );
    assert_validation_success!(registry.from_json(
        &no_firmware,
        Context::RequestReplace,
        &DeserializeOptions::strict()
    ));
}

#[test]
fn test_immutable_ignored_outside_replace() {
    let registry = registry();
    let stored = UserBuilder::stored("2819c223", "bjensen").build();
    let options = DeserializeOptions::strict().with_original(&stored);
    let payload = json!({"schemas": [USER], "userName": "someone-else"});
    assert_validation_success!(registry.from_json(&payload, Context::RequestCreate, &options));
}
