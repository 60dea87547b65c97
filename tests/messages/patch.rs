//! PATCH requests (RFC 7644 §3.5.2) parsed, validated and applied.

use crate::common::builders::{GroupBuilder, UserBuilder};
use crate::common::fixtures::{ENTERPRISE, USER};
use crate::common::registry;
use crate::{assert_error_attribute, assert_specific_validation_error};
use scim_models::{
    AttributeSelection, Context, ErrorResponse, PatchOp, PatchOpKind, PatchOperation, SchemaUri,
    ValidationError,
};
use serde_json::json;

#[test]
fn test_add_member_to_group() {
    let registry = registry();
    let mut group = GroupBuilder::new("Tour Guides")
        .with_id("e9e30dba")
        .with_member("2819c223", "Babs Jensen")
        .build();
    let patch = PatchOp::from_json(&json!({
        "schemas": ["urn:ietf:params:scim:api:messages:2.0:PatchOp"],
        "Operations": [{
            "op": "add",
            "path": "members",
            "value": [{
                "$ref": "https://example.com/v2/Users/902c246b",
                "value": "902c246b"
            }]
        }]
    }))
    .unwrap();

    assert!(patch.apply(&registry, &mut group).unwrap());
    let members = group.get("members").and_then(|m| m.as_array()).unwrap();
    assert_eq!(members.len(), 2);
    assert_eq!(members[1]["value"], "902c246b");

    // the same value is not appended twice
    assert!(!patch.apply(&registry, &mut group).unwrap());
}

#[test]
fn test_replace_without_path() {
    let registry = registry();
    let mut user = UserBuilder::stored("2819c223", "bjensen")
        .with_name("Barbara", "Jensen")
        .build();
    let patch = PatchOp::new(vec![PatchOperation::without_path(
        PatchOpKind::Replace,
        json!({"displayName": "Babs", "NAME": {"givenName": "Babs"}, "active": true}),
    )]);

    assert!(patch.apply(&registry, &mut user).unwrap());
    assert_eq!(user.get("displayName"), Some(&json!("Babs")));
    assert_eq!(user.get("name"), Some(&json!({"givenName": "Babs"})));
    assert_eq!(user.get("active"), Some(&json!(true)));
}

#[test]
fn test_extension_attribute_activates_extension() {
    let registry = registry();
    let mut user = UserBuilder::new("bjensen").build();
    let patch = PatchOp::new(vec![
        PatchOperation::add(format!("{ENTERPRISE}:employeeNumber"), "701984"),
        PatchOperation::replace(format!("{ENTERPRISE}:manager.value"), "26118915"),
    ]);

    assert!(patch.apply(&registry, &mut user).unwrap());
    let json = registry
        .to_json(&user, Context::Response, &AttributeSelection::none())
        .unwrap();
    assert_eq!(json["schemas"], json!([USER, ENTERPRISE]));
    assert_eq!(
        json[ENTERPRISE],
        json!({"employeeNumber": "701984", "manager": {"value": "26118915"}})
    );

    let remove = PatchOp::new(vec![PatchOperation::remove(ENTERPRISE)]);
    assert!(remove.apply(&registry, &mut user).unwrap());
    assert!(user.extensions().is_empty());
}

#[test]
fn test_remove_operations() {
    let registry = registry();
    let mut user = UserBuilder::new("bjensen")
        .with_name("Barbara", "Jensen")
        .with_email("bjensen@example.com", "work")
        .with_email("babs@jensen.org", "home")
        .build();

    let home = json!({"value": "babs@jensen.org", "type": "home"});
    let patch = PatchOp::new(vec![
        PatchOperation::remove("emails").with_value(home),
        PatchOperation::remove("name.givenName"),
    ]);
    assert!(patch.apply(&registry, &mut user).unwrap());
    assert_eq!(user.get("emails").and_then(|e| e.as_array()).map(Vec::len), Some(1));
    assert_eq!(user.get("name"), Some(&json!({"familyName": "Jensen"})));

    let nothing_left = PatchOp::new(vec![PatchOperation::remove("nickName")]);
    assert!(!nothing_left.apply(&registry, &mut user).unwrap());
}

#[test]
fn test_failed_patch_leaves_resource_untouched() {
    let registry = registry();
    let original = UserBuilder::stored("2819c223", "bjensen").build();
    let mut user = original.clone();

    let patch = PatchOp::new(vec![
        PatchOperation::replace("displayName", "Babs"),
        PatchOperation::replace("id", "someone-else"),
    ]);
    let error = patch.apply(&registry, &mut user).unwrap_err();
    assert_eq!(user, original);

    let response = ErrorResponse::from(&error);
    assert_eq!(response.status, 400);
    assert_eq!(response.scim_type.as_deref(), Some("mutability"));
}

#[test]
fn test_remove_required_with_value_is_rejected() {
    let registry = registry();
    let original = UserBuilder::stored("2819c223", "bob").build();
    let mut user = original.clone();

    let patch = PatchOp::new(vec![PatchOperation::remove("userName").with_value("bob")]);
    assert_error_attribute!(patch.apply(&registry, &mut user), "userName");
    assert_eq!(user, original);
    assert_eq!(user.get("userName"), Some(&json!("bob")));
}

#[test]
fn test_patch_validation_errors() {
    let registry = registry();
    let base = SchemaUri::new(USER).unwrap();

    let required = PatchOp::new(vec![PatchOperation::remove("userName")]);
    assert_error_attribute!(required.validate(&registry, &base), "userName");

    let filtered = PatchOp::new(vec![PatchOperation::replace("emails[type eq \"work\"].value", "x")]);
    assert_specific_validation_error!(
        filtered.validate(&registry, &base),
        ValidationError::InvalidFilterPath { .. }
    );

    let wrong_type = PatchOp::new(vec![PatchOperation::replace("active", "yes")]);
    assert_error_attribute!(wrong_type.validate(&registry, &base), "active");

    let no_value = PatchOp::new(vec![PatchOperation::without_path(PatchOpKind::Add, json!(null))]);
    assert_specific_validation_error!(
        no_value.validate(&registry, &base),
        ValidationError::InvalidPatchOperation { .. }
    );

    let empty = PatchOp::new(Vec::new());
    assert_specific_validation_error!(
        empty.validate(&registry, &base),
        ValidationError::InvalidPatchOperation { .. }
    );
}

#[test]
fn test_patch_body_round_trip() {
    let patch = PatchOp::new(vec![
        PatchOperation::add("emails", json!({"value": "b@example.com", "type": "home"})),
        PatchOperation::remove("nickName"),
    ]);
    let json = patch.to_json().unwrap();
    assert_eq!(json["Operations"][0]["op"], "add");
    assert!(json["Operations"][1].get("value").is_none());

    let lowercase = json!({
        "schemas": ["urn:ietf:params:scim:api:messages:2.0:PatchOp"],
        "operations": [{"op": "Replace", "path": "displayName", "value": "Babs"}]
    });
    let parsed = PatchOp::from_json(&lowercase).unwrap();
    assert_eq!(parsed.operations[0].op, PatchOpKind::Replace);

    let wrong_schema = json!({"schemas": [USER], "Operations": []});
    assert!(PatchOp::from_json(&wrong_schema).is_err());
}
