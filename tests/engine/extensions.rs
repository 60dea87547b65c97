//! Extension schema composition.

use crate::common::builders::{GroupBuilder, UserBuilder};
use crate::common::fixtures::{self, ENTERPRISE, GROUP, USER};
use crate::common::registry;
use crate::{assert_error_attribute, assert_specific_validation_error, assert_validation_error};
use scim_models::schema::{AttributeDefinition, AttributeType};
use scim_models::{
    AttributeSelection, Context, DeserializeOptions, ResourceInstance, ResourceType, Schema,
    SchemaUri, ScimError, Strictness, ValidationError,
};
use serde_json::{Value, json};

#[test]
fn test_extension_nested_under_urn() {
    let registry = registry();
    let user = UserBuilder::new("bjensen")
        .with_enterprise("701984", "Tour Operations")
        .build();

    let json = registry
        .to_json(&user, Context::Response, &AttributeSelection::none())
        .unwrap();
    assert_eq!(json["schemas"], json!([USER, ENTERPRISE]));
    assert_eq!(
        json[ENTERPRISE],
        json!({"employeeNumber": "701984", "department": "Tour Operations"})
    );
    assert!(json.get("employeeNumber").is_none());

    let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
    assert_eq!(keys, ["schemas", "userName", ENTERPRISE]);
}

#[test]
fn test_rfc_enterprise_user_round_trip() {
    let registry = registry();
    let user = registry
        .from_json(&fixtures::user_enterprise(), Context::Response, &DeserializeOptions::strict())
        .unwrap();

    let extension = user.extension(ENTERPRISE).expect("enterprise extension active");
    assert_eq!(extension.get("costCenter"), Some(&json!("4130")));

    let json = registry
        .to_json(&user, Context::Response, &AttributeSelection::none())
        .unwrap();
    assert_eq!(json, fixtures::user_enterprise());
}

#[test]
fn test_extension_key_matched_without_case() {
    let registry = registry();
    let payload = json!({
        "schemas": [USER, ENTERPRISE.to_uppercase()],
        "userName": "bjensen",
        ENTERPRISE.to_lowercase(): {"EMPLOYEENUMBER": "701984"}
    });
    let user = registry
        .from_json(&payload, Context::RequestCreate, &DeserializeOptions::strict())
        .unwrap();
    assert_eq!(
        user.extension(ENTERPRISE).and_then(|ext| ext.get("employeeNumber")),
        Some(&json!("701984"))
    );
}

#[test]
fn test_listed_extension_without_object_stays_active() {
    let registry = registry();
    let payload = json!({"schemas": [USER, ENTERPRISE], "userName": "bjensen"});
    let user = registry
        .from_json(&payload, Context::RequestCreate, &DeserializeOptions::strict())
        .unwrap();
    assert!(user.extension(ENTERPRISE).is_some_and(|ext| ext.is_empty()));

    let json = registry
        .to_json(&user, Context::Response, &AttributeSelection::none())
        .unwrap();
    assert_eq!(json, json!({"schemas": [USER, ENTERPRISE], "userName": "bjensen"}));
}

#[test]
fn test_unlisted_extension_key_is_activated() {
    let registry = registry();
    let payload = json!({
        "schemas": [USER],
        "id": "2819c223",
        "userName": "bjensen",
        ENTERPRISE: {"employeeNumber": "701984"}
    });
    for options in [DeserializeOptions::strict(), DeserializeOptions::lenient()] {
        let user = registry.from_json(&payload, Context::Response, &options).unwrap();
        assert_eq!(
            user.extension(ENTERPRISE).and_then(|ext| ext.get("employeeNumber")),
            Some(&json!("701984"))
        );

        let json = registry
            .to_json(&user, Context::Response, &AttributeSelection::none())
            .unwrap();
        assert_eq!(json["schemas"], json!([USER, ENTERPRISE]));
        assert_eq!(json[ENTERPRISE], json!({"employeeNumber": "701984"}));
    }

    let unsupported = json!({
        "schemas": [GROUP],
        "id": "e9e30dba",
        "displayName": "Tour Guides",
        ENTERPRISE: {"employeeNumber": "701984"}
    });
    assert_specific_validation_error!(
        registry.from_json(&unsupported, Context::Response, &DeserializeOptions::lenient()),
        ValidationError::UnsupportedExtension { .. }
    );
}

#[test]
fn test_extension_must_be_object() {
    let registry = registry();
    let payload = json!({
        "schemas": [USER, ENTERPRISE],
        "userName": "bjensen",
        ENTERPRISE: "701984"
    });
    assert_specific_validation_error!(
        registry.from_json(&payload, Context::Response, &DeserializeOptions::strict()),
        ValidationError::MalformedResource { .. }
    );
}

#[test]
fn test_extension_attribute_errors_are_qualified() {
    let registry = registry();
    let payload = json!({
        "schemas": [USER, ENTERPRISE],
        "id": "2819c223",
        "userName": "bjensen",
        ENTERPRISE: {"manager": {"value": 42}}
    });
    let path = format!("{ENTERPRISE}:manager.value");
    assert_error_attribute!(
        registry.from_json(&payload, Context::Response, &DeserializeOptions::strict()),
        path.as_str()
    );

    let unknown = json!({
        "schemas": [USER, ENTERPRISE],
        "id": "2819c223",
        "userName": "bjensen",
        ENTERPRISE: {"badgeColor": "green"}
    });
    let path = format!("{ENTERPRISE}:badgeColor");
    assert_error_attribute!(
        registry.from_json(&unknown, Context::Response, &DeserializeOptions::strict()),
        path.as_str()
    );
}

#[test]
fn test_manager_display_name_is_read_only() {
    let registry = registry();
    let user = UserBuilder::new("bjensen")
        .with_manager("26118915", "John Smith")
        .build();

    let request = registry
        .to_json(&user, Context::RequestReplace, &AttributeSelection::none())
        .unwrap();
    assert_eq!(request[ENTERPRISE], json!({"manager": {"value": "26118915"}}));

    let bytes = serde_json::to_vec(&registry.to_json(&user, Context::Response, &AttributeSelection::none()).unwrap())
        .unwrap();
    let path = format!("{ENTERPRISE}:manager.displayName");
    assert_error_attribute!(
        registry.deserialize(&bytes, Context::RequestReplace, Strictness::Strict),
        path.as_str()
    );
}

#[test]
fn test_group_does_not_accept_enterprise() {
    let registry = registry();
    let enterprise = ResourceInstance::new(SchemaUri::new(ENTERPRISE).unwrap()).with("employeeNumber", "1");
    let group = GroupBuilder::new("Tour Guides").build().with_extension(enterprise);
    assert_specific_validation_error!(
        registry.to_json(&group, Context::Response, &AttributeSelection::none()),
        ValidationError::UnsupportedExtension { .. }
    );

    let payload = json!({"schemas": [GROUP, ENTERPRISE], "displayName": "Tour Guides"});
    assert_validation_error!(registry.from_json(&payload, Context::Response, &DeserializeOptions::strict()));
}

#[test]
fn test_required_extension_enforced_on_create() {
    let mut registry = registry();
    let badge = Schema::new("urn:example:params:scim:schemas:extension:Badge", "Badge")
        .with_attribute(AttributeDefinition::new("color", AttributeType::String));
    let kiosk_schema = Schema::new("urn:example:params:scim:schemas:Kiosk", "Kiosk")
        .with_attribute(AttributeDefinition::new("location", AttributeType::String).required());
    registry.register(badge).unwrap();
    registry.register(kiosk_schema).unwrap();
    registry
        .register_resource_type(
            ResourceType::new("Kiosk", "/Kiosks", "urn:example:params:scim:schemas:Kiosk")
                .with_extension("urn:example:params:scim:schemas:extension:Badge", true),
        )
        .unwrap();

    let without = json!({"schemas": ["urn:example:params:scim:schemas:Kiosk"], "location": "Lobby"});
    assert_specific_validation_error!(
        registry.from_json(&without, Context::RequestCreate, &DeserializeOptions::strict()),
        ValidationError::MissingRequiredExtension { .. }
    );
    assert!(registry
        .from_json(&without, Context::Response, &DeserializeOptions::strict())
        .is_ok());

    let with: Value = json!({
        "schemas": [
            "urn:example:params:scim:schemas:Kiosk",
            "urn:example:params:scim:schemas:extension:Badge"
        ],
        "location": "Lobby",
        "urn:example:params:scim:schemas:extension:Badge": {"color": "red"}
    });
    let kiosk = registry
        .from_json(&with, Context::RequestCreate, &DeserializeOptions::strict())
        .unwrap();
    assert_eq!(kiosk.schema_uris().len(), 2);
}

#[test]
fn test_unknown_extension_schema() {
    let registry = registry();
    let payload = json!({
        "schemas": [USER, "urn:example:params:scim:schemas:extension:Nope"],
        "userName": "bjensen"
    });
    assert!(matches!(
        registry.from_json(&payload, Context::Response, &DeserializeOptions::strict()),
        Err(ScimError::UnknownSchema { .. })
    ));
}
