//! `returned` characteristic (RFC 7643 §7) against contexts and selections.

use crate::common::builders::UserBuilder;
use crate::common::fixtures::{self, USER};
use crate::common::{registry, registry_with_device};
use crate::{assert_error_attribute, assert_specific_validation_error, assert_validation_success};
use scim_models::{AttributeSelection, Context, DeserializeOptions, SchemaRegistry, Strictness, ValidationError};
use serde_json::{Value, json};

fn response(registry: &SchemaRegistry, selection: &AttributeSelection) -> Value {
    let user = UserBuilder::stored("2819c223", "bjensen")
        .with_password("t1meMa$heen")
        .with_attribute("displayName", "Babs Jensen")
        .build();
    registry
        .to_json(&user, Context::Response, selection)
        .expect("response serializes")
}

#[test]
fn test_password_is_never_emitted() {
    let registry = registry();
    let user = UserBuilder::stored("2819c223", "bjensen")
        .with_password("t1meMa$heen")
        .build();

    for context in Context::ALL {
        for selection in [
            AttributeSelection::none(),
            AttributeSelection::include(["password"]),
            AttributeSelection::exclude(["userName"]),
        ] {
            let json = registry
                .to_json(&user, context, &selection)
                .unwrap_or_else(|e| panic!("{context}: {e}"));
            assert!(json.get("password").is_none(), "password leaked in {context}");
        }
    }
}

#[test]
fn test_id_survives_any_selection() {
    let registry = registry();
    for selection in [
        AttributeSelection::none(),
        AttributeSelection::include(["userName"]),
        AttributeSelection::exclude(["id"]),
    ] {
        let json = response(&registry, &selection);
        assert_eq!(json["id"], "2819c223", "{selection:?}");
    }
}

#[test]
fn test_included_selection_is_an_allow_list() {
    let registry = registry();
    let json = response(&registry, &AttributeSelection::include(["userName"]));
    assert_eq!(
        json,
        json!({"schemas": [USER], "id": "2819c223", "userName": "bjensen"})
    );
}

#[test]
fn test_excluded_selection_drops_default_attributes() {
    let registry = registry();
    let json = response(&registry, &AttributeSelection::exclude(["displayName", "meta"]));
    assert_eq!(json["userName"], "bjensen");
    assert!(json.get("displayName").is_none());
    assert!(json.get("meta").is_none());
}

#[test]
fn test_create_then_respond_drops_password() {
    let registry = registry();
    let user = registry
        .deserialize(
            br#"{"schemas":["urn:ietf:params:scim:schemas:core:2.0:User"],"userName":"bob","password":"x"}"#,
            Context::RequestCreate,
            Strictness::Strict,
        )
        .expect("create request parses");
    assert_eq!(user.get("password"), Some(&json!("x")));

    let bytes = registry
        .serialize(&user, Context::Response, &AttributeSelection::none())
        .unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json, json!({"schemas": [USER], "userName": "bob"}));
}

#[test]
fn test_full_rfc_user_in_query_response() {
    let registry = registry();
    let user = registry
        .from_json(&fixtures::user_full(), Context::Response, &Default::default())
        .unwrap();
    let json = registry
        .to_json(
            &user,
            Context::ResponseQuery,
            &AttributeSelection::include(["name.givenName", "emails"]),
        )
        .unwrap();

    assert_eq!(json["id"], "2819c223-7f76-453a-919d-413861904646");
    assert_eq!(json["name"], json!({"givenName": "Barbara"}));
    assert_eq!(json["emails"].as_array().map(Vec::len), Some(2));
    assert!(json.get("displayName").is_none());
    assert!(json.get("groups").is_none());
}

#[test]
fn test_read_only_values_omitted_from_write_requests() {
    let registry = registry();
    let user = registry
        .from_json(&fixtures::user_full(), Context::Response, &Default::default())
        .unwrap();

    for context in [Context::RequestCreate, Context::RequestReplace, Context::RequestPatch] {
        let json = registry
            .to_json(&user, context, &AttributeSelection::none())
            .unwrap();
        assert!(json.get("meta").is_none(), "{context}");
        assert!(json.get("groups").is_none(), "{context}");
        assert_eq!(json["userName"], "bjensen@example.com");
    }
}

#[test]
fn test_rfc_minimal_and_group_examples() {
    let registry = registry();
    let user = registry
        .from_json(&fixtures::user_minimal_request(), Context::RequestCreate, &Default::default())
        .unwrap();
    let echoed = registry
        .to_json(&user, Context::ResponseCreate, &AttributeSelection::none())
        .unwrap();
    assert_eq!(echoed, fixtures::user_minimal_request());

    let group = registry
        .from_json(&fixtures::group_basic(), Context::Response, &Default::default())
        .unwrap();
    let members_only = registry
        .to_json(&group, Context::ResponseQuery, &AttributeSelection::include(["members.value"]))
        .unwrap();
    assert_eq!(
        members_only["members"],
        json!([
            {"value": "2819c223-7f76-453a-919d-413861904646"},
            {"value": "902c246b-6245-4190-8e05-00816be7344a"}
        ])
    );
    assert_eq!(members_only["id"], "e9e30dba-f08f-4109-8486-d5c6a331660a");
    assert!(members_only.get("displayName").is_none());
}

#[test]
fn test_received_responses_honor_returned() {
    let registry = registry();
    let leaked = json!({
        "schemas": [USER],
        "id": "2819c223",
        "userName": "bjensen",
        "password": "t1meMa$heen"
    });
    for context in Context::ALL.into_iter().filter(|c| c.is_response()) {
        assert_specific_validation_error!(
            registry.from_json(&leaked, context, &DeserializeOptions::lenient()),
            ValidationError::ReturnedViolation { .. }
        );
    }
    assert_validation_success!(registry.from_json(&leaked, Context::RequestCreate, &DeserializeOptions::strict()));

    let anonymous = json!({"schemas": [USER], "userName": "bjensen"});
    assert_error_attribute!(
        registry.from_json(&anonymous, Context::ResponseCreate, &DeserializeOptions::strict()),
        "id"
    );
    assert_validation_success!(registry.from_json(&anonymous, Context::Default, &DeserializeOptions::strict()));

    let device = registry_with_device();
    let secret = json!({
        "schemas": ["urn:example:params:scim:schemas:Device"],
        "serial": "SN-1",
        "enrollmentSecret": "hunter2"
    });
    assert_error_attribute!(
        device.from_json(&secret, Context::Response, &DeserializeOptions::strict()),
        "enrollmentSecret"
    );
}
