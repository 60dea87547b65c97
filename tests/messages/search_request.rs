//! `.search` request bodies (RFC 7644 §3.4.3) feeding the engine.

use crate::common::builders::UserBuilder;
use crate::common::registry;
use crate::assert_specific_validation_error;
use scim_models::messages::SEARCH_REQUEST_URN;
use scim_models::messages::SortOrder;
use scim_models::{Context, ListResponse, SearchRequest, ValidationError};
use serde_json::json;

#[test]
fn test_rfc_search_request_drives_list_response() {
    let registry = registry();
    let request = SearchRequest::from_json(&json!({
        "schemas": [SEARCH_REQUEST_URN],
        "attributes": ["displayName", "userName"],
        "filter": "displayName sw \"smith\"",
        "startIndex": 1,
        "count": 10
    }))
    .unwrap();
    assert_eq!(request.filter.as_deref(), Some("displayName sw \"smith\""));
    assert_eq!(request.start_index_0(), Some(0));
    assert_eq!(request.stop_index_0(), Some(10));

    let selection = request.selection().unwrap();
    let user = UserBuilder::stored("902c246b", "jsmith")
        .with_attribute("displayName", "John Smith")
        .with_attribute("nickName", "Johnny")
        .build();
    let json = ListResponse::new(vec![user])
        .to_json(&registry, Context::ResponseSearch, &selection)
        .unwrap();
    assert_eq!(
        json["Resources"][0],
        json!({
            "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
            "id": "902c246b",
            "userName": "jsmith",
            "displayName": "John Smith"
        })
    );
}

#[test]
fn test_paging_is_clamped() {
    let request = SearchRequest::from_json(&json!({
        "schemas": [SEARCH_REQUEST_URN],
        "startIndex": -4,
        "count": -1,
        "sortBy": "userName",
        "sortOrder": "descending"
    }))
    .unwrap();
    assert_eq!(request.start_index, Some(1));
    assert_eq!(request.count, Some(0));
    assert_eq!(request.sort_order, Some(SortOrder::Descending));

    let built = SearchRequest::new().with_page(0, 25);
    assert_eq!(built.start_index_0(), Some(0));
    assert_eq!(built.stop_index_0(), Some(25));
    assert_eq!(SearchRequest::new().stop_index_0(), None);
}

#[test]
fn test_conflicting_selection_rejected() {
    let body = json!({
        "schemas": [SEARCH_REQUEST_URN],
        "attributes": ["userName"],
        "excludedAttributes": ["emails"]
    });
    assert_specific_validation_error!(
        SearchRequest::from_json(&body),
        ValidationError::ConflictingAttributeSelection
    );
}

#[test]
fn test_request_serializes_camel_case() {
    let request = SearchRequest::new()
        .with_excluded_attributes(["emails"])
        .with_filter("userName eq \"bjensen\"");
    let json = request.to_json().unwrap();
    assert_eq!(
        json,
        json!({
            "schemas": [SEARCH_REQUEST_URN],
            "excludedAttributes": ["emails"],
            "filter": "userName eq \"bjensen\""
        })
    );
    assert_eq!(SearchRequest::from_json(&json).unwrap(), request);

    assert!(SearchRequest::from_json(&json!({"filter": "x"})).is_err());
}
