//! RFC 7643 §8 example payloads and schema URNs.

use serde_json::{Value, json};

pub const USER: &str = "urn:ietf:params:scim:schemas:core:2.0:User";
pub const GROUP: &str = "urn:ietf:params:scim:schemas:core:2.0:Group";
pub const ENTERPRISE: &str = "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User";
pub const SERVICE_PROVIDER_CONFIG: &str = "urn:ietf:params:scim:schemas:core:2.0:ServiceProviderConfig";

/// RFC 7643 §8.1, as a client would create it.
pub fn user_minimal_request() -> Value {
    json!({
        "schemas": [USER],
        "userName": "bjensen@example.com"
    })
}

/// RFC 7643 §8.2, as a server would return it.
pub fn user_full() -> Value {
    json!({
        "schemas": [USER],
        "id": "2819c223-7f76-453a-919d-413861904646",
        "externalId": "701984",
        "userName": "bjensen@example.com",
        "name": {
            "formatted": "Ms. Barbara J Jensen, III",
            "familyName": "Jensen",
            "givenName": "Barbara",
            "middleName": "Jane",
            "honorificPrefix": "Ms.",
            "honorificSuffix": "III"
        },
        "displayName": "Babs Jensen",
        "nickName": "Babs",
        "profileUrl": "https://login.example.com/bjensen",
        "emails": [
            {
                "value": "bjensen@example.com",
                "type": "work",
                "primary": true
            },
            {
                "value": "babs@jensen.org",
                "type": "home"
            }
        ],
        "addresses": [
            {
                "type": "work",
                "streetAddress": "100 Universal City Plaza",
                "locality": "Hollywood",
                "region": "CA",
                "postalCode": "91608",
                "country": "USA",
                "formatted": "100 Universal City Plaza\nHollywood, CA 91608 USA",
                "primary": true
            }
        ],
        "phoneNumbers": [
            {
                "value": "555-555-5555",
                "type": "work"
            },
            {
                "value": "555-555-4444",
                "type": "mobile"
            }
        ],
        "groups": [
            {
                "value": "e9e30dba-f08f-4109-8486-d5c6a331660a",
                "$ref": "https://example.com/v2/Groups/e9e30dba-f08f-4109-8486-d5c6a331660a",
                "display": "Tour Guides"
            }
        ],
        "userType": "Employee",
        "title": "Tour Guide",
        "preferredLanguage": "en-US",
        "locale": "en-US",
        "timezone": "America/Los_Angeles",
        "active": true,
        "meta": {
            "resourceType": "User",
            "created": "2010-01-23T04:56:22Z",
            "lastModified": "2011-05-13T04:42:34Z",
            "version": "W/\"a330bc54f0671c9\"",
            "location": "https://example.com/v2/Users/2819c223-7f76-453a-919d-413861904646"
        }
    })
}

/// RFC 7643 §8.3, trimmed to the enterprise part.
pub fn user_enterprise() -> Value {
    json!({
        "schemas": [USER, ENTERPRISE],
        "id": "2819c223-7f76-453a-919d-413861904646",
        "userName": "bjensen@example.com",
        ENTERPRISE: {
            "employeeNumber": "701984",
            "costCenter": "4130",
            "organization": "Universal Studios",
            "division": "Theme Park",
            "department": "Tour Operations",
            "manager": {
                "value": "26118915-6090-4610-87e4-49d8ca9f808d",
                "$ref": "../Users/26118915-6090-4610-87e4-49d8ca9f808d",
                "displayName": "John Smith"
            }
        }
    })
}

/// RFC 7643 §8.4.
pub fn group_basic() -> Value {
    json!({
        "schemas": [GROUP],
        "id": "e9e30dba-f08f-4109-8486-d5c6a331660a",
        "displayName": "Tour Guides",
        "members": [
            {
                "value": "2819c223-7f76-453a-919d-413861904646",
                "$ref": "https://example.com/v2/Users/2819c223-7f76-453a-919d-413861904646",
                "display": "Babs Jensen"
            },
            {
                "value": "902c246b-6245-4190-8e05-00816be7344a",
                "$ref": "https://example.com/v2/Users/902c246b-6245-4190-8e05-00816be7344a",
                "display": "Mandy Pepperidge"
            }
        ]
    })
}

/// RFC 7643 §8.5.
pub fn service_provider_config() -> Value {
    json!({
        "schemas": [SERVICE_PROVIDER_CONFIG],
        "documentationUri": "http://example.com/help/scim.html",
        "patch": {"supported": true},
        "bulk": {"supported": true, "maxOperations": 1000, "maxPayloadSize": 1048576},
        "filter": {"supported": true, "maxResults": 200},
        "changePassword": {"supported": true},
        "sort": {"supported": true},
        "etag": {"supported": true},
        "authenticationSchemes": [
            {
                "type": "oauthbearertoken",
                "name": "OAuth Bearer Token",
                "description": "Authentication scheme using the OAuth Bearer Token Standard",
                "specUri": "http://www.rfc-editor.org/info/rfc6750",
                "documentationUri": "http://example.com/help/oauth.html",
                "primary": true
            },
            {
                "type": "httpbasic",
                "name": "HTTP Basic",
                "description": "Authentication scheme using the HTTP Basic Standard",
                "specUri": "http://www.rfc-editor.org/info/rfc2617",
                "documentationUri": "http://example.com/help/httpBasic.html"
            }
        ],
        "meta": {
            "resourceType": "ServiceProviderConfig",
            "created": "2010-01-23T04:56:22Z",
            "lastModified": "2011-05-13T04:42:34Z",
            "location": "https://example.com/v2/ServiceProviderConfig",
            "version": "W/\"3694e05e9dff594\""
        }
    })
}

/// A custom base schema in RFC 7643 §7 form, with no resource type.
pub fn device_schema() -> Value {
    json!({
        "id": "urn:example:params:scim:schemas:Device",
        "name": "Device",
        "description": "Managed hardware",
        "attributes": [
            {
                "name": "serial",
                "type": "string",
                "multiValued": false,
                "required": true,
                "caseExact": true,
                "mutability": "immutable",
                "returned": "default",
                "uniqueness": "global"
            },
            {
                "name": "enrollmentSecret",
                "type": "string",
                "multiValued": false,
                "required": false,
                "caseExact": true,
                "mutability": "writeOnly",
                "returned": "never",
                "uniqueness": "none"
            },
            {
                "name": "lastSeen",
                "type": "dateTime",
                "multiValued": false,
                "required": false,
                "caseExact": false,
                "mutability": "readOnly",
                "returned": "request",
                "uniqueness": "none"
            },
            {
                "name": "firmware",
                "type": "complex",
                "multiValued": false,
                "required": false,
                "caseExact": false,
                "mutability": "readWrite",
                "returned": "default",
                "uniqueness": "none",
                "subAttributes": [
                    {
                        "name": "version",
                        "type": "string",
                        "multiValued": false,
                        "required": true,
                        "caseExact": true,
                        "mutability": "readWrite",
                        "returned": "default",
                        "uniqueness": "none"
                    },
                    {
                        "name": "channel",
                        "type": "string",
                        "multiValued": false,
                        "required": false,
                        "caseExact": false,
                        "mutability": "immutable",
                        "returned": "default",
                        "uniqueness": "none",
                        "canonicalValues": ["stable", "beta"]
                    }
                ]
            }
        ]
    })
}
