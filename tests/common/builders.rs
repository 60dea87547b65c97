//! Test data builders for creating SCIM resource instances.
//!
//! Builders start from a valid resource and are modified step by step, so
//! each test states only the part it cares about.

use super::fixtures::{ENTERPRISE, GROUP, USER};
use scim_models::{ResourceInstance, SchemaUri};
use serde_json::{Value, json};

fn uri(urn: &str) -> SchemaUri {
    SchemaUri::new(urn).expect("fixture URN is valid")
}

/// Builder for User instances with fluent API
#[derive(Debug, Clone)]
pub struct UserBuilder {
    instance: ResourceInstance,
}

impl UserBuilder {
    /// Minimal valid User: a `userName` and nothing else
    pub fn new(user_name: &str) -> Self {
        Self {
            instance: ResourceInstance::new(uri(USER)).with("userName", user_name),
        }
    }

    /// Server-side User with `id` and `meta` assigned
    pub fn stored(id: &str, user_name: &str) -> Self {
        Self::new(user_name).with_id(id).with_meta("User")
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.instance.set("id", id);
        self
    }

    pub fn with_meta(mut self, resource_type: &str) -> Self {
        self.instance.set(
            "meta",
            json!({
                "resourceType": resource_type,
                "created": "2010-01-23T04:56:22Z",
                "lastModified": "2011-05-13T04:42:34Z",
                "version": "W/\"3694e05e9dff590\""
            }),
        );
        self
    }

    pub fn with_password(mut self, password: &str) -> Self {
        self.instance.set("password", password);
        self
    }

    pub fn with_name(mut self, given: &str, family: &str) -> Self {
        self.instance
            .set("name", json!({"givenName": given, "familyName": family}));
        self
    }

    /// Append an email, making the first one primary
    pub fn with_email(mut self, value: &str, kind: &str) -> Self {
        let mut emails = match self.instance.remove("emails") {
            Some(Value::Array(emails)) => emails,
            _ => Vec::new(),
        };
        let mut email = json!({"value": value, "type": kind});
        if emails.is_empty() {
            email["primary"] = json!(true);
        }
        emails.push(email);
        self.instance.set("emails", Value::Array(emails));
        self
    }

    pub fn with_attribute(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.instance.set(name, value);
        self
    }

    pub fn with_enterprise(mut self, employee_number: &str, department: &str) -> Self {
        self.instance.set_extension(
            ResourceInstance::new(uri(ENTERPRISE))
                .with("employeeNumber", employee_number)
                .with("department", department),
        );
        self
    }

    pub fn with_manager(mut self, value: &str, display_name: &str) -> Self {
        self.instance
            .extension_or_insert(uri(ENTERPRISE))
            .set("manager", json!({"value": value, "displayName": display_name}));
        self
    }

    pub fn build(self) -> ResourceInstance {
        self.instance
    }
}

/// Builder for Group instances
#[derive(Debug, Clone)]
pub struct GroupBuilder {
    instance: ResourceInstance,
}

impl GroupBuilder {
    pub fn new(display_name: &str) -> Self {
        Self {
            instance: ResourceInstance::new(uri(GROUP)).with("displayName", display_name),
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.instance.set("id", id);
        self
    }

    pub fn with_member(mut self, value: &str, display: &str) -> Self {
        let mut members = match self.instance.remove("members") {
            Some(Value::Array(members)) => members,
            _ => Vec::new(),
        };
        members.push(json!({
            "value": value,
            "$ref": format!("https://example.com/v2/Users/{value}"),
            "type": "User",
            "display": display
        }));
        self.instance.set("members", Value::Array(members));
        self
    }

    pub fn build(self) -> ResourceInstance {
        self.instance
    }
}
