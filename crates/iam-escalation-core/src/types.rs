//! Strong type definitions for escalation instructions.
//!
//! Resource kinds, resource references and principals are distinct types so
//! a resource ID can never be passed where a member is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};

/// The kinds of cloud resource whose policy can be escalated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Project,
    Folder,
    Organization,
}

impl ResourceType {
    /// All supported resource types.
    pub const ALL: [ResourceType; 3] = [
        ResourceType::Project,
        ResourceType::Folder,
        ResourceType::Organization,
    ];

    /// The resource-name prefix used by the cloud control plane.
    pub const fn path_prefix(&self) -> &'static str {
        match self {
            ResourceType::Project => "projects/",
            ResourceType::Folder => "folders/",
            ResourceType::Organization => "organizations/",
        }
    }

    /// The wire name used in escalation payloads.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Project => "project",
            ResourceType::Folder => "folder",
            ResourceType::Organization => "organization",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "project" => Ok(ResourceType::Project),
            "folder" => Ok(ResourceType::Folder),
            "organization" => Ok(ResourceType::Organization),
            other => Err(CoreError::UnsupportedResourceType(other.to_string())),
        }
    }
}

/// A concrete resource: its kind plus the control-plane identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
    pub resource_type: ResourceType,
    pub resource_id: String,
}

impl ResourceRef {
    /// Create a new resource reference.
    ///
    /// The ID must be non-empty and free of `/` and whitespace, since it is
    /// spliced into a resource path.
    pub fn new(resource_type: ResourceType, resource_id: impl Into<String>) -> Result<Self> {
        let resource_id = resource_id.into();
        if resource_id.is_empty() {
            return Err(CoreError::MalformedPayload("resource_id is empty".into()));
        }
        if resource_id.contains('/') || resource_id.chars().any(char::is_whitespace) {
            return Err(CoreError::MalformedPayload(format!(
                "resource_id {resource_id:?} is not a plain identifier"
            )));
        }
        Ok(Self {
            resource_type,
            resource_id,
        })
    }

    /// Shorthand for a project reference.
    pub fn project(id: impl Into<String>) -> Result<Self> {
        Self::new(ResourceType::Project, id)
    }

    /// Shorthand for a folder reference.
    pub fn folder(id: impl Into<String>) -> Result<Self> {
        Self::new(ResourceType::Folder, id)
    }

    /// Shorthand for an organization reference.
    pub fn organization(id: impl Into<String>) -> Result<Self> {
        Self::new(ResourceType::Organization, id)
    }

    /// The full resource name, e.g. `projects/123`.
    pub fn path(&self) -> String {
        format!("{}{}", self.resource_type.path_prefix(), self.resource_id)
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.resource_type, self.resource_id)
    }
}

/// A policy member identifier, e.g. `user:alice@example.com`.
///
/// Opaque beyond construction: membership checks compare the full string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(String);

impl Principal {
    /// Wrap an already-qualified member string.
    pub fn new(member: impl Into<String>) -> Self {
        Self(member.into())
    }

    /// The member string for a human user.
    pub fn user(email: &str) -> Self {
        Self(format!("user:{email}"))
    }

    /// Borrow the member string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Take the member string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Principal {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The escalation instruction carried in a request's `payload` string.
///
/// The producer stores this JSON as the dynamic secret's payload, so it is
/// the same for create and revoke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscalationPayload {
    pub role: String,
    pub resource: ResourceRef,
}

/// Wire shape of the payload before validation.
#[derive(Deserialize)]
struct RawPayload {
    role: String,
    resource_type: String,
    resource_id: String,
}

impl EscalationPayload {
    /// Parse and validate a payload string.
    ///
    /// Unknown resource types fail with [`CoreError::UnsupportedResourceType`];
    /// anything else that is wrong is [`CoreError::MalformedPayload`].
    pub fn parse(raw: &str) -> Result<Self> {
        let raw: RawPayload = serde_json::from_str(raw)
            .map_err(|e| CoreError::MalformedPayload(e.to_string()))?;

        if raw.role.trim().is_empty() {
            return Err(CoreError::MalformedPayload("role is empty".into()));
        }

        let resource_type = raw.resource_type.parse::<ResourceType>()?;
        let resource = ResourceRef::new(resource_type, raw.resource_id)?;

        Ok(Self {
            role: raw.role,
            resource,
        })
    }
}
