//! Subject identity and group membership

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::{RbacError, RbacResult};

/// Group every authenticated requester belongs to
pub const GROUP_AUTHENTICATED: &str = "system:authenticated";
/// Group every service account belongs to
pub const GROUP_SERVICE_ACCOUNTS: &str = "system:serviceaccounts";

const SERVICE_ACCOUNT_PREFIX: &str = "system:serviceaccount:";
const SYSTEM_PREFIX: &str = "system:";

/// Kind of requester
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubjectKind {
    User,
    Group,
    ServiceAccount,
}

impl SubjectKind {
    /// Kind name as it appears in binding subject lists
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectKind::User => "User",
            SubjectKind::Group => "Group",
            SubjectKind::ServiceAccount => "ServiceAccount",
        }
    }
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The identity whose access is being evaluated
///
/// Equality compares identity only: kind, name, and the namespace of a
/// service account. Explicit groups are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    /// User, Group or ServiceAccount
    pub kind: SubjectKind,
    /// Subject name
    pub name: String,
    /// Namespace (service accounts only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Explicit groups, e.g. certificate organizations
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
}

impl Subject {
    /// Create a user subject
    pub fn user(name: impl Into<String>) -> Self {
        Self {
            kind: SubjectKind::User,
            name: name.into(),
            namespace: None,
            groups: Vec::new(),
        }
    }

    /// Create a group subject
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            kind: SubjectKind::Group,
            name: name.into(),
            namespace: None,
            groups: Vec::new(),
        }
    }

    /// Create a service account subject
    pub fn service_account(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: SubjectKind::ServiceAccount,
            name: name.into(),
            namespace: Some(namespace.into()),
            groups: Vec::new(),
        }
    }

    /// Attach explicit group memberships
    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = groups.into_iter().map(Into::into).collect();
        self
    }

    /// Namespace as a plain string ("" when absent)
    pub fn namespace_str(&self) -> &str {
        self.namespace.as_deref().unwrap_or("")
    }

    /// Whether two subjects denote the same identity
    pub fn same_identity(&self, other: &Subject) -> bool {
        if self.kind != other.kind || self.name != other.name {
            return false;
        }
        self.kind != SubjectKind::ServiceAccount || self.namespace_str() == other.namespace_str()
    }

    /// Implicit groups followed by explicit groups, without duplicates
    pub fn effective_groups(&self) -> Vec<String> {
        let mut groups = implicit_groups(self);
        for group in &self.groups {
            if !groups.contains(group) {
                groups.push(group.clone());
            }
        }
        groups
    }
}

impl PartialEq for Subject {
    fn eq(&self, other: &Self) -> bool {
        self.same_identity(other)
    }
}

impl Eq for Subject {}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            SubjectKind::ServiceAccount => {
                write!(f, "ServiceAccount {}/{}", self.namespace_str(), self.name)
            }
            kind => write!(f, "{} {}", kind, self.name),
        }
    }
}

/// Parse an impersonation-style identifier into a subject
///
/// - `system:serviceaccount:<namespace>:<name>` is a service account
/// - any other `system:` string is a group
/// - everything else is a user
pub fn parse_subject(identifier: &str) -> RbacResult<Subject> {
    if identifier.is_empty() {
        return Err(RbacError::EmptySubject);
    }

    if identifier.starts_with(SERVICE_ACCOUNT_PREFIX) {
        let parts: Vec<&str> = identifier.split(':').collect();
        return match parts.as_slice() {
            [_, _, namespace, name] => Ok(Subject::service_account(*namespace, *name)),
            _ => Err(RbacError::MalformedIdentifier(identifier.to_string())),
        };
    }

    if identifier.starts_with(SYSTEM_PREFIX) {
        return Ok(Subject::group(identifier));
    }

    Ok(Subject::user(identifier))
}

/// Groups a subject belongs to by virtue of its kind
pub fn implicit_groups(subject: &Subject) -> Vec<String> {
    let mut groups = vec![GROUP_AUTHENTICATED.to_string()];

    if subject.kind == SubjectKind::ServiceAccount {
        groups.push(GROUP_SERVICE_ACCOUNTS.to_string());
        groups.push(format!("{}:{}", GROUP_SERVICE_ACCOUNTS, subject.namespace_str()));
    }

    groups
}
