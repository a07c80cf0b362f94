//! Requester identities
//!
//! A `Subject` is a User, Group or ServiceAccount. Besides its explicit
//! groups every subject carries implicit memberships derived from its kind:
//!
//! - every subject is in `system:authenticated`
//! - service accounts are also in `system:serviceaccounts` and
//!   `system:serviceaccounts:<namespace>`

mod model;

pub use model::{
    implicit_groups, parse_subject, Subject, SubjectKind, GROUP_AUTHENTICATED,
    GROUP_SERVICE_ACCOUNTS,
};
