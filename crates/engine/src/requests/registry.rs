//! Static table of known actions, keyed by identifier.

use super::campground::{CampgroundVisit, RelaxRequest, RestRequest, ToastRequest};
use super::ActionRequest;

/// A registered action.
#[derive(Debug)]
pub struct ActionSpec {
    pub id: &'static str,
    pub description: &'static str,
    create: fn() -> Box<dyn ActionRequest>,
}

impl ActionSpec {
    /// A fresh, single-use request for this action.
    pub fn create(&self) -> Box<dyn ActionRequest> {
        (self.create)()
    }
}

fn campground() -> Box<dyn ActionRequest> {
    Box::new(CampgroundVisit)
}

fn rest() -> Box<dyn ActionRequest> {
    Box::new(RestRequest)
}

fn relax() -> Box<dyn ActionRequest> {
    Box::new(RelaxRequest)
}

fn toast() -> Box<dyn ActionRequest> {
    Box::new(ToastRequest)
}

pub static ACTIONS: &[ActionSpec] = &[
    ActionSpec {
        id: "campground",
        description: "visit the campground and refresh capabilities",
        create: campground,
    },
    ActionSpec {
        id: "rest",
        description: "sleep in your tent (1 adventure)",
        create: rest,
    },
    ActionSpec {
        id: "relax",
        description: "relax in your campground (1 adventure)",
        create: relax,
    },
    ActionSpec {
        id: "toast",
        description: "get toast from the toaster",
        create: toast,
    },
];

/// Find an action by identifier (case-insensitive).
pub fn lookup(id: &str) -> Option<&'static ActionSpec> {
    let id = id.trim();
    ACTIONS.iter().find(|spec| spec.id.eq_ignore_ascii_case(id))
}

/// Build a request for an identifier, if registered.
pub fn create(id: &str) -> Option<Box<dyn ActionRequest>> {
    lookup(id).map(ActionSpec::create)
}

pub fn action_ids() -> impl Iterator<Item = &'static str> {
    ACTIONS.iter().map(|spec| spec.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn registry_keys_match_request_ids() {
        for spec in ACTIONS {
            assert_eq!(spec.create().action_id(), spec.id);
        }
    }

    #[test]
    fn registry_ids_are_unique() {
        let ids: HashSet<_> = action_ids().collect();
        assert_eq!(ids.len(), ACTIONS.len());
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(lookup("REST").map(|s| s.id), Some("rest"));
        assert!(create("juggle").is_none());
    }
}
