//! Newtype identifiers for plans, tasks, and atoms.
//!
//! Atoms never hold live references to each other; all cross-atom structure
//! is expressed through these ids plus the adjacency owned by the graph.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id! {
    /// Identifier of a whole plan (one invocation of the pipeline).
    PlanId
}

string_id! {
    /// Identifier of a coarse task from the external planner.
    TaskId
}

string_id! {
    /// Identifier of an atomic unit.
    AtomId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_order_lexicographically() {
        let mut ids = vec![AtomId::from("a10"), AtomId::from("a1"), AtomId::from("a2")];
        ids.sort();
        let strs: Vec<&str> = ids.iter().map(|i| i.as_str()).collect();
        assert_eq!(strs, vec!["a1", "a10", "a2"]);
    }

    #[test]
    fn ids_serialize_transparently() {
        let id = TaskId::from("t-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"t-1\"");
    }
}
