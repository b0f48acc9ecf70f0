#![forbid(unsafe_code)]

use std::sync::Arc;
use std::{fmt, hash};

/// Identity of one workload instance: namespace plus name. Cheap to clone;
/// both components are shared.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct WorkloadKey {
    namespace: Arc<str>,
    name: Arc<str>,
}

impl WorkloadKey {
    pub fn new(namespace: impl AsRef<str>, name: impl AsRef<str>) -> Self {
        Self {
            namespace: Arc::from(namespace.as_ref()),
            name: Arc::from(name.as_ref()),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl hash::Hash for WorkloadKey {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.namespace.hash(state);
        self.name.hash(state);
    }
}

impl fmt::Debug for WorkloadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkloadKey")
            .field("namespace", &self.namespace)
            .field("name", &self.name)
            .finish()
    }
}

impl fmt::Display for WorkloadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}
