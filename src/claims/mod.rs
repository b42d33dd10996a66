mod resolver;

pub use resolver::resolve;

/// Everything the deploy modules need to know about one side (source
/// or destination) of the migration: where the claim lives, what node
/// already mounts it (if any), the context it was resolved against,
/// and whether it should be mounted read-only.
#[derive(Debug, Clone)]
pub struct ClaimInfo {
    pub context: String,
    pub namespace: String,
    pub claim_name: String,
    /// Node a pod currently mounting the claim is scheduled on, if any.
    pub owner_node: Option<String>,
    pub read_only: bool,
}

impl ClaimInfo {
    /// Same namespace and context: the two sides don't need an extra
    /// secret replicated, since both pods can mount the one secret.
    pub fn is_same_location(&self, other: &ClaimInfo) -> bool {
        self.context == other.context && self.namespace == other.namespace
    }

    /// Same context: an intra-cluster `ClusterIP` Service reaches both
    /// sides, independent of whether the namespaces also match.
    pub fn is_same_context(&self, other: &ClaimInfo) -> bool {
        self.context == other.context
    }
}
