use rustc_hash::FxHashMap;

/// Namespace membership index: dotted prefix → ordered member keys.
///
/// Built once during normalization and consumed read-only by star-import
/// expansion; membership means "directly nested under", so `pkg.mod.f`
/// registers under `pkg.mod` only.
#[derive(Debug, Default)]
pub struct NamespaceIndex {
    members: FxHashMap<String, Vec<String>>,
}

impl NamespaceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `member` under `namespace`.
    ///
    /// The empty namespace (a top-level key) and self-membership (a
    /// collapsed package marker) register nothing. Duplicate registrations
    /// are ignored, keeping first-registration order.
    pub fn register(&mut self, namespace: &str, member: &str) {
        if namespace.is_empty() || namespace == member {
            return;
        }
        let list = self.members.entry(namespace.to_string()).or_default();
        if !list.iter().any(|m| m == member) {
            list.push(member.to_string());
        }
    }

    /// Members directly nested under `namespace`, in registration order.
    pub fn members(&self, namespace: &str) -> &[String] {
        self.members
            .get(namespace)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
