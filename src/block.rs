use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::borrow::Borrow;
use std::fmt;

pub const DEFAULT_NAMESPACE: &str = "minecraft";
pub const AIR: &str = "minecraft:air";

/// Opaque block type name, `<namespace>:<name>`.
///
/// Equality is exact string equality; no normalisation of namespace or case
/// is performed. Ordering is byte-wise lexicographic, which is what palette
/// id assignment relies on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockIdentifier(SmolStr);

impl BlockIdentifier {
    pub fn new(id: impl Into<SmolStr>) -> Self {
        BlockIdentifier(id.into())
    }

    /// Build `<namespace>:<name>`.
    pub fn namespaced(namespace: &str, name: &str) -> Self {
        BlockIdentifier(SmolStr::from(format!("{}:{}", namespace, name)))
    }

    pub fn air() -> Self {
        BlockIdentifier(SmolStr::new(AIR))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.0.split_once(':').map(|(ns, _)| ns)
    }

    /// Name without the namespace prefix (the whole string if unprefixed).
    pub fn name(&self) -> &str {
        match self.0.split_once(':') {
            Some((_, name)) => name,
            None => self.0.as_str(),
        }
    }

    /// Readers treat every air variant (`air`, `cave_air`, `void_air`) as an
    /// empty cell.
    pub fn is_empty_block(&self) -> bool {
        self.name().contains("air")
    }
}

impl fmt::Display for BlockIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockIdentifier {
    fn from(value: &str) -> Self {
        BlockIdentifier::new(value)
    }
}

impl From<String> for BlockIdentifier {
    fn from(value: String) -> Self {
        BlockIdentifier::new(value)
    }
}

impl Borrow<str> for BlockIdentifier {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl AsRef<str> for BlockIdentifier {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
