use serde_json::Value;

const IDENTITY: &[&str] = &["identity", "personal"];
const CONTACT: &[&str] = &["contact"];
const EMPLOYMENT: &[&str] = &["employment", "currentJob"];

/// Read-only view over the opaque client payload.
///
/// Fields are looked up in their named section first and then at the top
/// level. Anything missing or of the wrong shape reads as `null`.
pub(crate) struct ClientSections<'a> {
    root: &'a Value,
}

impl<'a> ClientSections<'a> {
    pub(crate) fn new(root: &'a Value) -> Self {
        Self { root }
    }

    pub(crate) fn identity(&self, key: &str) -> Value {
        self.lookup(IDENTITY, key)
    }

    pub(crate) fn contact(&self, key: &str) -> Value {
        self.lookup(CONTACT, key)
    }

    pub(crate) fn employment(&self, key: &str) -> Value {
        self.lookup(EMPLOYMENT, key)
    }

    fn lookup(&self, sections: &[&str], key: &str) -> Value {
        sections
            .iter()
            .find_map(|section| self.root.get(*section).and_then(|s| s.get(key)))
            .or_else(|| self.root.get(key))
            .cloned()
            .unwrap_or(Value::Null)
    }
}
