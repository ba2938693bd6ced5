//! Logical to physical key translation
//!
//! Every key the adapter sends to the backend passes through
//! [`KeyNamespacer`]. Tag index entries live in the same namespace as the
//! entries they describe.

const TAG_SET_SUFFIX: &str = ":tags";
const TAG_MEMBERS_PREFIX: &str = "tags:";

/// What a physical key holds, as seen from one namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRole<'a> {
    /// A cache entry, with its logical key
    Entry(&'a str),
    /// The tag set of the given logical key
    TagSet(&'a str),
    /// The membership set of the given tag
    TagMembers(&'a str),
}

/// Derives storage-level keys from logical keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyNamespacer {
    prefix: String,
}

impl KeyNamespacer {
    pub fn new(namespace: &str, separator: &str) -> Self {
        Self {
            prefix: Self::prefix_for(namespace, separator),
        }
    }

    /// `namespace + separator`, or empty when there is no namespace
    pub fn prefix_for(namespace: &str, separator: &str) -> String {
        if namespace.is_empty() {
            String::new()
        } else {
            format!("{}{}", namespace, separator)
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn physical_key(&self, logical_key: &str) -> String {
        format!("{}{}", self.prefix, logical_key)
    }

    /// Set holding the tags of `logical_key`
    pub fn tag_set_key(&self, logical_key: &str) -> String {
        format!("{}{}{}", self.prefix, logical_key, TAG_SET_SUFFIX)
    }

    /// Set holding the logical keys carrying `tag`
    pub fn tag_members_key(&self, tag: &str) -> String {
        format!("{}{}{}", self.prefix, TAG_MEMBERS_PREFIX, tag)
    }

    /// Physical prefix shared by every tag membership set
    pub fn tag_members_prefix(&self) -> String {
        self.physical_key(TAG_MEMBERS_PREFIX)
    }

    /// Classify a physical key of this namespace, `None` when it lies outside it.
    ///
    /// Logical keys starting with `tags:` or ending in `:tags` share the
    /// layout of the tag index and are reported as index keys.
    pub fn classify<'a>(&self, physical_key: &'a str) -> Option<KeyRole<'a>> {
        let logical = physical_key.strip_prefix(self.prefix.as_str())?;

        Some(if let Some(tag) = logical.strip_prefix(TAG_MEMBERS_PREFIX) {
            KeyRole::TagMembers(tag)
        } else if let Some(owner) = logical.strip_suffix(TAG_SET_SUFFIX) {
            KeyRole::TagSet(owner)
        } else {
            KeyRole::Entry(logical)
        })
    }

    /// KEYS pattern matching every physical key of this namespace starting with `logical_prefix`
    pub fn scan_pattern(&self, logical_prefix: &str) -> String {
        prefix_pattern(&self.physical_key(logical_prefix))
    }
}

/// Glob pattern matching every key that starts with `literal`
pub fn prefix_pattern(literal: &str) -> String {
    let mut pattern = escape_glob(literal);
    pattern.push('*');
    pattern
}

/// Escape `literal` so a glob matches it character for character
pub fn escape_glob(literal: &str) -> String {
    let mut escaped = String::with_capacity(literal.len());
    for ch in literal.chars() {
        if matches!(ch, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
