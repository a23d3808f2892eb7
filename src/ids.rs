//! Diagram-safe identifiers derived from source URIs.

use std::collections::{HashMap, HashSet};

use sha2::{Digest, Sha256};

const HASH_SUFFIX_LEN: usize = 12;

/// Replace everything outside `[A-Za-z0-9_.-]` with `_` and make sure the id
/// starts with a letter or underscore, so it is a valid XML id.
pub fn sanitize_id(raw: &str) -> String {
    let mut id: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if !id.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        id.insert(0, '_');
    }
    id
}

/// Short, stable hex digest of arbitrary text.
pub fn short_hash(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(HASH_SUFFIX_LEN);
    hex
}

/// Id of a glyph that is drawn once per use site: `<base>_<hash(context)>`.
pub fn use_site_id(base: &str, context: &str) -> String {
    format!("{base}_{}", short_hash(context))
}

/// Hands out unique glyph ids for one conversion run.
#[derive(Debug, Default)]
pub struct IdRegistry {
    by_uri: HashMap<String, String>,
    taken: HashSet<String>,
}

impl IdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Base id of a source object. Stable for the run; distinct URIs never share an id.
    pub fn id_for(&mut self, uri: &str) -> String {
        if let Some(id) = self.by_uri.get(uri) {
            return id.clone();
        }
        let id = self.claim(&sanitize_id(uri));
        self.by_uri.insert(uri.to_string(), id.clone());
        id
    }

    /// Reserve `candidate`, or the first free `candidate_N` when it is already used.
    pub fn claim(&mut self, candidate: &str) -> String {
        if self.taken.insert(candidate.to_string()) {
            return candidate.to_string();
        }
        let mut n = 2;
        loop {
            let id = format!("{candidate}_{n}");
            if self.taken.insert(id.clone()) {
                return id;
            }
            n += 1;
        }
    }
}
