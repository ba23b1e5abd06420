use crate::arena::Arena;
use crate::schema::Schema;
use crate::uri::SchemaUri;
use std::collections::HashMap;

/// Maps canonical schema URIs to arena indices. The compiler writes into it;
/// after seal it is read-only and every `$ref` in the arena carries a
/// resolved target index.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    schemas: HashMap<SchemaUri, usize>,
    arena: Arena,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `schema` under `uri`, deduplicating by URI: if the URI is
    /// already registered the existing index is returned and the new node is
    /// discarded.
    pub fn insert(&mut self, uri: SchemaUri, schema: Schema) -> usize {
        if let Some(&index) = self.schemas.get(&uri) {
            return index;
        }

        let index = self.arena.insert(schema);
        self.schemas.insert(uri, index);
        index
    }

    pub fn get(&self, uri: &SchemaUri) -> Option<&Schema> {
        self.schemas.get(uri).map(|&index| self.arena.get(index))
    }

    pub fn get_index(&self, index: usize) -> &Schema {
        self.arena.get(index)
    }

    /// Fills in the target index of every unresolved `$ref` whose URI is
    /// registered. Returns the URIs that could not be resolved this pass, in
    /// arena (discovery) order, one entry per referring site.
    pub fn populate_refs(&mut self) -> Vec<SchemaUri> {
        let mut missing = Vec::new();

        for schema in self.arena.iter_mut() {
            let ref_ = match &mut schema.ref_ {
                Some(ref_) if ref_.target.is_none() => ref_,
                _ => continue,
            };

            match self.schemas.get(&ref_.uri) {
                Some(&index) => ref_.target = Some(index),
                None => missing.push(ref_.uri.clone()),
            }
        }

        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Ref;

    fn uri(raw: &str) -> SchemaUri {
        raw.parse().unwrap()
    }

    #[test]
    fn insert_deduplicates_by_uri() {
        let mut registry = Registry::new();

        let first = registry.insert(uri("urn:example:a"), Schema::default());
        let second = registry.insert(
            uri("urn:example:a"),
            Schema {
                boolean: Some(false),
                ..Default::default()
            },
        );

        assert_eq!(first, second);
        // The original node survives; the duplicate was discarded.
        assert!(registry.get_index(first).boolean.is_none());
    }

    #[test]
    fn populate_refs_resolves_known_uris() {
        let mut registry = Registry::new();

        let target = registry.insert(uri("urn:example:b"), Schema::default());
        registry.insert(
            uri("urn:example:a"),
            Schema {
                ref_: Some(Ref {
                    uri: uri("urn:example:b"),
                    target: None,
                }),
                ..Default::default()
            },
        );

        assert!(registry.populate_refs().is_empty());
        let resolved = registry.get(&uri("urn:example:a")).unwrap();
        assert_eq!(Some(target), resolved.ref_.as_ref().unwrap().target);
    }

    #[test]
    fn populate_refs_reports_missing_uris() {
        let mut registry = Registry::new();

        registry.insert(
            uri("urn:example:a"),
            Schema {
                ref_: Some(Ref {
                    uri: uri("urn:example:nope#/definitions/x"),
                    target: None,
                }),
                ..Default::default()
            },
        );

        assert_eq!(
            vec![uri("urn:example:nope#/definitions/x")],
            registry.populate_refs()
        );
        // A second pass reports it again; nothing was resolved.
        assert_eq!(1, registry.populate_refs().len());
    }
}
