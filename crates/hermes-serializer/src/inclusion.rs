//! The compound-document inclusion pass.
//!
//! Starting at each primary object, the include tree is walked depth-first:
//! every related object reached along a path is serialized once, in
//! discovery order. The seen set holds primary identifiers from the start, so
//! a primary object is never repeated in `included`. Descent continues through
//! objects already seen; the visited set keyed by `(identifier, path)` bounds
//! the walk on cyclic graphs.

use crate::serializer::{read_failure, Serializer};
use hermes_core::{
    IncludeTree, Instance, JsonApiResult, ResourceDescriptor, ResourceIdentifier, ResourceObject,
};
use std::collections::HashSet;

pub(crate) struct Inclusion<'s, 'a> {
    serializer: &'s Serializer<'a>,
    seen: HashSet<ResourceIdentifier>,
    visited: HashSet<(ResourceIdentifier, String)>,
    included: Vec<ResourceObject>,
}

impl<'s, 'a> Inclusion<'s, 'a> {
    pub(crate) fn new(serializer: &'s Serializer<'a>) -> Self {
        Self {
            serializer,
            seen: HashSet::new(),
            visited: HashSet::new(),
            included: Vec::new(),
        }
    }

    /// Marks a primary object.
    pub(crate) fn seed(&mut self, identifier: ResourceIdentifier) {
        self.seen.insert(identifier);
    }

    pub(crate) fn walk(
        &mut self,
        descriptor: &ResourceDescriptor,
        instance: &Instance,
        identifier: ResourceIdentifier,
        tree: &IncludeTree,
        path: &str,
    ) -> JsonApiResult<()> {
        if tree.is_empty() || !self.visited.insert((identifier.clone(), path.to_string())) {
            return Ok(());
        }

        let registry = self.serializer.api().registry();
        for (name, subtree) in tree.children() {
            let relationship = descriptor.require_relationship(name)?;
            let target = registry.by_type(relationship.target_type())?;
            let related = descriptor
                .store()
                .related(instance, name)
                .map_err(|e| read_failure(descriptor.type_name(), &identifier.id, name, e))?;

            let child_path = if path.is_empty() {
                name.to_string()
            } else {
                format!("{path}.{name}")
            };
            for object in related.iter() {
                let id = self.serializer.read_id(target, object)?;
                let child = ResourceIdentifier::new(target.type_name(), id);
                if self.seen.insert(child.clone()) {
                    tracing::trace!(type_name = %child.type_name, id = %child.id, path = %child_path, "including");
                    let resource = self.serializer.resource_object(target, object)?;
                    self.included.push(resource);
                }
                self.walk(target, object, child, subtree, &child_path)?;
            }
        }
        Ok(())
    }

    pub(crate) fn into_included(self) -> Vec<ResourceObject> {
        self.included
    }
}

#[cfg(test)]
mod tests {
    use hermes_core::fixtures::fantasy_api;
    use hermes_core::{IncludeTree, Parameters, PrimaryData};
    use proptest::prelude::*;
    use std::collections::HashSet;

    use crate::Serializer;

    const AUTHOR_PATHS: [&str; 6] = [
        "books",
        "books.series",
        "books.chapters",
        "books.author",
        "books.series.books",
        "books.chapters.book.author",
    ];

    proptest! {
        #[test]
        fn prop_included_is_unique_and_disjoint_from_primary(
            selection in proptest::sample::subsequence(AUTHOR_PATHS.to_vec(), 0..=AUTHOR_PATHS.len()),
            author_id in 1_u64..=3,
        ) {
            let api = fantasy_api("http://example.com").unwrap();
            let authors = api.registry().by_type("authors").unwrap();
            let author = authors.store().fetch_one(authors.model(), &author_id.to_string()).unwrap();
            let mut include = IncludeTree::new();
            for path in &selection {
                include.insert_path(path.split('.'));
            }
            let params = Parameters::new("authors").with_include(include);

            let document = Serializer::new(&api, &params).dump(&author).unwrap();

            let mut identifiers = HashSet::new();
            for object in &document.included {
                prop_assert!(identifiers.insert(object.identifier()), "duplicate {:?}", object.identifier());
            }
            let PrimaryData::Resource(primary) = &document.data else {
                panic!("expected a single resource");
            };
            prop_assert!(!identifiers.contains(&primary.identifier()));
        }
    }

    #[test]
    fn test_nested_path_includes_intermediate_objects() {
        let api = fantasy_api("http://example.com").unwrap();
        let chapters = api.registry().by_type("chapters").unwrap();
        let chapter = chapters.store().fetch_one(chapters.model(), "271").unwrap();
        let mut include = IncludeTree::new();
        include.insert_path(["book", "author"]);
        let params = Parameters::new("chapters")
            .with_fields("books", ["title"])
            .with_fields("authors", ["name"])
            .with_include(include);

        let document = Serializer::new(&api, &params).dump(&chapter).unwrap();
        let identifiers: Vec<String> = document
            .included
            .iter()
            .map(|object| format!("{}:{}", object.type_name, object.id))
            .collect();
        assert_eq!(identifiers, ["books:11", "authors:1"]);
    }

    #[test]
    fn test_missing_related_object_contributes_nothing() {
        let api = fantasy_api("http://example.com").unwrap();
        let books = api.registry().by_type("books").unwrap();
        let hobbit = books.store().fetch_one(books.model(), "11").unwrap();
        let mut include = IncludeTree::new();
        include.insert_path(["series"]);
        let params = Parameters::new("books").with_include(include);

        let document = Serializer::new(&api, &params).dump(&hobbit).unwrap();
        assert!(document.included.is_empty());
    }

    #[test]
    fn test_collection_shares_included_objects() {
        let api = fantasy_api("http://example.com").unwrap();
        let books = api.registry().by_type("books").unwrap();
        let all = books.store().fetch_many(books.model(), None).unwrap();
        let mut include = IncludeTree::new();
        include.insert_path(["author"]);
        let params = Parameters::new("books").with_include(include);

        let document = Serializer::new(&api, &params).dump_many(&all).unwrap();
        let identifiers: Vec<String> = document
            .included
            .iter()
            .map(|object| format!("{}:{}", object.type_name, object.id))
            .collect();
        assert_eq!(identifiers, ["authors:1", "authors:2"]);
    }
}
