//! Property-based tests for serialization and glob removal
//!
//! These tests use proptest to verify:
//! 1. Stability: parse(serialize(tree)) == tree for trees without operations
//!    and without mixed content
//! 2. Mixed content: text next to child elements is re-indented, so it is
//!    stable from the first serialized string on
//! 3. remove_any: every element matching the attribute glob is gone, every
//!    other element survives

use imgdescr::xml::{from_str, to_pretty_string};
use imgdescr::{Content, Description, Element};
use indexmap::IndexMap;
use proptest::prelude::*;

fn tag() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("image".to_string()),
        Just("packages".to_string()),
        Just("package".to_string()),
        Just("repository".to_string()),
        "[a-z][a-z0-9_-]{0,6}",
    ]
}

fn attributes() -> impl Strategy<Value = IndexMap<String, String>> {
    prop::collection::vec(("[a-z][a-z_]{0,5}", "[a-zA-Z0-9 &<>\"'/.:]{0,8}"), 0..4)
        .prop_map(|pairs| pairs.into_iter().collect())
}

fn leaf() -> impl Strategy<Value = Element> {
    (tag(), attributes(), prop::option::of("[a-zA-Z0-9&<>_.:/]{1,12}")).prop_map(
        |(name, attributes, text)| Element {
            name,
            attributes,
            children: text.map(Content::Text).into_iter().collect(),
        },
    )
}

fn tree() -> impl Strategy<Value = Element> {
    leaf().prop_recursive(4, 48, 5, |inner| {
        (
            tag(),
            attributes(),
            prop::collection::vec(
                prop_oneof![
                    4 => inner.prop_map(Content::Element),
                    1 => "[a-z]{1,8}".prop_map(Content::Comment),
                ],
                1..5,
            ),
        )
            .prop_map(|(name, attributes, children)| Element {
                name,
                attributes,
                children,
            })
    })
}

fn mixed_tree() -> impl Strategy<Value = Element> {
    leaf().prop_recursive(3, 32, 4, |inner| {
        (
            tag(),
            attributes(),
            prop::collection::vec(
                prop_oneof![
                    3 => inner.prop_map(Content::Element),
                    2 => "[a-z&<>]{1,8}( [a-z]{1,4})?".prop_map(Content::Text),
                    1 => "[a-z]{1,8}".prop_map(Content::Comment),
                ],
                1..5,
            ),
        )
            .prop_map(|(name, attributes, children)| Element {
                name,
                attributes,
                children,
            })
    })
}

fn repository() -> impl Strategy<Value = Element> {
    (
        prop::option::of(prop_oneof![Just("rpm-md"), Just("apt-deb")]),
        prop::option::of(prop_oneof![Just("main"), Just("updates")]),
        prop::option::of(prop_oneof![Just("1"), Just("2")]),
    )
        .prop_map(|(kind, alias, priority)| {
            let mut repo = Element::new("repository");
            for (key, value) in [("type", kind), ("alias", alias), ("priority", priority)] {
                if let Some(value) = value {
                    repo.set_attr(key, value);
                }
            }
            repo
        })
}

proptest! {
    #[test]
    fn prop_serialization_is_stable(root in tree()) {
        let out = to_pretty_string(&root);
        let parsed = from_str(&out);
        prop_assert!(parsed.is_ok(), "failed to reparse:\n{}", out);
        if let Ok(parsed) = parsed {
            prop_assert_eq!(&parsed.root, &root);
            prop_assert_eq!(to_pretty_string(&parsed.root), out);
        }
    }

    #[test]
    fn prop_mixed_content_is_stable_once_serialized(root in mixed_tree()) {
        let first = to_pretty_string(&root);
        let parsed = from_str(&first);
        prop_assert!(parsed.is_ok(), "failed to reparse:\n{}", first);
        if let Ok(parsed) = parsed {
            prop_assert_eq!(to_pretty_string(&parsed.root), first);
        }
    }

    #[test]
    fn prop_remove_any_is_a_glob(
        repos in prop::collection::vec(repository(), 0..12),
        glob in repository(),
    ) {
        let mut base = Element::new("image");
        for repo in &repos {
            base.push(repo.clone());
        }
        let derived = Element::new("image")
            .with_child(Element::new("remove_any").with_child(glob.clone()));

        let descr = Description::new(&to_pretty_string(&derived), Some(&to_pretty_string(&base)));
        prop_assert!(descr.is_ok());
        if let Ok(descr) = descr {
            let left: Vec<&Element> = descr.target().child_elements().collect();
            prop_assert!(left.iter().all(|r| !r.has_attributes_of(&glob.attributes)));
            let kept: Vec<&Element> = repos
                .iter()
                .filter(|r| !r.has_attributes_of(&glob.attributes))
                .collect();
            prop_assert_eq!(left, kept);
        }
    }
}
