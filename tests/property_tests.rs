//! Property-based tests for the patcher
//!
//! These tests use proptest to verify:
//! 1. A group that matches nothing leaves every entry as it was
//! 2. Every entry of the target tag and group gets the new values, nothing else changes
//! 3. Applying the same patch twice equals applying it once
//! 4. Written output read back (by us and by roxmltree) has the same entries

use config_patcher::{apply, Document, MissingGroup, Patch};
use proptest::prelude::*;

const TAGS: [&str; 2] = ["method", "transport"];

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    tag: String,
    group: String,
    method: String,
    params: Option<String>,
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn build_xml(entries: &[Entry]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\"?>\n<adios-config>\n");
    for e in entries {
        match &e.params {
            Some(params) => xml.push_str(&format!(
                "  <{tag} group=\"{}\" method=\"{}\">{}</{tag}>\n",
                escape(&e.group),
                escape(&e.method),
                escape(params),
                tag = e.tag,
            )),
            None => xml.push_str(&format!(
                "  <{} group=\"{}\" method=\"{}\"/>\n",
                e.tag,
                escape(&e.group),
                escape(&e.method),
            )),
        }
    }
    xml.push_str("</adios-config>\n");
    xml
}

fn entries(doc: &Document) -> Vec<Entry> {
    let root = doc.root_element().unwrap();
    root.child_elements(doc)
        .into_iter()
        .map(|e| Entry {
            tag: e.name(doc).to_string(),
            group: e.attribute(doc, "group").unwrap_or_default().to_string(),
            method: e.attribute(doc, "method").unwrap_or_default().to_string(),
            params: e.text(doc),
        })
        .collect()
}

fn roxml_entries(xml: &str) -> Vec<Entry> {
    let doc = roxmltree::Document::parse(xml).unwrap();
    doc.root_element()
        .children()
        .filter(|n| n.is_element())
        .map(|n| Entry {
            tag: n.tag_name().name().to_string(),
            group: n.attribute("group").unwrap_or_default().to_string(),
            method: n.attribute("method").unwrap_or_default().to_string(),
            params: n.text().filter(|t| !t.is_empty()).map(str::to_string),
        })
        .collect()
}

// roxmltree normalizes whitespace in attribute values, so methods only get spaces.
fn method_strategy() -> impl Strategy<Value = String> {
    "[ a-zA-Z0-9=,;&<>\"'_.-]{0,20}"
}

// Params keep their surrounding whitespace, and may be empty.
fn params_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[ \t\na-zA-Z0-9=,;&<>\"'_.-]{0,20}",
        "[ \t\n]{0,4}[a-z=0-9]{1,8}[ \t\n]{0,4}",
    ]
}

// An empty body reads back as no params.
fn expected_params(params: &str) -> Option<String> {
    Some(params.to_string()).filter(|p| !p.is_empty())
}

fn entry_strategy() -> impl Strategy<Value = Entry> {
    (
        prop::sample::select(TAGS.to_vec()),
        prop::sample::select(vec!["READ_METHOD", "writer", "restart"]),
        method_strategy(),
        prop::option::of(params_strategy()),
    )
        .prop_map(|(tag, group, method, params)| Entry {
            tag: tag.to_string(),
            group: group.to_string(),
            method,
            params,
        })
}

fn patch_strategy() -> impl Strategy<Value = (&'static str, Patch)> {
    (
        prop::sample::select(TAGS.to_vec()),
        prop::sample::select(vec!["READ_METHOD", "writer", "restart"]),
        method_strategy(),
        params_strategy(),
    )
        .prop_map(|(tag, group, method, params)| (tag, Patch::new(group, method, params)))
}

proptest! {
    #[test]
    fn unmatched_group_changes_nothing(
        input in prop::collection::vec(entry_strategy(), 0..8),
        (tag, patch) in patch_strategy(),
    ) {
        let patch = Patch { group: "NO_SUCH_GROUP".to_string(), ..patch };
        let mut doc = Document::parse_str(&build_xml(&input)).unwrap();
        let before = entries(&doc);
        let changes = apply(&mut doc, tag, &patch, MissingGroup::Fail).unwrap();
        prop_assert!(changes.is_empty());
        prop_assert_eq!(entries(&doc), before.clone());
        let reread = Document::parse_str(&doc.write_str().unwrap()).unwrap();
        prop_assert_eq!(entries(&reread), before);
    }

    #[test]
    fn matches_get_new_values_others_untouched(
        input in prop::collection::vec(entry_strategy(), 0..8),
        (tag, patch) in patch_strategy(),
    ) {
        let mut doc = Document::parse_str(&build_xml(&input)).unwrap();
        let before = entries(&doc);
        let changes = apply(&mut doc, tag, &patch, MissingGroup::Fail).unwrap();
        let after = entries(&doc);

        let expected_matches = before
            .iter()
            .filter(|e| e.tag == tag && e.group == patch.group)
            .count();
        prop_assert_eq!(changes.len(), expected_matches);
        prop_assert_eq!(after.len(), before.len());
        for (old, new) in before.iter().zip(after.iter()) {
            if old.tag == tag && old.group == patch.group {
                prop_assert_eq!(&new.method, &patch.method);
                prop_assert_eq!(&new.params, &expected_params(&patch.params));
                prop_assert_eq!(&new.group, &old.group);
            } else {
                prop_assert_eq!(new, old);
            }
        }
    }

    #[test]
    fn patch_is_idempotent(
        input in prop::collection::vec(entry_strategy(), 0..8),
        (tag, patch) in patch_strategy(),
    ) {
        let mut once = Document::parse_str(&build_xml(&input)).unwrap();
        apply(&mut once, tag, &patch, MissingGroup::Fail).unwrap();

        let mut twice = Document::parse_str(&build_xml(&input)).unwrap();
        apply(&mut twice, tag, &patch, MissingGroup::Fail).unwrap();
        let rewritten = twice.write_str().unwrap();
        let mut twice = Document::parse_str(&rewritten).unwrap();
        apply(&mut twice, tag, &patch, MissingGroup::Fail).unwrap();

        prop_assert_eq!(entries(&once), entries(&twice));
        prop_assert_eq!(once.write_str().unwrap(), twice.write_str().unwrap());
    }

    #[test]
    fn written_output_round_trips(
        input in prop::collection::vec(entry_strategy(), 0..8),
        (tag, patch) in patch_strategy(),
    ) {
        let mut doc = Document::parse_str(&build_xml(&input)).unwrap();
        apply(&mut doc, tag, &patch, MissingGroup::Fail).unwrap();
        let xml = doc.write_str().unwrap();

        let reread = Document::parse_str(&xml).unwrap();
        prop_assert_eq!(entries(&reread), entries(&doc));
        prop_assert_eq!(roxml_entries(&xml), entries(&doc));
    }
}

#[test]
fn whitespace_around_params_survives() {
    let input = vec![
        Entry {
            tag: "method".to_string(),
            group: "other".to_string(),
            method: "BP".to_string(),
            params: Some("  verbose=3\n    ".to_string()),
        },
        Entry {
            tag: "method".to_string(),
            group: "g".to_string(),
            method: "BP".to_string(),
            params: Some("x".to_string()),
        },
    ];
    let mut doc = Document::parse_str(&build_xml(&input)).unwrap();
    apply(&mut doc, "method", &Patch::new("g", "MPI", " a b "), MissingGroup::Fail).unwrap();
    let xml = doc.write_str().unwrap();

    let reread = roxml_entries(&xml);
    assert_eq!(reread[0], input[0]);
    assert_eq!(reread[1].params.as_deref(), Some(" a b "));
}

#[test]
fn readme_scenario() {
    let xml = r#"<config><method group="READ_METHOD" method="BP">verbose=3</method></config>"#;
    let mut doc = Document::parse_str(xml).unwrap();
    let patch = Patch::new("READ_METHOD", "MPI", "verbose=1");
    let changes = apply(&mut doc, "method", &patch, MissingGroup::Fail).unwrap();
    assert_eq!(changes.len(), 1);
    assert!(changes[0].to_string().contains("BP => MPI"));
    let written = doc.write_str().unwrap();
    assert!(written.contains(r#"<method group="READ_METHOD" method="MPI">verbose=1</method>"#));
}
