//! Merge and edit of one element level.
//!
//! The live source always decides *which* elements exist and what they are
//! called; the stored level only decides order and visibility.

use std::collections::{HashMap, HashSet};

use crate::domain::{Element, ElementEdit, PreferenceDocument, Scope, SourceElement, TreeLayout};

/// Merge a stored level against the live snapshot.
///
/// Recognized names come first in stored order with stored visibility; names
/// the store has never seen follow in source order, visible. Stored names
/// missing from the snapshot are dropped. Descriptions come from the snapshot.
pub fn merge(stored: Option<&[Element]>, authoritative: &[SourceElement]) -> Vec<Element> {
    let mut index: HashMap<&str, (usize, bool)> = HashMap::new();
    for (rank, element) in stored.unwrap_or(&[]).iter().enumerate() {
        index.entry(element.name.as_str()).or_insert((rank, element.visible));
    }

    let mut emitted: HashSet<&str> = HashSet::with_capacity(authoritative.len());
    let mut recognized: Vec<(usize, Element)> = Vec::new();
    let mut appended: Vec<Element> = Vec::new();

    for source in authoritative {
        if !emitted.insert(source.name.as_str()) {
            continue;
        }
        match index.get(source.name.as_str()) {
            Some(&(rank, visible)) => recognized.push((
                rank,
                Element::new(source.name.clone(), source.description.clone(), visible),
            )),
            None => appended.push(Element::from_source(source)),
        }
    }

    recognized.sort_by_key(|(rank, _)| *rank);
    recognized
        .into_iter()
        .map(|(_, element)| element)
        .chain(appended)
        .collect()
}

/// Turn a submitted level into the level to persist.
///
/// Submitted order and visibility are kept verbatim; names the source no
/// longer offers (and repeated names) are dropped. Source names the client
/// left out are not added back here: the next `merge` re-appends them.
pub fn apply_edit(submitted: &[ElementEdit], authoritative: &[SourceElement]) -> Vec<Element> {
    let live: HashMap<&str, &SourceElement> = authoritative
        .iter()
        .map(|source| (source.name.as_str(), source))
        .collect();

    let mut seen: HashSet<&str> = HashSet::with_capacity(submitted.len());
    let mut result = Vec::with_capacity(submitted.len());

    for edit in submitted {
        let Some(source) = live.get(edit.name.as_str()) else {
            continue;
        };
        if !seen.insert(edit.name.as_str()) {
            continue;
        }
        result.push(Element::new(
            source.name.clone(),
            source.description.clone(),
            edit.visible,
        ));
    }

    let dropped = submitted.len() - result.len();
    if dropped > 0 {
        log::debug!("apply_edit dropped {} stale or repeated entries", dropped);
    }

    result
}

/// Build the full document to store after editing one level of `scope`.
///
/// Tree documents keep whatever the stored tree holds outside the edited level.
pub fn edited_document(
    scope: &Scope,
    stored: Option<PreferenceDocument>,
    level: Vec<Element>,
) -> PreferenceDocument {
    let stored_tree = || {
        stored
            .and_then(|doc| match doc {
                PreferenceDocument::Tree(tree) => Some(tree),
                PreferenceDocument::Flat(_) => None,
            })
            .unwrap_or_default()
    };

    match scope {
        Scope::ListView(_) => PreferenceDocument::Flat(level),
        Scope::AppIndex => PreferenceDocument::Tree(TreeLayout::with_app_list(stored_tree(), level)),
        Scope::AppSubIndex(app_label) => {
            PreferenceDocument::Tree(stored_tree().with_model_list(app_label, level))
        }
    }
}
