//! Tree matching: the diff between two model snapshots.
//!
//! Elements are paired by id. A [`Match`] with only a left side is a removal,
//! only a right side an insertion, and both sides an update that may also move
//! the element to another parent. Results keep first-seen order: left preorder
//! first, then right-only elements in right preorder.

#[cfg(test)]
#[path = "matching_test.rs"]
mod matching_test;

use indexmap::IndexMap;

use crate::SceneError;
use crate::model::{Element, Model, Subtree};
use crate::schema::ElementSchema;

/// Before/after state of one element id.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub left: Option<Element>,
    pub left_parent_id: Option<String>,
    pub right: Option<Element>,
    pub right_parent_id: Option<String>,
}

impl Match {
    #[must_use]
    pub fn is_insertion(&self) -> bool {
        self.left.is_none() && self.right.is_some()
    }

    #[must_use]
    pub fn is_removal(&self) -> bool {
        self.left.is_some() && self.right.is_none()
    }

    #[must_use]
    pub fn is_update(&self) -> bool {
        self.left.is_some() && self.right.is_some()
    }
}

/// Matches keyed by element id, in first-seen order.
pub type MatchResult = IndexMap<String, Match>;

/// Pair up the elements of `left` and `right` by id.
#[must_use]
pub fn match_models(left: &Model, right: &Model) -> MatchResult {
    let mut result = MatchResult::new();
    for element in left.preorder() {
        result.insert(
            element.id.clone(),
            Match {
                left: Some(element.clone()),
                left_parent_id: element.parent().map(str::to_string),
                right: None,
                right_parent_id: None,
            },
        );
    }
    for element in right.preorder() {
        let entry = result.entry(element.id.clone()).or_insert_with(|| Match {
            left: None,
            left_parent_id: None,
            right: None,
            right_parent_id: None,
        });
        entry.right = Some(element.clone());
        entry.right_parent_id = element.parent().map(str::to_string);
    }
    result
}

/// Rewrite `model` (the left side) into the right side of `matches`.
pub fn apply_matches(model: &mut Model, matches: &MatchResult) -> Result<(), SceneError> {
    let Some((root_id, _)) = matches.iter().find(|(_, m)| m.right.is_some() && m.right_parent_id.is_none()) else {
        return Ok(());
    };
    if root_id != model.root_id() {
        return Err(SceneError::RootElement(root_id.clone()));
    }

    for (id, m) in matches {
        if m.is_removal() && model.contains(id) {
            model.remove(id)?;
        }
    }

    for id in right_preorder(matches, root_id) {
        let Some(m) = matches.get(&id) else {
            continue;
        };
        let Some(right) = &m.right else {
            continue;
        };
        if let Some(parent) = &m.right_parent_id {
            if model.contains(&id) {
                if model.parent_id(&id) != Some(parent.as_str()) {
                    model.reparent(&id, parent, None)?;
                }
            } else {
                model.insert(parent, None, Subtree::leaf(right.clone()))?;
            }
        }
        model.replace_properties(&id, right)?;
    }

    for (id, m) in matches {
        let Some(right) = &m.right else {
            continue;
        };
        for (index, child) in right.children().iter().enumerate() {
            if model.index_of(child) != Some(index) {
                model.move_child(child, index)?;
            }
        }
        if model.children(id).len() != right.children().len() {
            return Err(SceneError::UnknownElement(id.clone()));
        }
    }
    Ok(())
}

fn right_preorder(matches: &MatchResult, root_id: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut stack = vec![root_id.to_string()];
    while let Some(id) = stack.pop() {
        if let Some(right) = matches.get(&id).and_then(|m| m.right.as_ref()) {
            stack.extend(right.children().iter().rev().cloned());
        }
        out.push(id);
    }
    out
}

/// Whether any id of `schema` (or its descendants) is present in `model`.
#[must_use]
pub fn contains_some(model: &Model, schema: &ElementSchema) -> bool {
    model.contains(&schema.id) || schema.children.iter().any(|child| contains_some(model, child))
}
