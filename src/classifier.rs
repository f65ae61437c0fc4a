//! Window admission policy.
//!
//! The [`Classifier`] decides, from a window's `WM_CLASS`, whether the
//! window may be shown at all and on which workspace it lives.  It is a
//! flat table of `(pattern, workspace)` rules, consulted in order, so the
//! first workspace whose allow-list matches wins.

use crate::event::{WindowClass, WorkspaceIndex};

/// Outcome of classifying a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Not on any allow-list; the window must not be shown.
    Rejected,
    /// Allowed, and belongs on the given workspace.
    Assigned(WorkspaceIndex),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Rule {
    pattern: String,
    workspace: WorkspaceIndex,
}

/// Ordered allow-list table.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    rules: Vec<Rule>,
}

impl Classifier {
    /// Build a classifier from one allow-list per workspace.
    ///
    /// `lists[i]` holds the class/instance names allowed on workspace `i`.
    /// Earlier workspaces take priority when a name appears in more than
    /// one list.  Empty patterns are dropped.
    pub fn new<I, L, S>(lists: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut rules = Vec::new();
        for (workspace, list) in lists.into_iter().enumerate() {
            for pattern in list {
                let pattern = pattern.as_ref().trim();
                if pattern.is_empty() {
                    continue;
                }
                rules.push(Rule {
                    pattern: pattern.to_string(),
                    workspace,
                });
            }
        }
        Self { rules }
    }

    /// Number of rules in the table.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Classify a window from its (possibly absent) `WM_CLASS`.
    pub fn classify(&self, class: Option<&WindowClass>) -> Classification {
        match class {
            Some(c) => self.classify_names(c.instance.as_deref(), c.class.as_deref()),
            None => Classification::Rejected,
        }
    }

    /// Classify from the raw instance and class names.
    ///
    /// Matching is ASCII case-insensitive against either name.
    pub fn classify_names(&self, instance: Option<&str>, class: Option<&str>) -> Classification {
        if instance.is_none() && class.is_none() {
            return Classification::Rejected;
        }
        let matches = |name: Option<&str>, pattern: &str| {
            name.is_some_and(|n| n.eq_ignore_ascii_case(pattern))
        };
        self.rules
            .iter()
            .find(|rule| matches(class, &rule.pattern) || matches(instance, &rule.pattern))
            .map(|rule| Classification::Assigned(rule.workspace))
            .unwrap_or(Classification::Rejected)
    }
}
