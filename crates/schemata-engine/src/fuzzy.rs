//! # Closest `oneOf` Member — Best-Effort Scoring
//!
//! When a value matches no `oneOf` member (or several), editors still want
//! to know which member the author most likely meant. [`closest_one_of`]
//! scores each member by the number of its own `properties` that are
//! present in the value and validate; the first member with the highest
//! score wins.
//!
//! Strict validation never uses this scorer.
//!
//! [`closest_one_of`]: SchemaNode::closest_one_of

use std::sync::Arc;

use serde_json::Value;

use schemata_core::JsonPointer;

use crate::node::{CompiledNode, Scope};
use crate::resolve::{resolve, Resolution};
use crate::validate::is_valid_node;
use crate::SchemaNode;

impl SchemaNode {
    /// The `oneOf` member of this node that best fits `data`, with its index.
    ///
    /// Returns `None` when the node has no `oneOf` (after following its
    /// reference).
    pub fn closest_one_of(&self, data: &Value) -> Option<(usize, SchemaNode)> {
        let scope = self.scope.push(&self.node);
        let (node, scope) = match resolve(&self.ctx, &self.node, &scope) {
            Resolution::NoRef => (Arc::clone(&self.node), scope),
            Resolution::Resolved { node, scope } => (node, scope),
            Resolution::Unresolved(_) => return None,
        };
        let inner = scope.push(&node);
        let mut best: Option<(usize, usize)> = None;
        for (index, member) in node.one_of.iter().enumerate() {
            let score = self.score(member, data, &inner);
            tracing::trace!(index, score, "scored oneOf member");
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((index, score));
            }
        }
        let (index, _) = best?;
        Some((index, self.with_node(Arc::clone(&node.one_of[index]), inner)))
    }

    fn score(&self, member: &Arc<CompiledNode>, data: &Value, scope: &Scope) -> usize {
        let Some(object) = data.as_object() else {
            return 0;
        };
        let member = match resolve(&self.ctx, member, scope) {
            Resolution::Resolved { node, .. } => node,
            Resolution::NoRef | Resolution::Unresolved(_) => Arc::clone(member),
        };
        let root = JsonPointer::root();
        member
            .properties
            .iter()
            .filter(|(key, schema)| {
                object
                    .get(key)
                    .is_some_and(|value| is_valid_node(&self.ctx, schema, value, &root.join(key), scope))
            })
            .count()
    }
}
