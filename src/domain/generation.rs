// ============================================================
// Layer 3 — Generation Tree
// ============================================================
// The branching generator returns a tree rooted at the last
// seed token. Every other node is one possible next token,
// carrying both its conditional probability (given its parent
// path) and its cumulative path probability from the seed.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Pruning knobs for the branching search.
/// All three probability thresholds apply at the same time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateParams {
    /// Maximum children per node
    pub max_branch:      usize,
    /// Upper bound on the summed conditional probability of a node's children
    pub accum_cond_prob: f32,
    /// Lower bound on each child's conditional probability
    pub min_cond_prob:   f32,
    /// Lower bound on each node's cumulative path probability
    pub min_prob:        f32,
    /// Maximum depth below the seed
    pub max_step:        usize,
    /// Word ids that may never appear in the tree
    pub neg_word_ids:    HashSet<u32>,
}

impl Default for GenerateParams {
    fn default() -> Self {
        Self {
            max_branch:      1,
            accum_cond_prob: 0.9,
            min_cond_prob:   0.0,
            min_prob:        0.0,
            max_step:        10,
            neg_word_ids:    HashSet::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationNode {
    pub word_id:   u32,
    pub word:      String,
    pub cond_prob: f32,
    pub prob:      f32,
    pub depth:     usize,
    pub children:  Vec<GenerationNode>,
}

impl GenerationNode {
    /// Number of nodes in this subtree, including self
    pub fn size(&self) -> usize {
        let mut n = 0;
        self.walk(&mut |_| n += 1);
        n
    }

    /// Deepest depth reached in this subtree
    pub fn max_depth(&self) -> usize {
        self.children
            .iter()
            .map(GenerationNode::max_depth)
            .max()
            .unwrap_or(self.depth)
    }

    /// Depth-first visit of every node
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a GenerationNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationTree {
    /// Seed ids that primed the model, in order
    pub seeds: Vec<u32>,
    /// The last seed, with every surviving continuation below it
    pub root:  GenerationNode,
}

impl GenerationTree {
    /// Every root-to-leaf continuation (excluding the root) with its
    /// cumulative probability, most probable first.
    pub fn paths(&self) -> Vec<(Vec<String>, f32)> {
        fn collect(node: &GenerationNode, prefix: &mut Vec<String>, out: &mut Vec<(Vec<String>, f32)>) {
            if node.children.is_empty() {
                out.push((prefix.clone(), node.prob));
                return;
            }
            for child in &node.children {
                prefix.push(child.word.clone());
                collect(child, prefix, out);
                prefix.pop();
            }
        }

        let mut out = Vec::new();
        collect(&self.root, &mut Vec::new(), &mut out);
        out.sort_by(|a, b| b.1.total_cmp(&a.1));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(word: &str, prob: f32, depth: usize, children: Vec<GenerationNode>) -> GenerationNode {
        GenerationNode { word_id: 0, word: word.into(), cond_prob: prob, prob, depth, children }
    }

    #[test]
    fn test_size_and_depth() {
        let root = node("the", 1.0, 0, vec![
            node("cat", 0.5, 1, vec![node("sat", 0.2, 2, vec![])]),
            node("dog", 0.3, 1, vec![]),
        ]);
        assert_eq!(root.size(), 4);
        assert_eq!(root.max_depth(), 2);
    }

    #[test]
    fn test_paths_sorted_by_probability() {
        let root = node("the", 1.0, 0, vec![
            node("cat", 0.5, 1, vec![node("sat", 0.2, 2, vec![])]),
            node("dog", 0.3, 1, vec![]),
        ]);
        let tree  = GenerationTree { seeds: vec![0], root };
        let paths = tree.paths();
        assert_eq!(paths[0].0, vec!["dog".to_string()]);
        assert_eq!(paths[1].0, vec!["cat".to_string(), "sat".to_string()]);
    }

    #[test]
    fn test_seed_only_tree_has_one_empty_path() {
        let tree = GenerationTree { seeds: vec![0], root: node("the", 1.0, 0, vec![]) };
        assert_eq!(tree.paths(), vec![(Vec::new(), 1.0)]);
    }
}
