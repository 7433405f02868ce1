// ============================================================
// Layer 5 — Branching Generator
// ============================================================
// Bounded-width tree search over next-token distributions.
//
//   1. Prime the model with every seed token
//   2. Rank the next-token distribution (negative ids removed)
//   3. Keep the best candidates that pass all pruning rules
//   4. Advance a private copy of the state per kept child
//      and repeat until max_step or nothing survives
//
// Excluded probability mass is dropped, never renormalised.

use anyhow::Result;

use crate::domain::generation::{GenerateParams, GenerationNode, GenerationTree};
use crate::domain::record::StepOutput;
use crate::domain::token::UNK_TOKEN;
use crate::domain::traits::RnnModel;

/// Pick the children of a node whose path probability is `parent_prob`.
///
/// Candidates are taken in descending probability (lower id first on
/// ties). Selection stops once `max_branch` children are chosen, the
/// next candidate is below `min_cond_prob`, or adding it would push the
/// summed conditional probability past `accum_cond_prob`.
pub fn select_branches(probs: &[f32], parent_prob: f32, params: &GenerateParams) -> Vec<(u32, f32)> {
    let mut ranked: Vec<(u32, f32)> = probs
        .iter()
        .enumerate()
        .map(|(id, &p)| (id as u32, p))
        .filter(|(id, p)| p.is_finite() && !params.neg_word_ids.contains(id))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut picked = Vec::new();
    let mut accum  = 0.0f32;
    for (id, p) in ranked {
        if picked.len() >= params.max_branch
            || p < params.min_cond_prob
            || accum + p > params.accum_cond_prob
        {
            break;
        }
        // Sorted, so every later candidate fails min_prob as well
        if p * parent_prob < params.min_prob {
            break;
        }
        accum += p;
        picked.push((id, p));
    }
    picked
}

/// Run the branching search from `seeds` (ids, in order).
pub fn generate(model: &dyn RnnModel, seeds: &[u32], params: &GenerateParams) -> Result<GenerationTree> {
    let Some((&last, prefix)) = seeds.split_last() else {
        anyhow::bail!("generation needs at least one seed token");
    };

    let mut state = model.initial_state();
    for &id in prefix {
        state = model.step(&state, id)?.state;
    }
    let primed = model.step(&state, last)?;

    let mut root = node(model, last, 1.0, 1.0, 0);
    grow(model, &mut root, &primed, params)?;

    tracing::debug!(
        "Generated {} nodes (depth {}) from {} seed tokens",
        root.size(), root.max_depth(), seeds.len()
    );
    Ok(GenerationTree { seeds: seeds.to_vec(), root })
}

fn node(model: &dyn RnnModel, word_id: u32, cond_prob: f32, prob: f32, depth: usize) -> GenerationNode {
    let word = model.vocabulary().word(word_id).unwrap_or(UNK_TOKEN).to_string();
    GenerationNode { word_id, word, cond_prob, prob, depth, children: Vec::new() }
}

/// `out` is the model output after consuming `parent.word_id`.
fn grow(
    model:  &dyn RnnModel,
    parent: &mut GenerationNode,
    out:    &StepOutput,
    params: &GenerateParams,
) -> Result<()> {
    if parent.depth >= params.max_step {
        return Ok(());
    }

    for (word_id, cond_prob) in select_branches(&out.probs, parent.prob, params) {
        let mut child = node(model, word_id, cond_prob, parent.prob * cond_prob, parent.depth + 1);
        // Leaves never need a distribution of their own
        if child.depth < params.max_step {
            let next = model.step(&out.state, word_id)?;
            grow(model, &mut child, &next, params)?;
        }
        parent.children.push(child);
    }
    Ok(())
}
