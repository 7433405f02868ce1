// ============================================================
// Layer 5 — t-SNE
// ============================================================
// Barnes-Hut t-SNE (van der Maaten, 2014) to two dimensions.
//
//   1. Exact nearest neighbours, 3 × perplexity per point
//   2. Per-point Gaussian bandwidth found by binary search so the
//      conditional distribution over those neighbours has the
//      requested perplexity
//   3. Symmetrised sparse joint probabilities P
//   4. Gradient descent on KL(P || Q) with Student-t Q. Attraction
//      runs over the sparse P, repulsion is summarised by a
//      quadtree. Early exaggeration, momentum, per-coordinate gains.
//
// Memory is linear in the number of points and one iteration is
// O(n log n). Only the neighbour search is quadratic.
//
// random_projection() is the cheap first stage used instead of
// PCA: a Gaussian random matrix to `dims` columns.
//
// Every random draw comes from the caller's rng or `seed`, so the
// same input always yields the same embedding.

use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct TsneConfig {
    pub perplexity:         f64,
    pub max_iter:           usize,
    pub learning_rate:      f64,
    pub early_exaggeration: f64,
    /// Iterations run with exaggerated P
    pub exaggeration_iters: usize,
    /// Barnes-Hut accuracy; 0 visits every pair
    pub theta:              f64,
    pub seed:               u64,
}

impl Default for TsneConfig {
    fn default() -> Self {
        Self {
            perplexity:         30.0,
            max_iter:           1000,
            learning_rate:      200.0,
            early_exaggeration: 12.0,
            exaggeration_iters: 100,
            theta:              0.5,
            seed:               0,
        }
    }
}

const MOMENTUM_SWITCH_ITER: usize = 250;
const BANDWIDTH_SEARCH_STEPS: usize = 50;
const ENTROPY_TOL: f64 = 1e-5;
const MIN_PROB: f64 = 1e-12;
/// Spread of the initial embedding
const INIT_SCALE: f64 = 1e-4;
/// Cells this deep are never split; coincident points share them
const MAX_TREE_DEPTH: usize = 32;

/// Row i holds (j, p_ij) for every j with non-zero joint probability
type SparseP = Vec<Vec<(usize, f64)>>;

/// Project every row onto `dims` Gaussian random directions.
/// Rows already no wider than `dims` are returned unchanged.
pub fn random_projection(data: &[Vec<f32>], dims: usize, rng: &mut impl Rng) -> Vec<Vec<f64>> {
    let width = data.first().map_or(0, Vec::len);
    if width <= dims {
        return data.iter().map(|r| r.iter().map(|&x| x as f64).collect()).collect();
    }

    let scale = 1.0 / (dims as f64).sqrt();
    let matrix: Vec<Vec<f64>> = (0..width)
        .map(|_| {
            (0..dims)
                .map(|_| {
                    let z: f64 = StandardNormal.sample(rng);
                    z * scale
                })
                .collect()
        })
        .collect();

    data.iter()
        .map(|row| {
            let mut out = vec![0.0; dims];
            for (x, weights) in row.iter().zip(&matrix) {
                for (o, w) in out.iter_mut().zip(weights) {
                    *o += *x as f64 * w;
                }
            }
            out
        })
        .collect()
}

/// Embed `data` in two dimensions.
pub fn tsne(data: &[Vec<f64>], cfg: &TsneConfig) -> Vec<[f32; 2]> {
    let n = data.len();
    if n < 2 {
        return vec![[0.0, 0.0]; n];
    }

    // Perplexity must stay well below the number of neighbours
    let perplexity = cfg.perplexity.min(((n - 1) as f64 / 3.0).max(1.0));
    let p = joint_probabilities(data, perplexity);

    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let mut y: Vec<[f64; 2]> = (0..n)
        .map(|_| {
            let a: f64 = StandardNormal.sample(&mut rng);
            let b: f64 = StandardNormal.sample(&mut rng);
            [a * INIT_SCALE, b * INIT_SCALE]
        })
        .collect();
    let mut update = vec![[0.0f64; 2]; n];
    let mut gains  = vec![[1.0f64; 2]; n];
    let mut grad   = vec![[0.0f64; 2]; n];

    for iter in 0..cfg.max_iter {
        let exaggeration = if iter < cfg.exaggeration_iters { cfg.early_exaggeration } else { 1.0 };
        let momentum     = if iter < MOMENTUM_SWITCH_ITER { 0.5 } else { 0.8 };

        gradient(&p, &y, exaggeration, cfg.theta, &mut grad);

        for i in 0..n {
            for d in 0..2 {
                gains[i][d] = if (grad[i][d] > 0.0) != (update[i][d] > 0.0) {
                    gains[i][d] + 0.2
                } else {
                    (gains[i][d] * 0.8).max(0.01)
                };
                update[i][d] = momentum * update[i][d] - cfg.learning_rate * gains[i][d] * grad[i][d];
                y[i][d] += update[i][d];
            }
        }

        let mean = y.iter().fold([0.0; 2], |acc, p| [acc[0] + p[0], acc[1] + p[1]]);
        for point in &mut y {
            point[0] -= mean[0] / n as f64;
            point[1] -= mean[1] / n as f64;
        }

        if (iter + 1) % 100 == 0 {
            tracing::debug!("t-SNE iteration {}/{}", iter + 1, cfg.max_iter);
        }
    }

    y.into_iter().map(|[a, b]| [a as f32, b as f32]).collect()
}

/// KL gradient: exact attraction over the sparse P, tree-summarised repulsion.
fn gradient(p: &SparseP, y: &[[f64; 2]], exaggeration: f64, theta: f64, grad: &mut [[f64; 2]]) {
    let tree = QuadTree::build(y);

    let mut repulsive = vec![[0.0f64; 2]; y.len()];
    let mut z = 0.0;
    for (i, force) in repulsive.iter_mut().enumerate() {
        z += tree.repulsion(y, i, theta, force);
    }
    let z = z.max(MIN_PROB);

    for (i, row) in p.iter().enumerate() {
        let mut attractive = [0.0f64; 2];
        for &(j, pij) in row {
            let dx = y[i][0] - y[j][0];
            let dy = y[i][1] - y[j][1];
            let k  = 1.0 / (1.0 + dx * dx + dy * dy);
            attractive[0] += exaggeration * pij * k * dx;
            attractive[1] += exaggeration * pij * k * dy;
        }
        grad[i] = [
            4.0 * (attractive[0] - repulsive[i][0] / z),
            4.0 * (attractive[1] - repulsive[i][1] / z),
        ];
    }
}

// ─── Quadtree ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Cell {
    centre:   [f64; 2],
    half:     f64,
    /// Sum of the positions stored below this cell
    mass:     [f64; 2],
    count:    usize,
    /// Sole resident of a leaf, pushed down when the leaf splits
    point:    Option<usize>,
    /// First of four consecutive child cells
    children: Option<usize>,
}

impl Cell {
    fn empty(centre: [f64; 2], half: f64) -> Self {
        Self { centre, half, mass: [0.0; 2], count: 0, point: None, children: None }
    }
}

struct QuadTree {
    cells:   Vec<Cell>,
    /// Leaf cell holding each point
    leaf_of: Vec<usize>,
}

fn quadrant(centre: [f64; 2], p: [f64; 2]) -> usize {
    usize::from(p[0] > centre[0]) | (usize::from(p[1] > centre[1]) << 1)
}

impl QuadTree {
    fn build(points: &[[f64; 2]]) -> Self {
        let mut lo = [f64::INFINITY; 2];
        let mut hi = [f64::NEG_INFINITY; 2];
        for p in points {
            for d in 0..2 {
                lo[d] = lo[d].min(p[d]);
                hi[d] = hi[d].max(p[d]);
            }
        }
        let centre = [(lo[0] + hi[0]) / 2.0, (lo[1] + hi[1]) / 2.0];
        let half   = ((hi[0] - lo[0]).max(hi[1] - lo[1]) / 2.0).max(f64::EPSILON);

        let mut tree = Self {
            cells:   vec![Cell::empty(centre, half)],
            leaf_of: vec![0; points.len()],
        };
        for i in 0..points.len() {
            tree.insert(points, i);
        }
        tree
    }

    fn split(&mut self, c: usize) -> usize {
        let (centre, half) = (self.cells[c].centre, self.cells[c].half);
        let h     = half / 2.0;
        let first = self.cells.len();
        for q in 0..4 {
            let dx = if q & 1 == 1 { h } else { -h };
            let dy = if q & 2 == 2 { h } else { -h };
            self.cells.push(Cell::empty([centre[0] + dx, centre[1] + dy], h));
        }
        self.cells[c].children = Some(first);
        first
    }

    fn insert(&mut self, points: &[[f64; 2]], i: usize) {
        let p = points[i];
        let mut c     = 0;
        let mut depth = 0;
        loop {
            let cell = &mut self.cells[c];
            cell.mass[0] += p[0];
            cell.mass[1] += p[1];
            cell.count   += 1;

            if let Some(first) = cell.children {
                c = first + quadrant(cell.centre, p);
                depth += 1;
                continue;
            }
            if cell.count == 1 {
                cell.point = Some(i);
                self.leaf_of[i] = c;
                return;
            }
            if depth >= MAX_TREE_DEPTH {
                self.leaf_of[i] = c;
                return;
            }

            let centre   = cell.centre;
            let resident = cell.point.take();
            let first    = self.split(c);
            if let Some(r) = resident {
                let q     = first + quadrant(centre, points[r]);
                let child = &mut self.cells[q];
                child.mass  = points[r];
                child.count = 1;
                child.point = Some(r);
                self.leaf_of[r] = q;
            }
            c = first + quadrant(centre, p);
            depth += 1;
        }
    }

    /// Add the unnormalised repulsion on point `i` to `force` and
    /// return its share of the normaliser Z = Σ_{j≠i} (1 + d²)⁻¹.
    fn repulsion(&self, points: &[[f64; 2]], i: usize, theta: f64, force: &mut [f64; 2]) -> f64 {
        let p = points[i];
        let mut z     = 0.0;
        let mut stack = vec![0];

        while let Some(c) = stack.pop() {
            let cell = &self.cells[c];
            let (mut mass, mut count) = (cell.mass, cell.count);
            if c == self.leaf_of[i] {
                mass   = [mass[0] - p[0], mass[1] - p[1]];
                count -= 1;
            }
            if count == 0 {
                continue;
            }

            let n  = count as f64;
            let dx = p[0] - mass[0] / n;
            let dy = p[1] - mass[1] / n;
            let d2 = dx * dx + dy * dy;
            let width = 2.0 * cell.half;

            match cell.children {
                // Too close to summarise; a cell holding `i` always lands here
                Some(first) if width * width >= theta * theta * d2 => stack.extend(first..first + 4),
                _ => {
                    let k = 1.0 / (1.0 + d2);
                    z        += n * k;
                    force[0] += n * k * k * dx;
                    force[1] += n * k * k * dy;
                }
            }
        }
        z
    }
}

// ─── Input similarities ──────────────────────────────────────────────────────

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// The `k` nearest neighbours of every point as (index, squared distance)
fn nearest_neighbours(data: &[Vec<f64>], k: usize) -> Vec<Vec<(usize, f64)>> {
    (0..data.len())
        .map(|i| {
            let mut row: Vec<(usize, f64)> = data
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(j, x)| (j, squared_distance(&data[i], x)))
                .collect();
            if k < row.len() {
                row.select_nth_unstable_by(k, |a, b| a.1.total_cmp(&b.1));
                row.truncate(k);
            }
            row
        })
        .collect()
}

/// Conditional distribution over neighbour distances `dists`
/// whose perplexity matches `perplexity`.
fn conditional_row(dists: &[f64], perplexity: f64) -> Vec<f64> {
    let target = perplexity.ln();
    let mut beta = 1.0f64;
    let (mut lo, mut hi) = (f64::NEG_INFINITY, f64::INFINITY);
    let mut row = vec![0.0; dists.len()];

    // Shift by the nearest neighbour for numerical stability
    let nearest = dists.iter().copied().fold(f64::INFINITY, f64::min);

    for _ in 0..BANDWIDTH_SEARCH_STEPS {
        let mut sum = 0.0;
        for (p, &d) in row.iter_mut().zip(dists) {
            *p = (-(d - nearest) * beta).exp();
            sum += *p;
        }
        let mut entropy = 0.0;
        for p in row.iter_mut() {
            *p /= sum;
            if *p > MIN_PROB {
                entropy -= *p * p.ln();
            }
        }

        let diff = entropy - target;
        if diff.abs() < ENTROPY_TOL {
            break;
        }
        if diff > 0.0 {
            lo   = beta;
            beta = if hi.is_finite() { (beta + hi) / 2.0 } else { beta * 2.0 };
        } else {
            hi   = beta;
            beta = if lo.is_finite() { (beta + lo) / 2.0 } else { beta / 2.0 };
        }
    }
    row
}

/// Needs at least two points.
fn joint_probabilities(data: &[Vec<f64>], perplexity: f64) -> SparseP {
    let n = data.len();
    let k = ((3.0 * perplexity) as usize).clamp(1, n - 1);

    let mut joint: Vec<HashMap<usize, f64>> = vec![HashMap::new(); n];
    for (i, row) in nearest_neighbours(data, k).into_iter().enumerate() {
        let dists: Vec<f64> = row.iter().map(|&(_, d)| d).collect();
        for ((j, _), p) in row.into_iter().zip(conditional_row(&dists, perplexity)) {
            *joint[i].entry(j).or_insert(0.0) += p;
            *joint[j].entry(i).or_insert(0.0) += p;
        }
    }

    let denom = 2.0 * n as f64;
    joint
        .into_iter()
        .map(|row| {
            let mut row: Vec<(usize, f64)> = row
                .into_iter()
                .map(|(j, p)| (j, (p / denom).max(MIN_PROB)))
                .collect();
            row.sort_unstable_by_key(|&(j, _)| j);
            row
        })
        .collect()
}
