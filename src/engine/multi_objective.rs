//! Multi-objective ranking.
//!
//! Pareto-based ranking of a population snapshot, used by the engine
//! whenever a problem declares more than one objective.
//!
//! # Algorithms
//!
//! - [`pareto_analysis`]: pairwise dominance relations through the problem comparator
//! - [`crowding_distance`]: density estimate for diversity preservation
//! - [`non_dominated_sort`]: NSGA-II style ranking (default)
//! - [`strength_pareto_sort`]: SPEA2 style strength ranking
//!
//! [`non_dominated_sort`] does not materialize discrete fronts: a single
//! comparator (dominator count, then crowding distance) yields the same
//! relative order within and across adjacent fronts.
//!
//! # References
//!
//! - Deb et al. (2002), "A Fast and Elitist Multiobjective Genetic Algorithm: NSGA-II"
//! - Zitzler, Laumanns & Thiele (2001), "SPEA2: Improving the Strength Pareto
//!   Evolutionary Algorithm"

use super::types::{Direction, Element, ElementId, Objective, Pareto, Problem};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Pareto dominance between two score vectors.
///
/// Returns `Greater` when `a` dominates `b` (at least as good in every
/// objective and strictly better in one), `Less` when `b` dominates `a`,
/// `Equal` otherwise. Objectives missing from `objectives` are minimized.
///
/// ```
/// use std::cmp::Ordering;
/// use u_swarm::engine::multi_objective::dominance;
/// use u_swarm::engine::Objective;
///
/// let objs = [Objective::minimize("cost"), Objective::maximize("quality")];
/// assert_eq!(dominance(&[1.0, 9.0], &[2.0, 8.0], &objs), Ordering::Greater);
/// assert_eq!(dominance(&[1.0, 7.0], &[2.0, 8.0], &objs), Ordering::Equal);
/// ```
pub fn dominance(a: &[f64], b: &[f64], objectives: &[Objective]) -> Ordering {
    let mut a_better_in_some = false;
    let mut b_better_in_some = false;

    for (i, (&va, &vb)) in a.iter().zip(b.iter()).enumerate() {
        let direction = objectives.get(i).map_or(Direction::Minimize, |o| o.direction);
        match direction.compare(va, vb) {
            Ordering::Greater => a_better_in_some = true,
            Ordering::Less => b_better_in_some = true,
            Ordering::Equal => {}
        }
    }

    match (a_better_in_some, b_better_in_some) {
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

/// Annotates every element with its dominators and dominated elements.
///
/// Each unordered pair is visited once and the comparator result is
/// recorded in both directions. Previous annotations (including crowding
/// distance and strength) are discarded.
///
/// # Complexity
///
/// O(n²) comparator calls.
pub fn pareto_analysis<P: Problem>(problem: &P, elements: &mut [Element]) {
    let n = elements.len();
    let mut relations = vec![Pareto::default(); n];

    for i in 0..n {
        for j in (i + 1)..n {
            match problem.compare(&elements[i], &elements[j]) {
                Ordering::Greater => {
                    relations[i].dominated.push(elements[j].id());
                    relations[j].dominators.push(elements[i].id());
                }
                Ordering::Less => {
                    relations[j].dominated.push(elements[i].id());
                    relations[i].dominators.push(elements[j].id());
                }
                Ordering::Equal => {}
            }
        }
    }

    for (element, relation) in elements.iter_mut().zip(relations) {
        element.pareto = Some(relation);
        element.crowding_distance = None;
        element.pareto_strength = None;
    }
}

/// Assigns crowding distances.
///
/// For each objective independently, the elements are ranked ascending by
/// that score; the two extremes get `f64::INFINITY` and every interior
/// element adds `next - previous`. Distances are raw (not normalized by
/// the objective range).
///
/// # Complexity
///
/// O(m * n * log n) where m = number of objectives, n = number of elements
pub fn crowding_distance(elements: &mut [Element]) {
    let n = elements.len();
    let mut distances = vec![0.0f64; n];

    let m = elements
        .iter()
        .filter_map(|e| e.evaluation().map(<[f64]>::len))
        .max()
        .unwrap_or(0);

    if n > 0 {
        for obj_idx in 0..m {
            let score = |i: usize| elements[i].score(obj_idx).unwrap_or(0.0);

            let mut ranking: Vec<usize> = (0..n).collect();
            ranking.sort_by(|&a, &b| score(a).partial_cmp(&score(b)).unwrap_or(Ordering::Equal));

            distances[ranking[0]] = f64::INFINITY;
            distances[ranking[n - 1]] = f64::INFINITY;

            for w in 1..n.saturating_sub(1) {
                distances[ranking[w]] += score(ranking[w + 1]) - score(ranking[w - 1]);
            }
        }
    }

    for (element, distance) in elements.iter_mut().zip(distances) {
        element.crowding_distance = Some(distance);
    }
}

/// NSGA-II style ranking.
///
/// Runs [`pareto_analysis`] and [`crowding_distance`], then orders by
/// ascending dominator count with ties broken by descending crowding
/// distance. The sort is stable.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use u_swarm::engine::multi_objective::non_dominated_sort;
/// use u_swarm::engine::{model, Dimension, Element, EvaluationError, Objective, Problem};
///
/// struct Identity(Vec<Objective>, Arc<[Dimension]>);
///
/// impl Problem for Identity {
///     fn objectives(&self) -> &[Objective] { &self.0 }
///     fn model(&self) -> Arc<[Dimension]> { Arc::clone(&self.1) }
///     fn evaluate(&self, e: &Element) -> Result<Vec<f64>, EvaluationError> {
///         Ok(e.values().to_vec())
///     }
/// }
///
/// let problem = Identity(
///     vec![Objective::minimize("f1"), Objective::minimize("f2")],
///     model(&[10, 10]),
/// );
/// let points = [[4.0, 4.0], [1.0, 5.0], [3.0, 3.0], [5.0, 1.0]];
/// let elements: Vec<Element> = points
///     .iter()
///     .map(|p| Element::new(p.to_vec(), problem.model()).with_evaluation(p.to_vec()))
///     .collect();
///
/// let ranked = non_dominated_sort(&problem, elements);
///
/// // (4, 4) is dominated by (3, 3) and ranks last
/// assert_eq!(ranked[3].values(), &[4.0, 4.0]);
/// assert_eq!(ranked[3].dominator_count(), 1);
/// ```
pub fn non_dominated_sort<P: Problem>(problem: &P, mut elements: Vec<Element>) -> Vec<Element> {
    pareto_analysis(problem, &mut elements);
    crowding_distance(&mut elements);

    elements.sort_by(|a, b| {
        a.dominator_count().cmp(&b.dominator_count()).then_with(|| {
            let da = a.crowding_distance.unwrap_or(0.0);
            let db = b.crowding_distance.unwrap_or(0.0);
            db.partial_cmp(&da).unwrap_or(Ordering::Equal)
        })
    });
    elements
}

/// SPEA2 style ranking.
///
/// Runs [`pareto_analysis`]; the strength of an element is the sum, over
/// its dominators, of how many elements each dominator dominates. Lower
/// strength ranks first. The sort is stable.
pub fn strength_pareto_sort<P: Problem>(problem: &P, mut elements: Vec<Element>) -> Vec<Element> {
    pareto_analysis(problem, &mut elements);

    let dominated_counts: HashMap<ElementId, usize> = elements
        .iter()
        .map(|e| (e.id(), e.dominated_count()))
        .collect();

    for element in elements.iter_mut() {
        let strength: usize = element.pareto.as_ref().map_or(0, |p| {
            p.dominators
                .iter()
                .map(|id| dominated_counts.get(id).copied().unwrap_or(0))
                .sum()
        });
        element.pareto_strength = Some(strength as f64);
    }

    elements.sort_by(|a, b| {
        let sa = a.pareto_strength.unwrap_or(0.0);
        let sb = b.pareto_strength.unwrap_or(0.0);
        sa.partial_cmp(&sb).unwrap_or(Ordering::Equal)
    });
    elements
}

/// Elements with no dominators in the last analysed snapshot.
///
/// Unannotated elements are not part of any front.
pub fn pareto_front(elements: &[Element]) -> Vec<&Element> {
    elements
        .iter()
        .filter(|e| e.pareto().is_some_and(|p| p.dominators.is_empty()))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
