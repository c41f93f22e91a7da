//! A bundled power-iteration eigensolver. The eigensolver itself is kept a
//! replaceable external collaborator — this is a reference implementation
//! for the demonstration binary only, not part of the library crates.

use credrank_graph::SparseMarkovChain;

/// Runs power iteration over `chain`'s in-edge representation until the L1
/// change between successive iterates drops below `tolerance` or
/// `max_iterations` is reached, whichever comes first. Returns the
/// resulting score vector, aligned to `chain.node_order`.
pub fn power_iteration(chain: &SparseMarkovChain, tolerance: f64, max_iterations: usize) -> Vec<f64> {
    let n = chain.node_order.len();
    if n == 0 {
        return Vec::new();
    }
    let mut scores = vec![1.0 / n as f64; n];

    for iteration in 0..max_iterations {
        let mut next = vec![0.0_f64; n];
        for (dst, in_edges) in chain.in_edges.iter().enumerate() {
            for &(src, weight) in in_edges {
                next[dst] += scores[src] * weight;
            }
        }

        let total: f64 = next.iter().sum();
        if total > 0.0 {
            for value in &mut next {
                *value /= total;
            }
        }

        let delta: f64 = scores
            .iter()
            .zip(next.iter())
            .map(|(a, b)| (a - b).abs())
            .sum();

        scores = next;
        tracing::trace!(iteration, delta, "power iteration step");
        if delta < tolerance {
            tracing::debug!(iteration, delta, "power iteration converged");
            break;
        }
    }

    scores
}

#[cfg(test)]
mod tests {
    use super::*;
    use credrank_core::NodeAddress;

    #[test]
    fn uniform_chain_stays_uniform() {
        // Two nodes, each fully radiating to the other: a symmetric chain
        // whose stationary distribution is the uniform vector it starts from.
        let chain = SparseMarkovChain {
            node_order: vec![
                NodeAddress::from_parts(["a"]).unwrap(),
                NodeAddress::from_parts(["b"]).unwrap(),
            ],
            in_edges: vec![vec![(1, 1.0)], vec![(0, 1.0)]],
        };
        let scores = power_iteration(&chain, 1e-12, 1000);
        assert_eq!(scores.len(), 2);
        assert!((scores[0] - 0.5).abs() < 1e-9);
        assert!((scores[1] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn empty_chain_returns_empty_scores() {
        let chain = SparseMarkovChain {
            node_order: vec![],
            in_edges: vec![],
        };
        assert!(power_iteration(&chain, 1e-12, 100).is_empty());
    }
}
