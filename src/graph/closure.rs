//! Reverse edges and their transitive closure

use std::collections::VecDeque;

use super::arena::FileId;

/// Invert forward adjacency: `direct[d]` lists every file importing `d`.
pub(super) fn invert(forward: &[Vec<FileId>]) -> Vec<Vec<FileId>> {
    let mut direct = vec![Vec::new(); forward.len()];
    for (importer, deps) in forward.iter().enumerate() {
        for dep in deps {
            direct[dep.index()].push(FileId::from_index(importer));
        }
    }
    direct
}

/// Everything reachable from each node along `direct` edges.
///
/// One BFS per node. The start node is only part of its own closure when a
/// cycle leads back to it. Results are sorted.
pub(super) fn transitive_closure(direct: &[Vec<FileId>]) -> Vec<Vec<FileId>> {
    let n = direct.len();
    let mut visited = vec![false; n];
    let mut touched: Vec<FileId> = Vec::new();
    let mut queue: VecDeque<FileId> = VecDeque::new();
    let mut closure = Vec::with_capacity(n);

    for start in 0..n {
        queue.extend(direct[start].iter().copied());
        while let Some(node) = queue.pop_front() {
            if visited[node.index()] {
                continue;
            }
            visited[node.index()] = true;
            touched.push(node);
            for &next in &direct[node.index()] {
                if !visited[next.index()] {
                    queue.push_back(next);
                }
            }
        }

        touched.sort_unstable();
        for id in &touched {
            visited[id.index()] = false;
        }
        closure.push(std::mem::take(&mut touched));
    }

    closure
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(v: &[usize]) -> Vec<FileId> {
        v.iter().map(|&i| FileId::from_index(i)).collect()
    }

    #[test]
    fn test_invert() {
        // 0 -> 1, 0 -> 2, 1 -> 2
        let forward = vec![ids(&[1, 2]), ids(&[2]), ids(&[])];
        let direct = invert(&forward);
        assert!(direct[0].is_empty());
        assert_eq!(direct[1], ids(&[0]));
        assert_eq!(direct[2], ids(&[0, 1]));
    }

    #[test]
    fn test_closure_chain() {
        // 2 <- 1 <- 0  (0 imports 1 imports 2)
        let direct = vec![ids(&[]), ids(&[0]), ids(&[1])];
        let closure = transitive_closure(&direct);
        assert_eq!(closure[2], ids(&[0, 1]));
        assert_eq!(closure[1], ids(&[0]));
        assert!(closure[0].is_empty());
    }

    #[test]
    fn test_closure_cycle_terminates_and_includes_self() {
        // 0 <-> 1
        let direct = vec![ids(&[1]), ids(&[0])];
        let closure = transitive_closure(&direct);
        assert_eq!(closure[0], ids(&[0, 1]));
        assert_eq!(closure[1], ids(&[0, 1]));
    }

    #[test]
    fn test_closure_diamond() {
        // A=0, B=1, C=2, D=3; A->B, A->C, B->D, C->D
        let forward = vec![ids(&[1, 2]), ids(&[3]), ids(&[3]), ids(&[])];
        let closure = transitive_closure(&invert(&forward));
        assert_eq!(closure[3], ids(&[0, 1, 2]));
        assert_eq!(closure[1], ids(&[0]));
        assert!(closure[0].is_empty());
    }

    #[test]
    fn test_closure_empty() {
        assert!(transitive_closure(&[]).is_empty());
    }
}
