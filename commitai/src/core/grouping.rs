//! Transitive-overlap grouping of proposals.
//!
//! Proposals that share a file, directly or through a chain of other
//! proposals, collapse into one [`MergedGroup`]. Connected components are
//! computed with a [`DisjointSet`] over dense proposal indices; all output
//! ordering derives from proposal indices, never from hash iteration order.

use std::collections::HashMap;
use std::collections::HashSet;
use std::collections::hash_map::Entry;

use tracing::debug;

use crate::core::types::{MergedGroup, Proposal};

/// Union-find over `0..len` with path halving and union by rank.
#[derive(Debug, Clone)]
pub struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    pub fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            rank: vec![0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Representative of `x`'s set.
    pub fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Merge the sets holding `a` and `b`. Returns false if already joined.
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
        true
    }
}

#[derive(Default)]
struct GroupBuilder {
    files: Vec<String>,
    seen: HashSet<String>,
    messages: Vec<String>,
}

impl GroupBuilder {
    fn absorb(&mut self, proposal: &Proposal) {
        for file in &proposal.files {
            if self.seen.insert(file.clone()) {
                self.files.push(file.clone());
            }
        }
        self.messages.extend(proposal.messages.iter().cloned());
    }

    fn build(self) -> MergedGroup {
        MergedGroup {
            files: self.files,
            messages: self.messages,
        }
    }
}

/// Merge proposals with overlapping file sets into a partition.
///
/// - Groups are ordered by their lowest member proposal index.
/// - Messages are concatenated by member index, then each member's own order.
/// - Files keep first-seen order under the same ordering.
pub fn group_proposals(proposals: &[Proposal]) -> Vec<MergedGroup> {
    let mut sets = DisjointSet::new(proposals.len());
    // First proposal seen for each file. Later proposals union with it, which
    // joins them with every earlier holder of that file as well.
    let mut owners: HashMap<&str, usize> = HashMap::new();
    for (index, proposal) in proposals.iter().enumerate() {
        for file in &proposal.files {
            match owners.entry(file.as_str()) {
                Entry::Occupied(owner) => {
                    sets.union(*owner.get(), index);
                }
                Entry::Vacant(slot) => {
                    slot.insert(index);
                }
            }
        }
    }

    let mut slot_by_root: Vec<Option<usize>> = vec![None; proposals.len()];
    let mut builders: Vec<GroupBuilder> = Vec::new();
    for (index, proposal) in proposals.iter().enumerate() {
        let root = sets.find(index);
        let slot = *slot_by_root[root].get_or_insert_with(|| {
            builders.push(GroupBuilder::default());
            builders.len() - 1
        });
        builders[slot].absorb(proposal);
    }

    let groups: Vec<MergedGroup> = builders.into_iter().map(GroupBuilder::build).collect();
    debug!(
        proposals = proposals.len(),
        groups = groups.len(),
        "grouped proposals"
    );
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(files: &[&str], messages: &[&str]) -> MergedGroup {
        MergedGroup {
            files: files.iter().map(|f| f.to_string()).collect(),
            messages: messages.iter().map(|m| m.to_string()).collect(),
        }
    }

    #[test]
    fn disjoint_set_tracks_components() {
        let mut sets = DisjointSet::new(4);
        assert!(sets.union(0, 1));
        assert!(sets.union(2, 3));
        assert!(!sets.union(1, 0));
        assert_eq!(sets.find(0), sets.find(1));
        assert_ne!(sets.find(1), sets.find(2));
        assert!(sets.union(1, 3));
        assert_eq!(sets.find(0), sets.find(2));
        assert_eq!(sets.len(), 4);
    }

    #[test]
    fn overlapping_proposals_merge_in_input_order() {
        let proposals = vec![
            Proposal::new(["x", "y"], ["a"]),
            Proposal::new(["y", "z"], ["b"]),
            Proposal::new(["w"], ["c"]),
        ];
        assert_eq!(
            group_proposals(&proposals),
            vec![group(&["x", "y", "z"], &["a", "b"]), group(&["w"], &["c"])]
        );
    }

    #[test]
    fn overlap_is_transitive() {
        let proposals = vec![
            Proposal::new(["f1"], ["a"]),
            Proposal::new(["other"], ["unrelated"]),
            Proposal::new(["f1", "f2"], ["b"]),
            Proposal::new(["f2", "f3"], ["c"]),
        ];
        let groups = group_proposals(&proposals);
        assert_eq!(
            groups,
            vec![
                group(&["f1", "f2", "f3"], &["a", "b", "c"]),
                group(&["other"], &["unrelated"]),
            ]
        );
    }

    #[test]
    fn late_bridge_joins_earlier_components() {
        // 0 and 1 are separate until 2 touches both.
        let proposals = vec![
            Proposal::new(["a"], ["first"]),
            Proposal::new(["b"], ["second"]),
            Proposal::new(["b", "a"], ["bridge"]),
        ];
        assert_eq!(
            group_proposals(&proposals),
            vec![group(&["a", "b"], &["first", "second", "bridge"])]
        );
    }

    #[test]
    fn disjoint_proposals_pass_through() {
        let proposals = vec![
            Proposal::new(["a"], ["1"]),
            Proposal::new(["b", "c"], ["2", "2b"]),
            Proposal::new(["d"], ["3"]),
        ];
        assert_eq!(
            group_proposals(&proposals),
            vec![
                group(&["a"], &["1"]),
                group(&["b", "c"], &["2", "2b"]),
                group(&["d"], &["3"]),
            ]
        );
    }

    #[test]
    fn identical_file_sets_fully_merge() {
        let proposals = vec![
            Proposal::new(["a", "b"], ["one"]),
            Proposal::new(["b", "a"], ["two"]),
        ];
        assert_eq!(
            group_proposals(&proposals),
            vec![group(&["a", "b"], &["one", "two"])]
        );
    }

    #[test]
    fn regrouping_output_is_stable() {
        let proposals = vec![
            Proposal::new(["x", "y"], ["a"]),
            Proposal::new(["q"], ["b"]),
            Proposal::new(["y", "z"], ["c"]),
        ];
        let first = group_proposals(&proposals);
        let again: Vec<Proposal> = first
            .iter()
            .map(|g| Proposal::new(g.files.clone(), g.messages.clone()))
            .collect();
        assert_eq!(group_proposals(&again), first);
    }

    #[test]
    fn empty_input_yields_no_groups() {
        assert!(group_proposals(&[]).is_empty());
    }
}
