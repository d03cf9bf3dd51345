//! Disjoint-set forest used to partition bodies into simulation islands.
//!
//! Elements are plain indices. `id` is the parent link until [`UnionFind::sort_islands`] runs,
//! after which every element holds its island root in `id`. `sz` always holds the element's
//! original index.

/// One entry of the disjoint-set forest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Element {
    /// Parent index, or the island root after `sort_islands`.
    pub id: usize,
    /// Original element index, which survives the reordering done by `sort_islands`.
    pub sz: usize,
}

/// Union-find with path compression.
///
/// `unite(a, b)` always attaches the root of `a` under the root of `b`, which keeps partitioning
/// deterministic for a given sequence of unions.
#[derive(Debug, Clone, Default)]
pub struct UnionFind {
    elements: Vec<Element>,
}

impl UnionFind {
    /// Creates an empty structure.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves room for `n` elements without initializing them.
    pub fn allocate(&mut self, n: usize) {
        self.elements.reserve(n.saturating_sub(self.elements.len()));
    }

    /// Releases all storage.
    pub fn free(&mut self) {
        self.elements = Vec::new();
    }

    /// Reinitializes the structure with `n` singleton sets.
    pub fn reset(&mut self, n: usize) {
        self.elements.clear();
        self.elements
            .extend((0..n).map(|i| Element { id: i, sz: i }));
    }

    /// Number of elements currently tracked.
    #[inline(always)]
    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }

    /// Gets an element by index.
    #[inline(always)]
    pub fn element(&self, index: usize) -> &Element {
        &self.elements[index]
    }

    /// Tests whether `x` is the representative of its set.
    #[inline(always)]
    pub fn is_root(&self, x: usize) -> bool {
        self.elements[x].id == x
    }

    /// Finds the representative of `x`, halving the path as it walks.
    pub fn find(&mut self, mut x: usize) -> usize {
        debug_assert!(x < self.elements.len(), "Element {x} is out of range.");
        while x != self.elements[x].id {
            let grandparent = self.elements[self.elements[x].id].id;
            self.elements[x].id = grandparent;
            x = grandparent;
        }
        x
    }

    /// Finds the representative of `x` without compressing.
    pub fn find_readonly(&self, mut x: usize) -> usize {
        while x != self.elements[x].id {
            x = self.elements[x].id;
        }
        x
    }

    /// Merges the sets containing `a` and `b`.
    pub fn unite(&mut self, a: usize, b: usize) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a == root_b {
            return;
        }
        self.elements[root_a].id = root_b;
    }

    /// Resolves every element to its root and sorts the elements so that members of one island are
    /// contiguous. Afterwards `element(i).id` is the island id and `element(i).sz` the original index.
    ///
    /// Sorting is stable by original index within an island.
    pub fn sort_islands(&mut self) {
        let count = self.elements.len();
        for i in 0..count {
            let root = self.find(i);
            self.elements[i].id = root;
        }
        self.elements.sort_by_key(|element| (element.id, element.sz));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_creates_singletons() {
        let mut uf = UnionFind::new();
        uf.reset(4);
        assert_eq!(uf.num_elements(), 4);
        for i in 0..4 {
            assert!(uf.is_root(i));
            assert_eq!(uf.find(i), i);
        }
    }

    #[test]
    fn unite_attaches_first_root_under_second() {
        let mut uf = UnionFind::new();
        uf.reset(3);
        uf.unite(0, 1);
        assert_eq!(uf.find(0), 1);
        assert!(!uf.is_root(0));
        assert!(uf.is_root(1));
        uf.unite(1, 0);
        assert_eq!(uf.find(0), 1);
        // Uniting only relinks roots; original indices stay put.
        assert_eq!(uf.element(1).sz, 1);
        assert_eq!(uf.element(0).sz, 0);
    }

    #[test]
    fn sort_islands_groups_members() {
        let mut uf = UnionFind::new();
        uf.reset(5);
        uf.unite(4, 0);
        uf.unite(3, 1);
        uf.sort_islands();
        let ids: Vec<usize> = (0..5).map(|i| uf.element(i).id).collect();
        assert_eq!(ids, vec![0, 0, 1, 1, 2]);
        let originals: Vec<usize> = (0..5).map(|i| uf.element(i).sz).collect();
        assert_eq!(originals, vec![0, 4, 1, 3, 2]);
    }
}
