/// Disjoint sets over `0..n`, with path compression and union by size.
#[derive(Debug, Clone, Default)]
pub struct UnionFind {
    /// parents[i] == i for the root of a set
    parents: Vec<usize>,
    /// Size of the set, valid only at roots
    sizes: Vec<usize>,
}

impl UnionFind {
    pub fn new(size: usize) -> Self {
        Self {
            parents: (0..size).collect(),
            sizes: vec![1; size],
        }
    }

    fn len(&self) -> usize {
        self.parents.len()
    }

    /// Root of the set containing `index`, or None when out of range
    pub fn find(&mut self, index: usize) -> Option<usize> {
        if index >= self.len() {
            return None;
        }
        let mut root = index;
        while root != self.parents[root] {
            root = self.parents[root];
        }
        let mut node = index;
        while node != root {
            let next = self.parents[node];
            self.parents[node] = root;
            node = next;
        }
        Some(root)
    }

    /// Merges the sets of `a` and `b`.
    /// Returns Some(true) when two different sets were merged.
    pub fn unite(&mut self, a: usize, b: usize) -> Option<bool> {
        let ra = self.find(a)?;
        let rb = self.find(b)?;
        if ra == rb {
            return Some(false);
        }
        let (big, small) = if self.sizes[ra] >= self.sizes[rb] {
            (ra, rb)
        } else {
            (rb, ra)
        };
        self.parents[small] = big;
        self.sizes[big] += self.sizes[small];
        Some(true)
    }

    /// All sets, each sorted ascending, ordered by their smallest element
    pub fn components(&mut self) -> Vec<Vec<usize>> {
        let mut slot_of_root: Vec<Option<usize>> = vec![None; self.len()];
        let mut components: Vec<Vec<usize>> = vec![];
        for i in 0..self.len() {
            let root = self.find(i).unwrap_or(i);
            match slot_of_root[root] {
                Some(slot) => components[slot].push(i),
                None => {
                    slot_of_root[root] = Some(components.len());
                    components.push(vec![i]);
                }
            }
        }
        components
    }
}
