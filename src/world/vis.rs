//! Potentially-visible-set lookups.
//!
//! The table is `clusters × bytes_per_cluster` bytes; row `current` holds one
//! bit per cluster that can be seen from `current`.

/// Decoded `VisData` lump.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VisData {
    clusters: usize,
    bytes_per_cluster: usize,
    bitsets: Vec<u8>,
}

impl VisData {
    pub fn new(clusters: usize, bytes_per_cluster: usize, bitsets: Vec<u8>) -> Self {
        Self {
            clusters,
            bytes_per_cluster,
            bitsets,
        }
    }

    /// `true` when the level carries no visibility information.
    pub fn is_empty(&self) -> bool {
        self.bitsets.is_empty()
    }

    pub fn cluster_count(&self) -> usize {
        self.clusters
    }

    pub fn bytes_per_cluster(&self) -> usize {
        self.bytes_per_cluster
    }

    /// Can cluster `test` be seen from cluster `current`?
    ///
    /// Without PVS data, or from outside the map (`current < 0`), everything
    /// is reported visible.  A negative `test` cluster is never visible.
    #[inline]
    pub fn is_visible(&self, current: i32, test: i32) -> bool {
        if self.bitsets.is_empty() || current < 0 {
            return true;
        }
        if test < 0 {
            return false;
        }
        let (current, test) = (current as usize, test as usize);
        self.bitsets
            .get(current * self.bytes_per_cluster + test / 8)
            .is_some_and(|set| set & (1 << (test & 7)) != 0)
    }

    /// Every cluster visible from `current`, in ascending order.
    pub fn visible_clusters(&self, current: i32) -> impl Iterator<Item = i32> + '_ {
        (0..self.clusters as i32).filter(move |&c| self.is_visible(current, c))
    }
}

/*======================================================================*/
/*                               Tests                                  */
/*======================================================================*/
