//! Region load state, as reported by the world.

use std::collections::BTreeSet;

use voltgrid_core::position::Region;

/// Answers "is this region currently loaded?" on behalf of the world.
///
/// Pathfinding only traverses nodes whose region is loaded.
pub trait RegionOracle {
    fn is_region_loaded(&self, region: Region) -> bool;
}

/// Oracle that reports every region as loaded.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllLoaded;

impl RegionOracle for AllLoaded {
    fn is_region_loaded(&self, _region: Region) -> bool {
        true
    }
}

/// An explicit set of loaded regions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedRegions {
    loaded: BTreeSet<Region>,
}

impl LoadedRegions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a load-state change. Returns `true` if the state changed.
    pub fn set_loaded(&mut self, region: Region, loaded: bool) -> bool {
        if loaded {
            self.loaded.insert(region)
        } else {
            self.loaded.remove(&region)
        }
    }

    pub fn is_loaded(&self, region: Region) -> bool {
        self.loaded.contains(&region)
    }

    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.loaded.iter()
    }
}

impl FromIterator<Region> for LoadedRegions {
    fn from_iter<I: IntoIterator<Item = Region>>(iter: I) -> Self {
        Self {
            loaded: iter.into_iter().collect(),
        }
    }
}

impl RegionOracle for LoadedRegions {
    fn is_region_loaded(&self, region: Region) -> bool {
        self.is_loaded(region)
    }
}

impl<T: RegionOracle + ?Sized> RegionOracle for &T {
    fn is_region_loaded(&self, region: Region) -> bool {
        (**self).is_region_loaded(region)
    }
}
