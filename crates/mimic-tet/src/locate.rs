//! Tiered point location in a tet mesh.
//!
//! Tiers, cheapest first:
//! 1. the tet whose centroid is nearest to the point,
//! 2. the one-ring of that tet (tets sharing any of its vertices),
//! 3. every tet in the mesh.
//!
//! A tet accepts the point when all four barycentric weights exceed the
//! (slightly negative) barycentric tolerance, so points numerically on a
//! face are not lost between neighbours.

use std::fmt;
use std::sync::Arc;

use log::{debug, warn};
use mimic_math::{Point3, Tolerance};
use serde::{Deserialize, Serialize};

use crate::error::LocateError;
use crate::TetMesh;

/// The search tier that located a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchTier {
    /// Tet with the nearest centroid.
    Nearest,
    /// Neighbour of the nearest tet.
    OneRing,
    /// Exhaustive scan.
    BruteForce,
}

/// A located point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TetLocation {
    /// Containing tet.
    pub tet: usize,
    /// Barycentric weights with respect to the tet's vertices; they sum to one.
    pub barycentric: [f64; 4],
    /// Tier that found the tet.
    pub tier: SearchTier,
}

/// Per-tier counters of a locator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocateStats {
    /// Total calls to [`TetLocator::locate`].
    pub calls: u64,
    /// Points found in the nearest tet.
    pub nearest: u64,
    /// Points found in the one-ring.
    pub one_ring: u64,
    /// Points found by the exhaustive scan.
    pub brute_force: u64,
    /// Points no tet contains.
    pub failures: u64,
}

impl LocateStats {
    /// Share of calls resolved by `tier`, in percent.
    pub fn percent(&self, tier: SearchTier) -> f64 {
        if self.calls == 0 {
            return 0.0;
        }
        let hits = match tier {
            SearchTier::Nearest => self.nearest,
            SearchTier::OneRing => self.one_ring,
            SearchTier::BruteForce => self.brute_force,
        };
        100.0 * hits as f64 / self.calls as f64
    }

    fn record(&mut self, tier: SearchTier) {
        match tier {
            SearchTier::Nearest => self.nearest += 1,
            SearchTier::OneRing => self.one_ring += 1,
            SearchTier::BruteForce => self.brute_force += 1,
        }
    }
}

impl fmt::Display for LocateStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} locate calls, NN: {:.2}%, 1R: {:.2}%, BF: {:.2}%, failed: {}",
            self.calls,
            self.percent(SearchTier::Nearest),
            self.percent(SearchTier::OneRing),
            self.percent(SearchTier::BruteForce),
            self.failures
        )
    }
}

/// Locates points in a shared tet mesh and counts how each was found.
#[derive(Debug)]
pub struct TetLocator {
    mesh: Arc<TetMesh>,
    tolerance: Tolerance,
    stats: LocateStats,
}

impl TetLocator {
    /// Locator over `mesh` accepting weights above `tolerance.barycentric`.
    pub fn new(mesh: Arc<TetMesh>, tolerance: Tolerance) -> Self {
        Self {
            mesh,
            tolerance,
            stats: LocateStats::default(),
        }
    }

    /// The mesh searched.
    pub fn mesh(&self) -> &Arc<TetMesh> {
        &self.mesh
    }

    /// Counters accumulated so far.
    pub fn stats(&self) -> &LocateStats {
        &self.stats
    }

    /// Find the tet containing `p` and its barycentric weights.
    ///
    /// Later tiers run only when earlier ones fail.
    pub fn locate(&mut self, p: &Point3) -> Result<TetLocation, LocateError> {
        self.stats.calls += 1;

        let found = self.search(p);
        match found {
            Some(loc) => {
                self.stats.record(loc.tier);
                Ok(loc)
            }
            None => {
                self.stats.failures += 1;
                warn!("point {:?} is not inside any tet", p.coords.as_slice());
                Err(LocateError::NotLocated {
                    x: p.x,
                    y: p.y,
                    z: p.z,
                })
            }
        }
    }

    fn search(&self, p: &Point3) -> Option<TetLocation> {
        let mesh = &self.mesh;

        let nearest = mesh.nearest_tet(p)?;
        if let Some(loc) = self.try_tet(nearest, p, SearchTier::Nearest) {
            return Some(loc);
        }

        if let Some(loc) = mesh
            .one_ring(nearest)
            .into_iter()
            .find_map(|t| self.try_tet(t, p, SearchTier::OneRing))
        {
            return Some(loc);
        }

        debug!("falling back to brute-force tet search");
        (0..mesh.tet_count()).find_map(|t| self.try_tet(t, p, SearchTier::BruteForce))
    }

    fn try_tet(&self, t: usize, p: &Point3, tier: SearchTier) -> Option<TetLocation> {
        let w = self.mesh.barycentric(t, p);
        self.tolerance.barycentric_valid(&w).then_some(TetLocation {
            tet: t,
            barycentric: w,
            tier,
        })
    }
}
