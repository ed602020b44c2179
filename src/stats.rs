//! Closed-form probability estimators derived from filter occupancy.
//!
//! Everything here is pure: statistics are recomputed on demand from
//! the insert-time counters and never mutate them. Intermediate
//! arithmetic runs in `f64`; reported values are narrowed to `f32`.

use crate::filter::SpatialBloomFilter;
use serde::Serialize;

/// Sentinel for undefined ratios (e.g. emersion of an empty area).
pub const UNDEFINED: f32 = -1.0;

/// Per-area statistics, one record per area label.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct AreaStatistics {
    /// A-priori false positive probability attributable to this area
    pub a_priori_fpp: f32,
    /// A-posteriori false positive probability from observed occupancy
    pub fpp: f32,
    /// A-priori inter-set error probability: chance a member of this
    /// area is misread as a higher-labeled one
    pub a_priori_isep: f32,
    /// A-priori probability that no member of this area suffers an
    /// inter-set error
    pub a_priori_safep: f32,
    /// Expected number of cells left visibly holding this label
    pub expected_cells: usize,
    /// Observed fraction of this area's potential footprint still
    /// visible (not overwritten by higher labels)
    pub emersion: f32,
    /// Closed-form analog of emersion from member counts alone
    pub expected_emersion: f32,
    /// True when current occupancy cannot misclassify this area's
    /// members into another area
    pub flotation: bool,
}

/// Filter-wide and per-area statistics, computed in one pass.
#[derive(Clone, Debug, Serialize)]
pub struct FilterStatistics {
    pub sparsity: f32,
    pub a_priori_fpp: f32,
    pub fpp: f32,
    /// Probability that no inter-set error occurs anywhere in the
    /// filter: product of the per-area safeness probabilities
    pub safeness: f32,
    /// Indexed by area label; slot 0 is reserved and holds sentinels
    pub areas: Vec<AreaStatistics>,
}

impl SpatialBloomFilter {
    /// Fraction of cells still empty, in [0, 1].
    pub fn sparsity(&self) -> f32 {
        let occupied: usize =
            self.areas.iter().map(|area| area.cells_used).sum();
        (1.0 - occupied as f64 / self.cell_count() as f64) as f32
    }

    /// A-posteriori false positive probability over the whole filter:
    /// the chance that a foreign element hits only non-empty cells.
    pub fn filter_fpp(&self) -> f32 {
        let occupied: usize =
            self.areas.iter().map(|area| area.cells_used).sum();
        let p = occupied as f64 / self.cell_count() as f64;
        p.powi(self.config.hash_count as i32) as f32
    }

    /// A-priori false positive probability over the whole filter,
    /// from member counts alone.
    pub fn filter_a_priori_fpp(&self) -> f32 {
        let cells = self.cell_count() as f64;
        let exponent =
            (self.config.hash_count * self.total_members) as f64;
        let p = 1.0 - (1.0 - 1.0 / cells).powf(exponent);
        p.powi(self.config.hash_count as i32) as f32
    }

    /// Observed emersion of an area: live cells over the potential
    /// footprint `members * hash_count - self_collisions`. Returns
    /// [`UNDEFINED`] for an area with no members.
    pub fn area_emersion(&self, area: u16) -> f32 {
        let counters = &self.areas[area as usize];
        if counters.members == 0 || self.config.hash_count == 0 {
            return UNDEFINED;
        }
        let potential = (counters.members * self.config.hash_count
            - counters.self_collisions) as f64;
        (counters.cells_used as f64 / potential) as f32
    }

    /// Closed-form emersion estimate: the probability that a cell of
    /// this area survives all hash rounds of higher-labeled members.
    pub fn expected_area_emersion(&self, area: u16) -> f32 {
        if self.areas[area as usize].members == 0
            || self.config.hash_count == 0
        {
            return UNDEFINED;
        }
        let nfill = self.members_above(area);
        let p = 1.0 - 1.0 / self.cell_count() as f64;
        p.powf((self.config.hash_count * nfill) as f64) as f32
    }

    /// True when no member of `area` can currently be misread as
    /// belonging to a different area.
    pub fn area_flotation(&self, area: u16) -> bool {
        let counters = &self.areas[area as usize];
        if counters.members == 0 || self.config.hash_count == 0 {
            return true;
        }
        counters.members * self.config.hash_count
            - counters.self_collisions
            - counters.cells_used
            < self.config.hash_count
    }

    /// Computes the full statistics snapshot.
    pub fn statistics(&self) -> FilterStatistics {
        let area_count = self.config.area_count as usize;
        let fpp = self.area_fpp_all();
        let a_priori_fpp = self.area_a_priori_fpp_all();
        let (isep, safep, safeness) = self.area_isep_all();
        let expected_cells = self.expected_area_cells_all();

        let mut areas = Vec::with_capacity(area_count + 1);
        // Slot 0 carries sentinels so areas index directly by label
        areas.push(AreaStatistics {
            a_priori_fpp: UNDEFINED,
            fpp: UNDEFINED,
            a_priori_isep: UNDEFINED,
            a_priori_safep: UNDEFINED,
            expected_cells: 0,
            emersion: UNDEFINED,
            expected_emersion: UNDEFINED,
            flotation: true,
        });
        for area in 1..=area_count {
            areas.push(AreaStatistics {
                a_priori_fpp: a_priori_fpp[area],
                fpp: fpp[area],
                a_priori_isep: isep[area],
                a_priori_safep: safep[area],
                expected_cells: expected_cells[area],
                emersion: self.area_emersion(area as u16),
                expected_emersion: self.expected_area_emersion(area as u16),
                flotation: self.area_flotation(area as u16),
            });
        }

        FilterStatistics {
            sparsity: self.sparsity(),
            a_priori_fpp: self.filter_a_priori_fpp(),
            fpp: self.filter_fpp(),
            safeness,
            areas,
        }
    }

    /// Members of all areas with a label strictly above `area`.
    fn members_above(&self, area: u16) -> usize {
        self.areas[area as usize + 1..]
            .iter()
            .map(|counters| counters.members)
            .sum()
    }

    /// A-posteriori per-area FPP. The occupancy of areas >= i raised
    /// to `hash_count` gives the probability of landing entirely in
    /// that region; subtracting the tail (areas > i) leaves the false
    /// positives attributable exactly to area i. Round-off can push
    /// the difference just below zero, hence the clamp.
    fn area_fpp_all(&self) -> Vec<f32> {
        let area_count = self.config.area_count as usize;
        let cells = self.cell_count() as f64;
        let hash_count = self.config.hash_count as i32;
        let mut fpp = vec![0f64; area_count + 1];

        for i in (1..=area_count).rev() {
            let occupied: usize = self.areas[i..]
                .iter()
                .map(|counters| counters.cells_used)
                .sum();
            let p = occupied as f64 / cells;
            fpp[i] = p.powi(hash_count);
            for j in i + 1..=area_count {
                fpp[i] -= fpp[j];
            }
            if fpp[i] < 0.0 {
                fpp[i] = 0.0;
            }
        }
        fpp.into_iter().map(|value| value as f32).collect()
    }

    /// A-priori counterpart of [`area_fpp_all`](Self::area_fpp_all),
    /// using member counts instead of observed cell occupancy.
    fn area_a_priori_fpp_all(&self) -> Vec<f32> {
        let area_count = self.config.area_count as usize;
        let cells = self.cell_count() as f64;
        let hash_count = self.config.hash_count;
        let mut fpp = vec![0f64; area_count + 1];

        for i in (1..=area_count).rev() {
            let nfill: usize = self.areas[i..]
                .iter()
                .map(|counters| counters.members)
                .sum();
            let p = 1.0
                - (1.0 - 1.0 / cells).powf((hash_count * nfill) as f64);
            fpp[i] = p.powi(hash_count as i32);
            for j in i + 1..=area_count {
                fpp[i] -= fpp[j];
            }
            if fpp[i] < 0.0 {
                fpp[i] = 0.0;
            }
        }
        fpp.into_iter().map(|value| value as f32).collect()
    }

    /// A-priori ISEP and safeness. For area i, the chance that every
    /// hash round of one of its members lands in a cell also touched
    /// by some higher-labeled member; safeness per area is the chance
    /// none of its members does, and the filter-wide safeness is the
    /// product over all areas.
    fn area_isep_all(&self) -> (Vec<f32>, Vec<f32>, f32) {
        let area_count = self.config.area_count as usize;
        let cells = self.cell_count() as f64;
        let hash_count = self.config.hash_count;
        let mut isep = vec![0f32; area_count + 1];
        let mut safep = vec![0f32; area_count + 1];
        let mut safeness = 1f64;

        for i in (1..=area_count).rev() {
            let nfill = self.members_above(i as u16);
            let p = 1.0
                - (1.0 - 1.0 / cells).powf((hash_count * nfill) as f64);
            let p = p.powi(hash_count as i32);

            let safe = (1.0 - p).powf(self.areas[i].members as f64);
            isep[i] = p as f32;
            safep[i] = safe as f32;
            safeness *= safe;
        }
        (isep, safep, safeness as f32)
    }

    /// Expected number of cells left holding each label: cells the
    /// area's own rounds touch, thinned by the rounds of every
    /// higher-labeled member.
    fn expected_area_cells_all(&self) -> Vec<usize> {
        let area_count = self.config.area_count as usize;
        let cells = self.cell_count() as f64;
        let hash_count = self.config.hash_count;
        let mut expected = vec![0usize; area_count + 1];

        for i in (1..=area_count).rev() {
            let own = self.areas[i].members;
            let above = self.members_above(i as u16);
            let p = 1.0 - 1.0 / cells;
            let filled = 1.0 - p.powf((hash_count * own) as f64);
            let surviving = p.powf((hash_count * above) as f64);
            expected[i] = (cells * filled * surviving) as usize;
        }
        expected
    }
}

#[cfg(test)]
mod tests {
    use crate::filter::tests::test_filter;
    use crate::stats::UNDEFINED;

    #[test]
    fn test_empty_filter_statistics() {
        let filter = test_filter(10, 3, 2);
        assert_eq!(filter.sparsity(), 1.0);
        assert_eq!(filter.filter_fpp(), 0.0);
        assert_eq!(filter.filter_a_priori_fpp(), 0.0);

        let stats = filter.statistics();
        assert_eq!(stats.safeness, 1.0);
        for area in 1..=2 {
            assert_eq!(stats.areas[area].fpp, 0.0);
            assert_eq!(stats.areas[area].a_priori_isep, 0.0);
            assert_eq!(stats.areas[area].a_priori_safep, 1.0);
            assert_eq!(stats.areas[area].expected_cells, 0);
            assert_eq!(stats.areas[area].emersion, UNDEFINED);
            assert!(stats.areas[area].flotation);
        }
    }

    #[test]
    fn test_sparsity_decreases_with_inserts() {
        let mut filter = test_filter(10, 3, 1);
        let mut last = filter.sparsity();
        for i in 0..30u32 {
            filter.insert(format!("element_{i}").as_bytes(), 1).unwrap();
            let sparsity = filter.sparsity();
            assert!(sparsity <= last);
            assert!((0.0..=1.0).contains(&sparsity));
            last = sparsity;
        }
        assert!(last < 1.0);
    }

    #[test]
    fn test_fpp_monotonically_increases() {
        let mut filter = test_filter(10, 3, 1);
        let mut last = filter.filter_fpp();
        for i in 0..30u32 {
            filter.insert(format!("element_{i}").as_bytes(), 1).unwrap();
            let fpp = filter.filter_fpp();
            assert!(fpp >= last);
            assert!((0.0..=1.0).contains(&fpp));
            last = fpp;
        }
        assert!(last > 0.0);
    }

    #[test]
    fn test_a_priori_fpp_known_value() {
        // One area, one member, k=3, 1024 cells:
        // (1 - (1 - 1/1024)^3)^3
        let mut filter = test_filter(10, 3, 1);
        filter.insert(b"alice", 1).unwrap();
        let expected =
            (1.0 - (1.0 - 1.0 / 1024.0f64).powi(3)).powi(3) as f32;
        let got = filter.filter_a_priori_fpp();
        assert!((got - expected).abs() < 1e-12);
    }

    #[test]
    fn test_single_area_fpp_matches_filter_fpp() {
        let mut filter = test_filter(10, 3, 1);
        for i in 0..20u32 {
            filter.insert(format!("element_{i}").as_bytes(), 1).unwrap();
        }
        let stats = filter.statistics();
        // With one area the recursion has no tail to subtract
        assert!((stats.areas[1].fpp - stats.fpp).abs() < 1e-6);
    }

    #[test]
    fn test_area_fpp_never_negative() {
        let mut filter = test_filter(8, 3, 4);
        for area in 1..=4u16 {
            for i in 0..15u32 {
                filter
                    .insert(format!("a{area}_e{i}").as_bytes(), area)
                    .unwrap();
            }
        }
        let stats = filter.statistics();
        for area in 1..=4 {
            assert!(stats.areas[area].fpp >= 0.0);
            assert!(stats.areas[area].a_priori_fpp >= 0.0);
        }
    }

    #[test]
    fn test_emersion_sentinel_for_empty_area() {
        let filter = test_filter(10, 3, 2);
        assert_eq!(filter.area_emersion(1), UNDEFINED);
        assert_eq!(filter.expected_area_emersion(2), UNDEFINED);
    }

    #[test]
    fn test_emersion_bounds_when_defined() {
        let mut filter = test_filter(10, 3, 2);
        filter.insert(b"alice", 1).unwrap();
        filter.insert(b"bob", 2).unwrap();
        for area in 1..=2u16 {
            let emersion = filter.area_emersion(area);
            assert!((0.0..=1.0).contains(&emersion));
            let expected = filter.expected_area_emersion(area);
            assert!((0.0..=1.0).contains(&expected));
        }
        // Highest area is never overwritten, so its expected
        // emersion is exactly 1
        assert_eq!(filter.expected_area_emersion(2), 1.0);
    }

    #[test]
    fn test_isep_grows_with_higher_area_pressure() {
        let mut filter = test_filter(8, 3, 2);
        filter.insert(b"alice", 1).unwrap();
        let before = filter.statistics().areas[1].a_priori_isep;

        for i in 0..40u32 {
            filter.insert(format!("noise_{i}").as_bytes(), 2).unwrap();
        }
        let after = filter.statistics().areas[1].a_priori_isep;
        assert!(after > before);
        // The top area has nobody above it
        assert_eq!(filter.statistics().areas[2].a_priori_isep, 0.0);
    }

    #[test]
    fn test_safeness_is_product_of_area_safep() {
        let mut filter = test_filter(8, 3, 3);
        for area in 1..=3u16 {
            for i in 0..10u32 {
                filter
                    .insert(format!("a{area}_e{i}").as_bytes(), area)
                    .unwrap();
            }
        }
        let stats = filter.statistics();
        let product: f32 = (1..=3)
            .map(|area| stats.areas[area].a_priori_safep)
            .product();
        assert!((stats.safeness - product).abs() < 1e-6);
        assert!((0.0..=1.0).contains(&stats.safeness));
    }

    #[test]
    fn test_expected_cells_bounded_by_capacity() {
        let mut filter = test_filter(8, 3, 2);
        for i in 0..40u32 {
            filter.insert(format!("e{i}").as_bytes(), 1).unwrap();
        }
        for i in 0..40u32 {
            filter.insert(format!("f{i}").as_bytes(), 2).unwrap();
        }
        let stats = filter.statistics();
        for area in 1..=2 {
            assert!(stats.areas[area].expected_cells <= filter.cell_count());
        }
        assert!(stats.areas[1].expected_cells > 0);
    }

    #[test]
    fn test_statistics_do_not_mutate_filter() {
        let mut filter = test_filter(10, 3, 2);
        filter.insert(b"alice", 1).unwrap();
        let members = filter.total_members();
        let collisions = filter.total_collisions();

        let _ = filter.statistics();
        let _ = filter.sparsity();
        let _ = filter.filter_fpp();

        assert_eq!(filter.total_members(), members);
        assert_eq!(filter.total_collisions(), collisions);
        assert_eq!(filter.check(b"alice").unwrap(), 1);
    }
}
