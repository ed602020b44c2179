//! Snapshot and rendering surface for the filter.
//!
//! A [`FilterSnapshot`] captures configuration, counters and all
//! derived statistics in one serializable value. Two textual
//! renderings mirror the historical on-disk formats: semicolon
//! `key;value` metadata rows and a raw cell dump with one decoded
//! label per line; JSON comes for free through serde.

use crate::error::Result;
use crate::filter::{AreaCounters, SpatialBloomFilter};
use crate::stats::FilterStatistics;
use serde::Serialize;
use std::io::Write;

#[derive(Clone, Debug, Serialize)]
pub struct FilterSnapshot {
    pub hash_family: u32,
    pub hash_count: usize,
    pub area_count: u16,
    pub bit_mapping: u32,
    pub cells: usize,
    pub cell_size: usize,
    pub byte_size: usize,
    pub members: usize,
    pub collisions: usize,
    /// Indexed by area label, slot 0 reserved
    pub area_counters: Vec<AreaCounters>,
    pub statistics: FilterStatistics,
}

impl SpatialBloomFilter {
    pub fn snapshot(&self) -> FilterSnapshot {
        FilterSnapshot {
            hash_family: self.config().hash_family.id(),
            hash_count: self.config().hash_count,
            area_count: self.config().area_count,
            bit_mapping: self.config().bit_mapping,
            cells: self.cell_count(),
            cell_size: self.cell_width().bytes(),
            byte_size: self.byte_size(),
            members: self.total_members(),
            collisions: self.total_collisions(),
            area_counters: self.area_counters().to_vec(),
            statistics: self.statistics(),
        }
    }

    /// Writes filter metadata as `key;value` rows, followed by one
    /// `area;members;self_collisions;cells;emersion;flotation;fpp`
    /// row per area.
    pub fn write_metadata<W: Write>(&self, writer: &mut W) -> Result<()> {
        let snapshot = self.snapshot();

        writeln!(writer, "hash_family;{}", snapshot.hash_family)?;
        writeln!(writer, "hash_number;{}", snapshot.hash_count)?;
        writeln!(writer, "area_number;{}", snapshot.area_count)?;
        writeln!(writer, "bit_mapping;{}", snapshot.bit_mapping)?;
        writeln!(writer, "cells_number;{}", snapshot.cells)?;
        writeln!(writer, "cell_size;{}", snapshot.cell_size)?;
        writeln!(writer, "byte_size;{}", snapshot.byte_size)?;
        writeln!(writer, "members;{}", snapshot.members)?;
        writeln!(writer, "collisions;{}", snapshot.collisions)?;
        writeln!(writer, "sparsity;{}", snapshot.statistics.sparsity)?;
        writeln!(writer, "fpp;{}", snapshot.statistics.fpp)?;
        writeln!(
            writer,
            "a_priori_fpp;{}",
            snapshot.statistics.a_priori_fpp
        )?;
        writeln!(writer, "safeness;{}", snapshot.statistics.safeness)?;

        for area in 1..=snapshot.area_count as usize {
            let counters = &snapshot.area_counters[area];
            let stats = &snapshot.statistics.areas[area];
            writeln!(
                writer,
                "{area};{};{};{};{};{};{}",
                counters.members,
                counters.self_collisions,
                counters.cells_used,
                stats.emersion,
                stats.flotation,
                stats.fpp
            )?;
        }
        Ok(())
    }

    /// Dumps the raw filter content, one decoded area label per line.
    pub fn write_cells<W: Write>(&self, writer: &mut W) -> Result<()> {
        for label in self.cell_labels() {
            writeln!(writer, "{label}")?;
        }
        Ok(())
    }

    /// The snapshot as a JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.snapshot())?)
    }
}

#[cfg(test)]
mod tests {
    use crate::filter::tests::test_filter;

    #[test]
    fn test_metadata_rows() {
        let mut filter = test_filter(10, 3, 2);
        filter.insert(b"alice", 1).unwrap();
        filter.insert(b"bob", 2).unwrap();

        let mut out = Vec::new();
        filter.write_metadata(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("hash_family;4"));
        assert!(text.contains("hash_number;3"));
        assert!(text.contains("area_number;2"));
        assert!(text.contains("cells_number;1024"));
        assert!(text.contains("members;2"));
        // One trailing row per area
        let area_rows: Vec<&str> = text
            .lines()
            .filter(|line| {
                line.starts_with("1;") || line.starts_with("2;")
            })
            .collect();
        assert_eq!(area_rows.len(), 2);
    }

    #[test]
    fn test_cell_dump_has_one_label_per_cell() {
        let mut filter = test_filter(8, 3, 2);
        filter.insert(b"alice", 1).unwrap();

        let mut out = Vec::new();
        filter.write_cells(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        let labels: Vec<u16> = text
            .lines()
            .map(|line| line.parse().unwrap())
            .collect();
        assert_eq!(labels.len(), 256);
        assert!(labels.iter().all(|&label| label <= 2));
        assert!(labels.iter().any(|&label| label == 1));
    }

    #[test]
    fn test_json_snapshot_round_trips_fields() {
        let mut filter = test_filter(10, 3, 2);
        filter.insert(b"alice", 1).unwrap();

        let json = filter.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["bit_mapping"], 10);
        assert_eq!(value["cells"], 1024);
        assert_eq!(value["members"], 1);
        assert_eq!(
            value["statistics"]["areas"].as_array().unwrap().len(),
            3
        );
    }
}
