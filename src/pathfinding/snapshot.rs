//! Bit-exact graph persistence.
//!
//! Lockstep peers exchange navigation graphs as snapshots: zlib-compressed
//! bincode of raw fixed-point values. Restoring a snapshot rebuilds the
//! neighbour lists from the segment table, so a restored graph answers
//! every query exactly like the one it was taken from.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use super::graph::AStar2D;
use super::types::{direction, insert_sorted, AStarError, PointId};
use crate::fixed_math::{Fixed, FixedVec2};

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot encoding failed: {0}")]
    Encoding(#[from] bincode::Error),
    #[error("unsupported snapshot version {found}, expected {expected}")]
    Version { found: u32, expected: u32 },
    #[error("snapshot describes an invalid graph: {0}")]
    Graph(#[from] AStarError),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointRecord {
    pub id: PointId,
    pub position: FixedVec2,
    pub weight_scale: Fixed,
    pub enabled: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentRecord {
    pub u: PointId,
    pub v: PointId,
    pub direction: u8,
}

/// Serializable state of an [`AStar2D`]. Points are sorted by id and
/// segments by `(u, v)`, so equal graphs give equal bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub version: u32,
    pub last_free_id: PointId,
    pub points: Vec<PointRecord>,
    pub segments: Vec<SegmentRecord>,
}

impl GraphSnapshot {
    pub fn encode(&self) -> Result<Vec<u8>, SnapshotError> {
        let mut bytes = Vec::new();
        self.write_to(&mut bytes)?;
        Ok(bytes)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, SnapshotError> {
        Self::read_from(bytes)
    }

    fn write_to(&self, writer: impl Write) -> Result<(), SnapshotError> {
        let mut encoder = ZlibEncoder::new(writer, Compression::default());
        bincode::serialize_into(&mut encoder, self)?;
        encoder.finish()?.flush()?;
        Ok(())
    }

    fn read_from(reader: impl Read) -> Result<Self, SnapshotError> {
        let mut decoder = ZlibDecoder::new(reader);
        Ok(bincode::deserialize_from(&mut decoder)?)
    }
}

impl AStar2D {
    pub fn snapshot(&self) -> GraphSnapshot {
        let points = self
            .get_points()
            .into_iter()
            .filter_map(|id| self.point(id).ok())
            .map(|p| PointRecord {
                id: p.id,
                position: p.position,
                weight_scale: p.weight_scale,
                enabled: p.enabled,
            })
            .collect();

        let segments = self
            .segments
            .iter()
            .map(|(&(u, v), &direction)| SegmentRecord { u, v, direction })
            .collect();

        GraphSnapshot {
            version: SNAPSHOT_VERSION,
            last_free_id: self.last_free_id,
            points,
            segments,
        }
    }

    /// Rebuild a graph with default cost strategies from `snapshot`.
    pub fn from_snapshot(snapshot: &GraphSnapshot) -> Result<Self, SnapshotError> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::Version {
                found: snapshot.version,
                expected: SNAPSHOT_VERSION,
            });
        }

        let mut graph = AStar2D::new();
        graph.slots.reserve_exact(snapshot.points.len());
        for record in &snapshot.points {
            graph.add_point(record.id, record.position, record.weight_scale)?;
            graph.set_point_disabled(record.id, !record.enabled)?;
        }

        for segment in &snapshot.segments {
            let SegmentRecord { u, v, direction: dir } = *segment;
            let invalid = u >= v || dir == direction::NONE || dir > direction::BIDIRECTIONAL;
            if invalid {
                return Err(AStarError::InvalidSegment { u, v, direction: dir }.into());
            }

            if dir & direction::FORWARD != 0 {
                insert_sorted(&mut graph.point_mut(u)?.neighbours, v);
                if dir & direction::BACKWARD == 0 {
                    insert_sorted(&mut graph.point_mut(v)?.unlinked_neighbours, u);
                }
            }
            if dir & direction::BACKWARD != 0 {
                insert_sorted(&mut graph.point_mut(v)?.neighbours, u);
                if dir & direction::FORWARD == 0 {
                    insert_sorted(&mut graph.point_mut(u)?.unlinked_neighbours, v);
                }
            }
            graph.segments.insert((u, v), dir);
        }

        graph.last_free_id = snapshot.last_free_id;
        Ok(graph)
    }

    pub fn save_snapshot(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        let snapshot = self.snapshot();
        let writer = BufWriter::new(File::create(path)?);
        snapshot.write_to(writer)?;
        info!(
            "Saved navigation graph ({} points, {} segments) to {}",
            snapshot.points.len(),
            snapshot.segments.len(),
            path.display()
        );
        Ok(())
    }

    pub fn load_snapshot(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let snapshot = GraphSnapshot::read_from(reader)?;
        let graph = AStar2D::from_snapshot(&snapshot)?;
        info!(
            "Loaded navigation graph ({} points) from {}",
            graph.get_point_count(),
            path.display()
        );
        Ok(graph)
    }
}
