use crate::internals::DEGREE_BUCKETS;
use crate::types::ScanSample;
use log::trace;

/// Per-degree range map fed by decoded scan packets.
///
/// `distances` and `intensities` are the public tables. `best` is scratch
/// state holding the smallest distance accepted per bucket since the last
/// [`DegreeTable::begin_packet`]; zero there means "empty", which also makes
/// a genuine zero-distance sample replaceable by the next one.
///
/// Entries persist across packets until overwritten, so the public tables
/// always hold the latest per-packet minimum for every bucket touched.
#[derive(Debug, Clone, PartialEq)]
pub struct DegreeTable {
    distances: [u16; DEGREE_BUCKETS],
    intensities: [u16; DEGREE_BUCKETS],
    best: [u16; DEGREE_BUCKETS],
}

impl DegreeTable {
    pub fn new() -> DegreeTable {
        DegreeTable {
            distances: [0; DEGREE_BUCKETS],
            intensities: [0; DEGREE_BUCKETS],
            best: [0; DEGREE_BUCKETS],
        }
    }

    /// Clears all three tables.
    pub fn reset(&mut self) {
        self.distances = [0; DEGREE_BUCKETS];
        self.intensities = [0; DEGREE_BUCKETS];
        self.best = [0; DEGREE_BUCKETS];
    }

    /// Clears the scratch table; called at the start of every packet.
    pub fn begin_packet(&mut self) {
        self.best = [0; DEGREE_BUCKETS];
    }

    /// Folds a sample into its bucket. Returns `true` if it was accepted.
    ///
    /// A sample is accepted when the bucket is empty in this packet or its
    /// distance is strictly below the current minimum, so among equal
    /// distances the first one wins.
    pub fn apply(&mut self, sample: &ScanSample) -> bool {
        let bucket = sample.degree_bucket();
        let best = self.best[bucket];
        if best != 0 && sample.distance >= best {
            return false;
        }

        trace!(
            "Bucket {} <- distance {} intensity {} (angle {:.2})",
            bucket,
            sample.distance,
            sample.intensity,
            sample.angle
        );
        self.best[bucket] = sample.distance;
        self.distances[bucket] = sample.distance;
        self.intensities[bucket] = sample.intensity;
        true
    }

    /// Distance table, indexed by bucket.
    pub fn distances(&self) -> &[u16; DEGREE_BUCKETS] {
        &self.distances
    }

    /// Intensity table, indexed by bucket.
    pub fn intensities(&self) -> &[u16; DEGREE_BUCKETS] {
        &self.intensities
    }

    /// Distance stored in `bucket`, or `None` past the end of the table.
    pub fn distance(&self, bucket: usize) -> Option<u16> {
        self.distances.get(bucket).copied()
    }

    /// Intensity stored in `bucket`, or `None` past the end of the table.
    pub fn intensity(&self, bucket: usize) -> Option<u16> {
        self.intensities.get(bucket).copied()
    }

    /// Iterates over `(bucket, distance, intensity)` for every non-zero distance.
    pub fn points(&self) -> impl Iterator<Item = (usize, u16, u16)> + '_ {
        self.distances
            .iter()
            .zip(self.intensities.iter())
            .enumerate()
            .filter(|(_, (distance, _))| **distance != 0)
            .map(|(bucket, (&distance, &intensity))| (bucket, distance, intensity))
    }
}

impl Default for DegreeTable {
    fn default() -> Self {
        Self::new()
    }
}
