//! Tracer history for the output joint

use std::collections::VecDeque;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::consts::TRACER_CAPACITY;

/// A recorded position of the traced point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TracerPoint {
    /// Simulation time of the sample (seconds)
    pub time: f64,
    pub pos: DVec2,
}

/// Time-ordered path, oldest first. Bounded: the oldest sample is dropped
/// once `capacity` is reached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TracerHistory {
    points: VecDeque<TracerPoint>,
    capacity: usize,
}

impl Default for TracerHistory {
    fn default() -> Self {
        Self::new(TRACER_CAPACITY)
    }
}

impl TracerHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity.min(TRACER_CAPACITY)),
            capacity,
        }
    }

    /// Record a sample (call once per committed tick)
    pub fn record(&mut self, time: f64, pos: DVec2) {
        // Deserialized histories may carry a zero or shrunken capacity
        while self.points.len() >= self.capacity.max(1) {
            self.points.pop_front();
        }
        self.points.push_back(TracerPoint { time, pos });
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity.max(1)
    }

    pub fn latest(&self) -> Option<&TracerPoint> {
        self.points.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TracerPoint> {
        self.points.iter()
    }

    /// Positions only, oldest first
    pub fn path(&self) -> Vec<DVec2> {
        self.points.iter().map(|p| p.pos).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_in_order() {
        let mut tracer = TracerHistory::new(8);
        for i in 0..5 {
            tracer.record(i as f64, DVec2::new(i as f64, 0.0));
        }
        let path = tracer.path();
        assert_eq!(path.len(), 5);
        assert!(path.windows(2).all(|w| w[0].x < w[1].x));
        assert_eq!(tracer.latest().map(|p| p.time), Some(4.0));
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut tracer = TracerHistory::new(3);
        for i in 0..5 {
            tracer.record(i as f64, DVec2::splat(i as f64));
        }
        assert_eq!(tracer.len(), 3);
        let times: Vec<f64> = tracer.iter().map(|p| p.time).collect();
        assert_eq!(times, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_deserialized_capacity_is_bounded() {
        let mut tracer: TracerHistory =
            serde_json::from_str(r#"{ "points": [], "capacity": 0 }"#).unwrap();
        for i in 0..5 {
            tracer.record(i as f64, DVec2::ZERO);
        }
        assert_eq!(tracer.len(), 1);
        assert_eq!(tracer.capacity(), 1);

        let mut shrunk: TracerHistory = serde_json::from_str(
            r#"{ "points": [{"time":0.0,"pos":[0.0,0.0]},{"time":1.0,"pos":[1.0,0.0]},{"time":2.0,"pos":[2.0,0.0]}], "capacity": 2 }"#,
        )
        .unwrap();
        shrunk.record(3.0, DVec2::ONE);
        let times: Vec<f64> = shrunk.iter().map(|p| p.time).collect();
        assert_eq!(times, vec![2.0, 3.0]);
    }

    #[test]
    fn test_clear() {
        let mut tracer = TracerHistory::default();
        tracer.record(0.0, DVec2::ONE);
        tracer.clear();
        assert!(tracer.is_empty());
        assert_eq!(tracer.capacity(), TRACER_CAPACITY);
    }
}
