//! PlSeries: per-bar PL time series produced by a session.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One point of the PL series: the ledger's current PL after a bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlPoint {
    pub timestamp: NaiveDateTime,
    pub current_pl: f64,
}

/// Ordered PL series with one point per input bar, in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlSeries {
    points: Vec<PlPoint>,
}

impl PlSeries {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, point: PlPoint) {
        self.points.push(point);
    }

    pub fn points(&self) -> &[PlPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// PL values alone, for metric functions.
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.current_pl).collect()
    }

    pub fn last(&self) -> Option<&PlPoint> {
        self.points.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PlPoint> {
        self.points.iter()
    }
}

impl<'a> IntoIterator for &'a PlSeries {
    type Item = &'a PlPoint;
    type IntoIter = std::slice::Iter<'a, PlPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
