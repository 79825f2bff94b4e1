// SPDX-License-Identifier: MPL-2.0

//! Live telemetry shared between the location provider and the overlay
//!
//! The provider writes whole snapshots; readers always receive a full copy,
//! so fields from two different updates are never mixed.

use chrono::{DateTime, Local};
use std::sync::{Arc, PoisonError, RwLock};

/// One consistent reading of speed and position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetrySnapshot {
    pub speed_kmh: f64,
    pub latitude: f64,
    pub longitude: f64,
    /// Meters above sea level
    pub altitude: f64,
    pub captured_at: DateTime<Local>,
}

impl Default for TelemetrySnapshot {
    fn default() -> Self {
        Self {
            speed_kmh: 0.0,
            latitude: 0.0,
            longitude: 0.0,
            altitude: 0.0,
            captured_at: Local::now(),
        }
    }
}

impl TelemetrySnapshot {
    /// Build from a location fix reporting speed in m/s
    ///
    /// Location services report a negative speed when it is unknown; that
    /// reads as standing still.
    pub fn from_location(speed_mps: f64, latitude: f64, longitude: f64, altitude: f64) -> Self {
        let speed_mps = if speed_mps.is_finite() { speed_mps.max(0.0) } else { 0.0 };
        Self {
            speed_kmh: speed_mps * 3.6,
            latitude,
            longitude,
            altitude,
            captured_at: Local::now(),
        }
    }

    /// "35.6812 139.7671 40m"
    pub fn position_text(&self) -> String {
        format!(
            "{:.4} {:.4} {:.0}m",
            self.latitude, self.longitude, self.altitude
        )
    }

    /// "42 km/h"
    pub fn speed_text(&self) -> String {
        format!("{:.0} km/h", self.speed_kmh)
    }
}

/// Cloneable handle to the live snapshot
#[derive(Debug, Clone, Default)]
pub struct TelemetryHandle(Arc<RwLock<TelemetrySnapshot>>);

impl TelemetryHandle {
    pub fn new(initial: TelemetrySnapshot) -> Self {
        Self(Arc::new(RwLock::new(initial)))
    }

    /// Replace the current reading
    pub fn update(&self, snapshot: TelemetrySnapshot) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = snapshot;
    }

    /// Copy of the current reading
    pub fn snapshot(&self) -> TelemetrySnapshot {
        *self.0.read().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_conversion() {
        let snapshot = TelemetrySnapshot::from_location(10.0, 0.0, 0.0, 0.0);
        assert!((snapshot.speed_kmh - 36.0).abs() < 1e-9);
    }

    #[test]
    fn test_negative_speed_is_zero() {
        let snapshot = TelemetrySnapshot::from_location(-1.0, 0.0, 0.0, 0.0);
        assert_eq!(snapshot.speed_kmh, 0.0);
        let snapshot = TelemetrySnapshot::from_location(f64::NAN, 0.0, 0.0, 0.0);
        assert_eq!(snapshot.speed_kmh, 0.0);
    }

    #[test]
    fn test_text_formats() {
        let snapshot = TelemetrySnapshot {
            speed_kmh: 41.6,
            latitude: 35.681236,
            longitude: 139.767125,
            altitude: 40.4,
            captured_at: Local::now(),
        };
        assert_eq!(snapshot.position_text(), "35.6812 139.7671 40m");
        assert_eq!(snapshot.speed_text(), "42 km/h");
    }

    #[test]
    fn test_handle_shares_updates() {
        let handle = TelemetryHandle::default();
        let reader = handle.clone();
        handle.update(TelemetrySnapshot::from_location(5.0, 1.0, 2.0, 3.0));
        assert_eq!(reader.snapshot().latitude, 1.0);
        assert!((reader.snapshot().speed_kmh - 18.0).abs() < 1e-9);
    }
}
