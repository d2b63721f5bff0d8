//! Device capabilities consumed by the form controller.

use async_trait::async_trait;

use crate::error::ClientResult;

/// A latitude/longitude fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Outcome of a foreground location permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

/// Device positioning service.
#[async_trait]
pub trait Positioning: Send + Sync {
    /// Asks the user for foreground location access.
    async fn request_permission(&self) -> Permission;

    /// Reads the current position. Only called after a grant.
    ///
    /// # Errors
    /// `PositionUnavailable` when no fix can be obtained.
    async fn current_position(&self) -> ClientResult<Coordinates>;
}

/// Positioning that always grants and reports one fixed point.
///
/// Used where the coordinates come from the user (e.g., command-line flags)
/// rather than a GPS receiver.
#[derive(Debug, Clone, Copy)]
pub struct FixedPositioning {
    coordinates: Coordinates,
}

impl FixedPositioning {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            coordinates: Coordinates {
                latitude,
                longitude,
            },
        }
    }
}

#[async_trait]
impl Positioning for FixedPositioning {
    async fn request_permission(&self) -> Permission {
        Permission::Granted
    }

    async fn current_position(&self) -> ClientResult<Coordinates> {
        Ok(self.coordinates)
    }
}
