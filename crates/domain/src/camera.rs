//! Security cameras and snapshots.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::SnapshotId;
use crate::time::{Timestamp, now};

/// Places a camera is mounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CameraLocation {
    FrontDoor,
    Backyard,
    LivingRoom,
    Garage,
}

impl CameraLocation {
    pub const ALL: [Self; 4] = [
        Self::FrontDoor,
        Self::Backyard,
        Self::LivingRoom,
        Self::Garage,
    ];

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::FrontDoor => "Front Door",
            Self::Backyard => "Backyard",
            Self::LivingRoom => "Living Room",
            Self::Garage => "Garage",
        }
    }
}

impl fmt::Display for CameraLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A still captured from one camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: SnapshotId,
    pub timestamp: Timestamp,
    pub location: CameraLocation,
}

impl Snapshot {
    #[must_use]
    pub fn capture(location: CameraLocation) -> Self {
        Self {
            id: SnapshotId::new(),
            timestamp: now(),
            location,
        }
    }
}
