//! Placement negotiation for new batch canvases
//!
//! New canvases continue a "swimlane": a row of canvases that grows to the
//! right. The negotiator looks for the latest canvas created by this tool
//! (optionally only the current user's) and asks the service for free space
//! to the right of it. Without such a canvas it starts a new swimlane by
//! searching downward from the origin, leaving a gap above the new lane so
//! lanes stay visually apart.

use serde::{Deserialize, Serialize};

use crate::error::RemoteError;
use crate::layout::{BoundingBox, Point};
use crate::remote::{CanvasId, CanvasRecord, CanvasService, PlacementRequest};

/// Vertical gap left above a newly started swimlane
pub const SWIMLANE_PADDING: i64 = 1500;

/// Search direction for free space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Right,
    Down,
}

/// Which prior canvases a new canvas lines up with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwimlaneStrategy {
    /// Continue after the latest canvas made by anyone with this tool
    #[default]
    Shared,
    /// Continue after the latest canvas made by the current user
    PerUser,
}

/// Why no reference canvas could be used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Absence {
    NoCanvases,
    NoTaggedCanvases,
    NoUserCanvases,
    /// The latest candidate has no identifier
    MissingIdentifier,
    /// The latest candidate has no position
    MissingTransform,
}

impl Absence {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::NoCanvases => "no canvas found",
            Self::NoTaggedCanvases => "no canvas created by this tool found",
            Self::NoUserCanvases => "no canvas created by this user found",
            Self::MissingIdentifier => "latest canvas has no identifier",
            Self::MissingTransform => "latest canvas has no position",
        }
    }

    /// Absences caused by incomplete records rather than an empty workspace
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MissingIdentifier | Self::MissingTransform)
    }
}

/// Outcome of looking for the canvas to continue from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceCanvas {
    Found { id: CanvasId, origin: Point },
    Absent(Absence),
}

/// Final placement of a new canvas
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub target: BoundingBox,
    pub direction: Direction,
    pub reference: ReferenceCanvas,
}

/// Decides where a new canvas goes in the workspace
#[derive(Debug, Clone)]
pub struct PlacementNegotiator {
    strategy: SwimlaneStrategy,
    user_id: String,
    swimlane_padding: i64,
}

impl PlacementNegotiator {
    pub fn new(strategy: SwimlaneStrategy, user_id: impl Into<String>) -> Self {
        Self {
            strategy,
            user_id: user_id.into(),
            swimlane_padding: SWIMLANE_PADDING,
        }
    }

    /// Set the gap left above a new swimlane
    pub fn with_swimlane_padding(mut self, padding: i64) -> Self {
        self.swimlane_padding = padding;
        self
    }

    /// Pick the canvas a new canvas should continue from
    ///
    /// Among the candidates the one with the greatest identifier is the
    /// latest (see [`CanvasId`] for the order); a record without an
    /// identifier sorts below every record that has one.
    pub fn select_reference(&self, records: &[CanvasRecord]) -> ReferenceCanvas {
        if records.is_empty() {
            return ReferenceCanvas::Absent(Absence::NoCanvases);
        }

        let tagged: Vec<&CanvasRecord> = records.iter().filter(|r| r.is_tagged()).collect();
        if tagged.is_empty() {
            return ReferenceCanvas::Absent(Absence::NoTaggedCanvases);
        }

        let candidates: Vec<&CanvasRecord> = match self.strategy {
            SwimlaneStrategy::Shared => tagged,
            SwimlaneStrategy::PerUser => tagged
                .into_iter()
                .filter(|r| r.user_id() == Some(self.user_id.as_str()))
                .collect(),
        };

        let Some(latest) = candidates.into_iter().max_by(|a, b| a.id.cmp(&b.id)) else {
            return ReferenceCanvas::Absent(Absence::NoUserCanvases);
        };

        match (&latest.id, latest.transform) {
            (None, _) => ReferenceCanvas::Absent(Absence::MissingIdentifier),
            (Some(_), None) => ReferenceCanvas::Absent(Absence::MissingTransform),
            (Some(id), Some(origin)) => ReferenceCanvas::Found {
                id: id.clone(),
                origin,
            },
        }
    }

    /// Find the final bounding box for a canvas of the desired size
    ///
    /// Errors from the service, including an expired authorization, are
    /// returned unchanged and nothing is retried.
    pub fn negotiate<S>(
        &self,
        service: &mut S,
        desired: BoundingBox,
    ) -> Result<Placement, RemoteError>
    where
        S: CanvasService + ?Sized,
    {
        let records = service.list_tagged_canvases()?;
        let reference = self.select_reference(&records);

        let (proposed, direction) = match &reference {
            ReferenceCanvas::Found { id, origin } => {
                log::info!("existing canvas {} found, going right from there", id);
                (desired.moved_to(origin.x, origin.y), Direction::Right)
            }
            ReferenceCanvas::Absent(absence) => {
                if absence.is_malformed() {
                    log::warn!("{}, going down from origin", absence.describe());
                } else {
                    log::info!("{}, going down from origin", absence.describe());
                }
                (desired.moved_to(0, 0), Direction::Down)
            }
        };

        let mut target = service.find_free_area(&PlacementRequest::new(proposed, direction))?;

        if direction == Direction::Down && target.y != 0 {
            // The origin was taken; leave a gap above the new swimlane
            log::info!(
                "adjusting canvas location by {} to pad the swimlane",
                self.swimlane_padding
            );
            let padded = target.translated(0, self.swimlane_padding);
            target = service.find_free_area(&PlacementRequest::new(padded, direction))?;
        }

        log::info!("target canvas location found: {:?}", target);
        Ok(Placement {
            target,
            direction,
            reference,
        })
    }
}
