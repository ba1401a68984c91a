//! Keeps a map viewport in step with the eligible incidents and the selection.

use crate::model::Coordinates;
use crate::view::MapIncident;

/// Zoom used when focusing a single incident.
pub const FOCUS_ZOOM: u8 = 14;

/// Pixel padding applied when fitting all incidents.
pub const FIT_PADDING: (u32, u32) = (40, 40);

/// Axis-aligned region spanned by a set of points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub south_west: Coordinates,
    pub north_east: Coordinates,
}

impl Bounds {
    /// Smallest region containing every point, or `None` for no points.
    pub fn covering<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Coordinates>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut bounds = Bounds {
            south_west: first,
            north_east: first,
        };
        for p in points {
            bounds.south_west.lat = bounds.south_west.lat.min(p.lat);
            bounds.south_west.lng = bounds.south_west.lng.min(p.lng);
            bounds.north_east.lat = bounds.north_east.lat.max(p.lat);
            bounds.north_east.lng = bounds.north_east.lng.max(p.lng);
        }
        Some(bounds)
    }

    pub fn center(&self) -> Coordinates {
        Coordinates::new(
            (self.south_west.lat + self.north_east.lat) / 2.0,
            (self.south_west.lng + self.north_east.lng) / 2.0,
        )
    }
}

/// Instruction for the map renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewportCommand {
    SetView {
        center: Coordinates,
        zoom: u8,
        animate: bool,
    },
    FitBounds {
        bounds: Bounds,
        padding: (u32, u32),
    },
}

/// Viewport for the given eligible set and selection.
///
/// A selected id that is not in the eligible set falls back to fitting all.
pub fn viewport_for(eligible: &[MapIncident], selected: Option<&str>) -> Option<ViewportCommand> {
    if eligible.is_empty() {
        return None;
    }

    let target = selected.and_then(|id| eligible.iter().find(|m| m.incident.id == id));
    if let Some(target) = target {
        return Some(ViewportCommand::SetView {
            center: target.position,
            zoom: FOCUS_ZOOM,
            animate: true,
        });
    }

    Bounds::covering(eligible.iter().map(|m| m.position)).map(|bounds| ViewportCommand::FitBounds {
        bounds,
        padding: FIT_PADDING,
    })
}

/// Emits a viewport command only when the inputs produce a different one.
#[derive(Debug, Default)]
pub struct MapSync {
    last: Option<ViewportCommand>,
}

impl MapSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute the viewport; `None` when there is nothing new to do.
    pub fn sync(&mut self, eligible: &[MapIncident], selected: Option<&str>) -> Option<ViewportCommand> {
        let next = viewport_for(eligible, selected)?;
        if self.last == Some(next) {
            return None;
        }
        self.last = Some(next);
        Some(next)
    }

    pub fn last(&self) -> Option<ViewportCommand> {
        self.last
    }
}
