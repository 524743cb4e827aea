// Compositor layout planning
//
// A planner turns (source count, canvas size) into one placement per source,
// in source index order. Placements never depend on stream arrival order.
// `apply_layout` then reserves the compositor inputs and positions them.

use gstreamer as gst;
use gstreamer::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

use super::elements::property_value;

/// Output canvas size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

/// Where one source lands on the canvas and the size it is scaled to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub xpos: i32,
    pub ypos: i32,
    pub width: u32,
    pub height: u32,
}

/// Computes placements for N inputs on a canvas
pub trait LayoutPlanner: Send + Sync {
    /// Maximum number of inputs this layout can place
    fn capacity(&self) -> usize;

    /// One placement per source, in source index order
    fn plan(&self, count: usize, canvas: Canvas) -> Result<Vec<Placement>>;
}

/// Selectable layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    /// Two half-size tiles on top, one centered below
    Triptych,
    /// Row-major mosaic of equally sized tiles
    Grid,
}

impl LayoutKind {
    pub fn planner(&self) -> Box<dyn LayoutPlanner> {
        match self {
            LayoutKind::Triptych => Box::new(Triptych),
            LayoutKind::Grid => Box::new(Grid),
        }
    }
}

fn check_count(planner: &dyn LayoutPlanner, count: usize) -> Result<()> {
    if count == 0 {
        return Err(PipelineError::Layout("no inputs to place".into()));
    }
    if count > planner.capacity() {
        return Err(PipelineError::Layout(format!(
            "{} inputs requested but the layout only fits {}",
            count,
            planner.capacity()
        )));
    }
    Ok(())
}

/// Three half-size tiles: top-left, top-right and bottom-center
pub struct Triptych;

impl LayoutPlanner for Triptych {
    fn capacity(&self) -> usize {
        3
    }

    fn plan(&self, count: usize, canvas: Canvas) -> Result<Vec<Placement>> {
        check_count(self, count)?;

        let width = canvas.width / 2;
        let height = canvas.height / 2;
        let origins = [
            (0, 0),
            (canvas.width / 2, 0),
            (canvas.width / 4, canvas.height / 2),
        ];

        Ok(origins
            .iter()
            .take(count)
            .map(|&(x, y)| Placement {
                xpos: x as i32,
                ypos: y as i32,
                width,
                height,
            })
            .collect())
    }
}

/// Square-ish grid, filled row by row
pub struct Grid;

impl Grid {
    /// (columns, rows) for `count` tiles
    pub fn dimensions(count: usize) -> (usize, usize) {
        let mut cols = 1;
        while cols * cols < count {
            cols += 1;
        }
        let rows = count.div_ceil(cols);
        (cols, rows)
    }
}

impl LayoutPlanner for Grid {
    fn capacity(&self) -> usize {
        9
    }

    fn plan(&self, count: usize, canvas: Canvas) -> Result<Vec<Placement>> {
        check_count(self, count)?;

        let (cols, rows) = Self::dimensions(count);
        let width = canvas.width / cols as u32;
        let height = canvas.height / rows as u32;

        Ok((0..count)
            .map(|i| Placement {
                xpos: ((i % cols) as u32 * width) as i32,
                ypos: ((i / cols) as u32 * height) as i32,
                width,
                height,
            })
            .collect())
    }
}

/// Reserve one compositor input per placement and position it.
///
/// Pads are requested in source index order, so `result[i]` belongs to
/// source `i`. Failing to obtain any pad is fatal.
pub fn apply_layout(
    compositor: &gst::Element,
    placements: &[Placement],
    background: &str,
) -> Result<Vec<gst::Pad>> {
    let mut pads = Vec::with_capacity(placements.len());

    for (index, placement) in placements.iter().enumerate() {
        let pad = compositor.request_pad_simple("sink_%u").ok_or_else(|| {
            PipelineError::Layout(format!(
                "failed to get pad {} from {}",
                index,
                compositor.name()
            ))
        })?;
        log::info!("Requested pad from {}: {}", compositor.name(), pad.name());

        pad.set_property("xpos", placement.xpos);
        pad.set_property("ypos", placement.ypos);
        pads.push(pad);
    }

    if compositor.find_property("background").is_some() {
        let value = property_value(compositor, "background", background)
            .map_err(PipelineError::Layout)?;
        compositor.set_property_from_value("background", &value);
    } else {
        log::warn!("{} has no background property, leaving default", compositor.name());
    }

    Ok(pads)
}
