//! Editor configuration.

use crate::grid::DEFAULT_CELL_SIZE;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Name given to the built-in watermark image.
pub const WATERMARK_NAME: &str = "watermark";

/// Keyboard modifier conventions of the host platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Platform {
    Mac,
    #[default]
    Windows,
}

impl Platform {
    /// Platform of the running binary. Anything that is not macOS uses the
    /// Windows conventions.
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::Mac
        } else {
            Platform::Windows
        }
    }
}

/// Tunables for a [`Canvas`](crate::Canvas).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Initial grid cell size in world units. The canvas' viewport owns the
    /// live value.
    pub cell_size: f64,
    /// Smallest zoom factor.
    pub min_scale: f64,
    /// Largest zoom factor.
    pub max_scale: f64,
    /// Zoom factor per wheel notch when zooming in.
    pub zoom_in_step: f64,
    /// Zoom factor per wheel notch when zooming out.
    pub zoom_out_step: f64,
    /// Right-button travel (screen pixels) before a press becomes a pan.
    pub pan_move_threshold: f64,
    /// Longest right-button press still treated as a click.
    pub click_duration: Duration,
    /// Hit tolerance for selection, in screen pixels.
    pub hit_tolerance: f64,
    /// Display size of the dropped watermark.
    pub watermark_size: f64,
    /// Node name whose presence enables export.
    pub export_node_name: String,
    /// Capacity of the memoized search cache.
    pub search_cache_capacity: usize,
    /// Search results per page.
    pub search_page_size: usize,
    /// Modifier conventions.
    pub platform: Platform,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
            min_scale: 0.1,
            max_scale: 10.0,
            zoom_in_step: 1.1,
            zoom_out_step: 0.9,
            pan_move_threshold: 5.0,
            click_duration: Duration::from_millis(200),
            hit_tolerance: 4.0,
            watermark_size: 150.0,
            export_node_name: WATERMARK_NAME.to_string(),
            search_cache_capacity: 800,
            search_page_size: 20,
            platform: Platform::current(),
        }
    }
}
