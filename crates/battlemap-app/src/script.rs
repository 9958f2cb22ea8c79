//! Replay scripts: a JSON list of editor inputs applied to a [`Canvas`].

use battlemap_core::loads::LoadResult;
use battlemap_core::{
    Canvas, KeyEvent, LoadError, LoadTicket, LoadedImage, Modifiers, MouseButton, PointerEvent,
    ToolKind, UiRequest,
};
use battlemap_render::RendererError;
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors while loading or replaying a script.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid script: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Step {step}: {source}")]
    Load { step: usize, source: LoadError },
    #[error("Render error: {0}")]
    Render(#[from] RendererError),
}

pub type ScriptResult<T> = Result<T, ScriptError>;

/// One scripted input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScriptStep {
    Resize { width: f64, height: f64 },
    SelectTool { tool: ToolKind },
    DeselectTool,
    Pointer { event: PointerEvent },
    Key { event: KeyEvent },
    /// Left-button drag through `points`, in screen coordinates.
    Drag {
        points: Vec<Point>,
        #[serde(default)]
        shift: bool,
    },
    /// Left click at a screen point.
    Click {
        x: f64,
        y: f64,
        #[serde(default)]
        shift: bool,
    },
    Wheel { x: f64, y: f64, delta: f64 },
    Undo,
    Redo,
    ToggleGrid,
    DropWatermark { x: f64, y: f64 },
    /// Drop a `.webp` file; the `.png` beside it is loaded.
    DropImage { path: PathBuf, x: f64, y: f64 },
    /// Commit new content for the text open in the inline editor.
    EditText { content: String },
    /// Pick "Add text" from the context menu opened at a screen point.
    ContextAddText { x: f64, y: f64 },
    Idle,
}

/// A replay script.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    /// Answer to new map confirmations.
    #[serde(default)]
    pub confirm_new_map: bool,
    /// Families that fail to load when text is placed.
    #[serde(default)]
    pub unavailable_fonts: Vec<String>,
    pub steps: Vec<ScriptStep>,
}

impl Script {
    pub fn from_json(json: &str) -> ScriptResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> ScriptResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| ScriptError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Apply every step in order, answering UI requests after each one.
    ///
    /// A failed image drop stops the replay. A font that fails to load only
    /// abandons its text.
    pub fn apply(&self, canvas: &mut Canvas) -> ScriptResult<()> {
        for (index, step) in self.steps.iter().enumerate() {
            log::debug!("Step {}: {:?}", index, step);
            self.apply_step(canvas, step)
                .map_err(|source| ScriptError::Load {
                    step: index,
                    source,
                })?;
            self.answer_requests(canvas);
        }
        Ok(())
    }

    fn apply_step(&self, canvas: &mut Canvas, step: &ScriptStep) -> LoadResult<()> {
        match step {
            ScriptStep::Resize { width, height } => canvas.resize(*width, *height),
            ScriptStep::SelectTool { tool } => {
                canvas.select_tool(*tool);
            }
            ScriptStep::DeselectTool => canvas.deselect_tool(),
            ScriptStep::Pointer { event } => canvas.handle_pointer(event.clone()),
            ScriptStep::Key { event } => {
                canvas.handle_key(event.clone());
            }
            ScriptStep::Drag { points, shift } => drag(canvas, points, *shift),
            ScriptStep::Click { x, y, shift } => {
                drag(canvas, &[Point::new(*x, *y)], *shift);
            }
            ScriptStep::Wheel { x, y, delta } => canvas.handle_pointer(PointerEvent::Scroll {
                position: Point::new(*x, *y),
                delta: Vec2::new(0.0, *delta),
            }),
            ScriptStep::Undo => {
                canvas.undo();
            }
            ScriptStep::Redo => {
                canvas.redo();
            }
            ScriptStep::ToggleGrid => {
                canvas.toggle_grid();
            }
            ScriptStep::DropWatermark { x, y } => {
                canvas.drop_watermark(Point::new(*x, *y), None);
            }
            ScriptStep::DropImage { path, x, y } => {
                let ticket = canvas.drop_image_url(&path.to_string_lossy(), Point::new(*x, *y))?;
                let result = fetch_image(canvas, ticket);
                canvas.complete_image_load(ticket, result)?;
            }
            ScriptStep::EditText { content } => match canvas.editing_text() {
                Some(id) => {
                    canvas.commit_text_edit(id, content.as_str());
                }
                None => log::warn!("No text is open for editing"),
            },
            ScriptStep::ContextAddText { x, y } => {
                canvas.context_add_text(Point::new(*x, *y));
            }
            ScriptStep::Idle => {
                canvas.idle_tick();
            }
        }
        Ok(())
    }

    fn answer_requests(&self, canvas: &mut Canvas) {
        for request in canvas.drain_ui_requests() {
            match request {
                UiRequest::LoadFont { ticket, family } => {
                    let result = if self.unavailable_fonts.contains(&family) {
                        Err(LoadError::FontUnavailable(family))
                    } else {
                        Ok(())
                    };
                    // Failures are logged by the canvas and abandon the text
                    let _ = canvas.complete_font_load(ticket, result);
                }
                UiRequest::ConfirmNewMap(prompt) => {
                    log::info!("{} -> {}", prompt, self.confirm_new_map);
                    if self.confirm_new_map {
                        canvas.confirm_new_map();
                    } else {
                        canvas.cancel_new_map();
                    }
                }
                other => log::debug!("UI request: {:?}", other),
            }
        }
    }
}

fn drag(canvas: &mut Canvas, points: &[Point], shift: bool) {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return;
    };
    let modifiers = Modifiers {
        shift,
        ..Modifiers::NONE
    };
    canvas.handle_pointer(PointerEvent::Down {
        position: *first,
        button: MouseButton::Left,
        modifiers,
        at: Default::default(),
    });
    for point in &points[1..] {
        canvas.handle_pointer(PointerEvent::Move {
            position: *point,
            modifiers,
        });
    }
    canvas.handle_pointer(PointerEvent::Up {
        position: *last,
        button: MouseButton::Left,
        at: Default::default(),
    });
}

/// Read and measure the file a pending image load points at.
fn fetch_image(canvas: &Canvas, ticket: LoadTicket) -> LoadResult<LoadedImage> {
    let url = canvas
        .pending_image_url(ticket)
        .ok_or(LoadError::Stale)?
        .to_string();
    let bytes = std::fs::read(&url).map_err(|e| {
        log::warn!("Failed to read {}: {}", url, e);
        LoadError::Decode(url.clone())
    })?;
    let decoded = image::load_from_memory(&bytes).map_err(|e| {
        log::warn!("Failed to decode {}: {}", url, e);
        LoadError::Decode(url.clone())
    })?;
    Ok(LoadedImage {
        width: decoded.width() as f64,
        height: decoded.height() as f64,
        bytes: Some(bytes),
    })
}
