//! Headless application: builds a canvas, replays scripts and exports.

use crate::script::{Script, ScriptError, ScriptResult};
use battlemap_core::shapes::SerializableColor;
use battlemap_core::{Canvas, EditorConfig};
use battlemap_render::{ExportOptions, export_png};
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Viewport width in logical pixels.
    pub width: f64,
    /// Viewport height in logical pixels.
    pub height: f64,
    /// Device pixel ratio used for export.
    pub pixel_ratio: f64,
    /// Whether the grid starts visible.
    pub show_grid: bool,
    /// Export background. `None` keeps it transparent.
    pub background: Option<SerializableColor>,
    /// Outline the selected node in exports.
    pub selection: Option<SerializableColor>,
    pub editor: EditorConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
            pixel_ratio: 1.0,
            show_grid: true,
            background: None,
            selection: None,
            editor: EditorConfig::default(),
        }
    }
}

/// Application state.
pub struct App {
    config: AppConfig,
    canvas: Canvas,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        let mut canvas = Canvas::new(config.editor.clone());
        canvas.resize(config.width, config.height);
        if !config.show_grid {
            canvas.toggle_grid();
        }
        // Startup requests are for an interactive host
        canvas.drain_ui_requests();
        Self { config, canvas }
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    /// Replay a script against the canvas.
    pub fn replay(&mut self, script: &Script) -> ScriptResult<()> {
        script.apply(&mut self.canvas)?;
        log::info!(
            "Replayed {} steps, {} actions active",
            script.steps.len(),
            self.canvas.history().active().len()
        );
        Ok(())
    }

    /// Render the current view and encode it as PNG.
    ///
    /// Runs an idle tick first so the grid matches the viewport.
    pub fn export(&mut self) -> ScriptResult<Vec<u8>> {
        self.canvas.idle_tick();
        let options = ExportOptions {
            pixel_ratio: self.config.pixel_ratio,
            background: self.config.background,
            selection: self.config.selection,
        };
        Ok(export_png(&self.canvas, &options)?)
    }

    /// Export to a file.
    pub fn export_to(&mut self, path: &Path) -> ScriptResult<()> {
        let png = self.export()?;
        std::fs::write(path, png).map_err(|source| ScriptError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Wrote {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::ScriptStep;
    use battlemap_render::RendererError;

    fn small() -> AppConfig {
        AppConfig {
            width: 100.0,
            height: 60.0,
            pixel_ratio: 2.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_new_app_applies_config() {
        let app = App::new(AppConfig {
            show_grid: false,
            ..small()
        });
        assert!(!app.canvas().grid_visible());
        assert!((app.canvas().viewport.size.width - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_export_needs_watermark() {
        let mut app = App::new(small());
        assert!(matches!(
            app.export(),
            Err(ScriptError::Render(RendererError::ExportDisabled))
        ));
    }

    #[test]
    fn test_replay_and_export_file() {
        let mut app = App::new(small());
        let script = Script {
            steps: vec![ScriptStep::DropWatermark { x: 50.0, y: 30.0 }],
            ..Default::default()
        };
        app.replay(&script).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("map.png");
        app.export_to(&out).unwrap();
        let decoded = image::open(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (200, 120));
    }

    #[test]
    fn test_export_refreshes_grid_and_applies_background() {
        let mut app = App::new(AppConfig {
            background: Some(SerializableColor::from_hex("#204060")),
            pixel_ratio: 1.0,
            ..small()
        });
        app.canvas_mut().drop_watermark(kurbo::Point::new(500.0, 500.0), None);
        app.canvas_mut().resize(120.0, 60.0);
        assert!(app.canvas().grid_stale());

        let png = app.export().unwrap();
        assert!(!app.canvas().grid_stale());
        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (120, 60));
        assert_eq!(decoded.get_pixel(25, 25).0, [0x20, 0x40, 0x60, 255]);
        // Grid line at x = 100 only exists after the resize
        assert_ne!(decoded.get_pixel(100, 25).0, [0x20, 0x40, 0x60, 255]);
    }
}
