//! The editor: one state object tying the action log, the layer, the
//! viewport and the tools together.

use crate::action::{Action, StrokeMode};
use crate::config::{EditorConfig, WATERMARK_NAME};
use crate::fonts::{FontError, FontLibrary};
use crate::grid::{GridLines, GridRefresh, snap_if};
use crate::history::ActionLog;
use crate::input::{Focus, Gesture, KeyEvent, Modifiers, MouseButton, PointerEvent, UiRequest};
use crate::loads::{LoadError, LoadResult, LoadTicket, LoadTracker, LoadedImage, PendingLoad};
use crate::scene::{Layer, SceneEvent, rebuild};
use crate::shapes::{Figure, Image, Node, NodeId, SerializableColor, Text};
use crate::storage::Storage;
use crate::tools::{PointerRoute, ToolDispatcher, ToolKind};
use crate::viewport::Viewport;
use kurbo::{Point, Vec2};
use std::time::Duration;
use uuid::Uuid;

/// Url recorded for the watermark when no bytes are supplied.
pub const WATERMARK_URL: &str = "assets/images/watermark.png";

/// Prompt shown before a new map discards the current one.
pub const NEW_MAP_PROMPT: &str =
    "Are you sure you want to start a new map? All unsaved changes will be lost.";

/// Handle returned by [`Canvas::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&SceneEvent)>;

/// Tracks whether a node with the watched name is on the layer.
#[derive(Debug, Clone)]
pub struct ExportGate {
    watched: String,
    present: usize,
}

impl ExportGate {
    pub fn new(watched: impl Into<String>) -> Self {
        Self {
            watched: watched.into(),
            present: 0,
        }
    }

    /// Update from one scene event.
    pub fn observe(&mut self, event: &SceneEvent) {
        if event.name() != Some(self.watched.as_str()) {
            return;
        }
        match event {
            SceneEvent::NodeAdded { .. } => self.present += 1,
            SceneEvent::NodeRemoved { .. } => self.present = self.present.saturating_sub(1),
        }
    }

    /// Whether export is allowed.
    pub fn is_enabled(&self) -> bool {
        self.present > 0
    }
}

/// Runtime editor state.
///
/// All input goes through here. Edits become [`Action`]s in the log; undo
/// and redo rebuild the layer from the log.
pub struct Canvas {
    pub config: EditorConfig,
    log: ActionLog,
    layer: Layer,
    /// Pan and zoom.
    pub viewport: Viewport,
    /// Active tool and per-tool options.
    pub tools: ToolDispatcher,
    gesture: Gesture,
    grid: GridRefresh,
    grid_visible: bool,
    focus: Focus,
    selection: Option<NodeId>,
    export: ExportGate,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
    /// Families available to the text tool.
    pub fonts: FontLibrary,
    loads: LoadTracker,
    new_map_pending: bool,
    ui_requests: Vec<UiRequest>,
}

impl std::fmt::Debug for Canvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canvas")
            .field("log", &self.log)
            .field("layer", &self.layer)
            .field("viewport", &self.viewport)
            .field("tool", &self.tools.current())
            .field("gesture", &self.gesture)
            .field("focus", &self.focus)
            .field("subscribers", &self.subscribers.len())
            .finish_non_exhaustive()
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Canvas {
    /// Create an empty map.
    pub fn new(config: EditorConfig) -> Self {
        let viewport = Viewport::from_config(&config);
        Self {
            export: ExportGate::new(config.export_node_name.clone()),
            config,
            log: ActionLog::new(),
            layer: Layer::new(),
            viewport,
            tools: ToolDispatcher::new(),
            gesture: Gesture::Idle,
            grid: GridRefresh::new(),
            grid_visible: true,
            focus: Focus::Canvas,
            selection: None,
            subscribers: Vec::new(),
            next_subscription: 0,
            fonts: FontLibrary::new(),
            loads: LoadTracker::new(),
            new_map_pending: false,
            ui_requests: Vec::new(),
        }
    }

    /// Record an edit and apply it to the layer.
    ///
    /// Anything that was undone is discarded first. Returns the new cursor.
    pub fn record(&mut self, action: Action) -> usize {
        action.apply(&mut self.layer);
        let cursor = self.log.record(action);
        self.dispatch_events();
        cursor
    }

    /// Step back one action. No-op when nothing is applied.
    pub fn undo(&mut self) -> bool {
        if !self.log.undo() {
            return false;
        }
        self.rebuild();
        true
    }

    /// Re-apply the next undone action. No-op at the end of the log.
    pub fn redo(&mut self) -> bool {
        if !self.log.redo() {
            return false;
        }
        self.rebuild();
        true
    }

    fn rebuild(&mut self) {
        rebuild(&mut self.layer, &self.log);
        if let Some(id) = self.selection {
            if self.layer.node(id).is_none() {
                self.selection = None;
            }
        }
        self.dispatch_events();
    }

    pub fn history(&self) -> &ActionLog {
        &self.log
    }

    pub fn layer(&self) -> &Layer {
        &self.layer
    }

    /// Ask for confirmation before clearing the map. Returns the prompt.
    pub fn request_new_map(&mut self) -> &'static str {
        self.new_map_pending = true;
        self.ui_requests
            .push(UiRequest::ConfirmNewMap(NEW_MAP_PROMPT.to_string()));
        NEW_MAP_PROMPT
    }

    /// Clear the layer and the log if a new map was requested.
    pub fn confirm_new_map(&mut self) -> bool {
        if !std::mem::take(&mut self.new_map_pending) {
            return false;
        }
        self.layer.destroy_children();
        self.log.reset();
        self.loads.invalidate();
        self.gesture = Gesture::Idle;
        self.selection = None;
        self.dispatch_events();
        log::info!("Started a new map");
        true
    }

    /// Dismiss a pending new map request.
    pub fn cancel_new_map(&mut self) {
        self.new_map_pending = false;
    }

    pub fn new_map_pending(&self) -> bool {
        self.new_map_pending
    }

    /// Register a callback for node added and removed events.
    pub fn subscribe(&mut self, callback: impl FnMut(&SceneEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Remove a callback. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    fn dispatch_events(&mut self) {
        let events = self.layer.drain_events();
        if events.is_empty() {
            return;
        }
        let was_enabled = self.export.is_enabled();
        for event in &events {
            self.export.observe(event);
            for (_, callback) in self.subscribers.iter_mut() {
                callback(event);
            }
        }
        let enabled = self.export.is_enabled();
        if enabled != was_enabled {
            log::debug!("Export {}", if enabled { "enabled" } else { "disabled" });
            self.ui_requests.push(UiRequest::ExportAvailability(enabled));
        }
    }

    /// Whether PNG and JSON export are allowed.
    pub fn export_enabled(&self) -> bool {
        self.export.is_enabled()
    }

    /// Take the requests queued for the host UI.
    pub fn drain_ui_requests(&mut self) -> Vec<UiRequest> {
        std::mem::take(&mut self.ui_requests)
    }

    /// Select a tool, or turn it off if it is already active.
    ///
    /// Any load still waiting from the previous tool is abandoned.
    pub fn select_tool(&mut self, tool: ToolKind) -> Option<ToolKind> {
        let current = self.tools.select(tool);
        self.loads.invalidate();
        self.ui_requests.push(UiRequest::ToolChanged(current));
        current
    }

    /// Turn off the current tool.
    pub fn deselect_tool(&mut self) {
        if self.tools.current().is_some() {
            self.tools.deselect();
            self.loads.invalidate();
            self.ui_requests.push(UiRequest::ToolChanged(None));
        }
    }

    /// Selected node, if any.
    pub fn selection(&self) -> Option<NodeId> {
        self.selection
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    /// Move keyboard focus, e.g. when the host's search box gains focus.
    pub fn set_focus(&mut self, focus: Focus) {
        self.focus = focus;
    }

    pub fn grid_visible(&self) -> bool {
        self.grid_visible
    }

    /// Show or hide the grid. Returns the new visibility.
    pub fn toggle_grid(&mut self) -> bool {
        self.grid_visible = !self.grid_visible;
        self.ui_requests
            .push(UiRequest::GridVisibility(self.grid_visible));
        self.grid_visible
    }

    /// Lines from the last grid computation.
    pub fn grid_lines(&self) -> &GridLines {
        self.grid.lines()
    }

    /// Whether the grid lines lag behind the viewport until the next idle tick.
    pub fn grid_stale(&self) -> bool {
        self.grid.is_pending()
    }

    /// Number of grid recomputations so far.
    pub fn grid_computations(&self) -> u64 {
        self.grid.computations()
    }

    /// Run deferred work. Returns true if the grid was recomputed.
    pub fn idle_tick(&mut self) -> bool {
        self.grid.flush(&self.viewport).is_some()
    }

    /// Change the visible area in screen pixels.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.viewport.resize(width, height);
        self.grid.request();
    }

    /// Handle a pointer event in screen coordinates.
    pub fn handle_pointer(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Down {
                position,
                button: MouseButton::Left,
                modifiers,
                ..
            } => self.left_down(position, modifiers),
            PointerEvent::Down {
                position,
                button: MouseButton::Right,
                at,
                ..
            } => {
                if self.gesture.is_idle() {
                    self.gesture = Gesture::RightPress {
                        origin: position,
                        last: position,
                        started: at,
                    };
                }
            }
            PointerEvent::Down { .. } => {}
            PointerEvent::Move { position, modifiers } => self.pointer_move(position, modifiers),
            PointerEvent::Up {
                position,
                button,
                at,
            } => self.pointer_up(position, button, at),
            PointerEvent::Scroll { position, delta } => {
                let factor = if delta.y > 0.0 {
                    self.config.zoom_out_step
                } else {
                    self.config.zoom_in_step
                };
                if self.viewport.zoom_at(position, factor) {
                    self.grid.request();
                }
            }
        }
    }

    fn left_down(&mut self, screen: Point, modifiers: Modifiers) {
        if !self.gesture.is_idle() {
            return;
        }
        let world = self.viewport.screen_to_world(screen);
        match self.tools.route() {
            PointerRoute::BeginStroke(mode) => {
                let snap = self.tools.snapping(modifiers.shift);
                let (color, width) = match mode {
                    StrokeMode::Draw => (self.tools.settings.draw.color, self.tools.settings.draw.size),
                    StrokeMode::Erase => (SerializableColor::white(), self.tools.settings.erase.size),
                };
                self.gesture = Gesture::Drawing {
                    mode,
                    points: vec![snap_if(world, self.viewport.cell_size, snap)],
                    color,
                    width,
                };
            }
            PointerRoute::PlaceText => {
                if let Some(id) = self.text_at(world) {
                    self.selection = Some(id);
                    self.focus = Focus::TextEditing;
                } else {
                    self.place_text(world);
                }
            }
            PointerRoute::PlaceShape => {
                self.place_shape(world, modifiers.shift);
            }
            PointerRoute::Select => {
                let tolerance = self.config.hit_tolerance / self.viewport.scale;
                self.selection = self.layer.nodes_at(world, tolerance).first().copied();
                if let Some(id) = self.selection {
                    let draggable = self.layer.node(id).is_some_and(Node::is_draggable);
                    if draggable && self.tools.images_draggable() {
                        self.gesture = Gesture::Dragging {
                            id,
                            origin: world,
                            last: world,
                        };
                    }
                }
            }
        }
    }

    fn text_at(&self, world: Point) -> Option<NodeId> {
        let tolerance = self.config.hit_tolerance / self.viewport.scale;
        self.layer
            .nodes_at(world, tolerance)
            .into_iter()
            .find(|id| matches!(self.layer.node(*id), Some(Node::Text(_))))
    }

    fn pointer_move(&mut self, screen: Point, modifiers: Modifiers) {
        match &mut self.gesture {
            Gesture::Drawing { points, .. } => {
                let snap = self.tools.snapping(modifiers.shift);
                let world = snap_if(
                    self.viewport.screen_to_world(screen),
                    self.viewport.cell_size,
                    snap,
                );
                if points.last() != Some(&world) {
                    points.push(world);
                }
            }
            Gesture::RightPress { origin, last, .. } => {
                if (screen - *origin).hypot() > self.config.pan_move_threshold {
                    let delta = screen - *last;
                    self.gesture = Gesture::Panning { last: screen };
                    self.pan(delta);
                } else {
                    *last = screen;
                }
            }
            Gesture::Panning { last } => {
                let delta = screen - *last;
                *last = screen;
                self.pan(delta);
            }
            Gesture::Dragging { id, last, .. } => {
                let world = self.viewport.screen_to_world(screen);
                let delta = world - *last;
                *last = world;
                self.layer.translate(*id, delta);
            }
            Gesture::Idle => {}
        }
    }

    fn pan(&mut self, delta: Vec2) {
        self.viewport.pan(delta);
        self.grid.request();
    }

    fn pointer_up(&mut self, screen: Point, button: MouseButton, at: Duration) {
        match (button, std::mem::take(&mut self.gesture)) {
            (
                MouseButton::Left,
                Gesture::Drawing {
                    mode,
                    points,
                    color,
                    width,
                },
            ) => {
                self.record(Action::stroke(mode, points, color, width));
            }
            (MouseButton::Left, Gesture::Dragging { id, origin, last }) => {
                if origin == last {
                    return;
                }
                // The layer already holds the moved node; the log learns of it here
                if let Some(node) = self.layer.node(id).cloned() {
                    self.record(Action::Replace(node));
                }
            }
            (MouseButton::Right, Gesture::RightPress { started, .. }) => {
                if at.saturating_sub(started) < self.config.click_duration {
                    self.ui_requests.push(UiRequest::ContextMenu(screen));
                }
            }
            (MouseButton::Right, Gesture::Panning { .. }) => {}
            (_, gesture) => self.gesture = gesture,
        }
    }

    /// Handle a key event. Returns true if it was consumed.
    pub fn handle_key(&mut self, event: KeyEvent) -> bool {
        let (key, modifiers, pressed) = match event {
            KeyEvent::Pressed { key, modifiers } => (key, modifiers, true),
            KeyEvent::Released { key, modifiers } => (key, modifiers, false),
        };
        let key = key.to_lowercase();

        if !pressed {
            if key == "shift" {
                if let Some(tool) = self.tools.current() {
                    self.tools.settings.set_snap(tool, false);
                }
                return true;
            }
            return false;
        }

        if self.focus != Focus::Canvas {
            if key == "escape" {
                self.focus = Focus::Canvas;
                return true;
            }
            return false;
        }

        let platform = self.config.platform;
        if modifiers.primary(platform) {
            match key.as_str() {
                "z" => {
                    self.undo();
                    return true;
                }
                "y" => {
                    self.redo();
                    return true;
                }
                _ => {}
            }
        }
        if modifiers.secondary(platform) {
            match key.as_str() {
                "g" => {
                    self.toggle_grid();
                    return true;
                }
                "n" => {
                    self.request_new_map();
                    return true;
                }
                "s" => {
                    self.ui_requests.push(UiRequest::ToggleShortcuts);
                    return true;
                }
                _ => {}
            }
        }
        if modifiers.ctrl || modifiers.alt || modifiers.meta {
            return false;
        }

        match key.as_str() {
            "d" => {
                self.select_tool(ToolKind::Draw);
            }
            "e" => {
                self.select_tool(ToolKind::Erase);
            }
            "t" => {
                self.select_tool(ToolKind::Text);
            }
            "s" => {
                self.select_tool(ToolKind::Shape);
            }
            "/" => {
                self.focus = Focus::Search;
                self.ui_requests.push(UiRequest::FocusSearch);
            }
            "escape" => self.deselect_tool(),
            "shift" => {
                if let Some(tool) = self.tools.current() {
                    self.tools.settings.set_snap(tool, true);
                }
            }
            _ => return false,
        }
        true
    }

    /// Place a figure from the shape tool options at a world point.
    pub fn place_shape(&mut self, world: Point, shift: bool) -> NodeId {
        let snap = shift || self.tools.settings.shape.snap;
        let cell_size = self.viewport.cell_size;
        let position = snap_if(world, cell_size, snap);
        let options = &self.tools.settings.shape;
        let mut figure = Figure::new(Uuid::new_v4(), options.kind, position, cell_size);
        figure.fill = Some(options.fill);
        figure.stroke_color = options.stroke;
        figure.stroke_width = options.stroke_width;
        self.record_node(Action::AddShape(figure))
    }

    /// Place text from the text tool options at a world point.
    ///
    /// Returns a ticket when the font has to be loaded first; the text is
    /// added by [`Canvas::complete_font_load`].
    pub fn place_text(&mut self, world: Point) -> Option<LoadTicket> {
        let options = &self.tools.settings.text;
        let mut text = Text::new(
            Uuid::new_v4(),
            world,
            options.content.clone(),
            options.font_family.clone(),
            options.font_size,
        );
        text.fill = options.color;
        text.width = options.width;

        if self.fonts.is_available(&text.font_family) {
            self.record_node(Action::AddText(text));
            return None;
        }
        let family = text.font_family.clone();
        let ticket = self.loads.begin(PendingLoad::Text(text));
        self.ui_requests.push(UiRequest::LoadFont { ticket, family });
        Some(ticket)
    }

    /// Text node open in the inline editor, if any.
    pub fn editing_text(&self) -> Option<NodeId> {
        match (self.focus, self.selection) {
            (Focus::TextEditing, Some(id)) => Some(id),
            _ => None,
        }
    }

    /// Replace the content of a text node and close the editor.
    ///
    /// The edit is one undoable action. Returns false when `id` is not a
    /// text node or the content did not change.
    pub fn commit_text_edit(&mut self, id: NodeId, content: impl Into<String>) -> bool {
        if self.focus == Focus::TextEditing {
            self.focus = Focus::Canvas;
        }
        let Some(Node::Text(text)) = self.layer.node(id) else {
            return false;
        };
        let content = content.into();
        if text.content == content {
            return false;
        }
        let mut text = text.clone();
        text.content = content;
        self.record(Action::Replace(Node::Text(text)));
        true
    }

    /// "Add text" from the context menu: switch to the text tool and place
    /// text under the screen point the menu was opened at.
    pub fn context_add_text(&mut self, screen: Point) -> Option<LoadTicket> {
        if self.tools.current() != Some(ToolKind::Text) {
            self.select_tool(ToolKind::Text);
        }
        let world = self.viewport.screen_to_world(screen);
        self.place_text(world)
    }

    /// Finish a font load started by [`Canvas::place_text`].
    pub fn complete_font_load(
        &mut self,
        ticket: LoadTicket,
        result: LoadResult<()>,
    ) -> LoadResult<NodeId> {
        let pending = self.loads.take(ticket)?;
        let PendingLoad::Text(text) = pending else {
            return Err(LoadError::Stale);
        };
        if let Err(e) = result {
            log::warn!("Font {} failed to load: {}", text.font_family, e);
            return Err(e);
        }
        Ok(self.record_node(Action::AddText(text)))
    }

    /// Drop the built-in watermark at a screen point.
    ///
    /// `data` holds the encoded image; without it the node references
    /// [`WATERMARK_URL`].
    pub fn drop_watermark(&mut self, screen: Point, data: Option<&[u8]>) -> NodeId {
        let world = self.viewport.screen_to_world(screen);
        let size = self.config.watermark_size;
        let id = Uuid::new_v4();
        let image = data
            .and_then(|bytes| Image::embedded(id, world, bytes, size, size))
            .unwrap_or_else(|| Image::from_url(id, world, WATERMARK_URL, size, size))
            .with_name(WATERMARK_NAME);
        self.record_node(Action::AddImage(image))
    }

    /// Start loading an image dropped at a screen point.
    ///
    /// Only `.webp` urls are accepted; the `.png` next to it is what gets
    /// loaded.
    pub fn drop_image_url(&mut self, url: &str, screen: Point) -> LoadResult<LoadTicket> {
        let Some(stem) = url.strip_suffix(".webp") else {
            log::warn!("Dropped image is not a .webp: {}", url);
            return Err(LoadError::UnsupportedImage(url.to_string()));
        };
        let position = self.viewport.screen_to_world(screen);
        Ok(self.loads.begin(PendingLoad::Image {
            position,
            url: format!("{}.png", stem),
        }))
    }

    /// Url the host should fetch for an image ticket.
    pub fn pending_image_url(&self, ticket: LoadTicket) -> Option<&str> {
        match self.loads.get(ticket)? {
            PendingLoad::Image { url, .. } => Some(url),
            PendingLoad::Text(_) => None,
        }
    }

    /// Finish an image load started by [`Canvas::drop_image_url`].
    pub fn complete_image_load(
        &mut self,
        ticket: LoadTicket,
        result: LoadResult<LoadedImage>,
    ) -> LoadResult<NodeId> {
        let pending = self.loads.take(ticket)?;
        let PendingLoad::Image { position, url } = pending else {
            return Err(LoadError::Stale);
        };
        let image = match result.and_then(|loaded| loaded.into_node(position, url.clone())) {
            Ok(image) => image,
            Err(e) => {
                log::error!("Failed to load image {}: {}", url, e);
                return Err(e);
            }
        };
        Ok(self.record_node(Action::AddImage(image)))
    }

    fn record_node(&mut self, action: Action) -> NodeId {
        let id = action.node_id();
        self.record(action);
        id
    }

    /// Loads still waiting for completion.
    pub fn pending_loads(&self) -> usize {
        self.loads.pending()
    }

    /// Import a font file and save it for later sessions.
    pub fn import_font(
        &mut self,
        file_name: &str,
        data: Vec<u8>,
        storage: &dyn Storage,
    ) -> Result<String, FontError> {
        self.fonts.import(file_name, data, storage)
    }

    /// Register fonts saved by earlier sessions.
    pub fn load_saved_fonts(&mut self, storage: &dyn Storage) -> Result<usize, FontError> {
        self.fonts.load_saved(storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{FigureKind, NodeTrait};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn down(x: f64, y: f64, button: MouseButton, ms: u64) -> PointerEvent {
        PointerEvent::Down {
            position: Point::new(x, y),
            button,
            modifiers: Modifiers::NONE,
            at: Duration::from_millis(ms),
        }
    }

    fn up(x: f64, y: f64, button: MouseButton, ms: u64) -> PointerEvent {
        PointerEvent::Up {
            position: Point::new(x, y),
            button,
            at: Duration::from_millis(ms),
        }
    }

    fn mv(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Move {
            position: Point::new(x, y),
            modifiers: Modifiers::NONE,
        }
    }

    fn ctrl() -> Modifiers {
        Modifiers {
            ctrl: true,
            ..Modifiers::NONE
        }
    }

    fn canvas() -> Canvas {
        Canvas::new(EditorConfig {
            platform: crate::config::Platform::Windows,
            ..EditorConfig::default()
        })
    }

    #[test]
    fn test_draw_gesture_records_stroke() {
        let mut canvas = canvas();
        canvas.select_tool(ToolKind::Draw);
        canvas.handle_pointer(down(10.0, 10.0, MouseButton::Left, 0));
        assert!(canvas.gesture().is_drawing());
        canvas.handle_pointer(mv(20.0, 10.0));
        canvas.handle_pointer(mv(30.0, 15.0));
        canvas.handle_pointer(up(30.0, 15.0, MouseButton::Left, 50));

        assert!(canvas.gesture().is_idle());
        assert_eq!(canvas.history().len(), 1);
        match &canvas.layer().nodes()[0] {
            Node::Stroke(stroke) => assert_eq!(stroke.len(), 3),
            other => panic!("expected stroke, got {:?}", other),
        }
    }

    #[test]
    fn test_snapped_drawing() {
        let mut canvas = canvas();
        canvas.select_tool(ToolKind::Draw);
        canvas.handle_key(KeyEvent::pressed("Shift"));
        canvas.handle_pointer(down(123.0, 77.0, MouseButton::Left, 0));
        canvas.handle_pointer(up(123.0, 77.0, MouseButton::Left, 10));
        canvas.handle_key(KeyEvent::released("Shift"));

        match &canvas.layer().nodes()[0] {
            Node::Stroke(stroke) => assert_eq!(stroke.points, vec![Point::new(100.0, 100.0)]),
            other => panic!("expected stroke, got {:?}", other),
        }
        assert_eq!(canvas.tools.settings.snap(ToolKind::Draw), Some(false));
    }

    #[test]
    fn test_right_click_opens_context_menu() {
        let mut canvas = canvas();
        canvas.handle_pointer(down(100.0, 100.0, MouseButton::Right, 1000));
        canvas.handle_pointer(mv(102.0, 101.0));
        canvas.handle_pointer(up(102.0, 101.0, MouseButton::Right, 1100));

        let requests = canvas.drain_ui_requests();
        assert_eq!(requests, vec![UiRequest::ContextMenu(Point::new(102.0, 101.0))]);
        assert_eq!(canvas.viewport.offset, Vec2::ZERO);
    }

    #[test]
    fn test_slow_right_click_is_not_a_click() {
        let mut canvas = canvas();
        canvas.handle_pointer(down(100.0, 100.0, MouseButton::Right, 0));
        canvas.handle_pointer(up(100.0, 100.0, MouseButton::Right, 200));
        assert!(canvas.drain_ui_requests().is_empty());
    }

    #[test]
    fn test_right_drag_pans() {
        let mut canvas = canvas();
        canvas.select_tool(ToolKind::Draw);
        canvas.drain_ui_requests();
        canvas.idle_tick();

        canvas.handle_pointer(down(100.0, 100.0, MouseButton::Right, 0));
        canvas.handle_pointer(mv(110.0, 100.0));
        assert!(canvas.gesture().is_panning());
        canvas.handle_pointer(mv(120.0, 105.0));

        // A left press while panning does not start a stroke
        canvas.handle_pointer(down(120.0, 105.0, MouseButton::Left, 10));
        assert!(canvas.gesture().is_panning());

        canvas.handle_pointer(up(120.0, 105.0, MouseButton::Right, 50));
        assert!(canvas.gesture().is_idle());
        assert_eq!(canvas.viewport.offset, Vec2::new(20.0, 5.0));
        assert!(canvas.drain_ui_requests().is_empty());
        assert!(canvas.history().is_empty());

        // Many pan moves, one grid recomputation
        assert!(canvas.idle_tick());
        assert!(!canvas.idle_tick());
        assert_eq!(canvas.grid_computations(), 2);
    }

    #[test]
    fn test_wheel_zooms_around_pointer() {
        let mut canvas = canvas();
        canvas.handle_pointer(PointerEvent::Scroll {
            position: Point::new(400.0, 300.0),
            delta: Vec2::new(0.0, -120.0),
        });
        assert!((canvas.viewport.scale - 1.1).abs() < 1e-12);
        canvas.handle_pointer(PointerEvent::Scroll {
            position: Point::new(400.0, 300.0),
            delta: Vec2::new(0.0, 120.0),
        });
        assert!((canvas.viewport.scale - 0.99).abs() < 1e-12);
    }

    #[test]
    fn test_keyboard_undo_redo() {
        let mut canvas = canvas();
        canvas.place_shape(Point::new(10.0, 10.0), false);
        assert!(canvas.handle_key(KeyEvent::pressed_with("z", ctrl())));
        assert!(canvas.layer().is_empty());
        assert!(canvas.handle_key(KeyEvent::pressed_with("Y", ctrl())));
        assert_eq!(canvas.layer().len(), 1);
    }

    #[test]
    fn test_tool_keys_and_escape() {
        let mut canvas = canvas();
        canvas.handle_key(KeyEvent::pressed("e"));
        assert_eq!(canvas.tools.current(), Some(ToolKind::Erase));
        canvas.handle_key(KeyEvent::pressed("s"));
        assert_eq!(canvas.tools.current(), Some(ToolKind::Shape));
        canvas.handle_key(KeyEvent::pressed("Escape"));
        assert_eq!(canvas.tools.current(), None);
    }

    #[test]
    fn test_search_focus_swallows_keys() {
        let mut canvas = canvas();
        canvas.handle_key(KeyEvent::pressed("/"));
        assert_eq!(canvas.focus(), Focus::Search);
        assert!(!canvas.handle_key(KeyEvent::pressed("d")));
        assert_eq!(canvas.tools.current(), None);
        assert!(canvas.handle_key(KeyEvent::pressed("Escape")));
        assert_eq!(canvas.focus(), Focus::Canvas);
    }

    #[test]
    fn test_grid_toggle_shortcut() {
        let mut canvas = canvas();
        let alt = Modifiers {
            alt: true,
            ..Modifiers::NONE
        };
        assert!(canvas.handle_key(KeyEvent::pressed_with("g", alt)));
        assert!(!canvas.grid_visible());
        assert_eq!(canvas.drain_ui_requests(), vec![UiRequest::GridVisibility(false)]);
    }

    #[test]
    fn test_new_map_needs_confirmation() {
        let mut canvas = canvas();
        canvas.place_shape(Point::ZERO, false);
        assert!(!canvas.confirm_new_map());
        assert_eq!(canvas.layer().len(), 1);

        canvas.request_new_map();
        canvas.cancel_new_map();
        assert!(!canvas.confirm_new_map());

        canvas.request_new_map();
        assert!(canvas.confirm_new_map());
        assert!(canvas.layer().is_empty());
        assert_eq!(canvas.history().cursor(), None);
        assert!(!canvas.undo());
    }

    #[test]
    fn test_shape_placement() {
        let mut canvas = canvas();
        canvas.tools.settings.shape.kind = FigureKind::Triangle;
        let id = canvas.place_shape(Point::new(123.0, 77.0), true);
        match canvas.layer().node(id) {
            Some(Node::Figure(figure)) => {
                assert_eq!(figure.position, Point::new(100.0, 100.0));
                assert!((figure.radius() - 25.0).abs() < f64::EPSILON);
            }
            other => panic!("expected figure, got {:?}", other),
        }
    }

    #[test]
    fn test_text_with_builtin_font_is_immediate() {
        let mut canvas = canvas();
        canvas.select_tool(ToolKind::Text);
        canvas.handle_pointer(down(50.0, 50.0, MouseButton::Left, 0));
        assert_eq!(canvas.layer().len(), 1);
        assert_eq!(canvas.pending_loads(), 0);

        // Clicking the text again edits it instead of adding another
        canvas.handle_pointer(up(50.0, 50.0, MouseButton::Left, 5));
        canvas.handle_pointer(down(60.0, 60.0, MouseButton::Left, 10));
        assert_eq!(canvas.layer().len(), 1);
        assert_eq!(canvas.focus(), Focus::TextEditing);
    }

    #[test]
    fn test_stale_font_load_is_dropped() {
        let mut canvas = canvas();
        canvas.select_tool(ToolKind::Text);
        canvas.tools.settings.text.font_family = "Blackletter".to_string();
        let ticket = canvas.place_text(Point::new(5.0, 5.0)).unwrap();
        assert!(canvas
            .drain_ui_requests()
            .contains(&UiRequest::LoadFont { ticket, family: "Blackletter".to_string() }));

        canvas.select_tool(ToolKind::Draw);
        assert!(matches!(
            canvas.complete_font_load(ticket, Ok(())),
            Err(LoadError::Stale)
        ));
        assert!(canvas.layer().is_empty());
    }

    #[test]
    fn test_font_load_completes() {
        let mut canvas = canvas();
        canvas.tools.settings.text.font_family = "Blackletter".to_string();
        let first = canvas.place_text(Point::new(5.0, 5.0)).unwrap();
        let second = canvas.place_text(Point::new(50.0, 5.0)).unwrap();

        let failed = canvas.complete_font_load(
            first,
            Err(LoadError::FontUnavailable("Blackletter".to_string())),
        );
        assert!(failed.is_err());
        let id = canvas.complete_font_load(second, Ok(())).unwrap();
        assert_eq!(canvas.layer().len(), 1);
        assert_eq!(canvas.layer().nodes()[0].id(), id);
    }

    #[test]
    fn test_image_drop_requires_webp() {
        let mut canvas = canvas();
        assert!(matches!(
            canvas.drop_image_url("tiles/floor.jpg", Point::ZERO),
            Err(LoadError::UnsupportedImage(_))
        ));

        let ticket = canvas.drop_image_url("tiles/floor.webp", Point::new(10.0, 10.0)).unwrap();
        assert_eq!(canvas.pending_image_url(ticket), Some("tiles/floor.png"));
        let id = canvas
            .complete_image_load(
                ticket,
                Ok(LoadedImage {
                    bytes: None,
                    width: 20.0,
                    height: 20.0,
                }),
            )
            .unwrap();
        match canvas.layer().node(id) {
            Some(Node::Image(image)) => assert_eq!(image.top_left(), Point::ZERO),
            other => panic!("expected image, got {:?}", other),
        }
    }

    #[test]
    fn test_export_gate_follows_watermark() {
        let mut canvas = canvas();
        assert!(!canvas.export_enabled());
        canvas.drop_watermark(Point::new(100.0, 100.0), None);
        assert!(canvas.export_enabled());

        canvas.undo();
        assert!(!canvas.export_enabled());
        canvas.redo();
        assert!(canvas.export_enabled());

        let availability: Vec<UiRequest> = canvas
            .drain_ui_requests()
            .into_iter()
            .filter(|r| matches!(r, UiRequest::ExportAvailability(_)))
            .collect();
        assert_eq!(
            availability,
            vec![
                UiRequest::ExportAvailability(true),
                UiRequest::ExportAvailability(false),
                UiRequest::ExportAvailability(true),
            ]
        );
    }

    #[test]
    fn test_subscribers_receive_events() {
        let mut canvas = canvas();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let id = canvas.subscribe(move |event| sink.borrow_mut().push(event.clone()));

        let node = canvas.place_shape(Point::ZERO, false);
        canvas.undo();
        assert_eq!(
            *seen.borrow(),
            vec![
                SceneEvent::NodeAdded { id: node, name: None },
                SceneEvent::NodeRemoved { id: node, name: None },
            ]
        );

        assert!(canvas.unsubscribe(id));
        canvas.redo();
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn test_select_picks_topmost() {
        let mut canvas = canvas();
        canvas.place_shape(Point::ZERO, false);
        let top = canvas.place_shape(Point::new(25.0, 25.0), false);
        canvas.handle_pointer(down(30.0, 30.0, MouseButton::Left, 0));
        assert_eq!(canvas.selection(), Some(top));

        canvas.undo();
        assert_eq!(canvas.selection(), None);
    }

    #[test]
    fn test_drag_moves_shape_and_undo_restores() {
        let mut canvas = canvas();
        let id = canvas.place_shape(Point::new(50.0, 50.0), false);
        canvas.handle_pointer(down(50.0, 50.0, MouseButton::Left, 0));
        assert!(canvas.gesture().is_dragging());
        canvas.handle_pointer(mv(60.0, 55.0));
        canvas.handle_pointer(mv(80.0, 70.0));
        canvas.handle_pointer(up(80.0, 70.0, MouseButton::Left, 40));

        let position = |canvas: &Canvas| match canvas.layer().node(id) {
            Some(Node::Figure(figure)) => figure.position,
            other => panic!("expected figure, got {:?}", other),
        };
        assert_eq!(position(&canvas), Point::new(80.0, 70.0));
        assert_eq!(canvas.history().len(), 2);
        assert_eq!(canvas.layer().len(), 1);

        canvas.undo();
        assert_eq!(position(&canvas), Point::new(50.0, 50.0));
        canvas.redo();
        assert_eq!(position(&canvas), Point::new(80.0, 70.0));
    }

    #[test]
    fn test_drag_follows_zoom_and_click_records_nothing() {
        let mut canvas = canvas();
        canvas.viewport.scale = 2.0;
        let id = canvas.drop_watermark(Point::new(100.0, 100.0), None);

        canvas.handle_pointer(down(100.0, 100.0, MouseButton::Left, 0));
        canvas.handle_pointer(up(100.0, 100.0, MouseButton::Left, 10));
        assert_eq!(canvas.history().len(), 1);

        canvas.handle_pointer(down(100.0, 100.0, MouseButton::Left, 20));
        canvas.handle_pointer(mv(120.0, 100.0));
        canvas.handle_pointer(up(120.0, 100.0, MouseButton::Left, 30));
        match canvas.layer().node(id) {
            Some(Node::Image(image)) => assert_eq!(image.position, Point::new(60.0, 50.0)),
            other => panic!("expected image, got {:?}", other),
        }
        // Still exactly one watermark for the export gate
        assert!(canvas.export_enabled());
    }

    #[test]
    fn test_draw_tool_does_not_drag() {
        let mut canvas = canvas();
        canvas.place_shape(Point::new(50.0, 50.0), false);
        canvas.select_tool(ToolKind::Draw);
        canvas.handle_pointer(down(50.0, 50.0, MouseButton::Left, 0));
        assert!(canvas.gesture().is_drawing());

    }

    #[test]
    fn test_strokes_are_not_draggable() {
        let mut canvas = canvas();
        canvas.select_tool(ToolKind::Draw);
        canvas.handle_pointer(down(10.0, 10.0, MouseButton::Left, 0));
        canvas.handle_pointer(mv(30.0, 10.0));
        canvas.handle_pointer(up(30.0, 10.0, MouseButton::Left, 5));
        canvas.deselect_tool();
        canvas.handle_pointer(down(20.0, 10.0, MouseButton::Left, 10));
        assert!(canvas.selection().is_some());
        assert!(canvas.gesture().is_idle());
    }

    #[test]
    fn test_text_edit_undo_restores_original() {
        let mut canvas = canvas();
        canvas.tools.settings.text.content = "Goblin camp".to_string();
        canvas.select_tool(ToolKind::Text);
        canvas.handle_pointer(down(50.0, 50.0, MouseButton::Left, 0));
        canvas.handle_pointer(up(50.0, 50.0, MouseButton::Left, 5));
        canvas.handle_pointer(down(55.0, 55.0, MouseButton::Left, 10));
        let id = canvas.editing_text().unwrap();

        assert!(canvas.commit_text_edit(id, "Orc camp"));
        assert_eq!(canvas.focus(), Focus::Canvas);
        assert_eq!(canvas.editing_text(), None);
        let content = |canvas: &Canvas| match canvas.layer().node(id) {
            Some(Node::Text(text)) => text.content.clone(),
            other => panic!("expected text, got {:?}", other),
        };
        assert_eq!(content(&canvas), "Orc camp");
        assert_eq!(canvas.layer().len(), 1);

        canvas.undo();
        assert_eq!(content(&canvas), "Goblin camp");
        canvas.redo();
        assert_eq!(content(&canvas), "Orc camp");

        // Unchanged content and non-text targets record nothing
        assert!(!canvas.commit_text_edit(id, "Orc camp"));
        let shape = canvas.place_shape(Point::new(300.0, 300.0), false);
        assert!(!canvas.commit_text_edit(shape, "nope"));
        assert_eq!(canvas.history().len(), 3);
    }

    #[test]
    fn test_context_add_text() {
        let mut canvas = canvas();
        canvas.viewport.offset = Vec2::new(10.0, 0.0);
        canvas.select_tool(ToolKind::Draw);
        assert!(canvas.context_add_text(Point::new(110.0, 40.0)).is_none());
        assert_eq!(canvas.tools.current(), Some(ToolKind::Text));
        match &canvas.layer().nodes()[0] {
            Node::Text(text) => assert_eq!(text.position, Point::new(100.0, 40.0)),
            other => panic!("expected text, got {:?}", other),
        }

        // Already on the text tool: it stays selected
        canvas.context_add_text(Point::new(10.0, 10.0));
        assert_eq!(canvas.tools.current(), Some(ToolKind::Text));
        assert_eq!(canvas.layer().len(), 2);
    }

    #[test]
    fn test_config_drives_cell_size_and_zoom_limit() {
        let mut canvas = Canvas::new(EditorConfig {
            cell_size: 40.0,
            max_scale: 2.0,
            ..EditorConfig::default()
        });
        let id = canvas.place_shape(Point::new(45.0, 61.0), true);
        match canvas.layer().node(id) {
            Some(Node::Figure(figure)) => {
                assert_eq!(figure.position, Point::new(40.0, 80.0));
                assert!((figure.radius() - 20.0).abs() < f64::EPSILON);
            }
            other => panic!("expected figure, got {:?}", other),
        }

        canvas.idle_tick();
        assert!((canvas.grid_lines().cell_size - 40.0).abs() < f64::EPSILON);

        for _ in 0..20 {
            canvas.handle_pointer(PointerEvent::Scroll {
                position: Point::ZERO,
                delta: Vec2::new(0.0, -1.0),
            });
        }
        assert!((canvas.viewport.scale - 2.0).abs() < f64::EPSILON);
    }
}
