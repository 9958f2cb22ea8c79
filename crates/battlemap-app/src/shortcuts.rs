//! Keyboard shortcut registry and documentation.

use battlemap_core::Platform;

/// Which modifier a shortcut needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chord {
    None,
    /// Ctrl, or Alt on macOS.
    Primary,
    /// Alt, or Ctrl on macOS.
    Secondary,
}

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    pub chord: Chord,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(key: &'static str, chord: Chord, description: &'static str) -> Self {
        Self {
            key,
            chord,
            description,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+Z").
    pub fn format(&self, platform: Platform) -> String {
        let modifier = match (self.chord, platform) {
            (Chord::None, _) => None,
            (Chord::Primary, Platform::Windows) | (Chord::Secondary, Platform::Mac) => Some("Ctrl"),
            (Chord::Primary, Platform::Mac) | (Chord::Secondary, Platform::Windows) => Some("Alt"),
        };
        match modifier {
            Some(modifier) => format!("{}+{}", modifier, self.key),
            None => self.key.to_string(),
        }
    }
}

/// Registry of all keyboard shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    /// Get all registered shortcuts.
    pub fn all() -> Vec<Shortcut> {
        vec![
            Shortcut::new("Z", Chord::Primary, "Undo"),
            Shortcut::new("Y", Chord::Primary, "Redo"),
            Shortcut::new("G", Chord::Secondary, "Toggle grid"),
            Shortcut::new("N", Chord::Secondary, "New map"),
            Shortcut::new("S", Chord::Secondary, "Show shortcuts"),
            Shortcut::new("D", Chord::None, "Draw tool"),
            Shortcut::new("E", Chord::None, "Erase tool"),
            Shortcut::new("T", Chord::None, "Text tool"),
            Shortcut::new("S", Chord::None, "Shape tool"),
            Shortcut::new("/", Chord::None, "Search"),
            Shortcut::new("Escape", Chord::None, "Deselect tool"),
            Shortcut::new("Shift", Chord::None, "Snap to grid while held"),
        ]
    }

    /// Print all shortcuts to console.
    pub fn print_all(platform: Platform) {
        println!("\n=== Keyboard Shortcuts ===");
        for shortcut in Self::all() {
            println!("  {:20} {}", shortcut.format(platform), shortcut.description);
        }
        println!();
    }
}
