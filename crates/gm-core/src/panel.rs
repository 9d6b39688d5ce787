//! Overlay panels as data.
//!
//! A panel is an optional title plus an ordered list of rows. The UI layer
//! decides how rows look; the core only decides what they say and where the
//! panel is anchored. Each anchor holds at most one panel at a time.

/// Fixed screen regions that host overlay panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelAnchor {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    /// Free-floating (modal-style) placement, used for input forms.
    Manual,
}

/// What a button row does when pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    ConfirmFeedback,
    CancelFeedback,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PanelRow {
    /// Read-only list entry.
    Item(String),
    /// Free-text input field.
    Input { label: String },
    /// Button.
    Action { label: String, action: PanelAction },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct UiPanel {
    pub title: Option<String>,
    pub rows: Vec<PanelRow>,
}

impl UiPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            rows: Vec::new(),
        }
    }

    pub fn item(mut self, text: impl Into<String>) -> Self {
        self.rows.push(PanelRow::Item(text.into()));
        self
    }

    pub fn input(mut self, label: impl Into<String>) -> Self {
        self.rows.push(PanelRow::Input {
            label: label.into(),
        });
        self
    }

    pub fn action(mut self, label: impl Into<String>, action: PanelAction) -> Self {
        self.rows.push(PanelRow::Action {
            label: label.into(),
            action,
        });
        self
    }

    /// Text of the read-only items, in order.
    pub fn items(&self) -> Vec<&str> {
        self.rows
            .iter()
            .filter_map(|row| match row {
                PanelRow::Item(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}
