use std::collections::HashMap;
use std::fmt;

use tiny_skia::Color;

/// Identifies one row of the side panel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InfoKey {
    Label(String),
    /// Legend entry drawn as a filled square of this RGBA color.
    Swatch([u8; 4]),
}

impl InfoKey {
    pub fn swatch(color: Color) -> Self {
        let c = color.to_color_u8();
        InfoKey::Swatch([c.red(), c.green(), c.blue(), c.alpha()])
    }

    pub fn swatch_color(&self) -> Option<Color> {
        match self {
            InfoKey::Swatch([r, g, b, a]) => Some(Color::from_rgba8(*r, *g, *b, *a)),
            InfoKey::Label(_) => None,
        }
    }

    /// Text used when measuring the label column.
    pub fn measure_text(&self) -> String {
        match self {
            InfoKey::Label(s) => s.clone(),
            InfoKey::Swatch(_) => "##".to_string(),
        }
    }
}

impl fmt::Display for InfoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InfoKey::Label(s) => f.write_str(s),
            InfoKey::Swatch([r, g, b, a]) => write!(f, "#{r:02x}{g:02x}{b:02x}{a:02x}"),
        }
    }
}

impl From<&str> for InfoKey {
    fn from(value: &str) -> Self {
        InfoKey::Label(value.to_string())
    }
}

impl From<String> for InfoKey {
    fn from(value: String) -> Self {
        InfoKey::Label(value)
    }
}

impl From<Color> for InfoKey {
    fn from(value: Color) -> Self {
        InfoKey::swatch(value)
    }
}

/// One resolved panel row.
#[derive(Debug, Clone, PartialEq)]
pub struct InfoEntry<'a> {
    pub key: &'a InfoKey,
    pub value: Option<&'a str>,
    pub checked: Option<bool>,
}

/// Ordered panel entries plus their values and checkbox flags.
///
/// `None` in the sequence is a line break.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InfoPanel {
    sequence: Vec<Option<InfoKey>>,
    values: HashMap<InfoKey, Option<String>>,
    checked: HashMap<InfoKey, bool>,
}

impl InfoPanel {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, key: InfoKey, value: Option<String>) -> InfoKey {
        if !self.values.contains_key(&key) {
            self.sequence.push(Some(key.clone()));
        }
        self.values.insert(key.clone(), value);
        key
    }

    pub fn add(&mut self, key: impl Into<InfoKey>, value: impl fmt::Display) {
        self.insert(key.into(), Some(value.to_string()));
    }

    pub fn add_flag(&mut self, key: impl Into<InfoKey>) {
        self.insert(key.into(), None);
    }

    pub fn add_checked(&mut self, key: impl Into<InfoKey>, value: impl fmt::Display, checked: bool) {
        let key = self.insert(key.into(), Some(value.to_string()));
        self.checked.insert(key, checked);
    }

    pub fn add_check(&mut self, key: impl Into<InfoKey>, checked: bool) {
        let key = self.insert(key.into(), None);
        self.checked.insert(key, checked);
    }

    pub fn add_break(&mut self) {
        self.sequence.push(None);
    }

    pub fn value(&self, key: &InfoKey) -> Option<&str> {
        self.values.get(key).and_then(|v| v.as_deref())
    }

    pub fn checked(&self, key: &InfoKey) -> Option<bool> {
        self.checked.get(key).copied()
    }

    pub fn is_checked(&self, key: &InfoKey) -> bool {
        self.checked(key).unwrap_or(false)
    }

    /// Flips the checkbox of `key`, returning the new state, or `None` if it has no checkbox.
    pub fn toggle(&mut self, key: &InfoKey) -> Option<bool> {
        let flag = self.checked.get_mut(key)?;
        *flag = !*flag;
        Some(*flag)
    }

    pub fn set_checked(&mut self, key: &InfoKey, checked: bool) -> bool {
        match self.checked.get_mut(key) {
            Some(flag) => {
                *flag = checked;
                true
            }
            None => false,
        }
    }

    /// Rows in display order; breaks are `None`.
    pub fn rows(&self) -> impl Iterator<Item = Option<InfoEntry<'_>>> + '_ {
        self.sequence.iter().map(move |slot| {
            slot.as_ref().map(|key| InfoEntry {
                key,
                value: self.value(key),
                checked: self.checked(key),
            })
        })
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn re_adding_keeps_position() {
        let mut panel = InfoPanel::new();
        panel.add("Score", 1);
        panel.add("Time", "3s");
        panel.add("Score", 2);
        let keys: Vec<String> = panel.rows().flatten().map(|e| e.key.to_string()).collect();
        assert_eq!(keys, vec!["Score", "Time"]);
        assert_eq!(panel.value(&"Score".into()), Some("2"));
    }

    #[test]
    fn breaks_are_rows_without_entries() {
        let mut panel = InfoPanel::new();
        panel.add_flag("Title");
        panel.add_break();
        panel.add_check("Grid", false);
        let rows: Vec<_> = panel.rows().collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[1].is_none());
        assert_eq!(rows[2].as_ref().and_then(|e| e.checked), Some(false));
    }

    #[test]
    fn toggle_only_affects_checkboxes() {
        let mut panel = InfoPanel::new();
        panel.add("Score", 42);
        panel.add_checked("Labels", "on", true);
        assert_eq!(panel.toggle(&"Score".into()), None);
        assert_eq!(panel.toggle(&"Labels".into()), Some(false));
        assert!(!panel.is_checked(&"Labels".into()));
    }

    #[test]
    fn swatch_keys_measure_as_hashes() {
        let key = InfoKey::swatch(Color::from_rgba8(255, 0, 0, 255));
        assert_eq!(key.measure_text(), "##");
        assert_eq!(key.to_string(), "#ff0000ff");
        assert!(key.swatch_color().is_some());
    }
}
