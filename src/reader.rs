use std::sync::Arc;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::formats::Segment;
use crate::progress::KeyValueStore;

pub const PREFERENCES_KEY: &str = "zenreader_preferences";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayMode {
    #[default]
    #[serde(rename = "bi")]
    Bilingual,
    #[serde(rename = "en")]
    Primary,
    #[serde(rename = "cn")]
    Secondary,
}

impl DisplayMode {
    /// Lines of `segment` shown in this mode, primary first.
    pub fn visible_lines<'a>(&self, segment: &'a Segment) -> Vec<&'a str> {
        match self {
            Self::Bilingual => vec![segment.primary.as_str(), segment.secondary.as_str()],
            Self::Primary => vec![segment.primary.as_str()],
            Self::Secondary => vec![segment.secondary.as_str()],
        }
    }
}

/// Reader font size in pixels. Always within `MIN..=MAX`, also when read
/// back from storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "u8")]
pub struct FontSize(u8);

impl FontSize {
    pub const MIN: u8 = 14;
    pub const MAX: u8 = 32;
    pub const DEFAULT: u8 = 18;
    const STEP: u8 = 2;

    pub fn new(px: u8) -> Self {
        Self(px.clamp(Self::MIN, Self::MAX))
    }

    pub fn px(self) -> u8 {
        self.0
    }

    /// The secondary-language line renders slightly smaller.
    pub fn secondary_px(self) -> u8 {
        self.0 - Self::STEP
    }

    #[must_use]
    pub fn increase(self) -> Self {
        Self::new(self.0.saturating_add(Self::STEP))
    }

    #[must_use]
    pub fn decrease(self) -> Self {
        Self::new(self.0.saturating_sub(Self::STEP))
    }
}

impl Default for FontSize {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl From<u8> for FontSize {
    fn from(px: u8) -> Self {
        Self::new(px)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReaderPreferences {
    #[serde(default)]
    pub mode: DisplayMode,
    #[serde(default)]
    pub font_size: FontSize,
}

/// Reader preferences kept next to the progress records.
#[derive(Clone)]
pub struct PreferenceStore {
    kv: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for PreferenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferenceStore").finish_non_exhaustive()
    }
}

impl PreferenceStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Defaults when nothing is stored or the stored value is unreadable.
    pub fn load(&self) -> ReaderPreferences {
        let raw = match self.kv.get(PREFERENCES_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return ReaderPreferences::default(),
            Err(err) => {
                tracing::warn!(error = ?err, "failed to read preferences");
                return ReaderPreferences::default();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|err| {
            tracing::warn!(%err, "ignoring corrupt preferences");
            ReaderPreferences::default()
        })
    }

    pub fn save(&self, prefs: &ReaderPreferences) -> anyhow::Result<()> {
        let raw = serde_json::to_string(prefs).context("serialize preferences")?;
        self.kv.set(PREFERENCES_KEY, &raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::MemoryStore;

    #[test]
    fn font_size_stays_in_range() {
        let mut size = FontSize::default();
        for _ in 0..20 {
            size = size.increase();
        }
        assert_eq!(size.px(), FontSize::MAX);
        for _ in 0..20 {
            size = size.decrease();
        }
        assert_eq!(size.px(), FontSize::MIN);
        assert_eq!(size.secondary_px(), 12);
        assert_eq!(FontSize::new(99).px(), FontSize::MAX);
    }

    #[test]
    fn display_mode_selects_lines() {
        let segment = Segment {
            id: 1,
            primary: "Hello.".to_owned(),
            secondary: "你好。".to_owned(),
        };
        assert_eq!(
            DisplayMode::Bilingual.visible_lines(&segment),
            vec!["Hello.", "你好。"]
        );
        assert_eq!(DisplayMode::Primary.visible_lines(&segment), vec!["Hello."]);
        assert_eq!(DisplayMode::Secondary.visible_lines(&segment), vec!["你好。"]);
    }

    #[test]
    fn preferences_round_trip_and_clamp_stored_sizes() -> anyhow::Result<()> {
        let kv = Arc::new(MemoryStore::new());
        let store = PreferenceStore::new(kv.clone());
        assert_eq!(store.load(), ReaderPreferences::default());

        let prefs = ReaderPreferences {
            mode: DisplayMode::Secondary,
            font_size: FontSize::new(24),
        };
        store.save(&prefs)?;
        assert_eq!(store.load(), prefs);

        kv.set(PREFERENCES_KEY, r#"{"mode":"en","fontSize":60}"#)?;
        let loaded = store.load();
        assert_eq!(loaded.mode, DisplayMode::Primary);
        assert_eq!(loaded.font_size.px(), FontSize::MAX);

        kv.set(PREFERENCES_KEY, "not json")?;
        assert_eq!(store.load(), ReaderPreferences::default());
        Ok(())
    }
}
