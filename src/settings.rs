//! User preferences

use crate::message::MessageKey;
use crate::storage::Store;

/// Visual variant of the watchface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Skin {
    /// Stacked date and weather bands above the time
    Blocks,
    /// Diagonal cross with the time above and below it
    Cross,
}

impl Skin {
    /// Background colour used while the custom background is disabled
    pub const fn default_background(self) -> u32 {
        match self {
            Skin::Blocks => 0xFF0000,
            Skin::Cross => 0x0055FF,
        }
    }
}

/// Preferences received from the companion and kept across restarts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Settings {
    /// Temperature in Fahrenheit instead of Celsius
    pub fahrenheit: bool,
    /// Pause weather updates during the night
    pub safe_mode: bool,
    pub weather_on: bool,
    pub background_on: bool,
    /// 0xRRGGBB
    pub background_color: u32,
}

impl Settings {
    pub const fn defaults(skin: Skin) -> Self {
        Self {
            fahrenheit: false,
            safe_mode: true,
            weather_on: false,
            background_on: false,
            background_color: skin.default_background(),
        }
    }

    /// Read every preference from `store`, using the default for missing keys
    pub fn load<S: Store>(skin: Skin, store: &S) -> Self {
        let defaults = Self::defaults(skin);

        Self {
            fahrenheit: store
                .read_bool(MessageKey::Units.id())
                .unwrap_or(defaults.fahrenheit),
            safe_mode: store
                .read_bool(MessageKey::WeatherSafemode.id())
                .unwrap_or(defaults.safe_mode),
            weather_on: store
                .read_bool(MessageKey::WeatherOn.id())
                .unwrap_or(defaults.weather_on),
            background_on: store
                .read_bool(MessageKey::BackgroundOn.id())
                .unwrap_or(defaults.background_on),
            background_color: store
                .read_int(MessageKey::BackgroundColor.id())
                .map(|color| color as u32)
                .unwrap_or(defaults.background_color),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn empty_store_yields_defaults() {
        let store = MemoryStore::new();
        assert_eq!(Settings::load(Skin::Blocks, &store), Settings::defaults(Skin::Blocks));

        let cross = Settings::load(Skin::Cross, &store);
        assert!(cross.safe_mode);
        assert!(!cross.weather_on);
        assert_eq!(cross.background_color, 0x0055FF);
    }

    #[test]
    fn stored_values_override_defaults() {
        let mut store = MemoryStore::new();
        store.write_bool(MessageKey::WeatherOn.id(), true).unwrap();
        store.write_bool(MessageKey::WeatherSafemode.id(), false).unwrap();
        store.write_int(MessageKey::BackgroundColor.id(), 0x00AA55).unwrap();

        let settings = Settings::load(Skin::Blocks, &store);
        assert!(settings.weather_on);
        assert!(!settings.safe_mode);
        assert!(!settings.fahrenheit);
        assert_eq!(settings.background_color, 0x00AA55);
    }
}
