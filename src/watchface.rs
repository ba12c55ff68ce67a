//! Watchface state
//!
//! [`Crosswatch`] reconciles the minute tick, messages from the companion and
//! persisted preferences into the strings and colours drawn on screen.

use core::fmt::Write;

use chrono::{NaiveDateTime, Timelike};
use heapless::String;

use crate::clock::{ClockText, HourFormat};
use crate::message::{Message, MessageKey};
use crate::settings::{Settings, Skin};
use crate::storage::Store;
use crate::ui::FaceState;

/// Weather updates are requested on minutes divisible by this
pub const WEATHER_INTERVAL_MINUTES: u32 = 30;

/// Quiet hours used by safe mode, inclusive
pub const SAFE_MODE_START_HOUR: u32 = 0;
pub const SAFE_MODE_END_HOUR: u32 = 6;

/// What the caller should do after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    /// Ask the companion for fresh weather
    pub request_weather: bool,
}

/// What changed after a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MessageOutcome {
    pub settings_changed: bool,
    pub weather_changed: bool,
}

/// Capacity of the weather text
const WEATHER_TEXT_LEN: usize = 32;

pub struct Crosswatch {
    skin: Skin,
    settings: Settings,
    clock: ClockText,
    weather: String<WEATHER_TEXT_LEN>,
    redraw: bool,
}

impl Crosswatch {
    /// Start with the persisted preferences
    pub fn load<S: Store>(skin: Skin, store: &S) -> Self {
        let settings = Settings::load(skin, store);
        info!(
            "Loaded settings: weather {}, safe mode {}, fahrenheit {}",
            settings.weather_on,
            settings.safe_mode,
            settings.fahrenheit
        );

        Self {
            skin,
            settings,
            clock: ClockText::default(),
            weather: String::new(),
            redraw: true,
        }
    }

    pub fn skin(&self) -> Skin {
        self.skin
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn clock(&self) -> &ClockText {
        &self.clock
    }

    /// Handle the minute tick
    pub fn tick(&mut self, now: &NaiveDateTime, hour_format: HourFormat) -> TickOutcome {
        self.clock = ClockText::format(now, hour_format, self.skin);

        let quiet = self.settings.safe_mode
            && (SAFE_MODE_START_HOUR..=SAFE_MODE_END_HOUR).contains(&now.hour());
        if quiet {
            debug!("Quiet hours, weather updates paused");
        }

        let request_weather = now.minute() % WEATHER_INTERVAL_MINUTES == 0
            && self.settings.weather_on
            && !quiet;

        self.redraw = true;
        TickOutcome { request_weather }
    }

    /// Apply a message from the companion and persist the preferences it carries
    pub fn receive<S: Store>(&mut self, message: &Message<'_>, store: &mut S) -> MessageOutcome {
        let mut outcome = MessageOutcome::default();

        if let Some(on) = flag(message, MessageKey::WeatherOn) {
            self.settings.weather_on = on;
            persist_bool(store, MessageKey::WeatherOn, on);
            outcome.settings_changed = true;
        }

        if let Some(on) = flag(message, MessageKey::WeatherSafemode) {
            self.settings.safe_mode = on;
            persist_bool(store, MessageKey::WeatherSafemode, on);
            outcome.settings_changed = true;
        }

        if let Some(on) = flag(message, MessageKey::Units) {
            self.settings.fahrenheit = on;
            persist_bool(store, MessageKey::Units, on);
            outcome.settings_changed = true;
        }

        let temperature = message
            .find(MessageKey::Temperature)
            .and_then(|tuple| tuple.value.as_int());
        let icon = message
            .find(MessageKey::Icon)
            .and_then(|tuple| tuple.value.as_str());
        if let (Some(temperature), Some(icon)) = (temperature, icon) {
            self.set_weather(temperature, icon);
            outcome.weather_changed = true;
        }

        if !self.settings.weather_on && !self.weather.is_empty() {
            self.weather.clear();
            outcome.weather_changed = true;
        }

        let color = message
            .find(MessageKey::BackgroundColor)
            .and_then(|tuple| tuple.value.as_int());
        if let (Some(color), Some(on)) = (color, flag(message, MessageKey::BackgroundOn)) {
            self.settings.background_on = on;
            persist_bool(store, MessageKey::BackgroundOn, on);
            self.settings.background_color = if on {
                color as u32
            } else {
                self.skin.default_background()
            };
            persist_int(
                store,
                MessageKey::BackgroundColor,
                self.settings.background_color as i32,
            );
            outcome.settings_changed = true;
        }

        if outcome.settings_changed || outcome.weather_changed {
            self.redraw = true;
        }

        debug!("fahrenheit {}", self.settings.fahrenheit);
        debug!("weather_on {}", self.settings.weather_on);
        debug!("background_on {}", self.settings.background_on);
        debug!("background_color {:x}", self.settings.background_color);

        outcome
    }

    /// Text shown in the weather slot
    pub fn weather_text(&self) -> &str {
        if self.settings.weather_on {
            return self.weather.as_str();
        }
        match self.skin {
            Skin::Blocks => "",
            Skin::Cross => self.clock.year.as_str(),
        }
    }

    /// Whether the face must be drawn again, clearing the flag
    pub fn take_redraw(&mut self) -> bool {
        core::mem::replace(&mut self.redraw, false)
    }

    /// Snapshot handed to the face renderer
    pub fn face_state(&self) -> FaceState<'_> {
        FaceState {
            hour: self.clock.hour.as_str(),
            minute: self.clock.minute.as_str(),
            date: self.clock.date.as_str(),
            weather: self.weather_text(),
            background_on: self.settings.background_on,
            background_color: self.settings.background_color,
        }
    }

    fn set_weather(&mut self, temperature: i32, icon: &str) {
        let unit = if self.settings.fahrenheit { 'F' } else { 'C' };
        // "-2147483648 F" is the longest reading and always fits
        let mut reading: String<16> = String::new();
        let _ = write!(reading, "{} {}", temperature, unit);

        self.weather.clear();
        if self.skin == Skin::Blocks {
            let room = WEATHER_TEXT_LEN - reading.len() - 1;
            let clamped = clamp_to_char_boundary(icon, room);
            if clamped.len() < icon.len() {
                warn!("Weather icon clamped to {} bytes", room);
            }
            let _ = self.weather.push_str(clamped);
            let _ = self.weather.push(' ');
        }
        let _ = self.weather.push_str(&reading);
        info!("Weather updated: {}", self.weather.as_str());
    }
}

/// Longest prefix of `text` that fits in `max` bytes
fn clamp_to_char_boundary(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

fn flag(message: &Message<'_>, key: MessageKey) -> Option<bool> {
    message.find(key).and_then(|tuple| tuple.value.as_bool())
}

fn persist_bool<S: Store>(store: &mut S, key: MessageKey, value: bool) {
    if let Err(_e) = store.write_bool(key.id(), value) {
        warn!("Failed to persist {}: {}", key, _e);
    }
}

fn persist_int<S: Store>(store: &mut S, key: MessageKey, value: i32) {
    if let Err(_e) = store.write_int(key.id(), value) {
        warn!("Failed to persist {}: {}", key, _e);
    }
}
