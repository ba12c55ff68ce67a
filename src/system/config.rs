//! General system configuration

use crosswatch::{HourFormat, Skin};
use embassy_nrf::{
    config::{Config, Debug, HfclkSource, LfclkSource},
    interrupt::Priority,
};

/// Offset of local time to UTC in seconds
pub const UTC_OFFSET: i32 = 1 * 3_600;

/// Clock style of the hour label
pub const HOUR_FORMAT: HourFormat = HourFormat::TwentyFour;

#[cfg(not(feature = "skin-cross"))]
pub const SKIN: Skin = Skin::Blocks;
#[cfg(feature = "skin-cross")]
pub const SKIN: Skin = Skin::Cross;

/// Backlight level after boot (0-7)
pub const BACKLIGHT_LEVEL: u8 = 2;

/// Internal flash page holding the persisted settings.
/// Excluded from the FLASH region in `memory.x`.
pub const SETTINGS_PAGE: u32 = 0x7_F000;
pub const FLASH_PAGE_SIZE: u32 = 4096;

pub struct SystemConfig {}

impl SystemConfig {
    /// Create new system configuration
    pub fn new() -> Config {
        // Generate default config, required because Config is set as
        // `non_exhaustive`
        let mut config = Config::default();

        // Set high-frequency and low-frequency clock sources to external
        config.hfclk_source = HfclkSource::ExternalXtal;
        config.lfclk_source = LfclkSource::ExternalXtal;

        // Enable DC/DC regulator to massively reduce runtime current consumption
        config.dcdc.reg1 = true;

        // Configure interrupt priorities to exclude 0 (default), 1, and 4,
        // which are reserved for the nrf SoftDevice
        config.gpiote_interrupt_priority = Priority::P2;
        config.time_interrupt_priority = Priority::P2;

        // Allow debugging
        config.debug = Debug::Allowed;

        config
    }
}
