//! Crosswatch watchface
//!
//! Hardware independent parts of the watchface: settings, the companion
//! message dictionary, persisted storage, the minute state machine and the
//! two face skins. The PineTime firmware in `main.rs` wires these to the
//! display, the BLE stack and the internal flash.

#![cfg_attr(not(test), no_std)]

// This mod MUST go first, so that the others see its macros.
#[macro_use]
mod fmt;

pub mod clock;
pub mod message;
pub mod settings;
pub mod storage;
pub mod ui;
pub mod watchface;

pub use clock::{HourFormat, MinuteTicker};
pub use message::{DictWriter, Message, MessageKey};
pub use settings::{Settings, Skin};
pub use storage::{MemoryStore, Record, Store};
pub use watchface::Crosswatch;
