#![no_std]
#![no_main]

mod peripherals;
mod system;

// Panic handler and debugging
use defmt::unwrap;

use defmt_rtt as _;
use panic_probe as _;

// Device
use embassy_executor::Spawner;
use embassy_nrf::{
    bind_interrupts,
    gpio::{Level, Output, OutputDrive},
    peripherals::SPI2,
    spim,
};
use embassy_sync::{blocking_mutex::raw::ThreadModeRawMutex, channel::Channel, signal::Signal};
use embassy_time::{Duration, Ticker};
use nrf_softdevice::{Flash, Softdevice};
use static_cell::StaticCell;

bind_interrupts!(struct Irqs {
    SPIM2_SPIS2_SPI2 => spim::InterruptHandler<SPI2>;
});

// Crate
use crosswatch::{ui::Face, Crosswatch, Message, MinuteTicker};
use peripherals::{backlight::Backlight, display::Display};
use system::{
    bluetooth::{self, MessageBytes, Server},
    config::{SystemConfig, BACKLIGHT_LEVEL, HOUR_FORMAT, SKIN, UTC_OFFSET},
    flash::SettingsFlash,
    time::{TimeManager, TimeReference},
};

// Others
use chrono::{NaiveDateTime, Timelike};

// Include build time UTC epoch
include!(concat!(env!("OUT_DIR"), "/utc.rs"));

// Communication channels
pub(crate) static INBOX: Channel<ThreadModeRawMutex, MessageBytes, 4> = Channel::new();
pub(crate) static TIME_SET: Signal<ThreadModeRawMutex, [u8; 10]> = Signal::new();
pub(crate) static WEATHER_REQUEST: Signal<ThreadModeRawMutex, ()> = Signal::new();
static TICK: Signal<ThreadModeRawMutex, NaiveDateTime> = Signal::new();

static SERVER: StaticCell<Server> = StaticCell::new();

#[embassy_executor::task]
async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}

#[embassy_executor::task]
async fn ble_task(sd: &'static Softdevice, server: &'static Server) -> ! {
    bluetooth::run(sd, server).await
}

/// Keep the clock and signal every new minute.
#[embassy_executor::task(pool_size = 1)]
async fn update_time(mut clock: TimeManager) {
    let mut minutes = MinuteTicker::new();
    let mut tick = Ticker::every(Duration::from_secs(1));
    loop {
        if TIME_SET.signaled() {
            let bytes = TIME_SET.wait().await;
            match TimeReference::from_cts_bytes(&bytes) {
                Ok(reference) => {
                    defmt::info!("Clock set by companion");
                    clock.set_time(reference);
                }
                Err(e) => defmt::warn!("Ignoring current time: {}", e),
            }
        }

        match clock.get_time() {
            Some(now) => {
                if let Some(now) = minutes.poll(now) {
                    defmt::debug!("Minute tick {}:{}", now.hour(), now.minute());
                    TICK.signal(now);
                }
            }
            None => defmt::error!("Clock out of range"),
        }

        // Re-schedule the timer interrupt in 1s
        tick.next().await;
    }
}

/// Apply ticks and messages to the face state, persist and redraw.
#[embassy_executor::task(pool_size = 1)]
async fn update_face(
    mut display: Display<SPI2>,
    mut flash: SettingsFlash,
    backlight: Backlight<'static>,
) {
    defmt::info!("Backlight at level {}", backlight.brightness());
    let mut store = flash.load().await;
    let mut watch = Crosswatch::load(SKIN, &store);
    let face = Face::new(SKIN, display.bounds());

    let mut tick = Ticker::every(Duration::from_millis(250));
    loop {
        if TICK.signaled() {
            let now = TICK.wait().await;
            if watch.tick(&now, HOUR_FORMAT).request_weather {
                defmt::info!("Requesting weather");
                WEATHER_REQUEST.signal(());
            }
        }

        while let Ok(bytes) = INBOX.try_receive() {
            match Message::parse(&bytes) {
                Ok(message) => {
                    let outcome = watch.receive(&message, &mut store);
                    defmt::debug!(
                        "Message applied: settings {}, weather {}",
                        outcome.settings_changed,
                        outcome.weather_changed
                    );
                }
                Err(e) => defmt::error!("Message dropped: {}", e),
            }
        }

        if store.is_dirty() {
            match flash.save(&store).await {
                Ok(()) => store.mark_clean(),
                Err(e) => defmt::error!("Saving settings failed: {}", e),
            }
        }

        if watch.take_redraw() {
            if let Err(e) = display.draw(&face, &watch.face_state()) {
                defmt::error!("Drawing face failed: {}", e);
            }
        }

        tick.next().await;
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_nrf::init(SystemConfig::new());
    defmt::info!("Initializing");

    // Initialize Bluetooth
    let sd = Softdevice::enable(&bluetooth::generate_config());
    let server = SERVER.init(unwrap!(Server::new(sd)));
    let sd: &'static Softdevice = sd;
    unwrap!(spawner.spawn(softdevice_task(sd)));

    // Initialize settings flash
    let flash = SettingsFlash::init(Flash::take(sd));

    // Initialize clock
    let clock = TimeManager::init(unwrap!(TimeReference::from_epoch(BUILD_EPOCH, UTC_OFFSET)));

    // Initialize SPI
    let mut spim_config = spim::Config::default();
    // Use SPI at 8MHz (the fastest clock available on the nRF52832),
    // otherwise refreshing will be super slow.
    spim_config.frequency = spim::Frequency::M8;
    // SPI must be used in mode 3. Mode 0 (the default) won't work.
    spim_config.mode = spim::MODE_3;

    let spim = spim::Spim::new(p.SPI2, Irqs, p.P0_02, p.P0_04, p.P0_03, spim_config);

    // Initialize LCD
    let display = unwrap!(Display::init(
        spim,
        Output::new(p.P0_25, Level::Low, OutputDrive::Standard),
        Output::new(p.P0_18, Level::Low, OutputDrive::Standard),
        Output::new(p.P0_26, Level::Low, OutputDrive::Standard),
    ));

    // Initialize Backlight
    let backlight = unwrap!(Backlight::init(
        Output::new(p.P0_14, Level::High, OutputDrive::Standard),
        Output::new(p.P0_22, Level::High, OutputDrive::Standard),
        Output::new(p.P0_23, Level::High, OutputDrive::Standard),
        BACKLIGHT_LEVEL,
    ));

    defmt::info!("Initialization finished");

    // Schedule tasks
    unwrap!(spawner.spawn(ble_task(sd, server)));
    unwrap!(spawner.spawn(update_time(clock)));
    unwrap!(spawner.spawn(update_face(display, flash, backlight)));
}
