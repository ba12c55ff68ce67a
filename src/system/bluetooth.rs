//! Bluetooth module
//!
//! The companion app talks to the watch through the Crosswatch service:
//! it writes dictionaries to `inbox` and receives weather requests as
//! notifications on `outbox`. The standard Current Time characteristic sets
//! the clock.

// Core
use core::mem;

// BLE
use nrf_softdevice::{
    self,
    ble::{
        advertisement_builder::{
            Flag, LegacyAdvertisementBuilder, LegacyAdvertisementPayload, ServiceList,
            ServiceUuid16,
        },
        gatt_server, peripheral, Connection,
    },
    raw, Config, Softdevice,
};

// Others
use crosswatch::message::{self, MESSAGE_MAX_LEN};
use embassy_futures::select::{select, Either};
use heapless::Vec;

use crate::{INBOX, TIME_SET, WEATHER_REQUEST};

pub type MessageBytes = Vec<u8, MESSAGE_MAX_LEN>;

pub static ADV_DATA: LegacyAdvertisementPayload = LegacyAdvertisementBuilder::new()
    .flags(&[Flag::GeneralDiscovery, Flag::LE_Only])
    .services_16(ServiceList::Incomplete, &[ServiceUuid16::CURRENT_TIME])
    .full_name("Crosswatch")
    .build();

pub static SCAN_DATA: LegacyAdvertisementPayload = LegacyAdvertisementBuilder::new()
    .services_16(ServiceList::Incomplete, &[ServiceUuid16::CURRENT_TIME])
    .build();

#[nrf_softdevice::gatt_server]
pub struct Server {
    pub crosswatch: CrosswatchService,
    pub cts: CurrentTimeService,
}

#[nrf_softdevice::gatt_service(uuid = "5c3a0001-9f5b-4e53-8a3c-6f2b1d7e4a10")]
pub struct CrosswatchService {
    /// Dictionaries from the companion
    #[characteristic(uuid = "5c3a0002-9f5b-4e53-8a3c-6f2b1d7e4a10", write)]
    pub inbox: MessageBytes,
    /// Dictionaries to the companion
    #[characteristic(uuid = "5c3a0003-9f5b-4e53-8a3c-6f2b1d7e4a10", read, notify)]
    pub outbox: MessageBytes,
}

#[nrf_softdevice::gatt_service(uuid = "1805")]
pub struct CurrentTimeService {
    #[characteristic(uuid = "2a2b", write)]
    pub current_time: [u8; 10],
}

pub fn generate_config() -> Config {
    Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_RC as u8,
            rc_ctiv: 16,
            rc_temp_ctiv: 2,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_500_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: 1,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t { att_mtu: 256 }),
        gatts_attr_tab_size: Some(raw::ble_gatts_cfg_attr_tab_size_t {
            attr_tab_size: raw::BLE_GATTS_ATTR_TAB_SIZE_DEFAULT,
        }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 1,
            _bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: b"Crosswatch" as *const u8 as _,
            current_len: 10,
            max_len: 10,
            write_perm: unsafe { mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(
                raw::BLE_GATTS_VLOC_STACK as u8,
            ),
        }),
        ..Default::default()
    }
}

/// Advertise, serve one connection at a time, repeat
pub async fn run(sd: &'static Softdevice, server: &Server) -> ! {
    loop {
        let config = peripheral::Config::default();
        let adv = peripheral::ConnectableAdvertisement::ScannableUndirected {
            adv_data: &ADV_DATA,
            scan_data: &SCAN_DATA,
        };
        let conn = match peripheral::advertise_connectable(sd, adv, &config).await {
            Ok(conn) => conn,
            Err(e) => {
                defmt::error!("Advertising failed: {}", e);
                continue;
            }
        };
        defmt::info!("Companion connected");

        let serve = gatt_server::run(&conn, server, |event| match event {
            ServerEvent::Crosswatch(CrosswatchServiceEvent::InboxWrite(bytes)) => {
                if INBOX.try_send(bytes).is_err() {
                    defmt::error!("Message dropped!");
                }
            }
            ServerEvent::Crosswatch(CrosswatchServiceEvent::OutboxCccdWrite { notifications }) => {
                defmt::debug!("Outbox notifications: {}", notifications);
            }
            ServerEvent::Cts(CurrentTimeServiceEvent::CurrentTimeWrite(bytes)) => {
                TIME_SET.signal(bytes);
            }
        });

        match select(serve, forward_weather_requests(&conn, server)).await {
            Either::First(e) => defmt::info!("Companion disconnected: {:?}", e),
            Either::Second(_) => {}
        }
    }
}

/// Notify the companion whenever the face asks for weather
async fn forward_weather_requests(conn: &Connection, server: &Server) {
    loop {
        WEATHER_REQUEST.wait().await;

        let mut buf = [0u8; MESSAGE_MAX_LEN];
        let request = match message::weather_request(&mut buf) {
            Ok(bytes) => bytes,
            Err(e) => {
                defmt::error!("Encoding weather request failed: {}", e);
                continue;
            }
        };
        let Ok(value) = MessageBytes::from_slice(request) else {
            continue;
        };

        match server.crosswatch.outbox_notify(conn, &value) {
            Ok(()) => defmt::info!("Outbox send success!"),
            Err(e) => defmt::error!("Outbox send failed: {}", e),
        }
    }
}
