//! Settings page in internal flash
//!
//! Flash access goes through the SoftDevice so that erasing and writing do
//! not disturb an active BLE connection.

use crosswatch::storage::{MemoryStore, PageImage, StoreError};
use embedded_storage_async::nor_flash::{NorFlash, ReadNorFlash};
use nrf_softdevice::{Flash, FlashError};

use super::config::{FLASH_PAGE_SIZE, SETTINGS_PAGE};

#[derive(Debug, defmt::Format)]
pub enum Error {
    Store(StoreError),
    Flash(FlashError),
}

pub struct SettingsFlash {
    /// SoftDevice flash driver
    flash: Flash,
}

impl SettingsFlash {
    /// Configure flash access on boot
    pub fn init(flash: Flash) -> Self {
        Self { flash }
    }

    /// Read the persisted settings, starting empty if there are none
    pub async fn load(&mut self) -> MemoryStore {
        let mut page = PageImage::erased();
        if let Err(e) = self.flash.read(SETTINGS_PAGE, &mut page.0).await {
            defmt::warn!("Reading settings failed: {}", e);
            return MemoryStore::new();
        }

        match MemoryStore::from_page(&page.0) {
            Ok(store) => {
                defmt::info!("Loaded {} settings", store.len());
                store
            }
            Err(StoreError::Unformatted) => {
                defmt::info!("No saved settings");
                MemoryStore::new()
            }
            Err(e) => {
                defmt::warn!("Discarding saved settings: {}", e);
                MemoryStore::new()
            }
        }
    }

    /// Replace the settings page with the contents of `store`
    pub async fn save(&mut self, store: &MemoryStore) -> Result<(), Error> {
        let mut page = PageImage::erased();
        let len = store.to_page(&mut page.0).map_err(Error::Store)?;

        self.flash
            .erase(SETTINGS_PAGE, SETTINGS_PAGE + FLASH_PAGE_SIZE)
            .await
            .map_err(Error::Flash)?;
        self.flash
            .write(SETTINGS_PAGE, &page.0[..len])
            .await
            .map_err(Error::Flash)?;

        defmt::debug!("Saved {} bytes of settings", len);
        Ok(())
    }
}
