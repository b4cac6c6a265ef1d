//! Blocking delay that yields to FreeRTOS.

use esp_idf_hal::delay::FreeRtos;

use crate::traits::Delay;

/// Delay backed by `vTaskDelay`, so the idle task and the network stack
/// keep running while the controller waits.
#[derive(Debug, Default, Clone, Copy)]
pub struct Esp32Delay;

impl Delay for Esp32Delay {
    #[inline]
    fn delay_ms(&mut self, ms: u32) {
        FreeRtos::delay_ms(ms);
    }
}
