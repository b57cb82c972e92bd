//! ADC helpers for STM32C0
//!
//! The internal temperature sensor is calibrated once in the factory; the
//! raw word is stored in system memory.

/// TS_CAL1: sensor reading at 30 °C, VDDA = 3.0 V
pub const TS_CAL1_ADDR: usize = 0x1FFF_7568;

/// Sample time for the temperature channel (longest available)
pub const TEMP_SAMPLE_TIME: embassy_stm32::adc::SampleTime =
    embassy_stm32::adc::SampleTime::CYCLES160_5;

/// Read the factory temperature calibration word
pub fn ts_cal1() -> u16 {
    // SAFETY: TS_CAL1_ADDR is a fixed, always-readable system memory word
    unsafe { core::ptr::read_volatile(TS_CAL1_ADDR as *const u16) }
}
