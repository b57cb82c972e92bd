//! Display page IDs and VP addresses
//!
//! These match the screen project loaded into the DWIN panel.

use granum_protocol::VpReport;

/// Page IDs
pub mod page {
    pub const LOGO: u16 = 0;
    pub const MAIN: u16 = 1;
    pub const MONITOR: u16 = 2;
    pub const ADJUST_CAPACITANCE: u16 = 3;
    pub const SERVICE: u16 = 4;
    pub const CONFIRM_WAKEUP: u16 = 5;
    pub const BOOT_SERVOS: u16 = 10;
    pub const BOOT_CAPACITANCE: u16 = 11;
    pub const BOOT_BALANCE: u16 = 12;
    pub const BOOT_THERMOMETER: u16 = 13;
    pub const BOOT_MEMORY: u16 = 14;
    pub const BOOT_CLOCK: u16 = 15;
    pub const ERROR: u16 = 20;
}

/// Variable addresses
pub mod vp {
    /// Frequency in kHz x10, int32
    pub const FREQUENCY: u16 = 0x2000;
    /// Scale A x10, int32
    pub const SCALE_A: u16 = 0x2002;
    /// Instrument temperature in °C x10, int16
    pub const INSTRUMENT_TEMP: u16 = 0x2004;
    /// "HH:MM:SS"
    pub const CLOCK_TIME: u16 = 0x2010;
    /// "DD/MM/YY"
    pub const CLOCK_DATE: u16 = 0x2018;
    /// Wake-up confirmation countdown, int16
    pub const COUNTDOWN: u16 = 0x2020;
    pub const HARDWARE_VERSION: u16 = 0x2030;
    pub const FIRMWARE_VERSION: u16 = 0x2040;
    pub const SERIAL: u16 = 0x2050;

    /// Width of clock text fields
    pub const CLOCK_WIDTH: u8 = 8;
    /// Width of version and serial text fields
    pub const INFO_WIDTH: u8 = 16;

    /// Touch key uploads (key code in the value word)
    pub const KEY_WAKE_CONFIRM: u16 = 0x1000;
    pub const KEY_SLEEP: u16 = 0x1002;
    pub const KEY_MONITOR: u16 = 0x1004;
    pub const KEY_ADJUST_CAPACITANCE: u16 = 0x1006;
    pub const KEY_ESCAPE: u16 = 0x1008;
    pub const KEY_DIAGNOSTIC: u16 = 0x100A;
    /// Start the sample servo sequence
    pub const KEY_START_PROCESS: u16 = 0x1500;
}

/// Touch keys the controller acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyEvent {
    ConfirmWakeup,
    Sleep,
    OpenMonitor,
    OpenAdjust,
    Escape,
    Diagnostics,
    StartProcess,
}

impl KeyEvent {
    /// Map a VP report to a key; other VPs belong to screen handlers
    pub fn from_report(report: &VpReport) -> Option<Self> {
        match report.vp {
            vp::KEY_WAKE_CONFIRM => Some(KeyEvent::ConfirmWakeup),
            vp::KEY_SLEEP => Some(KeyEvent::Sleep),
            vp::KEY_MONITOR => Some(KeyEvent::OpenMonitor),
            vp::KEY_ADJUST_CAPACITANCE => Some(KeyEvent::OpenAdjust),
            vp::KEY_ESCAPE => Some(KeyEvent::Escape),
            vp::KEY_DIAGNOSTIC => Some(KeyEvent::Diagnostics),
            vp::KEY_START_PROCESS => Some(KeyEvent::StartProcess),
            _ => None,
        }
    }
}

/// Hardware revision shown at boot
pub const HARDWARE_VERSION: &str = "1.00";
/// Firmware version shown at boot
pub const FIRMWARE_VERSION: &str = env!("CARGO_PKG_VERSION");
