//! Superloop
//!
//! Owns every component and services them in a fixed order on each pass:
//! transmit completions and pumps, received bytes, console lines, display
//! frames, then the periodic work, the sample servo sequence and the power
//! state machine. Nothing in
//! a pass blocks; only self-diagnostics and stop mode wait.

use core::fmt::Write;

use defmt::*;
use embassy_futures::yield_now;
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::Output;
use embassy_time::{Instant, Timer};
use heapless::String;

use granum_core::config::record::SERIAL_LEN;
use granum_core::config::{Crc32, RECORD_SIZE};
use granum_core::console::{Console, ConsoleContext};
use granum_core::scheduler::{MeasurementScheduler, Measurements};
use granum_core::state::{PowerAction, PowerManager, PowerState, SampleEvent, SampleSequence};
use granum_core::storage::PagedWriter;
use granum_core::traits::{
    ClockError, Date, DisplaySink, SensorError, Time, WallClock, WeightSensor,
};
use granum_core::ui::{self, page, vp, KeyEvent};
use granum_protocol::DisplayMessage;

use crate::board::{
    Board, Clock, ConsolePump, Display, Eeprom, FrequencyInput, SampleServo, Scale, Store,
    Thermometer,
};
use crate::channels::{RxEvent, CONSOLE_RX, CONSOLE_TX_DONE, DISPLAY_RX, DISPLAY_TX_DONE};

/// Logo time before the diagnostics pages
const LOGO_MS: u64 = 3000;

/// Display start-up time after power is restored
const DISPLAY_POWER_UP_MS: u64 = 500;

/// Superloop period
const LOOP_MS: u64 = 1;

/// Monotonic milliseconds, wrapping like a 32-bit tick
fn now_ms() -> u32 {
    Instant::now().as_millis() as u32
}

pub struct App {
    console: Console,
    console_pump: ConsolePump,
    display: Display,
    store: Store,
    writer: PagedWriter<RECORD_SIZE>,
    eeprom: Eeprom,
    scale: Scale,
    thermometer: Thermometer,
    frequency: FrequencyInput,
    clock: Clock,
    gate: SampleServo,
    scraper: SampleServo,
    sample: SampleSequence,
    scheduler: MeasurementScheduler,
    power: PowerManager,
    /// Page last requested on the display
    page: u16,
    touch: ExtiInput<'static>,
    display_power: Output<'static>,
}

impl App {
    pub fn new(board: Board) -> Self {
        Self {
            console: Console::new(),
            console_pump: board.console_pump,
            display: board.display,
            store: Store::new(Crc32),
            writer: PagedWriter::new(),
            eeprom: board.eeprom,
            scale: board.scale,
            thermometer: board.thermometer,
            frequency: board.frequency,
            clock: board.clock,
            gate: board.gate,
            scraper: board.scraper,
            sample: SampleSequence::new(),
            scheduler: MeasurementScheduler::new(),
            power: PowerManager::new(),
            page: page::LOGO,
            touch: board.touch,
            display_power: board.display_power,
        }
    }

    /// Load the configuration and run the boot diagnostics
    pub async fn start(&mut self) {
        self.console.banner(&mut self.console_pump).ok();

        write!(self.console_pump, "Loading configuration... ").ok();
        if self.store.validate_and_restore(&mut self.eeprom) {
            info!("Configuration restored");
            writeln!(self.console_pump, "[OK]").ok();
        } else {
            warn!("No valid configuration replica, factory defaults loaded");
            writeln!(self.console_pump, "[WARNING] Factory defaults restored.").ok();
        }

        if !self.run_diagnostics(page::MAIN).await {
            error!("Boot diagnostics failed");
        }
    }

    pub async fn run(&mut self) -> ! {
        info!("Superloop running");

        loop {
            let now = now_ms();

            self.service_tx();
            self.service_rx();
            self.run_console();

            if let Some(key) = self.poll_display() {
                self.on_key(key).await;
            }

            if self.power.state() == PowerState::Active {
                self.run_periodic(now);
            }

            let action = self.power.poll(now);
            self.on_power(action).await;

            self.service_tx();
            Timer::after_millis(LOOP_MS).await;
        }
    }

    /// Collect transmit completions and start the next bursts
    fn service_tx(&mut self) {
        if CONSOLE_TX_DONE.try_take().is_some() {
            self.console_pump.on_tx_complete();
        }
        if DISPLAY_TX_DONE.try_take().is_some() {
            self.display.pump().on_tx_complete();
        }

        if let Err(e) = self.console_pump.pump() {
            warn!("Console burst not started: {:?}", e);
        }
        if let Err(e) = self.display.pump().pump() {
            warn!("Display burst not started: {:?}", e);
        }
    }

    fn service_rx(&mut self) {
        while let Ok(event) = CONSOLE_RX.try_receive() {
            match event {
                RxEvent::Data(bytes) => {
                    for &byte in &bytes {
                        self.console.on_rx_byte(byte, &mut self.console_pump).ok();
                    }
                }
                RxEvent::Error => warn!("Console UART error"),
            }
        }

        while let Ok(event) = DISPLAY_RX.try_receive() {
            match event {
                RxEvent::Data(bytes) => self.display.receiver().on_rx_event(&bytes),
                RxEvent::Error => {
                    warn!("Display UART error");
                    self.display.receiver().on_error();
                }
            }
        }
    }

    fn run_console(&mut self) {
        if !self.console.has_pending_line() {
            return;
        }

        let mut env = ConsoleEnv {
            scheduler: &self.scheduler,
            thermometer: &mut self.thermometer,
            store: &self.store,
            clock: &mut self.clock,
            display: &mut self.display,
        };
        if self.console.process(&mut env, &mut self.console_pump).is_err() {
            warn!("Console reply truncated");
        }
    }

    /// Dispatch one complete display frame
    fn poll_display(&mut self) -> Option<KeyEvent> {
        let mut key = None;
        let mut handler = |frame: &[u8]| match DisplayMessage::decode(frame) {
            Ok(DisplayMessage::Report(report)) => {
                key = KeyEvent::from_report(&report);
                if key.is_none() {
                    debug!("Unhandled VP report {=u16:#x}", report.vp);
                }
            }
            Ok(DisplayMessage::WriteAck) => {}
            Err(e) => warn!("Bad display frame: {:?}", e),
        };
        self.display.receiver().process(&mut handler);
        key
    }

    async fn on_key(&mut self, key: KeyEvent) {
        debug!("Key: {:?}", key);

        match key {
            KeyEvent::ConfirmWakeup => {
                let action = self.power.confirm();
                self.on_power(action).await;
            }
            KeyEvent::Sleep => self.power.request_sleep(),
            KeyEvent::OpenMonitor => self.show(page::MONITOR),
            KeyEvent::OpenAdjust => self.show(page::ADJUST_CAPACITANCE),
            KeyEvent::Escape => self.show(page::MAIN),
            KeyEvent::Diagnostics => {
                let back = self.page;
                self.run_diagnostics(back).await;
            }
            KeyEvent::StartProcess => {
                if self.sample.start() {
                    info!("Sample sequence requested");
                    writeln!(self.console_pump, "Start process received.").ok();
                } else {
                    debug!("Sample sequence already running");
                }
            }
        }
    }

    /// Sensor sampling, display refresh, clock and configuration write-back
    fn run_periodic(&mut self, now: u32) {
        self.scheduler
            .update_frequency(now, &mut self.frequency, self.store.calibration());

        match self.scheduler.update_weight(&mut self.scale) {
            Ok(_) => {}
            Err(SensorError::NotReady) => {}
            Err(e) => debug!("Scale read failed: {:?}", e),
        }

        if let Err(e) =
            self.scheduler
                .update_display(now, self.page, &mut self.display, &mut self.thermometer)
        {
            warn!("Monitor refresh failed: {:?}", e);
        }

        if let Err(e) = self.clock.update() {
            debug!("Calendar read failed: {:?}", Debug2Format(&e));
        }
        if let Err(e) = self
            .scheduler
            .update_clock(now, self.page, &mut self.display, &self.clock)
        {
            warn!("Clock refresh failed: {:?}", e);
        }

        match self.sample.poll(now, &mut self.gate, &mut self.scraper) {
            Ok(SampleEvent::None) => {}
            Ok(SampleEvent::Step(step)) => debug!("Sample step: {:?}", step),
            Ok(SampleEvent::Finished) => {
                info!("Sample sequence finished");
                writeln!(self.console_pump, "Sample sequence finished.").ok();
            }
            Err(e) => {
                error!("Servo sequence aborted: {:?}", e);
                writeln!(self.console_pump, "[ERROR] Servo sequence aborted.").ok();
            }
        }

        self.writer.poll(&mut self.eeprom, now);
        self.store.run_fsm(&mut self.writer, &mut self.eeprom, now);
        if let Some(e) = self.store.take_write_error() {
            error!("Configuration write failed: {:?}", e);
            writeln!(self.console_pump, "[ERROR] Configuration write failed.").ok();
        }
    }

    async fn on_power(&mut self, action: PowerAction) {
        match action {
            PowerAction::None => {}
            PowerAction::EnterStop => self.enter_stop().await,
            PowerAction::Countdown(seconds) => {
                debug!("Wake-up countdown: {}", seconds);
                writeln!(self.console_pump, "Time left: {}", seconds).ok();
                if let Err(e) = self.display.write_i16(vp::COUNTDOWN, seconds as i16) {
                    warn!("Countdown not sent: {:?}", e);
                }
            }
            PowerAction::Resume => {
                info!("Wake-up confirmed");
                writeln!(self.console_pump, "Confirmed. Back to active mode.").ok();
                self.run_diagnostics(page::MAIN).await;
            }
        }
    }

    /// Drain both pumps, power the display down and wait for a touch
    async fn enter_stop(&mut self) {
        info!("Entering stop mode");
        writeln!(self.console_pump, "Entering stop mode...").ok();
        self.flush().await;

        self.display_power.set_low();
        self.touch.wait_for_falling_edge().await;
        self.display_power.set_high();
        Timer::after_millis(DISPLAY_POWER_UP_MS).await;

        // Edges counted around the stop do not belong to any sampling window
        self.frequency.discard();

        info!("Touch wake-up");
        writeln!(self.console_pump, "Woken by touch. Waiting for confirmation.").ok();
        if self.power.on_wakeup(now_ms()) {
            self.show(page::CONFIRM_WAKEUP);
        }
    }

    /// Wait until both transmit pumps are empty
    async fn flush(&mut self) {
        while self.console_pump.is_busy() || self.display.is_busy() {
            self.service_tx();
            yield_now().await;
        }
    }

    fn show(&mut self, id: u16) {
        self.page = id;
        if let Err(e) = self.display.set_page(id) {
            warn!("Page {} not sent: {:?}", id, e);
        }
    }

    /// Walk the boot pages, checking each subsystem
    ///
    /// Ends on `return_page`, or on the error page when the EEPROM does not
    /// answer.
    async fn run_diagnostics(&mut self, return_page: u16) -> bool {
        info!("Self-diagnostics started");
        writeln!(self.console_pump, "\n>>> SELF-DIAGNOSTICS <<<").ok();

        self.show(page::LOGO);
        self.flush().await;
        Timer::after_millis(LOGO_MS).await;

        let serial = self.store.serial();
        let info = [
            (vp::HARDWARE_VERSION, ui::HARDWARE_VERSION),
            (vp::FIRMWARE_VERSION, ui::FIRMWARE_VERSION),
            (vp::SERIAL, serial.as_str()),
        ];
        for (address, text) in info {
            if let Err(e) = self.display.write_text(address, text, vp::INFO_WIDTH) {
                warn!("Boot info not sent: {:?}", e);
            }
        }
        self.flush().await;

        if let Err(e) = SampleSequence::park(&mut self.gate, &mut self.scraper) {
            warn!("Servo park failed: {:?}", e);
            writeln!(self.console_pump, "   ... servos not responding").ok();
        }
        self.step(page::BOOT_SERVOS, "servos", 1200).await;
        self.step(page::BOOT_CAPACITANCE, "frequency meter", 1200).await;

        if self.scale.tare().is_err() {
            writeln!(self.console_pump, "   ... tare not accepted").ok();
        }
        self.step(page::BOOT_BALANCE, "scale", 1000).await;

        match self.thermometer.read() {
            Ok(celsius) => {
                self.scheduler.set_instrument_temp(celsius);
                writeln!(self.console_pump, "   ... temperature: {:.2} C", celsius).ok();
            }
            Err(e) => {
                warn!("Thermometer check failed: {:?}", e);
                writeln!(self.console_pump, "   ... temperature unavailable").ok();
            }
        }
        self.step(page::BOOT_THERMOMETER, "thermometer", 1000).await;

        self.step(page::BOOT_MEMORY, "EEPROM", 0).await;
        if !self.eeprom.is_ready() {
            error!("EEPROM not responding");
            writeln!(self.console_pump, "   ... FAILED: EEPROM not responding.").ok();
            self.show(page::ERROR);
            self.flush().await;
            return false;
        }
        writeln!(self.console_pump, "   ... EEPROM OK.").ok();
        Timer::after_millis(1100).await;

        self.step(page::BOOT_CLOCK, "clock", 1100).await;

        info!("Self-diagnostics complete");
        writeln!(self.console_pump, ">>> SELF-DIAGNOSTICS COMPLETE <<<\n").ok();
        self.show(return_page);
        self.flush().await;
        true
    }

    async fn step(&mut self, id: u16, what: &str, hold_ms: u64) {
        writeln!(self.console_pump, "Checking {}...", what).ok();
        self.show(id);
        self.flush().await;
        Timer::after_millis(hold_ms).await;
    }
}

/// Console view of the running instrument
struct ConsoleEnv<'a> {
    scheduler: &'a MeasurementScheduler,
    thermometer: &'a mut Thermometer,
    store: &'a Store,
    clock: &'a mut Clock,
    display: &'a mut Display,
}

impl ConsoleContext for ConsoleEnv<'_> {
    type Display = Display;

    fn measurements(&self) -> Measurements {
        self.scheduler.measurements()
    }

    fn instrument_temperature(&mut self) -> Result<f32, SensorError> {
        self.thermometer.read()
    }

    fn serial(&self) -> String<SERIAL_LEN> {
        self.store.serial()
    }

    fn set_time(&mut self, time: Time) -> Result<(), ClockError> {
        self.clock.set_time(time)
    }

    fn set_date(&mut self, date: Date) -> Result<(), ClockError> {
        self.clock.set_date(date)
    }

    fn display(&mut self) -> &mut Display {
        self.display
    }
}
