//! Board wiring for the STM32C071RB main board
//!
//! | Function            | Peripheral | Pins            |
//! |---------------------|------------|-----------------|
//! | Diagnostic console  | USART1     | PA9 TX, PA10 RX |
//! | DWIN display        | USART2     | PA2 TX, PA3 RX  |
//! | Config EEPROM       | I2C1       | PB6 SCL, PB7 SDA|
//! | Load cell ADC       | GPIO       | PC5 DOUT, PC4 SCLK |
//! | Frequency sensor    | TIM2 ETR   | PA0             |
//! | Sample servos       | TIM3       | PA6 gate, PA7 scraper |
//! | Calendar            | RTC        |                 |
//! | Touch wake-up       | EXTI13     | PC13            |
//! | Display power       | GPIO       | PB2             |

use embassy_stm32::adc::{Adc, Temperature};
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{Input, Output};
use embassy_stm32::i2c::{I2c, Master};
use embassy_stm32::mode::Blocking;
use embassy_stm32::peripherals::{ADC1, TIM3};
use embassy_stm32::rtc::{self, DayOfWeek, Rtc, RtcError, RtcTimeProvider};
use embassy_stm32::timer::simple_pwm::SimplePwmChannel;
use embassy_time::Delay;

use granum_core::config::{ConfigStore, Crc32};
use granum_core::io::{DisplayTransport, TxPump};
use granum_core::traits::{Date, DateTime, FrequencyCounter, Time};
use granum_drivers::clock::{Calendar, RtcClock};
use granum_drivers::eeprom::At24c;
use granum_drivers::scale::Ads1232;
use granum_drivers::sensor::{AdcReader, CounterLatch, InternalTemperature, PulseCounter};
use granum_drivers::servo::PwmServo;
use granum_hal_stm32c0::counter::EdgeCounter;
use granum_hal_stm32c0::uart::{CONSOLE_BURST, DISPLAY_BURST};

use crate::bridge::ChannelTx;

/// Console transmit queue
pub const CONSOLE_QUEUE: usize = 1024;
/// Display transmit queue
pub const DISPLAY_QUEUE: usize = 512;

pub type ConsolePump = TxPump<ChannelTx<CONSOLE_BURST>, CONSOLE_QUEUE, CONSOLE_BURST>;
pub type Display = DisplayTransport<ChannelTx<DISPLAY_BURST>, DISPLAY_QUEUE, DISPLAY_BURST>;
pub type Eeprom = At24c<I2c<'static, Blocking, Master>>;
pub type Scale = Ads1232<Input<'static>, Output<'static>, Delay>;
pub type Thermometer = InternalTemperature<TempChannel>;
pub type Store = ConfigStore<Crc32>;
pub type Clock = RtcClock<RtcCalendar>;
pub type SampleServo = PwmServo<SimplePwmChannel<'static, TIM3>>;

/// ADC1 wired to the internal temperature channel
pub struct TempChannel {
    adc: Adc<'static, ADC1>,
    channel: Temperature,
}

impl TempChannel {
    pub fn new(mut adc: Adc<'static, ADC1>) -> Self {
        adc.set_sample_time(granum_hal_stm32c0::adc::TEMP_SAMPLE_TIME);
        let channel = adc.enable_temperature();
        Self { adc, channel }
    }
}

impl AdcReader for TempChannel {
    fn read(&mut self) -> Result<u16, ()> {
        Ok(self.adc.blocking_read(&mut self.channel))
    }
}

/// The RTC calendar; years count from 2000
pub struct RtcCalendar {
    rtc: Rtc,
    time: RtcTimeProvider,
}

impl RtcCalendar {
    pub fn new(rtc: Rtc, time: RtcTimeProvider) -> Self {
        Self { rtc, time }
    }
}

impl Calendar for RtcCalendar {
    type Error = RtcError;

    fn read(&mut self) -> Result<DateTime, RtcError> {
        let now = self.time.now()?;
        Ok(DateTime {
            date: Date {
                day: now.day(),
                month: now.month(),
                year: now.year().saturating_sub(2000).min(u8::MAX as u16) as u8,
            },
            time: Time {
                hours: now.hour(),
                minutes: now.minute(),
                seconds: now.second(),
            },
        })
    }

    fn write(&mut self, now: &DateTime) -> Result<(), RtcError> {
        let weekday = match now.date.weekday() {
            1 => DayOfWeek::Monday,
            2 => DayOfWeek::Tuesday,
            3 => DayOfWeek::Wednesday,
            4 => DayOfWeek::Thursday,
            5 => DayOfWeek::Friday,
            6 => DayOfWeek::Saturday,
            _ => DayOfWeek::Sunday,
        };
        let stamp = rtc::DateTime::from(
            2000 + now.date.year as u16,
            now.date.month,
            now.date.day,
            weekday,
            now.time.hours,
            now.time.minutes,
            now.time.seconds,
            0,
        )
        .map_err(RtcError::InvalidDateTime)?;
        self.rtc.set_datetime(stamp)
    }
}

/// TIM2 edge counter latched into a pulse total when sampled
pub struct FrequencyInput {
    edges: EdgeCounter<'static>,
    latch: CounterLatch,
    pulses: PulseCounter,
}

impl FrequencyInput {
    pub fn new(edges: EdgeCounter<'static>) -> Self {
        let latch = CounterLatch::new(edges.count());
        Self {
            edges,
            latch,
            pulses: PulseCounter::new(),
        }
    }

    /// Drop edges counted outside a sampling window
    pub fn discard(&mut self) {
        self.take_pulse_count();
    }
}

impl FrequencyCounter for FrequencyInput {
    fn take_pulse_count(&mut self) -> u32 {
        self.latch.latch(self.edges.count(), &self.pulses);
        self.pulses.take()
    }
}

/// Peripherals handed to the superloop
pub struct Board {
    pub console_pump: ConsolePump,
    pub display: Display,
    pub eeprom: Eeprom,
    pub scale: Scale,
    pub thermometer: Thermometer,
    pub frequency: FrequencyInput,
    pub clock: Clock,
    pub gate: SampleServo,
    pub scraper: SampleServo,
    /// Falls when the panel is touched
    pub touch: ExtiInput<'static>,
    /// High powers the display
    pub display_power: Output<'static>,
}
