//! Granum - Grain Moisture Meter Firmware
//!
//! Main firmware binary for the STM32C071RB main board. Small embassy tasks
//! move UART bytes; sensor edges are counted by TIM2 in hardware; everything
//! else runs in one cooperative superloop.
//!
//! Named after the Latin "granum" (grain).

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_stm32::adc::Adc;
use embassy_stm32::bind_interrupts;
use embassy_stm32::exti::{self, ExtiInput};
use embassy_stm32::gpio::{Input, Level, Output, OutputType, Pull, Speed};
use embassy_stm32::i2c::I2c;
use embassy_stm32::peripherals::{USART1, USART2};
use embassy_stm32::rcc::LsConfig;
use embassy_stm32::rtc::{Rtc, RtcConfig};
use embassy_stm32::timer::simple_pwm::{PwmPin, SimplePwm};
use embassy_stm32::usart::{self, Uart};
use embassy_time::Delay;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use granum_core::io::{DisplayTransport, TxPump};
use granum_drivers::clock::RtcClock;
use granum_drivers::eeprom::At24c;
use granum_drivers::scale::{Ads1232, ScaleCalibration};
use granum_drivers::sensor::{InternalTemperature, TempCalibration};
use granum_drivers::servo::{PwmServo, ServoCalibration};
use granum_hal_stm32c0::adc::ts_cal1;
use granum_hal_stm32c0::counter::EdgeCounter;
use granum_hal_stm32c0::i2c::I2cConfig;
use granum_hal_stm32c0::servo::{SERVO_COUNTING, SERVO_FRAME};
use granum_hal_stm32c0::uart::UartConfig;

use crate::app::App;
use crate::board::{Board, FrequencyInput, RtcCalendar, TempChannel};
use crate::bridge::ChannelTx;
use crate::channels::{CONSOLE_RX, CONSOLE_TX, DISPLAY_RX, DISPLAY_TX};

mod app;
mod board;
mod bridge;
mod channels;
mod tasks;

bind_interrupts!(struct Irqs {
    USART1 => usart::InterruptHandler<USART1>;
    USART2 => usart::InterruptHandler<USART2>;
    EXTI4_15 => exti::InterruptHandler<embassy_stm32::interrupt::typelevel::EXTI4_15>;
});

// The superloop state holds both transmit queues; keep it off the stack
static APP: StaticCell<App> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Granum firmware starting...");

    let mut config = embassy_stm32::Config::default();
    config.rcc.ls = LsConfig::default_lsi();
    let p = embassy_stm32::init(config);

    // Console on USART1 (PA9=TX, PA10=RX)
    let console = Uart::new(
        p.USART1,
        p.PA10,
        p.PA9,
        Irqs,
        p.DMA1_CH1,
        p.DMA1_CH2,
        usart::Config::from(UartConfig::console()),
    )
    .unwrap();
    let (console_tx, console_rx) = console.split();

    // DWIN display on USART2 (PA2=TX, PA3=RX)
    let display = Uart::new(
        p.USART2,
        p.PA3,
        p.PA2,
        Irqs,
        p.DMA1_CH3,
        p.DMA1_CH4,
        usart::Config::from(UartConfig::display()),
    )
    .unwrap();
    let (display_tx, display_rx) = display.split();

    // Configuration EEPROM on I2C1 (PB6=SCL, PB7=SDA)
    let i2c = I2c::new_blocking(p.I2C1, p.PB6, p.PB7, I2cConfig::default().into());
    let eeprom = At24c::at24c32(i2c);

    // Load cell ADC (PC5=DOUT, PC4=SCLK)
    let dout = Input::new(p.PC5, Pull::None);
    let sclk = Output::new(p.PC4, Level::Low, Speed::Medium);
    let scale = Ads1232::new(dout, sclk, Delay, ScaleCalibration::default());

    // MCU temperature on ADC1
    let cal = TempCalibration { ts_cal1: ts_cal1() };
    if !cal.is_valid() {
        warn!("TS_CAL1 missing, temperature readings disabled");
    }
    let thermometer = InternalTemperature::new(TempChannel::new(Adc::new(p.ADC1)), cal);

    // Frequency sensor clocks TIM2 through ETR (PA0)
    let frequency = FrequencyInput::new(EdgeCounter::new(p.TIM2, p.PA0));

    // Calendar keeps running across resets; only an unset one is defaulted
    let (rtc, time_provider) = Rtc::new(p.RTC, RtcConfig::default());
    let mut clock = RtcClock::new(RtcCalendar::new(rtc, time_provider));
    match clock.restore() {
        Ok(true) => warn!("Calendar was not set, default date loaded"),
        Ok(false) => info!("Calendar running"),
        Err(e) => error!("Calendar not accessible: {:?}", Debug2Format(&e)),
    }

    // Sample servos on TIM3 (PA6=gate, PA7=scraper)
    let pwm = SimplePwm::new(
        p.TIM3,
        Some(PwmPin::new(p.PA6, OutputType::PushPull)),
        Some(PwmPin::new(p.PA7, OutputType::PushPull)),
        None,
        None,
        SERVO_FRAME,
        SERVO_COUNTING,
    );
    let servos = pwm.split();
    let (mut gate, mut scraper) = (servos.ch1, servos.ch2);
    gate.enable();
    scraper.enable();

    // Touch wake-up (PC13)
    let touch = ExtiInput::new(p.PC13, p.EXTI13, Pull::Up, Irqs);
    let display_power = Output::new(p.PB2, Level::High, Speed::Low);

    spawner.spawn(tasks::uart_rx_task(console_rx, &CONSOLE_RX)).unwrap();
    spawner.spawn(tasks::uart_rx_task(display_rx, &DISPLAY_RX)).unwrap();
    spawner.spawn(tasks::console_tx_task(console_tx)).unwrap();
    spawner.spawn(tasks::display_tx_task(display_tx)).unwrap();
    info!("All tasks spawned");

    let app = APP.init(App::new(Board {
        console_pump: TxPump::new(ChannelTx::new(&CONSOLE_TX)),
        display: DisplayTransport::new(ChannelTx::new(&DISPLAY_TX)),
        eeprom,
        scale,
        thermometer,
        frequency,
        clock,
        gate: PwmServo::new(gate, ServoCalibration::default()),
        scraper: PwmServo::new(scraper, ServoCalibration::default()),
        touch,
        display_power,
    }));

    app.start().await;
    app.run().await
}
