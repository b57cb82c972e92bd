//! Frequency sensor edge counter on TIM2
//!
//! The capacitance oscillator drives TIM2_ETR (PA0, AF2). TIM2 runs in
//! external clock mode 2, so every rising edge increments the 32-bit
//! counter in hardware with no interrupt per edge. The counter free-runs
//! and wraps; readers take differences between readings.

use embassy_stm32::pac;
use embassy_stm32::pac::gpio::vals::{Moder, Pupdr};
use embassy_stm32::peripherals::{PA0, TIM2};
use embassy_stm32::timer::low_level::Timer;
use embassy_stm32::Peri;

/// Alternate function routing PA0 to TIM2_ETR
const ETR_AF: u8 = 2;

/// Highest oscillator frequency the ETR input accepts unprescaled
pub const MAX_INPUT_HZ: u32 = 12_000_000;

pub struct EdgeCounter<'d> {
    timer: Timer<'d, TIM2>,
}

impl<'d> EdgeCounter<'d> {
    /// Route PA0 to the ETR input and start counting
    pub fn new(tim: Peri<'d, TIM2>, _pin: Peri<'d, PA0>) -> Self {
        pac::GPIOA.pupdr().modify(|w| w.set_pupdr(0, Pupdr::FLOATING));
        pac::GPIOA.afr(0).modify(|w| w.set_afr(0, ETR_AF));
        pac::GPIOA.moder().modify(|w| w.set_moder(0, Moder::ALTERNATE));

        let timer = Timer::new(tim);
        let regs = timer.regs_gp32();
        regs.smcr().modify(|w| w.set_ece(true));
        regs.arr().write_value(u32::MAX);
        regs.cnt().write_value(0);
        timer.start();

        Self { timer }
    }

    /// Edges since start-up, modulo 2^32
    pub fn count(&self) -> u32 {
        self.timer.regs_gp32().cnt().read()
    }
}
