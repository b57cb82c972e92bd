//! Command execution against the running instrument

use core::fmt::{self, Write};

use heapless::String;

use super::command::{self, Command, DwinCommand, COMMANDS, DWIN_USAGE};
use super::line::{LineEditor, LineEvent, LINE_CAPACITY};
use crate::config::record::SERIAL_LEN;
use crate::scheduler::Measurements;
use crate::traits::{ClockError, Date, DisplayError, DisplaySink, SensorError, Time};
use crate::ui::{self, page};

const CPU: &str = "STM32C071RB";
const RULE: &str = "============================================================";

/// What the console needs from the rest of the firmware
pub trait ConsoleContext {
    type Display: DisplaySink;

    /// Latest measurement snapshot
    fn measurements(&self) -> Measurements;

    /// Fresh MCU temperature reading in °C
    fn instrument_temperature(&mut self) -> Result<f32, SensorError>;

    fn serial(&self) -> String<SERIAL_LEN>;

    fn set_time(&mut self, time: Time) -> Result<(), ClockError>;

    fn set_date(&mut self, date: Date) -> Result<(), ClockError>;

    fn display(&mut self) -> &mut Self::Display;
}

/// Line-oriented diagnostic console
///
/// Bytes arrive through [`Console::on_rx_byte`], which echoes them. A
/// submitted line is executed by the next [`Console::process`] call.
#[derive(Debug, Default)]
pub struct Console {
    line: LineEditor<LINE_CAPACITY>,
}

impl Console {
    pub const fn new() -> Self {
        Self {
            line: LineEditor::new(),
        }
    }

    /// Greeting printed once at start-up
    pub fn banner<W: Write>(&self, out: &mut W) -> fmt::Result {
        out.write_str("\nConsole ready. Type 'HELP' for commands.\n")?;
        prompt(out)
    }

    /// Feed one received byte and write its echo
    pub fn on_rx_byte<W: Write>(&mut self, byte: u8, out: &mut W) -> fmt::Result {
        match self.line.feed(byte) {
            LineEvent::Echo(b) => out.write_char(b as char),
            LineEvent::Erase => out.write_str("\x08 \x08"),
            LineEvent::Submitted => out.write_str("\n"),
            LineEvent::Prompt => prompt(out),
            LineEvent::None => Ok(()),
        }
    }

    /// True while a submitted line waits for [`Console::process`]
    pub fn has_pending_line(&self) -> bool {
        self.line.is_ready()
    }

    /// Execute a pending line, if any
    ///
    /// Returns true when a line was executed. The line is consumed even if
    /// writing the reply fails.
    pub fn process<C: ConsoleContext, W: Write>(
        &mut self,
        ctx: &mut C,
        out: &mut W,
    ) -> Result<bool, fmt::Error> {
        let Some(line) = self.line.line() else {
            return Ok(false);
        };

        let result = match command::parse(line) {
            Ok(cmd) => run(cmd, ctx, out),
            Err(e) => writeln!(out, "{}", e),
        };
        self.line.clear();
        result?;
        prompt(out)?;
        Ok(true)
    }
}

fn prompt<W: Write>(out: &mut W) -> fmt::Result {
    out.write_str("\n> ")
}

fn run<C: ConsoleContext, W: Write>(cmd: Command, ctx: &mut C, out: &mut W) -> fmt::Result {
    match cmd {
        Command::Help => help(out),
        Command::WhoAmI => who_am_i(ctx, out),
        Command::SetTime(time) => match ctx.set_time(time) {
            Ok(()) => writeln!(out, "OK. Clock set to {}", time),
            Err(_) => writeln!(out, "Error: failed to set the clock."),
        },
        Command::SetDate(date) => match ctx.set_date(date) {
            Ok(()) => writeln!(out, "OK. Clock set to {}", date),
            Err(_) => writeln!(out, "Error: failed to set the clock."),
        },
        Command::Weight => {
            let m = ctx.measurements();
            writeln!(out, "Scale:\n  - Weight: {:.2} g", m.weight_g)
        }
        Command::Temperature => match ctx.instrument_temperature() {
            Ok(celsius) => writeln!(out, "MCU temperature: {:.2} C", celsius),
            Err(_) => writeln!(out, "Error: temperature sensor unavailable."),
        },
        Command::Frequency => {
            let m = ctx.measurements();
            writeln!(out, "Frequency:")?;
            writeln!(out, "  - Pulses (1 s): {:.1}", m.frequency)?;
            writeln!(out, "  - Scale A: {:.2}", m.scale_a)
        }
        Command::Service => {
            let queued = ctx.display().set_page(page::SERVICE);
            report(out, queued, format_args!("Service page requested."))
        }
        Command::Dwin(dwin) => run_dwin(dwin, ctx.display(), out),
    }
}

fn run_dwin<D: DisplaySink, W: Write>(cmd: DwinCommand, display: &mut D, out: &mut W) -> fmt::Result {
    match cmd {
        DwinCommand::Page(id) => {
            let queued = display.set_page(id);
            report(out, queued, format_args!("DWIN PIC {} queued.", id))
        }
        DwinCommand::Int16 { vp, value } => {
            let queued = display.write_i16(vp, value);
            report(out, queued, format_args!("Queued (int16) {} at 0x{:04X}", value, vp))
        }
        DwinCommand::Int32 { vp, value } => {
            let queued = display.write_i32(vp, value);
            report(out, queued, format_args!("Queued (int32) {} at 0x{:04X}", value, vp))
        }
        DwinCommand::Raw(bytes) => {
            if let Err(e) = display.send_bytes(&bytes) {
                return display_error(out, e);
            }
            write!(out, "Queueing {} bytes for DWIN:", bytes.len())?;
            for b in &bytes {
                write!(out, " {:02X}", b)?;
            }
            writeln!(out)
        }
    }
}

fn report<W: Write>(out: &mut W, queued: Result<(), DisplayError>, ok: fmt::Arguments<'_>) -> fmt::Result {
    match queued {
        Ok(()) => {
            out.write_fmt(ok)?;
            writeln!(out)
        }
        Err(e) => display_error(out, e),
    }
}

fn display_error<W: Write>(out: &mut W, error: DisplayError) -> fmt::Result {
    match error {
        DisplayError::BufferOverflow => writeln!(out, "Error: display queue full, try again."),
        DisplayError::Frame(_) => writeln!(out, "Error: value does not fit a display frame."),
    }
}

fn help<W: Write>(out: &mut W) -> fmt::Result {
    writeln!(out, "{}", RULE)?;
    for spec in COMMANDS.iter().filter(|c| !c.usage.is_empty()) {
        writeln!(out, "| {:<28}| {}", spec.usage, spec.summary)?;
    }
    for (usage, summary) in DWIN_USAGE.iter() {
        writeln!(out, "| {:<28}| {}", usage, summary)?;
    }
    writeln!(out, "{}", RULE)
}

fn who_am_i<C: ConsoleContext, W: Write>(ctx: &C, out: &mut W) -> fmt::Result {
    writeln!(out, "{}", RULE)?;
    writeln!(out, "CPU      = {:>21}", CPU)?;
    writeln!(out, "Firmware = {:>21}", ui::FIRMWARE_VERSION)?;
    writeln!(out, "Hardware = {:>21}", ui::HARDWARE_VERSION)?;
    writeln!(out, "Serial   = {:>21}", ctx.serial())?;
    writeln!(out, "{}", RULE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::measurement::mock::{MockDisplay, Write as DisplayWrite};
    use std::string::String as StdString;

    struct Ctx {
        data: Measurements,
        temp: Result<f32, SensorError>,
        time: Option<Time>,
        date: Option<Date>,
        clock_fails: bool,
        display: MockDisplay,
    }

    impl Ctx {
        fn new() -> Self {
            Self {
                data: Measurements::default(),
                temp: Ok(24.5),
                time: None,
                date: None,
                clock_fails: false,
                display: MockDisplay::default(),
            }
        }
    }

    impl ConsoleContext for Ctx {
        type Display = MockDisplay;

        fn measurements(&self) -> Measurements {
            self.data
        }

        fn instrument_temperature(&mut self) -> Result<f32, SensorError> {
            self.temp
        }

        fn serial(&self) -> String<SERIAL_LEN> {
            String::try_from("G620-0042").unwrap_or_default()
        }

        fn set_time(&mut self, time: Time) -> Result<(), ClockError> {
            if self.clock_fails {
                return Err(ClockError::Hardware);
            }
            self.time = Some(time);
            Ok(())
        }

        fn set_date(&mut self, date: Date) -> Result<(), ClockError> {
            if self.clock_fails {
                return Err(ClockError::Hardware);
            }
            self.date = Some(date);
            Ok(())
        }

        fn display(&mut self) -> &mut MockDisplay {
            &mut self.display
        }
    }

    fn submit(console: &mut Console, ctx: &mut Ctx, line: &str) -> StdString {
        let mut out = StdString::new();
        for b in line.bytes().chain(core::iter::once(b'\r')) {
            console.on_rx_byte(b, &mut out).unwrap();
        }
        out.clear();
        assert!(console.process(ctx, &mut out).unwrap());
        out
    }

    #[test]
    fn test_echo_and_erase() {
        let mut console = Console::new();
        let mut out = StdString::new();
        for &b in b"AB\x08\r" {
            console.on_rx_byte(b, &mut out).unwrap();
        }
        assert_eq!(out, "AB\x08 \x08\n");
        assert!(console.has_pending_line());
    }

    #[test]
    fn test_empty_line_prompts() {
        let mut console = Console::new();
        let mut out = StdString::new();
        console.on_rx_byte(b'\n', &mut out).unwrap();
        assert_eq!(out, "\n> ");
        assert!(!console.process(&mut Ctx::new(), &mut out).unwrap());
    }

    #[test]
    fn test_freq_reply() {
        let mut console = Console::new();
        let mut ctx = Ctx::new();
        ctx.data.frequency = 1_000_000.0;
        ctx.data.scale_a = 247.3;

        let out = submit(&mut console, &mut ctx, "freq");
        assert!(out.contains("Pulses (1 s): 1000000.0"));
        assert!(out.contains("Scale A: 247.30"));
        assert!(out.ends_with("\n> "));
    }

    #[test]
    fn test_time_sets_clock() {
        let mut console = Console::new();
        let mut ctx = Ctx::new();
        let out = submit(&mut console, &mut ctx, "TIME 07:08:09");
        assert_eq!(ctx.time, Some(Time::new(7, 8, 9).unwrap()));
        assert!(out.starts_with("OK. Clock set to 07:08:09"));

        let out = submit(&mut console, &mut ctx, "DATE 31/04/25");
        assert_eq!(ctx.date, None);
        assert!(out.starts_with("Error: invalid format"));
    }

    #[test]
    fn test_clock_write_failure_reported() {
        let mut console = Console::new();
        let mut ctx = Ctx::new();
        ctx.clock_fails = true;
        let out = submit(&mut console, &mut ctx, "DATE 01/02/26");
        assert!(out.starts_with("Error: failed to set the clock."));
        assert_eq!(ctx.date, None);
    }

    #[test]
    fn test_temperature_failure_reported() {
        let mut console = Console::new();
        let mut ctx = Ctx::new();
        ctx.temp = Err(SensorError::Uncalibrated);
        let out = submit(&mut console, &mut ctx, "TEMP");
        assert!(out.starts_with("Error: temperature sensor unavailable."));
    }

    #[test]
    fn test_service_switches_page() {
        let mut console = Console::new();
        let mut ctx = Ctx::new();
        submit(&mut console, &mut ctx, "SERVICE");
        assert_eq!(ctx.display.writes, [DisplayWrite::Page(page::SERVICE)]);
    }

    #[test]
    fn test_dwin_commands_reach_display() {
        let mut console = Console::new();
        let mut ctx = Ctx::new();

        let out = submit(&mut console, &mut ctx, "DWIN INT 2190 1234");
        assert!(out.starts_with("Queued (int16) 1234 at 0x2190"));
        let out = submit(&mut console, &mut ctx, "DWIN RAW 5AA50482");
        assert!(out.starts_with("Queueing 4 bytes for DWIN: 5A A5 04 82"));

        assert_eq!(
            ctx.display.writes,
            [
                DisplayWrite::I16(0x2190, 1234),
                DisplayWrite::Bytes(std::vec![0x5A, 0xA5, 0x04, 0x82]),
            ]
        );
    }

    #[test]
    fn test_unknown_command_keeps_serving() {
        let mut console = Console::new();
        let mut ctx = Ctx::new();
        let out = submit(&mut console, &mut ctx, "REBOOT");
        assert!(out.starts_with("Unknown command"));
        let out = submit(&mut console, &mut ctx, "PESO");
        assert!(out.contains("Weight: 0.00 g"));
    }

    #[test]
    fn test_who_am_i_and_help() {
        let mut console = Console::new();
        let mut ctx = Ctx::new();
        let out = submit(&mut console, &mut ctx, "WHO_AM_I");
        assert!(out.contains(CPU));
        assert!(out.contains("G620-0042"));

        let out = submit(&mut console, &mut ctx, "?");
        assert!(out.contains("TIME HH:MM:SS"));
        assert!(out.contains("DWIN RAW <bytes_hex>"));
    }
}
