//! Command table and argument parsing

use core::fmt;

use heapless::Vec;

use crate::traits::{ClockError, Date, Time};

/// Most bytes a `DWIN RAW` command may carry
pub const MAX_RAW_BYTES: usize = 64;

/// Top-level commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandKind {
    Help,
    WhoAmI,
    Time,
    Date,
    Weight,
    Temperature,
    Frequency,
    Service,
    Dwin,
}

/// One row of the command table
#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    pub name: &'static str,
    pub kind: CommandKind,
    pub usage: &'static str,
    pub summary: &'static str,
}

const fn spec(
    name: &'static str,
    kind: CommandKind,
    usage: &'static str,
    summary: &'static str,
) -> CommandSpec {
    CommandSpec {
        name,
        kind,
        usage,
        summary,
    }
}

/// Registered commands, in help order
pub static COMMANDS: [CommandSpec; 10] = [
    spec("HELP", CommandKind::Help, "HELP or ?", "Show this help."),
    spec("?", CommandKind::Help, "", ""),
    spec("WHO_AM_I", CommandKind::WhoAmI, "WHO_AM_I", "Show system identification."),
    spec("TIME", CommandKind::Time, "TIME HH:MM:SS", "Set the clock time."),
    spec("DATE", CommandKind::Date, "DATE DD/MM/YY", "Set the clock date."),
    spec("PESO", CommandKind::Weight, "PESO", "Show the current scale reading."),
    spec("TEMP", CommandKind::Temperature, "TEMP", "Show the MCU temperature."),
    spec("FREQ", CommandKind::Frequency, "FREQ", "Show the last frequency reading."),
    spec("SERVICE", CommandKind::Service, "SERVICE", "Open the service page."),
    spec("DWIN", CommandKind::Dwin, "DWIN PIC|INT|INT32|RAW ...", "Talk to the display."),
];

/// Display sub-command help rows: usage, summary
pub static DWIN_USAGE: [(&str, &str); 4] = [
    ("DWIN PIC <id>", "Switch page (e.g. DWIN PIC 1)."),
    ("DWIN INT <addr_hex> <val>", "Write int16 to a VP."),
    ("DWIN INT32 <addr_hex> <val>", "Write int32 to a VP."),
    ("DWIN RAW <bytes_hex>", "Send raw bytes (e.g. 5AA5...)."),
];

/// Find a command by name, ignoring ASCII case
pub fn lookup(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|c| c.name.eq_ignore_ascii_case(name))
}

/// Display sub-commands
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DwinCommand {
    Page(u16),
    Int16 { vp: u16, value: i16 },
    Int32 { vp: u16, value: i32 },
    Raw(Vec<u8, MAX_RAW_BYTES>),
}

/// A parsed command line
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    Help,
    WhoAmI,
    SetTime(Time),
    SetDate(Date),
    Weight,
    Temperature,
    Frequency,
    Service,
    Dwin(DwinCommand),
}

/// Reasons a line could not be turned into a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    Unknown,
    UnknownDwin,
    MissingDwin,
    /// Required argument absent; carries the usage line
    Usage(&'static str),
    InvalidTime,
    InvalidDate,
    InvalidNumber,
    OddHexDigits,
    InvalidHex,
    TooManyBytes,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Unknown => f.write_str("Unknown command. Type 'HELP'."),
            CommandError::UnknownDwin => f.write_str("Unknown DWIN subcommand."),
            CommandError::MissingDwin => f.write_str("Missing DWIN subcommand. Type 'HELP'."),
            CommandError::Usage(usage) => write!(f, "Error: missing arguments. Usage: {}", usage),
            CommandError::InvalidTime => {
                f.write_str("Error: invalid format or value. Usage: TIME HH(0-23):MM(0-59):SS(0-59).")
            }
            CommandError::InvalidDate => {
                f.write_str("Error: invalid format or value. Usage: DATE DD(1-31)/MM(1-12)/YY(00-99).")
            }
            CommandError::InvalidNumber => f.write_str("Error: invalid number."),
            CommandError::OddHexDigits => f.write_str("Error: odd number of hex digits."),
            CommandError::InvalidHex => f.write_str("Error: invalid character in hex string."),
            CommandError::TooManyBytes => {
                write!(f, "Error: at most {} bytes per RAW command.", MAX_RAW_BYTES)
            }
        }
    }
}

/// Split off the first whitespace-separated word
fn split_word(text: &str) -> (&str, Option<&str>) {
    let text = text.trim_start();
    match text.split_once(|c: char| c.is_ascii_whitespace()) {
        Some((word, rest)) => {
            let rest = rest.trim();
            (word, (!rest.is_empty()).then_some(rest))
        }
        None => (text, None),
    }
}

/// Parse one submitted line
pub fn parse(line: &str) -> Result<Command, CommandError> {
    let (name, args) = split_word(line);
    let spec = lookup(name).ok_or(CommandError::Unknown)?;

    match spec.kind {
        CommandKind::Help => Ok(Command::Help),
        CommandKind::WhoAmI => Ok(Command::WhoAmI),
        CommandKind::Weight => Ok(Command::Weight),
        CommandKind::Temperature => Ok(Command::Temperature),
        CommandKind::Frequency => Ok(Command::Frequency),
        CommandKind::Service => Ok(Command::Service),
        CommandKind::Time => {
            let args = args.ok_or(CommandError::Usage(spec.usage))?;
            let time = Time::parse(args).map_err(|_: ClockError| CommandError::InvalidTime)?;
            Ok(Command::SetTime(time))
        }
        CommandKind::Date => {
            let args = args.ok_or(CommandError::Usage(spec.usage))?;
            let date = Date::parse(args).map_err(|_: ClockError| CommandError::InvalidDate)?;
            Ok(Command::SetDate(date))
        }
        CommandKind::Dwin => parse_dwin(args.ok_or(CommandError::MissingDwin)?).map(Command::Dwin),
    }
}

fn parse_dwin(args: &str) -> Result<DwinCommand, CommandError> {
    let (sub, rest) = split_word(args);

    if sub.eq_ignore_ascii_case("PIC") {
        let id = rest.ok_or(CommandError::Usage(DWIN_USAGE[0].0))?;
        let page = id.parse().map_err(|_| CommandError::InvalidNumber)?;
        Ok(DwinCommand::Page(page))
    } else if sub.eq_ignore_ascii_case("INT") {
        let (vp, value) = vp_and_value(rest, DWIN_USAGE[1].0)?;
        let value = value.parse().map_err(|_| CommandError::InvalidNumber)?;
        Ok(DwinCommand::Int16 { vp, value })
    } else if sub.eq_ignore_ascii_case("INT32") {
        let (vp, value) = vp_and_value(rest, DWIN_USAGE[2].0)?;
        let value = value.parse().map_err(|_| CommandError::InvalidNumber)?;
        Ok(DwinCommand::Int32 { vp, value })
    } else if sub.eq_ignore_ascii_case("RAW") {
        let hex = rest.ok_or(CommandError::Usage(DWIN_USAGE[3].0))?;
        parse_hex(hex).map(DwinCommand::Raw)
    } else {
        Err(CommandError::UnknownDwin)
    }
}

fn vp_and_value<'a>(args: Option<&'a str>, usage: &'static str) -> Result<(u16, &'a str), CommandError> {
    let (addr, value) = split_word(args.ok_or(CommandError::Usage(usage))?);
    let value = value.ok_or(CommandError::Usage(usage))?;
    let addr = addr.trim_start_matches("0x").trim_start_matches("0X");
    let vp = u16::from_str_radix(addr, 16).map_err(|_| CommandError::InvalidNumber)?;
    Ok((vp, value))
}

/// Hex byte string; whitespace may separate byte pairs
fn parse_hex(text: &str) -> Result<Vec<u8, MAX_RAW_BYTES>, CommandError> {
    let mut out = Vec::new();

    for word in text.split_ascii_whitespace() {
        let digits = word.as_bytes();
        if digits.len() % 2 != 0 {
            return Err(CommandError::OddHexDigits);
        }
        for pair in digits.chunks(2) {
            let byte = (hex_value(pair[0])? << 4) | hex_value(pair[1])?;
            out.push(byte).map_err(|_| CommandError::TooManyBytes)?;
        }
    }
    Ok(out)
}

fn hex_value(c: u8) -> Result<u8, CommandError> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        _ => Err(CommandError::InvalidHex),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_lookup_ignores_case() {
        assert_eq!(lookup("freq").map(|c| c.kind), Some(CommandKind::Frequency));
        assert_eq!(lookup("Who_Am_I").map(|c| c.kind), Some(CommandKind::WhoAmI));
        assert_eq!(lookup("?").map(|c| c.kind), Some(CommandKind::Help));
        assert!(lookup("REBOOT").is_none());
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(parse("help"), Ok(Command::Help));
        assert_eq!(parse("  PESO  "), Ok(Command::Weight));
        assert_eq!(parse("service"), Ok(Command::Service));
        assert_eq!(parse("bogus"), Err(CommandError::Unknown));
    }

    #[test]
    fn test_time_and_date() {
        assert_eq!(
            parse("TIME 12:34:56"),
            Ok(Command::SetTime(Time::new(12, 34, 56).unwrap()))
        );
        assert_eq!(parse("TIME 24:00:00"), Err(CommandError::InvalidTime));
        assert_eq!(parse("TIME"), Err(CommandError::Usage("TIME HH:MM:SS")));
        assert_eq!(
            parse("date 29/02/24"),
            Ok(Command::SetDate(Date::new(29, 2, 24).unwrap()))
        );
        assert_eq!(parse("DATE 32/01/24"), Err(CommandError::InvalidDate));
    }

    #[test]
    fn test_dwin_page_and_ints() {
        assert_eq!(parse("DWIN PIC 4"), Ok(Command::Dwin(DwinCommand::Page(4))));
        assert_eq!(
            parse("dwin int 2190 -1234"),
            Ok(Command::Dwin(DwinCommand::Int16 {
                vp: 0x2190,
                value: -1234
            }))
        );
        assert_eq!(
            parse("DWIN INT32 0x2000 100000"),
            Ok(Command::Dwin(DwinCommand::Int32 {
                vp: 0x2000,
                value: 100_000
            }))
        );
        assert_eq!(parse("DWIN INT 2190"), Err(CommandError::Usage(DWIN_USAGE[1].0)));
        assert_eq!(parse("DWIN INT 2190 70000"), Err(CommandError::InvalidNumber));
        assert_eq!(parse("DWIN"), Err(CommandError::MissingDwin));
        assert_eq!(parse("DWIN BEEP"), Err(CommandError::UnknownDwin));
    }

    #[test]
    fn test_dwin_raw() {
        let Ok(Command::Dwin(DwinCommand::Raw(bytes))) = parse("DWIN RAW 5AA5 04 8300 1401") else {
            panic!("raw not parsed");
        };
        assert_eq!(&bytes[..], &[0x5A, 0xA5, 0x04, 0x83, 0x00, 0x14, 0x01]);

        assert_eq!(parse("DWIN RAW 5AA"), Err(CommandError::OddHexDigits));
        assert_eq!(parse("DWIN RAW 5G"), Err(CommandError::InvalidHex));
        assert_eq!(parse("DWIN RAW"), Err(CommandError::Usage(DWIN_USAGE[3].0)));
    }

    #[test]
    fn test_raw_byte_limit() {
        let mut line: std::string::String = "DWIN RAW ".into();
        line.push_str(&"AB".repeat(MAX_RAW_BYTES));
        assert!(parse(&line).is_ok());
        line.push_str("CD");
        assert_eq!(parse(&line), Err(CommandError::TooManyBytes));
    }

    #[test]
    fn test_error_messages() {
        let text = std::format!("{}", CommandError::Usage("TIME HH:MM:SS"));
        assert_eq!(text, "Error: missing arguments. Usage: TIME HH:MM:SS");
    }

    proptest! {
        #[test]
        fn test_parse_never_panics(line in "[ -~]{0,127}") {
            let _ = parse(&line);
        }

        #[test]
        fn test_raw_hex_roundtrip(bytes in proptest::collection::vec(any::<u8>(), 1..MAX_RAW_BYTES)) {
            let mut line: std::string::String = "DWIN RAW".into();
            for b in &bytes {
                line.push_str(&std::format!(" {:02x}", b));
            }
            let parsed = parse(&line);
            prop_assert_eq!(parsed, Ok(Command::Dwin(DwinCommand::Raw(Vec::from_slice(&bytes).unwrap()))));
        }
    }
}
