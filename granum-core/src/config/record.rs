//! Configuration record and its fixed EEPROM layout
//!
//! Layout (little-endian, no padding):
//!
//! ```text
//! version u32 | language u8 | grain u8 | password [10]
//! gain f32 | zero f32 | repetitions u16 | decimals u16
//! grains [7] { name [16] | validity [10] | curve_id u32 | hmin i16 | hmax i16 }
//! users [10] { name [20] | company [20] }
//! serial [16] | checksum u32
//! ```
//!
//! Strings are zero-padded to their field width and must be UTF-8.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use heapless::String;

/// Current layout version
pub const CONFIG_VERSION: u32 = 1;

/// Selectable UI languages
pub const LANGUAGES: usize = 6;
/// Grain profile slots
pub const MAX_GRAINS: usize = 7;
/// User profile slots
pub const MAX_USERS: usize = 10;

pub const PASSWORD_LEN: usize = 10;
pub const GRAIN_NAME_LEN: usize = 16;
pub const VALIDITY_LEN: usize = 10;
pub const USER_NAME_LEN: usize = 20;
pub const COMPANY_LEN: usize = 20;
pub const SERIAL_LEN: usize = 16;

/// Largest accepted decimal-places setting
pub const MAX_DECIMALS: u16 = 3;
/// Accepted repetition counts
pub const REPETITIONS: core::ops::RangeInclusive<u16> = 1..=99;

const GRAIN_SIZE: usize = GRAIN_NAME_LEN + VALIDITY_LEN + 4 + 2 + 2;
const USER_SIZE: usize = USER_NAME_LEN + COMPANY_LEN;

/// Bytes covered by the checksum
pub const BODY_SIZE: usize = 4
    + 1
    + 1
    + PASSWORD_LEN
    + 4
    + 4
    + 2
    + 2
    + MAX_GRAINS * GRAIN_SIZE
    + MAX_USERS * USER_SIZE
    + SERIAL_LEN;

/// Serialized record size including the trailing checksum
pub const RECORD_SIZE: usize = BODY_SIZE + 4;

/// Reasons a stored image is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecordError {
    /// Layout version differs from [`CONFIG_VERSION`]
    Version,
    /// Language or grain index beyond its table
    InvalidIndex,
    /// A string field is not valid UTF-8
    InvalidText,
    /// Numeric field outside its accepted range
    InvalidValue,
}

/// Moisture curve and limits for one grain
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GrainProfile {
    pub name: String<GRAIN_NAME_LEN>,
    /// Curve validity date as entered ("DD/MM/YYYY")
    pub validity: String<VALIDITY_LEN>,
    pub curve_id: u32,
    /// Accepted humidity range in percent
    pub humidity_min: i16,
    pub humidity_max: i16,
}

/// Operator identity printed on reports
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UserProfile {
    pub name: String<USER_NAME_LEN>,
    pub company: String<COMPANY_LEN>,
}

/// Calibration and user settings
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConfigRecord {
    pub version: u32,
    pub language: u8,
    pub grain: u8,
    pub password: String<PASSWORD_LEN>,
    /// Scale A calibration gain
    pub gain: f32,
    /// Scale A calibration offset
    pub zero: f32,
    pub repetitions: u16,
    pub decimals: u16,
    pub grains: [GrainProfile; MAX_GRAINS],
    pub users: [UserProfile; MAX_USERS],
    pub serial: String<SERIAL_LEN>,
    pub checksum: u32,
}

impl ConfigRecord {
    /// Serialize into the EEPROM image
    pub fn to_bytes(&self) -> [u8; RECORD_SIZE] {
        let mut buf = [0u8; RECORD_SIZE];
        let mut w = Writer { buf: &mut buf, pos: 0 };

        w.u32(self.version);
        w.u8(self.language);
        w.u8(self.grain);
        w.text(&self.password, PASSWORD_LEN);
        w.f32(self.gain);
        w.f32(self.zero);
        w.u16(self.repetitions);
        w.u16(self.decimals);
        for grain in &self.grains {
            w.text(&grain.name, GRAIN_NAME_LEN);
            w.text(&grain.validity, VALIDITY_LEN);
            w.u32(grain.curve_id);
            w.i16(grain.humidity_min);
            w.i16(grain.humidity_max);
        }
        for user in &self.users {
            w.text(&user.name, USER_NAME_LEN);
            w.text(&user.company, COMPANY_LEN);
        }
        w.text(&self.serial, SERIAL_LEN);
        w.u32(self.checksum);

        buf
    }

    /// Parse an EEPROM image; the checksum is carried over, not verified
    pub fn from_bytes(bytes: &[u8; RECORD_SIZE]) -> Result<Self, RecordError> {
        let mut r = Reader { buf: bytes, pos: 0 };

        let version = r.u32();
        if version != CONFIG_VERSION {
            return Err(RecordError::Version);
        }
        let language = r.u8();
        let grain = r.u8();
        if language as usize >= LANGUAGES || grain as usize >= MAX_GRAINS {
            return Err(RecordError::InvalidIndex);
        }
        let password = r.text(PASSWORD_LEN)?;
        let gain = r.f32();
        let zero = r.f32();
        let repetitions = r.u16();
        let decimals = r.u16();

        let mut grains: [GrainProfile; MAX_GRAINS] = Default::default();
        for slot in grains.iter_mut() {
            *slot = GrainProfile {
                name: r.text(GRAIN_NAME_LEN)?,
                validity: r.text(VALIDITY_LEN)?,
                curve_id: r.u32(),
                humidity_min: r.i16(),
                humidity_max: r.i16(),
            };
        }
        let mut users: [UserProfile; MAX_USERS] = Default::default();
        for slot in users.iter_mut() {
            *slot = UserProfile {
                name: r.text(USER_NAME_LEN)?,
                company: r.text(COMPANY_LEN)?,
            };
        }
        let serial = r.text(SERIAL_LEN)?;
        let checksum = r.u32();

        let record = Self {
            version,
            language,
            grain,
            password,
            gain,
            zero,
            repetitions,
            decimals,
            grains,
            users,
            serial,
            checksum,
        };
        if !record.values_in_range() {
            return Err(RecordError::InvalidValue);
        }
        Ok(record)
    }

    /// Checksum stored in the trailing bytes of an image
    pub fn stored_checksum(bytes: &[u8; RECORD_SIZE]) -> u32 {
        let mut tail = [0u8; 4];
        tail.copy_from_slice(&bytes[BODY_SIZE..]);
        u32::from_le_bytes(tail)
    }

    /// Bytes covered by the checksum
    pub fn body(bytes: &[u8; RECORD_SIZE]) -> &[u8] {
        &bytes[..BODY_SIZE]
    }

    /// Active grain profile
    pub fn active_grain(&self) -> &GrainProfile {
        // Index validated on every entry path
        &self.grains[self.grain as usize % MAX_GRAINS]
    }

    fn values_in_range(&self) -> bool {
        self.gain.is_finite()
            && self.zero.is_finite()
            && self.decimals <= MAX_DECIMALS
            && REPETITIONS.contains(&self.repetitions)
    }
}

struct Writer<'a> {
    buf: &'a mut [u8; RECORD_SIZE],
    pos: usize,
}

impl Writer<'_> {
    fn put(&mut self, bytes: &[u8]) {
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
    }

    fn u8(&mut self, v: u8) {
        self.put(&[v]);
    }

    fn u16(&mut self, v: u16) {
        self.put(&v.to_le_bytes());
    }

    fn i16(&mut self, v: i16) {
        self.put(&v.to_le_bytes());
    }

    fn u32(&mut self, v: u32) {
        self.put(&v.to_le_bytes());
    }

    fn f32(&mut self, v: f32) {
        self.put(&v.to_le_bytes());
    }

    /// Zero-padded fixed-width string
    fn text(&mut self, s: &str, width: usize) {
        let bytes = s.as_bytes();
        let len = bytes.len().min(width);
        self.put(&bytes[..len]);
        self.pos += width - len;
    }
}

struct Reader<'a> {
    buf: &'a [u8; RECORD_SIZE],
    pos: usize,
}

impl Reader<'_> {
    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buf[self.pos..self.pos + N]);
        self.pos += N;
        out
    }

    fn u8(&mut self) -> u8 {
        self.take::<1>()[0]
    }

    fn u16(&mut self) -> u16 {
        u16::from_le_bytes(self.take())
    }

    fn i16(&mut self) -> i16 {
        i16::from_le_bytes(self.take())
    }

    fn u32(&mut self) -> u32 {
        u32::from_le_bytes(self.take())
    }

    fn f32(&mut self) -> f32 {
        f32::from_le_bytes(self.take())
    }

    fn text<const N: usize>(&mut self, width: usize) -> Result<String<N>, RecordError> {
        let field = &self.buf[self.pos..self.pos + width];
        self.pos += width;

        let end = field.iter().position(|&b| b == 0).unwrap_or(width);
        let text = core::str::from_utf8(&field[..end]).map_err(|_| RecordError::InvalidText)?;
        let mut out = String::new();
        out.push_str(text).map_err(|_| RecordError::InvalidText)?;
        Ok(out)
    }
}
