//! Triple-redundant configuration store
//!
//! The record lives in RAM and is mirrored into three EEPROM replicas. At
//! boot the first replica whose checksum and structure hold becomes the RAM
//! copy. Setters only touch RAM; [`ConfigStore::run_fsm`] writes the record
//! back through the paged writer, primary first, then both backups.

use heapless::String;

use super::checksum::Checksum;
use super::defaults::factory_defaults;
use super::record::{
    ConfigRecord, GrainProfile, UserProfile, COMPANY_LEN, LANGUAGES, MAX_DECIMALS, MAX_GRAINS,
    MAX_USERS, PASSWORD_LEN, RECORD_SIZE, REPETITIONS, SERIAL_LEN, USER_NAME_LEN,
};
use crate::storage::{JobId, PagedWriter, WriteError};
use crate::traits::EepromDevice;

/// Number of stored copies
pub const REPLICAS: usize = 3;

/// Distance between replicas: the record rounded up to whole pages
pub const fn replica_spacing(page_size: usize) -> usize {
    RECORD_SIZE.div_ceil(page_size) * page_size
}

/// EEPROM address of replica `index` (0 = primary)
pub const fn replica_address(index: usize, page_size: usize) -> u16 {
    (index * replica_spacing(page_size)) as u16
}

/// Setter errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Table index beyond capacity
    IndexOutOfRange,
    /// Text longer than its field
    TooLong,
    /// Value outside the accepted range
    InvalidValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Persist {
    Idle,
    /// Replica write waiting for the sequencer
    Start { replica: usize, revision: u32 },
    /// Replica write in flight
    Wait {
        replica: usize,
        revision: u32,
        job: JobId,
    },
}

/// RAM copy of the configuration plus its write-back state
pub struct ConfigStore<C: Checksum> {
    record: ConfigRecord,
    engine: C,
    /// Bumped on every mutation
    revision: u32,
    /// Revision present in all three replicas
    persisted: u32,
    persist: Persist,
    /// Revision whose write failed; not retried until it changes
    failed: Option<u32>,
    write_error: Option<WriteError>,
}

impl<C: Checksum> ConfigStore<C> {
    /// Create a store holding factory defaults, not yet validated
    pub fn new(engine: C) -> Self {
        let mut store = Self {
            record: factory_defaults(),
            engine,
            revision: 0,
            persisted: 0,
            persist: Persist::Idle,
            failed: None,
            write_error: None,
        };
        store.seal();
        store
    }

    /// Load the first valid replica into RAM
    ///
    /// Returns true when a stored record was found. Without one, factory
    /// defaults are loaded and the store is dirty. Damaged or stale
    /// replicas next to a valid one also leave the store dirty so the
    /// background writer repairs them.
    pub fn validate_and_restore<D: EepromDevice>(&mut self, dev: &mut D) -> bool {
        let mut chosen: Option<ConfigRecord> = None;
        let mut all_match = true;

        for replica in 0..REPLICAS {
            let mut image = [0u8; RECORD_SIZE];
            let address = replica_address(replica, D::PAGE_SIZE);
            let record = match dev.read(address, &mut image) {
                Ok(()) => self.verify(&image),
                Err(_) => None,
            };

            let first = chosen.as_ref().map(|r| r.checksum);
            match (first, record) {
                (None, Some(record)) => chosen = Some(record),
                (Some(first), Some(record)) if record.checksum == first => {}
                _ => all_match = false,
            }
        }

        self.persist = Persist::Idle;
        self.failed = None;
        match chosen {
            Some(record) => {
                self.record = record;
                self.persisted = self.revision;
                if !all_match {
                    self.mark_dirty();
                }
                true
            }
            None => {
                self.record = factory_defaults();
                self.commit();
                false
            }
        }
    }

    /// Replace the RAM copy with factory defaults and schedule a write
    pub fn force_factory_defaults(&mut self) {
        self.record = factory_defaults();
        self.failed = None;
        self.commit();
    }

    /// Write the record back when dirty; call once per superloop pass
    ///
    /// Never waits: starts at most one replica write and collects the
    /// outcome of the previous one.
    pub fn run_fsm<D: EepromDevice, const CAP: usize>(
        &mut self,
        writer: &mut PagedWriter<CAP>,
        dev: &mut D,
        now_ms: u32,
    ) {
        if let Persist::Wait {
            replica,
            revision,
            job,
        } = self.persist
        {
            let outcome = match writer.take_finished(job) {
                Some(outcome) => outcome,
                None if writer.is_idle() => Err(WriteError::Bus),
                None => return,
            };
            if let Err(e) = outcome {
                self.fail(revision, e);
                return;
            }
            if replica + 1 == REPLICAS {
                self.persisted = revision;
                self.persist = Persist::Idle;
                return;
            }
            self.persist = Persist::Start {
                replica: replica + 1,
                revision,
            };
        }

        if self.persist == Persist::Idle {
            if !self.is_dirty() || self.failed == Some(self.revision) {
                return;
            }
            self.persist = Persist::Start {
                replica: 0,
                revision: self.revision,
            };
        }

        if let Persist::Start { replica, revision } = self.persist {
            if !writer.is_idle() {
                return;
            }
            let image = self.record.to_bytes();
            let address = replica_address(replica, D::PAGE_SIZE);
            match writer.start(dev, address, &image, now_ms) {
                Ok(job) => {
                    self.persist = Persist::Wait {
                        replica,
                        revision,
                        job,
                    }
                }
                Err(WriteError::Busy) => {}
                Err(e) => self.fail(revision, e),
            }
        }
    }

    /// True while RAM differs from what all replicas hold
    pub fn is_dirty(&self) -> bool {
        self.revision != self.persisted
    }

    /// True while a replica write is in progress
    pub fn is_saving(&self) -> bool {
        self.persist != Persist::Idle
    }

    /// Retry a failed write, or rewrite an unchanged record
    pub fn request_save(&mut self) {
        self.failed = None;
        self.mark_dirty();
    }

    /// Error from the last abandoned write, consumed once
    pub fn take_write_error(&mut self) -> Option<WriteError> {
        self.write_error.take()
    }

    /// Copy of the whole record
    pub fn snapshot(&self) -> ConfigRecord {
        self.record.clone()
    }

    // Getters

    pub fn language(&self) -> u8 {
        self.record.language
    }

    pub fn active_grain_index(&self) -> u8 {
        self.record.grain
    }

    pub fn grain_count(&self) -> usize {
        MAX_GRAINS
    }

    pub fn grain(&self, index: usize) -> Option<GrainProfile> {
        self.record.grains.get(index).cloned()
    }

    pub fn active_grain(&self) -> GrainProfile {
        self.record.active_grain().clone()
    }

    pub fn password(&self) -> String<PASSWORD_LEN> {
        self.record.password.clone()
    }

    pub fn check_password(&self, candidate: &str) -> bool {
        self.record.password.as_str() == candidate
    }

    /// Scale A calibration as (gain, zero)
    pub fn calibration(&self) -> (f32, f32) {
        (self.record.gain, self.record.zero)
    }

    pub fn repetitions(&self) -> u16 {
        self.record.repetitions
    }

    pub fn decimals(&self) -> u16 {
        self.record.decimals
    }

    pub fn user(&self, index: usize) -> Option<UserProfile> {
        self.record.users.get(index).cloned()
    }

    pub fn serial(&self) -> String<SERIAL_LEN> {
        self.record.serial.clone()
    }

    // Setters: validate, write, recompute checksum, mark dirty

    pub fn set_language(&mut self, index: u8) -> Result<(), ConfigError> {
        if index as usize >= LANGUAGES {
            return Err(ConfigError::IndexOutOfRange);
        }
        self.record.language = index;
        self.commit();
        Ok(())
    }

    pub fn set_active_grain(&mut self, index: u8) -> Result<(), ConfigError> {
        if index as usize >= MAX_GRAINS {
            return Err(ConfigError::IndexOutOfRange);
        }
        self.record.grain = index;
        self.commit();
        Ok(())
    }

    pub fn set_password(&mut self, password: &str) -> Result<(), ConfigError> {
        self.record.password = field(password)?;
        self.commit();
        Ok(())
    }

    pub fn set_calibration(&mut self, gain: f32, zero: f32) -> Result<(), ConfigError> {
        if !gain.is_finite() || !zero.is_finite() {
            return Err(ConfigError::InvalidValue);
        }
        self.record.gain = gain;
        self.record.zero = zero;
        self.commit();
        Ok(())
    }

    pub fn set_repetitions(&mut self, count: u16) -> Result<(), ConfigError> {
        if !REPETITIONS.contains(&count) {
            return Err(ConfigError::InvalidValue);
        }
        self.record.repetitions = count;
        self.commit();
        Ok(())
    }

    pub fn set_decimals(&mut self, places: u16) -> Result<(), ConfigError> {
        if places > MAX_DECIMALS {
            return Err(ConfigError::InvalidValue);
        }
        self.record.decimals = places;
        self.commit();
        Ok(())
    }

    pub fn set_grain(&mut self, index: usize, profile: GrainProfile) -> Result<(), ConfigError> {
        if index >= MAX_GRAINS {
            return Err(ConfigError::IndexOutOfRange);
        }
        if profile.humidity_min > profile.humidity_max
            || has_nul(&profile.name)
            || has_nul(&profile.validity)
        {
            return Err(ConfigError::InvalidValue);
        }
        self.record.grains[index] = profile;
        self.commit();
        Ok(())
    }

    pub fn set_user_name(&mut self, index: usize, name: &str) -> Result<(), ConfigError> {
        if index >= MAX_USERS {
            return Err(ConfigError::IndexOutOfRange);
        }
        self.record.users[index].name = field::<USER_NAME_LEN>(name)?;
        self.commit();
        Ok(())
    }

    pub fn set_company(&mut self, index: usize, company: &str) -> Result<(), ConfigError> {
        if index >= MAX_USERS {
            return Err(ConfigError::IndexOutOfRange);
        }
        self.record.users[index].company = field::<COMPANY_LEN>(company)?;
        self.commit();
        Ok(())
    }

    pub fn set_serial(&mut self, serial: &str) -> Result<(), ConfigError> {
        self.record.serial = field(serial)?;
        self.commit();
        Ok(())
    }

    fn verify(&mut self, image: &[u8; RECORD_SIZE]) -> Option<ConfigRecord> {
        let computed = self.engine.checksum(ConfigRecord::body(image));
        if computed != ConfigRecord::stored_checksum(image) {
            return None;
        }
        ConfigRecord::from_bytes(image).ok()
    }

    fn seal(&mut self) {
        let image = self.record.to_bytes();
        self.record.checksum = self.engine.checksum(ConfigRecord::body(&image));
    }

    fn commit(&mut self) {
        self.seal();
        self.mark_dirty();
    }

    fn mark_dirty(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    fn fail(&mut self, revision: u32, error: WriteError) {
        self.persist = Persist::Idle;
        self.failed = Some(revision);
        self.write_error = Some(error);
    }
}

fn has_nul(text: &str) -> bool {
    text.bytes().any(|b| b == 0)
}

/// Copy `text` into a fixed-width field
fn field<const N: usize>(text: &str) -> Result<String<N>, ConfigError> {
    if has_nul(text) {
        return Err(ConfigError::InvalidValue);
    }
    let mut out = String::new();
    out.push_str(text).map_err(|_| ConfigError::TooLong)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::checksum::Crc32;
    use crate::storage::sequencer::mock::MemEeprom;
    use crate::storage::PagedWriter;
    use proptest::prelude::*;

    type Writer = PagedWriter<RECORD_SIZE>;

    /// Run writer and store until the store settles
    fn settle(store: &mut ConfigStore<Crc32>, writer: &mut Writer, dev: &mut MemEeprom) {
        let mut now = 0;
        for _ in 0..10_000 {
            writer.poll(dev, now);
            store.run_fsm(writer, dev, now);
            if !store.is_saving() && writer.is_idle() && !store.is_dirty() {
                return;
            }
            now += 1;
        }
        panic!("store did not settle");
    }

    #[test]
    fn test_replica_layout() {
        assert_eq!(replica_spacing(32), 704);
        assert_eq!(replica_address(0, 32), 0);
        assert_eq!(replica_address(1, 32), 704);
        assert_eq!(replica_address(2, 32), 1408);
    }

    #[test]
    fn test_blank_eeprom_loads_defaults() {
        let mut dev = MemEeprom::default();
        let mut store = ConfigStore::new(Crc32);

        assert!(!store.validate_and_restore(&mut dev));
        assert!(store.is_dirty());
        assert_eq!(store.snapshot().grains, factory_defaults().grains);
    }

    #[test]
    fn test_persist_then_restore() {
        let mut dev = MemEeprom::default();
        let mut writer = Writer::new();
        let mut store = ConfigStore::new(Crc32);
        store.validate_and_restore(&mut dev);

        store.set_language(3).unwrap();
        store.set_calibration(1.5, -0.25).unwrap();
        store.set_user_name(2, "Maria").unwrap();
        store.set_serial("GR-000123").unwrap();
        settle(&mut store, &mut writer, &mut dev);
        assert!(!store.is_dirty());

        // All three replicas hold the same image
        let primary = &dev.mem[0..RECORD_SIZE];
        assert_eq!(&dev.mem[704..704 + RECORD_SIZE], primary);
        assert_eq!(&dev.mem[1408..1408 + RECORD_SIZE], primary);

        let mut fresh = ConfigStore::new(Crc32);
        assert!(fresh.validate_and_restore(&mut dev));
        assert!(!fresh.is_dirty());
        assert_eq!(fresh.snapshot(), store.snapshot());
        assert_eq!(fresh.snapshot().to_bytes(), store.snapshot().to_bytes());
    }

    #[test]
    fn test_corrupt_primary_falls_back_and_repairs() {
        let mut dev = MemEeprom::default();
        let mut writer = Writer::new();
        let mut store = ConfigStore::new(Crc32);
        store.validate_and_restore(&mut dev);
        store.set_active_grain(4).unwrap();
        settle(&mut store, &mut writer, &mut dev);

        dev.mem[100] ^= 0x55;

        let mut fresh = ConfigStore::new(Crc32);
        assert!(fresh.validate_and_restore(&mut dev));
        assert_eq!(fresh.active_grain_index(), 4);
        assert!(fresh.is_dirty());

        settle(&mut fresh, &mut writer, &mut dev);
        assert_eq!(&dev.mem[0..RECORD_SIZE], &dev.mem[704..704 + RECORD_SIZE]);
    }

    #[test]
    fn test_all_replicas_corrupt() {
        let mut dev = MemEeprom::default();
        let mut writer = Writer::new();
        let mut store = ConfigStore::new(Crc32);
        store.validate_and_restore(&mut dev);
        store.set_decimals(2).unwrap();
        settle(&mut store, &mut writer, &mut dev);

        for replica in 0..REPLICAS {
            dev.mem[replica_address(replica, 32) as usize + 10] ^= 0xFF;
        }

        let mut fresh = ConfigStore::new(Crc32);
        assert!(!fresh.validate_and_restore(&mut dev));
        assert_eq!(fresh.decimals(), factory_defaults().decimals);
        assert!(fresh.is_dirty());
    }

    #[test]
    fn test_rejected_setter_changes_nothing() {
        let mut store = ConfigStore::new(Crc32);
        let before = store.snapshot();
        let dirty = store.is_dirty();

        assert_eq!(store.set_language(6), Err(ConfigError::IndexOutOfRange));
        assert_eq!(store.set_active_grain(7), Err(ConfigError::IndexOutOfRange));
        assert_eq!(store.set_password("12345678901"), Err(ConfigError::TooLong));
        assert_eq!(store.set_decimals(4), Err(ConfigError::InvalidValue));
        assert_eq!(store.set_repetitions(0), Err(ConfigError::InvalidValue));
        assert_eq!(
            store.set_calibration(f32::INFINITY, 0.0),
            Err(ConfigError::InvalidValue)
        );
        assert_eq!(store.set_user_name(10, "x"), Err(ConfigError::IndexOutOfRange));

        assert_eq!(store.snapshot(), before);
        assert_eq!(store.is_dirty(), dirty);
    }

    #[test]
    fn test_setter_during_write_keeps_dirty() {
        let mut dev = MemEeprom::default();
        let mut writer = Writer::new();
        let mut store = ConfigStore::new(Crc32);
        store.validate_and_restore(&mut dev);

        store.run_fsm(&mut writer, &mut dev, 0);
        assert!(store.is_saving());
        store.set_repetitions(5).unwrap();

        settle(&mut store, &mut writer, &mut dev);
        let mut fresh = ConfigStore::new(Crc32);
        assert!(fresh.validate_and_restore(&mut dev));
        assert_eq!(fresh.repetitions(), 5);
    }

    #[test]
    fn test_failed_write_not_retried_until_change() {
        let mut dev = MemEeprom {
            fail_at: Some(3),
            ..Default::default()
        };
        let mut writer = Writer::new();
        let mut store = ConfigStore::new(Crc32);
        store.validate_and_restore(&mut dev);

        for now in 0..200 {
            writer.poll(&mut dev, now);
            store.run_fsm(&mut writer, &mut dev, now);
        }
        assert_eq!(store.take_write_error(), Some(WriteError::Bus));
        assert!(store.is_dirty());
        assert!(!store.is_saving());
        let attempts = dev.writes.len();

        for now in 200..400 {
            writer.poll(&mut dev, now);
            store.run_fsm(&mut writer, &mut dev, now);
        }
        assert_eq!(dev.writes.len(), attempts);

        dev.fail_at = None;
        store.request_save();
        settle(&mut store, &mut writer, &mut dev);
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_password_check() {
        let mut store = ConfigStore::new(Crc32);
        store.set_password("0042").unwrap();
        assert!(store.check_password("0042"));
        assert!(!store.check_password("42"));
    }

    proptest! {
        #[test]
        fn prop_out_of_range_grain_rejected(index in 7u8..=255) {
            let mut store = ConfigStore::new(Crc32);
            let before = store.snapshot();
            prop_assert_eq!(store.set_active_grain(index), Err(ConfigError::IndexOutOfRange));
            prop_assert_eq!(store.snapshot(), before);
        }
    }
}
