//! Persistent configuration
//!
//! The instrument keeps one [`ConfigRecord`] in RAM. It is stored as three
//! checksummed replicas in EEPROM and written back in the background.

pub mod checksum;
pub mod defaults;
pub mod record;
pub mod store;

pub use checksum::{Checksum, Crc32};
pub use defaults::factory_defaults;
pub use record::{
    ConfigRecord, GrainProfile, RecordError, UserProfile, CONFIG_VERSION, LANGUAGES, MAX_GRAINS,
    MAX_USERS, RECORD_SIZE,
};
pub use store::{replica_address, replica_spacing, ConfigError, ConfigStore, REPLICAS};
