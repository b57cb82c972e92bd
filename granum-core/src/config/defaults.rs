//! Factory configuration

use heapless::String;

use super::record::{ConfigRecord, GrainProfile, CONFIG_VERSION};

/// Built-in grain curves: name, curve id, humidity min, humidity max
const GRAIN_TABLE: [(&str, u32, i16, i16); 7] = [
    ("Amendoim", 13817, 1, 30),
    ("Arroz Bene Poli", 13887, 5, 30),
    ("Arroz Casca Natu", 13882, 7, 30),
    ("Aveia", 13782, 6, 22),
    ("Cafe ISO6673", 13774, 7, 25),
    ("Farelo de Soja", 13888, 6, 24),
    ("Feijao Carioca", 13868, 5, 35),
];

const DEFAULT_PASSWORD: &str = "1234";

fn text<const N: usize>(s: &str) -> String<N> {
    let mut out = String::new();
    // Table entries fit their fields; anything longer is cut at a char boundary
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

/// Record loaded when no valid replica exists
pub fn factory_defaults() -> ConfigRecord {
    let grains = GRAIN_TABLE.map(|(name, curve_id, humidity_min, humidity_max)| GrainProfile {
        name: text(name),
        validity: String::new(),
        curve_id,
        humidity_min,
        humidity_max,
    });

    ConfigRecord {
        version: CONFIG_VERSION,
        language: 0,
        grain: 0,
        password: text(DEFAULT_PASSWORD),
        gain: 1.0,
        zero: 0.0,
        repetitions: 1,
        decimals: 1,
        grains,
        users: Default::default(),
        serial: String::new(),
        checksum: 0,
    }
}
