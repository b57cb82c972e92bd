//! Build script for granum-firmware
//!
//! - Passes the cortex-m-rt and defmt linker scripts
//!
//! `memory.x` comes from embassy-stm32's `memory-x` feature.

use std::env;

fn main() {
    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");

    if env::var_os("CARGO_FEATURE_DEFMT").is_some() {
        println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
    }

    println!("cargo:rerun-if-changed=build.rs");
}
