#![allow(clippy::multiple_crate_versions)]

//! Heicwall command-line entry point.

fn main() {
    if let Err(err) = heicwall_lib::cli::run() {
        eprintln!("heicwall: {err}");
        std::process::exit(1);
    }
}
