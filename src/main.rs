//! # Voxel Engine Demo Entry Point
//!
//! Builds a small world, edits a few blocks and logs the regenerated meshes. Set
//! `RUST_LOG=info` to see the output and `VOXEL_ENGINE_CONFIG` to point at a JSON
//! engine configuration.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release
//! ```

use std::process::ExitCode;

fn main() -> ExitCode {
    match voxel_engine::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
