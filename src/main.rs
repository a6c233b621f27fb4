//! Kodegen Bundler Android - APK bundler for Android projects.
//!
//! This binary compiles, packages, aligns and signs an APK described by a
//! `bundle.toml` manifest and reports the outcome of every stage.

use kodegen_bundler_android::cli;
use std::process;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Run CLI and get exit code
    let exit_code = match cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    process::exit(exit_code);
}
