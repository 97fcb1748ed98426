//! MSIX Packager - package a Windows application into a signed MSIX.
//!
//! Exits with 0 on success and 1 when packaging fails.

use msix_packager::cli;
use msix_packager::cli::OutputManager;
use std::process;

#[tokio::main]
async fn main() {
    match cli::run().await {
        Ok(exit_code) => {
            process::exit(exit_code);
        }
        Err(e) => {
            let output = OutputManager::new();
            output.error(&format!("Fatal error: {e}"));

            if let Some(context) = e.context()
                && let Ok(rendered) = serde_json::to_string_pretty(context)
            {
                output.error_detail(&rendered);
            }

            process::exit(1);
        }
    }
}
