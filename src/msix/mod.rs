//! Execution stage: layout, PRI indexing, packing and signing.
//!
//! Everything here consumes a resolved [`ProgramOptions`](crate::program::ProgramOptions)
//! and shells out through a [`ToolRunner`].

mod assets;
mod cert;
mod layout;
mod runner;
mod tools;

pub use assets::{DEFAULT_ASSETS, write_default_assets};
pub use cert::{DEV_CERT_SCRIPT, ensure_dev_cert, powershell, render_dev_cert_script};
pub use layout::create_layout;
pub use runner::{ProcessRunner, ToolRunner, clean_output};
pub use tools::{cert_publisher, make, pri, pri_config, sign};
