//! CLI command implementations.
//!
//! | Module    | Commands handled |
//! |-----------|------------------|
//! | `release` | `Release`        |
//! | `steps`   | `Steps`          |
//! | `config`  | `Config`         |

pub mod config;
pub mod release;
pub mod steps;

pub use config::cmd_config;
pub use release::{ReleaseOptions, cmd_release};
pub use steps::cmd_steps;
