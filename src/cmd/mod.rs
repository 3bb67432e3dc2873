//! CLI command implementations.
//!
//! | Module    | Commands handled |
//! |-----------|------------------|
//! | `audit`   | `Audit`          |
//! | `workers` | `Workers`        |
//! | `config`  | `Config`         |

pub mod audit;
pub mod config;
pub mod workers;

pub use audit::cmd_audit;
pub use config::cmd_config;
pub use workers::cmd_workers;
