pub mod icons;
pub mod progress;
pub mod report;

pub use progress::AuditProgressView;
pub use report::{OutputFormat, render_json, render_text};
