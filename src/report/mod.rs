pub mod console;

pub use console::{format_console_report, format_scan_summary};
