pub mod formatter;

pub use formatter::{
    format_failures, format_history, format_rank, format_report, format_report_json, format_score,
    should_use_colors,
};
