pub mod comparison;
pub mod config;
pub mod error;
pub mod metric;
pub mod ranking;
pub mod record;
pub mod report;
pub mod series;
pub mod source;
pub mod trend;
pub mod window;

pub use error::CoreError;
pub use metric::{Metric, PageFilter};
pub use record::AnalyticsTables;
pub use report::{build_report, Report, ReportOptions, ReportRequest};
pub use source::AnalyticsSource;
