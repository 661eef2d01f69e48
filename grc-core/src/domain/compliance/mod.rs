// grc-core/src/domain/compliance/mod.rs

pub mod analysis;
pub mod dataset;
pub mod department;
pub mod gaps;
pub mod rating;
pub mod report;
pub mod scoring;
pub mod trend;

pub use analysis::ReportAnalysis;
pub use dataset::ComplianceDataset;
pub use department::DepartmentScore;
pub use gaps::{GapAnalysis, GapCategory, GapDetail, GapSeverity};
pub use rating::ComplianceRating;
pub use report::{
    ComplianceDashboard, ComplianceReport, GenerateReportRequest, ReportFilter, ReportNarrative,
    ReportPeriod, UpdateNarrativeRequest,
};
pub use scoring::{AssetMetrics, ComplianceScores, ControlMetrics, PolicyMetrics};
pub use trend::{Forecast, TrendDirection, TrendPoint};
