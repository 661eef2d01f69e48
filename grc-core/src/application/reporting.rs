// grc-core/src/application/reporting.rs

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::application::narrative::NarrativeWriter;
use crate::application::ports::TemplateEngine;
use crate::domain::compliance::report::end_of_day;
use crate::domain::compliance::trend::TREND_WINDOW;
use crate::domain::compliance::{
    ComplianceDashboard, ComplianceDataset, ComplianceReport, GenerateReportRequest, ReportAnalysis,
    ReportFilter, ReportPeriod, UpdateNarrativeRequest,
};
use crate::domain::page::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::domain::{DomainError, Page, Window};
use crate::error::GrcError;
use crate::infrastructure::fs::atomic_write;
use crate::ports::GrcStore;

/// Score computation, snapshot persistence and report retrieval.
pub struct ComplianceReportingService {
    store: Arc<dyn GrcStore>,
    narratives: NarrativeWriter,
    default_page_size: u32,
    max_page_size: u32,
    // One generation at a time, so snapshot existence checks can't race.
    generation: Mutex<()>,
}

impl ComplianceReportingService {
    pub fn new(store: Arc<dyn GrcStore>, templates: Arc<dyn TemplateEngine>) -> Self {
        Self {
            store,
            narratives: NarrativeWriter::new(templates),
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
            generation: Mutex::new(()),
        }
    }

    pub fn with_page_limits(mut self, default_page_size: u32, max_page_size: u32) -> Self {
        self.default_page_size = default_page_size;
        self.max_page_size = max_page_size;
        self
    }

    #[instrument(skip(self, request), fields(period = %request.report_period, start = %request.period_start_date))]
    pub async fn generate_report(
        &self,
        request: GenerateReportRequest,
        created_by: Option<Uuid>,
    ) -> Result<ComplianceReport, GrcError> {
        request.validate()?;
        let _guard = self.generation.lock().await;
        self.generate_locked(&request, created_by).await
    }

    /// Daily snapshot for `date`. Returns `None` when one already exists.
    #[instrument(skip(self))]
    pub async fn ensure_snapshot_for_date(
        &self,
        date: NaiveDate,
    ) -> Result<Option<ComplianceReport>, GrcError> {
        let _guard = self.generation.lock().await;
        if self.store.report_exists(ReportPeriod::Daily, date, date).await? {
            debug!(%date, "Daily snapshot already present");
            return Ok(None);
        }
        let request = GenerateReportRequest::new(ReportPeriod::Daily, date, date);
        self.generate_locked(&request, None).await.map(Some)
    }

    async fn generate_locked(
        &self,
        request: &GenerateReportRequest,
        created_by: Option<Uuid>,
    ) -> Result<ComplianceReport, GrcError> {
        let cutoff = end_of_day(request.period_end_date);
        let dataset = self.load_dataset(cutoff).await?.as_of(cutoff);
        let history = self
            .store
            .report_history(request.report_period, request.period_start_date, TREND_WINDOW)
            .await?;

        let analysis = ReportAnalysis::compute(&dataset, request, &history);
        let narrative = self.narratives.write(request, &analysis)?;
        let report = ComplianceReport::assemble(request, analysis, narrative, created_by, Utc::now());

        self.store.insert_report(&report).await?;
        info!(
            report_id = %report.id,
            score = report.overall_compliance_score,
            rating = %report.overall_compliance_rating,
            "Compliance report generated"
        );
        Ok(report)
    }

    /// Rows as they stood at `cutoff`, including ones deleted since.
    async fn load_dataset(&self, cutoff: DateTime<Utc>) -> Result<ComplianceDataset, GrcError> {
        let (policies, assignments, controls, mappings) = tokio::try_join!(
            self.store.policies_as_of(cutoff),
            self.store.all_assignments(),
            self.store.controls_as_of(cutoff),
            self.store.mappings_as_of(cutoff),
        )?;
        Ok(ComplianceDataset {
            policies,
            assignments,
            controls,
            mappings,
        })
    }

    pub async fn get_report(&self, id: Uuid) -> Result<ComplianceReport, GrcError> {
        self.store
            .get_report(id)
            .await?
            .ok_or_else(|| DomainError::not_found("ComplianceReport", id).into())
    }

    pub async fn get_reports(&self, filter: &ReportFilter) -> Result<Page<ComplianceReport>, GrcError> {
        let window = Window::bounded(
            filter.skip,
            filter.take,
            self.default_page_size,
            self.max_page_size,
        );
        self.store.list_reports(filter, window).await
    }

    pub async fn get_latest_report(&self) -> Result<Option<ComplianceReport>, GrcError> {
        self.store.latest_report().await
    }

    pub async fn get_dashboard(&self) -> Result<ComplianceDashboard, GrcError> {
        let latest = self
            .get_latest_report()
            .await?
            .ok_or_else(|| DomainError::not_found("ComplianceReport", "latest"))?;
        Ok(ComplianceDashboard::from(&latest))
    }

    /// Idempotent: archiving an archived report is a no-op.
    #[instrument(skip(self))]
    pub async fn archive_report(&self, id: Uuid) -> Result<ComplianceReport, GrcError> {
        let mut report = self.get_report(id).await?;
        if !report.is_archived {
            report.is_archived = true;
            self.store.update_report(&report).await?;
            info!(report_id = %id, "Report archived");
        }
        Ok(report)
    }

    #[instrument(skip(self))]
    pub async fn finalize_report(&self, id: Uuid) -> Result<ComplianceReport, GrcError> {
        let mut report = self.get_report(id).await?;
        if !report.is_final {
            report.is_final = true;
            self.store.update_report(&report).await?;
            info!(report_id = %id, "Report finalized");
        }
        Ok(report)
    }

    pub async fn update_narrative(
        &self,
        id: Uuid,
        update: UpdateNarrativeRequest,
    ) -> Result<ComplianceReport, GrcError> {
        update.validate()?;
        let mut report = self.get_report(id).await?;
        if report.is_final {
            return Err(DomainError::validation(format!(
                "Report {} is final and can no longer be edited",
                id
            ))
            .into());
        }
        report.apply_narrative(update);
        self.store.update_report(&report).await?;
        Ok(report)
    }

    /// Pretty JSON, written through a temp file so readers never see a partial export.
    pub async fn export_report(&self, id: Uuid, path: &Path) -> Result<ComplianceReport, GrcError> {
        let report = self.get_report(id).await?;
        let json = serde_json::to_vec_pretty(&report)?;
        atomic_write(path, json)?;
        info!(report_id = %id, path = ?path, "Report exported");
        Ok(report)
    }
}
