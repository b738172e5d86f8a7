// Application state for HTTP handlers
use crate::application::analysis_service::AnalysisService;
use crate::application::dashboard_service::DashboardService;

#[derive(Clone)]
pub struct AppState {
    pub dashboard_service: DashboardService,
    pub analysis_service: AnalysisService,
}
