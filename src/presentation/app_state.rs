// Application state for HTTP handlers
use crate::application::glucose_service::GlucoseService;
use crate::application::poller::PollState;
use crate::infrastructure::config::DashboardSettings;
use tokio::sync::watch;

#[derive(Clone)]
pub struct AppState {
    pub glucose_service: GlucoseService,
    pub dashboard: watch::Receiver<PollState>,
    pub dashboard_settings: DashboardSettings,
}
