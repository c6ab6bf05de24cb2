//! Shared application state

use chrono_tz::Tz;
use inout_core::{
    config::{ExternalConfig, RealtimeConfig},
    traits::{
        ExternalProjectFactory, IntegrationRepository, PreferencesRepository,
        UserControlRepository,
    },
};
use inout_services::{ChangeHub, DashboardService, HistoryService};
use std::sync::Arc;

/// Everything handlers need, registered once as `web::Data<AppState>`
#[derive(Clone)]
pub struct AppState {
    pub integrations: Arc<dyn IntegrationRepository>,
    pub preferences: Arc<dyn PreferencesRepository>,
    pub user_control: Arc<dyn UserControlRepository>,
    pub projects: Arc<dyn ExternalProjectFactory>,
    pub dashboard: Arc<DashboardService>,
    pub history: Arc<HistoryService>,
    pub hub: Arc<ChangeHub>,
    pub external: ExternalConfig,
    pub realtime: RealtimeConfig,
    pub tz: Tz,
}
