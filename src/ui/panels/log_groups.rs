use super::table::{TablePanel, TableResource};
use super::{PanelContext, ResourceRow};
use crate::models::{Arn, LogGroup, format_epoch_ms};
use crate::services::{ApiError, fetch};
use crate::task::Sink;

pub type LogGroupsPanel = TablePanel<LogGroup>;

impl TableResource for LogGroup {
    const TASK_LABEL: &'static str = "log-groups";
    const NOUN: &'static str = "log groups";

    fn row(&self) -> ResourceRow {
        let retention = match self.retention_days {
            Some(days) => format!("{} days", days),
            None => "never expires".to_string(),
        };
        let mut detail = format!("Stored: {} bytes\nRetention: {}", self.stored_bytes, retention);
        if let Some(arn) = Arn::parse(&self.arn) {
            detail = format!("{}\n{}", arn.describe(), detail);
        }

        ResourceRow {
            name: self.name.clone(),
            arn: self.arn.clone(),
            created: format_epoch_ms(self.creation_time_ms),
            detail,
        }
    }

    fn produce(context: &PanelContext, sink: &Sink<Self, ApiError>) {
        fetch::fetch_all_log_groups(context.factory.as_ref(), &context.session, context.settings, sink);
    }
}
