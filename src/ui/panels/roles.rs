use super::table::{TablePanel, TableResource};
use super::{PanelContext, ResourceRow};
use crate::models::{Arn, Role, format_epoch_ms};
use crate::services::{ApiError, fetch};
use crate::task::Sink;

pub type RolesPanel = TablePanel<Role>;

impl TableResource for Role {
    const TASK_LABEL: &'static str = "roles";
    const NOUN: &'static str = "roles";

    fn row(&self) -> ResourceRow {
        let mut detail = Arn::parse(&self.arn)
            .map(|arn| arn.describe())
            .unwrap_or_else(|| self.arn.clone());
        if let Some(description) = &self.description {
            detail.push_str("\nDescription: ");
            detail.push_str(description);
        }

        ResourceRow {
            name: self.name.clone(),
            arn: self.arn.clone(),
            created: format_epoch_ms(self.create_date_ms),
            detail,
        }
    }

    fn produce(context: &PanelContext, sink: &Sink<Self, ApiError>) {
        fetch::fetch_all_roles(context.factory.as_ref(), &context.session, context.settings, sink);
    }
}
