//! One place that wires the session controller, the three collections and
//! both runners around a shared workspace.

use crate::api::ServiceClient;
use crate::collections::{Configurations, Documents, Questions};
use crate::config::Config;
use crate::error::Result;
use crate::evaluation::EvaluationRunner;
use crate::judge::JudgeRunner;
use crate::persistence::SessionStore;
use crate::session::SessionController;
use crate::workspace::Workspace;

#[derive(Debug, Clone)]
pub struct Workbench {
    pub session: SessionController,
    pub documents: Documents,
    pub questions: Questions,
    pub configurations: Configurations,
    pub evaluation: EvaluationRunner,
    pub judge: JudgeRunner,
    workspace: Workspace,
}

impl Workbench {
    /// Build everything from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let client = ServiceClient::new(&config.service)?;
        let store = SessionStore::new(config.session_file()?);
        Ok(Self::new(client, store))
    }

    pub fn new(client: ServiceClient, store: SessionStore) -> Self {
        let workspace = Workspace::new();
        Self {
            session: SessionController::new(client.clone(), store, workspace.clone()),
            documents: Documents::new(client.clone(), workspace.clone()),
            questions: Questions::new(client.clone(), workspace.clone()),
            configurations: Configurations::new(client.clone(), workspace.clone()),
            evaluation: EvaluationRunner::new(client.clone(), workspace.clone()),
            judge: JudgeRunner::new(client, workspace.clone()),
            workspace,
        }
    }

    /// Read-only view of the shared state.
    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }
}
