//! Session-scoped collections of documents, questions and configurations.
//!
//! A [`CollectionManager`] is the only writer of its mirror. The mirror
//! follows confirmed server state: a created entity is appended only once
//! the service echoes it back, and a deleted one is removed only once the
//! service confirms. Insertion order is display order.

use crate::api::ServiceClient;
use crate::error::{RagEvalError, Result};
use crate::models::{Configuration, Document, DocumentUpload, NewConfiguration, Question};
use crate::workspace::{Mirrored, Workspace};
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Maps an entity kind to its create/delete endpoints.
pub trait RemoteEntity: Mirrored {
    /// What the caller supplies to create one.
    type Draft: Send + Sync + ?Sized;

    /// Local checks run before any request.
    fn validate(draft: &Self::Draft) -> Result<()>;

    fn remote_create<'a>(
        client: &'a ServiceClient,
        draft: &'a Self::Draft,
        session_id: &'a str,
    ) -> impl Future<Output = Result<Self>> + Send + 'a;

    fn remote_delete<'a>(
        client: &'a ServiceClient,
        id: &'a str,
        session_id: &'a str,
    ) -> impl Future<Output = Result<()>> + Send + 'a;
}

impl RemoteEntity for Document {
    type Draft = DocumentUpload;

    fn validate(draft: &DocumentUpload) -> Result<()> {
        draft.check_type()
    }

    fn remote_create<'a>(
        client: &'a ServiceClient,
        draft: &'a DocumentUpload,
        session_id: &'a str,
    ) -> impl Future<Output = Result<Self>> + Send + 'a {
        client.upload_document(draft, session_id)
    }

    fn remote_delete<'a>(
        client: &'a ServiceClient,
        id: &'a str,
        session_id: &'a str,
    ) -> impl Future<Output = Result<()>> + Send + 'a {
        client.delete_document(id, session_id)
    }
}

impl RemoteEntity for Question {
    type Draft = str;

    fn validate(text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Err(RagEvalError::validation("question text is required"));
        }
        Ok(())
    }

    fn remote_create<'a>(
        client: &'a ServiceClient,
        text: &'a str,
        session_id: &'a str,
    ) -> impl Future<Output = Result<Self>> + Send + 'a {
        client.add_question(text, session_id)
    }

    fn remote_delete<'a>(
        client: &'a ServiceClient,
        id: &'a str,
        session_id: &'a str,
    ) -> impl Future<Output = Result<()>> + Send + 'a {
        client.delete_question(id, session_id)
    }
}

impl RemoteEntity for Configuration {
    type Draft = NewConfiguration;

    fn validate(draft: &NewConfiguration) -> Result<()> {
        draft.validate()
    }

    fn remote_create<'a>(
        client: &'a ServiceClient,
        draft: &'a NewConfiguration,
        session_id: &'a str,
    ) -> impl Future<Output = Result<Self>> + Send + 'a {
        client.add_configuration(draft, session_id)
    }

    fn remote_delete<'a>(
        client: &'a ServiceClient,
        id: &'a str,
        session_id: &'a str,
    ) -> impl Future<Output = Result<()>> + Send + 'a {
        client.delete_configuration(id, session_id)
    }
}

type Listener<T> = Arc<dyn Fn(&[T]) + Send + Sync>;

fn require<'a>(value: &'a str, what: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RagEvalError::validation(format!("{} is required", what)));
    }
    Ok(trimmed)
}

/// Create/delete front for one kind of entity.
pub struct CollectionManager<T: RemoteEntity> {
    client: ServiceClient,
    workspace: Workspace,
    listeners: Arc<Mutex<Vec<Listener<T>>>>,
}

impl<T: RemoteEntity> Clone for CollectionManager<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            workspace: self.workspace.clone(),
            listeners: Arc::clone(&self.listeners),
        }
    }
}

impl<T: RemoteEntity> fmt::Debug for CollectionManager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionManager")
            .field("kind", &T::KIND)
            .finish_non_exhaustive()
    }
}

impl<T: RemoteEntity> CollectionManager<T> {
    pub fn new(client: ServiceClient, workspace: Workspace) -> Self {
        Self {
            client,
            workspace,
            listeners: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Register a callback invoked with the whole mirror after every
    /// confirmed create or delete.
    pub fn on_change(&self, listener: impl Fn(&[T]) + Send + Sync + 'static) {
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.push(Arc::new(listener));
        }
    }

    fn notify(&self, items: &[T]) {
        let listeners = match self.listeners.lock() {
            Ok(listeners) => listeners.clone(),
            Err(_) => return,
        };
        for listener in listeners {
            listener(items);
        }
    }

    /// Current mirror contents, in display order.
    pub async fn items(&self) -> Vec<T> {
        T::mirror(&*self.workspace.read().await).clone()
    }

    pub async fn get(&self, id: &str) -> Option<T> {
        T::mirror(&*self.workspace.read().await)
            .iter()
            .find(|item| item.id() == id)
            .cloned()
    }

    pub async fn len(&self) -> usize {
        T::mirror(&*self.workspace.read().await).len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Create an entity on the service and append the echoed copy.
    ///
    /// Missing session ids and invalid drafts are refused without a request.
    /// If the active session changed while the request was out, the entity
    /// is returned but not shown.
    pub async fn create(&self, draft: &T::Draft, session_id: &str) -> Result<T> {
        let session_id = require(session_id, "session id")?;
        T::validate(draft)?;

        let entity = T::remote_create(&self.client, draft, session_id).await?;

        if entity.session_id() != session_id {
            return Err(RagEvalError::InvalidResponse(format!(
                "created {} {} belongs to session {}, expected {}",
                T::KIND,
                entity.id(),
                entity.session_id(),
                session_id
            )));
        }

        let items = {
            let mut state = self.workspace.write().await;
            if !state.is_active(session_id) {
                warn!(kind = T::KIND, id = entity.id(), session_id, "session changed during create, not mirroring");
                return Ok(entity);
            }

            let mirror = T::mirror_mut(&mut state);
            match mirror.iter().position(|item| item.id() == entity.id()) {
                Some(index) => mirror[index] = entity.clone(),
                None => mirror.push(entity.clone()),
            }
            mirror.clone()
        };

        info!(kind = T::KIND, id = entity.id(), session_id, "created");
        self.notify(&items);
        Ok(entity)
    }

    /// Delete an entity on the service, then drop it from the mirror.
    ///
    /// A failed delete leaves the mirror as it was.
    pub async fn delete(&self, id: &str, session_id: &str) -> Result<()> {
        let id = require(id, &format!("{} id", T::KIND))?;
        let session_id = require(session_id, "session id")?;

        T::remote_delete(&self.client, id, session_id).await?;

        let items = {
            let mut state = self.workspace.write().await;
            if !state.is_active(session_id) {
                warn!(kind = T::KIND, id, session_id, "session changed during delete, mirror untouched");
                return Ok(());
            }

            let mirror = T::mirror_mut(&mut state);
            let before = mirror.len();
            mirror.retain(|item| item.id() != id);
            if mirror.len() == before {
                debug!(kind = T::KIND, id, "deleted entity was not in the mirror");
            }
            mirror.clone()
        };

        info!(kind = T::KIND, id, session_id, "deleted");
        self.notify(&items);
        Ok(())
    }
}

pub type Documents = CollectionManager<Document>;
pub type Questions = CollectionManager<Question>;
pub type Configurations = CollectionManager<Configuration>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_trims() {
        assert_eq!(require("  s1 ", "session id").unwrap(), "s1");
        assert!(matches!(
            require("   ", "session id"),
            Err(RagEvalError::Validation(msg)) if msg == "session id is required"
        ));
    }

    #[test]
    fn test_question_validation() {
        assert!(Question::validate("What is RUS?").is_ok());
        assert!(Question::validate("  ").is_err());
    }

    #[test]
    fn test_document_validation_is_type_check() {
        let upload = DocumentUpload::new("slides.pptx", b"PK".to_vec());
        assert!(matches!(
            Document::validate(&upload),
            Err(RagEvalError::UploadRejected(_))
        ));
    }
}
