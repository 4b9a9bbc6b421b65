//! Content collaborator port

use gameplan_domain::{Topic, TopicId};

/// Read-only topic catalog.
pub trait TopicCatalog: Send + Sync {
    fn topics(&self) -> Vec<Topic>;

    fn topic(&self, id: &TopicId) -> Option<Topic> {
        self.topics().into_iter().find(|t| &t.id == id)
    }
}
