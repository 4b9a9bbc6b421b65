//! Topic catalog adapter.

use gameplan_application::TopicCatalog;
use gameplan_domain::Topic;

/// Topics shipped with the binary.
pub fn builtin_topics() -> Vec<Topic> {
    vec![
        Topic::new(
            "intro-ai",
            "Intro to AI",
            "What artificial intelligence is, where it shows up in daily life and what it cannot do.",
        ),
        Topic::new(
            "machine-learning",
            "Machine Learning Basics",
            "How programs learn patterns from data: training, features, overfitting.",
        ),
        Topic::new(
            "neural-networks",
            "Neural Networks",
            "Neurons, layers, weights and how networks are trained with backpropagation.",
        ),
        Topic::new(
            "prompting",
            "Prompt Engineering",
            "Writing clear instructions for language models and checking their answers.",
        ),
        Topic::new(
            "ai-ethics",
            "AI Ethics",
            "Bias, privacy, transparency and responsible use of AI systems.",
        ),
    ]
}

/// Catalog fixed at construction.
#[derive(Debug, Clone)]
pub struct StaticTopicCatalog {
    topics: Vec<Topic>,
}

impl StaticTopicCatalog {
    pub fn new(topics: Vec<Topic>) -> Self {
        Self { topics }
    }

    pub fn builtin() -> Self {
        Self::new(builtin_topics())
    }

    /// Built-in topics with `overrides` replacing entries of the same id and
    /// new ids appended.
    pub fn with_overrides(overrides: Vec<Topic>) -> Self {
        let mut topics = builtin_topics();
        for topic in overrides {
            match topics.iter_mut().find(|t| t.id == topic.id) {
                Some(existing) => *existing = topic,
                None => topics.push(topic),
            }
        }
        Self::new(topics)
    }
}

impl TopicCatalog for StaticTopicCatalog {
    fn topics(&self) -> Vec<Topic> {
        self.topics.clone()
    }
}
