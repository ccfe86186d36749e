//! Optional bottle research against an OpenAI-compatible chat endpoint.
//!
//! Research is enrichment only: callers treat any error as "no details".

mod openai;
mod types;

use async_trait::async_trait;
use serde_json::Value;

pub use openai::OpenAiResearcher;

/// What we know about a bottle when asking for details.
#[derive(Debug, Clone)]
pub struct ResearchQuery {
    pub name: String,
    pub distillery: Option<String>,
    pub spirit_type: Option<String>,
}

impl ResearchQuery {
    pub fn search_text(&self) -> String {
        let mut q = self.name.clone();
        if let Some(d) = self.distillery.as_deref().filter(|d| !d.is_empty()) {
            q.push_str(" from ");
            q.push_str(d);
        }
        if let Some(s) = self.spirit_type.as_deref() {
            q.push_str(&format!(" ({s})"));
        }
        q
    }
}

#[async_trait]
pub trait BottleResearcher: Send + Sync {
    /// Returns `Ok(None)` when research is not available.
    async fn research(&self, query: &ResearchQuery) -> anyhow::Result<Option<Value>>;
}

/// Used when no API key is configured.
pub struct DisabledResearcher;

#[async_trait]
impl BottleResearcher for DisabledResearcher {
    async fn research(&self, _query: &ResearchQuery) -> anyhow::Result<Option<Value>> {
        Ok(None)
    }
}
