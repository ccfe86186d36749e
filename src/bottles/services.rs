use std::sync::Arc;

use sqlx::PgPool;
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

use super::dto::BottleCreate;
use super::repo_types::Bottle;
use crate::research::{BottleResearcher, ResearchQuery};
use crate::state::AppState;

/// Stores the bottle and, when asked, kicks off research in the background.
/// The returned row never waits on research.
pub async fn create_bottle(
    state: &AppState,
    owner: Uuid,
    input: BottleCreate,
) -> anyhow::Result<Bottle> {
    let bottle = Bottle::create(&state.db, owner, &input).await?;
    info!(bottle_id = %bottle.id, %owner, "bottle created");

    if input.research {
        let query = ResearchQuery {
            name: bottle.name.clone(),
            distillery: bottle.distillery.clone(),
            spirit_type: Some(bottle.spirit_type.to_string()),
        };
        spawn_research(state.db.clone(), state.researcher.clone(), bottle.id, query);
    }

    Ok(bottle)
}

fn spawn_research(
    db: PgPool,
    researcher: Arc<dyn BottleResearcher>,
    bottle_id: Uuid,
    query: ResearchQuery,
) {
    let span = tracing::info_span!("bottle_research", %bottle_id);
    tokio::spawn(
        async move {
            if let Err(e) = enrich(&db, researcher.as_ref(), bottle_id, &query).await {
                warn!(error = %e, "bottle research failed; continuing without details");
            }
        }
        .instrument(span),
    );
}

pub(crate) async fn enrich(
    db: &PgPool,
    researcher: &dyn BottleResearcher,
    bottle_id: Uuid,
    query: &ResearchQuery,
) -> anyhow::Result<bool> {
    let Some(details) = researcher.research(query).await? else {
        debug!("research unavailable");
        return Ok(false);
    };
    let stored = Bottle::set_ai_details(db, bottle_id, details).await?;
    if stored {
        info!("research details stored");
    }
    Ok(stored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::Value;

    struct FailingResearcher;

    #[async_trait]
    impl BottleResearcher for FailingResearcher {
        async fn research(&self, _q: &ResearchQuery) -> anyhow::Result<Option<Value>> {
            anyhow::bail!("upstream unavailable")
        }
    }

    fn query() -> ResearchQuery {
        ResearchQuery {
            name: "Eagle Rare".into(),
            distillery: None,
            spirit_type: Some("whiskey".into()),
        }
    }

    #[tokio::test]
    async fn enrich_without_research_does_not_touch_db() {
        let state = AppState::fake();
        let stored = enrich(
            &state.db,
            state.researcher.as_ref(),
            Uuid::new_v4(),
            &query(),
        )
        .await
        .expect("disabled research is not an error");
        assert!(!stored);
    }

    #[tokio::test]
    async fn enrich_surfaces_upstream_error_to_the_background_task() {
        let state = AppState::fake();
        let err = enrich(&state.db, &FailingResearcher, Uuid::new_v4(), &query())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("upstream"));
    }
}
