//! Recent tracks: the latest plays and plays on a given day

use chrono::NaiveDate;

use crate::api::{Gateway, HistoryEntry, Query, Table, model};
use crate::i18n::Key;
use crate::utils::day_bounds;

use super::{FeatureContext, FeatureError};

const COLLAPSED: usize = 5;
const EXPANDED: usize = 50;

pub struct RecentTracksService<G: Gateway> {
    ctx: FeatureContext<G>,
}

impl<G: Gateway> RecentTracksService<G> {
    pub fn new(ctx: FeatureContext<G>) -> Self {
        Self { ctx }
    }

    /// Latest plays, newest first
    pub async fn recent(&self, expanded: bool) -> Result<Vec<HistoryEntry>, FeatureError> {
        let user = self.ctx.require_user()?;
        let query = Query::from(Table::ListeningHistory)
            .eq("user_id", user.as_str())
            .order("played_at", false)
            .limit(if expanded { EXPANDED } else { COLLAPSED });
        self.load(&query).await
    }

    /// Plays inside the local calendar day, newest first
    pub async fn for_day(&self, date: NaiveDate) -> Result<Vec<HistoryEntry>, FeatureError> {
        let user = self.ctx.require_user()?;
        let (start, end) = day_bounds(date);
        tracing::debug!(%date, %start, %end, "Loading plays for day");
        let query = Query::from(Table::ListeningHistory)
            .eq("user_id", user.as_str())
            .gte("played_at", start)
            .lte("played_at", end)
            .order("played_at", false);
        self.load(&query).await
    }

    async fn load(&self, query: &Query) -> Result<Vec<HistoryEntry>, FeatureError> {
        match self.ctx.gateway.select(query).await {
            Ok(rows) => Ok(model::decode_all(rows)?),
            Err(e) => Err(self.ctx.gateway_failure(Key::LoadFailed, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::testing::{add_history, at, context};

    #[tokio::test]
    async fn test_recent_collapsed_and_expanded() {
        let (ctx, _rx) = context(Some("u1")).await;
        for i in 0..8 {
            add_history(&ctx.gateway, "u1", &format!("t{}", i), "A", &at(i)).await;
        }
        let recent = RecentTracksService::new(ctx);

        let collapsed = recent.recent(false).await.unwrap();
        assert_eq!(collapsed.len(), 5);
        assert_eq!(collapsed[0].video_id, "t7");
        assert_eq!(recent.recent(true).await.unwrap().len(), 8);
    }

    #[tokio::test]
    async fn test_for_day_is_inclusive() {
        let (ctx, _rx) = context(Some("u1")).await;
        let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let (start, end) = day_bounds(date);
        let (_, previous_end) = day_bounds(date.pred_opt().unwrap());
        let (next_start, _) = day_bounds(date.succ_opt().unwrap());

        add_history(&ctx.gateway, "u1", "before", "A", &previous_end).await;
        add_history(&ctx.gateway, "u1", "first", "A", &start).await;
        add_history(&ctx.gateway, "u1", "last", "A", &end).await;
        add_history(&ctx.gateway, "u1", "after", "A", &next_start).await;
        add_history(&ctx.gateway, "u2", "foreign", "A", &start).await;

        let plays = RecentTracksService::new(ctx).for_day(date).await.unwrap();
        let ids: Vec<&str> = plays.iter().map(|p| p.video_id.as_str()).collect();
        assert_eq!(ids, vec!["last", "first"]);
    }

    #[tokio::test]
    async fn test_anonymous_recent() {
        let (ctx, _rx) = context(None).await;
        assert!(matches!(
            RecentTracksService::new(ctx).recent(false).await,
            Err(FeatureError::AuthRequired)
        ));
    }
}
