//! Background job ending published polls whose active window has passed.

use super::poll::{PollCrud, PollStateCrud};
use crate::error::AppError;
use crate::models::PollStatus;
use crate::schemas::PollStateChange;
use crate::store::Store;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Set every expired PUBLISHED poll to ENDED. Returns how many were ended.
pub async fn end_expired_polls(store: &dyn Store, now: DateTime<Utc>) -> Result<usize, AppError> {
    let published = PollCrud::new(store)
        .find_all(&[("poll_status", json!(PollStatus::Published))])
        .await?;
    let crud = PollStateCrud::new(store);
    let mut ended = 0;
    for poll in published {
        if !poll.ends_at().is_some_and(|end| end <= now) {
            continue;
        }
        let change = PollStateChange {
            poll_status: Some(PollStatus::Ended),
            ..Default::default()
        };
        if crud.update(poll.id, &change).await?.is_some() {
            tracing::info!(poll_id = poll.id, "poll ended by schedule");
            ended += 1;
        }
    }
    Ok(ended)
}

/// Run `end_expired_polls` every `period`. Returns None when the period is zero.
pub fn spawn_poll_sweeper(store: Arc<dyn Store>, period: Duration) -> Option<JoinHandle<()>> {
    if period.is_zero() {
        tracing::info!("poll sweeper disabled");
        return None;
    }
    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            if let Err(e) = end_expired_polls(store.as_ref(), Utc::now()).await {
                tracing::warn!(error = %e, "poll sweep failed");
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Poll;
    use crate::schemas::NewPoll;
    use crate::store::{tables, MemoryStore, Row};

    #[tokio::test]
    async fn ends_only_expired_published_polls() {
        let store = MemoryStore::new();
        let mut user = Row::new();
        user.insert("email".into(), json!("o@example.com"));
        user.insert("hashed_password".into(), json!("x"));
        let uid = store.insert(&tables::USERS, &user).await.unwrap()["id"].as_i64().unwrap();

        let start = "2024-05-01T12:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let polls = PollCrud::new(&store);
        let mut ids = Vec::new();
        for duration in [Some(30), Some(120), None] {
            let p = polls
                .create(&NewPoll {
                    title: "p".into(),
                    user_id: uid,
                    description: None,
                    poll_cover: None,
                    active_from: Some(start),
                    active_duration: duration,
                    max_participants: None,
                })
                .await
                .unwrap();
            PollStateCrud::new(&store)
                .update(
                    p.id,
                    &PollStateChange {
                        poll_status: Some(PollStatus::Published),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
            ids.push(p.id);
        }

        let now = start + chrono::Duration::minutes(60);
        assert_eq!(end_expired_polls(&store, now).await.unwrap(), 1);
        let status = |p: Option<Poll>| p.unwrap().poll_status;
        assert_eq!(status(polls.get(ids[0]).await.unwrap()), PollStatus::Ended);
        assert_eq!(status(polls.get(ids[1]).await.unwrap()), PollStatus::Published);
        assert_eq!(status(polls.get(ids[2]).await.unwrap()), PollStatus::Published);
    }
}
