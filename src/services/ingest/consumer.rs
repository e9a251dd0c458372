//! Out-of-band consumer that feeds recommendation-engine messages into
//! `RecommendService`.
//!
//! Messages arrive on two Valkey/Redis lists, one per topic. Each message is
//! handled on its own: a malformed or unpersistable message is logged and
//! dropped, and the loop moves on. Nothing is retried automatically.
use std::{future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;
use thiserror::Error;

use crate::services::ingest::service::{IngestOutcome, RecommendService};

/// Wait before polling again after a backend failure.
const BACKOFF: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    FavoriteCategory,
    RecommendQuiz,
}

impl Topic {
    pub const ALL: [Topic; 2] = [Topic::FavoriteCategory, Topic::RecommendQuiz];

    pub fn name(&self) -> &'static str {
        match self {
            Topic::FavoriteCategory => "favorite-category",
            Topic::RecommendQuiz => "recommend-quiz",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub topic: Topic,
    pub payload: String,
}

#[derive(Debug, Error)]
pub enum ConsumerError {
    #[error("queue connection error: {0}")]
    BackendConnection(String),
    #[error("queue command error: {0}")]
    BackendCommand(String),
}

#[async_trait]
pub trait MessageSource: Send + Sync {
    // Returns the queue backend name (for logging).
    fn backend_name(&self) -> &'static str;

    // Next message from any topic, or `None` when every topic is empty.
    async fn next_message(&self) -> Result<Option<Message>, ConsumerError>;
}

/// Valkey/Redis list-backed message source.
///
/// Producers `RPUSH <prefix>:<topic> <payload>`; this source `LPOP`s.
#[derive(Clone)]
pub struct ValkeyQueue {
    manager: redis::aio::ConnectionManager,
    prefix: String,
}

impl ValkeyQueue {
    // Create a queue client from a URL like `redis://localhost:6379`
    pub async fn new(url: &str, prefix: impl Into<String>) -> Result<Self, ConsumerError> {
        let client = redis::Client::open(url)
            .map_err(|e| ConsumerError::BackendConnection(e.to_string()))?;

        let manager = client
            .get_connection_manager()
            .await
            .map_err(|e| ConsumerError::BackendConnection(e.to_string()))?;

        Ok(Self {
            manager,
            prefix: prefix.into(),
        })
    }

    pub fn key(&self, topic: Topic) -> String {
        format!("{}:{}", self.prefix, topic.name())
    }
}

#[async_trait]
impl MessageSource for ValkeyQueue {
    fn backend_name(&self) -> &'static str {
        "valkey"
    }

    async fn next_message(&self) -> Result<Option<Message>, ConsumerError> {
        let mut conn = self.manager.clone();

        for topic in Topic::ALL {
            let payload: Option<String> = redis::cmd("LPOP")
                .arg(self.key(topic))
                .query_async(&mut conn)
                .await
                .map_err(|e| ConsumerError::BackendCommand(e.to_string()))?;

            if let Some(payload) = payload {
                return Ok(Some(Message { topic, payload }));
            }
        }

        Ok(None)
    }
}

impl RecommendService {
    /// Route one message to the handler of its topic and log the result.
    pub async fn dispatch(&self, message: &Message) {
        let result = match message.topic {
            Topic::FavoriteCategory => self.update_favorite_category(&message.payload).await,
            Topic::RecommendQuiz => self.update_recommend_quiz(&message.payload).await,
        };

        match result {
            Ok(IngestOutcome::Saved { rows }) => {
                tracing::debug!(topic = message.topic.name(), rows, "message ingested");
            }
            Ok(IngestOutcome::NoRecommendations) => {}
            Err(err) => {
                tracing::error!(
                    topic = message.topic.name(),
                    kind = err.kind().as_str(),
                    payload = %message.payload,
                    error = %err,
                    "dropping message"
                );
            }
        }
    }
}

/// Poll `source` until `shutdown` resolves.
///
/// Shutdown is only observed between fetches and while idle. A fetch that has
/// started always runs to completion and its message is dispatched, since the
/// backend has already removed it from the queue.
pub async fn run_consumer<F>(
    source: Arc<dyn MessageSource>,
    service: RecommendService,
    poll_interval: Duration,
    shutdown: F,
) where
    F: Future<Output = ()>,
{
    tracing::info!(backend = source.backend_name(), "ingest consumer started");
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            _ = std::future::ready(()) => {}
        }

        let next = source.next_message().await;

        let pause = match next {
            Ok(Some(message)) => {
                service.dispatch(&message).await;
                continue;
            }
            Ok(None) => poll_interval,
            Err(err) => {
                tracing::warn!(error = %err, "ingest source failure, backing off");
                BACKOFF
            }
        };

        tokio::select! {
            _ = &mut shutdown => break,
            _ = tokio::time::sleep(pause) => {}
        }
    }

    tracing::info!("ingest consumer stopped");
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::Notify;

    use super::*;
    use crate::services::ingest::decoder::{FavoriteCategoryUpdate, RecommendedQuiz};
    use crate::services::ingest::service::testing::{RecordingSink, service};

    /// Serves queued messages, then reports "drained" once it runs dry.
    struct FakeSource {
        queue: Mutex<VecDeque<Result<Message, ()>>>,
        drained: Arc<Notify>,
    }

    #[async_trait]
    impl MessageSource for FakeSource {
        fn backend_name(&self) -> &'static str {
            "fake"
        }

        async fn next_message(&self) -> Result<Option<Message>, ConsumerError> {
            match self.queue.lock().unwrap().pop_front() {
                Some(Ok(message)) => Ok(Some(message)),
                Some(Err(())) => Err(ConsumerError::BackendCommand("boom".to_string())),
                None => {
                    self.drained.notify_one();
                    Ok(None)
                }
            }
        }
    }

    fn message(topic: Topic, payload: &str) -> Result<Message, ()> {
        Ok(Message {
            topic,
            payload: payload.to_string(),
        })
    }

    #[tokio::test]
    async fn bad_messages_do_not_affect_others() {
        let sink = Arc::new(RecordingSink::default());
        let drained = Arc::new(Notify::new());
        let source = Arc::new(FakeSource {
            queue: Mutex::new(VecDeque::from([
                message(Topic::FavoriteCategory, "userId:1,category:music"),
                message(Topic::FavoriteCategory, "userId:abc,category:x"),
                Err(()),
                message(Topic::RecommendQuiz, "userId:2,recommendedQuizIds:10,x,12"),
                message(Topic::RecommendQuiz, "userId:2,recommendedQuizIds:"),
                message(Topic::RecommendQuiz, "userId:2,recommendedQuizIds:5,6"),
            ])),
            drained: drained.clone(),
        });

        let wait = drained.clone();
        run_consumer(
            source,
            service(&sink),
            Duration::from_millis(10),
            async move { wait.notified().await },
        )
        .await;

        assert_eq!(
            sink.favorites(),
            vec![FavoriteCategoryUpdate {
                user_id: 1,
                category: "music".to_string(),
            }]
        );
        assert_eq!(
            sink.recommendation_batches(),
            vec![vec![
                RecommendedQuiz { user_id: 2, quiz_id: 5 },
                RecommendedQuiz { user_id: 2, quiz_id: 6 },
            ]]
        );
    }

    /// Pops one message, then takes a while to hand it over.
    struct SlowSource {
        popped: AtomicUsize,
        delay: Duration,
    }

    #[async_trait]
    impl MessageSource for SlowSource {
        fn backend_name(&self) -> &'static str {
            "slow"
        }

        async fn next_message(&self) -> Result<Option<Message>, ConsumerError> {
            if self.popped.fetch_add(1, Ordering::SeqCst) > 0 {
                return Ok(None);
            }
            tokio::time::sleep(self.delay).await;
            Ok(Some(Message {
                topic: Topic::FavoriteCategory,
                payload: "userId:4,category:sports".to_string(),
            }))
        }
    }

    #[tokio::test]
    async fn shutdown_during_fetch_still_dispatches_the_message() {
        let sink = Arc::new(RecordingSink::default());
        let source = Arc::new(SlowSource {
            popped: AtomicUsize::new(0),
            delay: Duration::from_millis(200),
        });

        run_consumer(
            source.clone(),
            service(&sink),
            Duration::from_millis(10),
            tokio::time::sleep(Duration::from_millis(50)),
        )
        .await;

        assert_eq!(source.popped.load(Ordering::SeqCst), 1);
        assert_eq!(
            sink.favorites(),
            vec![FavoriteCategoryUpdate {
                user_id: 4,
                category: "sports".to_string(),
            }]
        );
    }

    #[test]
    fn topics_have_distinct_names() {
        assert_ne!(Topic::FavoriteCategory.name(), Topic::RecommendQuiz.name());
    }
}
