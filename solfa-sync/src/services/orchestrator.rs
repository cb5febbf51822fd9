//! Sync session orchestration
//!
//! Drives one sync run end to end: registers the session, resolves the
//! candidate song set, classifies each song's best search result, applies
//! the verdict through the store, and emits a `SyncEvent` for every state
//! transition onto the caller's channel. Events are sent with backpressure
//! (`send().await`), so a slow consumer stalls the pipeline instead of
//! losing events, and per-song ordering is the channel's FIFO order.
//!
//! Failure model: a single song's search or store failure is recorded and
//! reported but never aborts the run. Failures outside per-song processing
//! (candidate query, closed event channel) end the session with a terminal
//! `error` event. Every exit path releases the session from the registry
//! before the terminal event is sent, so a client that has seen the stream
//! end can rely on the session being gone.

use std::cmp::Ordering;
use std::sync::Arc;

use anyhow::anyhow;
use chrono::Utc;
use sqlx::SqlitePool;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use solfa_common::events::{SyncEvent, SyncResults};

use crate::db;
use crate::models::{Song, SongMatch, SyncOptions};
use crate::services::decision::{classify, Verdict};
use crate::services::search::{SearchOptions, TrackSearch};
use crate::services::session_registry::SessionRegistry;

/// Query ladder depth when the full search is enabled.
const MAX_QUERIES_FULL: usize = 8;

pub struct SyncOrchestrator {
    db: SqlitePool,
    search: Arc<dyn TrackSearch>,
    registry: SessionRegistry,
}

impl SyncOrchestrator {
    pub fn new(db: SqlitePool, search: Arc<dyn TrackSearch>, registry: SessionRegistry) -> Self {
        Self {
            db,
            search,
            registry,
        }
    }

    /// Run one sync session to completion, cancellation, or error.
    ///
    /// The sync id is derived from the caller and start time, so concurrent
    /// sessions from different callers (or retries by the same caller) never
    /// collide.
    pub async fn run(self, caller: Uuid, options: SyncOptions, tx: mpsc::Sender<SyncEvent>) {
        let sync_id = format!("{}-{}", caller, Utc::now().timestamp_millis());

        let token = match self.registry.register(&sync_id).await {
            Ok(token) => token,
            Err(e) => {
                let _ = tx
                    .send(SyncEvent::Error {
                        error: e.to_string(),
                    })
                    .await;
                return;
            }
        };

        tracing::info!(sync_id = %sync_id, caller = %caller, "Sync session registered");

        if tx
            .send(SyncEvent::Init {
                sync_id: sync_id.clone(),
            })
            .await
            .is_err()
        {
            tracing::warn!(sync_id = %sync_id, "Client disconnected before sync started");
            self.registry.release(&sync_id).await;
            return;
        }

        let terminal = match self.execute(&options, &token, &tx).await {
            Ok(event) => event,
            Err(e) => SyncEvent::Error {
                error: e.to_string(),
            },
        };

        // Release before the terminal event reaches the client: once the
        // stream has ended, the session must already be unregistered.
        self.registry.release(&sync_id).await;

        match &terminal {
            SyncEvent::Complete { results } => tracing::info!(
                sync_id = %sync_id,
                updated = results.updated,
                pending = results.pending,
                skipped = results.skipped,
                failed = results.failed,
                "Sync completed"
            ),
            SyncEvent::Cancelled { .. } => {
                tracing::info!(sync_id = %sync_id, "Sync cancelled")
            }
            other => {
                tracing::error!(sync_id = %sync_id, event = other.event_type(), "Sync failed")
            }
        }

        let _ = tx.send(terminal).await;
    }

    async fn execute(
        &self,
        options: &SyncOptions,
        token: &CancellationToken,
        tx: &mpsc::Sender<SyncEvent>,
    ) -> anyhow::Result<SyncEvent> {
        let songs = db::songs::list_sync_candidates(
            &self.db,
            options.song_ids.as_deref(),
            options.force,
        )
        .await?;

        if songs.is_empty() {
            return Ok(SyncEvent::Complete {
                results: SyncResults {
                    message: Some("No songs found to process".into()),
                    ..Default::default()
                },
            });
        }

        let total = songs.len();
        emit(tx, SyncEvent::Start { total }).await?;

        let search_options = SearchOptions {
            max_queries: if options.enable_ai { MAX_QUERIES_FULL } else { 1 },
            min_confidence: options.min_confidence,
        };

        let mut results = SyncResults {
            total,
            ..Default::default()
        };
        let mut confidence_sum = 0.0f32;
        let mut candidates_seen = 0usize;

        for (index, song) in songs.iter().enumerate() {
            // Cooperative cancellation, checked once per song boundary: a
            // lookup already in flight finishes and its outcome is emitted.
            if token.is_cancelled() {
                return Ok(SyncEvent::Cancelled {
                    message: "Sync cancelled by user".into(),
                });
            }

            self.process_song(
                song,
                &search_options,
                options.min_confidence,
                &mut results,
                &mut confidence_sum,
                &mut candidates_seen,
                tx,
            )
            .await?;

            let completed = index + 1;
            let percentage = ((completed as f32 / total as f32) * 100.0).round() as u8;
            emit(
                tx,
                SyncEvent::Progress {
                    completed,
                    total,
                    current_song: song.title.clone(),
                    percentage,
                },
            )
            .await?;
        }

        results.average_confidence = if candidates_seen > 0 {
            (confidence_sum / candidates_seen as f32).round()
        } else {
            0.0
        };

        Ok(SyncEvent::Complete { results })
    }

    /// Process one song. Search and store failures are absorbed into
    /// `results`; only a closed event channel propagates as an error.
    #[allow(clippy::too_many_arguments)]
    async fn process_song(
        &self,
        song: &Song,
        search_options: &SearchOptions,
        min_confidence: u8,
        results: &mut SyncResults,
        confidence_sum: &mut f32,
        candidates_seen: &mut usize,
        tx: &mpsc::Sender<SyncEvent>,
    ) -> anyhow::Result<()> {
        let candidates = match self.search.search(song, search_options).await {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!(song_id = %song.id, error = %e, "Track search failed");
                results.failed += 1;
                results.errors.push(format!("{}: {}", song.title, e));
                emit(
                    tx,
                    SyncEvent::SongFailed {
                        song_id: song.id,
                        title: song.title.clone(),
                        error: e.to_string(),
                    },
                )
                .await?;
                return Ok(());
            }
        };

        let best = candidates
            .into_iter()
            .max_by(|a, b| a.confidence.partial_cmp(&b.confidence).unwrap_or(Ordering::Equal));

        if let Some(candidate) = &best {
            *confidence_sum += candidate.confidence;
            *candidates_seen += 1;
        }

        match (classify(best.as_ref(), min_confidence), best) {
            (Verdict::AutoApply, Some(candidate)) => {
                match db::songs::apply_link(&self.db, song.id, &candidate.link()).await {
                    Ok(()) => {
                        results.updated += 1;
                        emit(
                            tx,
                            SyncEvent::SongUpdated {
                                song_id: song.id,
                                title: song.title.clone(),
                                track_name: candidate.track_name.clone(),
                                confidence: candidate.confidence,
                            },
                        )
                        .await?;
                    }
                    Err(e) => {
                        tracing::warn!(song_id = %song.id, error = %e, "Auto-apply failed");
                        results.failed += 1;
                        results
                            .errors
                            .push(format!("Failed to update {}: {}", song.title, e));
                        emit(
                            tx,
                            SyncEvent::SongFailed {
                                song_id: song.id,
                                title: song.title.clone(),
                                error: e.to_string(),
                            },
                        )
                        .await?;
                    }
                }
            }
            (Verdict::QueueForReview, Some(candidate)) => {
                let song_match = SongMatch::from_candidate(song.id, &candidate);
                match db::matches::queue_match(&self.db, &song_match).await {
                    Ok(true) => {
                        results.pending += 1;
                        emit(
                            tx,
                            SyncEvent::SongPending {
                                song_id: song.id,
                                title: song.title.clone(),
                                track_name: Some(candidate.track_name.clone()),
                                confidence: Some(candidate.confidence),
                                message: None,
                            },
                        )
                        .await?;
                    }
                    Ok(false) => {
                        results.pending += 1;
                        emit(
                            tx,
                            SyncEvent::SongPending {
                                song_id: song.id,
                                title: song.title.clone(),
                                track_name: None,
                                confidence: None,
                                message: Some("Song already has a pending match".into()),
                            },
                        )
                        .await?;
                    }
                    Err(e) => {
                        tracing::warn!(song_id = %song.id, error = %e, "Queueing match failed");
                        results.failed += 1;
                        results
                            .errors
                            .push(format!("Failed to queue {}: {}", song.title, e));
                        emit(
                            tx,
                            SyncEvent::SongFailed {
                                song_id: song.id,
                                title: song.title.clone(),
                                error: e.to_string(),
                            },
                        )
                        .await?;
                    }
                }
            }
            (_, best) => {
                results.skipped += 1;
                let (reason, confidence) = match &best {
                    Some(candidate) => (candidate.match_reason.clone(), Some(candidate.confidence)),
                    None => ("No matches found in Spotify".to_string(), None),
                };
                emit(
                    tx,
                    SyncEvent::SongSkipped {
                        song_id: song.id,
                        title: song.title.clone(),
                        reason,
                        confidence,
                    },
                )
                .await?;
            }
        }

        Ok(())
    }
}

async fn emit(tx: &mpsc::Sender<SyncEvent>, event: SyncEvent) -> anyhow::Result<()> {
    tx.send(event)
        .await
        .map_err(|_| anyhow!("Event stream closed"))
}
