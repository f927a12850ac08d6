//! # Cache Orchestrator
//!
//! Local-first read: emit cached data, decide whether it is stale, refresh it
//! from the remote source, persist, emit again.
//!
//! ## Emission order
//!
//! | local read | should fetch | remote | emissions |
//! |------------|--------------|--------|-----------|
//! | data       | no           | -      | `Loading`, `Success(local)` |
//! | data       | yes          | ok     | `Loading`, `Success(local)`, `Success(remote)` |
//! | data       | yes          | fails  | `Loading`, `Success(local)`, `Error(msg, Some(local))` |
//! | empty      | no           | -      | `Loading` |
//! | empty      | yes          | ok     | `Loading`, `Success(remote)` |
//! | empty      | yes          | fails  | `Loading`, `Error(msg, None)` |
//! | fails      | -            | ok     | `Loading`, `Success(remote)` |
//! | fails      | -            | fails  | `Loading`, `Error(msg, None)` |
//!
//! Each stream is one-shot and issues at most one remote call. Every step runs
//! only when the consumer polls for the next item, so dropping the stream
//! after the local emission cancels the refresh before anything is persisted.

use crate::error::RemoteError;
use crate::freshness::fetch_or_default;
use crate::resource::Resource;
use core_library::repositories::Page;
use futures::stream::{self, BoxStream, StreamExt};
use std::fmt::Display;
use std::future::Future;
use tracing::{debug, warn};

/// Decides whether a local read produced anything worth showing.
pub trait LocalData {
    fn has_data(&self) -> bool;
}

impl<T> LocalData for Vec<T> {
    fn has_data(&self) -> bool {
        !self.is_empty()
    }
}

impl<T> LocalData for Option<T> {
    fn has_data(&self) -> bool {
        self.is_some()
    }
}

impl<T> LocalData for Page<T> {
    fn has_data(&self) -> bool {
        !self.items.is_empty()
    }
}

enum Phase<T, L, R, P, S> {
    Start {
        local_read: L,
        remote_read: R,
        persist: P,
        should_fetch: S,
    },
    ReadLocal {
        local_read: L,
        remote_read: R,
        persist: P,
        should_fetch: S,
    },
    Decide {
        local: T,
        remote_read: R,
        persist: P,
        should_fetch: S,
    },
    Fetch {
        fallback: Option<T>,
        remote_read: R,
        persist: P,
    },
    Done,
}

/// Build the synchronized read of one entity.
///
/// - `local_read` loads cached data; a failure means "local unavailable" and
///   the read continues remote-only with no fallback.
/// - `should_fetch` receives the local data and decides staleness; a failure
///   counts as stale.
/// - `remote_read` is the normalized remote leg.
/// - `persist` stores a successful remote result before it is emitted; a
///   failure is logged and the remote data is still emitted.
pub fn synced_read<'a, T, L, LF, LE, R, RF, P, PF, PE, S, SF, SE>(
    local_read: L,
    remote_read: R,
    persist: P,
    should_fetch: S,
) -> BoxStream<'a, Resource<T>>
where
    T: LocalData + Clone + Send + 'a,
    L: FnOnce() -> LF + Send + 'a,
    LF: Future<Output = Result<T, LE>> + Send + 'a,
    LE: Display + Send + 'a,
    R: FnOnce() -> RF + Send + 'a,
    RF: Future<Output = Result<T, RemoteError>> + Send + 'a,
    P: FnOnce(T) -> PF + Send + 'a,
    PF: Future<Output = Result<(), PE>> + Send + 'a,
    PE: Display + Send + 'a,
    S: FnOnce(T) -> SF + Send + 'a,
    SF: Future<Output = Result<bool, SE>> + Send + 'a,
    SE: Display + Send + 'a,
{
    let start = Phase::Start {
        local_read,
        remote_read,
        persist,
        should_fetch,
    };

    stream::unfold(start, |phase| async move {
        let mut phase = phase;
        loop {
            phase = match phase {
                Phase::Start {
                    local_read,
                    remote_read,
                    persist,
                    should_fetch,
                } => {
                    let next = Phase::ReadLocal {
                        local_read,
                        remote_read,
                        persist,
                        should_fetch,
                    };
                    return Some((Resource::Loading, next));
                }
                Phase::ReadLocal {
                    local_read,
                    remote_read,
                    persist,
                    should_fetch,
                } => match local_read().await {
                    Ok(local) if local.has_data() => {
                        let emitted = Resource::Success(local.clone());
                        let next = Phase::Decide {
                            local,
                            remote_read,
                            persist,
                            should_fetch,
                        };
                        return Some((emitted, next));
                    }
                    Ok(local) => Phase::Decide {
                        local,
                        remote_read,
                        persist,
                        should_fetch,
                    },
                    Err(error) => {
                        warn!(error = %error, "Local read failed, falling back to remote");
                        Phase::Fetch {
                            fallback: None,
                            remote_read,
                            persist,
                        }
                    }
                },
                Phase::Decide {
                    local,
                    remote_read,
                    persist,
                    should_fetch,
                } => {
                    let fetch = fetch_or_default(should_fetch(local.clone()).await);

                    if !fetch {
                        debug!("Local data is fresh, skipping remote read");
                        return None;
                    }

                    Phase::Fetch {
                        fallback: local.has_data().then_some(local),
                        remote_read,
                        persist,
                    }
                }
                Phase::Fetch {
                    fallback,
                    remote_read,
                    persist,
                } => {
                    let emitted = match remote_read().await {
                        Ok(remote) => {
                            if let Err(error) = persist(remote.clone()).await {
                                warn!(error = %error, "Failed to persist remote data");
                            }
                            Resource::Success(remote)
                        }
                        Err(error) => {
                            debug!(
                                error = %error,
                                has_fallback = fallback.is_some(),
                                "Remote read failed"
                            );
                            Resource::Error {
                                message: error.to_string(),
                                data: fallback,
                            }
                        }
                    };
                    return Some((emitted, Phase::Done));
                }
                Phase::Done => return None,
            };
        }
    })
    .boxed()
}

/// Drain a finished synchronized read.
pub async fn collect_resources<T>(stream: BoxStream<'_, Resource<T>>) -> Vec<Resource<T>> {
    stream.collect().await
}

/// Final emission of a synchronized read, if it produced anything past `Loading`.
pub async fn last_resource<T>(stream: BoxStream<'_, Resource<T>>) -> Option<Resource<T>> {
    collect_resources(stream)
        .await
        .into_iter()
        .filter(|resource| !resource.is_loading())
        .last()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    async fn ok<T>(value: T) -> Result<T, Infallible> {
        Ok(value)
    }

    #[core_async::test]
    async fn test_fresh_local_data_skips_remote() {
        let remote_calls = Arc::new(AtomicUsize::new(0));
        let calls = remote_calls.clone();

        let stream = synced_read(
            || ok(vec![1, 2]),
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, RemoteError>(vec![9])
            },
            |_| ok(()),
            |_| ok(false),
        );

        let emitted = collect_resources(stream).await;
        assert_eq!(emitted, vec![Resource::Loading, Resource::Success(vec![1, 2])]);
        assert_eq!(remote_calls.load(Ordering::SeqCst), 0);
    }

    #[core_async::test]
    async fn test_stale_local_data_refreshes() {
        let stream = synced_read(
            || ok(vec![1]),
            || async { Ok::<_, RemoteError>(vec![1, 2]) },
            |_| ok(()),
            |_| ok(true),
        );

        let emitted = collect_resources(stream).await;
        assert_eq!(
            emitted,
            vec![
                Resource::Loading,
                Resource::Success(vec![1]),
                Resource::Success(vec![1, 2])
            ]
        );
    }

    #[core_async::test]
    async fn test_remote_failure_falls_back_to_local() {
        let stream = synced_read(
            || ok(vec![1]),
            || async { Err::<Vec<i32>, _>(RemoteError::Timeout) },
            |_| ok(()),
            |_| ok(true),
        );

        let emitted = collect_resources(stream).await;
        assert_eq!(emitted.len(), 3);
        assert_eq!(
            emitted[2],
            Resource::error("Request timed out", Some(vec![1]))
        );
    }

    #[core_async::test]
    async fn test_empty_local_and_fresh_emits_only_loading() {
        let stream = synced_read(
            || ok(Vec::<i32>::new()),
            || async { Ok::<_, RemoteError>(vec![1]) },
            |_| ok(()),
            |_| ok(false),
        );

        assert_eq!(collect_resources(stream).await, vec![Resource::Loading]);
    }

    #[core_async::test]
    async fn test_local_failure_goes_remote_only() {
        let stream = synced_read(
            || async { Err::<Vec<i32>, _>("disk gone") },
            || async { Err::<Vec<i32>, _>(RemoteError::NoConnectivity) },
            |_| ok(()),
            |_| ok(false),
        );

        let emitted = collect_resources(stream).await;
        assert_eq!(
            emitted,
            vec![
                Resource::Loading,
                Resource::error("No network connectivity", None)
            ]
        );
    }

    #[core_async::test]
    async fn test_failing_staleness_check_fetches() {
        let stream = synced_read(
            || ok(Some(1)),
            || async { Ok::<_, RemoteError>(Some(2)) },
            |_| ok(()),
            |_| async { Err::<bool, _>("clock unavailable") },
        );

        let last = last_resource(stream).await;
        assert_eq!(last, Some(Resource::Success(Some(2))));
    }

    #[core_async::test]
    async fn test_persist_failure_still_emits_remote() {
        let stream = synced_read(
            || ok(Vec::<i32>::new()),
            || async { Ok::<_, RemoteError>(vec![4]) },
            |_| async { Err::<(), _>("read-only database") },
            |_| ok(true),
        );

        let emitted = collect_resources(stream).await;
        assert_eq!(emitted, vec![Resource::Loading, Resource::Success(vec![4])]);
    }

    #[core_async::test]
    async fn test_dropping_after_local_emission_skips_persist() {
        let persisted = Arc::new(AtomicUsize::new(0));
        let counter = persisted.clone();

        let mut stream = synced_read(
            || ok(vec![1]),
            || async { Ok::<_, RemoteError>(vec![2]) },
            move |_| async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, Infallible>(())
            },
            |_| ok(true),
        );

        assert_eq!(stream.next().await, Some(Resource::Loading));
        assert_eq!(stream.next().await, Some(Resource::Success(vec![1])));
        drop(stream);

        assert_eq!(persisted.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_local_data_emptiness() {
        assert!(!Vec::<u8>::new().has_data());
        assert!(vec![1].has_data());
        assert!(!None::<u8>.has_data());
        assert!(Some(0).has_data());
    }
}
