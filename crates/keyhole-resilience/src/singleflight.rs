use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, Shared};
use futures::{FutureExt, TryFutureExt};
use thiserror::Error;
use tokio::sync::oneshot;

/// Error delivered to waiters when the in-flight load disappeared
/// without producing a result (the load task panicked or was aborted).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FlightError {
    #[error("in-flight load was aborted before completing")]
    Aborted,
}

type FlightFuture<T> = Shared<BoxFuture<'static, Result<T, FlightError>>>;

/// Deduplicates concurrent loads for the same key.
///
/// The first caller for a key becomes the leader and starts the load;
/// callers arriving while it is in flight wait on the same result. The
/// load itself runs on a detached task, so a waiter (the leader
/// included) dropping its future cannot fail the others. The per-key
/// registration is removed before the result is broadcast, so a load
/// that starts afterwards begins a fresh flight.
pub struct Singleflight<K, T> {
    flights: Arc<DashMap<K, FlightFuture<T>>>,
}

impl<K, T> Default for Singleflight<K, T>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self {
            flights: Arc::new(DashMap::new()),
        }
    }
}

impl<K, T> Clone for Singleflight<K, T> {
    fn clone(&self) -> Self {
        Self {
            flights: Arc::clone(&self.flights),
        }
    }
}

impl<K, T> Singleflight<K, T>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            flights: Arc::new(DashMap::new()),
        }
    }

    /// Number of loads currently in flight.
    pub fn in_flight(&self) -> usize {
        self.flights.len()
    }

    /// Returns the result of the in-flight load for `key`, starting one
    /// with `load_fn` if none is registered.
    ///
    /// `load_fn` is invoked at most once per flight.
    pub async fn load<F, Fut>(&self, key: K, load_fn: F) -> Result<T, FlightError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let shared = match self.flights.entry(key.clone()) {
            Entry::Occupied(flight) => flight.get().clone(),
            Entry::Vacant(slot) => {
                let (tx, rx) = oneshot::channel();
                let shared: FlightFuture<T> =
                    rx.map_err(|_| FlightError::Aborted).boxed().shared();
                slot.insert(shared.clone());

                let flights = Arc::clone(&self.flights);
                let load = load_fn();
                tokio::spawn(async move {
                    let result = load.await;
                    // Clear the registration before delivering, so a
                    // subsequent load for the key starts a new flight.
                    flights.remove(&key);
                    let _ = tx.send(result);
                });

                shared
            }
        };

        shared.await
    }
}
