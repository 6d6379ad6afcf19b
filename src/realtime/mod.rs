//! Live trip subscriptions

use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;

use crate::error::Result;
use crate::mapper::Decoded;
use crate::models::Trip;
use crate::trips::TripStore;

type TripsCallback = Box<dyn FnMut(Result<Decoded<Vec<Trip>>>) + Send>;

/// Whether a subscription still delivers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    Subscribed,
    Unsubscribed,
}

/// Handle to a live trip listener.
///
/// The listener runs until [`TripSubscription::unsubscribe`] is called or the
/// handle is dropped. Once either returns, the callback is never invoked again.
pub struct TripSubscription {
    collection: String,
    callback: Arc<Mutex<Option<TripsCallback>>>,
    task: Option<JoinHandle<()>>,
}

impl TripSubscription {
    pub(crate) async fn start<F>(trips: TripStore, callback: F) -> Result<Self>
    where
        F: FnMut(Result<Decoded<Vec<Trip>>>) + Send + 'static,
    {
        let collection = trips.collection().to_string();
        // watch before the first fetch so no change falls in between
        let mut feed = trips.store_handle().watch(&collection).await?;
        let callback: Arc<Mutex<Option<TripsCallback>>> =
            Arc::new(Mutex::new(Some(Box::new(callback))));

        let deliver_to = callback.clone();
        let task = tokio::spawn(async move {
            loop {
                let delivery = trips.fetch_trips().await;
                {
                    let mut slot = deliver_to.lock().unwrap_or_else(PoisonError::into_inner);
                    match slot.as_mut() {
                        Some(callback) => callback(delivery),
                        None => return,
                    }
                }

                if feed.recv().await.is_none() {
                    tracing::info!("trip change feed closed");
                    return;
                }
                let mut folded = 0usize;
                while feed.try_recv().is_some() {
                    folded += 1;
                }
                if folded > 0 {
                    tracing::debug!(folded, "coalesced trip changes");
                }
            }
        });

        tracing::info!(%collection, "subscribed to trips");
        Ok(Self {
            collection,
            callback,
            task: Some(task),
        })
    }

    pub fn state(&self) -> SubscriptionState {
        match &self.task {
            Some(task) if !task.is_finished() => SubscriptionState::Subscribed,
            _ => SubscriptionState::Unsubscribed,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state() == SubscriptionState::Subscribed
    }

    /// Stop delivery. Waits for a callback that is running right now.
    pub fn unsubscribe(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };
        self.callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        task.abort();
        tracing::info!(collection = %self.collection, "unsubscribed from trips");
    }
}

impl Drop for TripSubscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
