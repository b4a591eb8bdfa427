//! Debate client — one backend generation per paper at a time.
//!
//! Debate generation is expensive, so concurrent requests for the same paper
//! attach to the single in-flight request and share its result. The entry is
//! removed when the request settles; a later request starts a fresh one.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, info, warn};

use crate::backend::SharedBackend;
use crate::error::ParliamentResult;
use crate::model::{DebateTranscript, PaperId};

type DebateFuture = Shared<BoxFuture<'static, ParliamentResult<Arc<DebateTranscript>>>>;

struct InFlight {
    generation: u64,
    future: DebateFuture,
}

#[derive(Default)]
struct Registry {
    next_generation: u64,
    entries: HashMap<PaperId, InFlight>,
}

pub struct DebateClient {
    backend: SharedBackend,
    registry: Mutex<Registry>,
}

impl DebateClient {
    pub fn new(backend: SharedBackend) -> Self {
        Self {
            backend,
            registry: Mutex::new(Registry::default()),
        }
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Generate (or attach to the pending generation of) the debate for
    /// `paper_id`.
    pub async fn request_debate(
        &self,
        paper_id: &PaperId,
    ) -> ParliamentResult<Arc<DebateTranscript>> {
        let (generation, future) = {
            let mut registry = self.registry();
            match registry.entries.get(paper_id) {
                Some(entry) => {
                    debug!(paper_id = %paper_id, "Attaching to in-flight debate request");
                    (entry.generation, entry.future.clone())
                }
                None => {
                    registry.next_generation += 1;
                    let generation = registry.next_generation;
                    let backend = Arc::clone(&self.backend);
                    let id = paper_id.clone();
                    let future = async move {
                        info!(paper_id = %id, "Requesting full debate");
                        backend.start_full_debate(&id).await.map(Arc::new)
                    }
                    .boxed()
                    .shared();
                    registry.entries.insert(
                        paper_id.clone(),
                        InFlight {
                            generation,
                            future: future.clone(),
                        },
                    );
                    (generation, future)
                }
            }
        };

        let result = future.await;

        let mut registry = self.registry();
        if registry
            .entries
            .get(paper_id)
            .is_some_and(|entry| entry.generation == generation)
        {
            registry.entries.remove(paper_id);
        }
        drop(registry);

        if let Err(e) = &result {
            warn!(paper_id = %paper_id, error = %e, "Debate request failed");
        }
        result
    }

    /// Forget the in-flight request for `paper_id`. The backend call is
    /// dropped once no caller is waiting on it.
    pub fn abandon(&self, paper_id: &PaperId) -> bool {
        let removed = self.registry().entries.remove(paper_id).is_some();
        if removed {
            debug!(paper_id = %paper_id, "Abandoned in-flight debate request");
        }
        removed
    }

    pub fn in_flight(&self) -> usize {
        self.registry().entries.len()
    }

    pub fn is_in_flight(&self, paper_id: &PaperId) -> bool {
        self.registry().entries.contains_key(paper_id)
    }
}
