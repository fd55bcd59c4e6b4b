// ============================================================
// Layer 4 — Prefetching Batch Loader
// ============================================================
// One `BatchLoader` covers exactly one epoch:
//
//   1. shuffle all indices with a seeded RNG
//   2. cut them into full batches, dropping the trailing
//      partial batch
//   3. hand batch i to worker (i % workers); each worker
//      fetches its samples and pushes them into its own
//      bounded channel
//   4. the training thread reads the channels round-robin,
//      so batches come out in plan order
//
// With zero workers the samples are fetched on the calling
// thread. Dropping the loader closes the channels and joins
// the workers.

use anyhow::{anyhow, Result};
use burn::data::dataset::Dataset;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use std::{
    sync::{
        mpsc::{sync_channel, Receiver},
        Arc,
    },
    thread::{self, JoinHandle},
};

/// Batches each worker may have ready ahead of the consumer
const PREFETCH_PER_WORKER: usize = 2;

/// Shuffle `len` indices and split them into full batches.
pub fn plan_batches(len: usize, batch_size: usize, seed: u64) -> Vec<Vec<usize>> {
    let mut indices: Vec<usize> = (0..len).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    indices
        .chunks_exact(batch_size.max(1))
        .map(|chunk| chunk.to_vec())
        .collect()
}

enum Source<I> {
    Inline {
        dataset: Arc<dyn Dataset<I>>,
        plan:    std::vec::IntoIter<Vec<usize>>,
    },
    Workers {
        receivers: Vec<Receiver<Vec<I>>>,
        handles:   Vec<JoinHandle<()>>,
    },
}

pub struct BatchLoader<I> {
    source: Source<I>,
    total:  usize,
    cursor: usize,
}

impl<I: Send + 'static> BatchLoader<I> {
    pub fn new(
        dataset:     Arc<dyn Dataset<I>>,
        batch_size:  usize,
        num_workers: usize,
        seed:        u64,
    ) -> Self {
        let plan  = plan_batches(dataset.len(), batch_size, seed);
        let total = plan.len();

        let source = if num_workers == 0 || total == 0 {
            Source::Inline { dataset, plan: plan.into_iter() }
        } else {
            let workers = num_workers.min(total);
            let mut per_worker: Vec<Vec<Vec<usize>>> = vec![Vec::new(); workers];
            for (i, batch) in plan.into_iter().enumerate() {
                per_worker[i % workers].push(batch);
            }

            let mut receivers = Vec::with_capacity(workers);
            let mut handles   = Vec::with_capacity(workers);
            for (worker, batches) in per_worker.into_iter().enumerate() {
                let (sender, receiver) = sync_channel(PREFETCH_PER_WORKER);
                let dataset = Arc::clone(&dataset);

                handles.push(thread::spawn(move || {
                    for indices in batches {
                        let items: Option<Vec<I>> =
                            indices.iter().map(|&i| dataset.get(i)).collect();
                        let Some(items) = items else {
                            tracing::error!("Batch worker {} hit a missing sample", worker);
                            return;
                        };
                        if sender.send(items).is_err() {
                            // consumer went away
                            return;
                        }
                    }
                }));
                receivers.push(receiver);
            }

            Source::Workers { receivers, handles }
        };

        Self { source, total, cursor: 0 }
    }

    /// Number of full batches this epoch will yield
    pub fn len(&self) -> usize {
        self.total
    }
}

impl<I> Iterator for BatchLoader<I> {
    type Item = Result<Vec<I>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.total {
            return None;
        }
        let index = self.cursor;
        self.cursor += 1;

        let batch = match &mut self.source {
            Source::Inline { dataset, plan } => {
                let indices = plan.next()?;
                indices
                    .iter()
                    .map(|&i| dataset.get(i))
                    .collect::<Option<Vec<I>>>()
                    .ok_or_else(|| anyhow!("batch {} references a missing sample", index))
            }
            Source::Workers { receivers, .. } => {
                let worker = index % receivers.len();
                receivers[worker]
                    .recv()
                    .map_err(|_| anyhow!("batch worker {} stopped before batch {}", worker, index))
            }
        };

        if batch.is_err() {
            // nothing after a failed batch is trustworthy
            self.cursor = self.total;
        }
        Some(batch)
    }
}

impl<I> Drop for BatchLoader<I> {
    fn drop(&mut self) {
        if let Source::Workers { receivers, handles } = &mut self.source {
            // Unblock workers waiting on a full channel before joining them.
            receivers.clear();
            for handle in handles.drain(..) {
                if handle.join().is_err() {
                    tracing::warn!("A batch worker panicked");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::data::dataset::InMemDataset;

    fn numbers(n: usize) -> Arc<dyn Dataset<usize>> {
        Arc::new(InMemDataset::new((0..n).collect::<Vec<usize>>()))
    }

    #[test]
    fn test_plan_drops_partial_batch() {
        let plan = plan_batches(10, 4, 7);
        assert_eq!(plan.len(), 2);
        assert!(plan.iter().all(|b| b.len() == 4));
    }

    #[test]
    fn test_plan_is_a_seeded_permutation() {
        let a = plan_batches(12, 3, 1);
        let b = plan_batches(12, 3, 1);
        assert_eq!(a, b);

        let mut seen: Vec<usize> = a.into_iter().flatten().collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..12).collect::<Vec<_>>());
    }

    #[test]
    fn test_inline_and_workers_yield_same_batches() {
        let inline: Vec<Vec<usize>> = BatchLoader::new(numbers(23), 4, 0, 99)
            .map(|b| b.unwrap())
            .collect();
        let threaded: Vec<Vec<usize>> = BatchLoader::new(numbers(23), 4, 3, 99)
            .map(|b| b.unwrap())
            .collect();

        assert_eq!(inline.len(), 5);
        assert_eq!(inline, threaded);
    }

    #[test]
    fn test_more_workers_than_batches() {
        let loader = BatchLoader::new(numbers(8), 4, 16, 0);
        assert_eq!(loader.len(), 2);
        assert_eq!(loader.count(), 2);
    }

    #[test]
    fn test_dataset_smaller_than_batch_yields_nothing() {
        let mut loader = BatchLoader::new(numbers(3), 4, 2, 0);
        assert_eq!(loader.len(), 0);
        assert!(loader.next().is_none());
    }

    #[test]
    fn test_dropping_early_joins_workers() {
        let mut loader = BatchLoader::new(numbers(400), 2, 4, 5);
        assert!(loader.next().unwrap().is_ok());
        drop(loader);
    }
}
