use crate::error::{Error, Result};
use std::ops::Range;

/// Split `0..len` into at most `workers` contiguous ranges whose sizes differ
/// by at most one. Earlier ranges take the remainder.
pub fn static_ranges(len: usize, workers: usize) -> Vec<Range<usize>> {
    let workers = workers.max(1).min(len);
    if workers == 0 {
        return Vec::new();
    }

    let base = len / workers;
    let extra = len % workers;
    let mut ranges = Vec::with_capacity(workers);
    let mut start = 0;
    for worker in 0..workers {
        let size = base + usize::from(worker < extra);
        ranges.push(start..start + size);
        start += size;
    }
    ranges
}

/// Threads the machine can run in parallel
pub fn available_threads() -> usize {
    rayon::current_num_threads()
}

/// Fixed-size fork-join pool with static contiguous partitioning.
///
/// A single-thread pool runs everything on the calling thread in index order.
pub struct WorkerPool {
    threads: usize,
    pool: Option<rayon::ThreadPool>,
}

impl WorkerPool {
    pub fn new(threads: usize) -> Result<Self> {
        let threads = threads.max(1);
        if threads == 1 {
            return Ok(Self::serial());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("boid-worker-{i}"))
            .build()
            .map_err(|source| Error::ThreadPool { threads, source })?;
        log::debug!("Worker pool ready with {} threads", threads);

        Ok(Self {
            threads,
            pool: Some(pool),
        })
    }

    pub fn serial() -> Self {
        Self {
            threads: 1,
            pool: None,
        }
    }

    /// Pool sized to the machine's available parallelism
    pub fn with_available_parallelism() -> Result<Self> {
        Self::new(available_threads())
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Call `f(index, &mut items[index])` for every item and return once all
    /// calls have finished.
    ///
    /// Each worker owns one contiguous range from [`static_ranges`], so no
    /// two calls ever touch the same item.
    pub fn for_each_indexed<T, F>(&self, items: &mut [T], f: F)
    where
        T: Send,
        F: Fn(usize, &mut T) + Sync,
    {
        let pool = match &self.pool {
            Some(pool) if items.len() > 1 => pool,
            _ => {
                for (index, item) in items.iter_mut().enumerate() {
                    f(index, item);
                }
                return;
            }
        };

        let f = &f;
        pool.scope(|scope| {
            let mut rest: &mut [T] = items;
            for range in static_ranges(rest.len(), self.threads) {
                let (chunk, tail) = std::mem::take(&mut rest).split_at_mut(range.len());
                rest = tail;
                scope.spawn(move |_| {
                    for (offset, item) in chunk.iter_mut().enumerate() {
                        f(range.start + offset, item);
                    }
                });
            }
        });
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.threads)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    #[test]
    fn test_static_ranges_cover_everything() {
        let ranges = static_ranges(10, 3);
        assert_eq!(ranges, vec![0..4, 4..7, 7..10]);
    }

    #[test]
    fn test_static_ranges_balanced() {
        for len in 0..50 {
            for workers in 1..9 {
                let ranges = static_ranges(len, workers);
                let total: usize = ranges.iter().map(|r| r.len()).sum();
                assert_eq!(total, len);

                let sizes: Vec<usize> = ranges.iter().map(|r| r.len()).collect();
                if let (Some(max), Some(min)) = (sizes.iter().max(), sizes.iter().min()) {
                    assert!(max - min <= 1);
                    assert!(*min > 0);
                }
                for pair in ranges.windows(2) {
                    assert_eq!(pair[0].end, pair[1].start);
                }
            }
        }
    }

    #[test]
    fn test_more_workers_than_items() {
        assert_eq!(static_ranges(2, 8), vec![0..1, 1..2]);
        assert!(static_ranges(0, 4).is_empty());
    }

    #[test]
    fn test_serial_pool_runs_in_order() {
        let pool = WorkerPool::serial();
        let order = Mutex::new(Vec::new());
        let mut items = vec![0usize; 6];

        pool.for_each_indexed(&mut items, |index, item| {
            *item = index * 2;
            order.lock().unwrap().push(index);
        });

        assert_eq!(items, vec![0, 2, 4, 6, 8, 10]);
        assert_eq!(order.into_inner().unwrap(), vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_parallel_pool_visits_each_index_once() {
        let pool = WorkerPool::new(4).unwrap();
        assert_eq!(pool.threads(), 4);

        let seen = Mutex::new(HashSet::new());
        let mut items = vec![0usize; 103];
        pool.for_each_indexed(&mut items, |index, item| {
            *item = index + 1;
            assert!(seen.lock().unwrap().insert(index));
        });

        assert_eq!(seen.into_inner().unwrap().len(), 103);
        assert!(items.iter().enumerate().all(|(i, v)| *v == i + 1));
    }

    #[test]
    fn test_zero_threads_means_serial() {
        let pool = WorkerPool::new(0).unwrap();
        assert_eq!(pool.threads(), 1);
    }
}
