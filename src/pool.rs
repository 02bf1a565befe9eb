use anyhow::Context as _;
use rayon::prelude::*;

/// Fixed-size pool of blocking workers. Each unit of work runs to completion
/// on one worker; results come back in input order.
pub struct WorkerPool {
    pool: rayon::ThreadPool,
}

impl WorkerPool {
    pub fn new(workers: usize) -> anyhow::Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|index| format!("blogmigrate-worker-{index}"))
            .build()
            .context("build worker pool")?;
        Ok(Self { pool })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn map<T, R, F>(&self, items: &[T], work: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync + Send,
    {
        self.pool.install(|| items.par_iter().map(work).collect())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn results_follow_input_order() -> anyhow::Result<()> {
        let pool = WorkerPool::new(4)?;
        let items = (0..200).collect::<Vec<u32>>();

        let doubled = pool.map(&items, |n| {
            if n % 7 == 0 {
                std::thread::sleep(std::time::Duration::from_millis(1));
            }
            n * 2
        });

        assert_eq!(doubled, items.iter().map(|n| n * 2).collect::<Vec<_>>());
        Ok(())
    }

    #[test]
    fn runs_on_named_pool_threads() -> anyhow::Result<()> {
        let pool = WorkerPool::new(2)?;
        assert_eq!(pool.workers(), 2);

        let names = Mutex::new(HashSet::new());
        pool.map(&[1, 2, 3, 4, 5, 6], |_| {
            let name = std::thread::current().name().map(str::to_owned);
            names.lock().unwrap().insert(name);
        });

        let names = names.into_inner().unwrap();
        assert!(!names.is_empty());
        assert!(names.iter().all(|name| name
            .as_deref()
            .is_some_and(|n| n.starts_with("blogmigrate-worker-"))));
        Ok(())
    }

    #[test]
    fn zero_workers_still_runs() -> anyhow::Result<()> {
        let pool = WorkerPool::new(0)?;
        assert_eq!(pool.map(&["a", "b"], |s| s.len()), [1, 1]);
        Ok(())
    }
}
