//! Order-preserving work pool on scoped threads

use crossbeam_channel::unbounded;
use std::thread;

/// Apply `job` to every item using up to `workers` threads.
///
/// Results come back in item order regardless of completion order.
/// With one worker (or one item) everything runs on the calling thread.
pub fn run_ordered<T, R, F>(items: &[T], workers: usize, job: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(usize, &T) -> R + Sync,
{
    let workers = workers.max(1).min(items.len());
    if workers <= 1 {
        return items
            .iter()
            .enumerate()
            .map(|(index, item)| job(index, item))
            .collect();
    }

    let (job_tx, job_rx) = unbounded::<usize>();
    for index in 0..items.len() {
        // Receiver is alive; send cannot fail.
        let _ = job_tx.send(index);
    }
    drop(job_tx);

    let (result_tx, result_rx) = unbounded::<(usize, R)>();
    let job = &job;
    thread::scope(|scope| {
        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            scope.spawn(move || {
                for index in job_rx.iter() {
                    let _ = result_tx.send((index, job(index, &items[index])));
                }
            });
        }
    });
    drop(result_tx);

    let mut slots: Vec<Option<R>> = (0..items.len()).map(|_| None).collect();
    for (index, result) in result_rx.iter() {
        slots[index] = Some(result);
    }
    slots.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_sequential_when_single_worker() {
        let out = run_ordered(&[1, 2, 3], 1, |i, v| (i, v * 10));
        assert_eq!(out, vec![(0, 10), (1, 20), (2, 30)]);
    }

    #[test]
    fn test_parallel_preserves_order() {
        let items: Vec<u64> = (0..16).collect();
        // Later items finish first.
        let out = run_ordered(&items, 4, |_, v| {
            thread::sleep(Duration::from_millis(16 - v));
            *v
        });
        assert_eq!(out, items);
    }

    #[test]
    fn test_empty_input() {
        let out: Vec<u8> = run_ordered(&[] as &[u8], 8, |_, v| *v);
        assert!(out.is_empty());
    }
}
