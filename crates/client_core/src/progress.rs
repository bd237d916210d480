//! Upload progress accounting.

use futures::{stream, Stream, StreamExt};

pub const UPLOAD_CHUNK_BYTES: usize = 64 * 1024;

/// Rounded percentage of `sent` over `total`, or `None` when the total is not
/// known to be positive.
pub fn percent_complete(sent: u64, total: u64) -> Option<u8> {
    if total == 0 {
        return None;
    }
    let percent = (sent as f64 / total as f64 * 100.0).round();
    Some(percent.clamp(0.0, 100.0) as u8)
}

/// Remembers the last reported percentage so repeated ticks that round to
/// the same value are dropped.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    last: Option<u8>,
}

impl ProgressTracker {
    pub fn advance(&mut self, sent: u64, total: u64) -> Option<u8> {
        let percent = percent_complete(sent, total)?;
        if self.last == Some(percent) {
            return None;
        }
        self.last = Some(percent);
        Some(percent)
    }
}

/// Splits `content` into chunks and reports the cumulative byte count each
/// time the transport pulls one.
pub fn chunked_with_progress<F>(
    content: Vec<u8>,
    chunk_size: usize,
    mut on_progress: F,
) -> impl Stream<Item = Result<Vec<u8>, std::io::Error>> + Send + Sync + 'static
where
    F: FnMut(u64, u64) + Send + Sync + 'static,
{
    let total = content.len() as u64;
    let chunks: Vec<Vec<u8>> = content
        .chunks(chunk_size.max(1))
        .map(<[u8]>::to_vec)
        .collect();
    let mut sent = 0u64;
    stream::iter(chunks).map(move |chunk| {
        sent += chunk.len() as u64;
        on_progress(sent, total);
        Ok(chunk)
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[test]
    fn percent_is_rounded() {
        assert_eq!(percent_complete(0, 200), Some(0));
        assert_eq!(percent_complete(1, 3), Some(33));
        assert_eq!(percent_complete(2, 3), Some(67));
        assert_eq!(percent_complete(3, 3), Some(100));
    }

    #[test]
    fn zero_total_is_not_computable() {
        assert_eq!(percent_complete(0, 0), None);
    }

    #[test]
    fn tracker_drops_unchanged_percentages() {
        let mut tracker = ProgressTracker::default();
        let total = 10_000;
        let reported: Vec<u8> = (1..=total)
            .step_by(7)
            .chain([total])
            .filter_map(|sent| tracker.advance(sent, total))
            .collect();

        assert_eq!(reported.first(), Some(&0));
        assert_eq!(reported.last(), Some(&100));
        assert_eq!(reported.len(), 101);
        assert!(reported.windows(2).all(|w| w[0] < w[1]), "{reported:?}");
    }

    #[test]
    fn tracker_ignores_unknown_totals() {
        let mut tracker = ProgressTracker::default();
        assert_eq!(tracker.advance(0, 0), None);
        assert_eq!(tracker.advance(5, 10), Some(50));
        assert_eq!(tracker.advance(5, 10), None);
    }

    #[tokio::test]
    async fn chunks_report_cumulative_bytes() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let chunks: Vec<_> = chunked_with_progress(vec![7u8; 10], 4, move |sent, total| {
            sink.lock().expect("lock").push((sent, total));
        })
        .collect()
        .await;

        assert_eq!(chunks.len(), 3);
        assert_eq!(
            *seen.lock().expect("lock"),
            vec![(4, 10), (8, 10), (10, 10)]
        );
    }
}
