// Fan-in of independent asynchronous result channels
use crate::error::AppError;
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

const SINK_CAPACITY: usize = 16;

/// Merges `sources` into one receiver.
///
/// Each source gets a forwarding task holding its own sender clone, so the
/// sink closes once, after the last source is exhausted. Items (errors
/// included) are forwarded as they arrive; no source cancels another.
pub fn fan_in<T: Send + 'static>(sources: Vec<mpsc::Receiver<T>>) -> mpsc::Receiver<T> {
    let (tx, rx) = mpsc::channel(SINK_CAPACITY);

    for mut source in sources {
        let tx = tx.clone();
        tokio::spawn(async move {
            while let Some(item) = source.recv().await {
                if tx.send(item).await.is_err() {
                    // receiver gone, nobody wants the rest
                    break;
                }
            }
        });
    }

    rx
}

/// Drains `rx` until it closes. If `deadline` passes first everything
/// received so far is dropped and the forwarders stop on their next send.
pub async fn collect_within<T>(rx: mpsc::Receiver<T>, deadline: Duration) -> Result<Vec<T>, AppError> {
    let items = ReceiverStream::new(rx).collect::<Vec<T>>();

    match tokio::time::timeout(deadline, items).await {
        Ok(items) => Ok(items),
        Err(_) => {
            tracing::warn!("fan-in abandoned after {:?}", deadline);
            Err(AppError::DeadlineExceeded)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(items: Vec<u32>, delay_ms: u64) -> mpsc::Receiver<u32> {
        let (tx, rx) = mpsc::channel(1);
        tokio::spawn(async move {
            for item in items {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                let _ = tx.send(item).await;
            }
        });
        rx
    }

    #[tokio::test]
    async fn test_merges_every_item_and_closes() {
        let rx = fan_in(vec![
            source(vec![1, 2], 15),
            source(vec![3, 4], 1),
            source(vec![5, 6], 7),
        ]);

        let mut items = collect_within(rx, Duration::from_secs(5)).await.unwrap();
        assert_eq!(items.len(), 6);
        items.sort();
        assert_eq!(items, vec![1, 2, 3, 4, 5, 6]);
    }

    #[tokio::test]
    async fn test_sink_stays_open_until_slowest_source_finishes() {
        let (slow_tx, slow_rx) = mpsc::channel(1);
        let mut rx = fan_in(vec![source(vec![1], 0), slow_rx]);

        assert_eq!(rx.recv().await, Some(1));
        assert!(rx.try_recv().is_err());

        slow_tx.send(2).await.unwrap();
        drop(slow_tx);
        assert_eq!(rx.recv().await, Some(2));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_errors_are_forwarded_like_items() {
        let (tx, err_rx) = mpsc::channel(1);
        tx.send(Err::<u32, String>("boom".to_string())).await.unwrap();
        drop(tx);
        let (tx, ok_rx) = mpsc::channel(1);
        tx.send(Ok(7)).await.unwrap();
        drop(tx);

        let items = collect_within(fan_in(vec![err_rx, ok_rx]), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.contains(&Ok(7)));
        assert!(items.contains(&Err("boom".to_string())));
    }

    #[tokio::test]
    async fn test_no_sources_closes_immediately() {
        let items = collect_within(fan_in::<u32>(Vec::new()), Duration::from_secs(1))
            .await
            .unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_deadline_discards_partial_results() {
        let (_never_done, stuck) = mpsc::channel::<u32>(1);
        let rx = fan_in(vec![source(vec![1], 0), stuck]);

        let result = collect_within(rx, Duration::from_millis(50)).await;
        assert!(matches!(result, Err(AppError::DeadlineExceeded)));
    }
}
