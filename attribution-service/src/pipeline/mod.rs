use std::pin::Pin;

use futures::{Stream, StreamExt};

use crate::transform::{retain_valid, HourlyRecord};

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("source error: {0}")]
    Source(String),
    #[error("sink error: {0}")]
    Sink(String),
}

pub type RecordStream<T> = Pin<Box<dyn Stream<Item = Result<T, PipelineError>> + Send>>;

/// Produces the rows of one input table.
#[async_trait::async_trait]
pub trait Source<T>: Send + Sync {
    async fn stream(&self) -> RecordStream<T>;
}

/// An input table after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedTable<T> {
    pub rows: Vec<T>,
    pub rejected: usize,
}

/// Drains a source into memory and drops rows that fail validation.
///
/// Source errors (unreadable file, unparsable row) abort the load; invalid
/// but well-formed rows are only counted.
pub async fn load_table<T, S>(source: &S) -> Result<LoadedTable<T>, PipelineError>
where
    T: HourlyRecord + Send + 'static,
    S: Source<T> + ?Sized,
{
    let mut stream = source.stream().await;
    let mut rows = Vec::new();
    while let Some(item) = stream.next().await {
        rows.push(item?);
    }

    let read = rows.len();
    let (rows, rejected) = retain_valid(rows);
    metrics::counter!("input_rows_loaded_total", "table" => T::TABLE).increment(rows.len() as u64);
    tracing::info!(table = T::TABLE, read, kept = rows.len(), rejected, "input table loaded");

    Ok(LoadedTable { rows, rejected })
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_client::domain::PersonalUsageRecord;
    use time::macros::datetime;

    struct VecSource(Vec<Result<PersonalUsageRecord, String>>);

    #[async_trait::async_trait]
    impl Source<PersonalUsageRecord> for VecSource {
        async fn stream(&self) -> RecordStream<PersonalUsageRecord> {
            let items: Vec<_> = self
                .0
                .iter()
                .cloned()
                .map(|r| r.map_err(PipelineError::Source))
                .collect();
            Box::pin(futures::stream::iter(items))
        }
    }

    fn usage(ts: time::OffsetDateTime, usage_kwh: f64) -> PersonalUsageRecord {
        PersonalUsageRecord { ts, usage_kwh }
    }

    #[tokio::test]
    async fn load_table_counts_rejected_rows() {
        let source = VecSource(vec![
            Ok(usage(datetime!(2024-01-01 00:00 UTC), 1.0)),
            Ok(usage(datetime!(2024-01-01 01:00 UTC), -3.0)),
            Ok(usage(datetime!(2024-01-01 02:00 UTC), 2.0)),
        ]);
        let table = load_table(&source).await.unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rejected, 1);
    }

    #[tokio::test]
    async fn load_table_stops_on_source_error() {
        let source = VecSource(vec![
            Ok(usage(datetime!(2024-01-01 00:00 UTC), 1.0)),
            Err("bad row".to_string()),
        ]);
        let err = load_table(&source).await.unwrap_err();
        assert!(matches!(err, PipelineError::Source(msg) if msg == "bad row"));
    }
}
