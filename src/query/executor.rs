//! Query Executor
//!
//! Runs statistic queries against the ReadingStore:
//! 1. Validate the mandatory filters for the statistic
//! 2. Fetch matching readings (or bare values) sorted by value
//! 3. Short-circuit to `StatOutcome::NoResults` on an empty set
//! 4. Hand the sorted values to the aggregator
//!
//! # Execution Pipeline
//!
//! ```text
//! (Statistic, ReadingFilter) → Validate → Store (ORDER BY value) → Empty? → Aggregate → Outcome
//! ```

use std::sync::Arc;

use crate::query::aggregate::{self, Quartiles, StatValue, Statistic};
use crate::query::error::{QueryError, QueryResult};
use crate::storage::{Reading, ReadingFilter, ReadingStore, SortOrder};

/// Result of a statistic query
#[derive(Debug, Clone, PartialEq)]
pub enum StatOutcome {
    /// The reading holding the min or max value
    Reading(Reading),
    /// A single number (mean, median, mode)
    Value(StatValue),
    /// Lower and upper quartile
    Quartiles(Quartiles),
    /// The query was valid but matched no readings
    NoResults,
}

impl StatOutcome {
    pub fn is_empty(&self) -> bool {
        matches!(self, StatOutcome::NoResults)
    }
}

impl From<Option<Reading>> for StatOutcome {
    fn from(reading: Option<Reading>) -> Self {
        reading.map(StatOutcome::Reading).unwrap_or(StatOutcome::NoResults)
    }
}

impl From<Option<StatValue>> for StatOutcome {
    fn from(value: Option<StatValue>) -> Self {
        value.map(StatOutcome::Value).unwrap_or(StatOutcome::NoResults)
    }
}

impl From<Option<Quartiles>> for StatOutcome {
    fn from(quartiles: Option<Quartiles>) -> Self {
        quartiles.map(StatOutcome::Quartiles).unwrap_or(StatOutcome::NoResults)
    }
}

/// Query executor
pub struct QueryExecutor {
    /// Reference to the reading store
    store: Arc<ReadingStore>,
}

impl QueryExecutor {
    /// Create a new query executor
    pub fn new(store: Arc<ReadingStore>) -> Self {
        Self { store }
    }

    /// List readings in ingestion order; an empty list is a valid answer
    pub async fn list(&self, filter: ReadingFilter) -> QueryResult<Vec<Reading>> {
        Ok(self.store.query(filter, SortOrder::Insertion).await?)
    }

    /// Compute a statistic over the readings matching `filter`
    pub async fn compute(
        &self,
        statistic: Statistic,
        filter: ReadingFilter,
    ) -> QueryResult<StatOutcome> {
        validate_filter(statistic, &filter)?;

        let device_uuid = filter.device_uuid.clone();

        let outcome = match statistic {
            Statistic::Min | Statistic::Max => {
                let readings = self.store.query(filter, SortOrder::ValueAscending).await?;
                if readings.is_empty() {
                    StatOutcome::NoResults
                } else if statistic == Statistic::Min {
                    aggregate::min(&readings).cloned().into()
                } else {
                    aggregate::max(&readings).cloned().into()
                }
            }
            _ => {
                let values = self.store.query_values(filter).await?;
                if values.is_empty() {
                    StatOutcome::NoResults
                } else {
                    aggregate_values(statistic, &values)
                }
            }
        };

        tracing::debug!(
            device_uuid = %device_uuid,
            %statistic,
            empty = outcome.is_empty(),
            "Statistic computed"
        );

        Ok(outcome)
    }

    /// Reading with the smallest value
    pub async fn min(&self, filter: ReadingFilter) -> QueryResult<StatOutcome> {
        self.compute(Statistic::Min, filter).await
    }

    /// Reading with the largest value
    pub async fn max(&self, filter: ReadingFilter) -> QueryResult<StatOutcome> {
        self.compute(Statistic::Max, filter).await
    }

    /// Mean of the matching values
    pub async fn mean(&self, filter: ReadingFilter) -> QueryResult<StatOutcome> {
        self.compute(Statistic::Mean, filter).await
    }

    /// Median of the matching values
    pub async fn median(&self, filter: ReadingFilter) -> QueryResult<StatOutcome> {
        self.compute(Statistic::Median, filter).await
    }

    /// Mode of the matching values
    pub async fn mode(&self, filter: ReadingFilter) -> QueryResult<StatOutcome> {
        self.compute(Statistic::Mode, filter).await
    }

    /// Quartiles of the matching values; the time window is mandatory
    pub async fn quartiles(&self, filter: ReadingFilter) -> QueryResult<StatOutcome> {
        self.compute(Statistic::Quartiles, filter).await
    }
}

/// Apply a statistic to a non-empty ascending value set
fn aggregate_values(statistic: Statistic, values: &[i64]) -> StatOutcome {
    match statistic {
        Statistic::Min => aggregate::min(values).copied().map(StatValue::Integer).into(),
        Statistic::Max => aggregate::max(values).copied().map(StatValue::Integer).into(),
        Statistic::Mean => aggregate::mean(values).map(StatValue::Float).into(),
        Statistic::Median => aggregate::median(values).into(),
        Statistic::Mode => aggregate::mode(values).map(StatValue::Integer).into(),
        Statistic::Quartiles => aggregate::quartiles(values).into(),
    }
}

/// Check the filters a statistic cannot run without
fn validate_filter(statistic: Statistic, filter: &ReadingFilter) -> QueryResult<()> {
    if filter.sensor_type.is_none() {
        return Err(QueryError::InvalidInput(format!(
            "the sensor type is required for {}",
            statistic
        )));
    }

    if statistic.requires_window() {
        if filter.start.is_none() {
            return Err(QueryError::InvalidInput(format!(
                "start is required for {}",
                statistic
            )));
        }
        if filter.end.is_none() {
            return Err(QueryError::InvalidInput(format!(
                "end is required for {}",
                statistic
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{NewReading, SensorType, StorageConfig, StoreProfile};
    use tempfile::tempdir;

    async fn create_test_executor() -> (QueryExecutor, Arc<ReadingStore>, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let config = StorageConfig::new(dir.path()).profile(StoreProfile::Testing);
        let store = Arc::new(ReadingStore::open(config).await.unwrap());
        let executor = QueryExecutor::new(Arc::clone(&store));
        (executor, store, dir)
    }

    async fn seed(store: &ReadingStore) {
        for (value, ts) in [(22, 1_000), (50, 1_050), (100, 1_100)] {
            store
                .insert(NewReading::new("test_device", SensorType::Temperature, value).created_at(ts))
                .await
                .unwrap();
        }
        store
            .insert(NewReading::new("other_uuid", SensorType::Temperature, 22).created_at(1_100))
            .await
            .unwrap();
    }

    fn temperature() -> ReadingFilter {
        ReadingFilter::device("test_device").sensor_type(SensorType::Temperature)
    }

    #[tokio::test]
    async fn test_min_max_return_records() {
        let (executor, store, _dir) = create_test_executor().await;
        seed(&store).await;

        match executor.min(temperature()).await.unwrap() {
            StatOutcome::Reading(r) => {
                assert_eq!(r.value, 22);
                assert_eq!(r.device_uuid, "test_device");
                assert_eq!(r.date_created, 1_000);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        match executor.max(temperature()).await.unwrap() {
            StatOutcome::Reading(r) => assert_eq!(r.value, 100),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_value_statistics() {
        let (executor, store, _dir) = create_test_executor().await;
        seed(&store).await;

        assert_eq!(
            executor.median(temperature()).await.unwrap(),
            StatOutcome::Value(StatValue::Integer(50))
        );
        assert_eq!(
            executor.mode(temperature()).await.unwrap(),
            StatOutcome::Value(StatValue::Integer(22))
        );

        match executor.mean(temperature()).await.unwrap() {
            StatOutcome::Value(v) => assert_eq!((v.as_f64() * 100.0).round() / 100.0, 57.33),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_quartiles() {
        let (executor, store, _dir) = create_test_executor().await;
        seed(&store).await;

        let outcome = executor
            .quartiles(temperature().start(1_000).end(100_000_000_000))
            .await
            .unwrap();
        match outcome {
            StatOutcome::Quartiles(q) => assert_eq!(q.to_string(), "22,100"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_quartiles_requires_window() {
        let (executor, _store, _dir) = create_test_executor().await;

        let err = executor.quartiles(temperature()).await.unwrap_err();
        assert!(matches!(err, QueryError::InvalidInput(_)));

        let err = executor.quartiles(temperature().start(1)).await.unwrap_err();
        assert!(err.to_string().contains("end"));
    }

    #[tokio::test]
    async fn test_type_required_for_statistics() {
        let (executor, _store, _dir) = create_test_executor().await;

        for statistic in Statistic::all() {
            let err = executor
                .compute(*statistic, ReadingFilter::device("test_device").start(0).end(1))
                .await
                .unwrap_err();
            assert!(matches!(err, QueryError::InvalidInput(_)));
        }
    }

    #[tokio::test]
    async fn test_empty_window_is_no_results() {
        let (executor, store, _dir) = create_test_executor().await;
        seed(&store).await;

        for statistic in Statistic::all() {
            let outcome = executor
                .compute(*statistic, temperature().start(1).end(999))
                .await
                .unwrap();
            assert_eq!(outcome, StatOutcome::NoResults, "{}", statistic);
        }

        assert!(executor
            .list(ReadingFilter::device("test_device").start(1).end(999))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_single_reading_quartiles_is_no_results() {
        let (executor, store, _dir) = create_test_executor().await;
        store
            .insert(NewReading::new("test_device", SensorType::Temperature, 40).created_at(10))
            .await
            .unwrap();

        let outcome = executor.quartiles(temperature().start(0).end(20)).await.unwrap();
        assert_eq!(outcome, StatOutcome::NoResults);
    }

    #[tokio::test]
    async fn test_list_keeps_ingestion_order() {
        let (executor, store, _dir) = create_test_executor().await;
        seed(&store).await;

        let readings = executor.list(ReadingFilter::device("test_device")).await.unwrap();
        assert_eq!(
            readings.iter().map(|r| r.value).collect::<Vec<_>>(),
            vec![22, 50, 100]
        );
    }
}
