use std::collections::HashMap;
use std::future::Future;
use std::time::{SystemTime, UNIX_EPOCH};

use pawmark::{
    LockPawmarkGenerator, MonotonicClock, PawmarkGenerator, ShortCode, TimeSource,
};
use rand::Rng;
use tracing::{debug, error, info, instrument, warn};

use crate::config::MappingConfig;
use crate::error::{Error, Result};
use crate::record::{MappingField, MappingRecord};
use crate::store::{MappingStore, StoreError};

/// Whether an issued mapping reached the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Durability {
    /// The record was durably persisted; the code will resolve.
    Stored,
    /// The identifier was generated and the code derived, but the store
    /// write failed or timed out. The code is valid and collision-checked
    /// only as far as the failed write got; the caller should re-persist
    /// (or re-issue) before handing it out.
    Degraded { reason: String },
}

/// The result of issuing a short code.
///
/// Issuance distinguishes three stages — identifier generated, code
/// derived, mapping durably stored — and never silently collapses them:
/// a store failure after generation is reported as
/// [`Durability::Degraded`] on an otherwise successful result rather than
/// dropped on the floor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCode {
    /// The record as sent to the store.
    pub record: MappingRecord,
    /// Whether the record reached the store.
    pub durability: Durability,
}

impl IssuedCode {
    /// The 9-digit public code.
    pub fn short_code(&self) -> &str {
        &self.record.short_code
    }

    /// The decimal form of the internal 64-bit ID.
    pub fn original_id(&self) -> &str {
        &self.record.original_id
    }

    /// True when the mapping was durably stored.
    pub fn is_durable(&self) -> bool {
        matches!(self.durability, Durability::Stored)
    }
}

/// Issues short codes and serves forward/reverse/batch lookups.
///
/// Holds one [`LockPawmarkGenerator`] (safe to share across tasks) and a
/// [`MappingStore`]. Every store call runs under the configured
/// `store_timeout`; nothing here awaits the store without a bound.
///
/// Issuance inserts the candidate record directly and treats the store's
/// uniqueness constraint as the only collision signal: there is no
/// existence pre-check that a concurrent caller could slip past between
/// read and write. On [`StoreError::DuplicateCode`] the candidate's
/// leading digit is re-rolled and the insert retried, up to
/// `max_issue_attempts` times.
///
/// # Example
///
/// ```
/// use pawmark_mapping::{IdMappingService, MappingConfig, testkit::MemoryStore};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), pawmark_mapping::Error> {
/// let service = IdMappingService::new(MemoryStore::new(), MappingConfig::default())?;
///
/// let issued = service.issue_short_code("user-42").await?;
/// assert!(issued.is_durable());
///
/// let original = service.resolve_original(issued.short_code()).await?;
/// assert_eq!(original.as_deref(), Some(issued.original_id()));
/// # Ok(())
/// # }
/// ```
pub struct IdMappingService<S, T = MonotonicClock>
where
    S: MappingStore,
    T: TimeSource,
{
    generator: LockPawmarkGenerator<T>,
    store: S,
    config: MappingConfig,
}

impl<S> IdMappingService<S, MonotonicClock>
where
    S: MappingStore,
{
    /// Creates a service over `store`, generating IDs from a
    /// [`MonotonicClock`] anchored to the configured epoch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IdGeneration`] if the configured tags are out of
    /// range.
    pub fn new(store: S, config: MappingConfig) -> Result<Self> {
        let clock = MonotonicClock::with_epoch(config.epoch);
        Self::with_clock(store, config, clock)
    }
}

impl<S, T> IdMappingService<S, T>
where
    S: MappingStore,
    T: TimeSource,
{
    /// Creates a service with an explicit time source.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IdGeneration`] if the configured tags are out of
    /// range.
    pub fn with_clock(store: S, config: MappingConfig, clock: T) -> Result<Self> {
        let generator =
            LockPawmarkGenerator::new(config.data_center_tag, config.worker_tag, clock)?;
        Ok(Self {
            generator,
            store,
            config,
        })
    }

    /// Generates a fresh 64-bit identifier in its canonical decimal string
    /// form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IdGeneration`] if the clock regressed.
    pub fn generate_id(&self) -> Result<String> {
        Ok(self.generator.next_id()?.to_string())
    }

    /// Issues a new short code for `owner_id` and persists the mapping.
    ///
    /// The candidate code is derived deterministically from a freshly
    /// generated identifier, then inserted. A duplicate-code rejection
    /// re-rolls the leading digit and retries; any other store failure
    /// after the identifier exists returns a degraded success (see
    /// [`IssuedCode`]).
    ///
    /// Idempotency is the caller's concern: calling this twice for one
    /// owner issues two codes. Use [`Self::resolve_short_code`] first for
    /// check-then-issue flows.
    ///
    /// # Errors
    ///
    /// - [`Error::IdGeneration`] if the clock regressed.
    /// - [`Error::GenerationExhausted`] if every candidate in the retry
    ///   budget was already taken.
    #[instrument(skip(self))]
    pub async fn issue_short_code(&self, owner_id: &str) -> Result<IssuedCode> {
        let id = self.generator.next_id()?;
        let original_id = id.to_string();
        let mut code = ShortCode::derive(id);
        debug!(%original_id, candidate = %code, "derived short code candidate");

        let attempts = self.config.max_issue_attempts;
        for attempt in 1..=attempts {
            let record = MappingRecord {
                short_code: code.to_string(),
                original_id: original_id.clone(),
                owner_id: owner_id.to_owned(),
                created_at: unix_millis(),
            };

            let insert = tokio::time::timeout(self.config.store_timeout, self.store.insert(&record));
            match insert.await {
                Ok(Ok(())) => {
                    info!(short_code = %record.short_code, %original_id, "issued short code");
                    return Ok(IssuedCode {
                        record,
                        durability: Durability::Stored,
                    });
                }
                Ok(Err(StoreError::DuplicateCode { .. })) => {
                    warn!(candidate = %code, attempt, "short code collision, re-rolling leading digit");
                    code = code.with_leading_digit(rand::rng().random_range(1..=9));
                }
                Ok(Err(StoreError::Unavailable { context })) => {
                    error!(short_code = %record.short_code, %context, "mapping not persisted");
                    return Ok(IssuedCode {
                        record,
                        durability: Durability::Degraded { reason: context },
                    });
                }
                Err(_elapsed) => {
                    let timeout_ms = self.config.store_timeout.as_millis() as u64;
                    error!(short_code = %record.short_code, timeout_ms, "mapping insert timed out");
                    return Ok(IssuedCode {
                        record,
                        durability: Durability::Degraded {
                            reason: format!("insert timed out after {timeout_ms} ms"),
                        },
                    });
                }
            }
        }

        Err(Error::GenerationExhausted { attempts })
    }

    /// Resolves a short code to the internal identifier it maps to.
    pub async fn resolve_original(&self, short_code: &str) -> Result<Option<String>> {
        let record = self
            .bounded(self.store.find_one(MappingField::ShortCode, short_code))
            .await?;
        Ok(record.map(|r| r.original_id))
    }

    /// Resolves an internal identifier to its issued short code.
    pub async fn resolve_short_code(&self, original_id: &str) -> Result<Option<String>> {
        let record = self
            .bounded(self.store.find_one(MappingField::OriginalId, original_id))
            .await?;
        Ok(record.map(|r| r.short_code))
    }

    /// Resolves many short codes at once; codes with no mapping are
    /// omitted from the result.
    pub async fn batch_resolve_original(
        &self,
        short_codes: &[String],
    ) -> Result<HashMap<String, String>> {
        if short_codes.is_empty() {
            return Ok(HashMap::new());
        }
        let records = self
            .bounded(self.store.find_many(MappingField::ShortCode, short_codes))
            .await?;
        Ok(records
            .into_iter()
            .map(|r| (r.short_code, r.original_id))
            .collect())
    }

    /// Resolves many internal identifiers at once; identifiers with no
    /// mapping are omitted from the result.
    pub async fn batch_resolve_short_code(
        &self,
        original_ids: &[String],
    ) -> Result<HashMap<String, String>> {
        if original_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let records = self
            .bounded(self.store.find_many(MappingField::OriginalId, original_ids))
            .await?;
        Ok(records
            .into_iter()
            .map(|r| (r.original_id, r.short_code))
            .collect())
    }

    /// Returns whether a mapping exists for `short_code`.
    pub async fn exists(&self, short_code: &str) -> Result<bool> {
        let count = self
            .bounded(self.store.count(MappingField::ShortCode, short_code))
            .await?;
        Ok(count > 0)
    }

    /// Runs a store call under the configured timeout.
    async fn bounded<F, O>(&self, call: F) -> Result<O>
    where
        F: Future<Output = core::result::Result<O, StoreError>>,
    {
        match tokio::time::timeout(self.config.store_timeout, call).await {
            Ok(result) => Ok(result?),
            Err(_elapsed) => Err(Error::StoreTimeout {
                timeout_ms: self.config.store_timeout.as_millis() as u64,
            }),
        }
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("System clock before UNIX_EPOCH")
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::MemoryStore;
    use pawmark::PawmarkId;
    use std::collections::VecDeque;
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    struct FixedTime {
        millis: u64,
    }

    impl TimeSource for FixedTime {
        fn current_millis(&self) -> u64 {
            self.millis
        }
    }

    #[derive(Clone)]
    struct StepTime {
        values: Arc<Vec<u64>>,
        index: Arc<AtomicUsize>,
    }

    impl StepTime {
        fn new(values: impl Into<Vec<u64>>) -> Self {
            Self {
                values: Arc::new(values.into()),
                index: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn advance(&self) {
            self.index.fetch_add(1, Ordering::Relaxed);
        }
    }

    impl TimeSource for StepTime {
        fn current_millis(&self) -> u64 {
            self.values[self.index.load(Ordering::Relaxed)]
        }
    }

    #[derive(Clone, Copy)]
    enum InsertOutcome {
        Accept,
        Duplicate,
        Unavailable,
        Hang,
    }

    /// A store whose insert outcomes are scripted per call, falling back to
    /// `default` once the script runs out.
    struct ScriptedStore {
        outcomes: Mutex<VecDeque<InsertOutcome>>,
        default: InsertOutcome,
        inserts: AtomicUsize,
        persisted: Mutex<Vec<MappingRecord>>,
    }

    impl ScriptedStore {
        fn with_outcomes(outcomes: impl Into<VecDeque<InsertOutcome>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                default: InsertOutcome::Accept,
                inserts: AtomicUsize::new(0),
                persisted: Mutex::new(Vec::new()),
            }
        }

        fn always_duplicate() -> Self {
            Self {
                outcomes: Mutex::new(VecDeque::new()),
                default: InsertOutcome::Duplicate,
                inserts: AtomicUsize::new(0),
                persisted: Mutex::new(Vec::new()),
            }
        }

        fn inserts(&self) -> usize {
            self.inserts.load(Ordering::SeqCst)
        }
    }

    impl MappingStore for ScriptedStore {
        async fn insert(&self, record: &MappingRecord) -> core::result::Result<(), StoreError> {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            let outcome = self
                .outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(self.default);
            match outcome {
                InsertOutcome::Accept => {
                    self.persisted.lock().unwrap().push(record.clone());
                    Ok(())
                }
                InsertOutcome::Duplicate => Err(StoreError::DuplicateCode {
                    code: record.short_code.clone(),
                }),
                InsertOutcome::Unavailable => Err(StoreError::Unavailable {
                    context: "store offline".into(),
                }),
                InsertOutcome::Hang => {
                    std::future::pending::<()>().await;
                    unreachable!()
                }
            }
        }

        async fn find_one(
            &self,
            field: MappingField,
            value: &str,
        ) -> core::result::Result<Option<MappingRecord>, StoreError> {
            Ok(self
                .persisted
                .lock()
                .unwrap()
                .iter()
                .find(|r| field.value_of(r) == value)
                .cloned())
        }

        async fn find_many(
            &self,
            field: MappingField,
            values: &[String],
        ) -> core::result::Result<Vec<MappingRecord>, StoreError> {
            Ok(self
                .persisted
                .lock()
                .unwrap()
                .iter()
                .filter(|r| values.iter().any(|v| v == field.value_of(r)))
                .cloned()
                .collect())
        }

        async fn count(
            &self,
            field: MappingField,
            value: &str,
        ) -> core::result::Result<u64, StoreError> {
            Ok(self
                .persisted
                .lock()
                .unwrap()
                .iter()
                .filter(|r| field.value_of(r) == value)
                .count() as u64)
        }
    }

    /// A store where every operation hangs until cancelled.
    struct HangingStore;

    impl MappingStore for HangingStore {
        async fn insert(&self, _record: &MappingRecord) -> core::result::Result<(), StoreError> {
            std::future::pending().await
        }

        async fn find_one(
            &self,
            _field: MappingField,
            _value: &str,
        ) -> core::result::Result<Option<MappingRecord>, StoreError> {
            std::future::pending().await
        }

        async fn find_many(
            &self,
            _field: MappingField,
            _values: &[String],
        ) -> core::result::Result<Vec<MappingRecord>, StoreError> {
            std::future::pending().await
        }

        async fn count(
            &self,
            _field: MappingField,
            _value: &str,
        ) -> core::result::Result<u64, StoreError> {
            std::future::pending().await
        }
    }

    /// The candidate every generator in these tests derives first: fixed
    /// clock at 42 ms, default tags (1, 1), sequence 0.
    fn first_candidate() -> String {
        ShortCode::derive(PawmarkId::from(42, 1, 1, 0)).to_string()
    }

    #[tokio::test]
    async fn issued_code_round_trips() {
        let service = IdMappingService::new(MemoryStore::new(), MappingConfig::default()).unwrap();

        let issued = service.issue_short_code("user-1").await.unwrap();
        assert!(issued.is_durable());

        let code = issued.short_code();
        assert_eq!(code.len(), 9);
        assert!(code.bytes().all(|b| b.is_ascii_digit()));
        assert_ne!(code.as_bytes()[0], b'0');
        assert_eq!(issued.record.owner_id, "user-1");

        assert_eq!(
            service.resolve_original(code).await.unwrap().as_deref(),
            Some(issued.original_id())
        );
        assert_eq!(
            service
                .resolve_short_code(issued.original_id())
                .await
                .unwrap()
                .as_deref(),
            Some(code)
        );
        assert!(service.exists(code).await.unwrap());

        let absent = if code == "123456789" {
            "987654321"
        } else {
            "123456789"
        };
        assert!(!service.exists(absent).await.unwrap());
        assert_eq!(service.resolve_original(absent).await.unwrap(), None);
    }

    #[tokio::test]
    async fn batch_resolution_omits_misses() {
        let service = IdMappingService::new(MemoryStore::new(), MappingConfig::default()).unwrap();

        let a = service.issue_short_code("user-a").await.unwrap();
        let b = service.issue_short_code("user-b").await.unwrap();

        let absent = ["123456789", "987654321", "555555555"]
            .into_iter()
            .find(|c| *c != a.short_code() && *c != b.short_code())
            .unwrap();

        let query = vec![
            a.short_code().to_owned(),
            b.short_code().to_owned(),
            absent.to_owned(),
        ];
        let forward = service.batch_resolve_original(&query).await.unwrap();
        assert_eq!(forward.len(), 2);
        assert_eq!(forward[a.short_code()], a.original_id());
        assert_eq!(forward[b.short_code()], b.original_id());

        let reverse = service
            .batch_resolve_short_code(&[a.original_id().to_owned(), "1".to_owned()])
            .await
            .unwrap();
        assert_eq!(reverse.len(), 1);
        assert_eq!(reverse[a.original_id()], a.short_code());

        assert!(service.batch_resolve_original(&[]).await.unwrap().is_empty());
        assert!(
            service
                .batch_resolve_short_code(&[])
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn collisions_retry_with_adjusted_leading_digit() {
        let store = Arc::new(ScriptedStore::with_outcomes([
            InsertOutcome::Duplicate,
            InsertOutcome::Duplicate,
            InsertOutcome::Accept,
        ]));
        let service = IdMappingService::with_clock(
            Arc::clone(&store),
            MappingConfig::default(),
            FixedTime { millis: 42 },
        )
        .unwrap();

        let issued = service.issue_short_code("user-1").await.unwrap();
        assert!(issued.is_durable());
        assert_eq!(store.inserts(), 3);

        // Only the leading digit is adjusted between attempts.
        assert_eq!(&issued.short_code()[1..], &first_candidate()[1..]);
    }

    #[tokio::test]
    async fn exhausted_retry_budget_fails_after_five_attempts() {
        let store = Arc::new(ScriptedStore::always_duplicate());
        let service = IdMappingService::with_clock(
            Arc::clone(&store),
            MappingConfig::default(),
            FixedTime { millis: 42 },
        )
        .unwrap();

        let err = service.issue_short_code("user-1").await.unwrap_err();
        assert!(matches!(err, Error::GenerationExhausted { attempts: 5 }));
        assert_eq!(store.inserts(), 5);
    }

    #[tokio::test]
    async fn store_outage_reports_degraded_success() {
        let store = Arc::new(ScriptedStore::with_outcomes([InsertOutcome::Unavailable]));
        let service = IdMappingService::with_clock(
            Arc::clone(&store),
            MappingConfig::default(),
            FixedTime { millis: 42 },
        )
        .unwrap();

        let issued = service.issue_short_code("user-1").await.unwrap();
        assert!(!issued.is_durable());
        assert_eq!(
            issued.durability,
            Durability::Degraded {
                reason: "store offline".into()
            }
        );
        // The identifier and code still exist for the caller to re-persist.
        assert_eq!(issued.short_code(), first_candidate());
        assert!(!issued.original_id().is_empty());
        assert_eq!(store.inserts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn insert_timeout_reports_degraded_success() {
        let store = Arc::new(ScriptedStore::with_outcomes([InsertOutcome::Hang]));
        let service = IdMappingService::with_clock(
            Arc::clone(&store),
            MappingConfig::default(),
            FixedTime { millis: 42 },
        )
        .unwrap();

        let issued = service.issue_short_code("user-1").await.unwrap();
        assert!(!issued.is_durable());
        assert!(matches!(issued.durability, Durability::Degraded { .. }));
        assert_eq!(store.inserts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn lookups_are_time_bounded() {
        let service = IdMappingService::with_clock(
            HangingStore,
            MappingConfig::default(),
            FixedTime { millis: 42 },
        )
        .unwrap();

        let err = service.resolve_original("123456789").await.unwrap_err();
        assert!(matches!(err, Error::StoreTimeout { timeout_ms: 5_000 }));

        let err = service.exists("123456789").await.unwrap_err();
        assert!(matches!(err, Error::StoreTimeout { .. }));
    }

    #[tokio::test]
    async fn concurrent_issuance_never_persists_one_code_twice() {
        // Two instances misconfigured with the same tag pair and a frozen
        // clock derive the identical candidate code. The store's uniqueness
        // constraint must let only one of them keep it.
        let store = Arc::new(MemoryStore::new());
        let config = MappingConfig {
            // Room to re-roll past repeat collisions on the 1-in-9 digit.
            max_issue_attempts: 10,
            ..Default::default()
        };
        let s1 = IdMappingService::with_clock(
            Arc::clone(&store),
            config.clone(),
            FixedTime { millis: 42 },
        )
        .unwrap();
        let s2 = IdMappingService::with_clock(
            Arc::clone(&store),
            config,
            FixedTime { millis: 42 },
        )
        .unwrap();

        let (a, b) = tokio::join!(s1.issue_short_code("user-a"), s2.issue_short_code("user-b"));
        let (a, b) = (a.unwrap(), b.unwrap());

        assert!(a.is_durable() && b.is_durable());
        assert_ne!(a.short_code(), b.short_code());

        let candidate = first_candidate();
        let hits = store
            .records()
            .iter()
            .filter(|r| r.short_code == candidate)
            .count();
        assert_eq!(hits, 1);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn clock_regression_fails_issuance() {
        let time = StepTime::new([42, 41]);
        let service = IdMappingService::with_clock(
            MemoryStore::new(),
            MappingConfig::default(),
            time.clone(),
        )
        .unwrap();

        let first = service.issue_short_code("user-1").await.unwrap();
        assert!(first.is_durable());

        time.advance();

        let err = service.issue_short_code("user-1").await.unwrap_err();
        assert!(matches!(
            err,
            Error::IdGeneration(pawmark::Error::ClockRegression { last: 42, now: 41 })
        ));
    }

    #[test]
    fn generated_ids_are_decimal_and_monotonic() {
        let service = IdMappingService::new(MemoryStore::new(), MappingConfig::default()).unwrap();

        let first: u64 = service.generate_id().unwrap().parse().unwrap();
        let second: u64 = service.generate_id().unwrap().parse().unwrap();
        assert!(second > first);

        let decoded = PawmarkId::from_raw(first);
        assert_eq!(decoded.data_center_tag(), 1);
        assert_eq!(decoded.worker_tag(), 1);
    }
}
