use crate::domain::currency::CurrencyCode;
use crate::domain::ports::{CryptoPriceSourceBox, ForexSourceBox};
use crate::domain::rates::{RateOrigin, RateTable};
use crate::error::Result;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Produces rate tables from a forex source and a crypto price source.
pub struct RateService {
    forex: ForexSourceBox,
    crypto: CryptoPriceSourceBox,
    origin: RateOrigin,
}

impl RateService {
    /// Creates a new `RateService`.
    ///
    /// # Arguments
    ///
    /// * `forex` - Source of fiat rates relative to USD.
    /// * `crypto` - Source of USD prices for the catalog's cryptocurrencies.
    pub fn new(forex: ForexSourceBox, crypto: CryptoPriceSourceBox) -> Self {
        Self {
            forex,
            crypto,
            origin: RateOrigin::Live,
        }
    }

    /// Tag every table this service merges with `origin` instead of
    /// [`RateOrigin::Live`], e.g. when the sources replay the fallback table.
    pub fn with_origin(mut self, origin: RateOrigin) -> Self {
        self.origin = origin;
        self
    }

    /// Fetches both sources concurrently and merges the answers.
    ///
    /// Nothing is merged unless both requests succeed.
    pub async fn fetch(&self) -> Result<RateTable> {
        let coins: Vec<CurrencyCode> = CurrencyCode::crypto().collect();
        let (forex, prices) = tokio::join!(self.forex.usd_rates(), self.crypto.usd_prices(&coins));
        Ok(RateTable::from_quotes(&forex?, &prices?)?.with_origin(self.origin))
    }

    /// Fetches live rates, substituting the static fallback table on any failure.
    pub async fn refresh(&self) -> RateTable {
        match self.fetch().await {
            Ok(table) => {
                info!(currencies = table.len(), origin = ?table.origin(), "fetched rates");
                table
            }
            Err(err) => {
                warn!(%err, "rate fetch failed, using fallback rates");
                RateTable::fallback()
            }
        }
    }

    /// Runs [`RateService::refresh`] once immediately and then every `period`
    /// on a background task.
    ///
    /// The loop ends when the returned handle is shut down or dropped. A fetch
    /// still in flight at that point is abandoned and its result never published.
    pub fn spawn(self, period: Duration) -> RefreshHandle {
        let period = period.max(Duration::from_millis(1));
        let (publisher, rates) = watch::channel(None);
        let (shutdown, mut stop) = oneshot::channel::<()>();
        let service = self;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = &mut stop => break,
                    _ = ticker.tick() => {}
                }

                let table = tokio::select! {
                    biased;
                    _ = &mut stop => break,
                    table = service.refresh() => table,
                };

                if publisher.send(Some(table)).is_err() {
                    break;
                }
            }
            debug!("rate refresh loop stopped");
        });

        RefreshHandle {
            rates,
            shutdown: Some(shutdown),
            task,
        }
    }
}

/// Owner of a running refresh loop.
pub struct RefreshHandle {
    rates: watch::Receiver<Option<RateTable>>,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    /// A receiver that observes every table the loop publishes.
    pub fn subscribe(&self) -> watch::Receiver<Option<RateTable>> {
        self.rates.clone()
    }

    /// The most recently published table, if any.
    pub fn latest(&self) -> Option<RateTable> {
        self.rates.borrow().clone()
    }

    /// Waits for the next published table. Returns `None` once the loop has stopped.
    pub async fn next(&mut self) -> Option<RateTable> {
        self.rates.changed().await.ok()?;
        self.rates.borrow_and_update().clone()
    }

    /// Stops the loop and waits for its task to finish.
    pub async fn shutdown(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Err(err) = self.task.await {
            warn!(%err, "rate refresh task failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{CryptoPriceSource, ForexSource};
    use crate::error::KonvertError;
    use crate::infrastructure::fixed::FixedRates;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingForex;

    #[async_trait]
    impl ForexSource for FailingForex {
        async fn usd_rates(&self) -> Result<HashMap<String, Decimal>> {
            Err(KonvertError::MalformedResponse("rates missing".to_string()))
        }
    }

    struct StalledCrypto;

    #[async_trait]
    impl CryptoPriceSource for StalledCrypto {
        async fn usd_prices(&self, _: &[CurrencyCode]) -> Result<HashMap<CurrencyCode, Decimal>> {
            std::future::pending().await
        }
    }

    struct CountingForex(Arc<AtomicUsize>);

    #[async_trait]
    impl ForexSource for CountingForex {
        async fn usd_rates(&self) -> Result<HashMap<String, Decimal>> {
            let calls = self.0.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(HashMap::from([(
                "EUR".to_string(),
                Decimal::from(calls as u64),
            )]))
        }
    }

    fn fixed() -> FixedRates {
        FixedRates::new(
            HashMap::from([("EUR".to_string(), dec!(0.5))]),
            HashMap::from([
                (CurrencyCode::Btc, dec!(50000)),
                (CurrencyCode::Eth, dec!(2000)),
                (CurrencyCode::Sol, dec!(100)),
            ]),
        )
    }

    #[tokio::test]
    async fn test_refresh_uses_live_rates() {
        let service = RateService::new(Box::new(fixed()), Box::new(fixed()));
        let table = service.refresh().await;

        assert_eq!(table.origin(), RateOrigin::Live);
        assert_eq!(table.get(CurrencyCode::Eur), Some(dec!(0.5)));
        assert_eq!(table.get(CurrencyCode::Eth), Some(dec!(0.0005)));
    }

    #[tokio::test]
    async fn test_refresh_falls_back_when_a_source_fails() {
        let service = RateService::new(Box::new(FailingForex), Box::new(fixed()));
        assert!(service.fetch().await.is_err());

        let table = service.refresh().await;
        assert_eq!(table.origin(), RateOrigin::Fallback);
        assert_eq!(table.get(CurrencyCode::Eur), Some(dec!(0.92)));
    }

    #[tokio::test]
    async fn test_replayed_fallback_keeps_its_origin() {
        let fallback = RateTable::fallback();
        let replay = FixedRates::from_table(&fallback);
        let service = RateService::new(Box::new(replay.clone()), Box::new(replay))
            .with_origin(RateOrigin::Fallback);

        let mut handle = service.spawn(Duration::from_secs(300));
        let table = handle.next().await.unwrap();
        handle.shutdown().await;

        assert_eq!(table.origin(), RateOrigin::Fallback);
        assert_eq!(table.get(CurrencyCode::Gbp), fallback.get(CurrencyCode::Gbp));
        assert_eq!(table.get(CurrencyCode::Jpy), fallback.get(CurrencyCode::Jpy));
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawn_publishes_periodically() {
        let calls = Arc::new(AtomicUsize::new(0));
        let service = RateService::new(Box::new(CountingForex(calls.clone())), Box::new(fixed()));
        let mut handle = service.spawn(Duration::from_secs(300));

        let first = handle.next().await.unwrap();
        assert_eq!(first.get(CurrencyCode::Eur), Some(dec!(1)));

        let second = handle.next().await.unwrap();
        assert_eq!(second.get(CurrencyCode::Eur), Some(dec!(2)));
        assert_eq!(handle.latest(), Some(second));

        handle.shutdown().await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_shutdown_abandons_inflight_fetch() {
        let service = RateService::new(Box::new(fixed()), Box::new(StalledCrypto));
        let handle = service.spawn(Duration::from_secs(300));
        let mut rates = handle.subscribe();

        tokio::task::yield_now().await;
        handle.shutdown().await;

        assert!(rates.borrow().is_none());
        assert!(rates.changed().await.is_err());
    }
}
