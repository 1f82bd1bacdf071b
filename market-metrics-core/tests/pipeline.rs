use chrono::{Local, NaiveDate};
use market_metrics_core::exchanges::{ExchangeSimulator, SimulatorConfig};
use market_metrics_core::io::default_symbols;
use market_metrics_core::{
    CsvExporter, MetricsCollector, MetricsResult, Side, Symbol, Trade, TradeId, TradeIdGenerator,
    TradePublisher, TradeSubscriber,
};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct IdRecorder {
    ids: Mutex<Vec<TradeId>>,
}

impl TradeSubscriber for IdRecorder {
    fn on_trade(&self, trade: &Trade) -> MetricsResult<()> {
        self.ids.lock().push(trade.id());
        Ok(())
    }

    fn name(&self) -> &str {
        "id-recorder"
    }
}

fn wire() -> (Arc<TradePublisher>, Arc<MetricsCollector>, Arc<IdRecorder>) {
    let publisher = Arc::new(TradePublisher::new());
    let collector = Arc::new(MetricsCollector::default());
    let recorder = Arc::new(IdRecorder::default());
    publisher.subscribe(collector.clone());
    publisher.subscribe(recorder.clone());
    (publisher, collector, recorder)
}

#[test]
fn test_concurrent_producers_lose_nothing() {
    const PRODUCERS: usize = 6;
    const TRADES_EACH: usize = 2_000;

    let (publisher, collector, recorder) = wire();
    let ids = Arc::new(TradeIdGenerator::new());
    let symbols: Arc<[Symbol]> = default_symbols().into();

    let handles: Vec<_> = (0..PRODUCERS)
        .map(|n| {
            let simulator = ExchangeSimulator::new(
                format!("EX{}", n),
                publisher.clone(),
                symbols.clone(),
                ids.clone(),
                SimulatorConfig::default(),
            )
            .unwrap();
            std::thread::spawn(move || {
                let mut rng = StdRng::seed_from_u64(n as u64);
                for _ in 0..TRADES_EACH {
                    let report = simulator.publish_next(&mut rng).unwrap();
                    assert!(report.is_clean());
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let expected = (PRODUCERS * TRADES_EACH) as u64;
    assert_eq!(collector.total_trades(), expected);
    assert_eq!(collector.get_and_reset_trades_per_second(), expected);

    let snapshot = collector.snapshot_symbol_stats();
    let summed: u64 = snapshot.values().map(|s| s.trade_count).sum();
    assert_eq!(summed, expected);
    for stats in snapshot.values() {
        assert_eq!(stats.buy_count + stats.sell_count, stats.trade_count);
        assert!(stats.min_price >= 50.0 && stats.max_price < 150.0);
    }

    let recorded = recorder.ids.lock();
    let unique: HashSet<u64> = recorded.iter().map(|id| id.value()).collect();
    assert_eq!(recorded.len() as u64, expected);
    assert_eq!(unique.len() as u64, expected);
    assert_eq!(unique.iter().max().copied(), Some(expected));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_producers_stop_within_one_interval() {
    let (publisher, collector, recorder) = wire();
    let ids = Arc::new(TradeIdGenerator::new());
    let symbols: Arc<[Symbol]> = default_symbols().into();
    let token = CancellationToken::new();

    let config = SimulatorConfig {
        min_delay: Duration::from_millis(200),
        max_delay: Duration::from_millis(1000),
        ..Default::default()
    };

    let handles: Vec<_> = ["NYSE", "NASDAQ", "LSE"]
        .into_iter()
        .map(|exchange| {
            let simulator =
                ExchangeSimulator::new(exchange, publisher.clone(), symbols.clone(), ids.clone(), config.clone())
                    .unwrap();
            tokio::spawn(simulator.run(token.clone()))
        })
        .collect();

    tokio::time::sleep(Duration::from_millis(1_500)).await;
    let cancelled_at = Instant::now();
    token.cancel();

    let mut published = 0;
    for handle in handles {
        published += handle.await.unwrap();
    }

    assert!(cancelled_at.elapsed() < Duration::from_millis(1000));
    assert!(published > 0);
    assert_eq!(collector.total_trades(), published);
    assert_eq!(recorder.ids.lock().len() as u64, published);
}

#[test]
fn test_export_row_format() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report/metrics.csv");
    let collector = MetricsCollector::default();

    for (id, price, quantity, side) in [(1, 100.0, 8, Side::Buy), (2, 110.0, 12, Side::Sell)] {
        let trade = Trade::new(TradeId(id), "NYSE", Symbol::new("AAPL"), price, quantity, side, Local::now()).unwrap();
        collector.record_trade(&trade);
    }

    let exporter = CsvExporter::create(&path).unwrap();
    let stamp = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap().and_hms_milli_opt(15, 4, 5, 6).unwrap();
    exporter.export(&collector.snapshot_symbol_stats(), stamp).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(
        lines,
        vec![
            "Timestamp,Symbol,Trades,AvgQty,AvgPrice,TotValue,MinPrice,MaxPrice,Buy/Sell,ChangePercent",
            "2025-01-02T15:04:05.006,AAPL,2,10.00,105.00,2120.00,100.00,110.00,1.00,10.00",
        ]
    );
}

#[test]
fn test_unsubscribed_collector_stops_counting() {
    let publisher = TradePublisher::new();
    let collector = Arc::new(MetricsCollector::default());
    let id = publisher.subscribe(collector.clone());

    let trade = Trade::new(TradeId(1), "NYSE", Symbol::new("TSLA"), 75.0, 3, Side::Buy, Local::now()).unwrap();
    publisher.publish_trade(&trade);
    publisher.unsubscribe(id);
    let report = publisher.publish_trade(&trade);

    assert_eq!(report.delivered, 0);
    assert_eq!(collector.total_trades(), 1);
}
