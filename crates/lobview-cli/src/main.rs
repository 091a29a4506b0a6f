//! `lobview`: inspect a raw market snapshot from disk.
//!
//! ```text
//! lobview --snapshot market.bin ladder --depth 5
//! lobview --snapshot market.bin --slot 250000000 l3 --orders 20
//! lobview --snapshot market.bin quote --side bid --amount 250
//! lobview --snapshot market.bin --config tokens.json stats --json
//! ```
//!
//! Logs go to stderr (`RUST_LOG`, default `info`); results go to stdout.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lobview_analytics::{
    BookStats, L3Book, Ladder, MarketMetadata, SwapRouter, UiL3Book, UiLadder,
};
use lobview_decode::MarketData;
use lobview_types::constants::{ALL_LEVELS, DEFAULT_DISPLAY_PRECISION, DEFAULT_LADDER_DEPTH};
use lobview_types::{AsOf, DecodeConfig, Pubkey, RestingOrder, Side, TraderState};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "lobview", version, about = "Inspect raw order book snapshots")]
struct Cli {
    /// Raw market account bytes.
    #[arg(long, short = 's')]
    snapshot: PathBuf,

    /// JSON decode config (record size, token symbols).
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Drop orders whose last valid slot is before this slot.
    #[arg(long)]
    slot: Option<u64>,

    /// Drop orders whose last valid unix timestamp is before this time.
    #[arg(long, conflicts_with = "now")]
    timestamp: Option<u64>,

    /// Use the current wall clock as the expiry timestamp.
    #[arg(long)]
    now: bool,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Price-aggregated L2 ladder.
    Ladder {
        /// Levels per side; 0 shows every level.
        #[arg(long, default_value_t = DEFAULT_LADDER_DEPTH)]
        depth: usize,
        #[arg(long, default_value_t = DEFAULT_DISPLAY_PRECISION)]
        precision: usize,
        /// Print raw ticks and lots as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Per-order L3 book.
    L3 {
        #[arg(long, default_value_t = 20)]
        orders: usize,
        #[arg(long)]
        json: bool,
    },
    /// Expected fill for a taker swap.
    Quote {
        /// `bid` buys base with quote, `ask` sells base for quote.
        #[arg(long)]
        side: Side,
        /// Whole tokens in (or out with `--exact-out`).
        #[arg(long)]
        amount: f64,
        #[arg(long)]
        exact_out: bool,
        /// Override the market's taker fee.
        #[arg(long)]
        fee_bps: Option<u64>,
    },
    /// Best prices, spread, mid and VWAP.
    Stats {
        #[arg(long, default_value_t = 5)]
        vwap_levels: usize,
        #[arg(long)]
        json: bool,
    },
    /// Balances and open orders of one trader.
    Trader {
        trader: Pubkey,
    },
}

impl Cli {
    fn as_of(&self) -> Result<Option<AsOf>> {
        let slot = self.slot.unwrap_or(0);
        Ok(if self.now {
            Some(AsOf::now(slot).context("system clock is unusable for --now")?)
        } else if self.slot.is_some() || self.timestamp.is_some() {
            Some(AsOf::new(slot, self.timestamp.unwrap_or(0)))
        } else {
            None
        })
    }
}

#[derive(Serialize)]
struct TraderReport {
    trader: Pubkey,
    trader_index: u64,
    state: TraderState,
    orders: Vec<TraderOrder>,
}

#[derive(Serialize)]
struct TraderOrder {
    side: Side,
    price: f64,
    size: f64,
    order_sequence_number: u64,
    order: RestingOrder,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);
    let stdout = std::io::stdout();
    run(&cli, &mut stdout.lock())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_market(cli: &Cli) -> Result<MarketData> {
    let config = match &cli.config {
        Some(path) => DecodeConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => DecodeConfig::default(),
    };
    let bytes = std::fs::read(&cli.snapshot)
        .with_context(|| format!("failed to read snapshot {}", cli.snapshot.display()))?;
    let market = MarketData::from_bytes(&bytes, &config)
        .with_context(|| format!("failed to decode {}", cli.snapshot.display()))?;
    info!(
        market = %market.labels.symbol(),
        status = %market.header.status,
        bytes = bytes.len(),
        orders = market.order_count(),
        traders = market.num_traders(),
        "decoded snapshot"
    );
    Ok(market)
}

fn run(cli: &Cli, out: &mut impl Write) -> Result<()> {
    let market = load_market(cli)?;
    let meta = MarketMetadata::from_header(&market.header)?;
    let as_of = cli.as_of()?;

    match &cli.command {
        Command::Ladder {
            depth,
            precision,
            json,
        } => {
            let depth = if *depth == 0 { ALL_LEVELS } else { *depth };
            let ladder = Ladder::from_market(&market, depth, as_of.as_ref());
            if *json {
                serde_json::to_writer_pretty(&mut *out, &ladder)?;
                writeln!(out)?;
            } else {
                writeln!(
                    out,
                    "{}  status={}  taker_fee={}bps",
                    market.labels.symbol(),
                    market.header.status,
                    market.taker_fee_bps
                )?;
                let ui = UiLadder::from_ladder(&ladder, &meta);
                write!(out, "{ui:.precision$}", precision = *precision)?;
            }
        }
        Command::L3 { orders, json } => {
            let book = L3Book::from_market(&market, *orders, as_of.as_ref())?;
            let ui = UiL3Book::from_l3(&book, &meta);
            if *json {
                serde_json::to_writer_pretty(&mut *out, &ui)?;
                writeln!(out)?;
            } else {
                for order in ui.asks.iter().rev().chain(&ui.bids) {
                    let expiry = match (order.last_valid_slot, order.last_valid_unix_timestamp_in_seconds) {
                        (None, None) => "-".to_string(),
                        (slot, ts) => format!(
                            "slot<={} ts<={}",
                            slot.map_or_else(|| "*".into(), |s| s.to_string()),
                            ts.map_or_else(|| "*".into(), |t| t.to_string())
                        ),
                    };
                    writeln!(
                        out,
                        "{} {:>12.4} {:>12.4} {} #{} {}",
                        order.side, order.price, order.size, order.maker, order.order_sequence_number, expiry
                    )?;
                }
            }
        }
        Command::Quote {
            side,
            amount,
            exact_out,
            fee_bps,
        } => {
            let ladder = Ladder::from_market(&market, ALL_LEVELS, as_of.as_ref());
            let ui = UiLadder::from_ladder(&ladder, &meta);
            let router = SwapRouter::new(&ui, fee_bps.unwrap_or(market.taker_fee_bps))?;
            let quote = if *exact_out {
                router.quote_exact_out(*side, *amount)
            } else {
                router.quote_exact_in(*side, *amount)
            };
            let (token_in, token_out) = match side {
                Side::Bid => (&market.labels.quote, &market.labels.base),
                Side::Ask => (&market.labels.base, &market.labels.quote),
            };
            writeln!(
                out,
                "{} {} -> {} {} (taker fee {} bps)",
                quote.amount_in, token_in, quote.amount_out, token_out, quote.taker_fee_bps
            )?;
        }
        Command::Stats { vwap_levels, json } => {
            let ladder = Ladder::from_market(&market, ALL_LEVELS, as_of.as_ref());
            let stats = BookStats::from_ladder(&ladder, &meta, *vwap_levels);
            if *json {
                serde_json::to_writer_pretty(&mut *out, &stats)?;
                writeln!(out)?;
            } else {
                let show = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{v:.6}"));
                writeln!(out, "best_bid  {}", show(stats.best_bid))?;
                writeln!(out, "best_ask  {}", show(stats.best_ask))?;
                writeln!(
                    out,
                    "spread    {}",
                    stats.spread_in_ticks.map_or_else(|| "-".to_string(), |s| format!("{s} ticks"))
                )?;
                writeln!(out, "mid       {}", show(stats.mid_price))?;
                writeln!(out, "vwap      {}", show(stats.vwap))?;
            }
        }
        Command::Trader { trader } => {
            let report = TraderReport {
                trader: *trader,
                trader_index: market.trader_index(trader)?,
                state: *market.trader_state(trader)?,
                orders: market
                    .orders_for_trader(trader)?
                    .into_iter()
                    .map(|(side, id, order)| TraderOrder {
                        side,
                        price: meta.ticks_to_float_price(id.price_in_ticks),
                        size: meta.base_lots_to_raw_base_units_as_float(order.num_base_lots),
                        order_sequence_number: id.normalized_sequence_number(),
                        order,
                    })
                    .collect(),
            };
            serde_json::to_writer_pretty(&mut *out, &report)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use lobview_types::fixtures::SnapshotBuilder;

    use super::*;

    struct Snapshot {
        path: PathBuf,
        maker: Pubkey,
    }

    impl Drop for Snapshot {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.path);
        }
    }

    fn write_snapshot(name: &str) -> Snapshot {
        let mut builder = SnapshotBuilder::new(8, 8, 4);
        builder.taker_fee_bps = 5;
        let maker = Pubkey::new_unique();
        let index = builder.add_trader(maker, TraderState::default());
        builder.add_order(Side::Ask, 25_000, RestingOrder::new(index, 10_000));
        builder.add_order(Side::Ask, 30_000, RestingOrder::new(index, 5_000));
        builder.add_order(Side::Bid, 24_000, RestingOrder::new(index, 4_000).with_expiry(10, 0));
        let path = std::env::temp_dir().join(format!("lobview-{}-{name}.bin", std::process::id()));
        std::fs::write(&path, builder.build()).unwrap();
        Snapshot { path, maker }
    }

    fn run_args(args: &[&str]) -> Result<String> {
        let cli = Cli::try_parse_from(args)?;
        let mut out = Vec::new();
        run(&cli, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn ladder_renders_both_sides() {
        let snap = write_snapshot("ladder");
        let path = snap.path.to_str().unwrap();
        let out = run_args(&["lobview", "-s", path, "ladder", "--precision", "2"]).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].contains("status=ACTIVE"));
        assert!(lines[0].contains("taker_fee=5bps"));
        assert!(lines[1].contains("30.00"));
        assert!(lines[2].contains("25.00"));
        assert!(lines[3].contains("24.00"));
    }

    #[test]
    fn slot_cursor_filters_expired_bids() {
        let snap = write_snapshot("expiry");
        let path = snap.path.to_str().unwrap();
        let out = run_args(&["lobview", "-s", path, "--slot", "11", "ladder", "--json"]).unwrap();
        let ladder: Ladder = serde_json::from_str(&out).unwrap();
        assert!(ladder.bids.is_empty());
        assert_eq!(ladder.asks.len(), 2);
    }

    #[test]
    fn quote_reports_fee_adjusted_output() {
        let snap = write_snapshot("quote");
        let path = snap.path.to_str().unwrap();
        let out = run_args(&[
            "lobview", "-s", path, "quote", "--side", "bid", "--amount", "250", "--fee-bps", "0",
        ])
        .unwrap();
        assert!(out.starts_with("250 "), "{out}");
        assert!(out.contains("-> 10 "), "{out}");
    }

    #[test]
    fn trader_report_lists_orders() {
        let snap = write_snapshot("trader");
        let path = snap.path.to_str().unwrap();
        let maker = snap.maker.to_string();
        let out = run_args(&["lobview", "-s", path, "trader", &maker]).unwrap();
        let report: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(report["trader_index"], 1);
        assert_eq!(report["orders"].as_array().unwrap().len(), 3);

        let stranger = Pubkey::new_unique().to_string();
        let err = run_args(&["lobview", "-s", path, "trader", &stranger]).unwrap_err();
        assert!(err.to_string().starts_with("LV_ERR_301"), "{err}");
    }

    #[test]
    fn l3_and_stats_run() {
        let snap = write_snapshot("l3");
        let path = snap.path.to_str().unwrap();
        let out = run_args(&["lobview", "-s", path, "l3"]).unwrap();
        assert_eq!(out.lines().count(), 3);
        assert!(out.contains("slot<=10"));

        let out = run_args(&["lobview", "-s", path, "stats", "--json"]).unwrap();
        let stats: BookStats = serde_json::from_str(&out).unwrap();
        assert_eq!(stats.spread_in_ticks, Some(1_000));
    }

    #[test]
    fn missing_snapshot_has_context() {
        let err = run_args(&["lobview", "-s", "/nonexistent/lobview.bin", "stats"]).unwrap_err();
        assert!(err.to_string().contains("failed to read snapshot"));
    }

    #[test]
    fn timestamp_conflicts_with_now() {
        assert!(Cli::try_parse_from(["lobview", "-s", "x", "--now", "--timestamp", "5", "stats"]).is_err());
        let cli = Cli::try_parse_from(["lobview", "-s", "x", "--slot", "9", "stats"]).unwrap();
        assert_eq!(cli.as_of().unwrap(), Some(AsOf::at_slot(9)));
    }
}
