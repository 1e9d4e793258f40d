use std::io;

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use clap::Parser;

use core_types::{Increments, Money, TimestampMs};
use engine::config::EngineConfig;
use engine::machine::SignalStateMachine;
use engine::replay::{merge_timeline, read_candles_file, replay};
use engine::sink::{JsonLinesSink, LogSink};
use policy::instrument::{AssetClass, Instrument};

/// Прогон сигнального движка по историческим свечам двух ТФ
#[derive(Parser, Debug)]
struct Args {
    #[arg(long)]
    symbol: String,
    /// CSV старшего ТФ: ts,open,high,low,close,volume
    #[arg(long)]
    coarse: String,
    /// CSV младшего ТФ
    #[arg(long)]
    fine: String,
    /// JSON с переопределениями конфигурации
    #[arg(long)]
    config: Option<String>,
    #[arg(long, value_enum, default_value = "fx-major")]
    asset_class: AssetArg,
    #[arg(long, default_value_t = 100_000.0)]
    balance: f64,
    /// Фиксированный ATR в шагах цены; иначе считается по старшему ТФ
    #[arg(long)]
    atr_increments: Option<f64>,
    /// Сигналы только в лог, без JSON на stdout
    #[arg(long, default_value_t = false)]
    log_only: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum AssetArg {
    FxMajor,
    FxYen,
    Metal,
    Index,
    Crypto,
}

impl From<AssetArg> for AssetClass {
    fn from(a: AssetArg) -> Self {
        match a {
            AssetArg::FxMajor => AssetClass::FxMajor,
            AssetArg::FxYen => AssetClass::FxYen,
            AssetArg::Metal => AssetClass::Metal,
            AssetArg::Index => AssetClass::Index,
            AssetArg::Crypto => AssetClass::Crypto,
        }
    }
}

fn fmt_ts(ts: Option<TimestampMs>) -> String {
    ts.and_then(|t| Utc.timestamp_millis_opt(t.0).single())
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| "-".into())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "engine=info,signal_engine=info".into()),
        )
        .init();

    let args = Args::parse();
    if args.balance <= 0.0 {
        anyhow::bail!("balance must be > 0");
    }

    let config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path).context("load config failed")?,
        None => EngineConfig::default(),
    };
    let instrument = Instrument::preset(&args.symbol, args.asset_class.into());

    let coarse = read_candles_file(&args.coarse)
        .with_context(|| format!("read coarse candles from {}", args.coarse))?;
    let fine = read_candles_file(&args.fine)
        .with_context(|| format!("read fine candles from {}", args.fine))?;
    let timeline = merge_timeline(coarse, fine);

    let mut machine = SignalStateMachine::new(&args.symbol, config, instrument)
        .context("engine init failed")?;
    let balance = Money(args.balance);
    let atr = args.atr_increments.map(Increments);

    let result = if args.log_only {
        replay(&mut machine, timeline, balance, atr, &mut LogSink)
    } else {
        let mut out = JsonLinesSink::new(io::stdout().lock());
        replay(&mut machine, timeline, balance, atr, &mut out)
    };
    let summary = result.context("replay failed")?;

    eprintln!("Signal replay finished");
    eprintln!(
        "symbol={} candles={} from={} to={}",
        machine.symbol(),
        summary.candles,
        fmt_ts(summary.first_ts),
        fmt_ts(summary.last_ts)
    );
    eprintln!(
        "signals={} rejections={} final_phase={:?}",
        summary.signals, summary.rejections, summary.final_phase
    );

    Ok(())
}
