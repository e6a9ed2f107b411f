//! CLI definition and dispatch.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_journal_adapter::CsvJournalAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::domain::analysis::{AnalysisConfig, AnalysisSummary, analyze};
use crate::domain::backtest::{BacktestConfig, BacktestResult, compare_strategies, run_backtest};
use crate::domain::config_validation::{parse_threshold_list, validate_config};
use crate::domain::confluence::{Confluence, TimeframeView, analyze_confluence};
use crate::domain::error::TrendscopeError;
use crate::domain::levels::{Level, LevelConfig};
use crate::domain::metrics::BacktestMetrics;
use crate::domain::ohlcv::{Bar, Timeframe};
use crate::domain::optimizer::{OptimizationRow, optimize_rsi};
use crate::domain::pattern::PatternConfig;
use crate::domain::risk::{RiskAdvice, RiskConfig};
use crate::domain::strategy::StrategyKind;
use crate::domain::trend::TrendConfig;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::journal_port::{JournalEntry, JournalPort};
use crate::ports::report_port::ReportPort;

pub const DEFAULT_JOURNAL: &str = "trade_journal.csv";
pub const DEFAULT_OVERSOLD: &str = "25,30,35";
pub const DEFAULT_OVERBOUGHT: &str = "65,70,75";

#[derive(Parser, Debug)]
#[command(
    name = "trendscope",
    about = "Price-structure analysis and strategy backtesting"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Arguments shared by every command that loads one series.
#[derive(Args, Debug, Clone)]
pub struct SeriesArgs {
    #[arg(short, long)]
    pub config: PathBuf,
    #[arg(short, long)]
    pub instrument: String,
    #[arg(short, long)]
    pub timeframe: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Trend, levels, patterns, indicators and a risk suggestion
    Analyze {
        #[command(flatten)]
        series: SeriesArgs,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Log the suggested trade to the journal as pending
        #[arg(long)]
        journal: bool,
    },
    /// Backtest one strategy
    Backtest {
        #[command(flatten)]
        series: SeriesArgs,
        #[arg(short, long)]
        strategy: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        journal: bool,
    },
    /// Backtest every strategy on the same series
    Compare {
        #[command(flatten)]
        series: SeriesArgs,
    },
    /// Grid-search RSI oversold/overbought thresholds
    Optimize {
        #[command(flatten)]
        series: SeriesArgs,
        #[arg(long)]
        oversold: Option<String>,
        #[arg(long)]
        overbought: Option<String>,
    },
    /// Compare the trend on two timeframes
    Confluence {
        #[command(flatten)]
        series: SeriesArgs,
        #[arg(long)]
        secondary: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List instruments with data for a timeframe
    ListInstruments {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        timeframe: String,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Analyze {
            series,
            output,
            journal,
        } => run_analyze(&series, output.as_deref(), journal),
        Command::Backtest {
            series,
            strategy,
            output,
            journal,
        } => run_backtest_command(&series, strategy.as_deref(), output.as_deref(), journal),
        Command::Compare { series } => run_compare(&series),
        Command::Optimize {
            series,
            oversold,
            overbought,
        } => run_optimize(&series, oversold.as_deref(), overbought.as_deref()),
        Command::Confluence {
            series,
            secondary,
            output,
        } => run_confluence(&series, &secondary, output.as_deref()),
        Command::ListInstruments { config, timeframe } => {
            run_list_instruments(&config, &timeframe)
        }
        Command::Validate { config } => run_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::from(&e)
        }
    }
}

/// Load and validate an INI file.
pub fn load_config(path: &Path) -> Result<FileConfigAdapter, TrendscopeError> {
    log::info!("Loading config from {}", path.display());
    let adapter = FileConfigAdapter::from_file(path)?;
    validate_config(&adapter)?;
    Ok(adapter)
}

fn usize_or(config: &dyn ConfigPort, section: &str, key: &str, default: usize) -> usize {
    usize::try_from(config.get_int(section, key, default as i64)).unwrap_or(default)
}

pub fn build_analysis_config(config: &dyn ConfigPort) -> AnalysisConfig {
    let levels = LevelConfig::default();
    let trend = TrendConfig::default();
    let patterns = PatternConfig::default();
    let risk = RiskConfig::default();

    AnalysisConfig {
        levels: LevelConfig {
            distance: usize_or(config, "levels", "distance", levels.distance),
            granularity: config.get_double("levels", "granularity", levels.granularity),
        },
        trend: TrendConfig {
            short_window: usize_or(config, "trend", "short_window", trend.short_window),
            long_window: usize_or(config, "trend", "long_window", trend.long_window),
        },
        patterns: PatternConfig {
            threshold: config.get_double("patterns", "threshold", patterns.threshold),
            min_distance: usize_or(config, "patterns", "min_distance", patterns.min_distance),
        },
        risk: RiskConfig {
            capital: config.get_double("risk", "capital", risk.capital),
            risk_percent: config.get_double("risk", "risk_percent", risk.risk_percent),
            rr_threshold: config.get_double("risk", "rr_threshold", risk.rr_threshold),
            slippage: config.get_double("risk", "slippage", risk.slippage),
            atr_period: risk.atr_period,
        },
    }
}

/// `strategy_override` (from `--strategy`) wins over `[backtest] strategy`.
pub fn build_backtest_config(
    config: &dyn ConfigPort,
    strategy_override: Option<&str>,
) -> Result<BacktestConfig, TrendscopeError> {
    let defaults = BacktestConfig::default();
    let strategy = match strategy_override
        .map(str::to_string)
        .or_else(|| config.get_string("backtest", "strategy"))
    {
        Some(name) => name.parse::<StrategyKind>()?,
        None => defaults.strategy,
    };

    Ok(BacktestConfig {
        capital: config.get_double("backtest", "capital", defaults.capital),
        strategy,
    })
}

/// Command-line lists win over `[optimizer]`, which wins over the defaults.
pub fn build_optimizer_lists(
    config: &dyn ConfigPort,
    oversold: Option<&str>,
    overbought: Option<&str>,
) -> Result<(Vec<u32>, Vec<u32>), TrendscopeError> {
    let resolve = |key: &str, cli: Option<&str>, default: &str| {
        let raw = cli
            .map(str::to_string)
            .or_else(|| config.get_string("optimizer", key))
            .unwrap_or_else(|| default.to_string());
        parse_threshold_list(&raw).map_err(|reason| TrendscopeError::ConfigInvalid {
            section: "optimizer".to_string(),
            key: key.to_string(),
            reason,
        })
    };
    Ok((
        resolve("oversold", oversold, DEFAULT_OVERSOLD)?,
        resolve("overbought", overbought, DEFAULT_OVERBOUGHT)?,
    ))
}

pub fn data_adapter(config: &dyn ConfigPort) -> Result<CsvAdapter, TrendscopeError> {
    let directory =
        config
            .get_string("data", "directory")
            .ok_or_else(|| TrendscopeError::ConfigMissing {
                section: "data".to_string(),
                key: "directory".to_string(),
            })?;
    Ok(CsvAdapter::new(PathBuf::from(directory)))
}

pub fn journal_adapter(config: &dyn ConfigPort) -> CsvJournalAdapter {
    let path = config
        .get_string("data", "journal")
        .unwrap_or_else(|| DEFAULT_JOURNAL.to_string());
    CsvJournalAdapter::new(PathBuf::from(path))
}

fn load_series(
    data: &dyn DataPort,
    instrument: &str,
    timeframe: Timeframe,
) -> Result<Vec<Bar>, TrendscopeError> {
    let bars = data.fetch_bars(instrument, timeframe)?;
    log::info!("Loaded {} bars for {} {}", bars.len(), instrument, timeframe);
    Ok(bars)
}

fn open_series(
    args: &SeriesArgs,
) -> Result<(FileConfigAdapter, Timeframe, Vec<Bar>), TrendscopeError> {
    let config = load_config(&args.config)?;
    let timeframe: Timeframe = args.timeframe.parse()?;
    let data = data_adapter(&config)?;
    let bars = load_series(&data, &args.instrument, timeframe)?;
    Ok((config, timeframe, bars))
}

fn output_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn run_analyze(
    args: &SeriesArgs,
    output: Option<&Path>,
    journal: bool,
) -> Result<(), TrendscopeError> {
    let (config, timeframe, bars) = open_series(args)?;
    let summary = analyze(
        &args.instrument,
        timeframe,
        &bars,
        &build_analysis_config(&config),
    );
    print_analysis(&summary);

    if let Some(path) = output {
        JsonReportAdapter::new().write_analysis(&summary, &output_str(path))?;
    }

    if journal {
        match (summary.risk.suggestion(), summary.last_timestamp) {
            (Some(suggestion), Some(date)) => {
                let entry = JournalEntry::from_suggestion(suggestion, date);
                journal_adapter(&config).append(&[entry])?;
                log::info!("Logged pending trade to journal");
            }
            _ => log::info!("No trade suggested; journal unchanged"),
        }
    }
    Ok(())
}

fn run_backtest_command(
    args: &SeriesArgs,
    strategy: Option<&str>,
    output: Option<&Path>,
    journal: bool,
) -> Result<(), TrendscopeError> {
    let (config, _, bars) = open_series(args)?;
    let bt_config = build_backtest_config(&config, strategy)?;
    log::info!("Running {} on {}", bt_config.strategy, args.instrument);

    let result = run_backtest(&bars, &bt_config);
    let metrics = result.metrics(bt_config.capital);
    print_backtest(&result, &metrics);

    if let Some(path) = output {
        JsonReportAdapter::new().write_backtest(&result, &metrics, &output_str(path))?;
    }

    if journal && !result.trades.is_empty() {
        journal_adapter(&config).append(&JournalEntry::from_backtest(&result))?;
        log::info!("Logged {} trades to journal", result.trades.len());
    }
    Ok(())
}

fn run_compare(args: &SeriesArgs) -> Result<(), TrendscopeError> {
    let (_, _, bars) = open_series(args)?;
    let rows = compare_strategies(&bars);

    println!(
        "{:<18} {:>7} {:>5} {:>7} {:>9} {:>12}",
        "Strategy", "Trades", "Wins", "Losses", "Winrate", "Profit"
    );
    for row in &rows {
        println!(
            "{:<18} {:>7} {:>5} {:>7} {:>8.2}% {:>12.5}",
            row.strategy.name(),
            row.total,
            row.wins,
            row.losses,
            row.winrate,
            row.cumulative_profit
        );
    }
    Ok(())
}

fn run_optimize(
    args: &SeriesArgs,
    oversold: Option<&str>,
    overbought: Option<&str>,
) -> Result<(), TrendscopeError> {
    let (config, _, bars) = open_series(args)?;
    let (oversold, overbought) = build_optimizer_lists(&config, oversold, overbought)?;
    let rows = optimize_rsi(&bars, &oversold, &overbought);
    print_optimization(&rows);
    Ok(())
}

fn run_confluence(
    args: &SeriesArgs,
    secondary: &str,
    output: Option<&Path>,
) -> Result<(), TrendscopeError> {
    let (config, primary_tf, primary_bars) = open_series(args)?;
    let secondary_tf: Timeframe = secondary.parse()?;
    let data = data_adapter(&config)?;
    let secondary_bars = load_series(&data, &args.instrument, secondary_tf)?;

    let confluence = analyze_confluence(
        (primary_tf, &primary_bars),
        (secondary_tf, &secondary_bars),
        &build_analysis_config(&config),
    );
    print_confluence(&args.instrument, &confluence);

    if let Some(path) = output {
        JsonReportAdapter::new().write_confluence(&confluence, &output_str(path))?;
    }
    Ok(())
}

fn run_list_instruments(config_path: &Path, timeframe: &str) -> Result<(), TrendscopeError> {
    let config = load_config(config_path)?;
    let timeframe: Timeframe = timeframe.parse()?;
    let instruments = data_adapter(&config)?.list_instruments(timeframe)?;

    if instruments.is_empty() {
        log::info!("No instruments found for {}", timeframe);
    }
    for instrument in instruments {
        println!("{}", instrument);
    }
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), TrendscopeError> {
    let config = load_config(config_path)?;
    let bt_config = build_backtest_config(&config, None)?;
    let analysis = build_analysis_config(&config);
    let (oversold, overbought) = build_optimizer_lists(&config, None, None)?;

    println!("Configuration OK: {}", config_path.display());
    println!(
        "  trend windows: {}/{}",
        analysis.trend.short_window, analysis.trend.long_window
    );
    println!(
        "  risk: {}% of {} (min RR {})",
        analysis.risk.risk_percent, analysis.risk.capital, analysis.risk.rr_threshold
    );
    println!(
        "  backtest: {} with capital {}",
        bt_config.strategy, bt_config.capital
    );
    println!("  optimizer: oversold {:?}, overbought {:?}", oversold, overbought);
    Ok(())
}

fn format_levels(levels: &[Level]) -> String {
    if levels.is_empty() {
        return "none".to_string();
    }
    levels
        .iter()
        .map(|l| format!("{} ({:?}, {} touches)", l.price, l.strength, l.touches))
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_risk(risk: &RiskAdvice) {
    match risk {
        RiskAdvice::Trade(s) => {
            println!(
                "Trade: {} @ {} SL {} TP {:?} RR {}",
                s.direction, s.entry, s.stop_loss, s.take_profits, s.risk_reward
            );
            println!(
                "  size {} units, risking {} (ATR {} via {:?})",
                s.position_size, s.risk_capital, s.atr, s.atr_source
            );
            println!("  score {} ({:?}): {}", s.score.value, s.score.level, s.score.reasons.join("; "));
            if let Some(warning) = &s.rr_warning {
                println!("  warning: {}", warning);
            }
        }
        RiskAdvice::NoTrade { note, .. } => println!("No trade: {}", note),
    }
}

fn print_analysis(summary: &AnalysisSummary) {
    println!(
        "{} {} ({} bars, last close {})",
        summary.instrument,
        summary.timeframe,
        summary.bars,
        summary
            .last_close
            .map_or_else(|| "n/a".to_string(), |c| c.to_string())
    );
    println!(
        "Trend: {} (confidence {:.2})",
        summary.trend.direction, summary.trend.confidence
    );
    for reason in &summary.trend.justification {
        println!("  - {}", reason);
    }
    println!("Support: {}", format_levels(&summary.support));
    println!("Resistance: {}", format_levels(&summary.resistance));
    for p in &summary.patterns {
        println!(
            "Pattern: {} ({:?}) neckline {} target {}",
            p.kind, p.status, p.neckline, p.target
        );
    }
    let ind = &summary.indicators;
    println!(
        "Indicators: RSI {:?} ({:?}), MACD {:?}, {:?}, {:?}, bias {:?}",
        ind.rsi, ind.rsi_status, ind.macd_status, ind.price_relation, ind.crossover, ind.bias
    );
    print_risk(&summary.risk);
}

fn print_backtest(result: &BacktestResult, metrics: &BacktestMetrics) {
    println!("Strategy: {}", result.strategy);
    println!(
        "Trades: {} (wins {}, losses {}, open {})",
        result.total, result.wins, result.losses, result.open
    );
    println!("Winrate: {:.2}%", result.winrate);
    println!("Cumulative profit: {:.5}", metrics.cumulative_profit);
    println!("Final equity: {:.2}", metrics.final_equity);
    println!("Sharpe ratio: {:.2}", metrics.sharpe_ratio);
    println!("Max drawdown: {:.2}%", metrics.max_drawdown * 100.0);
    println!("Profit factor: {:.2}", metrics.profit_factor);
    println!("Longest loss streak: {}", metrics.longest_loss_streak);
}

fn print_optimization(rows: &[OptimizationRow]) {
    println!(
        "{:>9} {:>11} {:>7} {:>5} {:>7} {:>9} {:>12}",
        "Oversold", "Overbought", "Trades", "Wins", "Losses", "Winrate", "Profit"
    );
    for row in rows {
        println!(
            "{:>9} {:>11} {:>7} {:>5} {:>7} {:>8.2}% {:>12.5}",
            row.oversold,
            row.overbought,
            row.trades,
            row.wins,
            row.losses,
            row.winrate,
            row.total_profit
        );
    }
}

fn print_view(view: &TimeframeView) {
    println!(
        "{}: {} (confidence {:.2})",
        view.timeframe, view.trend.direction, view.trend.confidence
    );
    println!(
        "  nearest support {:?}, nearest resistance {:?}",
        view.levels.nearest_support().map(|l| l.price),
        view.levels.nearest_resistance().map(|l| l.price)
    );
    print!("  ");
    print_risk(&view.risk);
}

fn print_confluence(instrument: &str, confluence: &Confluence) {
    println!("{} confluence", instrument);
    print_view(&confluence.primary);
    print_view(&confluence.secondary);
    println!("Verdict: {:?}", confluence.verdict);
}
