use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use quantlab::data::load_wide_ohlcv;
use quantlab::pipeline::AnalysisPipeline;
use quantlab::pipeline::PipelineConfig;
use quantlab::report;

fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let mut args = std::env::args().skip(1);
  let path = args
    .next()
    .context("usage: quantlab <prices.csv> [market-ticker]")?;
  let market_ticker = args.next();

  let panel = load_wide_ohlcv(&path).with_context(|| format!("loading {path}"))?;
  info!(path = %path, tickers = panel.len(), "panel loaded");

  let config = PipelineConfig {
    market_ticker,
    ..PipelineConfig::default()
  };
  let report = AnalysisPipeline::new(config)
    .run(&panel)
    .context("pipeline run failed")?;

  print!("{}", report::render(&report));
  Ok(())
}
