use clap::{Parser, Subcommand};
use comfy_table::Table;
use core_types::{OrderRequest, OrderSide};
use engine::{PaperTradingEngine, PortfolioSummary};
use market_data::{QuoteSource, StaticQuoteSource};
use rebalancer::{PlanExecutionResult, PlanExecutor, RebalancingPlan};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// The main entry point for the Meridian paper trading application.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    tracing::info!("Meridian paper trading engine starting");
    match cli.command {
        Commands::Demo(args) => handle_demo(args).await,
        Commands::ExecutePlan(args) => handle_execute_plan(args).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// A simulated brokerage order-execution engine for portfolio rebalancing.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scripted trading session against deterministic quotes.
    Demo(DemoArgs),
    /// Execute a rebalancing plan file against a fresh portfolio.
    ExecutePlan(ExecutePlanArgs),
}

#[derive(Parser)]
struct DemoArgs {
    /// Starting cash for the demo portfolio.
    #[arg(long, default_value = "100000")]
    cash: Decimal,

    /// Print raw JSON instead of tables.
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct ExecutePlanArgs {
    /// Path to the rebalancing plan JSON file.
    #[arg(long)]
    plan: PathBuf,

    /// Starting cash for the portfolio the plan executes against.
    #[arg(long, default_value = "100000")]
    cash: Decimal,

    /// Print raw JSON instead of tables.
    #[arg(long)]
    json: bool,
}

// ==============================================================================
// Demo Command Logic
// ==============================================================================

/// Walks the engine through a representative session: a market buy, a limit
/// order queued below the market, a favorable price move, and the tick that
/// fills the queued order.
async fn handle_demo(args: DemoArgs) -> anyhow::Result<()> {
    let config = configuration::load_config()?;
    let quotes = Arc::new(StaticQuoteSource::new(config.simulation.spread_pct));
    quotes.set_price("AAPL", dec!(150.25)).await;
    quotes.set_price("MSFT", dec!(321.80)).await;

    let engine = Arc::new(PaperTradingEngine::new(
        config,
        quotes.clone() as Arc<dyn QuoteSource>,
    ));
    let portfolio = engine.create_portfolio("Demo Portfolio", args.cash).await?;

    let buy = engine
        .place_order(
            portfolio.id,
            OrderRequest::market("AAPL", OrderSide::Buy, dec!(100)),
        )
        .await?;
    println!(
        "Market buy 100 AAPL -> {} at {}",
        buy.status,
        buy.filled_price.map(|p| p.round_dp(4).to_string()).unwrap_or_else(|| "-".into())
    );

    let limit = engine
        .place_order(
            portfolio.id,
            OrderRequest::limit("MSFT", OrderSide::Buy, dec!(20), dec!(318.00)),
        )
        .await?;
    println!("Limit buy 20 MSFT @ 318.00 -> {}", limit.status);

    let summary = engine.get_portfolio_summary(portfolio.id).await?;
    render_summary(&summary, args.json)?;

    println!("\nMSFT drops to 317.50; running market tick...");
    quotes.set_price("MSFT", dec!(317.50)).await;
    let transitioned = engine.process_market_tick().await;
    for order in &transitioned {
        println!(
            "Order {} ({} {} {}) -> {}",
            order.id, order.side, order.quantity, order.symbol, order.status
        );
    }

    let summary = engine.get_portfolio_summary(portfolio.id).await?;
    render_summary(&summary, args.json)?;
    Ok(())
}

// ==============================================================================
// Execute-Plan Command Logic
// ==============================================================================

async fn handle_execute_plan(args: ExecutePlanArgs) -> anyhow::Result<()> {
    let config = configuration::load_config()?;
    let plan: RebalancingPlan = serde_json::from_str(&std::fs::read_to_string(&args.plan)?)?;

    // Seed the deterministic quote source from the planner's own reference
    // prices so the plan executes against the prices it was computed from.
    let quotes = Arc::new(StaticQuoteSource::new(config.simulation.spread_pct));
    for recommendation in plan
        .immediate
        .iter()
        .chain(&plan.end_of_day)
        .chain(&plan.next_session)
    {
        quotes
            .set_price(&recommendation.symbol, recommendation.reference_price)
            .await;
    }

    let engine = Arc::new(PaperTradingEngine::new(
        config,
        quotes as Arc<dyn QuoteSource>,
    ));
    let portfolio = engine.create_portfolio("Plan Portfolio", args.cash).await?;

    let executor = PlanExecutor::new(engine);
    let result = executor.execute_plan(portfolio.id, &plan).await?;
    render_plan_result(&result, args.json)?;

    if !result.success {
        anyhow::bail!("plan executed with {} error(s)", result.errors.len());
    }
    Ok(())
}

// ==============================================================================
// Rendering
// ==============================================================================

fn render_summary(summary: &PortfolioSummary, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!(
        "\nPortfolio '{}'  cash: {}  total value: {}  unrealized P&L: {}  realized P&L: {}",
        summary.name,
        summary.cash.round_dp(2),
        summary.total_value.round_dp(2),
        summary.total_unrealized_pnl.round_dp(2),
        summary.total_realized_pnl.round_dp(2),
    );

    if !summary.positions.is_empty() {
        let mut table = Table::new();
        table.set_header(vec![
            "Symbol",
            "Quantity",
            "Avg Price",
            "Current",
            "Market Value",
            "Unrealized P&L",
            "P&L %",
        ]);
        for position in &summary.positions {
            table.add_row(vec![
                position.symbol.clone(),
                position.quantity.to_string(),
                position.avg_price.round_dp(4).to_string(),
                decimal_cell(position.current_price, 2),
                decimal_cell(position.market_value, 2),
                decimal_cell(position.unrealized_pnl, 2),
                decimal_cell(position.unrealized_pnl_pct, 2),
            ]);
        }
        println!("{table}");
    }

    if !summary.pending_orders.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Order", "Side", "Type", "Symbol", "Qty", "Limit", "Stop"]);
        for order in &summary.pending_orders {
            table.add_row(vec![
                order.id.to_string(),
                order.side.to_string(),
                order.order_type.to_string(),
                order.symbol.clone(),
                order.quantity.to_string(),
                decimal_cell(order.limit_price, 2),
                decimal_cell(order.stop_price, 2),
            ]);
        }
        println!("Pending orders:\n{table}");
    }
    Ok(())
}

fn render_plan_result(result: &PlanExecutionResult, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Symbol", "Action", "Qty", "Type", "Limit", "Status"]);
    for order in &result.orders_placed {
        table.add_row(vec![
            order.symbol.clone(),
            order.action.to_string(),
            order.quantity.to_string(),
            order.order_type.to_string(),
            decimal_cell(order.limit_price, 2),
            order.status.to_string(),
        ]);
    }
    println!("Orders placed:\n{table}");

    for error in &result.errors {
        println!("ERROR {}: {}", error.symbol, error.error);
    }
    for deferred in &result.deferred {
        println!(
            "Deferred to next session: {} {} {}",
            deferred.action, deferred.shares, deferred.symbol
        );
    }

    render_summary(&result.summary, false)
}

fn decimal_cell(value: Option<Decimal>, dp: u32) -> String {
    value
        .map(|v| v.round_dp(dp).to_string())
        .unwrap_or_else(|| "-".to_string())
}
