//! Basic clearing example.
//!
//! Two firms borrow from two banks. The network is built by hand, cleared
//! with each marching variant in turn, and the committed loans are read
//! back from the aggregator.

use mixed_clearing::prelude::*;
use mixed_clearing::response::partitioned::UnivariateResponseFunction;
use mixed_clearing::response::shapes::LinearResponse;

fn linear(intercept: f64, slope: f64, max: f64) -> Box<dyn MarketResponseFunction> {
    Box::new(UnivariateResponseFunction::new(Box::new(LinearResponse::bounded(
        intercept, slope, max,
    ))))
}

fn build(delegate: SharedDelegate<&'static str>) -> Result<MixedClearingNetwork<&'static str>, NetworkError> {
    let loan = ClearingInstrument::new("Loan Market", "Commercial Loan");
    let mut builder = MixedClearingNetworkBuilder::new();
    builder
        .add_node("Acme Foundry", "FIRM-1", linear(120.0, -10.0, 12.0))?
        .add_node("Borealis Mills", "FIRM-2", linear(80.0, -8.0, 10.0))?
        .add_node("First Harbour", "BANK-1", linear(0.0, -6.0, 20.0))?
        .add_node("Granite Trust", "BANK-2", linear(0.0, -4.0, 20.0))?;
    for firm in ["FIRM-1", "FIRM-2"] {
        for bank in ["BANK-1", "BANK-2"] {
            builder.add_edge(firm, bank, loan.clone(), delegate.clone())?;
        }
    }
    builder.build()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("╔═══════════════════════════════════════════╗");
    println!("║  mixed-clearing: Basic Clearing Example   ║");
    println!("╚═══════════════════════════════════════════╝\n");

    let kinds = ["ascent_march", "adaptive_march", "descent_march", "levenberg_marquardt"];
    for kind in kinds {
        println!("━━━ {} ━━━\n", kind);

        let aggregator = ResourceExchangeAggregator::<&'static str>::shared(TradeVolumePolicy::Smaller);
        let mut network = build(aggregator.clone())?;
        let config: AlgorithmConfig = serde_json::from_str(&format!(r#"{{"kind": "{}"}}"#, kind))?;
        let mut algorithm = config.build::<&'static str>()?;

        let residual = match network.apply_clearing_algorithm(algorithm.as_mut()) {
            Ok(residual) => residual,
            Err(err) => {
                println!("No trade this session: {}\n", err);
                continue;
            }
        };
        println!("{}", network);
        println!("Algorithm '{}' finished with residual {:.3e}\n", algorithm.name(), residual);

        network.create_contracts();
        let aggregator = aggregator.borrow();
        for exchange in aggregator.exchanges() {
            println!(
                "  {:<15} borrows {:>8.3} from {:<15} at {:.4}",
                exchange.consumer, exchange.exchange.trade, exchange.supplier, exchange.exchange.rate
            );
        }
        println!(
            "\n  Total desired trade: {:.3}, weighted rate: {:.4}\n",
            aggregator.total_desired_trade(),
            aggregator.desired_trade_weighted_rate()
        );
    }

    Ok(())
}
