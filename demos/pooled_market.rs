//! Pooled market example.
//!
//! A bond market with partitioned polynomial participants is cleared twice:
//! once with one edge per buyer/seller pair, and once with every pair pooled
//! into a single hyperedge so that the whole resource clears at one rate.

use mixed_clearing::prelude::*;
use mixed_clearing::response::partition::{ExpIocPartition, InverseExpIocPartition};
use mixed_clearing::response::partitioned::PartitionedResponseFunction;
use mixed_clearing::response::shapes::{PolynomialDemandResponse, PolynomialSupplyResponse};

const BUYERS: [(&str, f64, f64, f64); 3] = [
    ("PENSION-1", 2.0, 1.5, 120.0),
    ("INSURER-1", 1.5, 1.2, 80.0),
    ("FUND-1", 3.0, 1.8, 60.0),
];

const SELLERS: [(&str, f64, f64, f64); 2] = [("TREASURY", 2.0, 1.0, 150.0), ("AGENCY", 1.0, 1.5, 90.0)];

fn demand(power: f64, maximum_rate: f64, max_demand: f64) -> Box<dyn MarketResponseFunction> {
    Box::new(PartitionedResponseFunction::new(
        Box::new(InverseExpIocPartition::default()),
        Box::new(PolynomialDemandResponse::new(power, maximum_rate, max_demand)),
    ))
}

fn supply(power: f64, normalization: f64, max_supply: f64) -> Box<dyn MarketResponseFunction> {
    Box::new(PartitionedResponseFunction::new(
        Box::new(ExpIocPartition::default()),
        Box::new(PolynomialSupplyResponse::new(power, normalization, max_supply)),
    ))
}

fn session(mode: SubnetworkClearingMode) -> Result<(), Box<dyn std::error::Error>> {
    let bonds = ClearingInstrument::new("Gilts Market", "Ten Year Bond");
    let aggregator = ResourceExchangeAggregator::<String>::shared(TradeVolumePolicy::Smaller);

    let mut market = MixedNetworkMarket::<String>::new();
    market.add_subnetwork(bonds, aggregator.clone(), mode);
    for (id, power, rate, volume) in BUYERS {
        market.add_buy_order(id.to_lowercase(), id, demand(power, rate, volume))?;
    }
    for (id, power, normalization, volume) in SELLERS {
        market.add_sell_order(id.to_lowercase(), id, supply(power, normalization, volume))?;
    }

    let mut algorithm = AlgorithmConfig::default().build::<String>()?;
    let report = market.clear(algorithm.as_mut())?;
    println!("{}\n", report);

    let aggregator = aggregator.borrow();
    for exchange in aggregator.exchanges() {
        println!(
            "  {:<10} <- {:<10} trade {:>8.3} at {:.4}",
            exchange.consumer, exchange.supplier, exchange.exchange.trade, exchange.exchange.rate
        );
    }
    println!(
        "\n  Demand {:.3}, supply {:.3}, weighted rate {:.4}\n",
        aggregator.total_consumer_demand(),
        aggregator.total_supplier_supply(),
        aggregator.desired_trade_weighted_rate()
    );
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    println!("━━━ Heterogeneous: one edge per pair ━━━\n");
    session(SubnetworkClearingMode::Heterogeneous)?;

    println!("━━━ Homogeneous: one pooled hyperedge ━━━\n");
    session(SubnetworkClearingMode::Homogeneous)?;

    Ok(())
}
