//! Evaluate command implementation

use clap::{Args, ValueEnum};
use rust_decimal::Decimal;

use crate::config::RiskConfig;
use crate::risk::{stops, AssetClass, RiskGovernor, Side, TradeRequest};

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum SideArg {
    Buy,
    Sell,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum AssetClassArg {
    Equity,
    Crypto,
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Ticker, e.g. AAPL or BTC/USD
    #[arg(long)]
    pub symbol: String,

    #[arg(long, value_enum, default_value = "buy")]
    pub side: SideArg,

    /// Asset class; inferred from the symbol when omitted
    #[arg(long, value_enum)]
    pub asset_class: Option<AssetClassArg>,

    /// Entry price
    #[arg(long)]
    pub entry: Decimal,

    /// Stop-loss price; defaults to the configured stop distance
    #[arg(long)]
    pub stop: Option<Decimal>,

    /// Take-profit price
    #[arg(long)]
    pub take_profit: Option<Decimal>,

    /// Signal confidence in [0, 1]
    #[arg(long)]
    pub confidence: Decimal,

    /// Account balance
    #[arg(long)]
    pub balance: Decimal,

    /// Buying power; defaults to the balance
    #[arg(long)]
    pub buying_power: Option<Decimal>,
}

impl EvaluateArgs {
    /// Build the request, filling defaults from config
    pub fn to_request(&self, config: &RiskConfig) -> TradeRequest {
        let side = match self.side {
            SideArg::Buy => Side::Buy,
            SideArg::Sell => Side::Sell,
        };
        let asset_class = match self.asset_class {
            Some(AssetClassArg::Equity) => AssetClass::Equity,
            Some(AssetClassArg::Crypto) => AssetClass::Crypto,
            None => AssetClass::infer(&self.symbol),
        };
        let stop_loss_price = self
            .stop
            .unwrap_or_else(|| stops::default_stop_loss(self.entry, side, asset_class, config));

        TradeRequest {
            symbol: self.symbol.clone(),
            side,
            asset_class,
            entry_price: self.entry,
            stop_loss_price,
            take_profit_price: self.take_profit,
            confidence_score: self.confidence,
            account_balance: self.balance,
            buying_power: self.buying_power.unwrap_or(self.balance),
        }
    }

    pub async fn execute(&self, config: &RiskConfig) -> anyhow::Result<()> {
        let governor = RiskGovernor::new(config.clone())?;
        let request = self.to_request(config);

        let decision = governor.evaluate(&request);
        println!("{}", serde_json::to_string_pretty(&decision)?);
        Ok(())
    }
}
