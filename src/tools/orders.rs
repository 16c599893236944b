/// Order placement seam for the `create_order` tool
///
/// The tool layer validates a setup and hands an `OrderRequest` to whatever
/// `OrderSink` it was built with. `DryRunOrderSink` only logs and echoes.

use crate::levels::OrderSide;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
}

impl OrderRequest {
    /// Check prices are finite and positive, and that the stop and target sit
    /// on the correct sides of the entry for `side`
    pub fn validate(&self) -> Result<(), String> {
        let prices = [
            ("entry", self.entry),
            ("stop_loss", self.stop_loss),
            ("take_profit", self.take_profit),
        ];
        for (name, value) in prices {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!("{} must be a positive price, got {}", name, value));
            }
        }

        let ordered = match self.side {
            OrderSide::Buy => self.stop_loss < self.entry && self.entry < self.take_profit,
            OrderSide::Sell => self.take_profit < self.entry && self.entry < self.stop_loss,
        };
        if !ordered {
            return Err(format!(
                "{} order needs {}: stop_loss {}, entry {}, take_profit {}",
                self.side,
                match self.side {
                    OrderSide::Buy => "stop_loss < entry < take_profit",
                    OrderSide::Sell => "take_profit < entry < stop_loss",
                },
                self.stop_loss,
                self.entry,
                self.take_profit
            ));
        }

        Ok(())
    }
}

/// Destination for validated orders (exchange connector, paper book, ...)
#[async_trait]
pub trait OrderSink: Send + Sync {
    async fn place_order(&self, order: &OrderRequest) -> crate::Result<Value>;
}

/// Logs orders instead of sending them
#[derive(Debug, Default)]
pub struct DryRunOrderSink {
    placed: AtomicU64,
}

impl DryRunOrderSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of orders accepted so far
    pub fn placed(&self) -> u64 {
        self.placed.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl OrderSink for DryRunOrderSink {
    async fn place_order(&self, order: &OrderRequest) -> crate::Result<Value> {
        let id = self.placed.fetch_add(1, Ordering::Relaxed) + 1;

        tracing::info!(
            "[DRY RUN] {} {} @ {:.4} (SL {:.4}, TP {:.4})",
            order.side,
            order.symbol,
            order.entry,
            order.stop_loss,
            order.take_profit
        );

        Ok(json!({
            "status": "dry_run",
            "order_id": format!("dry-run-{}", id),
            "order": order,
        }))
    }
}
