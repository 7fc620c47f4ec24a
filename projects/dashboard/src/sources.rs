use interfaces_exchange_ticker::index::{GetPriceError, TickerClient};
use interfaces_zcoin_rpc::index::{CallError, ZcoinRpcClient};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use thiserror::Error;

use crate::cache::{CacheError, CacheStore};
use crate::queue::{compute_queue, QueueError};

/// Every value the refresher keeps warm, in refresh order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    BlockTemplate,
    ZnodeCount,
    XzcPrice,
    EvoZnodeList,
    ProTxList,
    Winners,
    Queue,
}

impl CacheKey {
    pub const ALL: [CacheKey; 7] = [
        CacheKey::BlockTemplate,
        CacheKey::ZnodeCount,
        CacheKey::XzcPrice,
        CacheKey::EvoZnodeList,
        CacheKey::ProTxList,
        CacheKey::Winners,
        CacheKey::Queue,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CacheKey::BlockTemplate => "blocktemplate",
            CacheKey::ZnodeCount => "znode_count",
            CacheKey::XzcPrice => "xzc_price",
            CacheKey::EvoZnodeList => "evoznodelist",
            CacheKey::ProTxList => "protxlist",
            CacheKey::Winners => "winners",
            CacheKey::Queue => "queue",
        }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Rpc: {source}")]
    Rpc {
        #[from]
        source: CallError,
    },

    #[error("Price: {source}")]
    Price {
        #[from]
        source: GetPriceError,
    },

    #[error("Cache: {source}")]
    Cache {
        #[from]
        source: CacheError,
    },

    #[error("Queue: {source}")]
    Queue {
        #[from]
        source: QueueError,
    },

    #[error("PriceOverflow: {xzc_btc} x {btc_usd} does not fit a decimal")]
    PriceOverflow {
        xzc_btc: Decimal,
        btc_usd: Decimal,
    },

    #[error("MissingInput: {name} is not cached")]
    MissingInput {
        name: &'static str,
    },
}

/// Upstream handles used to produce each cached value.
#[derive(Debug, Clone)]
pub struct Sources {
    pub rpc: ZcoinRpcClient,
    pub ticker: TickerClient,
    pub cache: CacheStore,
    pub max_age: chrono::Duration,
}

impl Sources {
    pub async fn fetch(&self, key: CacheKey) -> Result<Value, FetchError> {
        match key {
            CacheKey::BlockTemplate => Ok(self.rpc.call("getblocktemplate", &[]).await?),
            CacheKey::ZnodeCount => Ok(self.rpc.call("evoznode", &[json!("count")]).await?),
            CacheKey::XzcPrice => self.xzc_price().await,
            CacheKey::EvoZnodeList => Ok(self.rpc.call("evoznodelist", &[json!("json")]).await?),
            CacheKey::ProTxList => Ok(self
                .rpc
                .call("protx", &[json!("list"), json!("registered"), json!(true)])
                .await?),
            CacheKey::Winners => Ok(self.rpc.call("evoznode", &[json!("winners")]).await?),
            CacheKey::Queue => self.queue().await,
        }
    }

    async fn xzc_price(&self) -> Result<Value, FetchError> {
        let btc_usd = self.ticker.get_price("USDT_BTC").await?;
        let xzc_btc = self.ticker.get_price("BTC_XZC").await?;
        let price = xzc_usd(xzc_btc, btc_usd).ok_or(FetchError::PriceOverflow { xzc_btc, btc_usd })?;
        Ok(Value::String(price.to_string()))
    }

    async fn queue(&self) -> Result<Value, FetchError> {
        let znodelist = self.cached(CacheKey::EvoZnodeList).await?;
        let protxlist = self.cached(CacheKey::ProTxList).await?;
        let queue = compute_queue(&znodelist, &protxlist)?;
        Ok(json!(queue))
    }

    async fn cached(&self, key: CacheKey) -> Result<Value, FetchError> {
        self.cache
            .get(key.name(), self.max_age)
            .await?
            .ok_or(FetchError::MissingInput { name: key.name() })
    }
}

/// USD price of XZC, kept to 8 significant digits. `None` when the product overflows.
pub fn xzc_usd(xzc_btc: Decimal, btc_usd: Decimal) -> Option<Decimal> {
    let product = xzc_btc.checked_mul(btc_usd)?;
    Some(product.round_sf(8).unwrap_or(product))
}
