//! Order-book frame codec.
//!
//! Decodes the venue's L2 snapshot frames into [`OrderBookTick`]s.
//!
//! # Wire Format
//!
//! UTF-8 JSON objects carrying at least `bids` and `asks`, each an
//! ordered list of `[price, size]` pairs with best level first. Price
//! and size are string-encoded on the wire; levels may carry trailing
//! elements (order counts and the like), which are ignored:
//!
//! ```json
//! {"bids": [["95445.1", "12.4"], ["95444.9", "3.0"]],
//!  "asks": [["95445.6", "7.1"]]}
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer, IgnoredAny, SeqAccess, Visitor};
use serde::Deserialize;

use crate::domain::orderbook::{BookLevel, OrderBookTick};

/// Codec errors.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The frame is not a decodable order-book snapshot.
    #[error("order-book frame decode failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decoder for order-book snapshot frames.
#[derive(Debug, Default, Clone)]
pub struct TickCodec;

impl TickCodec {
    /// Create a new codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Decode one frame, stamping the result with `received_at`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Json`] for anything that is not a valid
    /// snapshot: malformed JSON, missing sides, non-numeric price or
    /// size strings, levels with fewer than two elements.
    pub fn decode(
        &self,
        text: &str,
        received_at: DateTime<Utc>,
    ) -> Result<OrderBookTick, CodecError> {
        let frame: WireFrame = serde_json::from_str(text)?;
        Ok(OrderBookTick::new(frame.bids, frame.asks, received_at))
    }
}

#[derive(Deserialize)]
struct WireFrame {
    #[serde(deserialize_with = "levels")]
    bids: Vec<BookLevel>,
    #[serde(deserialize_with = "levels")]
    asks: Vec<BookLevel>,
}

fn levels<'de, D>(deserializer: D) -> Result<Vec<BookLevel>, D::Error>
where
    D: Deserializer<'de>,
{
    let wire: Vec<WireLevel> = Vec::deserialize(deserializer)?;
    Ok(wire.into_iter().map(|l| BookLevel::new(l.price, l.size)).collect())
}

/// One `[price, size, ...]` entry; extra elements are ignored.
struct WireLevel {
    price: f64,
    size: f64,
}

impl<'de> Deserialize<'de> for WireLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct LevelVisitor;

        impl<'de> Visitor<'de> for LevelVisitor {
            type Value = WireLevel;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a [price, size, ...] array")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let price = next_number(&mut seq, 0)?;
                let size = next_number(&mut seq, 1)?;
                // Drain order-count style trailers.
                while seq.next_element::<IgnoredAny>()?.is_some() {}
                Ok(WireLevel { price, size })
            }
        }

        deserializer.deserialize_seq(LevelVisitor)
    }
}

fn next_number<'de, A>(seq: &mut A, index: usize) -> Result<f64, A::Error>
where
    A: SeqAccess<'de>,
{
    let raw: RawNumber = seq
        .next_element()?
        .ok_or_else(|| de::Error::custom(format!("level is missing element {index}")))?;
    match raw {
        RawNumber::Num(v) => Ok(v),
        RawNumber::Text(s) => s
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("non-numeric level element: {s:?}"))),
    }
}

/// Venues send string-encoded numbers; accept bare numbers as well.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Num(f64),
    Text(String),
}
