//! Primary key generators for inserts that don't supply a key.
//!
//! Snowflake keys are `timestamp | node | sequence`. They are unique as
//! long as every router runs with its own `node_id` and clocks don't
//! jump back by more than a few milliseconds.
use std::fmt::Debug;
use std::sync::atomic::{AtomicI64, Ordering};
use std::thread::sleep;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use shardroute_config::{KeyGenerator as KeyGeneratorConfig, KeyGeneratorKind};
use thiserror::Error;

const SEQUENCE_BITS: u64 = 12;
const NODE_BITS: u64 = 10;
// Sign bit stays clear.
const TIMESTAMP_BITS: u64 = 63 - NODE_BITS - SEQUENCE_BITS;

const SEQUENCE_MASK: u64 = (1 << SEQUENCE_BITS) - 1;
const MAX_NODE_ID: u64 = (1 << NODE_BITS) - 1;
const MAX_ELAPSED: u64 = (1 << TIMESTAMP_BITS) - 1;

const NODE_SHIFT: u64 = SEQUENCE_BITS;
const TIMESTAMP_SHIFT: u64 = SEQUENCE_BITS + NODE_BITS;

/// 2024-01-01T00:00:00Z
const EPOCH_MS: u64 = 1_704_067_200_000;

#[derive(Debug, Error)]
pub enum Error {
    #[error("node_id {0} is larger than {MAX_NODE_ID}")]
    NodeIdTooLarge(u64),

    #[error("{0} ms since the key epoch don't fit into a key")]
    TimestampOverflow(u64),
}

/// Source of primary key values.
pub trait KeyGenerator: Debug + Send + Sync {
    fn next_key(&self) -> Result<i64, Error>;
}

/// Build the generator described by the configuration.
pub fn from_config(
    config: &KeyGeneratorConfig,
    node_id: u64,
) -> Result<Box<dyn KeyGenerator>, Error> {
    Ok(match config.kind {
        KeyGeneratorKind::Snowflake => Box::new(Snowflake::new(node_id)?),
        KeyGeneratorKind::Increment => Box::new(Increment::new(config.start)),
    })
}

#[derive(Debug, Default)]
struct Sequence {
    millis: u64,
    counter: u64,
}

impl Sequence {
    fn next(&mut self, node_id: u64) -> Result<u64, Error> {
        let mut millis = tick(self.millis);

        if millis == self.millis {
            self.counter = (self.counter + 1) & SEQUENCE_MASK;
            if self.counter == 0 {
                // 4096 keys in one millisecond.
                millis = tick(millis + 1);
            }
        } else {
            self.counter = 0;
        }
        self.millis = millis;

        let elapsed = millis.saturating_sub(EPOCH_MS);
        if elapsed > MAX_ELAPSED {
            return Err(Error::TimestampOverflow(elapsed));
        }

        Ok(elapsed << TIMESTAMP_SHIFT | node_id << NODE_SHIFT | self.counter)
    }
}

fn millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|since| since.as_millis() as u64)
        .unwrap_or_default()
}

// Block until the clock reaches `at_least`.
fn tick(at_least: u64) -> u64 {
    let mut now = millis();
    while now < at_least {
        sleep(Duration::from_millis(1));
        now = millis();
    }
    now
}

/// Time-ordered keys, unique across router instances.
#[derive(Debug)]
pub struct Snowflake {
    node_id: u64,
    sequence: Mutex<Sequence>,
}

impl Snowflake {
    pub fn new(node_id: u64) -> Result<Self, Error> {
        if node_id > MAX_NODE_ID {
            return Err(Error::NodeIdTooLarge(node_id));
        }

        Ok(Self {
            node_id,
            sequence: Mutex::new(Sequence::default()),
        })
    }
}

impl KeyGenerator for Snowflake {
    fn next_key(&self) -> Result<i64, Error> {
        let key = self.sequence.lock().next(self.node_id)?;
        Ok(key as i64)
    }
}

/// Process-local counter.
#[derive(Debug)]
pub struct Increment {
    next: AtomicI64,
}

impl Increment {
    pub fn new(start: i64) -> Self {
        Self {
            next: AtomicI64::new(start),
        }
    }
}

impl KeyGenerator for Increment {
    fn next_key(&self) -> Result<i64, Error> {
        Ok(self.next.fetch_add(1, Ordering::Relaxed))
    }
}
