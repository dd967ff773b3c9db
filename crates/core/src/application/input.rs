// JSON Input Reader - request fields and JSON bodies into `pool.data`

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use super::constants::COMMAND_KEYS;
use crate::domain::ProcessPool;
use crate::error::Result;
use crate::port::InputReader;

/// Reads pre-parsed fields (CLI `--data`, HTTP query) and an optional raw body
///
/// Fields are merged before the body, so a key present in both keeps the
/// field value. `c` / `cmd` are taken as the command instead of data.
#[derive(Debug, Clone, Default)]
pub struct JsonInputReader {
    fields: Map<String, Value>,
    body: Option<Vec<u8>>,
}

impl JsonInputReader {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields, body: None }
    }

    /// Body is parsed on `read`; malformed JSON surfaces as a pool error then
    pub fn from_body(body: impl Into<Vec<u8>>) -> Self {
        Self::default().with_body(body)
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    fn parse_body(&self) -> Result<Map<String, Value>> {
        match &self.body {
            Some(raw) if !raw.iter().all(u8::is_ascii_whitespace) => {
                Ok(serde_json::from_slice(raw)?)
            }
            _ => Ok(Map::new()),
        }
    }
}

#[async_trait]
impl InputReader for JsonInputReader {
    async fn read(&self, pool: &mut ProcessPool) -> Result<()> {
        let fields = self.fields.clone();
        let body = self.parse_body();

        let mut inserted = absorb(pool, fields);
        inserted += absorb(pool, body?);

        debug!(inserted, command = %pool.command, "Input merged");
        Ok(())
    }
}

/// Pull command keys out of `source`, then merge the rest
fn absorb(pool: &mut ProcessPool, mut source: Map<String, Value>) -> usize {
    for key in COMMAND_KEYS {
        if let Some(value) = source.remove(key) {
            if pool.command.is_empty() {
                if let Value::String(command) = value {
                    pool.command = command;
                }
            }
        }
    }
    pool.merge_data(source)
}
