//! Emitters - where merged series go after each round

use std::io::{self, Stdout, Write};
use std::sync::Arc;

use parking_lot::Mutex;

use trends_core::TrendRecord;

/// Sink for one keyword's ordered records
pub trait Emitter: Send {
    fn emit(&mut self, keyword: &str, records: &[TrendRecord]) -> anyhow::Result<()>;
}

/// One JSON object per line, a blank line after each keyword block
pub struct JsonLinesEmitter<W: Write + Send> {
    out: W,
}

impl<W: Write + Send> JsonLinesEmitter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl JsonLinesEmitter<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> Emitter for JsonLinesEmitter<W> {
    fn emit(&mut self, _keyword: &str, records: &[TrendRecord]) -> anyhow::Result<()> {
        for record in records {
            writeln!(self.out, "{}", record.to_json_line()?)?;
        }
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}

/// Collects emitted blocks in memory; clones share the same buffer
#[derive(Debug, Clone, Default)]
pub struct MemoryEmitter {
    blocks: Arc<Mutex<Vec<(String, Vec<TrendRecord>)>>>,
}

impl MemoryEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emitted blocks as (keyword, records), in emission order
    pub fn blocks(&self) -> Vec<(String, Vec<TrendRecord>)> {
        self.blocks.lock().clone()
    }

    /// Most recent block for a keyword
    pub fn latest(&self, keyword: &str) -> Option<Vec<TrendRecord>> {
        self.blocks
            .lock()
            .iter()
            .rev()
            .find(|(k, _)| k == keyword)
            .map(|(_, records)| records.clone())
    }
}

impl Emitter for MemoryEmitter {
    fn emit(&mut self, keyword: &str, records: &[TrendRecord]) -> anyhow::Result<()> {
        self.blocks
            .lock()
            .push((keyword.to_string(), records.to_vec()));
        Ok(())
    }
}
