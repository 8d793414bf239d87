//! Result and option types shared by the decoder and its callers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dex::error::DexError;

/// Tunables for decoding one buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeOptions
{
    /// Threads used to decode the string table. Zero behaves as one.
    pub string_workers: usize,
}

impl Default for DecodeOptions
{
    fn default() -> Self
    {
        DecodeOptions {
            string_workers: std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4),
        }
    }
}

impl DecodeOptions
{
    pub fn with_string_workers(mut self, workers: usize) -> Self
    {
        self.string_workers = workers;
        self
    }

    pub fn string_workers(&self) -> usize
    {
        self.string_workers.max(1)
    }
}

/// One rendered pseudo-source line and the byte offset of the instruction it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedLine
{
    pub offset: u32,
    pub text: String,
}

impl fmt::Display for DecodedLine
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(&self.text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedClass
{
    pub name: String,
    pub superclass: Option<String>,
    pub source_file: Option<String>,
    pub lines: Vec<DecodedLine>,
}

impl DecodedClass
{
    pub fn texts(&self) -> Vec<&str>
    {
        self.lines.iter().map(|l| l.text.as_str()).collect()
    }
}

/// Everything decoded from one buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedDex
{
    pub version: Option<u32>,
    pub classes: Vec<DecodedClass>,
}

/// Outcome of a batch: decoded buffers plus the buffers that failed, by identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport
{
    pub decoded: Vec<(String, DecodedDex)>,
    pub failures: Vec<(String, DexError)>,
}

impl BatchReport
{
    pub fn is_clean(&self) -> bool
    {
        self.failures.is_empty()
    }

    pub fn class_count(&self) -> usize
    {
        self.decoded.iter().map(|(_, d)| d.classes.len()).sum()
    }
}
