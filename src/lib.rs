//! # dexpseudo
//!
//! Decodes the id tables of an Android DEX buffer (strings, types, fields,
//! methods, class definitions) and renders the code found at each class's
//! data offset as pseudo-source lines.
//!
//! This is a renderer, not a decompiler: no control flow is rebuilt, and
//! method prototypes stay as raw indices.
//!
use log::{error, info};

use crate::dex::{DexError, DexFile};
use crate::types::{BatchReport, DecodeOptions, DecodedDex};

pub mod dex;
mod tests;
pub mod types;

/// Runs the whole pipeline over one buffer: header, pools, tables, then every
/// class body.
///
/// # Examples
///
/// ```no_run
///  use dexpseudo::disassemble;
///  use dexpseudo::types::DecodeOptions;
///
///  let bytes = std::fs::read("classes.dex").unwrap();
///  let dex = disassemble(&bytes, &DecodeOptions::default()).unwrap();
///  for class in &dex.classes {
///      println!("{}: {} lines", class.name, class.lines.len());
///  }
/// ```
pub fn disassemble(bytes: &[u8], options: &DecodeOptions) -> Result<DecodedDex, DexError>
{
    let dex = DexFile::from_bytes_with(bytes, options)?;
    Ok(DecodedDex {
        version: dex.header.version(),
        classes: dex.to_pseudo()?,
    })
}

/// Decodes each `(identifier, bytes)` input independently. A buffer that fails
/// is recorded with its error and the batch moves on.
pub fn disassemble_all<I>(inputs: I, options: &DecodeOptions) -> BatchReport
where
    I: IntoIterator<Item = (String, Vec<u8>)>,
{
    let mut report = BatchReport::default();
    for (id, bytes) in inputs
    {
        match disassemble(&bytes, options)
        {
            Ok(decoded) => {
                info!("[batch] {}: {} classes", id, decoded.classes.len());
                report.decoded.push((id, decoded));
            }
            Err(e) => {
                error!("[batch] {} failed: {}", id, e);
                report.failures.push((id, e));
            }
        }
    }
    report
}
