use std::fmt;

use serde::Serialize;

#[macro_export]
macro_rules! err {
    ($kind:ident, $msg:literal) => {
        $crate::dex::error::DexError::new($crate::dex::error::DexErrorKind::$kind, $msg)
    };
    ($kind:ident, $fmtstr:literal, $($args:tt)*) => {
        $crate::dex::error::DexError::new($crate::dex::error::DexErrorKind::$kind, &format!($fmtstr, $($args)*))
    };
}

#[macro_export]
macro_rules! fail {
    ($kind:ident, $msg:literal) => {
        return Err($crate::err!($kind, $msg))
    };
    ($kind:ident, $fmtstr:literal, $($args:tt)*) => {
        return Err($crate::err!($kind, $fmtstr, $($args)*))
    };
}

/// The four ways decoding a single buffer can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DexErrorKind
{
    /// The magic prefix is not `dex\n`.
    DexFormat,
    /// A read would run past the end of the buffer.
    BufferBounds,
    /// A ULEB128 value did not terminate within five bytes.
    MalformedVarint,
    /// A table index is out of range and is not the absent sentinel.
    UnresolvedIndex,
}

impl fmt::Display for DexErrorKind
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let s = match self
        {
            DexErrorKind::DexFormat => "DexFormatError",
            DexErrorKind::BufferBounds => "BufferBoundsError",
            DexErrorKind::MalformedVarint => "MalformedVarint",
            DexErrorKind::UnresolvedIndex => "UnresolvedIndexError",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DexError
{
    kind: DexErrorKind,
    msg: String,
    contexts: Vec<String>,
}

impl DexError
{
    pub fn new(kind: DexErrorKind, msg: &str) -> Self
    {
        DexError {
            kind,
            msg: msg.to_string(),
            contexts: Vec::new(),
        }
    }

    pub fn with_context(base: DexError, context: String) -> Self
    {
        let mut contexts = base.contexts;
        contexts.push(context);
        DexError { kind: base.kind, msg: base.msg, contexts }
    }

    pub fn kind(&self) -> DexErrorKind
    {
        self.kind
    }
}

impl fmt::Display for DexError
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}: {}", self.kind, self.msg)?;
        let mut connector = " for ";
        for context in &self.contexts
        {
            write!(f, "{}{}", connector, context)?;
            connector = " of ";
        }
        Ok(())
    }
}

impl std::error::Error for DexError {}
