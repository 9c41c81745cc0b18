//! Reader and writer adapters.

use std::io::{Read, Write};

use log::debug;

use crate::encode::{encode_with, EncodeOptions};
use crate::error::Error;
use crate::value::Value;

/// Reads one HUML document from a byte stream.
///
/// The whole stream is buffered before parsing starts.
pub struct Decoder<R> {
    reader: R,
}

impl<R: Read> Decoder<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Read to the end of the stream and parse it.
    ///
    /// Calling this again on an exhausted stream fails with an empty
    /// document error.
    pub fn decode(&mut self) -> Result<Value, Error> {
        let mut buf = Vec::new();
        self.reader.read_to_end(&mut buf)?;
        debug!("read {} bytes", buf.len());
        Ok(crate::parse_bytes(&buf)?)
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

/// Writes HUML documents to a byte stream.
///
/// Each document is rendered in full before anything is written, so a failed
/// encode leaves the writer untouched.
pub struct Encoder<W> {
    writer: W,
    options: EncodeOptions,
}

impl<W: Write> Encoder<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            options: EncodeOptions::default(),
        }
    }

    pub fn with_options(mut self, options: EncodeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn encode(&mut self, value: &Value) -> Result<(), Error> {
        let text = encode_with(value, &self.options)?;
        self.writer.write_all(text.as_bytes())?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
