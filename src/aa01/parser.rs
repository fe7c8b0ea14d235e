//! Generic tagged-field record decoder.
//!
//! Every AA01 stream, top level or nested, is a run of records sharing one
//! wire shape:
//!
//! ```text
//! "AA01" | u16 total length L | (L - 6) bytes of tagged fields | payload
//! ```
//!
//! The field body is a sequence of 4-byte tags (three name characters and a
//! type code) each followed by its value. A `dat` field declares that many
//! payload bytes directly after the body, in the enclosing stream; the
//! decoder records where they are and skips them without reading.
//!
//! [`RecordDecoder`] walks such a stream lazily, producing one record per
//! call to `next()`.

use std::marker::PhantomData;

use crate::error::{Aa01Error, Result};
use crate::io::BoundedView;

use super::structures::*;
use super::value::decode_value;

/// Lazy decoder over a stream of records of variant `T`.
///
/// The decoder owns its own [`BoundedView`], so it never disturbs other
/// views over the same source. It stops cleanly when the view is exhausted
/// at a record boundary. The first error is yielded once, after which the
/// iterator is finished.
pub struct RecordDecoder<T: Record> {
    view: BoundedView,
    failed: bool,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> RecordDecoder<T> {
    pub fn new(view: BoundedView) -> Self {
        Self {
            view,
            failed: false,
            _record: PhantomData,
        }
    }

    /// The stream view; its cursor sits at the next record header.
    pub fn view(&self) -> &BoundedView {
        &self.view
    }

    /// Decode the record at the cursor and advance past it and its payload.
    fn decode_next(&mut self) -> Result<T> {
        let header_offset = self.view.absolute_position();

        let magic = self.view.read_array::<4>()?;
        if &magic != RECORD_MAGIC {
            return Err(Aa01Error::BadMagic {
                offset: header_offset,
                found: magic,
            });
        }

        let length = self.view.read_u16()?;
        if u64::from(length) < RECORD_HEADER_SIZE {
            return Err(Aa01Error::InvalidLength {
                offset: header_offset,
                length,
            });
        }

        let body_len = u64::from(length) - RECORD_HEADER_SIZE;
        let body = self.view.subview(body_len)?.into_buffered()?;
        self.view.skip(body_len)?;

        let (mut record, payload_size) = decode_fields::<T>(body)?;

        log::debug!(
            "{} record at {:#x}: length {}, payload {}",
            T::NAME,
            header_offset,
            length,
            payload_size
        );

        if payload_size > 0 {
            let payload = self.view.subview(payload_size)?;
            self.view.skip(payload_size)?;
            record.attach_payload(payload);
        }

        Ok(record)
    }
}

/// Populate a `T` from a record body.
///
/// Returns the record and the payload size declared by a `dat` field, which
/// is tracked even when `T` does not keep the field.
fn decode_fields<T: Record>(mut body: BoundedView) -> Result<(T, u64)> {
    let mut record = T::default();
    let mut payload_size = 0;
    let body_end = body.start() + body.len();

    while !body.at_end() {
        let tag_offset = body.absolute_position();
        if body.remaining() < TAG_SIZE {
            return Err(Aa01Error::TruncatedRecord {
                offset: tag_offset,
                remaining: body.remaining(),
            });
        }

        let tag = body.read_array::<4>()?;
        let name: String = tag[..3]
            .iter()
            .map(|b| char::from(b.to_ascii_lowercase()))
            .collect();
        let code = char::from(tag[3]);

        let value = decode_value(code, &mut body, tag_offset).map_err(|err| match err {
            // A value cut off by the end of the body is a malformed record.
            Aa01Error::TruncatedRead { .. } => Aa01Error::TruncatedRecord {
                offset: tag_offset,
                remaining: body_end - tag_offset,
            },
            other => other,
        })?;

        if name == PAYLOAD_FIELD {
            match value.as_integer() {
                Some(size) => payload_size = size,
                None => {
                    return Err(Aa01Error::FieldTypeMismatch {
                        offset: tag_offset,
                        field: name,
                        code,
                    });
                }
            }
        }

        match T::setter(&name) {
            Some(setter) => {
                if !setter(&mut record, value) {
                    return Err(Aa01Error::FieldTypeMismatch {
                        offset: tag_offset,
                        field: name,
                        code,
                    });
                }
            }
            None => log::trace!("{}: ignoring field {:?} at {:#x}", T::NAME, name, tag_offset),
        }
    }

    Ok((record, payload_size))
}

impl<T: Record> Iterator for RecordDecoder<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.view.at_end() {
            return None;
        }

        match self.decode_next() {
            Ok(record) => Some(Ok(record)),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

impl<T: Record> std::iter::FusedIterator for RecordDecoder<T> {}
