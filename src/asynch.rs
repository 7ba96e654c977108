//! Optional async iteration over records, 100 at a time.
//!
//! The read path underneath is ordinary blocking I/O; this adapter exists
//! so callers already inside an async runtime can interleave a large scan
//! with other work instead of blocking the executor for the whole table.

use std::io::{Read, Seek, Write};
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;

use crate::error::Error;
use crate::handle::Table;
use crate::record::Record;

const ASYNC_CHUNK_SIZE: usize = 100;

/// A [`Stream`] of record chunks produced by [`Table::read_records_stream`].
pub struct RecordStream<'a, F> {
    table: &'a mut Table<F>,
    done: bool,
}

impl<'a, F> RecordStream<'a, F> {
    pub(crate) fn new(table: &'a mut Table<F>) -> Self {
        Self { table, done: false }
    }
}

impl<'a, F: Read + Write + Seek + Unpin> Stream for RecordStream<'a, F> {
    type Item = Result<Vec<Record>, Error>;

    fn poll_next(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }
        match this.table.read_records(Some(ASYNC_CHUNK_SIZE)) {
            Ok(records) => {
                if records.is_empty() {
                    this.done = true;
                    Poll::Ready(None)
                } else {
                    if records.len() < ASYNC_CHUNK_SIZE {
                        this.done = true;
                    }
                    Poll::Ready(Some(Ok(records)))
                }
            }
            Err(e) => {
                this.done = true;
                Poll::Ready(Some(Err(e)))
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::field::value::Value;
    use crate::field::{FieldInfo, FieldName, FieldType};
    use crate::handle::{create, open, CreateOptions, OpenOptions};
    use futures_util::StreamExt;
    use std::collections::HashMap;

    #[tokio::test]
    async fn stream_yields_chunks_until_exhausted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stream.dbf");

        let fields = vec![FieldInfo::new(
            FieldName::new("N").unwrap(),
            FieldType::Integer,
            4,
        )];
        let mut table = create(&path, fields, CreateOptions::default()).unwrap();

        let records: Vec<Record> = (0..5)
            .map(|i| {
                let mut values = HashMap::new();
                values.insert("N".to_owned(), Value::Integer(i));
                Record::new(values)
            })
            .collect();
        table.append_records(&records).unwrap();
        drop(table);

        let mut table = open(&path, OpenOptions::default()).unwrap();
        let mut stream = table.read_records_stream();
        let mut total = 0;
        while let Some(chunk) = stream.next().await {
            total += chunk.unwrap().len();
        }
        assert_eq!(total, 5);
    }
}
