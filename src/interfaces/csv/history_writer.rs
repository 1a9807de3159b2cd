use crate::domain::history::HistoryItem;
use crate::error::Result;
use std::io::Write;

/// Writes calculation history as `expression,result,timestamp` CSV, in the
/// order given (newest first when fed from a `History`).
pub struct HistoryWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> HistoryWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(sink),
        }
    }

    pub fn write_history<'a>(
        &mut self,
        items: impl IntoIterator<Item = &'a HistoryItem>,
    ) -> Result<()> {
        self.writer
            .write_record(["expression", "result", "timestamp"])?;
        for item in items {
            self.writer.serialize(item)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::history::History;

    #[test]
    fn test_write_history() {
        let mut history = History::new();
        history.push(HistoryItem::new("1,000 × 2", "2000"));
        history.push(HistoryItem::new("7 + 3", "10"));

        let mut out = Vec::new();
        HistoryWriter::new(&mut out)
            .write_history(history.iter())
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "expression,result,timestamp");
        assert!(lines[1].starts_with("7 + 3,10,"));
        assert!(lines[2].starts_with("\"1,000 × 2\",2000,"));
    }
}
