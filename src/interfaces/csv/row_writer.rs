use crate::domain::converter::CurrencyRow;
use crate::domain::format::format_plain;
use crate::error::Result;
use std::io::Write;

/// Writes converter rows as `currency,amount` CSV.
///
/// Amounts are padded to the precision of their currency and carry no
/// thousands separators, so the output can be fed to other tools.
pub struct RowWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> RowWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_rows<'a>(
        &mut self,
        rows: impl IntoIterator<Item = &'a CurrencyRow>,
    ) -> Result<()> {
        self.writer.write_record(["currency", "amount"])?;
        for row in rows {
            let amount = format_plain(row.amount, row.currency.precision());
            self.writer.write_record([row.currency.as_str(), amount.as_str()])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
