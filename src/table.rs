use anyhow::{Context, Result};

/// Rows of a delimited LaTiS response, every cell kept as text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Parses CSV with a header row.
    pub fn from_csv(body: &[u8]) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(body);

        let headers = reader
            .headers()
            .context("failed to read CSV header")?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record = record.with_context(|| format!("failed to read CSV row {}", i + 1))?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cells of the named column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.headers.iter().position(|h| h == name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(idx).map(String::as_str).unwrap_or_default())
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_latis_csv() {
        let body = b"time (days since 2000-01-01), irradiance (W/m^2)\n0,1361.2\n1,1361.4\n";
        let table = Table::from_csv(body).unwrap();
        assert_eq!(
            table.headers(),
            ["time (days since 2000-01-01)", "irradiance (W/m^2)"]
        );
        assert_eq!(table.len(), 2);
        assert_eq!(table.column("irradiance (W/m^2)").unwrap(), ["1361.2", "1361.4"]);
        assert!(table.column("missing").is_none());
    }

    #[test]
    fn header_only_body_is_empty_table() {
        let table = Table::from_csv(b"time,value\n").unwrap();
        assert!(table.is_empty());
        assert_eq!(table.headers().len(), 2);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        assert!(Table::from_csv(b"a,b\n1,2,3\n").is_err());
    }
}
