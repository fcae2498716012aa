/// Minimal CSV writer: quotes only when needed, CRLF row endings.
#[derive(Debug, Default)]
pub struct CsvWriter {
    out: String,
}

impl CsvWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row<I, S>(&mut self, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fields: Vec<S> = fields.into_iter().collect();

        // A lone empty field would otherwise be indistinguishable from a blank row.
        if fields.len() == 1 && fields[0].as_ref().is_empty() {
            self.out.push_str("\"\"\r\n");
            return;
        }

        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                self.out.push(',');
            }
            push_field(&mut self.out, field.as_ref());
        }
        self.out.push_str("\r\n");
    }

    pub fn blank(&mut self) {
        self.out.push_str("\r\n");
    }

    pub fn finish(self) -> String {
        self.out
    }
}

fn push_field(out: &mut String, field: &str) {
    if field.contains([',', '"', '\r', '\n']) {
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(field);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoting() {
        let mut w = CsvWriter::new();
        w.row(["plain", "with,comma", "say \"hi\"", "two\nlines"]);
        w.blank();
        w.row([""]);
        w.row(["a", "", "b"]);
        assert_eq!(
            w.finish(),
            "plain,\"with,comma\",\"say \"\"hi\"\"\",\"two\nlines\"\r\n\r\n\"\"\r\na,,b\r\n"
        );
    }
}
