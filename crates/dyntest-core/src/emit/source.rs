//! Small indentation-aware text builder shared by the emitters.

/// Accumulates lines of generated source with a fixed indent width.
#[derive(Debug)]
pub struct SourceBuilder {
    buf: String,
    depth: usize,
    indent: &'static str,
}

impl SourceBuilder {
    pub fn new(indent: &'static str) -> Self {
        Self {
            buf: String::new(),
            depth: 0,
            indent,
        }
    }

    /// Append one line at the current depth. Empty input yields an empty line.
    pub fn line(&mut self, text: impl AsRef<str>) -> &mut Self {
        let text = text.as_ref();
        if !text.is_empty() {
            for _ in 0..self.depth {
                self.buf.push_str(self.indent);
            }
            self.buf.push_str(text);
        }
        self.buf.push('\n');
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.buf.push('\n');
        self
    }

    pub fn lines<I, S>(&mut self, lines: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for l in lines {
            self.line(l);
        }
        self
    }

    pub fn indent(&mut self) -> &mut Self {
        self.depth += 1;
        self
    }

    pub fn dedent(&mut self) -> &mut Self {
        self.depth = self.depth.saturating_sub(1);
        self
    }

    pub fn finish(self) -> String {
        self.buf
    }
}
