/// Line-oriented source buffer with four-space indentation.
///
/// Emitters render a whole unit here before anything reaches the output
/// stream, so a generation error never leaves a partial file behind.
#[derive(Debug, Default)]
pub(crate) struct CodeWriter {
    buf: String,
}

impl CodeWriter {
    pub(crate) fn new() -> Self {
        CodeWriter::default()
    }

    pub(crate) fn line(&mut self, indent: usize, text: impl AsRef<str>) {
        let text = text.as_ref();
        if !text.is_empty() {
            for _ in 0..indent {
                self.buf.push_str("    ");
            }
            self.buf.push_str(text);
        }
        self.buf.push('\n');
    }

    pub(crate) fn blank(&mut self) {
        self.buf.push('\n');
    }

    pub(crate) fn finish(self) -> String {
        self.buf
    }
}

/// Make arbitrary text safe to place after a line comment marker.
pub(crate) fn comment_text(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}
