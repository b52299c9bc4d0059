use std::io::{self, BufRead, BufReader, Stdin};

use crate::error::ListenError;

use super::Recognizer;

/// Typed input, one utterance per line
pub struct KeyboardRecognizer<R: BufRead + Send> {
    reader: R,
    line: String,
}

impl KeyboardRecognizer<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(io::stdin()))
    }
}

impl<R: BufRead + Send> KeyboardRecognizer<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
        }
    }
}

impl<R: BufRead + Send> Recognizer for KeyboardRecognizer<R> {
    fn next_utterance(&mut self) -> Result<Option<String>, ListenError> {
        self.line.clear();
        match self.reader.read_line(&mut self.line) {
            Ok(0) => Err(ListenError::Closed),
            Ok(_) => {
                let text = self.line.trim();
                Ok((!text.is_empty()).then(|| text.to_string()))
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(None),
            Err(e) => Err(ListenError::Fatal(format!("could not read input: {}", e))),
        }
    }

    fn name(&self) -> &str {
        "keyboard"
    }
}
