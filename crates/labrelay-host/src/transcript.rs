//! Recognized-text source
//!
//! Speech capture and recognition are external collaborators; the
//! pipeline only ever consumes their textual result through this pull
//! interface. The shipped implementation reads one utterance per line
//! from stdin, which is where the recognition engine pipes its output.

use std::io::{BufRead, BufReader, Stdin};
use thiserror::Error;

/// Failure modes of one recognition pull.
#[derive(Error, Debug)]
pub enum RecognitionError {
    /// Audio produced no usable text; the loop continues
    #[error("Nothing intelligible was heard")]
    Unintelligible,
    /// The recognition service itself failed
    #[error("Recognition service error: {0}")]
    Service(String),
}

/// Synchronous pull of recognized utterances.
///
/// `Ok(None)` means the source is exhausted and the pipeline should
/// shut down.
pub trait TranscriptSource: Send {
    fn next_utterance(&mut self) -> Result<Option<String>, RecognitionError>;
}

/// Line-per-utterance source reading from stdin.
pub struct StdinSource {
    reader: BufReader<Stdin>,
}

impl StdinSource {
    pub fn new() -> Self {
        Self {
            reader: BufReader::new(std::io::stdin()),
        }
    }
}

impl Default for StdinSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TranscriptSource for StdinSource {
    fn next_utterance(&mut self) -> Result<Option<String>, RecognitionError> {
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) => Ok(None),
            Ok(_) => {
                let text = line.trim();
                if text.is_empty() {
                    // Blank line: treat like audio that decoded to nothing
                    Err(RecognitionError::Unintelligible)
                } else {
                    Ok(Some(text.to_string()))
                }
            }
            Err(e) => Err(RecognitionError::Service(e.to_string())),
        }
    }
}

/// Fixed sequence of pulls, for tests.
#[cfg(test)]
pub struct ScriptedSource {
    items: std::vec::IntoIter<Result<String, RecognitionError>>,
}

#[cfg(test)]
impl ScriptedSource {
    pub fn new(items: Vec<Result<String, RecognitionError>>) -> Self {
        Self {
            items: items.into_iter(),
        }
    }
}

#[cfg(test)]
impl TranscriptSource for ScriptedSource {
    fn next_utterance(&mut self) -> Result<Option<String>, RecognitionError> {
        match self.items.next() {
            Some(Ok(text)) => Ok(Some(text)),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }
}
