//! Lemmatizer backends
//!
//! A [`Lemmatizer`] annotates the tokens of one sentence with a part of
//! speech and a lemma. It must return exactly one [`Token`] per input token,
//! in input order; the processor checks this and falls back to
//! [`PassThroughLemmatizer`] for the sentence when it does not hold.

use crate::error::LemmatizerError;
use pagecorpus_core::serializer::vertical::parse_token_line;
use pagecorpus_core::{Token, POS_PUNCT};
use std::io::{self, ErrorKind, Write};
use std::process::{Command, Stdio};
use std::thread;

/// Characters that make up a punctuation token
pub const PASSTHROUGH_PUNCTUATION: &str = ".,;:!?()[]«»“”\"'„‟⁊-–—";

/// Morphological annotation of one sentence
pub trait Lemmatizer: Send + Sync {
    /// Annotate `tokens`, one output token per input token, in order
    ///
    /// # Errors
    ///
    /// Returns a [`LemmatizerError`] when the backend fails on this sentence.
    fn lemmatize(&self, tokens: &[String]) -> Result<Vec<Token>, LemmatizerError>;

    /// Backend name, for logs
    fn name(&self) -> &str;
}

/// Annotation without analysis
///
/// Punctuation-only tokens get `PUNCT` with the word as lemma, every other
/// token gets `UNK` with the lowercased word as lemma.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PassThroughLemmatizer;

impl PassThroughLemmatizer {
    /// Create a pass-through lemmatizer
    #[inline]
    #[must_use = "creates a lemmatizer"]
    pub const fn new() -> Self {
        Self
    }

    /// Annotate a single token
    #[must_use]
    pub fn annotate(word: &str) -> Token {
        if is_punctuation_only(word) {
            Token::new(word, POS_PUNCT, word)
        } else {
            Token::passthrough(word)
        }
    }

    /// Annotate every token; never fails
    #[must_use]
    pub fn annotate_all(tokens: &[String]) -> Vec<Token> {
        tokens.iter().map(|t| Self::annotate(t)).collect()
    }
}

impl Lemmatizer for PassThroughLemmatizer {
    fn lemmatize(&self, tokens: &[String]) -> Result<Vec<Token>, LemmatizerError> {
        Ok(Self::annotate_all(tokens))
    }

    fn name(&self) -> &str {
        "passthrough"
    }
}

/// True when `word` is non-empty and made only of punctuation characters
#[must_use]
pub fn is_punctuation_only(word: &str) -> bool {
    !word.is_empty() && word.chars().all(|c| PASSTHROUGH_PUNCTUATION.contains(c))
}

/// External tagger driven over stdin/stdout
///
/// The command is run once per sentence. It receives one token per line and
/// must print one `word\tpos\tlemma` line per token (TreeTagger's output
/// layout). Lines with fewer fields are completed the way the vertical
/// parser completes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggerProcess {
    program: String,
    args: Vec<String>,
}

impl TaggerProcess {
    /// Tagger run as `program` without arguments
    #[inline]
    #[must_use = "creates a tagger process"]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Pass `args` to the tagger
    #[must_use = "returns a tagger process with arguments"]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Program being run
    #[inline]
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    fn run(&self, input: String) -> Result<String, LemmatizerError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Written from another thread so a tagger that streams its output
        // cannot block on a full stdout pipe.
        let writer = child.stdin.take().map(|mut stdin| {
            thread::spawn(move || -> io::Result<()> {
                stdin.write_all(input.as_bytes())?;
                stdin.flush()
            })
        });

        let output = child.wait_with_output()?;
        if let Some(handle) = writer {
            match handle.join() {
                // A tagger may close stdin early; its status and output are
                // checked below.
                Ok(Err(e)) if e.kind() == ErrorKind::BrokenPipe => {
                    log::debug!("{} closed stdin early", self.program);
                }
                Ok(result) => result?,
                Err(_) => {
                    return Err(io::Error::other("tagger stdin writer panicked").into());
                }
            }
        }

        if !output.status.success() {
            return Err(LemmatizerError::Process {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Lemmatizer for TaggerProcess {
    fn lemmatize(&self, tokens: &[String]) -> Result<Vec<Token>, LemmatizerError> {
        if tokens.is_empty() {
            return Ok(Vec::new());
        }
        let mut input = tokens.join("\n");
        input.push('\n');

        let stdout = self.run(input)?;
        let annotated: Vec<Token> = stdout
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.trim().is_empty())
            .map(parse_token_line)
            .collect();

        if annotated.len() != tokens.len() {
            return Err(LemmatizerError::CountMismatch {
                expected: tokens.len(),
                actual: annotated.len(),
            });
        }
        Ok(annotated)
    }

    fn name(&self) -> &str {
        &self.program
    }
}
