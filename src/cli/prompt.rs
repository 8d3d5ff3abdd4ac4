use std::io::{BufRead, BufReader, Stderr, Stdin, Write};
use std::sync::Mutex;

use crate::cli::commands::format_ranked;
use crate::domain::RankedCandidate;
use crate::resolver::Chooser;

/// Writes the prompt to `output` and reads the answer from `input`.
///
/// A prompt that cannot be written counts as cancelled.
pub struct PromptChooser<R, W = Stderr> {
    input: Mutex<R>,
    output: Mutex<W>,
}

impl PromptChooser<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(std::io::stdin()), std::io::stderr())
    }
}

impl<R: BufRead, W: Write> PromptChooser<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input: Mutex::new(input),
            output: Mutex::new(output),
        }
    }
}

impl<R: BufRead + Send, W: Write + Send> Chooser for PromptChooser<R, W> {
    fn choose(&self, ranked: &[RankedCandidate]) -> Option<usize> {
        let mut input = self.input.lock().ok()?;
        let mut output = self.output.lock().ok()?;

        for entry in ranked {
            writeln!(output, "{}", format_ranked(entry)).ok()?;
        }

        loop {
            write!(output, "Select 1-{} (empty to cancel): ", ranked.len()).ok()?;
            output.flush().ok()?;

            let mut line = String::new();
            match input.read_line(&mut line) {
                Ok(0) | Err(_) => return None,
                Ok(_) => {}
            }

            let answer = line.trim();
            if answer.is_empty() || answer.eq_ignore_ascii_case("q") {
                return None;
            }
            match answer.parse::<usize>() {
                Ok(n) if (1..=ranked.len()).contains(&n) => return Some(n - 1),
                _ => writeln!(output, "Not a choice: {answer}").ok()?,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EpisodeCandidate;
    use std::io::Cursor;

    fn ranked(n: usize) -> Vec<RankedCandidate> {
        (0..n)
            .map(|i| RankedCandidate {
                rank: i + 1,
                score: 1.0,
                reasons: vec![],
                candidate: EpisodeCandidate::new(format!("Episode {i}"), i),
            })
            .collect()
    }

    /// Output that refuses every write.
    struct Closed;

    impl Write for Closed {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn chooser(answers: &str) -> PromptChooser<Cursor<String>, Vec<u8>> {
        PromptChooser::new(Cursor::new(answers.to_string()), Vec::new())
    }

    #[test]
    fn test_reprompts_until_valid() {
        let chooser = chooser("x\n9\n2\n");
        assert_eq!(chooser.choose(&ranked(3)), Some(1));

        let shown = String::from_utf8(chooser.output.lock().unwrap().clone()).unwrap();
        assert!(shown.contains("Episode 2"));
        assert!(shown.contains("Not a choice: x"));
        assert!(shown.contains("Not a choice: 9"));
    }

    #[test]
    fn test_empty_or_eof_cancels() {
        assert_eq!(chooser("\n").choose(&ranked(2)), None);
        assert_eq!(chooser("").choose(&ranked(2)), None);
        assert_eq!(chooser("q\n").choose(&ranked(2)), None);
    }

    #[test]
    fn test_unwritable_prompt_cancels() {
        let chooser = PromptChooser::new(Cursor::new("1\n"), Closed);
        assert_eq!(chooser.choose(&ranked(2)), None);
    }
}
