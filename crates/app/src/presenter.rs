use std::io::{self, Write};

use quiz_core::countdown::is_urgent;
use quiz_core::{FinalReport, Reveal};
use services::{ErrorKind, RenderInstruction};

/// Line-oriented renderer for controller output.
pub struct TerminalPresenter<W: Write> {
    out: W,
    options: Vec<String>,
    advance_enabled: bool,
}

impl<W: Write> TerminalPresenter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            options: Vec::new(),
            advance_enabled: false,
        }
    }

    pub fn advance_enabled(&self) -> bool {
        self.advance_enabled
    }

    pub fn render(&mut self, instructions: &[RenderInstruction]) -> io::Result<()> {
        for instruction in instructions {
            self.render_one(instruction)?;
        }
        self.out.flush()
    }

    pub fn hint(&mut self) -> io::Result<()> {
        writeln!(
            self.out,
            "keys: 1-9 answer, n next, r restart, s new quiz, q quit"
        )?;
        self.out.flush()
    }

    fn render_one(&mut self, instruction: &RenderInstruction) -> io::Result<()> {
        match instruction {
            RenderInstruction::ShowProgress(progress) => writeln!(
                self.out,
                "\nQuestion {}/{} [{:>3}%]",
                progress.current_one_based, progress.total, progress.percent
            ),
            RenderInstruction::RenderQuestion { text, options } => {
                writeln!(self.out, "{text}")?;
                for (index, option) in options.iter().enumerate() {
                    writeln!(self.out, "  {}) {option}", index + 1)?;
                }
                self.options.clone_from(options);
                Ok(())
            }
            RenderInstruction::ShowTick { seconds_remaining } => {
                if is_urgent(*seconds_remaining) {
                    writeln!(self.out, "  !! {seconds_remaining}s left")
                } else {
                    writeln!(self.out, "  {seconds_remaining}s left")
                }
            }
            RenderInstruction::RevealAnswer(reveal) => self.reveal(*reveal),
            RenderInstruction::SetAdvanceEnabled(enabled) => {
                self.advance_enabled = *enabled;
                if *enabled {
                    writeln!(self.out, "Press n to continue.")?;
                }
                Ok(())
            }
            RenderInstruction::ShowFinalReport(report) => self.final_report(*report),
            RenderInstruction::ShowError { kind, message } => {
                writeln!(self.out, "{}: {message}", error_label(*kind))
            }
        }
    }

    fn reveal(&mut self, reveal: Reveal) -> io::Result<()> {
        let answer = self
            .options
            .get(reveal.correct_index)
            .map_or("?", String::as_str);
        match reveal.selected {
            Some(_) if reveal.is_correct => writeln!(self.out, "Correct! {answer}"),
            Some(selected) => {
                let picked = self.options.get(selected).map_or("?", String::as_str);
                writeln!(self.out, "Wrong: {picked}. The answer was {answer}.")
            }
            None => writeln!(self.out, "Time's up! The answer was {answer}."),
        }
    }

    fn final_report(&mut self, report: FinalReport) -> io::Result<()> {
        writeln!(self.out, "\nQuiz complete: {}/{}", report.score, report.total)?;
        if report.is_new_high_score {
            writeln!(self.out, "New high score: {}!", report.displayed_high_score)?;
        } else {
            writeln!(self.out, "High score: {}", report.displayed_high_score)?;
        }
        writeln!(self.out, "Press r to play again or q to quit.")
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

fn error_label(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Configuration => "configuration error",
        ErrorKind::InsufficientQuestions => "not enough questions",
        ErrorKind::SourceUnavailable => "question source unavailable",
        ErrorKind::Storage => "could not save high score",
    }
}
