use crate::block::BlockPath;
use crate::error::DecisionError;
use ahash::AHashMap;
use std::fmt;
use std::io::{self, BufRead, Stdin, StdinLock, Stdout, Write};

/// Answers the yes/no questions the change detector cannot settle on its own.
pub trait DecisionSource {
    fn confirm_rename(&mut self, old_path: &BlockPath, new_path: &BlockPath)
    -> Result<bool, DecisionError>;

    fn confirm_removal(&mut self, old_path: &BlockPath) -> Result<bool, DecisionError>;
}

impl<Q: DecisionSource + ?Sized> DecisionSource for &mut Q {
    fn confirm_rename(
        &mut self,
        old_path: &BlockPath,
        new_path: &BlockPath,
    ) -> Result<bool, DecisionError> {
        (**self).confirm_rename(old_path, new_path)
    }

    fn confirm_removal(&mut self, old_path: &BlockPath) -> Result<bool, DecisionError> {
        (**self).confirm_removal(old_path)
    }
}

/// Says yes to everything. For unattended pipelines.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl DecisionSource for AlwaysConfirm {
    fn confirm_rename(&mut self, _: &BlockPath, _: &BlockPath) -> Result<bool, DecisionError> {
        Ok(true)
    }

    fn confirm_removal(&mut self, _: &BlockPath) -> Result<bool, DecisionError> {
        Ok(true)
    }
}

/// Says no to everything; only confident renames get through.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverConfirm;

impl DecisionSource for NeverConfirm {
    fn confirm_rename(&mut self, _: &BlockPath, _: &BlockPath) -> Result<bool, DecisionError> {
        Ok(false)
    }

    fn confirm_removal(&mut self, _: &BlockPath) -> Result<bool, DecisionError> {
        Ok(false)
    }
}

/// One question put to a decision source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Question {
    Rename { old_path: BlockPath, new_path: BlockPath },
    Removal { old_path: BlockPath },
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Question::Rename { old_path, new_path } => {
                write!(f, "Was '{}' renamed to '{}'?", old_path, new_path)
            }
            Question::Removal { old_path } => write!(f, "Was '{}' removed?", old_path),
        }
    }
}

/// Replays prepared answers and keeps a transcript of every question asked.
#[derive(Debug, Clone, Default)]
pub struct RecordedDecisions {
    answers: AHashMap<Question, bool>,
    default: Option<bool>,
    asked: Vec<Question>,
}

impl RecordedDecisions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rename(mut self, old_path: &str, new_path: &str, answer: bool) -> Self {
        self.answers.insert(
            Question::Rename {
                old_path: BlockPath::parse(old_path),
                new_path: BlockPath::parse(new_path),
            },
            answer,
        );
        self
    }

    pub fn with_removal(mut self, old_path: &str, answer: bool) -> Self {
        self.answers.insert(
            Question::Removal {
                old_path: BlockPath::parse(old_path),
            },
            answer,
        );
        self
    }

    /// Answer for questions without a prepared answer. Without one they fail as unanswered.
    pub fn with_default(mut self, answer: bool) -> Self {
        self.default = Some(answer);
        self
    }

    pub fn asked(&self) -> &[Question] {
        &self.asked
    }

    fn answer(&mut self, question: Question) -> Result<bool, DecisionError> {
        let answer = self.answers.get(&question).copied().or(self.default);
        let result = answer.ok_or_else(|| DecisionError::Unanswered(question.to_string()));
        self.asked.push(question);
        result
    }
}

impl DecisionSource for RecordedDecisions {
    fn confirm_rename(
        &mut self,
        old_path: &BlockPath,
        new_path: &BlockPath,
    ) -> Result<bool, DecisionError> {
        self.answer(Question::Rename {
            old_path: old_path.clone(),
            new_path: new_path.clone(),
        })
    }

    fn confirm_removal(&mut self, old_path: &BlockPath) -> Result<bool, DecisionError> {
        self.answer(Question::Removal {
            old_path: old_path.clone(),
        })
    }
}

/// Asks a person, writing prompts to `output` and reading `y`/`n` answers from `input`.
/// An empty line means no; anything unrecognised is asked again; end of input aborts.
pub struct InteractiveQuestioner<R, W> {
    input: R,
    output: W,
}

impl InteractiveQuestioner<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        let stdin: Stdin = io::stdin();
        Self::new(stdin.lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> InteractiveQuestioner<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, question: &Question) -> Result<bool, DecisionError> {
        let io_error = |e: io::Error| DecisionError::Io(e.to_string());
        write!(self.output, "{} [y/N] ", question).map_err(io_error)?;
        loop {
            self.output.flush().map_err(io_error)?;

            let mut line = String::new();
            let read = self.input.read_line(&mut line).map_err(io_error)?;
            if read == 0 {
                return Err(DecisionError::Aborted);
            }
            match line.trim().to_ascii_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "" | "n" | "no" => return Ok(false),
                _ => write!(self.output, "Please answer yes or no: ").map_err(io_error)?,
            }
        }
    }
}

impl<R: BufRead, W: Write> DecisionSource for InteractiveQuestioner<R, W> {
    fn confirm_rename(
        &mut self,
        old_path: &BlockPath,
        new_path: &BlockPath,
    ) -> Result<bool, DecisionError> {
        self.ask(&Question::Rename {
            old_path: old_path.clone(),
            new_path: new_path.clone(),
        })
    }

    fn confirm_removal(&mut self, old_path: &BlockPath) -> Result<bool, DecisionError> {
        self.ask(&Question::Removal {
            old_path: old_path.clone(),
        })
    }
}
