use std::fmt;

/// What happened to one input file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Processed; the string describes the result (e.g. "photo.jpg -> 180 KB")
    Done(String),
    /// Skipped or failed, with the reason
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub name: String,
    pub outcome: Outcome,
}

impl FileOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Done(_))
    }
}

/// Aggregate of per-file outcomes for one batch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub title: String,
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            outcomes: Vec::new(),
        }
    }

    pub fn record_done(&mut self, name: impl Into<String>, detail: impl Into<String>) {
        self.outcomes.push(FileOutcome {
            name: name.into(),
            outcome: Outcome::Done(detail.into()),
        });
    }

    pub fn record_failure(&mut self, name: impl Into<String>, reason: impl Into<String>) {
        self.outcomes.push(FileOutcome {
            name: name.into(),
            outcome: Outcome::Failed(reason.into()),
        });
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== {} ===", self.title)?;
        if self.outcomes.is_empty() {
            return writeln!(f, "No input files.");
        }
        for outcome in &self.outcomes {
            match &outcome.outcome {
                Outcome::Done(detail) => writeln!(f, "  ok    {}", detail)?,
                Outcome::Failed(reason) => writeln!(f, "  FAIL  {}: {}", outcome.name, reason)?,
            }
        }
        writeln!(
            f,
            "{} succeeded, {} failed",
            self.succeeded(),
            self.failed()
        )
    }
}
