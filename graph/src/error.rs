use anyhow::Result;
use colored::Colorize;

use crate::{AccessError, GraphStrings};

/// For re-throwing after we've printed a list of errors to the user.
#[derive(Debug, thiserror::Error)]
#[error("{0} failed due to {1} errors")]
pub struct AggregatedErrors(pub String, pub usize);

/// impl this for errors that rely on graph strings for their message.
/// Errors with no name-based recap fall back to their `Display` text.
pub trait Recap: std::fmt::Debug + std::fmt::Display + Send + Sync {
    fn recap(&self, strings: &GraphStrings) -> Result<Option<String>>;
}

/// Wrap errors in this struct at the call site so they can use the GraphStrings
/// object in the recap.
#[derive(Debug, thiserror::Error)]
#[error("{e}")]
pub struct Recapper {
    e: Box<dyn Recap>,
}

impl Recapper {
    pub fn new(e: impl Recap + 'static) -> Self {
        Self { e: Box::new(e) }
    }
}

impl Recap for AccessError {
    fn recap(&self, strings: &GraphStrings) -> Result<Option<String>> {
        match self {
            Self::ComponentNotFound(id) => Ok(Some(format!(
                "Component '{}' not found in graph store",
                strings.component(*id)?
            ))),
            Self::StepNotFound(id) => Ok(Some(format!(
                "Step '{}' not found in graph store",
                strings.step(*id)?
            ))),
            _ => Ok(None),
        }
    }
}

/// Collects non-fatal errors and warnings so a run can report all of them at the end.
pub struct Errors {
    errors: Vec<anyhow::Error>,
    warnings: Vec<String>,
}

impl Default for Errors {
    fn default() -> Self {
        Self {
            // ideally we won't have any,
            // and we don't mind reallocating if we're already in an error state:
            errors: Vec::with_capacity(0),
            warnings: Vec::with_capacity(0),
        }
    }
}

impl Errors {
    pub fn add_context(&mut self, e: anyhow::Error, msg: String) {
        log::trace!("{msg}: {e:?}");
        self.errors.push(e.context(msg));
    }

    pub fn add(&mut self, e: anyhow::Error) {
        log::trace!("error: {e:?}");
        self.errors.push(e);
    }

    /// Record a warning; it is logged immediately and listed again in the recap.
    pub fn warn(&mut self, msg: String) {
        log::warn!("{msg}");
        self.warnings.push(msg);
    }

    #[inline]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    #[inline]
    pub fn num_errors(&self) -> usize {
        self.errors.len()
    }

    #[inline]
    pub fn num_warnings(&self) -> usize {
        self.warnings.len()
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Print full list of warnings and errors to stderr, fail w/ an aggregated error
    /// if there were one or more errors.
    pub fn print_recap(&self, label: &str, strings: &GraphStrings) -> Result<()> {
        if !self.warnings.is_empty() {
            eprintln!(
                "\n{} {} {}",
                self.warnings.len().to_string().yellow(),
                "warnings while".yellow(),
                label.yellow()
            );
            for w in &self.warnings {
                eprintln!("{}: {}", "WARNING".yellow(), w);
            }
        }
        if self.errors.is_empty() {
            Ok(())
        } else {
            eprintln!("\n{} {}:\n", "Encountered errors while".red(), label.red());
            for e in &self.errors {
                use anyhow::Context;
                recap(e, strings).context("Unable to print error list due to errors while printing")?;
            }
            Err(AggregatedErrors(label.to_owned(), self.errors.len()).into())
        }
    }
}

fn recap(e: &anyhow::Error, strings: &GraphStrings) -> Result<()> {
    eprint!("{}: ", "ERROR".red());

    handle_recapper_anyhow(e, strings)?;
    for cause in e.chain().skip(1) {
        eprint!("\nCaused by:\n\t");
        handle_recapper_dyn(cause, strings)?;
    }
    eprintln!();
    Ok(())
}

// both anyhow::Error and std Error have a fn called `downcast_ref`, but they aren't the
// same method, so we need two fns to handle them.
fn handle_recapper_dyn(
    e: &(dyn std::error::Error + 'static),
    strings: &GraphStrings,
) -> Result<()> {
    if let Some(recapper) = e.downcast_ref::<Recapper>() {
        if let Some(msg) = recapper.e.recap(strings)? {
            eprintln!("{}", msg);
            return Ok(());
        }
    }
    eprintln!("{}", e);
    Ok(())
}

fn handle_recapper_anyhow(e: &anyhow::Error, strings: &GraphStrings) -> Result<()> {
    if let Some(recapper) = e.downcast_ref::<Recapper>() {
        if let Some(msg) = recapper.e.recap(strings)? {
            eprintln!("{}", msg);
            return Ok(());
        }
    }
    eprintln!("{}", e);
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use intern::InternStr;

    #[test]
    fn test_recap_fails_only_with_errors() -> Result<()> {
        let mut strings = GraphStrings::default();
        let wf = strings.components.intern("p/wf.cwl")?;

        let mut errors = Errors::default();
        errors.warn("edge has no legitimate scope".to_owned());
        assert!(errors.print_recap("loading graph", &strings).is_ok());

        errors.add(Recapper::new(AccessError::ComponentNotFound(wf)).into());
        let e = errors.print_recap("loading graph", &strings).unwrap_err();
        let agg = e.downcast_ref::<AggregatedErrors>().unwrap();
        assert_eq!(1, agg.1);
        Ok(())
    }

    #[test]
    fn test_access_error_recap_uses_names() -> Result<()> {
        let mut strings = GraphStrings::default();
        let wf = strings.components.intern("p/wf.cwl")?;
        let msg = AccessError::ComponentNotFound(wf).recap(&strings)?;
        assert_eq!(Some("Component 'p/wf.cwl' not found in graph store".to_owned()), msg);
        assert_eq!(None, AccessError::Unavailable("down".into()).recap(&strings)?);
        Ok(())
    }

    #[test]
    fn test_recapper_without_recap_shows_message() {
        let e = Recapper::new(AccessError::RetriesExhausted(3, "store down".to_owned()));
        assert_eq!(
            "Graph store still unavailable after 3 attempts: store down",
            e.to_string()
        );
    }
}
