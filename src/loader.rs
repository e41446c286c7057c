//! The loader contract and the defaults-only loader.

use crate::error::ConfError;
use crate::field::Record;
use crate::schema::Schema;
use crate::source::EmptySource;
use crate::types::WriteMode;
use crate::walk::{self, Assignment};

/// Per-run context handed to a loader.
#[derive(Debug, Clone, Copy)]
pub struct Pass<'a> {
    pub schema: &'a Schema,
    pub mode: WriteMode,
}

impl<'a> Pass<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            mode: WriteMode::Overlay,
        }
    }

    pub fn with_mode(self, mode: WriteMode) -> Self {
        Self { mode, ..self }
    }
}

/// Binds one source to the population algorithm.
///
/// A loader reads its source when [`populate`](Loader::populate) runs and
/// writes only the fields it has evidence for. It keeps no state between runs.
pub trait Loader {
    /// Identity used in errors and load reports.
    fn name(&self) -> &str;

    fn populate(&self, target: &mut dyn Record, pass: &Pass<'_>) -> Result<Vec<Assignment>, ConfError>;

    /// Populate `target` in overlay mode.
    fn load<R: Record + 'static>(&self, target: &mut R) -> Result<Vec<Assignment>, ConfError>
    where
        Self: Sized,
    {
        let schema = Schema::of::<R>()?;
        self.populate(target, &Pass::new(&schema))
    }
}

impl<L: Loader + ?Sized> Loader for Box<L> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn populate(&self, target: &mut dyn Record, pass: &Pass<'_>) -> Result<Vec<Assignment>, ConfError> {
        (**self).populate(target, pass)
    }
}

/// Applies declared defaults and nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultsLoader;

impl Loader for DefaultsLoader {
    fn name(&self) -> &str {
        "defaults"
    }

    fn populate(&self, target: &mut dyn Record, pass: &Pass<'_>) -> Result<Vec<Assignment>, ConfError> {
        walk::populate(target, pass.schema, &EmptySource, pass.mode)
    }
}
