use super::{JsonArchive, ResultsArchive};
use crate::error::{IvolError, Result};
use std::path::Path;

/// The archives used by one run.
///
/// Pre-conditioning results may live in a separate archive from the cyclic
/// results; when no secondary archive is given the primary serves both
/// roles. Both handles are released by `close` or, failing that, on drop.
pub struct ArchiveSession {
    primary: Box<dyn ResultsArchive>,
    secondary: Option<Box<dyn ResultsArchive>>,
    closed: bool,
}

impl ArchiveSession {
    pub fn new(
        primary: Box<dyn ResultsArchive>,
        secondary: Option<Box<dyn ResultsArchive>>,
    ) -> Self {
        Self {
            primary,
            secondary,
            closed: false,
        }
    }

    pub fn open<P: AsRef<Path>>(primary_path: P, secondary_path: Option<P>) -> Result<Self> {
        let primary: Box<dyn ResultsArchive> = Box::new(JsonArchive::open(primary_path)?);

        let secondary = match secondary_path {
            Some(path) => match JsonArchive::open(path) {
                Ok(archive) => Some(Box::new(archive) as Box<dyn ResultsArchive>),
                Err(e) => {
                    let mut primary = primary;
                    let _ = primary.close();
                    return Err(e);
                }
            },
            None => None,
        };

        Ok(Self::new(primary, secondary))
    }

    pub fn primary(&self) -> &dyn ResultsArchive {
        self.primary.as_ref()
    }

    /// Archive holding the pre-conditioning step
    pub fn conditioning(&self) -> &dyn ResultsArchive {
        self.secondary.as_deref().unwrap_or(self.primary.as_ref())
    }

    pub fn has_separate_conditioning(&self) -> bool {
        self.secondary.is_some()
    }

    /// Checks step and part-instance names in the order the run depends on them
    pub fn validate(
        &self,
        part_instance: &str,
        conditioning_step: &str,
        cyclic_step: &str,
        assembly_sentinel: &str,
    ) -> Result<()> {
        self.conditioning().validate_step(conditioning_step, true)?;
        self.primary().validate_step(cyclic_step, false)?;
        self.primary()
            .validate_instance(part_instance, assembly_sentinel)?;
        self.conditioning()
            .validate_instance(part_instance, assembly_sentinel)?;
        Ok(())
    }

    /// Closes every handle once. A failure to close the secondary archive
    /// does not fail the run; it is handed back for the caller to report.
    pub fn close(&mut self) -> Result<Option<IvolError>> {
        if self.closed {
            return Ok(None);
        }
        self.closed = true;

        let secondary_failure = match self.secondary {
            Some(ref mut secondary) => secondary.close().err(),
            None => None,
        };
        self.primary.close()?;
        Ok(secondary_failure)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for ArchiveSession {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
