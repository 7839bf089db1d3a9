use mc_core::McError;
use tracing::debug;

use crate::layout::OutputLayout;
use crate::results::ResultsStore;

/// Where a drive restarts and which existing artefacts it will overwrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumePlan {
    /// First condition index that still needs computing. Equal to the
    /// sequence length when every condition is complete.
    pub start: usize,
    /// Indices at or after `start` that already have a conditions directory.
    pub repeats: Vec<usize>,
}

impl ResumePlan {
    /// `true` if nothing is left to compute.
    pub fn is_complete(&self, len: usize) -> bool {
        self.start >= len
    }
}

/// Finds the first condition that must be (re)computed and truncates every
/// store so it only holds entries below that index.
///
/// Condition `i` counts as complete for a store only if the store holds an
/// entry for it and `conditions.<i>/final_state.json` exists. An enabled store
/// whose file is missing marks everything incomplete. The resume index is the
/// smallest count over all stores.
pub fn find_starting_conditions(
    layout: &OutputLayout,
    stores: &mut [Box<dyn ResultsStore>],
    len: usize,
) -> Result<ResumePlan, McError> {
    let mut start = len;
    for store in stores.iter() {
        let candidate = if store.exists() {
            let entries = store.len()?;
            (0..entries.min(len))
                .take_while(|index| layout.final_state(*index).exists())
                .count()
        } else {
            0
        };
        debug!(
            format = store.format().as_str(),
            candidate, "resume candidate from results store"
        );
        start = start.min(candidate);
    }

    for store in stores.iter_mut() {
        if store.exists() {
            store.truncate(start)?;
        }
    }

    let repeats = (start..len)
        .filter(|index| layout.conditions_dir(*index).exists())
        .collect();
    Ok(ResumePlan { start, repeats })
}
