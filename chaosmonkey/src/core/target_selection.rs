//! Resolution of an on-demand request's target set

use rand::seq::SliceRandom;
use rand::Rng;

use shared::{ActionArguments, SharedError};

use crate::core::ProcessRef;
use crate::error::ChaosResult;

/// Pick the processes an on-demand disruption applies to
///
/// Explicit `nodes` select by address and must all belong to the service.
/// `count` and `percentage` sample at random; a percentage is rounded up so
/// it never selects zero processes. With no selector every process is used.
pub fn select_targets<R>(processes: &[ProcessRef], args: &ActionArguments, rng: &mut R) -> ChaosResult<Vec<ProcessRef>>
where
    R: Rng + ?Sized,
{
    args.validate()?;

    if let Some(ref nodes) = args.nodes {
        let mut selected = Vec::with_capacity(nodes.len());
        for node in nodes {
            let process = processes.iter().find(|p| &p.address() == node).ok_or_else(|| SharedError::InvalidArgument {
                field: "nodes".to_string(),
                value: node.clone(),
            })?;
            if !selected.iter().any(|p: &ProcessRef| p.address() == *node) {
                selected.push(process.clone());
            }
        }
        return Ok(selected);
    }

    let wanted = match (args.count, args.percentage) {
        (Some(count), _) => count.min(processes.len()),
        (None, Some(percentage)) => {
            let share = (processes.len() as f64 * percentage / 100.0).ceil() as usize;
            share.min(processes.len())
        }
        (None, None) => return Ok(processes.to_vec()),
    };

    Ok(processes.choose_multiple(rng, wanted).cloned().collect())
}
