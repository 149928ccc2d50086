use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::job::Job;

/// Order jobs so every job comes after all of its dependencies
///
/// Kahn's algorithm. When several jobs are ready the one created first is emitted first, so the
/// same job list always gives the same order.
pub fn topological_order(jobs: &[Rc<Job>]) -> Result<Vec<Rc<Job>>> {
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(jobs.len());
    for (i, job) in jobs.iter().enumerate() {
        if index.insert(job.name(), i).is_some() {
            return Err(Error::DuplicateJob(job.name().to_string()));
        }
    }

    let mut pending = vec![0usize; jobs.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); jobs.len()];
    for (i, job) in jobs.iter().enumerate() {
        for dependency in job.dependencies() {
            let d = *index
                .get(dependency.name())
                .ok_or_else(|| Error::UnorderedJobs(vec![job.name().to_string()]))?;
            pending[i] += 1;
            dependents[d].push(i);
        }
    }

    let mut ready: BTreeSet<usize> = (0..jobs.len()).filter(|&i| pending[i] == 0).collect();
    let mut ordered = Vec::with_capacity(jobs.len());
    while let Some(i) = ready.pop_first() {
        ordered.push(Rc::clone(&jobs[i]));
        for &dependent in &dependents[i] {
            pending[dependent] -= 1;
            if pending[dependent] == 0 {
                ready.insert(dependent);
            }
        }
    }

    if ordered.len() < jobs.len() {
        let stuck = (0..jobs.len())
            .filter(|&i| pending[i] > 0)
            .map(|i| jobs[i].name().to_string())
            .collect();
        return Err(Error::UnorderedJobs(stuck));
    }
    Ok(ordered)
}
