use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::error::{Error, Result};
use crate::job::artifact::ArtifactKey;
use crate::job::Job;

/// Maps each artifact to the job producing it
///
/// A registry lives for one dataset's generation. Keys are write-once: there is no update or
/// removal, and registering a second producer for a key is an error.
#[derive(Debug, Default)]
pub struct DependencyRegistry {
    producers: HashMap<ArtifactKey, Rc<Job>>,
}

impl DependencyRegistry {
    pub fn new() -> Self {
        DependencyRegistry::default()
    }

    pub fn register(&mut self, key: ArtifactKey, job: Rc<Job>) -> Result<()> {
        if let Some(existing) = self.producers.get(&key) {
            return Err(Error::DuplicateProducer {
                key,
                job: existing.name().to_string(),
                duplicate: job.name().to_string(),
            });
        }
        debug!("Registered {} as producer of {}", job.name(), key);
        self.producers.insert(key, job);
        Ok(())
    }

    pub fn lookup(&self, key: &ArtifactKey) -> Result<Rc<Job>> {
        self.producers
            .get(key)
            .cloned()
            .ok_or_else(|| Error::MissingProducer(key.clone()))
    }
}
