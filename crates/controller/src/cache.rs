use std::collections::HashMap;

use adc_common::{is_managed, RemoteDefinition};

use crate::remote::{RemoteError, RemoteGateway};

#[derive(Debug, Default)]
pub struct RemoteCache {
    entries: HashMap<String, RemoteDefinition>,
}

impl RemoteCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn refresh(&mut self, remote: &dyn RemoteGateway) -> Result<usize, RemoteError> {
        let listed = remote.list_definitions().await?;
        self.entries = listed
            .into_iter()
            .filter(|def| is_managed(&def.name))
            .map(|def| (def.id.clone(), def))
            .collect();
        Ok(self.entries.len())
    }

    pub fn get(&self, id: &str) -> Option<&RemoteDefinition> {
        self.entries.get(id)
    }

    pub fn put(&mut self, id: String, def: RemoteDefinition) {
        self.entries.insert(id, def);
    }

    pub fn remove(&mut self, id: &str) -> Option<RemoteDefinition> {
        self.entries.remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RemoteDefinition)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
