use super::{PanelDescriptor, preset};
use crate::error::ChartError;
use indexmap::IndexMap;
use smol_str::SmolStr;
use tracing::{debug, error, info};

/// Validated [`PanelDescriptor`]s by name, in insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PanelRegistry {
    panels: IndexMap<SmolStr, PanelDescriptor>,
}

impl PanelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in preset.
    pub fn with_presets() -> Self {
        let mut registry = Self::new();
        for descriptor in preset::presets() {
            if let Err(error) = registry.insert(descriptor) {
                error!(%error, "invalid built-in panel preset");
            }
        }
        registry
    }

    /// Validate and insert the provided [`PanelDescriptor`], replacing any panel of the same
    /// name.
    pub fn insert(&mut self, descriptor: PanelDescriptor) -> Result<(), ChartError> {
        descriptor.validate()?;

        if let Some(replaced) = self.panels.insert(descriptor.name.clone(), descriptor) {
            debug!(panel = %replaced.name, "replaced panel descriptor");
        }

        Ok(())
    }

    /// Decode a JSON array of descriptors and insert each of them. Nothing is inserted if any
    /// descriptor fails to decode or validate.
    pub fn extend_from_json(&mut self, input: &str) -> Result<usize, ChartError> {
        let descriptors = serde_json::from_str::<Vec<PanelDescriptor>>(input)?;

        descriptors
            .iter()
            .try_for_each(PanelDescriptor::validate)?;

        let count = descriptors.len();
        for descriptor in descriptors {
            self.insert(descriptor)?;
        }

        info!(count, total = self.len(), "loaded panel descriptors");
        Ok(count)
    }

    pub fn get(&self, name: &str) -> Result<&PanelDescriptor, ChartError> {
        self.panels
            .get(name)
            .ok_or_else(|| ChartError::UnknownPanel(SmolStr::new(name)))
    }

    /// Panel names in insertion order.
    pub fn names(&self) -> Vec<SmolStr> {
        self.panels.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }
}
