//! Named run counters (damage dealt, deaths, removals, draw commands)

/// Counters are kept in first-use order so reports read the same every run.
#[derive(Debug, Default, Clone)]
pub struct Counter {
    entries: Vec<(&'static str, usize)>,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, name: &'static str) -> &mut usize {
        let index = match self.entries.iter().position(|(key, _)| *key == name) {
            Some(index) => index,
            None => {
                self.entries.push((name, 0));
                self.entries.len() - 1
            }
        };
        &mut self.entries[index].1
    }

    pub fn increment(&mut self, name: &'static str, value: usize) {
        let slot = self.slot(name);
        *slot = slot.saturating_add(value);
    }

    /// Overwrite with a gauge-style value.
    pub fn set(&mut self, name: &'static str, value: usize) {
        *self.slot(name) = value;
    }

    pub fn get(&self, name: &'static str) -> usize {
        self.entries
            .iter()
            .find(|(key, _)| *key == name)
            .map_or(0, |&(_, value)| value)
    }

    /// Zero every counter, keeping their order.
    pub fn reset_all(&mut self) {
        for (_, value) in &mut self.entries {
            *value = 0;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, usize)> + '_ {
        self.entries.iter().copied()
    }
}
