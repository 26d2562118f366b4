use crc32fast::Hasher;

/// Seed for the node ids of one component, derived from its id with CRC32
pub fn get_component_seed(component_id: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(component_id.as_bytes());
    format!("{:08x}", hasher.finalize())
}

/// Sequential node id generator scoped to one component
#[derive(Clone, Debug)]
pub struct IDGenerator {
    seed: String,
    count: u32,
}

impl IDGenerator {
    pub fn new(component_id: &str) -> Self {
        Self {
            seed: get_component_seed(component_id),
            count: 0,
        }
    }

    pub fn from_seed(seed: String) -> Self {
        Self { seed, count: 0 }
    }

    /// Generate next sequential ID
    pub fn new_id(&mut self) -> String {
        self.count += 1;
        format!("{}-{}", self.seed, self.count)
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }
}
