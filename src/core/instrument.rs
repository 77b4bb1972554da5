use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identity of a tradable resource: the market it clears in, and the name
/// of the resource within that market.
///
/// Instruments compare by value and are used as edge and subnetwork keys.
///
/// # Examples
///
/// ```
/// use mixed_clearing::core::instrument::ClearingInstrument;
///
/// let bonds = ClearingInstrument::new("Gilts Market", "Bond");
/// let loans = ClearingInstrument::new("Gilts Market", "Commercial Loan");
/// assert_ne!(bonds, loans);
/// assert_eq!(bonds.uuid(), ClearingInstrument::new("Gilts Market", "Bond").uuid());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClearingInstrument {
    market: String,
    resource: String,
}

impl ClearingInstrument {
    pub fn new(market: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            market: market.into(),
            resource: resource.into(),
        }
    }

    pub fn market(&self) -> &str {
        &self.market
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Stable identifier derived from the market and resource names.
    ///
    /// The same `(market, resource)` pair always yields the same identifier,
    /// across sessions and across processes.
    pub fn uuid(&self) -> Uuid {
        let mut name = Vec::with_capacity(self.market.len() + self.resource.len() + 1);
        name.extend_from_slice(self.market.as_bytes());
        name.push(0x1f);
        name.extend_from_slice(self.resource.as_bytes());
        Uuid::new_v5(&Uuid::NAMESPACE_OID, &name)
    }
}

impl fmt::Display for ClearingInstrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.market, self.resource)
    }
}
