use crate::core::instrument::ClearingInstrument;
use crate::core::opportunity::TradeOpportunity;
use crate::core::response::MarketResponseFunction;

/// One participant in a clearing network.
///
/// A node owns the participant's response function and, for each connected
/// edge, the trade opportunity that edge represents plus the cached
/// response to it. Connection indices are assigned in connection order and
/// never change.
///
/// Cache entry `i` is valid only while slot `i` is not pending. Pending
/// slots are recomputed together by [`Node::recompute_pending`], which calls
/// the response function once with every pending index.
pub struct Node<P> {
    id: String,
    object: P,
    response: Box<dyn MarketResponseFunction>,
    opportunities: Vec<TradeOpportunity>,
    responses: Vec<f64>,
    dirty: Vec<bool>,
    pending: Vec<usize>,
}

impl<P> Node<P> {
    pub fn new(id: impl Into<String>, object: P, response: Box<dyn MarketResponseFunction>) -> Self {
        Self {
            id: id.into(),
            object,
            response,
            opportunities: Vec::new(),
            responses: Vec::new(),
            dirty: Vec::new(),
            pending: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn object(&self) -> &P {
        &self.object
    }

    pub fn connection_count(&self) -> usize {
        self.opportunities.len()
    }

    pub fn opportunities(&self) -> &[TradeOpportunity] {
        &self.opportunities
    }

    /// Register a new edge against this node and return its connection
    /// index. The new slot starts at rate zero and pending.
    pub fn connect(&mut self, instrument: ClearingInstrument, counterparty: impl Into<String>) -> usize {
        let index = self.opportunities.len();
        self.opportunities
            .push(TradeOpportunity::new(instrument, 0.0, counterparty));
        self.responses.push(0.0);
        self.dirty.push(false);
        self.flag(index);
        index
    }

    /// Mark slot `index` stale.
    pub fn flag(&mut self, index: usize) {
        if !self.dirty[index] {
            self.dirty[index] = true;
            self.pending.push(index);
        }
    }

    /// Move slot `index` to `rate` and mark it stale.
    pub fn set_rate(&mut self, index: usize, rate: f64) {
        self.opportunities[index].set_rate(rate);
        self.flag(index);
    }

    pub fn rate(&self, index: usize) -> f64 {
        self.opportunities[index].rate()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Recompute every pending slot with one call to the response function.
    pub fn recompute_pending(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let values = self.response.value(&self.pending, &self.opportunities);
        debug_assert_eq!(values.len(), self.pending.len());
        for (&index, value) in self.pending.iter().zip(values) {
            self.responses[index] = value;
            self.dirty[index] = false;
        }
        self.pending.clear();
    }

    /// Recompute every slot, pending or not.
    pub fn update_all(&mut self) {
        for index in 0..self.opportunities.len() {
            self.flag(index);
        }
        self.recompute_pending();
    }

    /// Cached response to slot `index`.
    ///
    /// # Panics
    ///
    /// If the slot is pending recomputation.
    pub fn response_to(&self, index: usize) -> f64 {
        assert!(!self.dirty[index], "response to slot {} read while stale", index);
        self.responses[index]
    }

    pub fn minimum_in_domain(&self) -> f64 {
        self.response.minimum_in_domain()
    }

    pub fn maximum_in_domain(&self) -> f64 {
        self.response.maximum_in_domain()
    }
}

impl<P> std::fmt::Debug for Node<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("opportunities", &self.opportunities)
            .field("responses", &self.responses)
            .field("pending", &self.pending)
            .finish()
    }
}
