use meridian_core::InstrumentId;

/// Port for the liquidity/eligibility filter collaborator.
///
/// The portfolio constructor drops ineligible instruments from both baskets
/// before ranking. What makes a name eligible (liquidity, borrow
/// availability, exchange halts) is the collaborator's concern.
pub trait UniverseFilter: Send + Sync {
    fn is_eligible(&self, instrument_id: &InstrumentId) -> bool;
}

/// Default filter: every instrument is eligible
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl UniverseFilter for AcceptAll {
    fn is_eligible(&self, _instrument_id: &InstrumentId) -> bool {
        true
    }
}
