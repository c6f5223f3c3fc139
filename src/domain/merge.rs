//! Pure reconciliation of the two extraction phases.
//!
//! Phase 1 (avis) and phase 2 (deep analysis) finish at different times
//! and are stored separately on the tender record. The functions here
//! derive the single coherent view the UI renders, and classify where a
//! record sits in the pipeline. Nothing in this module mutates phase
//! metadata.

use std::collections::HashMap;

use crate::domain::models::tender::{Lot, LotDeepData, Tender, TenderStatus};

/// One display-ready lot: the phase-1 base with its phase-2 deep data
/// attached when the lot numbers correlate.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedLot<'a> {
    pub lot: &'a Lot,
    pub deep: Option<&'a LotDeepData>,
}

/// Attach deep data to avis lots by `lot_number`.
///
/// The output has exactly the length and order of `avis_lots`. A deep
/// record whose `lot_number` matches no avis lot is dropped; lots
/// without a number never correlate. When the server reports duplicate
/// deep records for one number, the first one wins. Linear in the
/// combined input size.
pub fn merge_lots<'a>(avis_lots: &'a [Lot], deep_lots: &'a [LotDeepData]) -> Vec<MergedLot<'a>> {
    let mut by_number: HashMap<&str, &'a LotDeepData> = HashMap::with_capacity(deep_lots.len());
    for deep in deep_lots {
        if let Some(number) = deep.lot_number.as_deref() {
            by_number.entry(number).or_insert(deep);
        }
    }

    avis_lots
        .iter()
        .map(|lot| MergedLot {
            lot,
            deep: lot
                .lot_number
                .as_deref()
                .and_then(|number| by_number.get(number).copied()),
        })
        .collect()
}

/// Whether phase-2 results exist for this tender. True as soon as
/// `universal_metadata` is present, even with an empty lot list.
pub fn has_deep_data(tender: &Tender) -> bool {
    tender.universal_metadata.is_some()
}

/// Whether a freshly loaded record should kick off deep analysis on its
/// own. This is the single authority for the auto-trigger: only LISTED
/// tenders without deep data qualify — never PENDING (not yet scraped),
/// never ERROR, and never again once phase 2 data exists.
pub fn should_auto_analyze(tender: &Tender) -> bool {
    tender.status == TenderStatus::Listed && tender.universal_metadata.is_none()
}
