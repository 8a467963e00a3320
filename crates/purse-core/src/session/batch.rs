use crate::backend::ProductQuery;
use crate::error::{PurseError, Result};
use crate::model::ProductKind;

/// Pairs parallel id/kind lists into a query batch.
///
/// Excess entries on either side are dropped, as are empty ids; each drop
/// is logged. Fails only when nothing usable remains.
pub fn pair_queries(product_ids: &[String], kinds: &[ProductKind]) -> Result<Vec<ProductQuery>> {
    warn_on_length_mismatch(product_ids.len(), kinds.len());
    collect_batch(product_ids.iter().zip(kinds.iter().copied()))
}

/// Like [`pair_queries`], with kinds given as wire or enum names.
///
/// A pair whose kind does not parse is dropped on its own.
pub fn pair_wire_queries(product_ids: &[String], kinds: &[String]) -> Result<Vec<ProductQuery>> {
    warn_on_length_mismatch(product_ids.len(), kinds.len());

    let pairs = product_ids
        .iter()
        .zip(kinds)
        .filter_map(|(id, kind)| match kind.parse::<ProductKind>() {
            Ok(kind) => Some((id, kind)),
            Err(e) => {
                tracing::warn!("[CatalogQuery] Skipping {}: {}", id, e);
                None
            }
        });

    collect_batch(pairs)
}

fn warn_on_length_mismatch(ids: usize, kinds: usize) {
    if ids != kinds {
        tracing::warn!(
            "[CatalogQuery] {} product ids but {} product kinds; dropping {} unpaired entries",
            ids,
            kinds,
            ids.abs_diff(kinds)
        );
    }
}

fn collect_batch<'a>(pairs: impl Iterator<Item = (&'a String, ProductKind)>) -> Result<Vec<ProductQuery>> {
    let batch: Vec<ProductQuery> = pairs
        .filter_map(|(id, kind)| {
            if id.is_empty() {
                tracing::warn!("[CatalogQuery] Skipping empty product id");
                None
            } else {
                Some(ProductQuery::new(id.clone(), kind))
            }
        })
        .collect();

    if batch.is_empty() {
        return Err(PurseError::malformed("catalog query has no usable product ids"));
    }

    Ok(batch)
}
