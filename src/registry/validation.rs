//! Field validation for registry records
//!
//! The check order inside each function is normative: callers rely on it to
//! produce deterministic error codes.

use crate::error::{MarketError, Result};
use crate::registry::types::{
    AssetDraft, AssetUpdate, MAX_COMMENT_LEN, MAX_DESCRIPTION_LEN, MAX_NAME_LEN, MAX_RATING,
    MAX_ROYALTY_PERCENT, MAX_SECTOR_LEN, MAX_URL_LEN, MIN_RATING,
};

pub(crate) fn check_price(price: u64) -> Result<()> {
    if price == 0 {
        return Err(MarketError::InvalidPrice);
    }
    Ok(())
}

pub(crate) fn check_royalty(royalty: u64) -> Result<()> {
    if royalty > MAX_ROYALTY_PERCENT {
        return Err(MarketError::ExcessiveRoyalty(royalty));
    }
    Ok(())
}

pub(crate) fn check_rating(rating: u64) -> Result<()> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(MarketError::InvalidRating(rating));
    }
    Ok(())
}

pub(crate) fn check_comment(comment: &str) -> Result<()> {
    check_text("comment", comment, MAX_COMMENT_LEN)
}

/// Price first, royalty second, field bounds last.
pub(crate) fn check_draft(draft: &AssetDraft) -> Result<()> {
    check_price(draft.price)?;
    check_royalty(draft.royalty)?;
    check_ascii("name", &draft.name, MAX_NAME_LEN)?;
    check_text("description", &draft.description, MAX_DESCRIPTION_LEN)?;
    check_ascii("sector", &draft.sector, MAX_SECTOR_LEN)?;
    check_text("thumbnail", &draft.thumbnail, MAX_URL_LEN)?;
    check_text("resource", &draft.resource, MAX_URL_LEN)?;
    Ok(())
}

/// Price first, field bounds after; the royalty is not modifiable.
pub(crate) fn check_update(update: &AssetUpdate) -> Result<()> {
    check_price(update.price)?;
    check_ascii("name", &update.name, MAX_NAME_LEN)?;
    check_text("description", &update.description, MAX_DESCRIPTION_LEN)?;
    check_ascii("sector", &update.sector, MAX_SECTOR_LEN)?;
    check_text("thumbnail", &update.thumbnail, MAX_URL_LEN)?;
    check_text("resource", &update.resource, MAX_URL_LEN)?;
    Ok(())
}

fn check_text(field: &str, value: &str, max_len: usize) -> Result<()> {
    if value.chars().count() > max_len {
        return Err(MarketError::InvalidField(format!(
            "{} exceeds maximum length of {} characters",
            field, max_len
        )));
    }
    Ok(())
}

fn check_ascii(field: &str, value: &str, max_len: usize) -> Result<()> {
    if !value.is_ascii() {
        return Err(MarketError::InvalidField(format!(
            "{} must be ASCII",
            field
        )));
    }
    check_text(field, value, max_len)
}
