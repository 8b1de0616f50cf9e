//! Request validation
//!
//! Each operation has an explicit function that turns a raw request into a
//! typed command, collecting every field violation into
//! [`validator::ValidationErrors`] instead of stopping at the first one.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

use crate::models::{
    BidPatch, BidStatus, CreateBidRequest, CreateTenderRequest, EditBidRequest,
    EditTenderRequest, FieldPatch, NewBid, NewTender, Page, PageQuery, TenderPatch,
    TenderServiceType, TenderStatus, MAX_PAGE_LIMIT,
};

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_DESCRIPTION_LEN: usize = 1000;
pub const MAX_REVIEW_LEN: usize = 1000;

/// Usernames are short identifiers without whitespace
static USERNAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]{0,49}$").expect("valid regex"));

pub type Validated<T> = Result<T, ValidationErrors>;

fn violation(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    ValidationError::new(code).with_message(message.into())
}

fn finish<T>(errors: ValidationErrors, value: impl FnOnce() -> T) -> Validated<T> {
    if errors.is_empty() {
        Ok(value())
    } else {
        Err(errors)
    }
}

fn check_required_text(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: &str,
    max: usize,
) {
    if value.trim().is_empty() {
        errors.add(field, violation("required", format!("{field} is required")));
    } else {
        check_max_len(errors, field, value, max);
    }
}

fn check_max_len(errors: &mut ValidationErrors, field: &'static str, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.add(
            field,
            violation("length", format!("{field} must be at most {max} characters")),
        );
    }
}

fn check_uuid(errors: &mut ValidationErrors, field: &'static str, value: &str) -> Option<Uuid> {
    if value.trim().is_empty() {
        errors.add(field, violation("required", format!("{field} is required")));
        return None;
    }
    match Uuid::parse_str(value.trim()) {
        Ok(id) => Some(id),
        Err(_) => {
            errors.add(field, violation("uuid", format!("{field} must be a UUID")));
            None
        }
    }
}

fn check_username(errors: &mut ValidationErrors, field: &'static str, value: &str) {
    if value.is_empty() {
        errors.add(field, violation("required", format!("{field} is required")));
    } else if !USERNAME_REGEX.is_match(value) {
        errors.add(field, violation("username", format!("{field} is not a valid username")));
    }
}

/// Validate an acting username passed as a query parameter
pub fn validate_username(username: &str) -> Validated<()> {
    let mut errors = ValidationErrors::new();
    check_username(&mut errors, "username", username);
    finish(errors, || ())
}

pub fn validate_create_tender(req: &CreateTenderRequest) -> Validated<NewTender> {
    let mut errors = ValidationErrors::new();

    check_required_text(&mut errors, "name", &req.name, MAX_NAME_LEN);
    check_required_text(&mut errors, "description", &req.description, MAX_DESCRIPTION_LEN);
    let service_type = parse_service_type(&mut errors, "serviceType", &req.service_type);
    let organization_id = check_uuid(&mut errors, "organizationId", &req.organization_id);
    check_username(&mut errors, "creatorUsername", &req.creator_username);

    match (service_type, organization_id) {
        (Some(service_type), Some(organization_id)) if errors.is_empty() => Ok(NewTender {
            name: req.name.clone(),
            description: req.description.clone(),
            service_type,
            organization_id,
            creator_username: req.creator_username.clone(),
        }),
        _ => Err(errors),
    }
}

pub fn validate_tender_patch(req: &EditTenderRequest) -> Validated<TenderPatch> {
    let mut errors = ValidationErrors::new();

    let name = FieldPatch::from_text(req.name.clone());
    if let FieldPatch::SetTo(ref v) = name {
        check_max_len(&mut errors, "name", v, MAX_NAME_LEN);
    }
    let description = FieldPatch::from_text(req.description.clone());
    if let FieldPatch::SetTo(ref v) = description {
        check_max_len(&mut errors, "description", v, MAX_DESCRIPTION_LEN);
    }
    let service_type = match FieldPatch::from_text(req.service_type.clone()) {
        FieldPatch::SetTo(raw) => parse_service_type(&mut errors, "serviceType", &raw)
            .map(FieldPatch::SetTo)
            .unwrap_or_default(),
        FieldPatch::Unchanged => FieldPatch::Unchanged,
    };

    finish(errors, || TenderPatch {
        name,
        description,
        service_type,
    })
}

pub fn validate_create_bid(req: &CreateBidRequest) -> Validated<NewBid> {
    let mut errors = ValidationErrors::new();

    check_required_text(&mut errors, "name", &req.name, MAX_NAME_LEN);
    check_required_text(&mut errors, "description", &req.description, MAX_DESCRIPTION_LEN);
    let tender_id = check_uuid(&mut errors, "tenderId", &req.tender_id);
    check_username(&mut errors, "creatorUsername", &req.creator_username);

    // An empty organization id means the bid is authored by the user
    let organization_id = match req.organization_id.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => check_uuid(&mut errors, "organizationId", raw),
        _ => None,
    };

    match tender_id {
        Some(tender_id) if errors.is_empty() => Ok(NewBid {
            name: req.name.clone(),
            description: req.description.clone(),
            tender_id,
            organization_id,
            creator_username: req.creator_username.clone(),
        }),
        _ => Err(errors),
    }
}

pub fn validate_bid_patch(req: &EditBidRequest) -> Validated<BidPatch> {
    let mut errors = ValidationErrors::new();

    let name = FieldPatch::from_text(req.name.clone());
    if let FieldPatch::SetTo(ref v) = name {
        check_max_len(&mut errors, "name", v, MAX_NAME_LEN);
    }
    let description = FieldPatch::from_text(req.description.clone());
    if let FieldPatch::SetTo(ref v) = description {
        check_max_len(&mut errors, "description", v, MAX_DESCRIPTION_LEN);
    }

    finish(errors, || BidPatch { name, description })
}

/// Resolve `limit`/`offset`, falling back to `default_limit` when `limit` is absent
pub fn validate_page(query: PageQuery, default_limit: u32) -> Validated<Page> {
    let mut errors = ValidationErrors::new();

    let limit = query.limit.unwrap_or(default_limit as i64);
    if !(1..=MAX_PAGE_LIMIT as i64).contains(&limit) {
        errors.add(
            "limit",
            violation("range", format!("limit must be between 1 and {MAX_PAGE_LIMIT}")),
        );
    }
    let offset = query.offset.unwrap_or(0);
    if offset < 0 || offset > u32::MAX as i64 {
        errors.add("offset", violation("range", "offset must not be negative"));
    }

    finish(errors, || Page::new(limit as u32, offset as u32))
}

pub fn validate_version(version: i64) -> Validated<i32> {
    let mut errors = ValidationErrors::new();
    if version < 1 || version > i32::MAX as i64 {
        errors.add("version", violation("range", "version must be at least 1"));
    }
    finish(errors, || version as i32)
}

pub fn validate_review(review: &str) -> Validated<()> {
    let mut errors = ValidationErrors::new();
    check_required_text(&mut errors, "bidFeedback", review, MAX_REVIEW_LEN);
    finish(errors, || ())
}

pub fn validate_service_types(raw: &[String]) -> Validated<Vec<TenderServiceType>> {
    let mut errors = ValidationErrors::new();
    let parsed: Vec<TenderServiceType> = raw
        .iter()
        .filter(|s| !s.is_empty())
        .filter_map(|s| parse_service_type(&mut errors, "service_type", s))
        .collect();
    finish(errors, || parsed)
}

pub fn validate_tender_status(raw: &str) -> Validated<TenderStatus> {
    let mut errors = ValidationErrors::new();
    let status = raw.parse::<TenderStatus>().ok();
    if status.is_none() {
        errors.add(
            "status",
            violation("enum", "status must be one of Created, Published, Closed"),
        );
    }
    match status {
        Some(status) => Ok(status),
        None => Err(errors),
    }
}

pub fn validate_bid_status(raw: &str) -> Validated<BidStatus> {
    let mut errors = ValidationErrors::new();
    let status = raw.parse::<BidStatus>().ok();
    if status.is_none() {
        errors.add(
            "status",
            violation(
                "enum",
                "status must be one of Created, Published, Canceled, Approved, Rejected",
            ),
        );
    }
    match status {
        Some(status) => Ok(status),
        None => Err(errors),
    }
}

fn parse_service_type(
    errors: &mut ValidationErrors,
    field: &'static str,
    raw: &str,
) -> Option<TenderServiceType> {
    if raw.trim().is_empty() {
        errors.add(field, violation("required", format!("{field} is required")));
        return None;
    }
    match raw.parse() {
        Ok(t) => Some(t),
        Err(_) => {
            errors.add(
                field,
                violation(
                    "enum",
                    format!("{field} must be one of Construction, Delivery, Manufacture"),
                ),
            );
            None
        }
    }
}
