//! String keywords. Lengths count Unicode scalar values, not bytes.

use super::{limit, KeywordCx};
use crate::error::{ErrorCode, ValidationError};

pub(super) fn max_length(cx: &KeywordCx<'_>) -> Vec<ValidationError> {
    let (Some(text), Some(max)) = (cx.data.as_str(), limit(cx.keyword("maxLength"))) else {
        return Vec::new();
    };
    let length = text.chars().count() as u64;
    if length <= max {
        return Vec::new();
    }
    vec![cx.error(ErrorCode::MaxLengthError).with("maxLength", max).with("length", length)]
}

pub(super) fn min_length(cx: &KeywordCx<'_>) -> Vec<ValidationError> {
    let (Some(text), Some(min)) = (cx.data.as_str(), limit(cx.keyword("minLength"))) else {
        return Vec::new();
    };
    let length = text.chars().count() as u64;
    if length >= min {
        return Vec::new();
    }
    vec![cx.error(ErrorCode::MinLengthError).with("minLength", min).with("length", length)]
}

pub(super) fn pattern(cx: &KeywordCx<'_>) -> Vec<ValidationError> {
    let (Some(text), Some(regex)) = (cx.data.as_str(), &cx.node.pattern) else {
        return Vec::new();
    };
    if regex.is_match(text) {
        return Vec::new();
    }
    vec![cx.error(ErrorCode::PatternError).with("pattern", regex.as_str())]
}
