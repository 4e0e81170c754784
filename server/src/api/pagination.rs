//! 一覧APIのページングとクエリ解釈

use control_interface_common::error::{CommonError, ControlError};
use control_interface_common::protocol::{parse_query_bool, Page};
use std::collections::HashMap;
use uuid::Uuid;

/// クエリ文字列（`?page=2&service=...`）
pub type QueryParams = HashMap<String, String>;

/// `page` パラメータを解釈（1始まり、省略時1）
pub fn page_number(params: &QueryParams) -> Result<u32, ControlError> {
    match params.get("page") {
        None => Ok(1),
        Some(raw) => match raw.trim().parse::<u32>() {
            Ok(page) if page >= 1 => Ok(page),
            _ => Err(ControlError::NotFound(format!("Invalid page: {}", raw))),
        },
    }
}

/// UUIDパラメータを解釈
pub fn uuid_param(params: &QueryParams, name: &str) -> Result<Option<Uuid>, ControlError> {
    params
        .get(name)
        .map(|raw| {
            Uuid::parse_str(raw.trim()).map_err(|_| {
                ControlError::from(CommonError::Validation(format!(
                    "'{}' is not a valid UUID for {}",
                    raw, name
                )))
            })
        })
        .transpose()
}

/// 真偽値パラメータを解釈
pub fn bool_param(params: &QueryParams, name: &str) -> Result<Option<bool>, ControlError> {
    params
        .get(name)
        .map(|raw| parse_query_bool(raw).map_err(ControlError::from))
        .transpose()
}

/// ページを組み立てる
///
/// 2ページ目以降で要素が無い場合は存在しないページとして扱う。
pub fn build_page<T>(
    results: Vec<T>,
    count: u64,
    page: u32,
    page_size: u32,
) -> Result<Page<T>, ControlError> {
    if page > 1 && results.is_empty() {
        return Err(ControlError::NotFound(format!("Invalid page: {}", page)));
    }
    Ok(Page::new(results, count, page, page_size))
}
