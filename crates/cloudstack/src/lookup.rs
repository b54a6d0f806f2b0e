//! Match conventions shared by the courtesy lookup helpers.

use crate::error::{Error, Result};

/// Resolves a by-name list result: zero matches is an error, a single
/// match wins, and multiple matches are disambiguated by exact name.
pub(crate) fn pick_by_name<T>(
    mut items: Vec<T>,
    name: &str,
    item_name: impl Fn(&T) -> &str,
    what: &str,
) -> Result<T> {
    match items.len() {
        0 => Err(Error::NotFound(format!("{what} {name}"))),
        1 => Ok(items.remove(0)),
        _ => items
            .into_iter()
            .find(|item| item_name(item) == name)
            .ok_or_else(|| Error::Ambiguous(format!("{what} {name}"))),
    }
}

/// Resolves a by-ID list result: the ID is unique server-side, so more
/// than one match is always an error.
pub(crate) fn pick_by_id<T>(mut items: Vec<T>, id: &str, what: &str) -> Result<T> {
    match items.len() {
        0 => Err(Error::NotFound(format!("{what} {id}"))),
        1 => Ok(items.remove(0)),
        _ => Err(Error::Ambiguous(format!("{what} {id}"))),
    }
}

/// True when `value` already is a server-assigned ID rather than a name.
pub fn is_id(value: &str) -> bool {
    uuid::Uuid::parse_str(value).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Named(&'static str);

    #[test]
    fn zero_matches_is_not_found() {
        let err = pick_by_name(Vec::<Named>::new(), "a", |n| n.0, "zone").unwrap_err();
        assert!(err.is_not_found());
        let err = pick_by_id(Vec::<Named>::new(), "id-1", "zone").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn single_match_wins() {
        let got = pick_by_name(vec![Named("other")], "a", |n| n.0, "zone").unwrap();
        assert_eq!(got, Named("other"));
    }

    #[test]
    fn many_matches_need_exact_name() {
        let items = vec![Named("a-suffix"), Named("a")];
        let got = pick_by_name(items, "a", |n| n.0, "zone").unwrap();
        assert_eq!(got, Named("a"));

        let items = vec![Named("a-1"), Named("a-2")];
        let err = pick_by_name(items, "a", |n| n.0, "zone").unwrap_err();
        assert!(matches!(err, Error::Ambiguous(_)));
    }

    #[test]
    fn many_matches_by_id_is_an_error() {
        let err = pick_by_id(vec![Named("x"), Named("y")], "id-1", "vpc").unwrap_err();
        assert!(matches!(err, Error::Ambiguous(_)));
    }

    #[test]
    fn uuids_are_ids() {
        assert!(is_id("6ea2cdfe-1b7d-42b6-8cf8-1c4bd40110f9"));
        assert!(!is_id("Default VPC offering"));
    }
}
