//! Status code to exception mapping

use std::collections::BTreeMap;

use ir::StatusCode;
use types::method::{CLIENT_AUTHENTICATION, HTTP_RESPONSE, RESOURCE_MODIFIED, RESOURCE_NOT_FOUND};
use types::{ExceptionMapping, IType};

/// Exceptions raised for well-known statuses unless an operation says otherwise
pub fn default_exception_table() -> BTreeMap<u16, String> {
    BTreeMap::from([
        (304, RESOURCE_MODIFIED.to_string()),
        (401, CLIENT_AUTHENTICATION.to_string()),
        (404, RESOURCE_NOT_FOUND.to_string()),
        (409, RESOURCE_MODIFIED.to_string()),
        (412, RESOURCE_MODIFIED.to_string()),
    ])
}

/// Merge the default table, settings overrides and typed error responses.
///
/// Expected codes are dropped. Codes raising the same exception with the same
/// body are grouped; groups are ordered by their lowest code. Ranged error
/// responses (`4XX`) raise `HttpResponse` and join a group with the same body,
/// or follow the coded groups in class order. A class that is itself expected
/// is dropped.
pub fn exception_mappings(
    expected: &[StatusCode],
    overrides: &[(u16, String)],
    typed: &[(u16, Option<IType>)],
    ranged: &[(u8, Option<IType>)],
) -> Vec<ExceptionMapping> {
    let mut table: BTreeMap<u16, (String, Option<IType>)> =
        default_exception_table().into_iter().map(|(code, name)| (code, (name, None))).collect();
    for (code, name) in overrides {
        table.insert(*code, (name.clone(), None));
    }
    for (code, body) in typed {
        let name = table.get(code).map(|(name, _)| name.clone()).unwrap_or_else(|| HTTP_RESPONSE.to_string());
        table.insert(*code, (name, body.clone()));
    }
    table.retain(|code, _| !expected.iter().any(|s| s.matches(*code)));

    let mut groups: Vec<ExceptionMapping> = Vec::new();
    for (code, (exception, body_type)) in table {
        match groups.iter_mut().find(|g| g.exception == exception && g.body_type == body_type) {
            Some(group) => group.status_codes.push(code),
            None => groups.push(ExceptionMapping {
                exception,
                status_codes: vec![code],
                status_ranges: Vec::new(),
                body_type,
            }),
        }
    }

    let classes: BTreeMap<u8, Option<IType>> = ranged
        .iter()
        .filter(|(class, _)| !expected.contains(&StatusCode::Range(*class)))
        .map(|(class, body)| (*class, body.clone()))
        .collect();
    for (class, body_type) in classes {
        match groups.iter_mut().find(|g| g.exception == HTTP_RESPONSE && g.body_type == body_type) {
            Some(group) => group.status_ranges.push(class),
            None => groups.push(ExceptionMapping {
                exception: HTTP_RESPONSE.to_string(),
                status_codes: Vec::new(),
                status_ranges: vec![class],
                body_type,
            }),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::TypeRef;

    #[test]
    fn test_defaults_grouped_in_ascending_order() {
        let groups = exception_mappings(&[StatusCode::Code(200)], &[], &[], &[]);
        let shape: Vec<(&str, Vec<u16>)> =
            groups.iter().map(|g| (g.exception.as_str(), g.status_codes.clone())).collect();
        assert_eq!(
            shape,
            vec![
                (RESOURCE_MODIFIED, vec![304, 409, 412]),
                (CLIENT_AUTHENTICATION, vec![401]),
                (RESOURCE_NOT_FOUND, vec![404]),
            ]
        );
    }

    #[test]
    fn test_expected_codes_are_removed() {
        let groups = exception_mappings(&[StatusCode::Code(200), StatusCode::Code(404)], &[], &[], &[]);
        assert!(groups.iter().all(|g| !g.status_codes.contains(&404)));

        let groups = exception_mappings(&[StatusCode::Range(3)], &[], &[], &[]);
        assert!(groups.iter().all(|g| !g.status_codes.contains(&304)));
    }

    #[test]
    fn test_typed_errors_and_overrides_merge() {
        let error = IType::Model(TypeRef::new(0, "Error"));
        let groups = exception_mappings(
            &[StatusCode::Code(200)],
            &[(429, HTTP_RESPONSE.to_string()), (409, HTTP_RESPONSE.to_string())],
            &[(404, Some(error.clone())), (400, Some(error.clone()))],
            &[],
        );
        let found = groups.iter().find(|g| g.exception == RESOURCE_NOT_FOUND).expect("404 group");
        assert_eq!(found.body_type, Some(error.clone()));

        let typed = groups.iter().find(|g| g.exception == HTTP_RESPONSE && g.body_type.is_some()).expect("typed");
        assert_eq!(typed.status_codes, vec![400]);

        let plain = groups.iter().find(|g| g.exception == HTTP_RESPONSE && g.body_type.is_none()).expect("plain");
        assert_eq!(plain.status_codes, vec![409, 429]);
    }

    #[test]
    fn test_ranged_errors_keep_their_body() {
        let error = IType::Model(TypeRef::new(0, "Error"));
        let problem = IType::Model(TypeRef::new(1, "Problem"));
        let groups = exception_mappings(
            &[StatusCode::Code(200)],
            &[],
            &[(400, Some(error.clone()))],
            &[(5, Some(problem.clone())), (4, Some(error.clone()))],
        );
        let typed = groups.iter().find(|g| g.body_type == Some(error.clone())).expect("4XX joins the 400 group");
        assert_eq!(typed.status_codes, vec![400]);
        assert_eq!(typed.status_ranges, vec![4]);

        let last = groups.last().expect("5XX group");
        assert_eq!(last.exception, HTTP_RESPONSE);
        assert!(last.status_codes.is_empty());
        assert_eq!(last.status_ranges, vec![5]);
        assert_eq!(last.body_type, Some(problem));

        let groups = exception_mappings(&[StatusCode::Range(4)], &[], &[], &[(4, Some(error))]);
        assert!(groups.iter().all(|g| g.status_ranges.is_empty()));
    }
}
