#[cfg(test)]
mod tests {
    use crate::criteria::{Criteria, LikePattern, flatten};
    use crate::entity::{Entity, FieldAttr};
    use crate::error::{CriteriaError, ResolveError};
    use crate::metadata::MetadataRegistry;
    use crate::test_support::{UserQuery, user_query};
    use pretty_assertions::assert_eq;
    use serde::Serialize;
    use std::sync::Arc;

    fn criteria(filter: UserQuery) -> Criteria<UserQuery> {
        Criteria::with_registry(filter, Arc::new(MetadataRegistry::new())).unwrap()
    }

    fn where_of(c: &Criteria<UserQuery>) -> String {
        c.where_clause().unwrap()
    }

    #[test]
    fn bare_fragments_are_and_joined_in_order() {
        let mut c = criteria(user_query());
        c.equal([UserQuery::ID, UserQuery::USER_NAME])
            .not_equal(UserQuery::STATUS);
        assert_eq!(
            where_of(&c),
            "id = :id AND user_name = :user_name AND state <> :status"
        );
    }

    #[test]
    fn comparison_operators() {
        let mut c = criteria(UserQuery {
            age: Some(18),
            ..user_query()
        });
        c.less_than(UserQuery::AGE)
            .less_or_equal(UserQuery::AGE)
            .greater_than(UserQuery::AGE)
            .greater_or_equal(UserQuery::AGE);
        assert_eq!(
            c.clauses().where_fragments(),
            ["age < :age", "age <= :age", "age > :age", "age >= :age"]
        );
    }

    #[test]
    fn or_group_wraps_everything_before_it() {
        let mut c = criteria(user_query());
        c.equal(UserQuery::ID)
            .equal(UserQuery::USER_NAME)
            .or(|g| {
                g.equal(UserQuery::STATUS);
            });
        assert_eq!(
            where_of(&c),
            "(id = :id AND user_name = :user_name) OR state = :status"
        );
    }

    #[test]
    fn multi_fragment_group_is_parenthesized() {
        let mut c = criteria(user_query());
        c.equal(UserQuery::ID).or(|g| {
            g.equal(UserQuery::STATUS).is_null(UserQuery::AGE);
        });
        assert_eq!(
            c.clauses().where_fragments(),
            ["id = :id", " OR (state = :status AND age IS NULL)"]
        );
        assert_eq!(
            where_of(&c),
            "(id = :id) OR (state = :status AND age IS NULL)"
        );
    }

    #[test]
    fn leading_group_drops_its_connector() {
        let mut c = criteria(user_query());
        c.and(|g| {
            g.equal(UserQuery::ID);
        })
        .equal(UserQuery::USER_NAME);
        assert_eq!(where_of(&c), "id = :id AND user_name = :user_name");

        let mut c = criteria(user_query());
        c.or(|g| {
            g.equal(UserQuery::ID).equal(UserQuery::STATUS);
        });
        assert_eq!(where_of(&c), "(id = :id AND state = :status)");
    }

    #[test]
    fn empty_group_appends_nothing() {
        let mut c = criteria(user_query());
        c.equal(UserQuery::ID)
            .or(|_| {})
            .and(|g| {
                g.equal_if_present(UserQuery::AGE);
            });
        assert_eq!(c.clauses().where_fragments(), ["id = :id"]);
    }

    #[test]
    fn nested_groups_compose_left_to_right() {
        let mut c = criteria(user_query());
        c.equal(UserQuery::ID).or(|g| {
            g.equal(UserQuery::STATUS).and(|h| {
                h.equal(UserQuery::USER_NAME).or(|k| {
                    k.is_null(UserQuery::AGE);
                });
            });
        });
        assert_eq!(
            where_of(&c),
            "(id = :id) OR ((state = :status) AND ((user_name = :user_name) OR age IS NULL))"
        );
    }

    #[test]
    fn flatten_rules() {
        let frags = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(flatten(&[]), "");
        assert_eq!(flatten(&frags(&["a", "b", "c"])), "a AND b AND c");
        assert_eq!(flatten(&frags(&[" OR a", "b"])), "a AND b");
        assert_eq!(flatten(&frags(&["a", " AND b", "c"])), "(a) AND b AND c");
        assert_eq!(flatten(&frags(&["a", "b", " OR c", " AND d"])), "((a AND b) OR c) AND d");
    }

    #[test]
    fn between_degrades_on_partial_bounds() {
        let both = UserQuery {
            age_from: Some(18),
            age_to: Some(30),
            ..UserQuery::default()
        };
        let mut c = criteria(both.clone());
        c.between(UserQuery::AGE, UserQuery::AGE_FROM, UserQuery::AGE_TO);
        assert_eq!(where_of(&c), "age BETWEEN :age_from AND :age_to");

        let mut c = criteria(UserQuery {
            age_to: None,
            ..both.clone()
        });
        c.between(UserQuery::AGE, UserQuery::AGE_FROM, UserQuery::AGE_TO);
        assert_eq!(where_of(&c), "age >= :age_from");

        let mut c = criteria(UserQuery {
            age_from: None,
            ..both
        });
        c.between(UserQuery::AGE, UserQuery::AGE_FROM, UserQuery::AGE_TO);
        assert_eq!(where_of(&c), "age <= :age_to");
    }

    #[test]
    fn not_between_degrades_to_open_bounds() {
        let both = UserQuery {
            age_from: Some(18),
            age_to: Some(30),
            ..UserQuery::default()
        };
        let mut c = criteria(both.clone());
        c.not_between(UserQuery::AGE, UserQuery::AGE_FROM, UserQuery::AGE_TO);
        assert_eq!(where_of(&c), "age NOT BETWEEN :age_from AND :age_to");

        let mut c = criteria(UserQuery {
            age_to: None,
            ..both.clone()
        });
        c.not_between(UserQuery::AGE, UserQuery::AGE_FROM, UserQuery::AGE_TO);
        assert_eq!(where_of(&c), "age < :age_from");

        let mut c = criteria(UserQuery {
            age_from: None,
            ..both
        });
        c.not_between(UserQuery::AGE, UserQuery::AGE_FROM, UserQuery::AGE_TO);
        assert_eq!(where_of(&c), "age > :age_to");
    }

    #[test]
    fn between_with_both_bounds_empty_emits_nothing() {
        let mut c = criteria(UserQuery::default());
        c.between_if_present(UserQuery::AGE, UserQuery::AGE_FROM, UserQuery::AGE_TO)
            .between(UserQuery::AGE, UserQuery::AGE_FROM, UserQuery::AGE_TO)
            .not_between_if_present(UserQuery::AGE, UserQuery::AGE_FROM, UserQuery::AGE_TO);
        assert!(c.clauses().where_fragments().is_empty());
        assert_eq!(where_of(&c), "");
    }

    #[test]
    fn like_patterns() {
        let mut c = criteria(UserQuery {
            user_name: Some("abc".to_string()),
            ..UserQuery::default()
        });
        c.like_with(false, false, LikePattern::Right, UserQuery::USER_NAME)
            .not_like(LikePattern::Left, UserQuery::USER_NAME)
            .like(UserQuery::USER_NAME)
            .like_if_present(LikePattern::Both, UserQuery::STATUS)
            .not_like_if_present(LikePattern::Right, UserQuery::STATUS);
        assert_eq!(
            c.clauses().where_fragments(),
            [
                "user_name LIKE CONCAT(:user_name, '%')",
                "user_name NOT LIKE CONCAT('%', :user_name)",
                "user_name LIKE CONCAT('%', :user_name, '%')",
            ]
        );
    }

    #[test]
    fn empty_sequence_is_skipped_but_single_element_is_not() {
        let mut c = criteria(UserQuery::default());
        c.in_if_present(UserQuery::TAGS)
            .equal_if_present(UserQuery::TAGS);
        assert!(c.clauses().where_fragments().is_empty());

        let mut c = criteria(UserQuery {
            tags: vec!["vip".to_string()],
            ..UserQuery::default()
        });
        c.in_if_present(UserQuery::TAGS)
            .not_in_if_present(UserQuery::TAGS)
            .equal_if_present(UserQuery::TAGS);
        assert_eq!(
            c.clauses().where_fragments(),
            ["tag IN (:tags)", "tag NOT IN (:tags)", "tag = :tags"]
        );
    }

    #[test]
    fn empty_string_counts_as_empty() {
        let mut c = criteria(UserQuery {
            user_name: Some(String::new()),
            ..UserQuery::default()
        });
        c.equal_if_present(UserQuery::USER_NAME)
            .not_equal_if_present(UserQuery::USER_NAME)
            .equal(UserQuery::USER_NAME);
        assert_eq!(c.clauses().where_fragments(), ["user_name = :user_name"]);
    }

    #[test]
    fn membership_and_null_checks_without_ignore() {
        let mut c = criteria(UserQuery::default());
        c.in_(UserQuery::TAGS)
            .not_in(UserQuery::ID)
            .is_null(UserQuery::AGE)
            .is_not_null([UserQuery::USER_NAME, UserQuery::DEPT_ID]);
        assert_eq!(
            c.clauses().where_fragments(),
            [
                "tag IN (:tags)",
                "id NOT IN (:id)",
                "age IS NULL",
                "user_name IS NOT NULL",
                "dept_id IS NOT NULL",
            ]
        );
    }

    #[test]
    fn apply_fills_positional_placeholders() {
        let mut c = criteria(UserQuery::default());
        c.apply(
            "COALESCE(age, 0) > {0} OR age < {1} OR {0} IS NULL",
            [UserQuery::AGE_FROM, UserQuery::AGE_TO],
        );
        assert_eq!(
            where_of(&c),
            "COALESCE(age, 0) > :age_from OR age < :age_to OR :age_from IS NULL"
        );
    }

    #[test]
    fn select_first_last_and_clear() {
        let mut c = criteria(UserQuery::default());
        c.select([UserQuery::ID, UserQuery::STATUS])
            .select_raw("COUNT(*) AS n")
            .first("WITH t AS (SELECT 1)")
            .last(["ORDER BY id", "LIMIT 1"])
            .where_raw("1 = 1");

        let clauses = c.clauses();
        assert_eq!(clauses.select_fragments(), ["id", "state", "COUNT(*) AS n"]);
        assert_eq!(clauses.first_fragments(), ["WITH t AS (SELECT 1)"]);
        assert_eq!(clauses.last_fragments(), ["ORDER BY id", "LIMIT 1"]);

        c.clear_select().clear_first().clear_last().clear_where();
        let clauses = c.clauses();
        assert!(clauses.select_fragments().is_empty());
        assert!(clauses.first_fragments().is_empty());
        assert!(clauses.last_fragments().is_empty());
        assert!(clauses.where_fragments().is_empty());
    }

    #[test]
    fn display_renders_where_clause() {
        let mut c = criteria(user_query());
        c.equal(UserQuery::ID).or(|g| {
            g.equal(UserQuery::STATUS);
        });
        assert_eq!(c.to_string(), "(id = :id) OR state = :status");
    }

    #[test]
    fn transient_field_is_reported_and_first_error_wins() {
        let mut c = criteria(UserQuery {
            cache: Some("x".to_string()),
            ..user_query()
        });
        c.equal(UserQuery::CACHE)
            .equal(UserQuery::ID)
            .like(UserQuery::CACHE);

        assert_eq!(c.clauses().where_fragments(), ["id = :id"]);
        assert_eq!(
            c.error(),
            Some(&ResolveError::TransientField {
                entity: "UserQuery",
                field: "cache",
            })
        );
        let err = c.where_clause().unwrap_err();
        assert!(matches!(
            err,
            CriteriaError::Resolve(ResolveError::TransientField { .. })
        ));
    }

    #[test]
    fn skipped_predicates_do_not_resolve() {
        let mut c = criteria(UserQuery::default());
        c.equal_if_present(UserQuery::CACHE);
        assert!(c.error().is_none());
    }

    #[test]
    fn group_errors_reach_the_parent() {
        let mut c = criteria(user_query());
        c.equal(UserQuery::ID).or(|g| {
            g.is_null(UserQuery::CACHE);
        });
        assert!(c.check().is_err());
        assert_eq!(c.clauses().where_fragments(), ["id = :id"]);
    }

    #[derive(Serialize)]
    struct Scalar(i64);

    impl Entity for Scalar {
        const NAME: &'static str = "Scalar";
        const FIELDS: &'static [FieldAttr] = &[];
    }

    #[test]
    fn filter_must_serialize_into_a_record() {
        let err = Criteria::with_registry(Scalar(1), Arc::new(MetadataRegistry::new()))
            .unwrap_err();
        assert!(matches!(
            err,
            CriteriaError::FilterNotRecord { entity: "Scalar" }
        ));
    }

    #[test]
    fn record_keeps_filter_values() {
        let c = criteria(user_query());
        assert_eq!(c.clauses().param("id"), Some(&serde_json::json!(1)));
        assert!(c.clauses().is_empty_param("age"));
        assert!(c.clauses().is_empty_param("missing"));
        assert_eq!(c.filter().user_name.as_deref(), Some("tom"));
    }

    #[allow(dead_code)]
    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct CamelQuery {
        user_name: Option<String>,
    }

    crate::entity! {
        CamelQuery {
            const USER_NAME: user_name,
        }
    }

    #[test]
    fn renamed_filter_keys_are_rejected() {
        let filter = CamelQuery {
            user_name: Some("tom".to_string()),
        };
        let err = Criteria::with_registry(filter, Arc::new(MetadataRegistry::new()))
            .unwrap_err();
        match err {
            CriteriaError::UndeclaredFilterKey { entity, key } => {
                assert_eq!((entity, key.as_str()), ("CamelQuery", "userName"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[allow(dead_code)]
    #[derive(Serialize)]
    struct SparseQuery {
        id: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        user_name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        scratch: Option<String>,
    }

    crate::entity! {
        SparseQuery {
            const ID: id,
            const USER_NAME: user_name,
            const SCRATCH: scratch { transient: true },
        }
    }

    #[test]
    fn skipped_fields_are_recorded_as_null() {
        let filter = SparseQuery {
            id: 1,
            user_name: None,
            scratch: None,
        };
        let mut c = Criteria::with_registry(filter, Arc::new(MetadataRegistry::new())).unwrap();
        assert_eq!(c.clauses().param("user_name"), Some(&serde_json::Value::Null));
        assert_eq!(c.clauses().param("scratch"), None);

        c.equal([SparseQuery::ID, SparseQuery::USER_NAME])
            .equal_if_present(SparseQuery::USER_NAME);
        assert_eq!(
            c.where_clause().unwrap(),
            "id = :id AND user_name = :user_name"
        );
    }
}
