use proptest::prelude::*;
use rotor_pathz::{
    Action, AuthorizationPolicy, AuthorizationRule, Mode, Path, PathElem, PathzAuthorizer,
    Principal,
};

fn elem() -> impl Strategy<Value = PathElem> {
    ("[a-z]{1,6}", proptest::option::of(("[a-z]{1,3}", "[a-z0-9]{1,4}"))).prop_map(
        |(name, key)| match key {
            Some((k, v)) => PathElem::new(name).with_key(k, v),
            None => PathElem::new(name),
        },
    )
}

fn path() -> impl Strategy<Value = Path> {
    proptest::collection::vec(elem(), 0..5).prop_map(Path::new)
}

proptest! {
    #[test]
    fn permit_covers_every_extension(base in path(), tail in path()) {
        let authorizer = PathzAuthorizer::new();
        authorizer.update_policy(AuthorizationPolicy {
            rules: vec![AuthorizationRule {
                id: "base".into(),
                path: base.clone(),
                principal: Principal::User("alice".into()),
                mode: Mode::Read,
                action: Action::Permit,
            }],
            groups: vec![],
        }).unwrap();

        let result = authorizer.authorize("alice", &base.join(&tail), Mode::Read).unwrap();
        prop_assert_eq!(result.action, Action::Permit);
        prop_assert_eq!(result.matched_rule, base.to_string());
    }

    #[test]
    fn rendered_path_parses_back(p in path()) {
        let reparsed: Path = p.to_string().parse().unwrap();
        prop_assert_eq!(reparsed, p);
    }
}
