use refcheck::config::default_families;
use refcheck::{ConfigError, ContextPolicy, FamilySpec, FamilyTable, Segment, Variant};

fn table() -> FamilyTable {
    FamilyTable::compile(&default_families(Variant::DecreeAware)).unwrap()
}

#[test]
fn base_token_is_first_prefix_in_declaration_order() {
    let t = table();
    assert_eq!(t.base_token("TCVN1234:2020"), Some(("TCVN", ContextPolicy::Standard)));
    assert_eq!(t.base_token("TCXDVN356:2005"), Some(("TCXDVN", ContextPolicy::Standard)));
    assert_eq!(t.base_token("TCXD356"), Some(("TCXD", ContextPolicy::Standard)));
    assert_eq!(t.base_token("TCN68-1"), Some(("TCN", ContextPolicy::Standard)));
    assert_eq!(t.base_token("TTLT-BXD"), Some(("TTLT", ContextPolicy::Decree)));
    assert_eq!(t.base_token("NĐ-CP"), Some(("NĐ", ContextPolicy::Decree)));
}

#[test]
fn base_token_prefix_test_is_case_sensitive() {
    let t = table();
    assert_eq!(t.base_token("tcvn12"), None);
    assert_eq!(t.base_token("ISO9001"), None);
    assert_eq!(t.base_token(""), None);
}

#[test]
fn finds_standard_codes_family_major() {
    let t = table();
    let seg = Segment { index: 1, text: "Theo TCVN 1234:2020 và QCVN 56:2019/BTNMT quy định" };
    let found = t.find_matches(&seg);
    let texts: Vec<&str> = found.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["TCVN 1234:2020", "QCVN 56:2019"]);
    assert_eq!(found[0].start, 5);
    assert_eq!(found[0].dense, "TCVN1234:2020");
    assert_eq!(found[1].base_token, "QCVN");
    assert!(found.iter().all(|m| m.segment == 1));
}

#[test]
fn lowercase_hits_are_discarded() {
    let t = table();
    let seg = Segment { index: 1, text: "theo tcvn 1234 và qcvn 02" };
    assert!(t.find_matches(&seg).is_empty());
}

#[test]
fn decree_family_matches_at_type_marker() {
    let t = table();
    let seg = Segment { index: 2, text: "Căn cứ Nghị định số 15/2021/NĐ-CP ngày 03/3/2021" };
    let found = t.find_matches(&seg);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].text, "NĐ-CP");
    assert_eq!(found[0].class, ContextPolicy::Decree);
}

#[test]
fn token_list_follows_family_order() {
    let tokens = table().tokens();
    assert_eq!(tokens.first().map(String::as_str), Some("TCVN"));
    assert_eq!(tokens.len(), 20);
    assert_eq!(table().tokens_of(ContextPolicy::Decree), vec!["TTLT", "NĐ", "TT", "QĐ", "NQ", "CT"]);
}

#[test]
fn bad_family_pattern_is_a_config_error() {
    let spec = FamilySpec {
        name: "broken".into(),
        pattern: "TCVN(".into(),
        token: "TCVN".into(),
        case_insensitive: true,
        class: ContextPolicy::Standard,
    };
    match FamilyTable::compile(&[spec]) {
        Err(ConfigError::Pattern { family, .. }) => assert_eq!(family, "broken"),
        other => panic!("expected Pattern error, got {:?}", other.map(|_| ())),
    }
}
