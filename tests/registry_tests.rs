use std::fs;

use refcheck::{Registry, RegistryError, RegistryShape};

const CSV: &str = "STT,Số hiệu,Tên,Tình trạng,Ngày hiệu lực,Ghi chú
1,TCVN 1234:2020,Bê tông,Hết hiệu lực,01/01/2021,
2, QCVN 56:2019/BTNMT ,Môi trường,Còn hiệu lực,15/06/2019,Thay thế QCVN 56:2013
3,,Không có số hiệu,Còn hiệu lực,,
4,TCVN 1234:2020,Bản trùng,Còn hiệu lực,,
";

#[test]
fn csv_key_column_and_last_status_columns() {
    let reg = Registry::from_csv_reader(CSV.as_bytes(), RegistryShape::Three, 1).unwrap();
    assert_eq!(reg.len(), 2, "blank key skipped, duplicate dropped");

    let tcvn = reg.get("TCVN1234:2020").expect("tcvn present");
    assert_eq!(tcvn.fields, vec![Some("Hết hiệu lực".to_string()), Some("01/01/2021".to_string()), None]);
    assert_eq!(tcvn.status(), Some("Hết hiệu lực"));

    let qcvn = reg.get("QCVN56:2019/BTNMT").expect("qcvn present");
    assert_eq!(qcvn.raw_key, " QCVN 56:2019/BTNMT ");
    assert_eq!(qcvn.key, "QCVN 56:2019/BTNMT");
}

#[test]
fn duplicate_keys_keep_first_row() {
    let reg = Registry::from_csv_reader(CSV.as_bytes(), RegistryShape::Three, 1).unwrap();
    assert_eq!(reg.get("TCVN1234:2020").unwrap().status(), Some("Hết hiệu lực"));
}

#[test]
fn header_only_csv_is_an_empty_registry_error() {
    let err = Registry::from_csv_reader("STT,Số hiệu,A,B,C\n".as_bytes(), RegistryShape::Three, 1).unwrap_err();
    assert!(matches!(err, RegistryError::Empty));
}

#[test]
fn short_row_is_malformed() {
    let data = "STT,Số hiệu,A,B,C\n1,TCVN 1:2000\n";
    match Registry::from_csv_reader(data.as_bytes(), RegistryShape::Three, 1) {
        Err(RegistryError::MalformedRow { row, .. }) => assert_eq!(row, 2),
        other => panic!("expected MalformedRow, got {:?}", other.map(|r| r.len())),
    }
}

#[test]
fn five_wide_shape_takes_last_five_columns() {
    let data = "STT,Số hiệu,F1,F2,F3,F4,F5\n1,TCVN 9362:2012,Hết hiệu lực,a,b,c,d\n";
    let reg = Registry::from_csv_reader(data.as_bytes(), RegistryShape::Five, 1).unwrap();
    let rec = reg.get("TCVN9362:2012").unwrap();
    assert_eq!(rec.fields.len(), 5);
    assert_eq!(rec.fields[4].as_deref(), Some("d"));
}

#[test]
fn json_registry_requires_matching_field_count() {
    let ok = r#"[{"key": "12/2021/NĐ-CP", "fields": ["Còn hiệu lực", null, null]}]"#;
    let reg = Registry::from_json_str(ok, RegistryShape::Three).unwrap();
    assert_eq!(reg.records()[0].fields, vec![Some("Còn hiệu lực".to_string()), None, None]);

    let bad = r#"[{"key": "12/2021/NĐ-CP", "fields": ["Còn hiệu lực"]}]"#;
    assert!(matches!(
        Registry::from_json_str(bad, RegistryShape::Three),
        Err(RegistryError::MalformedRow { row: 1, .. })
    ));
    assert!(matches!(Registry::from_json_str("{", RegistryShape::Three), Err(RegistryError::Parse(_))));
}

#[test]
fn from_path_dispatches_and_fails_fast() {
    let td = tempfile::tempdir().unwrap();
    let csv_path = td.path().join("TCKT.csv");
    fs::write(&csv_path, CSV).unwrap();
    assert_eq!(Registry::from_path(&csv_path, RegistryShape::Three, 1).unwrap().len(), 2);

    let xlsx = td.path().join("TCKT.xlsx");
    fs::write(&xlsx, b"PK").unwrap();
    assert!(matches!(
        Registry::from_path(&xlsx, RegistryShape::Three, 1),
        Err(RegistryError::UnsupportedFormat(_))
    ));

    let missing = td.path().join("missing.csv");
    assert!(matches!(Registry::from_path(&missing, RegistryShape::Three, 1), Err(RegistryError::Read { .. })));
}

#[test]
fn shape_only_three_or_five() {
    assert_eq!(RegistryShape::try_from(3).unwrap(), RegistryShape::Three);
    assert_eq!(RegistryShape::try_from(5).unwrap().width(), 5);
    assert!(matches!(RegistryShape::try_from(4), Err(RegistryError::InvalidShape(4))));
}

#[test]
fn contained_lookup_follows_registry_order() {
    let reg = Registry::from_records(
        RegistryShape::Three,
        vec![
            ("TCVN 2737".to_string(), vec![Some("Còn hiệu lực".to_string()), None, None]),
            ("TCVN 2737:1995".to_string(), vec![Some("Hết hiệu lực".to_string()), None, None]),
        ],
    )
    .unwrap();
    assert_eq!(reg.find_contained_in("TCVN2737:1995").unwrap().key, "TCVN 2737");
    assert!(reg.find_contained_in("QCVN01").is_none());
}
